use crate::domain::{Aggregate, BucketKey, BucketKind};
use crate::store::{load_aggregate, save_aggregate, Store, StoreError};

/// Result of one upsert: the persisted bucket and whether this call created it.
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<A> {
    pub bucket: A,
    pub created: bool,
}

/// Load the bucket at `key` or initialize it with `init`, apply `update`, and save.
///
/// The bucket is written on every successful call. `update` runs on fresh and
/// existing buckets alike, so one call is exactly one event's worth of
/// accumulation. If `update` fails nothing is written.
pub async fn upsert<A, I, U, E>(
    store: &dyn Store,
    kind: BucketKind,
    key: &BucketKey,
    init: I,
    update: U,
) -> Result<Upserted<A>, E>
where
    A: Aggregate,
    I: FnOnce(&BucketKey) -> A,
    U: FnOnce(&mut A) -> Result<(), E>,
    E: From<StoreError>,
{
    let (mut bucket, created) = match load_aggregate::<A>(store, kind, &key.id).await? {
        Some(existing) => (existing, false),
        None => (init(key), true),
    };

    update(&mut bucket)?;
    save_aggregate(store, kind, &bucket).await?;

    Ok(Upserted { bucket, created })
}
