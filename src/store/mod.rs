//! Storage abstraction for entities and buckets.
//!
//! Every call commits on its own; there are no multi-call transactions. The
//! aggregation layer treats a missing record as a normal `None` branch.

use crate::domain::{
    Aggregate, BucketKey, BucketKind, Factory, Pair, PairCreated, PairId, Subject, SubjectId,
};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

/// One persisted bucket row: identity plus the encoded aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBucket {
    pub kind: BucketKind,
    pub key: BucketKey,
    pub body: serde_json::Value,
}

impl StoredBucket {
    pub fn encode<A: Aggregate>(kind: BucketKind, aggregate: &A) -> Result<Self, StoreError> {
        Ok(StoredBucket {
            kind,
            key: aggregate.key().clone(),
            body: serde_json::to_value(aggregate)?,
        })
    }

    pub fn decode<A: Aggregate>(&self) -> Result<A, StoreError> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// Key-value style persistence used by the orchestrator, archiver and read API.
#[async_trait]
pub trait Store: Send + Sync + fmt::Debug {
    async fn load_subject(&self, id: &SubjectId) -> Result<Option<Subject>, StoreError>;

    async fn save_subject(&self, subject: &Subject) -> Result<(), StoreError>;

    async fn load_pair(&self, id: &PairId) -> Result<Option<Pair>, StoreError>;

    async fn save_pair(&self, pair: &Pair) -> Result<(), StoreError>;

    async fn load_factory(&self, id: &str) -> Result<Option<Factory>, StoreError>;

    async fn save_factory(&self, factory: &Factory) -> Result<(), StoreError>;

    /// Record that `pair` trades `token_a` against `token_b` (one direction).
    async fn save_pair_lookup(
        &self,
        token_a: &SubjectId,
        token_b: &SubjectId,
        pair: &PairId,
    ) -> Result<(), StoreError>;

    async fn find_pair(
        &self,
        token_a: &SubjectId,
        token_b: &SubjectId,
    ) -> Result<Option<PairId>, StoreError>;

    async fn load_bucket(
        &self,
        kind: BucketKind,
        id: &str,
    ) -> Result<Option<StoredBucket>, StoreError>;

    /// Insert or replace a bucket by `(kind, id)`.
    async fn save_bucket(&self, bucket: &StoredBucket) -> Result<(), StoreError>;

    /// Returns whether a bucket was actually removed.
    async fn remove_bucket(&self, kind: BucketKind, id: &str) -> Result<bool, StoreError>;

    /// Buckets of one subject with `from_period <= period_index <= to_period`, ascending.
    async fn list_buckets(
        &self,
        kind: BucketKind,
        subject_id: &str,
        from_period: i64,
        to_period: i64,
    ) -> Result<Vec<StoredBucket>, StoreError>;

    async fn count_buckets(&self, kind: BucketKind, subject_id: &str)
        -> Result<usize, StoreError>;

    /// Last fully processed sequence number of a named upstream stream.
    async fn load_cursor(&self, name: &str) -> Result<Option<u64>, StoreError>;

    async fn save_cursor(&self, name: &str, seq: u64) -> Result<(), StoreError>;

    /// Keep a pair announcement whose registration is waiting on token metadata.
    async fn save_deferred_pair(&self, created: &PairCreated) -> Result<(), StoreError>;

    async fn load_deferred_pair(&self, pair: &PairId) -> Result<Option<PairCreated>, StoreError>;

    /// Returns whether an announcement was actually removed.
    async fn remove_deferred_pair(&self, pair: &PairId) -> Result<bool, StoreError>;
}

/// Load and decode a typed aggregate.
pub async fn load_aggregate<A: Aggregate>(
    store: &dyn Store,
    kind: BucketKind,
    id: &str,
) -> Result<Option<A>, StoreError> {
    match store.load_bucket(kind, id).await? {
        Some(stored) => Ok(Some(stored.decode()?)),
        None => Ok(None),
    }
}

/// Encode and persist a typed aggregate.
pub async fn save_aggregate<A: Aggregate>(
    store: &dyn Store,
    kind: BucketKind,
    aggregate: &A,
) -> Result<(), StoreError> {
    let stored = StoredBucket::encode(kind, aggregate)?;
    store.save_bucket(&stored).await
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("Corrupt record {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, Resolution, SubjectId, Timestamp, TokenDayBucket};

    #[test]
    fn test_stored_bucket_roundtrip() {
        let key = BucketKey::derive("tok", Resolution::Day, Timestamp::new(90_000));
        let mut bucket = TokenDayBucket::new(key.clone(), SubjectId::new("tok"));
        bucket.price_usd = Decimal::from_str_canonical("1234.000000000000000001").unwrap();

        let stored = StoredBucket::encode(BucketKind::TokenDay, &bucket).unwrap();
        assert_eq!(stored.key, key);

        let decoded: TokenDayBucket = stored.decode().unwrap();
        assert_eq!(decoded, bucket);
    }

    #[test]
    fn test_decode_wrong_shape_is_codec_error() {
        let key = BucketKey::derive("tok", Resolution::Day, Timestamp::new(0));
        let stored = StoredBucket {
            kind: BucketKind::TokenDay,
            key,
            body: serde_json::json!({"unexpected": true}),
        };
        let result: Result<TokenDayBucket, _> = stored.decode();
        assert!(matches!(result, Err(StoreError::Codec(_))));
    }
}
