//! In-memory store for tests and embedding without SQLite.

use super::{Store, StoreError, StoredBucket};
use crate::domain::{BucketKind, Factory, Pair, PairCreated, PairId, Subject, SubjectId};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    subjects: HashMap<SubjectId, Subject>,
    pairs: HashMap<PairId, Pair>,
    factories: HashMap<String, Factory>,
    lookups: HashMap<(SubjectId, SubjectId), PairId>,
    buckets: BTreeMap<(BucketKind, String), StoredBucket>,
    cursors: HashMap<String, u64>,
    deferred: HashMap<PairId, PairCreated>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every write is a single insert/remove, so a poisoned lock still holds consistent data.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_subject(&self, id: &SubjectId) -> Result<Option<Subject>, StoreError> {
        Ok(self.lock().subjects.get(id).cloned())
    }

    async fn save_subject(&self, subject: &Subject) -> Result<(), StoreError> {
        self.lock()
            .subjects
            .insert(subject.id.clone(), subject.clone());
        Ok(())
    }

    async fn load_pair(&self, id: &PairId) -> Result<Option<Pair>, StoreError> {
        Ok(self.lock().pairs.get(id).cloned())
    }

    async fn save_pair(&self, pair: &Pair) -> Result<(), StoreError> {
        self.lock().pairs.insert(pair.id.clone(), pair.clone());
        Ok(())
    }

    async fn load_factory(&self, id: &str) -> Result<Option<Factory>, StoreError> {
        Ok(self.lock().factories.get(id).cloned())
    }

    async fn save_factory(&self, factory: &Factory) -> Result<(), StoreError> {
        self.lock()
            .factories
            .insert(factory.id.clone(), factory.clone());
        Ok(())
    }

    async fn save_pair_lookup(
        &self,
        token_a: &SubjectId,
        token_b: &SubjectId,
        pair: &PairId,
    ) -> Result<(), StoreError> {
        self.lock()
            .lookups
            .insert((token_a.clone(), token_b.clone()), pair.clone());
        Ok(())
    }

    async fn find_pair(
        &self,
        token_a: &SubjectId,
        token_b: &SubjectId,
    ) -> Result<Option<PairId>, StoreError> {
        Ok(self
            .lock()
            .lookups
            .get(&(token_a.clone(), token_b.clone()))
            .cloned())
    }

    async fn load_bucket(
        &self,
        kind: BucketKind,
        id: &str,
    ) -> Result<Option<StoredBucket>, StoreError> {
        Ok(self.lock().buckets.get(&(kind, id.to_string())).cloned())
    }

    async fn save_bucket(&self, bucket: &StoredBucket) -> Result<(), StoreError> {
        self.lock()
            .buckets
            .insert((bucket.kind, bucket.key.id.clone()), bucket.clone());
        Ok(())
    }

    async fn remove_bucket(&self, kind: BucketKind, id: &str) -> Result<bool, StoreError> {
        Ok(self.lock().buckets.remove(&(kind, id.to_string())).is_some())
    }

    async fn list_buckets(
        &self,
        kind: BucketKind,
        subject_id: &str,
        from_period: i64,
        to_period: i64,
    ) -> Result<Vec<StoredBucket>, StoreError> {
        let mut buckets: Vec<StoredBucket> = self
            .lock()
            .buckets
            .values()
            .filter(|b| {
                b.kind == kind
                    && b.key.subject_id == subject_id
                    && b.key.period_index >= from_period
                    && b.key.period_index <= to_period
            })
            .cloned()
            .collect();
        buckets.sort_by_key(|b| b.key.period_index);
        Ok(buckets)
    }

    async fn count_buckets(
        &self,
        kind: BucketKind,
        subject_id: &str,
    ) -> Result<usize, StoreError> {
        Ok(self
            .lock()
            .buckets
            .values()
            .filter(|b| b.kind == kind && b.key.subject_id == subject_id)
            .count())
    }

    async fn load_cursor(&self, name: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.lock().cursors.get(name).copied())
    }

    async fn save_cursor(&self, name: &str, seq: u64) -> Result<(), StoreError> {
        self.lock().cursors.insert(name.to_string(), seq);
        Ok(())
    }

    async fn save_deferred_pair(&self, created: &PairCreated) -> Result<(), StoreError> {
        self.lock()
            .deferred
            .insert(created.pair.clone(), created.clone());
        Ok(())
    }

    async fn load_deferred_pair(&self, pair: &PairId) -> Result<Option<PairCreated>, StoreError> {
        Ok(self.lock().deferred.get(pair).cloned())
    }

    async fn remove_deferred_pair(&self, pair: &PairId) -> Result<bool, StoreError> {
        Ok(self.lock().deferred.remove(pair).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BucketKey, CandleBucket, Decimal, Resolution, Timestamp};
    use crate::store::{load_aggregate, save_aggregate};

    fn candle(subject: &str, ts: u64) -> CandleBucket {
        let key = BucketKey::derive(subject, Resolution::Hour, Timestamp::new(ts));
        CandleBucket::new(key, SubjectId::new(subject), Decimal::from(1i64))
    }

    #[tokio::test]
    async fn test_save_load_remove_bucket() {
        let store = MemoryStore::new();
        let bucket = candle("a", 7_200);
        save_aggregate(&store, BucketKind::TokenHour, &bucket)
            .await
            .unwrap();

        let loaded: Option<CandleBucket> = load_aggregate(&store, BucketKind::TokenHour, "a-2")
            .await
            .unwrap();
        assert_eq!(loaded, Some(bucket));

        // Same id under another kind is a different record.
        assert!(store
            .load_bucket(BucketKind::TokenMinute, "a-2")
            .await
            .unwrap()
            .is_none());

        assert!(store.remove_bucket(BucketKind::TokenHour, "a-2").await.unwrap());
        assert!(!store.remove_bucket(BucketKind::TokenHour, "a-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_buckets_filters_and_sorts() {
        let store = MemoryStore::new();
        for ts in [36_000, 3_600, 18_000] {
            save_aggregate(&store, BucketKind::TokenHour, &candle("a", ts))
                .await
                .unwrap();
        }
        save_aggregate(&store, BucketKind::TokenHour, &candle("b", 3_600))
            .await
            .unwrap();

        let listed = store
            .list_buckets(BucketKind::TokenHour, "a", 0, 5)
            .await
            .unwrap();
        let periods: Vec<i64> = listed.iter().map(|b| b.key.period_index).collect();
        assert_eq!(periods, vec![1, 5]);
        assert_eq!(store.count_buckets(BucketKind::TokenHour, "a").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_cursor_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.load_cursor("events").await.unwrap(), None);
        store.save_cursor("events", 42).await.unwrap();
        assert_eq!(store.load_cursor("events").await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_deferred_pair_save_and_remove() {
        let store = MemoryStore::new();
        let created = PairCreated {
            pair: PairId::new("0xp"),
            token0: SubjectId::new("0xa"),
            token1: SubjectId::new("0xb"),
            timestamp: Timestamp::new(5),
            block_number: 2,
        };

        store.save_deferred_pair(&created).await.unwrap();
        assert_eq!(
            store.load_deferred_pair(&created.pair).await.unwrap(),
            Some(created.clone())
        );
        assert!(store.remove_deferred_pair(&created.pair).await.unwrap());
        assert!(!store.remove_deferred_pair(&created.pair).await.unwrap());
        assert_eq!(store.load_deferred_pair(&created.pair).await.unwrap(), None);
    }
}
