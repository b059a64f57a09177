//! SQLite-backed [`Store`] implementation.
//!
//! Methods are organized across submodules by record type:
//! - `entities.rs` - subjects, pairs, factory, pair lookups and deferred pairs
//! - `buckets.rs` - bucket rows and ingest cursors

mod buckets;
mod entities;

use crate::domain::{
    BucketKind, Decimal, Factory, Pair, PairCreated, PairId, Subject, SubjectId,
};
use crate::store::{Store, StoreError, StoredBucket};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository").finish_non_exhaustive()
    }
}

/// Read a TEXT decimal column. Stored values are canonical, so a parse failure is corruption.
fn decimal_col(row: &SqliteRow, column: &str) -> Result<Decimal, StoreError> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw)
        .map_err(|e| StoreError::Corrupt(format!("{} = {:?}: {}", column, raw, e)))
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait]
impl Store for Repository {
    async fn load_subject(&self, id: &SubjectId) -> Result<Option<Subject>, StoreError> {
        self.get_subject(id).await
    }

    async fn save_subject(&self, subject: &Subject) -> Result<(), StoreError> {
        self.upsert_subject(subject).await
    }

    async fn load_pair(&self, id: &PairId) -> Result<Option<Pair>, StoreError> {
        self.get_pair(id).await
    }

    async fn save_pair(&self, pair: &Pair) -> Result<(), StoreError> {
        self.upsert_pair(pair).await
    }

    async fn load_factory(&self, id: &str) -> Result<Option<Factory>, StoreError> {
        self.get_factory(id).await
    }

    async fn save_factory(&self, factory: &Factory) -> Result<(), StoreError> {
        self.upsert_factory(factory).await
    }

    async fn save_pair_lookup(
        &self,
        token_a: &SubjectId,
        token_b: &SubjectId,
        pair: &PairId,
    ) -> Result<(), StoreError> {
        self.upsert_pair_lookup(token_a, token_b, pair).await
    }

    async fn find_pair(
        &self,
        token_a: &SubjectId,
        token_b: &SubjectId,
    ) -> Result<Option<PairId>, StoreError> {
        self.get_pair_lookup(token_a, token_b).await
    }

    async fn load_bucket(
        &self,
        kind: BucketKind,
        id: &str,
    ) -> Result<Option<StoredBucket>, StoreError> {
        self.get_bucket(kind, id).await
    }

    async fn save_bucket(&self, bucket: &StoredBucket) -> Result<(), StoreError> {
        self.upsert_bucket(bucket).await
    }

    async fn remove_bucket(&self, kind: BucketKind, id: &str) -> Result<bool, StoreError> {
        self.delete_bucket(kind, id).await
    }

    async fn list_buckets(
        &self,
        kind: BucketKind,
        subject_id: &str,
        from_period: i64,
        to_period: i64,
    ) -> Result<Vec<StoredBucket>, StoreError> {
        self.query_buckets(kind, subject_id, from_period, to_period)
            .await
    }

    async fn count_buckets(
        &self,
        kind: BucketKind,
        subject_id: &str,
    ) -> Result<usize, StoreError> {
        self.count_subject_buckets(kind, subject_id).await
    }

    async fn load_cursor(&self, name: &str) -> Result<Option<u64>, StoreError> {
        self.get_cursor(name).await
    }

    async fn save_cursor(&self, name: &str, seq: u64) -> Result<(), StoreError> {
        self.upsert_cursor(name, seq).await
    }

    async fn save_deferred_pair(&self, created: &PairCreated) -> Result<(), StoreError> {
        self.upsert_deferred_pair(created).await
    }

    async fn load_deferred_pair(&self, pair: &PairId) -> Result<Option<PairCreated>, StoreError> {
        self.get_deferred_pair(pair).await
    }

    async fn remove_deferred_pair(&self, pair: &PairId) -> Result<bool, StoreError> {
        self.delete_deferred_pair(pair).await
    }
}
