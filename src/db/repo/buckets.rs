//! Bucket rows and ingest cursor operations for the repository.

use crate::domain::{BucketKey, BucketKind, Resolution};
use crate::store::{StoreError, StoredBucket};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;

use super::{now_ms, Repository};

fn bucket_from_row(kind: BucketKind, row: &SqliteRow) -> Result<StoredBucket, StoreError> {
    let resolution: String = row.try_get("resolution")?;
    let resolution = Resolution::from_str(&resolution).map_err(StoreError::Corrupt)?;
    let body: String = row.try_get("body")?;

    Ok(StoredBucket {
        kind,
        key: BucketKey {
            id: row.try_get("id")?,
            subject_id: row.try_get("subject_id")?,
            resolution,
            period_index: row.try_get("period_index")?,
            period_start: row.try_get("period_start")?,
        },
        body: serde_json::from_str(&body)?,
    })
}

impl Repository {
    /// Fetch one bucket by kind and id.
    ///
    /// # Errors
    /// Returns an error if the query fails or the row cannot be decoded.
    pub async fn get_bucket(
        &self,
        kind: BucketKind,
        id: &str,
    ) -> Result<Option<StoredBucket>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, subject_id, resolution, period_index, period_start, body
            FROM buckets
            WHERE kind = ? AND id = ?
            "#,
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| bucket_from_row(kind, &row)).transpose()
    }

    /// Insert a bucket or overwrite its body.
    ///
    /// # Errors
    /// Returns an error if encoding or the write fails.
    pub async fn upsert_bucket(&self, bucket: &StoredBucket) -> Result<(), StoreError> {
        let body = serde_json::to_string(&bucket.body)?;

        sqlx::query(
            r#"
            INSERT INTO buckets
                (kind, id, subject_id, resolution, period_index, period_start, body, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(kind, id) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(bucket.kind.as_str())
        .bind(&bucket.key.id)
        .bind(&bucket.key.subject_id)
        .bind(bucket.key.resolution.as_str())
        .bind(bucket.key.period_index)
        .bind(bucket.key.period_start)
        .bind(body)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a bucket. Returns `false` if no row matched.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub async fn delete_bucket(&self, kind: BucketKind, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM buckets WHERE kind = ? AND id = ?")
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Buckets of one subject within an inclusive period range, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row cannot be decoded.
    pub async fn query_buckets(
        &self,
        kind: BucketKind,
        subject_id: &str,
        from_period: i64,
        to_period: i64,
    ) -> Result<Vec<StoredBucket>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, subject_id, resolution, period_index, period_start, body
            FROM buckets
            WHERE kind = ? AND subject_id = ? AND period_index >= ? AND period_index <= ?
            ORDER BY period_index ASC
            "#,
        )
        .bind(kind.as_str())
        .bind(subject_id)
        .bind(from_period)
        .bind(to_period)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| bucket_from_row(kind, row)).collect()
    }

    /// Count live buckets of one subject.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn count_subject_buckets(
        &self,
        kind: BucketKind,
        subject_id: &str,
    ) -> Result<usize, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM buckets WHERE kind = ? AND subject_id = ?")
                .bind(kind.as_str())
                .bind(subject_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.max(0) as usize)
    }

    /// Read a named ingest cursor.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_cursor(&self, name: &str) -> Result<Option<u64>, StoreError> {
        let seq: Option<i64> = sqlx::query_scalar("SELECT seq FROM ingest_cursors WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(seq.map(|s| s.max(0) as u64))
    }

    /// Advance (or create) a named ingest cursor.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn upsert_cursor(&self, name: &str, seq: u64) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ingest_cursors (name, seq, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                seq = excluded.seq,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(name)
        .bind(seq as i64)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
