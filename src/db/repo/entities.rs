//! Subject, pair, factory, pair-lookup and deferred-pair operations for the repository.

use crate::domain::{
    Factory, Pair, PairCreated, PairId, RetentionLedger, Subject, SubjectId, Timestamp,
};
use crate::store::StoreError;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::VecDeque;

use super::{decimal_col, now_ms, Repository};

fn ledger_from_row(
    row: &SqliteRow,
    recorded: &str,
    archived: &str,
    pending: &str,
) -> Result<RetentionLedger, StoreError> {
    let raw: String = row.try_get(pending)?;
    let pending: VecDeque<i64> = serde_json::from_str(&raw)?;
    Ok(RetentionLedger {
        last_recorded: row.try_get(recorded)?,
        last_archived: row.try_get(archived)?,
        pending,
    })
}

fn subject_from_row(row: &SqliteRow) -> Result<Subject, StoreError> {
    let decimals: i64 = row.try_get("decimals")?;
    let decimals = u32::try_from(decimals)
        .map_err(|_| StoreError::Corrupt(format!("decimals = {}", decimals)))?;

    Ok(Subject {
        id: SubjectId::new(row.try_get::<String, _>("id")?),
        symbol: row.try_get("symbol")?,
        name: row.try_get("name")?,
        decimals,
        total_supply: decimal_col(row, "total_supply")?,
        derived_price: decimal_col(row, "derived_price")?,
        trade_volume: decimal_col(row, "trade_volume")?,
        trade_volume_usd: decimal_col(row, "trade_volume_usd")?,
        untracked_volume_usd: decimal_col(row, "untracked_volume_usd")?,
        total_liquidity: decimal_col(row, "total_liquidity")?,
        tx_count: row.try_get("tx_count")?,
        hour_ledger: ledger_from_row(
            row,
            "last_hour_recorded",
            "last_hour_archived",
            "hour_pending",
        )?,
        minute_ledger: ledger_from_row(
            row,
            "last_minute_recorded",
            "last_minute_archived",
            "minute_pending",
        )?,
    })
}

fn pair_from_row(row: &SqliteRow) -> Result<Pair, StoreError> {
    let created_ts: i64 = row.try_get("created_at_timestamp")?;
    let created_block: i64 = row.try_get("created_at_block")?;

    Ok(Pair {
        id: PairId::new(row.try_get::<String, _>("id")?),
        token0: SubjectId::new(row.try_get::<String, _>("token0")?),
        token1: SubjectId::new(row.try_get::<String, _>("token1")?),
        reserve0: decimal_col(row, "reserve0")?,
        reserve1: decimal_col(row, "reserve1")?,
        reserve_eth: decimal_col(row, "reserve_eth")?,
        reserve_usd: decimal_col(row, "reserve_usd")?,
        total_supply: decimal_col(row, "total_supply")?,
        token0_price: decimal_col(row, "token0_price")?,
        token1_price: decimal_col(row, "token1_price")?,
        volume_token0: decimal_col(row, "volume_token0")?,
        volume_token1: decimal_col(row, "volume_token1")?,
        volume_usd: decimal_col(row, "volume_usd")?,
        untracked_volume_usd: decimal_col(row, "untracked_volume_usd")?,
        tx_count: row.try_get("tx_count")?,
        created_at_timestamp: Timestamp::new(created_ts.max(0) as u64),
        created_at_block: created_block.max(0) as u64,
    })
}

impl Repository {
    /// Fetch a subject with both retention ledgers.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored column cannot be decoded.
    pub async fn get_subject(&self, id: &SubjectId) -> Result<Option<Subject>, StoreError> {
        let row = sqlx::query("SELECT * FROM subjects WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(subject_from_row).transpose()
    }

    /// Insert or replace a subject.
    ///
    /// Pending period lists are stored as JSON arrays alongside the watermarks.
    ///
    /// # Errors
    /// Returns an error if encoding or the write fails.
    pub async fn upsert_subject(&self, subject: &Subject) -> Result<(), StoreError> {
        let hour_pending = serde_json::to_string(&subject.hour_ledger.pending)?;
        let minute_pending = serde_json::to_string(&subject.minute_ledger.pending)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO subjects
                (id, symbol, name, decimals, total_supply, derived_price, trade_volume,
                 trade_volume_usd, untracked_volume_usd, total_liquidity, tx_count,
                 last_hour_recorded, last_hour_archived, hour_pending,
                 last_minute_recorded, last_minute_archived, minute_pending, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(subject.id.as_str())
        .bind(&subject.symbol)
        .bind(&subject.name)
        .bind(i64::from(subject.decimals))
        .bind(subject.total_supply.to_canonical_string())
        .bind(subject.derived_price.to_canonical_string())
        .bind(subject.trade_volume.to_canonical_string())
        .bind(subject.trade_volume_usd.to_canonical_string())
        .bind(subject.untracked_volume_usd.to_canonical_string())
        .bind(subject.total_liquidity.to_canonical_string())
        .bind(subject.tx_count)
        .bind(subject.hour_ledger.last_recorded)
        .bind(subject.hour_ledger.last_archived)
        .bind(hour_pending)
        .bind(subject.minute_ledger.last_recorded)
        .bind(subject.minute_ledger.last_archived)
        .bind(minute_pending)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a pair by id.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored column cannot be decoded.
    pub async fn get_pair(&self, id: &PairId) -> Result<Option<Pair>, StoreError> {
        let row = sqlx::query("SELECT * FROM pairs WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(pair_from_row).transpose()
    }

    /// Insert or replace a pair.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn upsert_pair(&self, pair: &Pair) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO pairs
                (id, token0, token1, reserve0, reserve1, reserve_eth, reserve_usd, total_supply,
                 token0_price, token1_price, volume_token0, volume_token1, volume_usd,
                 untracked_volume_usd, tx_count, created_at_timestamp, created_at_block, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(pair.id.as_str())
        .bind(pair.token0.as_str())
        .bind(pair.token1.as_str())
        .bind(pair.reserve0.to_canonical_string())
        .bind(pair.reserve1.to_canonical_string())
        .bind(pair.reserve_eth.to_canonical_string())
        .bind(pair.reserve_usd.to_canonical_string())
        .bind(pair.total_supply.to_canonical_string())
        .bind(pair.token0_price.to_canonical_string())
        .bind(pair.token1_price.to_canonical_string())
        .bind(pair.volume_token0.to_canonical_string())
        .bind(pair.volume_token1.to_canonical_string())
        .bind(pair.volume_usd.to_canonical_string())
        .bind(pair.untracked_volume_usd.to_canonical_string())
        .bind(pair.tx_count)
        .bind(pair.created_at_timestamp.as_secs() as i64)
        .bind(pair.created_at_block as i64)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch the factory record.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored column cannot be decoded.
    pub async fn get_factory(&self, id: &str) -> Result<Option<Factory>, StoreError> {
        let row = sqlx::query("SELECT * FROM factories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Factory {
            id: row.try_get("id")?,
            pair_count: row.try_get("pair_count")?,
            tx_count: row.try_get("tx_count")?,
            total_volume_usd: decimal_col(&row, "total_volume_usd")?,
            total_volume_eth: decimal_col(&row, "total_volume_eth")?,
            untracked_volume_usd: decimal_col(&row, "untracked_volume_usd")?,
            total_liquidity_usd: decimal_col(&row, "total_liquidity_usd")?,
            total_liquidity_eth: decimal_col(&row, "total_liquidity_eth")?,
        }))
    }

    /// Insert or replace the factory record.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn upsert_factory(&self, factory: &Factory) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO factories
                (id, pair_count, tx_count, total_volume_usd, total_volume_eth,
                 untracked_volume_usd, total_liquidity_usd, total_liquidity_eth, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&factory.id)
        .bind(factory.pair_count)
        .bind(factory.tx_count)
        .bind(factory.total_volume_usd.to_canonical_string())
        .bind(factory.total_volume_eth.to_canonical_string())
        .bind(factory.untracked_volume_usd.to_canonical_string())
        .bind(factory.total_liquidity_usd.to_canonical_string())
        .bind(factory.total_liquidity_eth.to_canonical_string())
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record a directional token-pair lookup.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn upsert_pair_lookup(
        &self,
        token_a: &SubjectId,
        token_b: &SubjectId,
        pair: &PairId,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT OR REPLACE INTO pair_token_lookups (token_a, token_b, pair) VALUES (?, ?, ?)",
        )
        .bind(token_a.as_str())
        .bind(token_b.as_str())
        .bind(pair.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Resolve the pair trading `token_a` against `token_b`.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_pair_lookup(
        &self,
        token_a: &SubjectId,
        token_b: &SubjectId,
    ) -> Result<Option<PairId>, StoreError> {
        let pair: Option<String> = sqlx::query_scalar(
            "SELECT pair FROM pair_token_lookups WHERE token_a = ? AND token_b = ?",
        )
        .bind(token_a.as_str())
        .bind(token_b.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(pair.map(PairId::new))
    }

    /// Store a pair announcement awaiting registration, keyed by pair id.
    ///
    /// # Errors
    /// Returns an error if encoding or the write fails.
    pub async fn upsert_deferred_pair(&self, created: &PairCreated) -> Result<(), StoreError> {
        let body = serde_json::to_string(created)?;

        sqlx::query("INSERT OR REPLACE INTO deferred_pairs (pair, body, updated_at) VALUES (?, ?, ?)")
            .bind(created.pair.as_str())
            .bind(body)
            .bind(now_ms())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Fetch a deferred pair announcement.
    ///
    /// # Errors
    /// Returns an error if the query fails or the stored body cannot be decoded.
    pub async fn get_deferred_pair(&self, pair: &PairId) -> Result<Option<PairCreated>, StoreError> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM deferred_pairs WHERE pair = ?")
                .bind(pair.as_str())
                .fetch_optional(&self.pool)
                .await?;

        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    /// Drop a deferred pair announcement; returns whether a row was removed.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub async fn delete_deferred_pair(&self, pair: &PairId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM deferred_pairs WHERE pair = ?")
            .bind(pair.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
