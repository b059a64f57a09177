//! Long-lived entities: subjects (tokens), pairs and the factory registry record.

use super::{Decimal, PairId, Resolution, RetentionLedger, SubjectId, Timestamp};
use serde::{Deserialize, Serialize};

/// Descriptive metadata resolved once when a subject is first registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    /// `None` when the upstream could not resolve decimals.
    pub decimals: Option<u32>,
    pub total_supply: Decimal,
}

/// A tracked instrument with its running totals and retention ledgers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    pub total_supply: Decimal,
    /// Price in reference units.
    pub derived_price: Decimal,
    pub trade_volume: Decimal,
    pub trade_volume_usd: Decimal,
    pub untracked_volume_usd: Decimal,
    pub total_liquidity: Decimal,
    pub tx_count: i64,
    pub hour_ledger: RetentionLedger,
    pub minute_ledger: RetentionLedger,
}

impl Subject {
    pub fn new(id: SubjectId, metadata: &TokenMetadata, decimals: u32) -> Self {
        Self {
            id,
            symbol: metadata.symbol.clone(),
            name: metadata.name.clone(),
            decimals,
            total_supply: metadata.total_supply,
            derived_price: Decimal::zero(),
            trade_volume: Decimal::zero(),
            trade_volume_usd: Decimal::zero(),
            untracked_volume_usd: Decimal::zero(),
            total_liquidity: Decimal::zero(),
            tx_count: 0,
            hour_ledger: RetentionLedger::new(),
            minute_ledger: RetentionLedger::new(),
        }
    }

    /// Retention ledger for a fine resolution; day buckets are never archived.
    pub fn ledger_mut(&mut self, resolution: Resolution) -> Option<&mut RetentionLedger> {
        match resolution {
            Resolution::Hour => Some(&mut self.hour_ledger),
            Resolution::Minute => Some(&mut self.minute_ledger),
            Resolution::Day => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub id: PairId,
    pub token0: SubjectId,
    pub token1: SubjectId,
    pub reserve0: Decimal,
    pub reserve1: Decimal,
    pub reserve_eth: Decimal,
    pub reserve_usd: Decimal,
    pub total_supply: Decimal,
    /// reserve0 / reserve1
    pub token0_price: Decimal,
    /// reserve1 / reserve0
    pub token1_price: Decimal,
    pub volume_token0: Decimal,
    pub volume_token1: Decimal,
    pub volume_usd: Decimal,
    pub untracked_volume_usd: Decimal,
    pub tx_count: i64,
    pub created_at_timestamp: Timestamp,
    pub created_at_block: u64,
}

impl Pair {
    pub fn new(
        id: PairId,
        token0: SubjectId,
        token1: SubjectId,
        created_at_timestamp: Timestamp,
        created_at_block: u64,
    ) -> Self {
        Self {
            id,
            token0,
            token1,
            reserve0: Decimal::zero(),
            reserve1: Decimal::zero(),
            reserve_eth: Decimal::zero(),
            reserve_usd: Decimal::zero(),
            total_supply: Decimal::zero(),
            token0_price: Decimal::zero(),
            token1_price: Decimal::zero(),
            volume_token0: Decimal::zero(),
            volume_token1: Decimal::zero(),
            volume_usd: Decimal::zero(),
            untracked_volume_usd: Decimal::zero(),
            tx_count: 0,
            created_at_timestamp,
            created_at_block,
        }
    }
}

/// Registry record shared by every pair, keyed by the configured factory id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factory {
    pub id: String,
    pub pair_count: i64,
    pub tx_count: i64,
    pub total_volume_usd: Decimal,
    pub total_volume_eth: Decimal,
    pub untracked_volume_usd: Decimal,
    pub total_liquidity_usd: Decimal,
    pub total_liquidity_eth: Decimal,
}

impl Factory {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pair_count: 0,
            tx_count: 0,
            total_volume_usd: Decimal::zero(),
            total_volume_eth: Decimal::zero(),
            untracked_volume_usd: Decimal::zero(),
            total_liquidity_usd: Decimal::zero(),
            total_liquidity_eth: Decimal::zero(),
        }
    }
}
