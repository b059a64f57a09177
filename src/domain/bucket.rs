//! Time-bucketed aggregates.
//!
//! Every bucket carries its [`BucketKey`]; at most one bucket exists per
//! `(kind, subject, period)`.

use super::{BucketKey, Decimal, Ohlc, PairId, Resolution, SubjectId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which aggregate a stored bucket holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    FactoryDay,
    PairDay,
    PairHour,
    TokenDay,
    TokenHour,
    TokenMinute,
}

impl BucketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketKind::FactoryDay => "factory_day",
            BucketKind::PairDay => "pair_day",
            BucketKind::PairHour => "pair_hour",
            BucketKind::TokenDay => "token_day",
            BucketKind::TokenHour => "token_hour",
            BucketKind::TokenMinute => "token_minute",
        }
    }

    /// Candle kind for a per-subject price series, if the resolution tracks OHLC.
    pub fn candle(resolution: Resolution) -> Option<BucketKind> {
        match resolution {
            Resolution::Hour => Some(BucketKind::TokenHour),
            Resolution::Minute => Some(BucketKind::TokenMinute),
            Resolution::Day => None,
        }
    }
}

impl fmt::Display for BucketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "factory_day" => Ok(BucketKind::FactoryDay),
            "pair_day" => Ok(BucketKind::PairDay),
            "pair_hour" => Ok(BucketKind::PairHour),
            "token_day" => Ok(BucketKind::TokenDay),
            "token_hour" => Ok(BucketKind::TokenHour),
            "token_minute" => Ok(BucketKind::TokenMinute),
            other => Err(format!("unknown bucket kind: {}", other)),
        }
    }
}

/// A persisted aggregate addressable by its key.
pub trait Aggregate: Clone + Serialize + DeserializeOwned + Send + Sync {
    fn key(&self) -> &BucketKey;
}

macro_rules! impl_aggregate {
    ($($ty:ty),*) => {
        $(impl Aggregate for $ty {
            fn key(&self) -> &BucketKey {
                &self.key
            }
        })*
    };
}

impl_aggregate!(
    FactoryDayBucket,
    PairDayBucket,
    PairHourBucket,
    TokenDayBucket,
    CandleBucket
);

/// Registry-wide totals for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryDayBucket {
    pub key: BucketKey,
    pub daily_volume_usd: Decimal,
    pub daily_volume_eth: Decimal,
    pub daily_volume_untracked: Decimal,
    pub total_volume_usd: Decimal,
    pub total_volume_eth: Decimal,
    pub total_liquidity_usd: Decimal,
    pub total_liquidity_eth: Decimal,
    /// Registry transaction count as of the last update.
    pub tx_count: i64,
    pub daily_txns: i64,
}

impl FactoryDayBucket {
    pub fn new(key: BucketKey) -> Self {
        Self {
            key,
            daily_volume_usd: Decimal::zero(),
            daily_volume_eth: Decimal::zero(),
            daily_volume_untracked: Decimal::zero(),
            total_volume_usd: Decimal::zero(),
            total_volume_eth: Decimal::zero(),
            total_liquidity_usd: Decimal::zero(),
            total_liquidity_eth: Decimal::zero(),
            tx_count: 0,
            daily_txns: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairDayBucket {
    pub key: BucketKey,
    pub pair: PairId,
    pub token0: SubjectId,
    pub token1: SubjectId,
    pub daily_volume_token0: Decimal,
    pub daily_volume_token1: Decimal,
    pub daily_volume_usd: Decimal,
    pub daily_txns: i64,
    pub total_supply: Decimal,
    pub reserve0: Decimal,
    pub reserve1: Decimal,
    pub reserve_usd: Decimal,
}

impl PairDayBucket {
    pub fn new(key: BucketKey, pair: PairId, token0: SubjectId, token1: SubjectId) -> Self {
        Self {
            key,
            pair,
            token0,
            token1,
            daily_volume_token0: Decimal::zero(),
            daily_volume_token1: Decimal::zero(),
            daily_volume_usd: Decimal::zero(),
            daily_txns: 0,
            total_supply: Decimal::zero(),
            reserve0: Decimal::zero(),
            reserve1: Decimal::zero(),
            reserve_usd: Decimal::zero(),
        }
    }
}

/// Pair-scoped hour bucket. Not subject to the rolling archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairHourBucket {
    pub key: BucketKey,
    pub pair: PairId,
    pub hourly_volume_token0: Decimal,
    pub hourly_volume_token1: Decimal,
    pub hourly_volume_usd: Decimal,
    pub hourly_txns: i64,
    pub total_supply: Decimal,
    pub reserve0: Decimal,
    pub reserve1: Decimal,
    pub reserve_usd: Decimal,
}

impl PairHourBucket {
    pub fn new(key: BucketKey, pair: PairId) -> Self {
        Self {
            key,
            pair,
            hourly_volume_token0: Decimal::zero(),
            hourly_volume_token1: Decimal::zero(),
            hourly_volume_usd: Decimal::zero(),
            hourly_txns: 0,
            total_supply: Decimal::zero(),
            reserve0: Decimal::zero(),
            reserve1: Decimal::zero(),
            reserve_usd: Decimal::zero(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDayBucket {
    pub key: BucketKey,
    pub token: SubjectId,
    pub price_usd: Decimal,
    pub daily_volume_token: Decimal,
    pub daily_volume_eth: Decimal,
    pub daily_volume_usd: Decimal,
    pub daily_txns: i64,
    pub total_liquidity_token: Decimal,
    pub total_liquidity_eth: Decimal,
    pub total_liquidity_usd: Decimal,
}

impl TokenDayBucket {
    pub fn new(key: BucketKey, token: SubjectId) -> Self {
        Self {
            key,
            token,
            price_usd: Decimal::zero(),
            daily_volume_token: Decimal::zero(),
            daily_volume_eth: Decimal::zero(),
            daily_volume_usd: Decimal::zero(),
            daily_txns: 0,
            total_liquidity_token: Decimal::zero(),
            total_liquidity_eth: Decimal::zero(),
            total_liquidity_usd: Decimal::zero(),
        }
    }
}

/// Hour or minute price candle for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandleBucket {
    pub key: BucketKey,
    pub token: SubjectId,
    #[serde(flatten)]
    pub ohlc: Ohlc,
    pub price_usd: Decimal,
    pub volume: Decimal,
    pub volume_usd: Decimal,
    pub untracked_volume_usd: Decimal,
    pub fees_usd: Decimal,
    pub txns: i64,
}

impl CandleBucket {
    pub fn new(key: BucketKey, token: SubjectId, price_usd: Decimal) -> Self {
        Self {
            key,
            token,
            ohlc: Ohlc::open_at(price_usd),
            price_usd,
            volume: Decimal::zero(),
            volume_usd: Decimal::zero(),
            untracked_volume_usd: Decimal::zero(),
            fees_usd: Decimal::zero(),
            txns: 0,
        }
    }
}
