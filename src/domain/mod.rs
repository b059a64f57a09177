//! Domain types for the multi-resolution rollup.
//!
//! This module provides:
//! - Exact numeric handling via the Decimal wrapper
//! - Primitives: Timestamp, SubjectId, PairId
//! - Period resolutions and bucket key derivation
//! - Subjects, pairs, the factory record and their retention ledgers
//! - Bucket aggregates and upstream event items

pub mod bucket;
pub mod decimal;
pub mod entity;
pub mod event;
pub mod ohlc;
pub mod period;
pub mod primitives;
pub mod retention;

pub use bucket::{
    Aggregate, BucketKind, CandleBucket, FactoryDayBucket, PairDayBucket, PairHourBucket,
    TokenDayBucket,
};
pub use decimal::{Decimal, DecimalOverflow};
pub use entity::{Factory, Pair, Subject, TokenMetadata};
pub use event::{LedgerEvent, PairCreated, SequencedItem, SourceItem, SwapVolume};
pub use ohlc::Ohlc;
pub use period::{bucket_id, BucketKey, Resolution};
pub use primitives::{PairId, SubjectId, Timestamp};
pub use retention::{RetentionLedger, RetentionPolicy};
