pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod store;

pub use config::Config;
pub use datasource::{
    EventSource, HttpLedgerSource, MetadataSource, MockEventSource, MockMetadataSource,
    MockPairDiscovery, PairDiscovery, SourceError,
};
pub use db::{init_db, Repository};
pub use domain::{
    BucketKey, BucketKind, Decimal, LedgerEvent, PairCreated, PairId, Resolution,
    RetentionPolicy, SequencedItem, SourceItem, SubjectId, Timestamp,
};
pub use error::AppError;
pub use orchestration::{AggregationContext, Orchestrator, Pipeline, Registrar};
pub use store::{MemoryStore, Store, StoreError};
