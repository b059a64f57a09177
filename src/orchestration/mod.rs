//! Event-driven aggregation: registration, per-event rollups, archiving and the ingest loop.

pub mod archiver;
pub mod context;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod upsert;

pub use archiver::{ArchiveOutcome, RollingArchiver};
pub use context::AggregationContext;
pub use orchestrator::{AggregationError, EventOutcome, Orchestrator, ParentKind};
pub use pipeline::{BatchReport, Pipeline, PipelineError, EVENTS_CURSOR};
pub use registry::{HydrationReport, Registrar, Registration, RegistrationError};
pub use upsert::{upsert, Upserted};
