//! Sequential ingest loop from the upstream event stream into the orchestrator.

use crate::datasource::{EventSource, SourceError};
use crate::domain::{PairCreated, SequencedItem, SourceItem};
use crate::orchestration::orchestrator::{AggregationError, Orchestrator};
use crate::orchestration::registry::{Registrar, Registration, RegistrationError};
use crate::store::{Store, StoreError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Cursor name under which the last processed sequence number is stored.
pub const EVENTS_CURSOR: &str = "events";

/// Counts for one fetched batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub fetched: usize,
    pub pairs_registered: usize,
    pub events_applied: usize,
    /// Ledger events dropped because their pair's registration is deferred.
    pub events_skipped: usize,
}

pub struct Pipeline {
    source: Arc<dyn EventSource>,
    store: Arc<dyn Store>,
    registrar: Registrar,
    orchestrator: Orchestrator,
    batch_size: usize,
    poll_interval: Duration,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn EventSource>,
        store: Arc<dyn Store>,
        registrar: Registrar,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            source,
            store,
            registrar,
            orchestrator,
            batch_size: 500,
            poll_interval: Duration::from_millis(1000),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Fetch one batch after the stored cursor and process it item by item.
    ///
    /// The cursor is saved after every item. On error the cursor stays on the
    /// last item that completed, so the failed item is fetched again next time.
    pub async fn run_once(&mut self) -> Result<BatchReport, PipelineError> {
        let after = self.store.load_cursor(EVENTS_CURSOR).await?;
        let items = self.source.fetch_events(after, self.batch_size).await?;

        let mut report = BatchReport {
            fetched: items.len(),
            ..Default::default()
        };

        for item in items {
            if after.is_some_and(|after| item.seq <= after) {
                continue;
            }
            self.process_item(&item, &mut report).await?;
            self.store.save_cursor(EVENTS_CURSOR, item.seq).await?;
        }

        if report.fetched > 0 {
            debug!(
                fetched = report.fetched,
                registered = report.pairs_registered,
                applied = report.events_applied,
                skipped = report.events_skipped,
                "Processed batch"
            );
        }
        Ok(report)
    }

    /// Poll forever. Upstream failures, including metadata lookups during
    /// registration, are retried after the poll interval; anything else halts
    /// the loop and is returned.
    pub async fn run(mut self) -> Result<(), PipelineError> {
        loop {
            match self.run_once().await {
                Ok(report) if report.fetched >= self.batch_size => continue,
                Ok(_) => tokio::time::sleep(self.poll_interval).await,
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "Upstream unavailable, retrying");
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => {
                    error!(error = %e, "Pipeline halted");
                    return Err(e);
                }
            }
        }
    }

    async fn process_item(
        &mut self,
        item: &SequencedItem,
        report: &mut BatchReport,
    ) -> Result<(), PipelineError> {
        match &item.item {
            SourceItem::PairCreated(created) => {
                if self.register(created).await? {
                    report.pairs_registered += 1;
                }
            }
            SourceItem::Ledger(event) => {
                if let Some(created) = self.store.load_deferred_pair(&event.pair).await? {
                    if self.register(&created).await? {
                        report.pairs_registered += 1;
                    } else {
                        warn!(seq = item.seq, pair = %event.pair, "Skipping event for deferred pair");
                        report.events_skipped += 1;
                        return Ok(());
                    }
                }
                self.orchestrator.process_event(event).await?;
                report.events_applied += 1;
            }
        }
        Ok(())
    }

    /// Returns whether the pair is now registered.
    ///
    /// Deferred announcements are kept in the store so a restarted pipeline
    /// still retries them on the pair's next event.
    async fn register(&mut self, created: &PairCreated) -> Result<bool, PipelineError> {
        match self.registrar.register_pair(created).await? {
            Registration::Registered | Registration::AlreadyRegistered => {
                self.store.remove_deferred_pair(&created.pair).await?;
                Ok(true)
            }
            Registration::Deferred { .. } => {
                self.store.save_deferred_pair(created).await?;
                Ok(false)
            }
            Registration::Rejected => Ok(false),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Whether the failure came from an upstream service and the same item can be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PipelineError::Source(_) | PipelineError::Registration(RegistrationError::Source(_))
        )
    }
}
