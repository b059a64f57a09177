//! Bounded eviction of fine-grained candles behind a subject's retention window.

use crate::domain::{bucket_id, BucketKind, Resolution, RetentionPolicy, Subject};
use crate::store::{Store, StoreError};
use tracing::{info, warn};

/// What one archiver call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveOutcome {
    /// Periods whose buckets were removed, oldest first.
    pub removed: Vec<i64>,
    pub last_recorded: i64,
    pub last_archived: i64,
}

/// Runs on the first write of a new hour or minute period.
pub struct RollingArchiver<'a> {
    store: &'a dyn Store,
}

impl<'a> RollingArchiver<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Record `period` in the subject's ledger and sweep anything behind the window.
    ///
    /// At most `policy.cap` buckets are removed per call; overdue periods left
    /// behind are picked up by the next new period. The subject is persisted
    /// before returning. Day resolution is never archived and returns an empty
    /// outcome without touching the store.
    pub async fn on_period_created(
        &self,
        subject: &mut Subject,
        resolution: Resolution,
        period: i64,
        policy: RetentionPolicy,
    ) -> Result<ArchiveOutcome, StoreError> {
        let Some(kind) = BucketKind::candle(resolution) else {
            return Ok(ArchiveOutcome::default());
        };
        let subject_id = subject.id.clone();
        let Some(ledger) = subject.ledger_mut(resolution) else {
            return Ok(ArchiveOutcome::default());
        };

        if !ledger.record(period) {
            warn!(
                subject = %subject_id,
                %resolution,
                period,
                newest = ?ledger.pending.back(),
                "Refusing non-monotonic pending period"
            );
        }
        ledger.init_watermarks(period);

        let removed = match ledger.due_cutoff(period, policy.window) {
            Some(cutoff) => ledger.sweep(cutoff, policy.cap),
            None => Vec::new(),
        };
        ledger.last_recorded = period;

        let outcome = ArchiveOutcome {
            removed,
            last_recorded: ledger.last_recorded,
            last_archived: ledger.last_archived,
        };

        for archived in &outcome.removed {
            self.store
                .remove_bucket(kind, &bucket_id(subject_id.as_str(), *archived))
                .await?;
        }
        self.store.save_subject(subject).await?;

        if !outcome.removed.is_empty() {
            info!(
                subject = %subject_id,
                %resolution,
                removed = outcome.removed.len(),
                last_archived = outcome.last_archived,
                "Archived expired buckets"
            );
        }

        Ok(outcome)
    }
}
