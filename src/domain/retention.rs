//! Per-subject retention ledger for fine-grained buckets.
//!
//! The ledger holds the period indices of every live bucket at one resolution,
//! oldest first, plus the `last_recorded` / `last_archived` watermarks. Sweeps
//! pop from the front so each one resumes where the previous one stopped.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Retention window and per-sweep eviction cap for one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Number of periods kept behind the current one.
    pub window: i64,
    /// Maximum buckets removed by a single sweep.
    pub cap: usize,
}

impl RetentionPolicy {
    pub const HOUR: RetentionPolicy = RetentionPolicy {
        window: 768,
        cap: 1000,
    };

    pub const MINUTE: RetentionPolicy = RetentionPolicy {
        window: 1680,
        cap: 500,
    };
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionLedger {
    pub last_recorded: i64,
    pub last_archived: i64,
    /// Periods created but not yet archived; strictly increasing.
    pub pending: VecDeque<i64>,
}

impl RetentionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a newly created period.
    ///
    /// Returns false, leaving the ledger untouched, if `period` would break the
    /// strictly increasing order.
    pub fn record(&mut self, period: i64) -> bool {
        if let Some(&newest) = self.pending.back() {
            if period <= newest {
                return false;
            }
        }
        self.pending.push_back(period);
        true
    }

    /// Place the watermarks one period apart the first time the subject is seen.
    pub fn init_watermarks(&mut self, period: i64) {
        if self.last_archived == 0 && self.last_recorded == 0 {
            self.last_recorded = period;
            self.last_archived = period - 1;
        }
    }

    /// Archive cutoff for `period`, or `None` when nothing is due.
    pub fn due_cutoff(&self, period: i64, window: i64) -> Option<i64> {
        let cutoff = period - window;
        if cutoff > self.last_archived {
            Some(cutoff)
        } else {
            None
        }
    }

    /// Pop up to `cap` periods at or below `cutoff` from the front.
    ///
    /// `last_archived` ends one below the last popped period. A pass that pops
    /// nothing still steps it down by one from its current value, so repeated
    /// empty passes drift it backwards. An empty ledger is left untouched.
    pub fn sweep(&mut self, cutoff: i64, cap: usize) -> Vec<i64> {
        if self.pending.is_empty() {
            return Vec::new();
        }

        let mut last = self.last_archived;
        let mut removed = Vec::new();
        while removed.len() < cap {
            match self.pending.front() {
                Some(&period) if period <= cutoff => {
                    self.pending.pop_front();
                    removed.push(period);
                    last = period;
                }
                _ => break,
            }
        }

        self.last_archived = last - 1;
        removed
    }

    /// Periods still retained.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(periods: &[i64], last_recorded: i64, last_archived: i64) -> RetentionLedger {
        RetentionLedger {
            last_recorded,
            last_archived,
            pending: periods.iter().copied().collect(),
        }
    }

    #[test]
    fn test_record_rejects_non_increasing() {
        let mut ledger = RetentionLedger::new();
        assert!(ledger.record(3));
        assert!(ledger.record(5));
        assert!(!ledger.record(5));
        assert!(!ledger.record(4));
        assert_eq!(ledger.pending, VecDeque::from(vec![3, 5]));
    }

    #[test]
    fn test_init_watermarks_only_once() {
        let mut ledger = RetentionLedger::new();
        ledger.init_watermarks(100);
        assert_eq!((ledger.last_recorded, ledger.last_archived), (100, 99));

        ledger.init_watermarks(200);
        assert_eq!((ledger.last_recorded, ledger.last_archived), (100, 99));
    }

    #[test]
    fn test_due_cutoff_requires_cutoff_beyond_watermark() {
        let ledger = ledger_with(&[], 10, 4);
        assert_eq!(ledger.due_cutoff(6, 2), None);
        assert_eq!(ledger.due_cutoff(7, 2), Some(5));
    }

    #[test]
    fn test_sweep_stops_at_cap_and_lags_watermark() {
        let mut ledger = ledger_with(&[0, 1, 2, 3, 4, 5], 4, -1);
        let removed = ledger.sweep(3, 2);
        assert_eq!(removed, vec![0, 1]);
        // one below the last removed period, not the period itself
        assert_eq!(ledger.last_archived, 0);
        assert_eq!(ledger.pending, VecDeque::from(vec![2, 3, 4, 5]));
    }

    #[test]
    fn test_sweep_stops_at_first_period_past_cutoff() {
        let mut ledger = ledger_with(&[2, 3, 9], 9, 0);
        let removed = ledger.sweep(4, 100);
        assert_eq!(removed, vec![2, 3]);
        assert_eq!(ledger.last_archived, 2);
        assert_eq!(ledger.pending, VecDeque::from(vec![9]));
    }

    #[test]
    fn test_sweep_on_empty_ledger_is_noop() {
        let mut ledger = ledger_with(&[], 5, 3);
        assert!(ledger.sweep(10, 5).is_empty());
        assert_eq!(ledger.last_archived, 3);
    }

    #[test]
    fn test_sweep_with_nothing_overdue_steps_watermark_back() {
        let mut ledger = ledger_with(&[50, 51], 51, 7);
        assert!(ledger.sweep(20, 5).is_empty());
        assert_eq!(ledger.last_archived, 6);
        assert!(ledger.sweep(21, 5).is_empty());
        assert_eq!(ledger.last_archived, 5);
        assert_eq!(ledger.pending, VecDeque::from(vec![50, 51]));
    }

    #[test]
    fn test_ledger_json_roundtrip_preserves_order() {
        let ledger = ledger_with(&[7, 8, 11], 11, 6);
        let json = serde_json::to_string(&ledger).unwrap();
        let back: RetentionLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);
    }
}
