use crate::domain::{Decimal, Resolution, RetentionPolicy};

/// Explicit aggregation settings handed to the orchestrator at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationContext {
    /// Identity of the factory (registry) record every pair rolls up into.
    pub factory_id: String,
    /// Resolutions applied to every event.
    pub resolutions: Vec<Resolution>,
    pub hour: RetentionPolicy,
    pub minute: RetentionPolicy,
    /// Share of swap USD volume credited to `fees_usd`.
    pub fee_rate: Decimal,
}

impl AggregationContext {
    pub fn new(factory_id: impl Into<String>) -> Self {
        Self {
            factory_id: factory_id.into(),
            resolutions: Resolution::ALL.to_vec(),
            hour: RetentionPolicy::HOUR,
            minute: RetentionPolicy::MINUTE,
            fee_rate: Decimal::new(rust_decimal::Decimal::new(3, 3)),
        }
    }

    /// Retention policy for a fine resolution; day buckets are kept forever.
    pub fn policy(&self, resolution: Resolution) -> Option<RetentionPolicy> {
        match resolution {
            Resolution::Hour => Some(self.hour),
            Resolution::Minute => Some(self.minute),
            Resolution::Day => None,
        }
    }

    pub fn with_resolutions(mut self, resolutions: Vec<Resolution>) -> Self {
        self.resolutions = resolutions;
        self
    }

    pub fn with_hour_policy(mut self, policy: RetentionPolicy) -> Self {
        self.hour = policy;
        self
    }

    pub fn with_minute_policy(mut self, policy: RetentionPolicy) -> Self {
        self.minute = policy;
        self
    }

    pub fn with_fee_rate(mut self, fee_rate: Decimal) -> Self {
        self.fee_rate = fee_rate;
        self
    }
}
