//! Pair registration shared by live announcements and bulk hydration.

use crate::datasource::{MetadataSource, PairDiscovery, SourceError};
use crate::domain::{DecimalOverflow, Factory, Pair, PairCreated, PairId, Subject, SubjectId};
use crate::store::{Store, StoreError};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// How a registration attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Registered,
    AlreadyRegistered,
    /// A token's decimals could not be resolved. Nothing was written.
    Deferred { token: SubjectId },
    /// Both sides name the same token.
    Rejected,
}

/// Result of one hydration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrationReport {
    pub registered: usize,
    pub already_registered: usize,
    /// First index not yet registered; the next pass resumes here.
    pub next_index: u64,
    /// Set when the pass stopped on a pair that had to be deferred.
    pub deferred: Option<PairId>,
}

#[derive(Clone)]
pub struct Registrar {
    store: Arc<dyn Store>,
    metadata: Arc<dyn MetadataSource>,
    factory_id: String,
}

impl Registrar {
    pub fn new(
        store: Arc<dyn Store>,
        metadata: Arc<dyn MetadataSource>,
        factory_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            metadata,
            factory_id: factory_id.into(),
        }
    }

    /// Register a newly announced pair.
    pub async fn register_pair(
        &self,
        created: &PairCreated,
    ) -> Result<Registration, RegistrationError> {
        self.register(created, false).await
    }

    /// Enumerate up to `batch` pairs starting at the factory's pair count.
    ///
    /// Stops at the first index discovery cannot resolve, or at the first pair
    /// that is deferred or rejected, so the next pass resumes at the same index.
    pub async fn hydrate(
        &self,
        discovery: &dyn PairDiscovery,
        batch: usize,
    ) -> Result<HydrationReport, RegistrationError> {
        let start = match self.store.load_factory(&self.factory_id).await? {
            Some(factory) => factory.pair_count.max(0) as u64,
            None => 0,
        };

        let mut report = HydrationReport {
            next_index: start,
            ..Default::default()
        };

        for index in start..start.saturating_add(batch as u64) {
            let Some(created) = discovery.pair_at(index).await? else {
                break;
            };

            match self.register(&created, true).await? {
                Registration::Registered => report.registered += 1,
                Registration::AlreadyRegistered => report.already_registered += 1,
                Registration::Deferred { .. } => {
                    report.deferred = Some(created.pair.clone());
                    break;
                }
                // Not counted in pair_count, so moving past it would shift every later index.
                Registration::Rejected => break,
            }
            report.next_index = index + 1;
        }

        info!(
            start,
            next_index = report.next_index,
            registered = report.registered,
            deferred = ?report.deferred,
            "Hydration pass finished"
        );
        Ok(report)
    }

    async fn register(
        &self,
        created: &PairCreated,
        seed_balances: bool,
    ) -> Result<Registration, RegistrationError> {
        if created.token0 == created.token1 {
            warn!(pair = %created.pair, token = %created.token0, "Rejecting pair of a token with itself");
            return Ok(Registration::Rejected);
        }
        if self.store.load_pair(&created.pair).await?.is_some() {
            return Ok(Registration::AlreadyRegistered);
        }

        // Resolve both tokens before writing anything.
        let mut token0 = match self.resolve_subject(&created.token0).await? {
            Ok(subject) => subject,
            Err(token) => return Ok(self.deferred(created, token)),
        };
        let mut token1 = match self.resolve_subject(&created.token1).await? {
            Ok(subject) => subject,
            Err(token) => return Ok(self.deferred(created, token)),
        };

        let mut factory = self
            .store
            .load_factory(&self.factory_id)
            .await?
            .unwrap_or_else(|| Factory::new(self.factory_id.clone()));
        factory.pair_count += 1;

        let mut pair = Pair::new(
            created.pair.clone(),
            created.token0.clone(),
            created.token1.clone(),
            created.timestamp,
            created.block_number,
        );

        if seed_balances {
            if let Some(balance) = self
                .metadata
                .fetch_balance(&created.token0, &created.pair)
                .await?
            {
                pair.reserve0 = balance;
                token0.total_liquidity = token0.total_liquidity.checked_add(balance)?;
            }
            if let Some(balance) = self
                .metadata
                .fetch_balance(&created.token1, &created.pair)
                .await?
            {
                pair.reserve1 = balance;
                token1.total_liquidity = token1.total_liquidity.checked_add(balance)?;
            }
        }

        self.store.save_subject(&token0).await?;
        self.store.save_subject(&token1).await?;
        self.store.save_pair(&pair).await?;
        self.store
            .save_pair_lookup(&created.token0, &created.token1, &created.pair)
            .await?;
        self.store
            .save_pair_lookup(&created.token1, &created.token0, &created.pair)
            .await?;
        self.store.save_factory(&factory).await?;

        info!(
            pair = %created.pair,
            token0 = %created.token0,
            token1 = %created.token1,
            pair_count = factory.pair_count,
            "Registered pair"
        );
        Ok(Registration::Registered)
    }

    /// Existing subject, or a fresh one built from upstream metadata.
    ///
    /// The inner `Err` names a token whose decimals are unknown.
    async fn resolve_subject(
        &self,
        token: &SubjectId,
    ) -> Result<Result<Subject, SubjectId>, RegistrationError> {
        if let Some(existing) = self.store.load_subject(token).await? {
            return Ok(Ok(existing));
        }

        let metadata = self.metadata.fetch_token(token).await?;
        match metadata {
            Some(meta) => match meta.decimals {
                Some(decimals) => Ok(Ok(Subject::new(token.clone(), &meta, decimals))),
                None => Ok(Err(token.clone())),
            },
            None => Ok(Err(token.clone())),
        }
    }

    fn deferred(&self, created: &PairCreated, token: SubjectId) -> Registration {
        warn!(
            pair = %created.pair,
            token = %token,
            "Deferring pair registration: token decimals unresolved"
        );
        Registration::Deferred { token }
    }
}

impl fmt::Debug for Registrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registrar")
            .field("factory_id", &self.factory_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Upstream error: {0}")]
    Source(#[from] SourceError),
    #[error(transparent)]
    Overflow(#[from] DecimalOverflow),
    #[error(transparent)]
    Store(#[from] StoreError),
}
