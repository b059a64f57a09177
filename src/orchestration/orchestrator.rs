use crate::domain::{
    BucketKey, BucketKind, CandleBucket, DecimalOverflow, Factory, FactoryDayBucket,
    LedgerEvent, Pair, PairDayBucket, PairHourBucket, Resolution, Subject, TokenDayBucket,
};
use crate::engine::rollup::{
    roll_candle, roll_factory_day, roll_pair_day, roll_pair_hour, roll_token_day,
};
use crate::engine::{apply_event, PairSide, TokenVolume};
use crate::orchestration::archiver::RollingArchiver;
use crate::orchestration::context::AggregationContext;
use crate::orchestration::upsert::upsert;
use crate::store::{Store, StoreError};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Drives every configured resolution for each ledger event.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn Store>,
    context: Arc<AggregationContext>,
}

/// Bucket bookkeeping for one processed event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub buckets_created: usize,
    pub buckets_archived: usize,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn Store>, context: AggregationContext) -> Self {
        Self {
            store,
            context: Arc::new(context),
        }
    }

    /// Apply one ledger event to its pair, both tokens and the factory, then roll
    /// every configured resolution.
    ///
    /// The pair, both tokens and the factory must already be registered. A missing
    /// one aborts the event before anything is written, as does arithmetic that
    /// overflows while restating the entities. Each bucket write commits on its
    /// own, so a failure part-way leaves earlier resolutions applied.
    pub async fn process_event(&self, event: &LedgerEvent) -> Result<EventOutcome, AggregationError> {
        let store = &*self.store;

        let mut pair = store
            .load_pair(&event.pair)
            .await?
            .ok_or_else(|| AggregationError::missing(ParentKind::Pair, event.pair.as_str()))?;
        let mut token0 = store
            .load_subject(&pair.token0)
            .await?
            .ok_or_else(|| AggregationError::missing(ParentKind::Subject, pair.token0.as_str()))?;
        let mut token1 = store
            .load_subject(&pair.token1)
            .await?
            .ok_or_else(|| AggregationError::missing(ParentKind::Subject, pair.token1.as_str()))?;
        let mut factory = store
            .load_factory(&self.context.factory_id)
            .await?
            .ok_or_else(|| AggregationError::missing(ParentKind::Factory, &self.context.factory_id))?;

        apply_event(event, &mut pair, &mut token0, &mut token1, &mut factory)?;

        store.save_pair(&pair).await?;
        store.save_subject(&token0).await?;
        store.save_subject(&token1).await?;
        store.save_factory(&factory).await?;

        let mut outcome = EventOutcome::default();
        let volume0 = self.token_volume(event, PairSide::Token0)?;
        let volume1 = self.token_volume(event, PairSide::Token1)?;

        for &resolution in &self.context.resolutions {
            match resolution {
                Resolution::Day => {
                    self.roll_factory_day(&factory, event, &mut outcome).await?;
                    self.roll_pair_day(&pair, event, &mut outcome).await?;
                    self.roll_token_day(&token0, event, volume0.as_ref(), &mut outcome)
                        .await?;
                    self.roll_token_day(&token1, event, volume1.as_ref(), &mut outcome)
                        .await?;
                }
                Resolution::Hour => {
                    self.roll_pair_hour(&pair, event, &mut outcome).await?;
                    self.roll_candle(&mut token0, resolution, event, volume0.as_ref(), &mut outcome)
                        .await?;
                    self.roll_candle(&mut token1, resolution, event, volume1.as_ref(), &mut outcome)
                        .await?;
                }
                Resolution::Minute => {
                    self.roll_candle(&mut token0, resolution, event, volume0.as_ref(), &mut outcome)
                        .await?;
                    self.roll_candle(&mut token1, resolution, event, volume1.as_ref(), &mut outcome)
                        .await?;
                }
            }
        }

        debug!(
            pair = %pair.id,
            timestamp = event.timestamp.as_secs(),
            created = outcome.buckets_created,
            archived = outcome.buckets_archived,
            "Processed ledger event"
        );
        Ok(outcome)
    }

    fn token_volume(
        &self,
        event: &LedgerEvent,
        side: PairSide,
    ) -> Result<Option<TokenVolume>, DecimalOverflow> {
        event
            .volume
            .as_ref()
            .map(|volume| TokenVolume::for_side(volume, side, self.context.fee_rate))
            .transpose()
    }

    async fn roll_factory_day(
        &self,
        factory: &Factory,
        event: &LedgerEvent,
        outcome: &mut EventOutcome,
    ) -> Result<(), AggregationError> {
        let key = BucketKey::derive(&factory.id, Resolution::Day, event.timestamp);
        let upserted = upsert(
            &*self.store,
            BucketKind::FactoryDay,
            &key,
            |k| FactoryDayBucket::new(k.clone()),
            |b| roll_factory_day(b, factory, event.volume.as_ref()).map_err(AggregationError::from),
        )
        .await?;
        outcome.buckets_created += usize::from(upserted.created);
        Ok(())
    }

    async fn roll_pair_day(
        &self,
        pair: &Pair,
        event: &LedgerEvent,
        outcome: &mut EventOutcome,
    ) -> Result<(), AggregationError> {
        let key = BucketKey::derive(pair.id.as_str(), Resolution::Day, event.timestamp);
        let upserted = upsert(
            &*self.store,
            BucketKind::PairDay,
            &key,
            |k| {
                PairDayBucket::new(
                    k.clone(),
                    pair.id.clone(),
                    pair.token0.clone(),
                    pair.token1.clone(),
                )
            },
            |b| roll_pair_day(b, pair, event.volume.as_ref()).map_err(AggregationError::from),
        )
        .await?;
        outcome.buckets_created += usize::from(upserted.created);
        Ok(())
    }

    async fn roll_pair_hour(
        &self,
        pair: &Pair,
        event: &LedgerEvent,
        outcome: &mut EventOutcome,
    ) -> Result<(), AggregationError> {
        let key = BucketKey::derive(pair.id.as_str(), Resolution::Hour, event.timestamp);
        let upserted = upsert(
            &*self.store,
            BucketKind::PairHour,
            &key,
            |k| PairHourBucket::new(k.clone(), pair.id.clone()),
            |b| roll_pair_hour(b, pair, event.volume.as_ref()).map_err(AggregationError::from),
        )
        .await?;
        outcome.buckets_created += usize::from(upserted.created);
        Ok(())
    }

    async fn roll_token_day(
        &self,
        token: &Subject,
        event: &LedgerEvent,
        volume: Option<&TokenVolume>,
        outcome: &mut EventOutcome,
    ) -> Result<(), AggregationError> {
        let key = BucketKey::derive(token.id.as_str(), Resolution::Day, event.timestamp);
        let upserted = upsert(
            &*self.store,
            BucketKind::TokenDay,
            &key,
            |k| TokenDayBucket::new(k.clone(), token.id.clone()),
            |b| {
                roll_token_day(b, token, event.reference_price, volume)
                    .map_err(AggregationError::from)
            },
        )
        .await?;
        outcome.buckets_created += usize::from(upserted.created);
        Ok(())
    }

    /// Upsert a token candle; the first write of a period hands off to the archiver.
    async fn roll_candle(
        &self,
        token: &mut Subject,
        resolution: Resolution,
        event: &LedgerEvent,
        volume: Option<&TokenVolume>,
        outcome: &mut EventOutcome,
    ) -> Result<(), AggregationError> {
        let Some(kind) = BucketKind::candle(resolution) else {
            return Ok(());
        };
        let price_usd = token.derived_price.checked_mul(event.reference_price)?;
        let key = BucketKey::derive(token.id.as_str(), resolution, event.timestamp);

        let upserted = upsert(
            &*self.store,
            kind,
            &key,
            |k| CandleBucket::new(k.clone(), token.id.clone(), price_usd),
            |b| roll_candle(b, price_usd, volume).map_err(AggregationError::from),
        )
        .await?;

        if upserted.created {
            outcome.buckets_created += 1;
            if let Some(policy) = self.context.policy(resolution) {
                let archived = RollingArchiver::new(&*self.store)
                    .on_period_created(token, resolution, key.period_index, policy)
                    .await?;
                outcome.buckets_archived += archived.removed.len();
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Kind of record an event expected to already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKind {
    Pair,
    Subject,
    Factory,
}

impl fmt::Display for ParentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentKind::Pair => f.write_str("pair"),
            ParentKind::Subject => f.write_str("subject"),
            ParentKind::Factory => f.write_str("factory"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("Missing {kind} {id}")]
    MissingParent { kind: ParentKind, id: String },
    #[error(transparent)]
    Overflow(#[from] DecimalOverflow),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AggregationError {
    fn missing(kind: ParentKind, id: &str) -> Self {
        AggregationError::MissingParent {
            kind,
            id: id.to_string(),
        }
    }
}
