//! Mock upstream collaborators for testing without network calls.

use super::{EventSource, MetadataSource, PairDiscovery, SourceError};
use crate::domain::{Decimal, PairCreated, PairId, SequencedItem, SubjectId, TokenMetadata};
use async_trait::async_trait;
use std::collections::HashMap;

/// Mock event stream that serves predefined items.
#[derive(Debug, Clone, Default)]
pub struct MockEventSource {
    items: Vec<SequencedItem>,
    fail_with: Option<SourceError>,
}

impl MockEventSource {
    /// Create a new mock event source with an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one item to the stream.
    pub fn with_item(mut self, item: SequencedItem) -> Self {
        self.items.push(item);
        self
    }

    /// Append multiple items to the stream.
    pub fn with_items(mut self, items: Vec<SequencedItem>) -> Self {
        self.items.extend(items);
        self
    }

    /// Make every fetch fail with `error`.
    pub fn failing(mut self, error: SourceError) -> Self {
        self.fail_with = Some(error);
        self
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn fetch_events(
        &self,
        after: Option<u64>,
        limit: usize,
    ) -> Result<Vec<SequencedItem>, SourceError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }

        let mut items: Vec<SequencedItem> = self
            .items
            .iter()
            .filter(|item| after.map_or(true, |after| item.seq > after))
            .cloned()
            .collect();
        items.sort_by_key(|item| item.seq);
        items.truncate(limit);
        Ok(items)
    }
}

/// Mock token metadata and balances.
#[derive(Debug, Clone, Default)]
pub struct MockMetadataSource {
    tokens: HashMap<SubjectId, TokenMetadata>,
    balances: HashMap<(SubjectId, PairId), Decimal>,
    fail_with: Option<SourceError>,
}

impl MockMetadataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for a token.
    pub fn with_token(mut self, token: SubjectId, metadata: TokenMetadata) -> Self {
        self.tokens.insert(token, metadata);
        self
    }

    /// Register the balance `holder` has of `token`.
    pub fn with_balance(mut self, token: SubjectId, holder: PairId, balance: Decimal) -> Self {
        self.balances.insert((token, holder), balance);
        self
    }

    /// Make every lookup fail with `error`.
    pub fn failing(mut self, error: SourceError) -> Self {
        self.fail_with = Some(error);
        self
    }
}

#[async_trait]
impl MetadataSource for MockMetadataSource {
    async fn fetch_token(&self, token: &SubjectId) -> Result<Option<TokenMetadata>, SourceError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(self.tokens.get(token).cloned())
    }

    async fn fetch_balance(
        &self,
        token: &SubjectId,
        holder: &PairId,
    ) -> Result<Option<Decimal>, SourceError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(self
            .balances
            .get(&(token.clone(), holder.clone()))
            .copied())
    }
}

/// Mock pair enumeration backed by a list ordered by creation index.
#[derive(Debug, Clone, Default)]
pub struct MockPairDiscovery {
    pairs: Vec<PairCreated>,
}

impl MockPairDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(mut self, pair: PairCreated) -> Self {
        self.pairs.push(pair);
        self
    }
}

#[async_trait]
impl PairDiscovery for MockPairDiscovery {
    async fn pair_at(&self, index: u64) -> Result<Option<PairCreated>, SourceError> {
        let Ok(index) = usize::try_from(index) else {
            return Ok(None);
        };
        Ok(self.pairs.get(index).cloned())
    }
}
