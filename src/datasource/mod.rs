//! Upstream collaborators: the ordered event stream, token metadata and pair discovery.

use crate::domain::{Decimal, PairCreated, PairId, SequencedItem, SubjectId, TokenMetadata};
use async_trait::async_trait;
use std::fmt;

pub mod http;
pub mod mock;

pub use http::HttpLedgerSource;
pub use mock::{MockEventSource, MockMetadataSource, MockPairDiscovery};

/// Strictly ordered stream of pair announcements and ledger events.
#[async_trait]
pub trait EventSource: Send + Sync + fmt::Debug {
    /// Fetch up to `limit` items with `seq` greater than `after`, ascending by `seq`.
    ///
    /// `after = None` starts from the beginning of the stream.
    async fn fetch_events(
        &self,
        after: Option<u64>,
        limit: usize,
    ) -> Result<Vec<SequencedItem>, SourceError>;
}

/// Token metadata lookups used when a subject is first registered.
#[async_trait]
pub trait MetadataSource: Send + Sync + fmt::Debug {
    /// Descriptive metadata for a token, or `None` if the token is unknown upstream.
    async fn fetch_token(&self, token: &SubjectId) -> Result<Option<TokenMetadata>, SourceError>;

    /// Balance of `token` held by `holder`, already scaled by the token's decimals.
    ///
    /// `None` when the balance call cannot be answered.
    async fn fetch_balance(
        &self,
        token: &SubjectId,
        holder: &PairId,
    ) -> Result<Option<Decimal>, SourceError>;
}

/// Bulk enumeration of pairs already deployed upstream, by creation index.
#[async_trait]
pub trait PairDiscovery: Send + Sync + fmt::Debug {
    /// The pair at `index`, or `None` once the index runs past the last known pair.
    async fn pair_at(&self, index: u64) -> Result<Option<PairCreated>, SourceError>;
}

/// Error type for upstream operations.
#[derive(Debug, Clone)]
pub enum SourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded
    RateLimited,
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            SourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            SourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            SourceError::RateLimited => write!(f, "Rate limited"),
        }
    }
}

impl std::error::Error for SourceError {}
