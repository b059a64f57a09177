//! HTTP client for the upstream ledger service.

use super::{EventSource, MetadataSource, PairDiscovery, SourceError};
use crate::domain::{Decimal, PairCreated, PairId, SequencedItem, SubjectId, TokenMetadata};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Event stream, token metadata and pair discovery served by one base URL.
#[derive(Debug, Clone)]
pub struct HttpLedgerSource {
    client: Client,
    base_url: String,
}

impl HttpLedgerSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON document, retrying rate limits and server errors.
    ///
    /// A 404 is an answer, not a failure, and yields `None`.
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<serde_json::Value>, SourceError> {
        let url = self.url(path);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(&url)
                .query(query)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(SourceError::NetworkError(e.to_string())))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(backoff::Error::transient(SourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(SourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(SourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map(Some)
                .map_err(|e| backoff::Error::permanent(SourceError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl EventSource for HttpLedgerSource {
    async fn fetch_events(
        &self,
        after: Option<u64>,
        limit: usize,
    ) -> Result<Vec<SequencedItem>, SourceError> {
        debug!(?after, limit, "Fetching events");

        let mut query = vec![("limit", limit.to_string())];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }

        match self.get_json("/events", &query).await? {
            Some(body) => parse_events(body),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl MetadataSource for HttpLedgerSource {
    async fn fetch_token(&self, token: &SubjectId) -> Result<Option<TokenMetadata>, SourceError> {
        debug!(token = %token, "Fetching token metadata");

        match self.get_json(&format!("/tokens/{}", token), &[]).await? {
            Some(body) => parse_token(body).map(Some),
            None => Ok(None),
        }
    }

    async fn fetch_balance(
        &self,
        token: &SubjectId,
        holder: &PairId,
    ) -> Result<Option<Decimal>, SourceError> {
        let path = format!("/balances/{}/{}", token, holder);
        match self.get_json(&path, &[]).await? {
            Some(body) => parse_balance(body),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PairDiscovery for HttpLedgerSource {
    async fn pair_at(&self, index: u64) -> Result<Option<PairCreated>, SourceError> {
        match self.get_json(&format!("/pairs/{}", index), &[]).await? {
            Some(body) => serde_json::from_value(body)
                .map(Some)
                .map_err(|e| SourceError::ParseError(format!("Invalid pair: {}", e))),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBody {
    symbol: String,
    name: String,
    #[serde(default)]
    decimals: Option<u32>,
    total_supply: Decimal,
}

#[derive(Debug, Deserialize)]
struct BalanceBody {
    balance: Option<Decimal>,
}

fn parse_events(body: serde_json::Value) -> Result<Vec<SequencedItem>, SourceError> {
    serde_json::from_value(body).map_err(|e| SourceError::ParseError(format!("Invalid events: {}", e)))
}

fn parse_token(body: serde_json::Value) -> Result<TokenMetadata, SourceError> {
    let token: TokenBody = serde_json::from_value(body)
        .map_err(|e| SourceError::ParseError(format!("Invalid token: {}", e)))?;
    Ok(TokenMetadata {
        symbol: token.symbol,
        name: token.name,
        decimals: token.decimals,
        total_supply: token.total_supply,
    })
}

fn parse_balance(body: serde_json::Value) -> Result<Option<Decimal>, SourceError> {
    let balance: BalanceBody = serde_json::from_value(body)
        .map_err(|e| SourceError::ParseError(format!("Invalid balance: {}", e)))?;
    Ok(balance.balance)
}
