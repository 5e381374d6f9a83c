//! Error types.
//!
//! `ExplorerError` is the fatal class: it aborts report production and its
//! message is shown to the user as-is. `ChainError` and `IndexerError`
//! describe a single failed lookup; the aggregator decides whether such a
//! failure is fatal or merely degrades one field of the report.

use std::time::Duration;
use thiserror::Error;

/// Errors that prevent any report from being produced.
#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("Invalid Ethereum address format: {0:?} (expected 0x followed by 40 hex characters)")]
    InvalidAddress(String),

    #[error("Missing {0} API key. Set it in .ethscope.toml or via the environment.")]
    MissingApiKey(&'static str),

    #[error("Cannot reach the chain-state provider: {0}")]
    ChainUnavailable(#[source] ChainError),

    #[error("Address {0} is not a contract")]
    NotAContract(String),

    #[error("Contract information unavailable for {0}")]
    ContractInfoUnavailable(String),

    #[error("Failed to build HTTP client: {0}")]
    Http(reqwest::Error),
}

// reqwest errors print their request URL, and every endpoint URL carries
// an API key. Each conversion drops the URL before wrapping.
impl From<reqwest::Error> for ExplorerError {
    fn from(e: reqwest::Error) -> Self {
        ExplorerError::Http(e.without_url())
    }
}

/// A failed chain-state lookup.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("failed to decode {what}: {detail}")]
    Decode { what: &'static str, detail: String },

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),
}

impl ChainError {
    pub fn decode(what: &'static str, detail: impl ToString) -> Self {
        ChainError::Decode {
            what,
            detail: detail.to_string(),
        }
    }
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        ChainError::Transport(e.without_url())
    }
}

/// A failed indexer lookup. Every variant, including `NoData`, is handled
/// the same way by degraded lookups.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    #[error("indexer returned HTTP {0}")]
    Status(u16),

    #[error("failed to decode indexer response: {0}")]
    Decode(String),

    #[error("no data: {0}")]
    NoData(String),

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for IndexerError {
    fn from(e: reqwest::Error) -> Self {
        IndexerError::Transport(e.without_url())
    }
}

pub type ChainResult<T> = std::result::Result<T, ChainError>;
pub type IndexerResult<T> = std::result::Result<T, IndexerError>;
