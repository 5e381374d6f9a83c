//! Historical indexer lookups.
//!
//! The indexer answers questions chain state cannot: transaction history,
//! token transfer history and verified contract source. Responses are kept
//! close to the wire format here and normalized by the aggregator.

pub mod etherscan;

use crate::error::IndexerResult;
use crate::models::Address;
use async_trait::async_trait;
use serde::Deserialize;

pub use etherscan::EtherscanIndexer;

/// A normal transaction as listed by the indexer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTransaction {
    pub hash: String,
    pub from: String,
    /// Empty for contract creation.
    pub to: String,
    /// Value in wei, decimal string.
    pub value: String,
    pub time_stamp: String,
    pub block_number: String,
    /// `"1"` when execution failed.
    pub is_error: String,
}

/// An ERC-20 transfer event as listed by the indexer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTokenTransfer {
    pub contract_address: String,
    pub token_name: String,
    pub token_symbol: String,
    /// Declared decimal count, as a decimal string.
    pub token_decimal: String,
}

/// Verified-source metadata. Unverified contracts come back with an empty
/// `source_code`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawContractSource {
    pub source_code: String,
    #[serde(rename = "ABI")]
    pub abi: String,
    pub contract_name: String,
    pub compiler_version: String,
    pub constructor_arguments: String,
}

/// Access to indexed chain history.
///
/// Implementations report both transport failures and "no data" responses
/// as errors; callers decide how much either matters.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Normal transactions involving `address`, newest first, at most
    /// `limit` of them.
    async fn list_transactions(
        &self,
        address: &Address,
        limit: usize,
    ) -> IndexerResult<Vec<RawTransaction>>;

    /// ERC-20 transfers involving `address`, newest first.
    async fn list_token_transfers(
        &self,
        address: &Address,
        limit: usize,
    ) -> IndexerResult<Vec<RawTokenTransfer>>;

    /// Verified source record for a contract.
    async fn verified_source(&self, address: &Address) -> IndexerResult<RawContractSource>;
}
