//! Chain-state lookups.
//!
//! `ChainReader` is the seam between the aggregator and whatever answers
//! chain-state questions. The production implementation talks JSON-RPC to
//! a hosted provider; tests substitute in-memory readers.

pub mod contracts;
pub mod ens;
pub mod rpc;

use crate::error::ChainResult;
use crate::models::Address;
use alloy_primitives::{Bytes, U256};
use async_trait::async_trait;

pub use contracts::call_contract;
pub use rpc::RpcChainReader;

/// Read-only access to current chain state. Every method is an independent
/// network round-trip and may fail on its own.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Native balance in wei.
    async fn native_balance(&self, address: &Address) -> ChainResult<U256>;

    /// Number of transactions sent from the address.
    async fn transaction_count(&self, address: &Address) -> ChainResult<u64>;

    /// Height of the latest block.
    async fn block_number(&self) -> ChainResult<u64>;

    /// Deployed bytecode. Empty for externally owned accounts.
    async fn code(&self, address: &Address) -> ChainResult<Bytes>;

    /// Simulate a read-only call and return the raw return data.
    async fn call(&self, to: alloy_primitives::Address, data: Bytes) -> ChainResult<Bytes>;

    /// Reverse-resolve an address to its primary ENS name.
    async fn reverse_resolve_name(&self, address: &Address) -> ChainResult<Option<String>> {
        ens::reverse_resolve(self, address).await
    }
}
