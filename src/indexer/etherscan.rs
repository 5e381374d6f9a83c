//! Etherscan-compatible indexer client.

use super::{Indexer, RawContractSource, RawTokenTransfer, RawTransaction};
use crate::error::{ExplorerError, IndexerError, IndexerResult};
use crate::models::{Address, Network};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

impl Envelope {
    /// `status != "1"` and non-array results both mean "no data".
    fn into_records<T: DeserializeOwned>(self) -> IndexerResult<Vec<T>> {
        if self.status != "1" {
            let detail = match self.result.as_str() {
                Some(result) if !result.is_empty() => format!("{} ({})", self.message, result),
                _ => self.message,
            };
            return Err(IndexerError::NoData(detail));
        }
        if !self.result.is_array() {
            return Err(IndexerError::NoData(format!(
                "{}: result is not a list",
                self.message
            )));
        }

        serde_json::from_value(self.result).map_err(|e| IndexerError::Decode(e.to_string()))
    }
}

/// Indexer client for the Etherscan API (V2, multichain).
pub struct EtherscanIndexer {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    chain_id: u64,
}

impl EtherscanIndexer {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        network: Network,
        timeout: Duration,
    ) -> Result<Self, ExplorerError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            chain_id: network.chain_id(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> IndexerResult<Vec<T>> {
        debug!("Indexer request {:?} on chain {}", params, self.chain_id);

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("chainid", self.chain_id.to_string())])
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IndexerError::Status(response.status().as_u16()));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| IndexerError::Decode(e.without_url().to_string()))?;

        envelope.into_records()
    }
}

#[async_trait]
impl Indexer for EtherscanIndexer {
    async fn list_transactions(
        &self,
        address: &Address,
        limit: usize,
    ) -> IndexerResult<Vec<RawTransaction>> {
        self.get(&[
            ("module", "account".to_string()),
            ("action", "txlist".to_string()),
            ("address", address.to_string()),
            ("startblock", "0".to_string()),
            ("endblock", "99999999".to_string()),
            ("page", "1".to_string()),
            ("offset", limit.to_string()),
            ("sort", "desc".to_string()),
        ])
        .await
    }

    async fn list_token_transfers(
        &self,
        address: &Address,
        limit: usize,
    ) -> IndexerResult<Vec<RawTokenTransfer>> {
        self.get(&[
            ("module", "account".to_string()),
            ("action", "tokentx".to_string()),
            ("address", address.to_string()),
            ("page", "1".to_string()),
            ("offset", limit.to_string()),
            ("sort", "desc".to_string()),
        ])
        .await
    }

    async fn verified_source(&self, address: &Address) -> IndexerResult<RawContractSource> {
        let records: Vec<RawContractSource> = self
            .get(&[
                ("module", "contract".to_string()),
                ("action", "getsourcecode".to_string()),
                ("address", address.to_string()),
            ])
            .await?;

        records
            .into_iter()
            .next()
            .ok_or_else(|| IndexerError::NoData("empty source record list".to_string()))
    }
}
