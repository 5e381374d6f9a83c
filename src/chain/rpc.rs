//! JSON-RPC chain-state reader.
//!
//! Speaks plain JSON-RPC 2.0 over HTTPS to a hosted provider. All state
//! queries are made against the `latest` block.

use super::ChainReader;
use crate::error::{ChainError, ChainResult, ExplorerError};
use crate::models::Address;
use alloy_primitives::{Bytes, U256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// JSON-RPC request body.
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// JSON-RPC response body. Exactly one of `result` / `error` is expected.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Chain-state reader backed by a JSON-RPC endpoint.
pub struct RpcChainReader {
    http_client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcChainReader {
    /// Create a reader for `url`. The URL usually embeds the provider key.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ExplorerError> {
        let url = url.into();
        debug!("Creating JSON-RPC reader for {}", redact_url(&url));

        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> ChainResult<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        debug!("JSON-RPC {} -> {}", method, redact_url(&self.url));

        let response = self
            .http_client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ChainError::decode("JSON-RPC response", e.without_url()))?;

        if let Some(error) = body.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        body.result
            .ok_or_else(|| ChainError::decode("JSON-RPC response", "missing result"))
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn native_balance(&self, address: &Address) -> ChainResult<U256> {
        let hex: String = self
            .request("eth_getBalance", json!([address.as_str(), "latest"]))
            .await?;
        parse_quantity("balance", &hex)
    }

    async fn transaction_count(&self, address: &Address) -> ChainResult<u64> {
        let hex: String = self
            .request("eth_getTransactionCount", json!([address.as_str(), "latest"]))
            .await?;
        parse_u64("transaction count", &hex)
    }

    async fn block_number(&self) -> ChainResult<u64> {
        let hex: String = self.request("eth_blockNumber", json!([])).await?;
        parse_u64("block number", &hex)
    }

    async fn code(&self, address: &Address) -> ChainResult<Bytes> {
        let hex: String = self
            .request("eth_getCode", json!([address.as_str(), "latest"]))
            .await?;
        parse_data("code", &hex)
    }

    async fn call(&self, to: alloy_primitives::Address, data: Bytes) -> ChainResult<Bytes> {
        let hex: String = self
            .request(
                "eth_call",
                json!([{ "to": to.to_string(), "data": data.to_string() }, "latest"]),
            )
            .await?;
        parse_data("call result", &hex)
    }
}

/// Decode a hex quantity such as `0x1b1ae4d6e2ef500000`.
pub fn parse_quantity(what: &'static str, hex: &str) -> ChainResult<U256> {
    let digits = strip_hex_prefix(what, hex)?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16).map_err(|e| ChainError::decode(what, e))
}

fn parse_u64(what: &'static str, hex: &str) -> ChainResult<u64> {
    let digits = strip_hex_prefix(what, hex)?;
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16).map_err(|e| ChainError::decode(what, e))
}

/// Decode hex data such as `0x6080...`. `0x` alone is empty data.
pub fn parse_data(what: &'static str, hex: &str) -> ChainResult<Bytes> {
    let digits = strip_hex_prefix(what, hex)?;
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| ChainError::decode(what, e))
}

fn strip_hex_prefix<'a>(what: &'static str, hex: &'a str) -> ChainResult<&'a str> {
    hex.strip_prefix("0x")
        .ok_or_else(|| ChainError::decode(what, format!("missing 0x prefix in {:?}", hex)))
}

/// Hide the trailing path segment (the provider key) of an endpoint URL.
pub fn redact_url(url: &str) -> String {
    match url.rsplit_once('/') {
        Some((base, key)) if key.len() >= 16 => format!("{}/***", base),
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VITALIK: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

    async fn mock_rpc(server: &MockServer, rpc_method: &str, response: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(server)
            .await;
    }

    fn reader(server: &MockServer) -> RpcChainReader {
        RpcChainReader::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_native_balance_and_nonce() {
        let server = MockServer::start().await;
        mock_rpc(
            &server,
            "eth_getBalance",
            json!({"jsonrpc": "2.0", "id": 1, "result": "0x14d1120d7b160000"}),
        )
        .await;
        mock_rpc(
            &server,
            "eth_getTransactionCount",
            json!({"jsonrpc": "2.0", "id": 2, "result": "0x5"}),
        )
        .await;

        let reader = reader(&server);
        let address = Address::parse(VITALIK).unwrap();

        let balance = reader.native_balance(&address).await.unwrap();
        assert_eq!(balance, U256::from(1_500_000_000_000_000_000u64));
        assert_eq!(reader.transaction_count(&address).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_empty_code() {
        let server = MockServer::start().await;
        mock_rpc(
            &server,
            "eth_getCode",
            json!({"jsonrpc": "2.0", "id": 1, "result": "0x"}),
        )
        .await;

        let code = reader(&server)
            .code(&Address::parse(VITALIK).unwrap())
            .await
            .unwrap();
        assert!(code.is_empty());
    }

    #[tokio::test]
    async fn test_rpc_error_object() {
        let server = MockServer::start().await;
        mock_rpc(
            &server,
            "eth_call",
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": 3, "message": "execution reverted"}}),
        )
        .await;

        let err = reader(&server)
            .call(alloy_primitives::Address::ZERO, Bytes::from(vec![0x18, 0x16, 0x0d, 0xdd]))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Rpc { code: 3, .. }));
    }

    #[tokio::test]
    async fn test_http_failure_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = reader(&server).block_number().await.unwrap_err();
        assert!(matches!(err, ChainError::Transport(_)));
    }

    const SECRET_KEY: &str = "SECRETPROVIDERKEY123456";

    #[tokio::test]
    async fn test_unreachable_provider_error_hides_api_key() {
        // Bind then drop to get a local port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let reader = RpcChainReader::new(
            format!("http://127.0.0.1:{}/v2/{}", port, SECRET_KEY),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = reader
            .native_balance(&Address::parse(VITALIK).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Transport(_)));

        let fatal = ExplorerError::ChainUnavailable(err);
        assert!(!fatal.to_string().contains(SECRET_KEY));
        assert!(!format!("{:?}", fatal).contains(SECRET_KEY));
    }

    #[tokio::test]
    async fn test_http_status_and_decode_errors_hide_api_key() {
        let server = MockServer::start().await;
        mock_rpc(&server, "eth_blockNumber", json!("not an rpc object")).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let reader = RpcChainReader::new(
            format!("{}/v2/{}", server.uri(), SECRET_KEY),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = reader.block_number().await.unwrap_err();
        assert!(matches!(err, ChainError::Decode { .. }));
        assert!(!err.to_string().contains(SECRET_KEY));

        let err = reader
            .code(&Address::parse(VITALIK).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Transport(_)));
        assert!(!err.to_string().contains(SECRET_KEY));
    }

    #[tokio::test]
    async fn test_missing_result_is_decode_error() {
        let server = MockServer::start().await;
        mock_rpc(&server, "eth_blockNumber", json!({"jsonrpc": "2.0", "id": 1})).await;

        let err = reader(&server).block_number().await.unwrap_err();
        assert!(matches!(err, ChainError::Decode { .. }));
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_quantity("q", "0x0").unwrap(), U256::ZERO);
        assert_eq!(parse_quantity("q", "0x").unwrap(), U256::ZERO);
        assert_eq!(parse_u64("q", "0x12a05f200").unwrap(), 5_000_000_000);
        assert!(parse_quantity("q", "12").is_err());
        assert_eq!(parse_data("d", "0x6080").unwrap().len(), 2);
        assert!(parse_data("d", "0x6").is_err());
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("https://eth-mainnet.g.alchemy.com/v2/abcdefghijklmnopqrstuvwxyz"),
            "https://eth-mainnet.g.alchemy.com/v2/***"
        );
        assert_eq!(redact_url("http://127.0.0.1:8545"), "http://127.0.0.1:8545");
    }
}
