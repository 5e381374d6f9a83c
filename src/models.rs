//! Data models for the explorer.
//!
//! This module contains the core data structures shared by the lookup
//! clients, the aggregator and the report renderers: validated addresses,
//! analysis modes, networks and the three report shapes.

use crate::error::ExplorerError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Placeholder for a field whose lookup failed.
pub const UNKNOWN: &str = "Unknown";

/// Token standard assumed for NFT collections.
pub const ERC721: &str = "ERC-721";

/// A validated 20-byte account identifier.
///
/// The original casing is kept for display; equality and hashing ignore
/// case. Checksum casing is not verified.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    text: String,
    bytes: [u8; 20],
}

impl Address {
    /// Validate `0x` followed by exactly 40 hex characters.
    pub fn parse(input: &str) -> Result<Self, ExplorerError> {
        let invalid = || ExplorerError::InvalidAddress(input.to_string());

        if input.len() != 42 {
            return Err(invalid());
        }
        let hex_part = input.strip_prefix("0x").ok_or_else(invalid)?;

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_part, &mut bytes).map_err(|_| invalid())?;

        Ok(Self {
            text: input.to_string(),
            bytes,
        })
    }

    /// The address exactly as it was supplied.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Lowercase hex form, used for case-insensitive comparisons and ENS.
    pub fn to_lowercase(&self) -> String {
        self.text.to_ascii_lowercase()
    }

    /// Shortened display form: first `head` characters, `...`, last `tail`.
    pub fn short(&self, head: usize, tail: usize) -> String {
        if head + tail >= self.text.len() {
            return self.text.clone();
        }
        format!(
            "{}...{}",
            &self.text[..head],
            &self.text[self.text.len() - tail..]
        )
    }

    /// Raw 20-byte form for ABI encoding.
    pub fn to_alloy(&self) -> alloy_primitives::Address {
        alloy_primitives::Address::from(self.bytes)
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.text)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Address {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ExplorerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.text
    }
}

/// Which lookup set to run and which report shape to produce.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Balances, tokens and recent activity of an account
    #[default]
    Wallet,
    /// Verified source metadata of a contract
    Contract,
    /// Collection metadata of an ERC-721 contract
    Nft,
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Wallet => write!(f, "wallet"),
            AnalysisMode::Contract => write!(f, "contract"),
            AnalysisMode::Nft => write!(f, "nft"),
        }
    }
}

/// Ethereum network the upstream providers are queried on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Ethereum main network
    #[default]
    Mainnet,
    /// Sepolia test network
    Testnet,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

impl Network {
    /// Whether this is the main network. Reverse-name resolution only
    /// happens here.
    pub fn is_main(&self) -> bool {
        matches!(self, Network::Mainnet)
    }

    /// Default JSON-RPC endpoint for a provider key.
    pub fn default_rpc_url(&self, api_key: &str) -> String {
        match self {
            Network::Mainnet => format!("https://eth-mainnet.g.alchemy.com/v2/{}", api_key),
            Network::Testnet => format!("https://eth-sepolia.g.alchemy.com/v2/{}", api_key),
        }
    }

    /// Default indexer API base URL (multichain, selected by `chain_id`).
    pub fn default_indexer_url(&self) -> &'static str {
        "https://api.etherscan.io/v2/api"
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Testnet => 11_155_111,
        }
    }

    /// Human-facing block explorer, used for links in reports.
    pub fn explorer_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://etherscan.io",
            Network::Testnet => "https://sepolia.etherscan.io",
        }
    }

    /// Symbol of the native currency.
    pub fn native_symbol(&self) -> &'static str {
        "ETH"
    }
}

/// A token with a strictly positive balance held by a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenHolding {
    /// Token contract address.
    pub contract_address: Address,
    /// Token name as reported by the indexer.
    pub display_name: String,
    /// Token ticker symbol.
    pub symbol: String,
    /// Number of decimal places the token declares.
    pub decimal_places: u8,
    /// Balance rounded to display precision.
    pub balance: String,
    /// Balance in the token's smallest unit.
    pub raw_balance: String,
}

/// One transaction from the indexer, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    pub from: String,
    /// Absent for contract-creation transactions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Decimal value with unit suffix, e.g. `0.2500 ETH`.
    pub value: String,
    pub timestamp_seconds: u64,
    pub block_number: u64,
    pub failed: bool,
}

impl TransactionRecord {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.timestamp_seconds)
    }

    /// Whether this transaction deployed a contract.
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// Report produced in wallet mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletReport {
    pub address: Address,
    /// Native balance rounded to display precision.
    pub native_balance: String,
    /// Native balance in wei.
    pub raw_balance: String,
    pub native_symbol: String,
    pub transaction_count: u64,
    pub current_block_height: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_name: Option<String>,
    /// Positive balances only, largest first.
    pub token_holdings: Vec<TokenHolding>,
    /// Most recent first, bounded by the fetch limit.
    pub recent_transactions: Vec<TransactionRecord>,
    /// Timestamp of the oldest transaction in `recent_transactions`.
    ///
    /// This is bounded by the fetch window and is not necessarily the
    /// account's true first transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_activity_timestamp: Option<u64>,
}

impl WalletReport {
    /// Balance with currency suffix, e.g. `1.5000 ETH`.
    pub fn balance_display(&self) -> String {
        format!("{} {}", self.native_balance, self.native_symbol)
    }

    pub fn first_activity(&self) -> Option<DateTime<Utc>> {
        self.first_activity_timestamp.and_then(to_datetime)
    }
}

/// Report produced in contract mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractReport {
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_version: Option<String>,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abi: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constructor_arguments: Option<String>,
}

impl ContractReport {
    /// Function signatures declared in the ABI, e.g. `transfer(address,uint256)`.
    pub fn abi_functions(&self) -> Vec<String> {
        let Some(entries) = self.abi.as_ref().and_then(|abi| abi.as_array()) else {
            return Vec::new();
        };

        entries
            .iter()
            .filter(|entry| entry["type"].as_str() == Some("function"))
            .filter_map(|entry| {
                let name = entry["name"].as_str()?;
                let inputs: Vec<&str> = entry["inputs"]
                    .as_array()
                    .map(|inputs| inputs.iter().filter_map(|i| i["type"].as_str()).collect())
                    .unwrap_or_default();
                Some(format!("{}({})", name, inputs.join(",")))
            })
            .collect()
    }

    /// Number of source lines, if source is available.
    pub fn source_line_count(&self) -> usize {
        self.source_code
            .as_deref()
            .map(|source| source.lines().count())
            .unwrap_or(0)
    }
}

/// Report produced in NFT mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftReport {
    pub address: Address,
    pub collection_name: String,
    pub symbol: String,
    /// Decimal supply, or `Unknown` when the call failed.
    pub total_supply: String,
    pub standard_guess: String,
}

/// A report, tagged by the mode that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Report {
    Wallet(WalletReport),
    Contract(ContractReport),
    Nft(NftReport),
}

impl Report {
    pub fn mode(&self) -> AnalysisMode {
        match self {
            Report::Wallet(_) => AnalysisMode::Wallet,
            Report::Contract(_) => AnalysisMode::Contract,
            Report::Nft(_) => AnalysisMode::Nft,
        }
    }

    pub fn address(&self) -> &Address {
        match self {
            Report::Wallet(r) => &r.address,
            Report::Contract(r) => &r.address,
            Report::Nft(r) => &r.address,
        }
    }
}

/// Metadata about one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Network the lookups ran against.
    pub network: Network,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Wall-clock time spent on lookups.
    pub duration_seconds: f64,
    /// Version of the tool that produced the report.
    pub tool_version: String,
}

/// Everything written out by the JSON renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEnvelope {
    pub metadata: ReportMetadata,
    pub report: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

fn to_datetime(seconds: u64) -> Option<DateTime<Utc>> {
    i64::try_from(seconds)
        .ok()
        .and_then(|s| Utc.timestamp_opt(s, 0).single())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VITALIK: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

    #[test]
    fn test_address_accepts_canonical_form() {
        let address = Address::parse(VITALIK).unwrap();
        assert_eq!(address.as_str(), VITALIK);
        assert_eq!(address.to_string(), VITALIK);
    }

    #[test]
    fn test_address_rejects_malformed_input() {
        let bad = [
            "",
            "0x",
            "d8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
            "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA9604",
            "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA960451",
            "0Xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
            "0xg8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
            " 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA9604",
            "vitalik.eth",
            "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA9604é",
        ];
        for input in bad {
            assert!(
                matches!(Address::parse(input), Err(ExplorerError::InvalidAddress(_))),
                "accepted {:?}",
                input
            );
        }
    }

    #[test]
    fn test_address_comparison_ignores_case() {
        let mixed = Address::parse(VITALIK).unwrap();
        let lower = Address::parse(&VITALIK.to_lowercase()).unwrap();
        assert_eq!(mixed, lower);
        assert_ne!(mixed.as_str(), lower.as_str());
    }

    #[test]
    fn test_address_short_form() {
        let address = Address::parse(VITALIK).unwrap();
        assert_eq!(address.short(6, 4), "0xd8dA...6045");
        assert_eq!(address.short(40, 10), VITALIK);
    }

    #[test]
    fn test_address_serde_roundtrip_validates() {
        let json = format!("\"{}\"", VITALIK);
        let address: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(address.as_str(), VITALIK);
        assert!(serde_json::from_str::<Address>("\"0x1234\"").is_err());
    }

    #[test]
    fn test_report_tagged_by_mode() {
        let report = Report::Nft(NftReport {
            address: Address::parse(VITALIK).unwrap(),
            collection_name: "Punks".to_string(),
            symbol: "PUNK".to_string(),
            total_supply: UNKNOWN.to_string(),
            standard_guess: ERC721.to_string(),
        });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "nft");
        assert_eq!(json["total_supply"], "Unknown");
        assert_eq!(report.mode(), AnalysisMode::Nft);
    }

    #[test]
    fn test_abi_functions() {
        let report = ContractReport {
            address: Address::parse(VITALIK).unwrap(),
            name: Some("Token".to_string()),
            compiler_version: None,
            verified: true,
            abi: Some(serde_json::json!([
                {"type": "constructor", "inputs": []},
                {"type": "function", "name": "transfer", "inputs": [
                    {"name": "to", "type": "address"},
                    {"name": "amount", "type": "uint256"}
                ]},
                {"type": "event", "name": "Transfer", "inputs": []},
                {"type": "function", "name": "totalSupply", "inputs": []}
            ])),
            source_code: Some("contract Token {\n}\n".to_string()),
            constructor_arguments: None,
        };

        assert_eq!(
            report.abi_functions(),
            vec!["transfer(address,uint256)", "totalSupply()"]
        );
        assert_eq!(report.source_line_count(), 2);
    }

    #[test]
    fn test_network_properties() {
        assert!(Network::Mainnet.is_main());
        assert!(!Network::Testnet.is_main());
        assert!(Network::Testnet.default_rpc_url("k").ends_with("/v2/k"));
        assert_eq!(Network::Testnet.chain_id(), 11_155_111);
    }
}
