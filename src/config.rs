//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ethscope.toml` files and command-line overrides.

use crate::error::ExplorerError;
use crate::models::Network;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".ethscope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Network selection.
    #[serde(default)]
    pub network: NetworkConfig,

    /// JSON-RPC provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Indexer API settings.
    #[serde(default)]
    pub indexer: IndexerConfig,

    /// Lookup limits and timeouts.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// `mainnet` or `testnet`.
    #[serde(default)]
    pub name: Network,
}

/// Chain-state provider settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider API key, embedded in the default endpoint URL.
    #[serde(default)]
    pub api_key: String,

    /// Full JSON-RPC endpoint, overriding the network default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Indexer settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Indexer API key.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the indexer API, overriding the network default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Lookup limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Upper bound on each individual lookup, in seconds.
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_seconds: u64,

    /// Maximum number of distinct tokens whose balance is queried.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Number of recent transactions fetched.
    #[serde(default = "default_recent_tx_limit")]
    pub recent_tx_limit: usize,

    /// Number of token transfers scanned to discover tokens.
    #[serde(default = "default_token_transfer_limit")]
    pub token_transfer_limit: usize,

    /// Fractional digits shown for balances and values.
    #[serde(default = "default_display_precision")]
    pub display_precision: u8,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_seconds: default_lookup_timeout(),
            max_tokens: default_max_tokens(),
            recent_tx_limit: default_recent_tx_limit(),
            token_transfer_limit: default_token_transfer_limit(),
            display_precision: default_display_precision(),
        }
    }
}

fn default_lookup_timeout() -> u64 {
    10
}

fn default_max_tokens() -> usize {
    10
}

fn default_recent_tx_limit() -> usize {
    10
}

fn default_token_transfer_limit() -> usize {
    100
}

fn default_display_precision() -> u8 {
    4
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Append the intelligence prompt to the report.
    #[serde(default = "default_true")]
    pub include_prompt: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_prompt: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (including their environment fallbacks) take
    /// precedence, but only when actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(network) = args.network {
            self.network.name = network;
        }
        if let Some(ref key) = args.provider_key {
            self.provider.api_key = key.clone();
        }
        if let Some(ref key) = args.indexer_key {
            self.indexer.api_key = key.clone();
        }

        if let Some(timeout) = args.timeout {
            self.analysis.lookup_timeout_seconds = timeout;
        }
        if let Some(max_tokens) = args.max_tokens {
            self.analysis.max_tokens = max_tokens;
        }
        if let Some(limit) = args.tx_limit {
            self.analysis.recent_tx_limit = limit;
        }

        if args.no_prompt {
            self.report.include_prompt = false;
        }
    }

    /// Refuse to run without both upstream credentials.
    pub fn validate(&self) -> Result<(), ExplorerError> {
        if self.provider.api_key.trim().is_empty() {
            return Err(ExplorerError::MissingApiKey("provider"));
        }
        if self.indexer.api_key.trim().is_empty() {
            return Err(ExplorerError::MissingApiKey("indexer"));
        }
        Ok(())
    }

    /// JSON-RPC endpoint: the explicit override, or the network default
    /// with the provider key embedded.
    pub fn rpc_url(&self) -> String {
        self.provider
            .url
            .clone()
            .unwrap_or_else(|| self.network.name.default_rpc_url(self.provider.api_key.trim()))
    }

    /// Indexer base URL.
    pub fn indexer_url(&self) -> String {
        self.indexer
            .url
            .clone()
            .unwrap_or_else(|| self.network.name.default_indexer_url().to_string())
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis.lookup_timeout_seconds)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.network.name, Network::Mainnet);
        assert_eq!(config.analysis.lookup_timeout_seconds, 10);
        assert_eq!(config.analysis.max_tokens, 10);
        assert_eq!(config.analysis.token_transfer_limit, 100);
        assert_eq!(config.analysis.display_precision, 4);
        assert!(config.report.include_prompt);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[network]
name = "testnet"

[provider]
api_key = "alchemy-key"

[indexer]
api_key = "etherscan-key"
url = "http://localhost:9000/api"

[analysis]
max_tokens = 3
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.network.name, Network::Testnet);
        assert_eq!(config.provider.api_key, "alchemy-key");
        assert_eq!(config.analysis.max_tokens, 3);
        assert_eq!(config.analysis.recent_tx_limit, 10);
        assert_eq!(
            config.rpc_url(),
            "https://eth-sepolia.g.alchemy.com/v2/alchemy-key"
        );
        assert_eq!(config.indexer_url(), "http://localhost:9000/api");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_keys() {
        let mut config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ExplorerError::MissingApiKey("provider"))
        ));

        config.provider.api_key = "k".to_string();
        config.indexer.api_key = "   ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ExplorerError::MissingApiKey("indexer"))
        ));
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        config.provider.api_key = "from-file".to_string();

        let mut args = make_args();
        args.network = Some(Network::Testnet);
        args.indexer_key = Some("from-cli".to_string());
        args.timeout = Some(3);
        args.no_prompt = true;

        config.merge_with_args(&args);
        assert_eq!(config.network.name, Network::Testnet);
        assert_eq!(config.provider.api_key, "from-file");
        assert_eq!(config.indexer.api_key, "from-cli");
        assert_eq!(config.lookup_timeout(), Duration::from_secs(3));
        assert!(!config.report.include_prompt);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[provider]\napi_key = \"abc\"\n\n[report]\ninclude_prompt = false").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.provider.api_key, "abc");
        assert!(!config.report.include_prompt);

        writeln!(file, "not toml [").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[network]"));
        assert!(toml_str.contains("[provider]"));
        assert!(toml_str.contains("[analysis]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.analysis.max_tokens, 10);
        assert!(parsed.provider.api_key.is_empty());
    }
}
