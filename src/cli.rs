//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::error::ExplorerError;
use crate::models::{Address, AnalysisMode, Network};
use clap::Parser;
use std::path::PathBuf;

/// Ethscope - Ethereum address explorer with AI-ready reports
///
/// Looks up a wallet, contract or NFT collection through a JSON-RPC
/// provider and a block-explorer indexer, then renders a Markdown or JSON
/// report together with a prompt for an AI assistant.
///
/// Examples:
///   ethscope --address 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045
///   ethscope --address 0x6B175474E89094C44Da98b954EedeAC495271d0F --mode contract
///   ethscope --address 0xb47e3cd837dDF8e4c57F05d70Ab865de6e193BBB --mode nft --format json
///   ethscope --address 0x... --network testnet --output report.md
///   ethscope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Address to analyze (0x followed by 40 hex characters)
    #[arg(short, long, value_name = "ADDRESS", required_unless_present = "init_config")]
    pub address: Option<String>,

    /// What kind of report to produce
    #[arg(short, long, default_value = "wallet", value_name = "MODE")]
    pub mode: AnalysisMode,

    /// Network to query
    ///
    /// Overrides the config file. Defaults to mainnet.
    #[arg(short, long, value_name = "NETWORK", env = "ETHSCOPE_NETWORK")]
    pub network: Option<Network>,

    /// JSON-RPC provider API key
    #[arg(long, value_name = "KEY", env = "ETHSCOPE_PROVIDER_API_KEY", hide_env_values = true)]
    pub provider_key: Option<String>,

    /// Indexer API key
    #[arg(long, value_name = "KEY", env = "ETHSCOPE_INDEXER_API_KEY", hide_env_values = true)]
    pub indexer_key: Option<String>,

    /// Output format (markdown, json)
    #[arg(short, long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print only the intelligence prompt
    #[arg(long, conflicts_with = "no_prompt")]
    pub prompt_only: bool,

    /// Leave the intelligence prompt out of the report
    #[arg(long)]
    pub no_prompt: bool,

    /// Per-lookup timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum number of tokens whose balance is queried
    #[arg(long, value_name = "COUNT")]
    pub max_tokens: Option<usize>,

    /// Number of recent transactions to fetch
    #[arg(long, value_name = "COUNT")]
    pub tx_limit: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ethscope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .ethscope.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.max_tokens == Some(0) {
            return Err("Max tokens must be at least 1".to_string());
        }

        if self.tx_limit == Some(0) {
            return Err("Transaction limit must be at least 1".to_string());
        }

        if self.prompt_only && self.format == OutputFormat::Json {
            return Err("--prompt-only cannot be combined with --format json".to_string());
        }

        Ok(())
    }

    /// The validated target address.
    pub fn target_address(&self) -> Result<Address, ExplorerError> {
        Address::parse(self.address.as_deref().unwrap_or_default())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            address: Some("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".to_string()),
            mode: AnalysisMode::Wallet,
            network: None,
            provider_key: None,
            indexer_key: None,
            format: OutputFormat::Markdown,
            output: None,
            prompt_only: false,
            no_prompt: false,
            timeout: None,
            max_tokens: None,
            tx_limit: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "ethscope",
            "--address",
            "0x6B175474E89094C44Da98b954EedeAC495271d0F",
            "--mode",
            "contract",
            "--network",
            "testnet",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.mode, AnalysisMode::Contract);
        assert_eq!(args.network, Some(Network::Testnet));
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_address_required_unless_init_config() {
        assert!(Args::try_parse_from(["ethscope"]).is_err());
        assert!(Args::try_parse_from(["ethscope", "--init-config"]).is_ok());
    }

    #[test]
    fn test_target_address() {
        let mut args = make_args();
        assert!(args.target_address().is_ok());

        args.address = Some("vitalik.eth".to_string());
        assert!(matches!(
            args.target_address(),
            Err(ExplorerError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_limits() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.max_tokens = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.prompt_only = true;
        args.format = OutputFormat::Json;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
