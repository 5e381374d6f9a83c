//! Ethscope - Ethereum address explorer
//!
//! A CLI tool that looks up a wallet, contract or NFT collection through a
//! JSON-RPC provider and a block-explorer indexer, and renders a report
//! plus an intelligence prompt for an AI assistant.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Fatal error (invalid address, missing key, chain unreachable,
//!       not a contract, contract information unavailable, I/O)

mod analysis;
mod chain;
mod cli;
mod config;
mod error;
mod indexer;
mod models;
mod report;

use analysis::{Aggregator, AggregatorConfig};
use anyhow::{Context, Result};
use chain::RpcChainReader;
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use indexer::EtherscanIndexer;
use indicatif::{ProgressBar, ProgressStyle};
use models::{ReportEnvelope, ReportMetadata};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Ethscope v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        "Target: {:?}, mode: {}, format: {:?}",
        args.address, args.mode, args.format
    );

    if let Err(e) = run(args).await {
        error!("Run failed: {}", e);
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .ethscope.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Add your provider and indexer API keys before running an analysis.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so a report printed to stdout stays clean.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run one analysis and write its output.
async fn run(args: Args) -> Result<()> {
    let address = args.target_address()?;

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let network = config.network.name;
    let timeout = config.lookup_timeout();

    let chain = RpcChainReader::new(config.rpc_url(), timeout)?;
    let indexer = EtherscanIndexer::new(
        config.indexer_url(),
        config.indexer.api_key.trim(),
        network,
        timeout,
    )?;
    let aggregator = Aggregator::new(chain, indexer, AggregatorConfig::from(&config));

    let spinner = (!args.quiet && args.output.is_some())
        .then(|| lookup_spinner(&format!("Analyzing {} on {}...", address, network)));

    let start_time = Instant::now();
    let result = aggregator.produce_report(&address, args.mode).await;
    let duration = start_time.elapsed().as_secs_f64();

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let report = result?;

    let generated_at = Utc::now();
    let prompt = (config.report.include_prompt || args.prompt_only)
        .then(|| report::render_intelligence_prompt(&report, args.mode, generated_at));

    let output = match (args.prompt_only, prompt) {
        (true, Some(prompt)) => prompt,
        (_, prompt) => {
            let envelope = ReportEnvelope {
                metadata: ReportMetadata {
                    network,
                    generated_at,
                    duration_seconds: duration,
                    tool_version: env!("CARGO_PKG_VERSION").to_string(),
                },
                report,
                prompt,
            };
            match args.format {
                OutputFormat::Json => report::generate_json_report(&envelope)?,
                OutputFormat::Markdown => report::generate_markdown_report(&envelope),
            }
        }
    };

    let Some(ref path) = args.output else {
        print!("{}", output);
        if !output.ends_with('\n') {
            println!();
        }
        return Ok(());
    };

    std::fs::write(path, &output)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    info!("Report written to {}", path.display());
    if !args.quiet {
        println!("\n📊 Analysis Summary:");
        println!("   Address: {}", address);
        println!("   Mode: {} | Network: {}", args.mode, network);
        println!("   Duration: {:.1}s", duration);
        println!("\n✅ Report saved to: {}", path.display());
    }

    Ok(())
}

/// Spinner shown on stderr while lookups are in flight.
fn lookup_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
