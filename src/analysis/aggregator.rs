//! Report aggregation.
//!
//! The aggregator fans out the lookups a mode needs, waits for all of them
//! and folds the results into one `Report`. Lookups that define the report
//! fail it; every other lookup degrades to an empty or placeholder value
//! and is only logged.

use super::units::{format_native, format_units, TokenAmount, NATIVE_DECIMALS};
use crate::chain::contracts::{IERC20, IERC721Metadata};
use crate::chain::{call_contract, ChainReader};
use crate::config::Config;
use crate::error::{ChainError, ExplorerError, IndexerError};
use crate::indexer::{Indexer, RawContractSource, RawTokenTransfer, RawTransaction};
use crate::models::{
    Address, AnalysisMode, ContractReport, Network, NftReport, Report, TokenHolding,
    TransactionRecord, WalletReport, ERC721, UNKNOWN,
};
use alloy_primitives::U256;
use futures::future::join_all;
use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Settings the aggregator needs from the configuration.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Network the readers point at.
    pub network: Network,
    /// Upper bound on any single lookup.
    pub lookup_timeout: Duration,
    /// Maximum number of distinct tokens to query balances for.
    pub max_tokens: usize,
    /// Number of recent transactions to fetch.
    pub recent_tx_limit: usize,
    /// Number of token transfers scanned for token contracts.
    pub token_transfer_limit: usize,
    /// Fractional digits in displayed amounts.
    pub display_precision: u8,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AggregatorConfig {
    fn from(config: &Config) -> Self {
        Self {
            network: config.network.name,
            lookup_timeout: Duration::from_secs(config.analysis.lookup_timeout_seconds),
            max_tokens: config.analysis.max_tokens,
            recent_tx_limit: config.analysis.recent_tx_limit,
            token_transfer_limit: config.analysis.token_transfer_limit,
            display_precision: config.analysis.display_precision,
        }
    }
}

/// A token contract seen in the transfer history.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    pub contract: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Builds reports from a chain-state reader and an indexer.
pub struct Aggregator<C, I> {
    chain: C,
    indexer: I,
    config: AggregatorConfig,
}

impl<C: ChainReader, I: Indexer> Aggregator<C, I> {
    pub fn new(chain: C, indexer: I, config: AggregatorConfig) -> Self {
        Self {
            chain,
            indexer,
            config,
        }
    }

    /// Produce the report for `mode`. Errors are fatal; degraded lookups
    /// never surface here.
    pub async fn produce_report(
        &self,
        address: &Address,
        mode: AnalysisMode,
    ) -> Result<Report, ExplorerError> {
        info!(address = %address, mode = %mode, network = %self.config.network, "Producing report");

        let report = match mode {
            AnalysisMode::Wallet => Report::Wallet(self.wallet_report(address).await?),
            AnalysisMode::Contract => Report::Contract(self.contract_report(address).await?),
            AnalysisMode::Nft => Report::Nft(self.nft_report(address).await?),
        };

        info!(address = %address, mode = %mode, "Report ready");
        Ok(report)
    }

    async fn wallet_report(&self, address: &Address) -> Result<WalletReport, ExplorerError> {
        let mode = AnalysisMode::Wallet;

        let defining = async {
            tokio::try_join!(
                self.bounded(self.chain.native_balance(address), ChainError::Timeout),
                self.bounded(self.chain.transaction_count(address), ChainError::Timeout),
                self.bounded(self.chain.block_number(), ChainError::Timeout),
            )
        };

        let (defining, recent_transactions, token_holdings, resolved_name) = tokio::join!(
            defining,
            self.recent_transactions(address, mode),
            self.token_holdings(address, mode),
            self.resolve_name(address, mode),
        );

        let (balance, transaction_count, current_block_height) = defining.map_err(|e| {
            error!(lookup = "account_state", address = %address, mode = %mode, error = %e, "Chain-state lookup failed");
            ExplorerError::ChainUnavailable(e)
        })?;

        let first_activity_timestamp = first_activity(&recent_transactions);

        Ok(WalletReport {
            address: address.clone(),
            native_balance: format_units(balance, NATIVE_DECIMALS, self.config.display_precision),
            raw_balance: balance.to_string(),
            native_symbol: self.config.network.native_symbol().to_string(),
            transaction_count,
            current_block_height,
            resolved_name,
            token_holdings,
            recent_transactions,
            first_activity_timestamp,
        })
    }

    async fn contract_report(&self, address: &Address) -> Result<ContractReport, ExplorerError> {
        let mode = AnalysisMode::Contract;
        self.ensure_contract(address, mode).await?;

        let source = self
            .bounded(self.indexer.verified_source(address), IndexerError::Timeout)
            .await
            .map_err(|e| {
                error!(lookup = "verified_source", address = %address, mode = %mode, error = %e, "No contract record");
                ExplorerError::ContractInfoUnavailable(address.to_string())
            })?;

        Ok(contract_report_from(address, source))
    }

    async fn nft_report(&self, address: &Address) -> Result<NftReport, ExplorerError> {
        let mode = AnalysisMode::Nft;
        self.ensure_contract(address, mode).await?;

        let target = address.to_alloy();
        let (name, symbol, total_supply) = tokio::join!(
            self.bounded(
                call_contract(&self.chain, target, IERC721Metadata::nameCall {}),
                ChainError::Timeout,
            ),
            self.bounded(
                call_contract(&self.chain, target, IERC721Metadata::symbolCall {}),
                ChainError::Timeout,
            ),
            self.bounded(
                call_contract(&self.chain, target, IERC721Metadata::totalSupplyCall {}),
                ChainError::Timeout,
            ),
        );

        Ok(NftReport {
            address: address.clone(),
            collection_name: or_unknown(name.map(|r| r._0), "nft_name", address, mode),
            symbol: or_unknown(symbol.map(|r| r._0), "nft_symbol", address, mode),
            total_supply: or_unknown(
                total_supply.map(|r| r._0.to_string()),
                "nft_total_supply",
                address,
                mode,
            ),
            standard_guess: ERC721.to_string(),
        })
    }

    /// Fail unless `address` has deployed bytecode.
    async fn ensure_contract(
        &self,
        address: &Address,
        mode: AnalysisMode,
    ) -> Result<(), ExplorerError> {
        let code = self
            .bounded(self.chain.code(address), ChainError::Timeout)
            .await
            .map_err(|e| {
                error!(lookup = "code", address = %address, mode = %mode, error = %e, "Code lookup failed");
                ExplorerError::ChainUnavailable(e)
            })?;

        if code.is_empty() {
            warn!(address = %address, mode = %mode, "Target has no bytecode");
            return Err(ExplorerError::NotAContract(address.to_string()));
        }

        debug!("{} has {} bytes of code", address, code.len());
        Ok(())
    }

    async fn recent_transactions(
        &self,
        address: &Address,
        mode: AnalysisMode,
    ) -> Vec<TransactionRecord> {
        let raw = degrade(
            self.bounded(
                self.indexer
                    .list_transactions(address, self.config.recent_tx_limit),
                IndexerError::Timeout,
            )
            .await,
            "recent_transactions",
            address,
            mode,
        );

        let mut records: Vec<TransactionRecord> = raw
            .iter()
            .filter_map(|tx| {
                normalize_transaction(
                    tx,
                    self.config.display_precision,
                    self.config.network.native_symbol(),
                )
            })
            .collect();

        sort_most_recent_first(&mut records);
        records.truncate(self.config.recent_tx_limit);
        records
    }

    async fn token_holdings(&self, address: &Address, mode: AnalysisMode) -> Vec<TokenHolding> {
        let transfers = degrade(
            self.bounded(
                self.indexer
                    .list_token_transfers(address, self.config.token_transfer_limit),
                IndexerError::Timeout,
            )
            .await,
            "token_transfers",
            address,
            mode,
        );

        let tokens = unique_tokens(&transfers, self.config.max_tokens);
        debug!("Querying balances for {} tokens", tokens.len());

        let account = address.to_alloy();
        let balances = join_all(tokens.into_iter().map(|token| async move {
            let balance = self
                .bounded(
                    call_contract(
                        &self.chain,
                        token.contract.to_alloy(),
                        IERC20::balanceOfCall { account },
                    ),
                    ChainError::Timeout,
                )
                .await
                .map(|r| r._0);
            (token, balance)
        }))
        .await;

        let mut held = Vec::new();
        for (token, balance) in balances {
            match balance {
                Ok(raw) => held.push((token, raw)),
                Err(e) => warn!(
                    lookup = "token_balance",
                    address = %address,
                    mode = %mode,
                    token = %token.contract,
                    error = %e,
                    "Token balance lookup failed, skipping token"
                ),
            }
        }

        rank_holdings(held, self.config.display_precision)
    }

    async fn resolve_name(&self, address: &Address, mode: AnalysisMode) -> Option<String> {
        if !self.config.network.is_main() {
            debug!("Skipping reverse resolution on {}", self.config.network);
            return None;
        }

        degrade(
            self.bounded(self.chain.reverse_resolve_name(address), ChainError::Timeout)
                .await,
            "reverse_name",
            address,
            mode,
        )
    }

    /// Run `lookup` under the per-lookup timeout.
    async fn bounded<T, E>(
        &self,
        lookup: impl Future<Output = Result<T, E>>,
        on_timeout: fn(Duration) -> E,
    ) -> Result<T, E> {
        match tokio::time::timeout(self.config.lookup_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(self.config.lookup_timeout)),
        }
    }
}

/// Absorb a failed non-defining lookup into the field's empty value.
fn degrade<T: Default, E: Display>(
    result: Result<T, E>,
    lookup: &'static str,
    address: &Address,
    mode: AnalysisMode,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(lookup, address = %address, mode = %mode, error = %e, "Lookup failed, continuing without it");
            T::default()
        }
    }
}

/// Like [`degrade`], with the `Unknown` placeholder as the empty value.
fn or_unknown<E: Display>(
    result: Result<String, E>,
    lookup: &'static str,
    address: &Address,
    mode: AnalysisMode,
) -> String {
    degrade(result.map(Some), lookup, address, mode).unwrap_or_else(|| UNKNOWN.to_string())
}

/// Normalize one indexer transaction. Records with unparsable numbers are
/// dropped.
pub fn normalize_transaction(
    tx: &RawTransaction,
    precision: u8,
    symbol: &str,
) -> Option<TransactionRecord> {
    let value = U256::from_str_radix(tx.value.trim(), 10).ok()?;
    let timestamp_seconds = tx.time_stamp.trim().parse().ok()?;
    let block_number = tx.block_number.trim().parse().ok()?;

    Some(TransactionRecord {
        hash: tx.hash.clone(),
        from: tx.from.clone(),
        to: if tx.to.trim().is_empty() {
            None
        } else {
            Some(tx.to.clone())
        },
        value: format_native(value, precision, symbol),
        timestamp_seconds,
        block_number,
        failed: tx.is_error.trim() == "1",
    })
}

/// Sort by timestamp then block, newest first. Stable for ties.
pub fn sort_most_recent_first(records: &mut [TransactionRecord]) {
    records.sort_by(|a, b| {
        b.timestamp_seconds
            .cmp(&a.timestamp_seconds)
            .then_with(|| b.block_number.cmp(&a.block_number))
    });
}

/// Timestamp of the oldest fetched transaction.
///
/// Bounded by the fetch window: with more history than the limit, this is
/// the oldest *fetched* transaction, not the account's first.
pub fn first_activity(records: &[TransactionRecord]) -> Option<u64> {
    records.iter().map(|tx| tx.timestamp_seconds).min()
}

/// Distinct token contracts in first-seen order, at most `cap` of them.
///
/// Transfers with an invalid contract address or an unusable decimal count
/// are skipped and do not count toward the cap.
pub fn unique_tokens(transfers: &[RawTokenTransfer], cap: usize) -> Vec<TokenInfo> {
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();

    for transfer in transfers {
        if tokens.len() >= cap {
            break;
        }

        let Ok(contract) = Address::parse(transfer.contract_address.trim()) else {
            debug!("Skipping transfer with bad contract {:?}", transfer.contract_address);
            continue;
        };
        if seen.contains(&contract) {
            continue;
        }
        let Some(decimals) = transfer
            .token_decimal
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|d| TokenAmount::new(U256::ZERO, *d).is_some())
        else {
            debug!("Skipping token {} with decimals {:?}", contract, transfer.token_decimal);
            continue;
        };

        seen.insert(contract.clone());
        tokens.push(TokenInfo {
            contract,
            name: transfer.token_name.clone(),
            symbol: transfer.token_symbol.clone(),
            decimals,
        });
    }

    tokens
}

/// Keep strictly positive balances, largest decimal value first.
pub fn rank_holdings(held: Vec<(TokenInfo, U256)>, precision: u8) -> Vec<TokenHolding> {
    let mut ranked: Vec<(TokenAmount, TokenInfo)> = held
        .into_iter()
        .filter_map(|(token, raw)| {
            let amount = TokenAmount::new(raw, token.decimals)?;
            amount.is_positive().then_some((amount, token))
        })
        .collect();

    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    ranked
        .into_iter()
        .map(|(amount, token)| TokenHolding {
            contract_address: token.contract,
            display_name: token.name,
            symbol: token.symbol,
            decimal_places: token.decimals,
            balance: amount.format(precision),
            raw_balance: amount.raw.to_string(),
        })
        .collect()
}

/// Build a contract report from an indexer record.
pub fn contract_report_from(address: &Address, source: RawContractSource) -> ContractReport {
    let non_empty = |s: String| {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };

    if source.source_code.trim().is_empty() {
        return ContractReport {
            address: address.clone(),
            name: None,
            compiler_version: None,
            verified: false,
            abi: None,
            source_code: None,
            constructor_arguments: None,
        };
    }

    ContractReport {
        address: address.clone(),
        name: non_empty(source.contract_name),
        compiler_version: non_empty(source.compiler_version),
        verified: true,
        abi: serde_json::from_str(&source.abi).ok(),
        source_code: Some(source.source_code),
        constructor_arguments: non_empty(source.constructor_arguments),
    }
}
