//! Intelligence prompt rendering.
//!
//! Produces a plain-text request that can be pasted into an external AI
//! assistant. Output depends only on its inputs.

use crate::models::{AnalysisMode, ContractReport, NftReport, Report, TransactionRecord, WalletReport};
use chrono::{DateTime, Utc};

/// Maximum number of transactions quoted in the prompt.
pub const PROMPT_TX_LIMIT: usize = 5;

/// Render the intelligence prompt for a report.
///
/// `mode` selects the task list; the target section follows whichever
/// report variant is supplied.
pub fn render_intelligence_prompt(
    report: &Report,
    mode: AnalysisMode,
    generated_at: DateTime<Utc>,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("# Blockchain Intelligence Request\n\n");
    prompt.push_str(&format!(
        "Generated: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    prompt.push_str(&format!("Analysis mode: {}\n\n", mode));

    prompt.push_str("## Target Information\n\n");
    match report {
        Report::Wallet(wallet) => prompt.push_str(&wallet_target(wallet)),
        Report::Contract(contract) => prompt.push_str(&contract_target(contract)),
        Report::Nft(nft) => prompt.push_str(&nft_target(nft)),
    }
    prompt.push('\n');

    prompt.push_str("## Analysis Tasks\n\n");
    for (i, task) in analysis_tasks(mode).iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, task));
    }
    prompt.push('\n');

    prompt.push_str("## Recent Transactions\n\n");
    match report {
        Report::Wallet(wallet) if !wallet.recent_transactions.is_empty() => {
            for tx in wallet.recent_transactions.iter().take(PROMPT_TX_LIMIT) {
                prompt.push_str(&transaction_line(wallet, tx));
            }
        }
        Report::Wallet(_) => prompt.push_str("No recent transactions found.\n"),
        _ => prompt.push_str("Not applicable for this analysis mode.\n"),
    }
    prompt.push('\n');

    prompt.push_str("## Requested Output Format\n\n");
    prompt.push_str("Respond in Markdown with the following sections:\n");
    prompt.push_str("1. **Summary** - two or three sentences describing the address\n");
    prompt.push_str("2. **Key Findings** - bullet points backed by the data above\n");
    prompt.push_str("3. **Risk Assessment** - Low, Medium or High, with reasoning\n");
    prompt.push_str("4. **Recommendations** - concrete next steps for further investigation\n");
    prompt.push_str("\nOnly use the data provided. Say so when the data is insufficient.\n");

    prompt
}

fn wallet_target(wallet: &WalletReport) -> String {
    let mut out = String::new();
    out.push_str("- Type: Wallet\n");
    out.push_str(&format!("- Address: {}\n", wallet.address));
    if let Some(name) = &wallet.resolved_name {
        out.push_str(&format!("- ENS Name: {}\n", name));
    }
    out.push_str(&format!("- Balance: {}\n", wallet.balance_display()));
    out.push_str(&format!("- Transaction Count: {}\n", wallet.transaction_count));
    out.push_str(&format!("- Current Block: {}\n", wallet.current_block_height));
    if let Some(first) = wallet.first_activity() {
        out.push_str(&format!(
            "- Earliest Fetched Activity: {}\n",
            first.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    if wallet.token_holdings.is_empty() {
        out.push_str("- Token Holdings: none found\n");
    } else {
        out.push_str(&format!("- Token Holdings ({}):\n", wallet.token_holdings.len()));
        for holding in &wallet.token_holdings {
            out.push_str(&format!(
                "  - {} {} ({})\n",
                holding.balance, holding.symbol, holding.display_name
            ));
        }
    }

    out
}

fn contract_target(contract: &ContractReport) -> String {
    let mut out = String::new();
    out.push_str("- Type: Smart Contract\n");
    out.push_str(&format!("- Address: {}\n", contract.address));
    out.push_str(&format!(
        "- Verified Source: {}\n",
        if contract.verified { "Yes" } else { "No" }
    ));
    if let Some(name) = &contract.name {
        out.push_str(&format!("- Contract Name: {}\n", name));
    }
    if let Some(version) = &contract.compiler_version {
        out.push_str(&format!("- Compiler: {}\n", version));
    }
    if contract.verified {
        out.push_str(&format!("- Source Lines: {}\n", contract.source_line_count()));
        let functions = contract.abi_functions();
        if !functions.is_empty() {
            out.push_str(&format!("- Functions ({}):\n", functions.len()));
            for function in functions {
                out.push_str(&format!("  - {}\n", function));
            }
        }
    }
    out
}

fn nft_target(nft: &NftReport) -> String {
    let mut out = String::new();
    out.push_str("- Type: NFT Collection\n");
    out.push_str(&format!("- Address: {}\n", nft.address));
    out.push_str(&format!("- Collection Name: {}\n", nft.collection_name));
    out.push_str(&format!("- Symbol: {}\n", nft.symbol));
    out.push_str(&format!("- Total Supply: {}\n", nft.total_supply));
    out.push_str(&format!("- Standard: {}\n", nft.standard_guess));
    out
}

fn analysis_tasks(mode: AnalysisMode) -> &'static [&'static str] {
    match mode {
        AnalysisMode::Wallet => &[
            "Classify the wallet (individual, exchange, contract deployer, bot or other)",
            "Describe its activity pattern and counterparties",
            "Assess the token portfolio and concentration",
            "Flag interactions that suggest scams, mixers or exploits",
        ],
        AnalysisMode::Contract => &[
            "Identify what the contract does from its name and functions",
            "Point out privileged or administrative functions",
            "Note security concerns visible from the interface",
            "Comment on the verification status and compiler version",
        ],
        AnalysisMode::Nft => &[
            "Describe the collection and its likely purpose",
            "Assess the supply relative to typical collections",
            "Note anything unusual in the metadata",
        ],
    }
}

fn transaction_line(wallet: &WalletReport, tx: &TransactionRecord) -> String {
    let outgoing = tx.from.eq_ignore_ascii_case(wallet.address.as_str());
    let counterparty = match (outgoing, tx.is_contract_creation()) {
        (true, true) => "contract creation",
        (true, false) => tx.to.as_deref().unwrap_or_default(),
        (false, _) => tx.from.as_str(),
    };
    let when = tx
        .timestamp()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| tx.timestamp_seconds.to_string());

    format!(
        "- [{}] {} {} {} {}{}\n",
        when,
        if outgoing { "OUT" } else { "IN" },
        tx.value,
        if outgoing { "to" } else { "from" },
        counterparty,
        if tx.failed { " (failed)" } else { "" }
    )
}
