//! Markdown and JSON report generation.
//!
//! This module renders a finished `ReportEnvelope` into a human-readable
//! Markdown document or pretty-printed JSON.

use crate::models::{
    ContractReport, Network, NftReport, Report, ReportEnvelope, ReportMetadata, WalletReport,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(envelope: &ReportEnvelope) -> String {
    let mut output = String::new();
    let report = &envelope.report;

    // Title
    output.push_str(&format!(
        "# Ethscope Report: {}\n\n",
        report.address().short(6, 4)
    ));

    output.push_str(&generate_metadata_section(&envelope.metadata, report));
    output.push_str(&generate_table_of_contents(envelope));

    match report {
        Report::Wallet(wallet) => {
            output.push_str(&generate_wallet_section(wallet, envelope.metadata.network))
        }
        Report::Contract(contract) => output.push_str(&generate_contract_section(contract)),
        Report::Nft(nft) => output.push_str(&generate_nft_section(nft)),
    }

    if let Some(prompt) = &envelope.prompt {
        output.push_str(&generate_prompt_section(prompt));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata, report: &Report) -> String {
    let mut section = String::new();
    let address = report.address();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Address:** [`{}`]({}/address/{})\n",
        address,
        metadata.network.explorer_url(),
        address
    ));
    section.push_str(&format!("- **Mode:** {}\n", report.mode()));
    section.push_str(&format!("- **Network:** {}\n", metadata.network));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Lookup Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(envelope: &ReportEnvelope) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");

    match &envelope.report {
        Report::Wallet(wallet) => {
            toc.push_str("- [Overview](#overview)\n");
            if !wallet.token_holdings.is_empty() {
                toc.push_str("- [Token Holdings](#token-holdings)\n");
            }
            toc.push_str("- [Recent Transactions](#recent-transactions)\n");
        }
        Report::Contract(contract) => {
            toc.push_str("- [Contract Details](#contract-details)\n");
            if !contract.abi_functions().is_empty() {
                toc.push_str("- [Functions](#functions)\n");
            }
        }
        Report::Nft(_) => toc.push_str("- [Collection](#collection)\n"),
    }

    if envelope.prompt.is_some() {
        toc.push_str("- [Intelligence Prompt](#intelligence-prompt)\n");
    }

    toc.push('\n');

    toc
}

/// Generate the wallet body: overview, holdings and transactions.
fn generate_wallet_section(wallet: &WalletReport, network: Network) -> String {
    let mut section = String::new();
    let explorer = network.explorer_url();

    section.push_str("## Overview\n\n");
    section.push_str("| Field | Value |\n");
    section.push_str("|:---|:---|\n");
    section.push_str(&format!("| Balance | {} |\n", wallet.balance_display()));
    section.push_str(&format!(
        "| Raw Balance (wei) | {} |\n",
        wallet.raw_balance
    ));
    section.push_str(&format!(
        "| Transactions Sent | {} |\n",
        wallet.transaction_count
    ));
    section.push_str(&format!(
        "| Current Block | {} |\n",
        wallet.current_block_height
    ));
    if let Some(name) = &wallet.resolved_name {
        section.push_str(&format!("| ENS Name | {} |\n", table_cell(name)));
    }
    if let Some(first) = wallet.first_activity() {
        section.push_str(&format!(
            "| Earliest Fetched Activity | {} |\n",
            first.format("%Y-%m-%d")
        ));
    }
    section.push('\n');

    if !wallet.token_holdings.is_empty() {
        section.push_str("## Token Holdings\n\n");
        section.push_str("| Token | Symbol | Balance | Contract |\n");
        section.push_str("|:---|:---|---:|:---|\n");
        for holding in &wallet.token_holdings {
            section.push_str(&format!(
                "| {} | {} | {} | [{}]({}/token/{}) |\n",
                table_cell(&holding.display_name),
                table_cell(&holding.symbol),
                holding.balance,
                holding.contract_address.short(6, 4),
                explorer,
                holding.contract_address
            ));
        }
        section.push('\n');
    }

    section.push_str("## Recent Transactions\n\n");
    if wallet.recent_transactions.is_empty() {
        section.push_str("No recent transactions found.\n\n");
        return section;
    }

    section.push_str("| Time | Hash | From | To | Value | Status |\n");
    section.push_str("|:---|:---|:---|:---|---:|:---:|\n");
    for tx in &wallet.recent_transactions {
        let when = tx
            .timestamp()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| tx.timestamp_seconds.to_string());
        let to = if tx.is_contract_creation() {
            "Contract creation".to_string()
        } else {
            tx.to.as_deref().map(short_hex).unwrap_or_default()
        };

        section.push_str(&format!(
            "| {} | [{}]({}/tx/{}) | {} | {} | {} | {} |\n",
            when,
            short_hex(&tx.hash),
            explorer,
            tx.hash,
            short_hex(&tx.from),
            to,
            tx.value,
            if tx.failed { "❌" } else { "✅" }
        ));
    }
    section.push('\n');

    section
}

/// Generate the contract body.
fn generate_contract_section(contract: &ContractReport) -> String {
    let mut section = String::new();

    section.push_str("## Contract Details\n\n");
    section.push_str("| Field | Value |\n");
    section.push_str("|:---|:---|\n");
    section.push_str(&format!(
        "| Verified | {} |\n",
        if contract.verified { "✅ Yes" } else { "❌ No" }
    ));
    if let Some(name) = &contract.name {
        section.push_str(&format!("| Name | {} |\n", table_cell(name)));
    }
    if let Some(version) = &contract.compiler_version {
        section.push_str(&format!("| Compiler | `{}` |\n", table_cell(version)));
    }
    if contract.verified {
        section.push_str(&format!(
            "| Source Lines | {} |\n",
            contract.source_line_count()
        ));
    }
    if let Some(args) = &contract.constructor_arguments {
        section.push_str(&format!("| Constructor Arguments | `{}` |\n", short_hex(args)));
    }
    section.push('\n');

    if !contract.verified {
        section.push_str("Source code is not verified on the indexer.\n\n");
        return section;
    }

    let functions = contract.abi_functions();
    if !functions.is_empty() {
        section.push_str("## Functions\n\n");
        for function in functions {
            section.push_str(&format!("- `{}`\n", function));
        }
        section.push('\n');
    }

    section
}

/// Generate the NFT collection body.
fn generate_nft_section(nft: &NftReport) -> String {
    let mut section = String::new();

    section.push_str("## Collection\n\n");
    section.push_str("| Field | Value |\n");
    section.push_str("|:---|:---|\n");
    section.push_str(&format!("| Name | {} |\n", table_cell(&nft.collection_name)));
    section.push_str(&format!("| Symbol | {} |\n", table_cell(&nft.symbol)));
    section.push_str(&format!("| Total Supply | {} |\n", nft.total_supply));
    section.push_str(&format!("| Standard | {} |\n", nft.standard_guess));
    section.push('\n');

    section
}

fn generate_prompt_section(prompt: &str) -> String {
    let mut section = String::new();

    section.push_str("## Intelligence Prompt\n\n");
    section.push_str("Paste the following into an AI assistant:\n\n");
    section.push_str("```text\n");
    section.push_str(prompt.trim_end());
    section.push_str("\n```\n\n");

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by Ethscope v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Shorten a hex string such as a hash to `0x1234...abcd`.
fn short_hex(value: &str) -> String {
    if value.len() <= 13 || !value.is_ascii() {
        return value.to_string();
    }
    format!("{}...{}", &value[..6], &value[value.len() - 4..])
}

/// Make an untrusted string safe inside a Markdown table cell. Token and
/// collection names come from on-chain metadata and may contain anything.
fn table_cell(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace(['\r', '\n'], " ")
}

/// Generate a JSON report.
pub fn generate_json_report(envelope: &ReportEnvelope) -> Result<String> {
    serde_json::to_string_pretty(envelope).map_err(Into::into)
}
