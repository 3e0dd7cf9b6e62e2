//! Maintenance CLI for one-off contract operations.
//!
//! Unlike the gateway's fire-and-forget handlers, these commands submit
//! and wait: after submitting they poll the transaction status until it
//! leaves `pending`, then report the outcome.

use clap::{Parser, Subcommand};
use evote_gateway::config::Config;
use evote_gateway::ledger::{ContractClient, VotingLedger};
use evote_gateway::types::{CandidateDraft, TxStatus, VotingDraft};
use ethers::types::H256;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_POLLS: u32 = 60;

#[derive(Parser)]
#[command(name = "evote-admin", about = "Maintenance commands for the voting contract")]
struct Cli {
    /// Path to the gateway configuration file
    #[arg(long, default_value = "config/default.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a voting instance (image URLs passed directly, no upload)
    CreateVoting {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Start of the voting window (unix seconds)
        #[arg(long)]
        start: u64,
        /// End of the voting window (unix seconds)
        #[arg(long)]
        end: u64,
        /// Comma-separated candidate names
        #[arg(long)]
        candidates: String,
        /// Comma-separated hosted image URLs, one per candidate
        #[arg(long)]
        images: String,
    },
    /// Mark a voting as ended (1-based id)
    EndVoting { id: u64 },
    /// Delete a voting (1-based id)
    DeleteVoting { id: u64 },
    /// Print the results of a voting (1-based id)
    Results { id: u64 },
    /// Print the candidates of a voting (1-based id)
    Candidates { id: u64 },
    /// List all voting instances
    Votings,
    /// List registered voter NIMs
    Voters,
    /// Look up a transaction's status once, without waiting
    Status { tx_hash: String },
}

/// Poll until the transaction is no longer pending.
async fn wait_for(ledger: &dyn VotingLedger, hash: H256) -> anyhow::Result<()> {
    for _ in 0..MAX_POLLS {
        match ledger.transaction_status(hash).await? {
            TxStatus::Pending => tokio::time::sleep(POLL_INTERVAL).await,
            TxStatus::Confirmed(receipt) => {
                let outcome = if receipt.succeeded { "succeeded" } else { "FAILED" };
                println!(
                    "Transaction {hash:#x} {outcome} in block {} ({} gas)",
                    receipt.block_number, receipt.gas_used
                );
                return Ok(());
            }
        }
    }
    anyhow::bail!("Transaction {hash:#x} still pending after {MAX_POLLS} polls");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let ledger = Arc::new(ContractClient::connect(&config.ledger)?);

    match cli.command {
        Command::CreateVoting {
            title,
            description,
            start,
            end,
            candidates,
            images,
        } => {
            let names: Vec<&str> = candidates.split(',').map(str::trim).collect();
            let urls: Vec<&str> = images.split(',').map(str::trim).collect();
            anyhow::ensure!(
                names.len() == urls.len(),
                "candidate and image counts must match ({} vs {})",
                names.len(),
                urls.len()
            );
            anyhow::ensure!(names.len() >= 2, "at least 2 candidates are required");

            let draft = VotingDraft {
                title: title.clone(),
                description,
                start_time: start,
                end_time: end,
                candidates: names
                    .into_iter()
                    .zip(urls)
                    .map(|(name, url)| CandidateDraft {
                        name: name.to_string(),
                        image_url: url.to_string(),
                        vision: String::new(),
                        mission: String::new(),
                    })
                    .collect(),
            };

            let hash = ledger.create_voting(&draft).await?;
            info!("createVoting submitted: {hash:#x}");
            wait_for(ledger.as_ref(), hash).await?;
            println!("Voting created with title {title}");
        }
        Command::EndVoting { id } => {
            anyhow::ensure!(id >= 1, "voting ids start at 1");
            let hash = ledger.end_voting(id - 1).await?;
            info!("endVoting submitted: {hash:#x}");
            wait_for(ledger.as_ref(), hash).await?;
            println!("Voting with id {id} ended");
        }
        Command::DeleteVoting { id } => {
            anyhow::ensure!(id >= 1, "voting ids start at 1");
            let hash = ledger.delete_voting(id - 1).await?;
            info!("deleteVoting submitted: {hash:#x}");
            wait_for(ledger.as_ref(), hash).await?;
            println!("Voting with id {id} deleted");
        }
        Command::Results { id } => {
            anyhow::ensure!(id >= 1, "voting ids start at 1");
            let tallies = ledger.voting_result(id - 1).await?;
            if tallies.is_empty() {
                println!("No results available for voting {id}");
            }
            for tally in tallies {
                println!("{}: {} votes", tally.candidate, tally.votes);
            }
        }
        Command::Candidates { id } => {
            anyhow::ensure!(id >= 1, "voting ids start at 1");
            match ledger.voting_details(id - 1).await? {
                Some(details) => {
                    for candidate in details.candidates {
                        println!("{}. {}", candidate.number, candidate.name);
                    }
                }
                None => println!("Voting with id {id} doesn't exist"),
            }
        }
        Command::Votings => {
            for summary in ledger.all_votings().await? {
                let state = if summary.voting_ended { "ended" } else { "open" };
                println!(
                    "{}. {} [{state}] {}..{}",
                    summary.index + 1,
                    summary.title,
                    summary.start_time,
                    summary.end_time
                );
            }
        }
        Command::Voters => {
            for nim in ledger.voter_nims().await? {
                println!("{nim}");
            }
        }
        Command::Status { tx_hash } => {
            let hash: H256 = tx_hash.parse()?;
            match ledger.transaction_status(hash).await? {
                TxStatus::Pending => println!("pending"),
                TxStatus::Confirmed(receipt) => {
                    let outcome = if receipt.succeeded { "success" } else { "failed" };
                    println!(
                        "{outcome}: block {}, {} confirmations, {} gas, fee {} wei",
                        receipt.block_number,
                        receipt.confirmations,
                        receipt.gas_used,
                        receipt.fee
                    );
                }
            }
        }
    }

    Ok(())
}
