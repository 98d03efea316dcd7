//! confivote CLI
//!
//! Casts encrypted votes and decrypts scores against a local, file-backed
//! stand-in for the voting contract and the FHE SDK.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use confivote_client::mock::{MemoryChain, MemoryFhe, MemoryLedger, SharedLedger, StaticWallet};
use confivote_client::{Candidate, CategoryFilter, ClientConfig, Stats, TxPhase, VoteController};
use confivote_runtime::{Address, RecordId};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

type Controller = VoteController<StaticWallet, MemoryFhe, MemoryChain, MemoryChain>;

#[derive(Parser)]
#[command(name = "confivote")]
#[command(about = "Cast FHE-encrypted votes and publish verified results", long_about = None)]
struct Cli {
    /// Ledger file holding contract and ciphertext state
    #[arg(long, global = true, default_value = ".confivote/ledger.json")]
    ledger: PathBuf,

    /// Client configuration JSON file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Connected wallet address; omit to run disconnected
    #[arg(short, long, global = true)]
    wallet: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a score and submit it for a candidate
    Vote {
        /// Candidate name
        #[arg(short, long)]
        name: String,

        /// Category label, e.g. "Best Film"
        #[arg(short, long)]
        category: String,

        /// Score, a whole number
        #[arg(short, long)]
        score: String,
    },

    /// List candidates
    List {
        /// Case-insensitive match on name or category
        #[arg(short, long, default_value = "")]
        search: String,

        /// Exact category, or "all"
        #[arg(short, long, default_value = "all")]
        category: String,
    },

    /// Show one candidate
    Show {
        /// Record identifier
        id: String,
    },

    /// Aggregate statistics
    Stats,

    /// Top verified candidates by decrypted score
    Rank,

    /// Decrypt a candidate's score and publish the proof
    Decrypt {
        /// Record identifier
        id: String,
    },

    /// Candidates submitted by the connected wallet
    Mine,

    /// Check that the contract is reachable
    Status,
}

fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    match path {
        Some(path) => ClientConfig::from_json_path(path)
            .with_context(|| format!("Failed to load config file: {:?}", path)),
        None => Ok(ClientConfig::default()),
    }
}

fn build_controller(
    config: ClientConfig,
    wallet: Option<Address>,
    ledger: SharedLedger,
) -> Controller {
    let chain = MemoryChain::new(ledger.clone(), config.contract_address, wallet);
    let fhe = MemoryFhe::new(ledger);
    let wallet = match wallet {
        Some(address) => StaticWallet::connected(address),
        None => StaticWallet::disconnected(),
    };
    VoteController::new(config, wallet, fhe, chain.clone(), chain)
}

fn format_timestamp(candidate: &Candidate) -> String {
    candidate
        .created_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_score(candidate: &Candidate) -> String {
    match candidate.decrypted_value {
        Some(value) => value.to_string(),
        None => "🔒 encrypted".to_string(),
    }
}

fn print_candidates(candidates: &[Candidate]) {
    if candidates.is_empty() {
        println!("No candidates found.");
        return;
    }
    for c in candidates {
        println!(
            "{:<28} {:<24} {:<18} {:>14}  {}",
            c.record_id,
            c.name,
            c.category,
            format_score(c),
            format_timestamp(c)
        );
    }
}

fn print_candidate(c: &Candidate) {
    println!("📋 {}", c.name);
    println!("   Id:        {}", c.record_id);
    println!("   Category:  {}", c.category);
    println!("   Creator:   {}", c.creator.short());
    println!("   Created:   {}", format_timestamp(c));
    println!("   Votes:     {} / {}", c.public_value1, c.public_value2);
    println!("   Verified:  {}", if c.is_verified { "yes" } else { "no" });
    println!("   Score:     {}", format_score(c));
}

fn print_stats(stats: &Stats) {
    println!("📊 Candidates:   {}", stats.total_candidates);
    println!("   Total votes:  {}", stats.total_votes);
    println!("   Average:      {:.1}", stats.avg_score);
    println!("   Top category: {}", stats.top_category.as_deref().unwrap_or("N/A"));
}

fn print_banner(controller: &Controller) {
    let status = controller.status();
    if !status.visible {
        return;
    }
    let icon = match status.phase {
        TxPhase::Pending => "⏳",
        TxPhase::Success => "✅",
        TxPhase::Error => "❌",
    };
    println!("{} {}", icon, status.message);
}

async fn execute(controller: &Controller, command: Commands) -> Result<()> {
    match command {
        Commands::Vote { name, category, score } => {
            controller.update(|s| {
                s.open_vote_modal();
                s.set_draft_name(name);
                s.set_draft_category(category);
                s.set_draft_score(score);
            });
            let result = controller.cast_vote().await;
            print_banner(controller);
            let id = result.context("Vote submission failed")?;
            println!("   Record: {}", id);
        }
        Commands::List { search, category } => {
            controller.update(|s| {
                s.set_search(search);
                s.set_category_filter(CategoryFilter::parse(&category));
            });
            print_candidates(&controller.visible_candidates());
        }
        Commands::Show { id } => {
            let id = RecordId::new(id);
            controller.update(|s| s.select_candidate(id.clone()));
            match controller.state().selected_candidate() {
                Some(candidate) => print_candidate(candidate),
                None => anyhow::bail!("Unknown candidate: {}", id),
            }
        }
        Commands::Stats => print_stats(&controller.stats()),
        Commands::Rank => {
            for (rank, c) in controller.rankings().iter().enumerate() {
                println!("{:>2}. {:<24} {:<18} {}", rank + 1, c.name, c.category, format_score(c));
            }
        }
        Commands::Decrypt { id } => {
            let result = controller.decrypt_score(&RecordId::new(id)).await;
            print_banner(controller);
            let value = result.context("Decryption failed")?;
            println!("   Score: {}", value);
        }
        Commands::Mine => print_candidates(&controller.my_candidates()),
        Commands::Status => {
            let result = controller.check_availability().await;
            print_banner(controller);
            result.context("Availability check failed")?;
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let wallet = cli
        .wallet
        .as_deref()
        .map(str::parse::<Address>)
        .transpose()
        .context("Invalid --wallet address")?;

    let ledger = MemoryLedger::load_or_default(&cli.ledger)
        .with_context(|| format!("Failed to read ledger: {:?}", cli.ledger))?
        .shared();
    let controller = build_controller(config, wallet, ledger.clone());

    if controller.connect().await.is_err() {
        print_banner(&controller);
    }

    let outcome = execute(&controller, cli.command).await;

    let snapshot = ledger.lock().clone();
    snapshot
        .save(&cli.ledger)
        .with_context(|| format!("Failed to write ledger: {:?}", cli.ledger))?;
    info!(ledger = ?cli.ledger, "ledger saved");

    outcome
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Unable to set global default subscriber")?;

    run(Cli::parse()).await
}
