//! Shelf CLI - operate the product shelf from a terminal.
//!
//! Commands:
//! - `shelf analyze` - Run one drop / rebalance / promote cycle
//! - `shelf seed` - Load slots, variants and pool candidates
//! - `shelf stats` - Per-variant performance
//! - `shelf pool` - Candidates waiting for promotion
//! - `shelf select` - Simulate page views and show the pick distribution
//! - `shelf track` - Record an impression or click
//! - `shelf call` - Dispatch a request through the HTTP router
//! - `shelf reset` - Delete slots, variants and stats
//! - `shelf config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{AnalyzeArgs, CallArgs, ConfigArgs, PoolArgs, ResetArgs, SeedArgs, SelectArgs, StatsArgs, TrackArgs};

/// Shelf CLI - A/B test affiliate product slots
#[derive(Parser)]
#[command(name = "shelf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Environment whose overrides apply
    #[arg(short, long, global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the variant analysis cycle once
    Analyze(AnalyzeArgs),

    /// Seed slots, variants or pool candidates from a JSON file
    Seed(SeedArgs),

    /// Show per-variant performance
    Stats(StatsArgs),

    /// Show pool candidates by slot
    Pool(PoolArgs),

    /// Simulate selections and report how often each variant wins
    Select(SelectArgs),

    /// Record an impression or click
    Track(TrackArgs),

    /// Send a request through the HTTP router in-process
    Call(CallArgs),

    /// Delete all slots, variants and stats
    Reset(ResetArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);
    let ctx = context::Context::load(cli.config.as_deref(), cli.env.as_deref(), output)?;

    let result = match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args, &ctx).await,
        Commands::Seed(args) => commands::seed::run(args, &ctx).await,
        Commands::Stats(args) => commands::report::stats(args, &ctx).await,
        Commands::Pool(args) => commands::report::pool(args, &ctx).await,
        Commands::Select(args) => commands::select::run(args, &ctx).await,
        Commands::Track(args) => commands::track::run(args, &ctx).await,
        Commands::Call(args) => commands::track::call(args, &ctx).await,
        Commands::Reset(args) => commands::reset::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
