//! CLI command implementations.

pub mod analyze;
pub mod config;
pub mod report;
pub mod reset;
pub mod seed;
pub mod select;
pub mod track;

use clap::{Args, Subcommand};

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Send the report even when nothing was dropped or promoted.
    #[arg(long)]
    pub always_notify: bool,

    /// Skip report delivery for this run.
    #[arg(long)]
    pub no_notify: bool,
}

/// Arguments for the seed command.
#[derive(Args)]
pub struct SeedArgs {
    #[command(subcommand)]
    pub command: SeedCommand,
}

#[derive(Subcommand)]
pub enum SeedCommand {
    /// Create slots and their initial variants.
    Products {
        /// JSON file: {"products": [{"slotId", "slotName", "variants": [...]}]}
        file: String,
    },
    /// Add candidates to the pool.
    Pool {
        /// JSON file: {"products": [{"slotId", "title", "url", ...}], "clearExisting"?}
        file: String,

        /// Empty the pool first.
        #[arg(long)]
        clear: bool,
    },
}

/// Arguments for the stats command.
#[derive(Args)]
pub struct StatsArgs {
    /// Only show this slot.
    #[arg(short, long)]
    pub slot: Option<String>,

    /// Show daily records too.
    #[arg(short, long)]
    pub daily: bool,
}

/// Arguments for the pool command.
#[derive(Args)]
pub struct PoolArgs {
    /// Only show this slot.
    #[arg(short, long)]
    pub slot: Option<String>,
}

/// Arguments for the select command.
#[derive(Args)]
pub struct SelectArgs {
    /// Number of simulated page views.
    #[arg(short, long, default_value = "1")]
    pub draws: usize,

    /// Seed for reproducible draws.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the track command.
#[derive(Args)]
pub struct TrackArgs {
    /// Event kind: impression or click.
    pub counter: String,

    /// Variant the event is for.
    pub variant_id: String,

    /// Record the event this many times.
    #[arg(short, long, default_value = "1")]
    pub count: u32,
}

/// Arguments for the call command.
#[derive(Args)]
pub struct CallArgs {
    /// HTTP method.
    pub method: String,

    /// Request path, e.g. /products.
    pub path: String,

    /// Request body.
    #[arg(short, long)]
    pub body: Option<String>,
}

/// Arguments for the reset command.
#[derive(Args)]
pub struct ResetArgs {
    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the configuration.
    Validate,
}
