//! traccia command-line entry point.
//!
//! Thin shell over the core: import an order page, list what's tracked,
//! show aggregate stats. Logging goes to stderr so stdout stays pipeable.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use traccia_core::{AppConfig, StoreDb};

mod commands;

#[derive(Parser)]
#[command(name = "traccia", version, about = "Tracker personale delle consegne")]
struct Cli {
    /// Override the configured database path.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import orders from a saved order-detail page.
    Import {
        /// Path to the HTML file (page source of a single order's detail page).
        path: PathBuf,
    },
    /// List tracked orders.
    List {
        /// Include delivered orders.
        #[arg(long)]
        all: bool,
        /// Filter by text in description, seller or notes.
        #[arg(long)]
        search: Option<String>,
        /// Filter by platform name.
        #[arg(long)]
        platform: Option<String>,
    },
    /// Aggregate statistics over the store.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let store = StoreDb::open(&config.db_path).await?;

    match cli.command {
        Command::Import { path } => commands::import(&store, &path).await,
        Command::List { all, search, platform } => commands::list(&store, all, search, platform).await,
        Command::Stats => commands::stats(&store).await,
    }
}
