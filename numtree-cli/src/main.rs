//! numtree CLI - run and maintain a numtree server
//!
//! - `serve`: HTTP API (and optionally the built client bundle)
//! - `migrate`: create or update the database schema
//! - `seed`: fill the database with random users and reply trees
//! - `verify`: audit every stored derivation

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use numtree_core::NumtreeConfig;

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "numtree",
    author,
    version,
    about = "Collaborative number trees: post a number, reply with an operation",
    long_about = "Serve the numtree HTTP API and maintain its PostgreSQL database. \
                  Every reply derives its value from its parent through add, subtract, \
                  multiply or divide."
)]
struct Cli {
    /// Config file (default: ~/.numtree/config.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create or update the database schema
    Migrate(commands::migrate::MigrateArgs),
    /// Populate the database with random users, posts and replies
    Seed(commands::seed::SeedArgs),
    /// Check that every stored value matches its derivation
    Verify(commands::verify::VerifyArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug })?;

    let config =
        NumtreeConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, config).await?,
        Commands::Migrate(args) => commands::run_migrate(args, config).await?,
        Commands::Seed(args) => commands::run_seed(args, config).await?,
        Commands::Verify(args) => commands::run_verify(args, config).await?,
    }
    Ok(())
}
