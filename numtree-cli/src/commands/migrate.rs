//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;
use numtree_core::NumtreeConfig;
use numtree_server::db::migrations;

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs, config: NumtreeConfig) -> Result<()> {
    let pool = super::connect(&config, args.database_url).await?;
    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;
    println!("Schema is up to date");
    Ok(())
}
