//! Command implementations for the numtree CLI

pub mod migrate;
pub mod seed;
pub mod serve;
pub mod verify;

use anyhow::{Context, Result};
use numtree_core::NumtreeConfig;
use numtree_server::db::create_pool_with_options;
use sqlx::PgPool;

pub use migrate::run_migrate;
pub use seed::run_seed;
pub use serve::run_serve;
pub use verify::run_verify;

/// Connect using `--database-url` when given, the configured URL otherwise.
pub(crate) async fn connect(config: &NumtreeConfig, database_url: Option<String>) -> Result<PgPool> {
    let url = database_url.unwrap_or_else(|| config.database.url.clone());
    create_pool_with_options(&url, config.database.max_connections)
        .await
        .context("Failed to create database pool")
}
