//! HTTP server command

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use numtree_core::NumtreeConfig;
use numtree_server::db::migrations;
use numtree_server::http::{run_server, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default from config: 127.0.0.1:8080)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Directory with the built client (served for non-API paths)
    #[arg(long, value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Do not run migrations before serving
    #[arg(long)]
    pub skip_migrations: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, config: NumtreeConfig) -> Result<()> {
    let pool = super::connect(&config, args.database_url).await?;

    if !args.skip_migrations {
        migrations::run(&pool)
            .await
            .context("Failed to run migrations")?;
    }

    let mut server_config = ServerConfig::from_config(&config);
    if let Some(bind) = args.bind {
        server_config.bind_addr = bind;
    }
    if let Some(dir) = args.static_dir {
        server_config.static_dir = Some(dir);
    }
    server_config.cors_permissive |= args.cors_permissive;

    if let Some(dir) = &server_config.static_dir {
        if !dir.join("index.html").is_file() {
            tracing::warn!(dir = %dir.display(), "static dir has no index.html");
        }
    }

    tracing::info!("Starting numtree server on {}", server_config.bind_addr);

    // Run server (blocks until shutdown)
    run_server(pool, server_config)
        .await
        .context("Server error")?;

    Ok(())
}
