//! Verify command: audit every stored derivation

use anyhow::{bail, Context, Result};
use clap::Parser;
use numtree_core::{audit_post, NumtreeConfig, Violation};
use numtree_server::db::{DerivationRow, PostRepo};
use uuid::Uuid;

/// Arguments for the verify command
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Posts whose stored value or structure breaks a derivation rule.
fn audit_rows(rows: &[DerivationRow]) -> Vec<(Uuid, Violation)> {
    rows.iter()
        .filter_map(|row| {
            audit_post(row.parent_value, row.operation, row.value)
                .err()
                .map(|v| (row.id, v))
        })
        .collect()
}

pub async fn run_verify(args: VerifyArgs, config: NumtreeConfig) -> Result<()> {
    let pool = super::connect(&config, args.database_url).await?;
    let repo = PostRepo::new(&pool);

    let rows = repo
        .derivations()
        .await
        .context("Failed to load derivations")?;
    let violations = audit_rows(&rows);

    for (id, violation) in &violations {
        tracing::warn!(post = %id, "{}", violation);
        println!("{}  {}", id, violation);
    }

    let counts = repo.counts().await.context("Failed to count rows")?;
    println!(
        "Checked {} posts ({} users, {} operations)",
        rows.len(),
        counts.users,
        counts.operations
    );

    if !violations.is_empty() {
        bail!("{} post(s) violate their derivation", violations.len());
    }
    println!("All derivations consistent");
    Ok(())
}
