//! Seed command: random users, root posts and reply chains

use anyhow::{bail, Context, Result};
use clap::Parser;
use numtree_core::{NumtreeConfig, OperationKind};
use numtree_server::auth::hash_password;
use numtree_server::db::{migrations, DbError, PostRepo, UserRepo};
use numtree_server::models::{Operand, Password, PostValue, Username};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

/// Password given to every seeded user
pub const SEED_PASSWORD: &str = "password123";

/// Chance that a post at a given level gets replies at all
const BRANCH_PROBABILITY: f64 = 0.7;

/// Arguments for the seed command
#[derive(Parser, Debug)]
pub struct SeedArgs {
    /// Number of users to create
    #[arg(long, default_value_t = 20)]
    pub users: u32,

    /// Number of root posts to create
    #[arg(long, default_value_t = 50)]
    pub roots: u32,

    /// Deepest reply chain below a root
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(2..))]
    pub max_depth: u32,

    /// RNG seed for a reproducible data set
    #[arg(long)]
    pub seed: Option<u64>,

    /// Delete all existing data first
    #[arg(long)]
    pub reset: bool,

    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Round to two decimal places.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn random_value(rng: &mut impl Rng) -> f64 {
    round2(rng.gen_range(1.0..=1000.0))
}

/// Operands stay in 1..=100, so division never sees zero.
fn random_operand(rng: &mut impl Rng) -> f64 {
    round2(rng.gen_range(1.0..=100.0))
}

fn random_kind(rng: &mut impl Rng) -> OperationKind {
    OperationKind::ALL[rng.gen_range(0..OperationKind::ALL.len())]
}

fn username_for(index: u32, rng: &mut impl Rng) -> String {
    format!("user{}_{:05}", index, rng.gen_range(0..100_000))
}

pub async fn run_seed(args: SeedArgs, config: NumtreeConfig) -> Result<()> {
    let pool = super::connect(&config, args.database_url.clone()).await?;
    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;

    if args.reset {
        migrations::reset(&pool)
            .await
            .context("Failed to reset database")?;
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let password = Password::new(SEED_PASSWORD)?;
    let hash = hash_password(&password)
        .await
        .context("Failed to hash seed password")?;

    let user_repo = UserRepo::new(&pool);
    let mut users: Vec<Uuid> = Vec::with_capacity(args.users as usize);
    for i in 0..args.users {
        let username = Username::new(&username_for(i, &mut rng))?;
        match user_repo.create(&username, &hash).await {
            Ok(user) => users.push(user.id),
            Err(DbError::Conflict { value, .. }) => {
                tracing::warn!(username = %value, "username taken, skipping");
            }
            Err(e) => return Err(e).context("Failed to create user"),
        }
    }
    tracing::info!(count = users.len(), "users created");

    if users.is_empty() {
        bail!("no users created, cannot seed posts");
    }

    let posts = PostRepo::new(&pool);
    for i in 0..args.roots {
        let author = users[rng.gen_range(0..users.len())];
        let root = posts
            .create_root(author, PostValue::new(random_value(&mut rng))?)
            .await
            .context("Failed to create root post")?;

        let max_depth = rng.gen_range(2..=args.max_depth);
        let replier = users[rng.gen_range(0..users.len())];

        let mut pending = vec![(root.id, 0u32)];
        while let Some((parent_id, depth)) = pending.pop() {
            if depth >= max_depth || !rng.gen_bool(BRANCH_PROBABILITY) {
                continue;
            }
            for _ in 0..rng.gen_range(1..=3) {
                let kind = random_kind(&mut rng);
                let operand = Operand::new(random_operand(&mut rng))?;
                match posts.create_reply(parent_id, replier, kind, operand).await {
                    Ok((reply, _)) => pending.push((reply.id, depth + 1)),
                    Err(DbError::Rejected(e)) => {
                        tracing::warn!(parent = %parent_id, op = %kind, "skipped reply: {}", e);
                    }
                    Err(e) => return Err(e).context("Failed to create reply"),
                }
            }
        }

        if (i + 1) % 10 == 0 {
            tracing::info!("Created {}/{} root posts with replies", i + 1, args.roots);
        }
    }

    let counts = posts.counts().await.context("Failed to count rows")?;
    println!("Seed completed:");
    println!("  - {} users created", users.len());
    println!("  - {} total posts", counts.posts);
    println!("  - {} operations", counts.operations);
    Ok(())
}
