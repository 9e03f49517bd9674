//! Command-line tool for short key allocation.
//!
//! # Usage
//!
//! ```bash
//! # Allocate a key and store a redirect
//! reurl register https://example.com/some/long/path
//!
//! # Show the key the next registration would get
//! reurl peek
//!
//! # Look up or free a key
//! reurl resolve 1A
//! reurl release 1A
//!
//! # Keyspace occupancy
//! reurl stats --json
//!
//! # Codec helpers (no database needed)
//! reurl encode 62
//! reurl decode 10
//! ```
//!
//! # Environment Variables
//!
//! See [`reurl::config`]. A `.env` file in the working directory is loaded first.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

use reurl::application::services::{KeyService, KeyServiceOptions};
use reurl::config::{self, Config};
use reurl::domain::keyspace::{Keyspace, codec};
use reurl::infrastructure::database;
use reurl::infrastructure::persistence::PgRedirectRepository;
use reurl::telemetry;

type PgKeyService = KeyService<PgRedirectRepository>;

/// Short key allocation over a bounded base62 keyspace.
#[derive(Parser)]
#[command(name = "reurl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate a short key and store a redirect to TARGET
    Register {
        target: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show the key the next registration would receive
    Peek,

    /// Show the redirect stored under KEY
    Resolve { key: String },

    /// Delete the redirect stored under KEY, freeing the key
    Release {
        key: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show keyspace occupancy
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encode a keyspace position as base62
    Encode { position: u64 },

    /// Decode a base62 key into its keyspace position
    Decode { key: String },

    /// Apply database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { position } => println!("{}", codec::encode(position)),
        Commands::Decode { key } => {
            let position = codec::decode(&key).with_context(|| format!("Cannot decode {key:?}"))?;
            println!("{position}");
        }
        Commands::Migrate => {
            let (_, pool) = open_database().await?;
            database::migrate(&pool).await?;
            println!("{}", "✅ Migrations applied".green().bold());
        }
        Commands::Register { target, yes } => register(&open_service().await?, target, yes).await?,
        Commands::Peek => peek(&open_service().await?).await?,
        Commands::Resolve { key } => resolve(&open_service().await?, &key).await?,
        Commands::Release { key, yes } => release(&open_service().await?, &key, yes).await?,
        Commands::Stats { json } => stats(&open_service().await?, json).await?,
    }

    Ok(())
}

/// Loads configuration, installs logging, and connects to the database.
async fn open_database() -> Result<(Config, PgPool)> {
    let config = config::load_from_env()?;
    telemetry::init_tracing(&config.log_level, &config.log_format);
    config.print_summary();

    let pool = database::connect(&config).await?;
    Ok((config, pool))
}

async fn open_service() -> Result<PgKeyService> {
    let (config, pool) = open_database().await?;

    let keyspace = Keyspace::new(config.key_max_length).context("Invalid KEY_MAX_LENGTH")?;
    let repository = Arc::new(PgRedirectRepository::new(Arc::new(pool)));

    Ok(KeyService::new(
        repository,
        keyspace,
        KeyServiceOptions::from(&config),
    ))
}

/// Allocates a key for `target` after showing the candidate key.
///
/// The candidate may change between the preview and the insert if another
/// writer is active; the stored key is printed at the end.
async fn register(service: &PgKeyService, target: String, skip_confirm: bool) -> Result<()> {
    println!("{}", "🔗 Register Redirect".bright_blue().bold());
    println!();

    if !skip_confirm {
        let candidate = service.allocate().await?;

        println!("  Target: {}", target.cyan());
        println!("  Key:    {}", candidate.as_str().bright_yellow().bold());
        println!();

        let confirmed = Confirm::new()
            .with_prompt("Store this redirect?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let redirect = service
        .register(&target)
        .await
        .context("Failed to register redirect")?;

    println!();
    println!("{}", "✅ Redirect stored".green().bold());
    println!("  Key:    {}", redirect.key.bright_yellow().bold());
    println!("  Target: {}", redirect.target.cyan());
    println!();

    Ok(())
}

async fn peek(service: &PgKeyService) -> Result<()> {
    let key = service.allocate().await?;
    println!("{}", key.as_str().bright_yellow().bold());
    Ok(())
}

async fn resolve(service: &PgKeyService, key: &str) -> Result<()> {
    let redirect = service.resolve(key).await?;

    println!("  Key:     {}", redirect.key.bright_yellow().bold());
    println!("  Target:  {}", redirect.target.cyan());
    println!(
        "  Created: {}",
        redirect
            .created_at
            .format("%Y-%m-%d %H:%M")
            .to_string()
            .bright_black()
    );

    Ok(())
}

/// Deletes a redirect. Confirmation defaults to No.
async fn release(service: &PgKeyService, key: &str, skip_confirm: bool) -> Result<()> {
    println!("{}", "🗑  Release Short Key".bright_blue().bold());
    println!();

    let redirect = service.resolve(key).await?;
    println!("  Key:    {}", redirect.key.bright_yellow());
    println!("  Target: {}", redirect.target.cyan());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this redirect?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    service.release(key).await?;

    println!("{}", "✅ Key released".green().bold());
    println!();

    Ok(())
}

async fn stats(service: &PgKeyService, json: bool) -> Result<()> {
    let stats = service.stats().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "📊 Keyspace".bright_blue().bold());
    println!();
    println!(
        "  Max key length:   {}",
        stats.max_key_len.to_string().bright_white()
    );
    println!(
        "  Capacity:         {}",
        stats.capacity.to_string().bright_white()
    );
    println!(
        "  Occupied:         {}",
        stats.occupied.to_string().bright_green().bold()
    );
    println!(
        "  Free:             {}",
        stats.free.to_string().bright_green().bold()
    );
    println!("  Fill ratio:       {:.4}%", stats.fill_ratio * 100.0);

    if stats.integrity_faults > 0 {
        println!(
            "  Malformed keys:   {}",
            stats.integrity_faults.to_string().red().bold()
        );
    }

    match stats.next_key {
        Some(key) => println!("  Next key:         {}", key.bright_yellow().bold()),
        None => println!("  Next key:         {}", "exhausted".red().bold()),
    }
    println!();

    Ok(())
}
