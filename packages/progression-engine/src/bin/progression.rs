//! Progression operator CLI
//!
//! # Usage
//!
//! ```bash
//! # Publish a tier table
//! progression --config progression.yaml upload-tiers tiers.json
//!
//! # Create records and grant experience
//! progression create --user 20 --guild 10
//! progression create --user 20
//! progression grant --user 20 --guild 10 --amount 250
//!
//! # Inspect
//! progression profile --user 20 --guild 10
//! progression top --guild 10 --limit 5
//! ```

use clap::{Parser, Subcommand};
use progression_engine::{
    EngineConfig, ProgressionEngine, ProgressionError, SqliteProgressionStore, TierTable,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "progression")]
#[command(about = "Progression engine - experience records and tier tables", long_about = None)]
struct Cli {
    /// YAML engine configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and publish a JSON tier table
    UploadTiers {
        /// Tier table document
        file: PathBuf,
    },

    /// Create a zeroed record
    Create {
        #[arg(short, long)]
        user: u64,

        /// Guild scope (global record when omitted)
        #[arg(short, long)]
        guild: Option<u64>,
    },

    /// Add (or remove, with a negative amount) experience
    Grant {
        #[arg(short, long)]
        user: u64,

        #[arg(short, long)]
        guild: Option<u64>,

        #[arg(short, long, allow_negative_numbers = true)]
        amount: i64,

        /// Count as artificial experience (guild only)
        #[arg(long)]
        artificial: bool,
    },

    /// Print a profile as JSON
    Profile {
        #[arg(short, long)]
        user: u64,

        #[arg(short, long)]
        guild: Option<u64>,
    },

    /// Print a leaderboard as JSON
    Top {
        #[arg(short, long)]
        guild: Option<u64>,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    }
    .with_env_overrides()?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = match &config.database_path {
        Some(path) => SqliteProgressionStore::new(path)?,
        None => SqliteProgressionStore::in_memory()?,
    };
    let engine = ProgressionEngine::with_config(store, &config);

    match cli.command {
        Commands::UploadTiers { file } => {
            let document = std::fs::read_to_string(&file)?;
            let table = TierTable::from_json(&document)?;
            let changes = engine.publish_tier_table(&table).await?;
            print_json(&changes)?;
        }
        Commands::Create { user, guild } => {
            match guild {
                Some(guild) => engine.create_guild_record(guild, user).await?,
                None => engine.create_global_record(user).await?,
            };
            println!("created");
        }
        Commands::Grant {
            user,
            guild,
            amount,
            artificial,
        } => {
            let applied = engine.add_experience(user, guild, amount, artificial).await?;
            println!("{}", if applied { "applied" } else { "partially applied" });
        }
        Commands::Profile { user, guild } => match guild {
            Some(guild) => print_json(&engine.fetch_guild_profile(guild, user).await?)?,
            None => print_json(&engine.fetch_global_profile(user).await?)?,
        },
        Commands::Top { guild, limit } => match guild {
            Some(guild) => print_json(&engine.guild_leaderboard(guild, limit).await?)?,
            None => print_json(&engine.global_leaderboard(limit).await?)?,
        },
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ProgressionError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
