//! Sib Store CLI - database and catalog management.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! sib-cli migrate
//!
//! # Seed categories, models, colors, storage options and prices
//! sib-cli seed crates/cli/seed/catalog.yaml
//!
//! # Import a price spreadsheet exported as CSV
//! sib-cli import-prices prices.csv
//!
//! # Hash the admin password for ADMIN_PASSWORD_HASH
//! sib-cli hash-password < password.txt
//! ```
//!
//! The database comes from `--database-url`, `STORE_DATABASE_URL` or
//! `DATABASE_URL`, in that order.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sib-cli")]
#[command(author, version, about = "Sib Store CLI tools")]
struct Cli {
    /// Database URL (overrides `STORE_DATABASE_URL`)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog from a YAML file
    Seed {
        /// Path to the seed file
        file: PathBuf,
    },
    /// Import prices from a CSV file
    ImportPrices {
        /// Path to the CSV file
        file: PathBuf,
    },
    /// Hash an admin password (read from stdin unless given)
    HashPassword {
        /// Password to hash; prefer stdin so it stays out of shell history
        #[arg(long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = commands::database_url(cli.database_url);

    match cli.command {
        Commands::Migrate => {
            commands::migrate::run(&database_url).await?;
        }
        Commands::Seed { file } => {
            let pool = commands::connect(&database_url).await?;
            commands::seed::catalog_from_file(&pool, &file).await?;
        }
        Commands::ImportPrices { file } => {
            let pool = commands::connect(&database_url).await?;
            commands::import::prices_from_file(&pool, &file).await?;
        }
        Commands::HashPassword { password } => {
            let hash = commands::password::hash(password, std::io::stdin().lock())?;
            #[allow(clippy::print_stdout)]
            {
                println!("{hash}");
            }
        }
    }
    Ok(())
}
