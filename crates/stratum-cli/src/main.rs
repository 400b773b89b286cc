#![allow(clippy::doc_markdown)]
//! `Stratum` CLI - inspect table files and catalogs
//!
//! Usage:
//!   `stratum header ./data/orders_0.bin`
//!   `stratum tables ./data`
//!   `stratum dump ./data orders --limit 20`
//!   `stratum verify ./data orders`

mod inspect;
mod output;


use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use output::Format;
use stratum_core::storage::read_file_header;
use stratum_core::{LoggingConfig, StratumConfig};

#[derive(Parser)]
#[command(name = "stratum")]
#[command(author, version, about = "Stratum CLI - inspect columnar table files")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults, then this file, then STRATUM_* variables)
    #[arg(short, long, global = true, env = "STRATUM_CONFIG", default_value = "stratum.toml")]
    config: PathBuf,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header of a table file
    Header {
        /// Path to a `<table>_<n>.bin` file
        file: PathBuf,
    },

    /// List the tables recorded in the catalog
    Tables {
        /// Data directory (defaults to `storage.data_dir`)
        path: Option<PathBuf>,
    },

    /// Print decoded rows of a table
    Dump {
        /// Data directory
        path: PathBuf,

        /// Table name
        table: String,

        /// Only rows of this chunk id
        #[arg(long)]
        chunk: Option<u32>,

        /// Maximum number of rows
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Map every chunk of a table and check it
    Verify {
        /// Data directory
        path: PathBuf,

        /// Table name
        table: String,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let json = logging.format == "json";
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn load_config(path: &Path) -> Result<StratumConfig> {
    let config = StratumConfig::load_from_path(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_tracing(&config.logging);
    let catalog_file = config.storage.catalog_file.as_str();

    match cli.command {
        Commands::Header { file } => {
            let header = read_file_header(&file)
                .with_context(|| format!("Failed to read header of {}", file.display()))?;
            println!("{}", output::render_file_header(&file, &header, cli.format));
        }
        Commands::Tables { path } => {
            let data_dir = path.unwrap_or_else(|| config.storage.data_dir.clone());
            let catalog = inspect::load_catalog(&data_dir, catalog_file)?;
            println!("{}", output::render_tables(&catalog, cli.format));
        }
        Commands::Dump {
            path,
            table,
            chunk,
            limit,
        } => {
            let catalog = inspect::load_catalog(&path, catalog_file)?;
            let entry = inspect::table_entry(&catalog, &table)?;
            let chunks = inspect::table_chunks(&path, &table, entry)?;
            let rows = inspect::dump_rows(&chunks, chunk, limit)?;
            println!("{}", output::render_rows(&entry.columns, &rows, cli.format));
        }
        Commands::Verify { path, table } => {
            let catalog = inspect::load_catalog(&path, catalog_file)?;
            let entry = inspect::table_entry(&catalog, &table)?;
            let report = inspect::verify_table(&path, &table, entry);
            println!("{}", output::render_verify(&table, &report, cli.format));
            if !report.is_ok() {
                anyhow::bail!("Table '{table}' failed verification");
            }
        }
    }

    Ok(())
}
