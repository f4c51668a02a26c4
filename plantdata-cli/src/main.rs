// PlantData CLI - Conform wind-plant feeds from the command line
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # PlantData CLI
//!
//! Runs the conformance pipeline over a plant directory, or generates a
//! synthetic plant to run it on.
//!
//! ## Usage
//!
//! ```bash
//! # Generate two days of a four-turbine plant with the usual defects
//! plantdata-cli generate --out /tmp/plant --days 2 --seed 42
//!
//! # Conform it and export the cleaned streams
//! plantdata-cli conform --data /tmp/plant --export /tmp/plant-out
//!
//! # Extract data/la_haute_borne.zip on first use, write a JSON summary
//! plantdata-cli conform --data data/la_haute_borne --report summary.json
//! ```

mod conform;
mod generate;
mod summary;

use clap::{Args, Parser, Subcommand};
use plantdata::DatasetCache;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// PlantData command-line front end
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean, align and validate a plant's raw feeds
    Conform(ConformArgs),
    /// Write a synthetic plant with known defects
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
pub struct ConformArgs {
    /// Directory holding the raw CSV files
    #[arg(short, long)]
    pub data: PathBuf,

    /// Zip file, or directory of *.gz files, extracted into --data when it
    /// does not exist yet (defaults to <data>.zip)
    #[arg(short, long)]
    pub archive: Option<PathBuf>,

    /// Metadata contract (defaults to plant_meta.json inside --data)
    #[arg(long)]
    pub contract: Option<PathBuf>,

    /// Pipeline configuration JSON (defaults to the reference cleaning)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Export the conformed streams to this directory
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Write a JSON run summary to this file
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Keep asset-table rows no stream references
    #[arg(long)]
    pub keep_unreferenced: bool,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Output directory
    #[arg(short, long)]
    pub out: PathBuf,

    /// Number of turbines
    #[arg(short, long, default_value = "4")]
    pub turbines: usize,

    /// Days of 10-minute data
    #[arg(long, default_value = "2")]
    pub days: usize,

    /// Random seed
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Generate without injected defects
    #[arg(long)]
    pub clean: bool,
}

/// Everything that can stop a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Pipeline(#[from] plantdata::Error),

    #[error(transparent)]
    Load(#[from] plantdata::LoadError),

    #[error("generator: {0}")]
    Generate(#[from] plantdata_testdata::DatasetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    info!("plantdata v{}", plantdata::VERSION);

    let cache = DatasetCache::new();
    let result = match &cli.command {
        Command::Conform(args) => conform::run(args, &cache),
        Command::Generate(args) => generate::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
