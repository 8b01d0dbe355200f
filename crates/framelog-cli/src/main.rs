//! `framelog` command-line interface.
//!
//! Runs the capture (building) and analysis (querying) phases against a
//! data log / index snapshot pair.
//!
//! # Usage
//!
//! ```bash
//! # Write the demonstration log and its index
//! framelog capture
//!
//! # Report keys 1 and 5000, 20 random keys, and the boundary probes
//! framelog analyze 1 5000 --samples 20
//!
//! # Both phases, reproducible sampling
//! framelog run --seed 12345
//! ```

mod sample;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use framelog::{Analysis, FramelogConfig, KeyReport, RecordKey, boundary_keys, capture_demo};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing_subscriber::EnvFilter;

use crate::sample::sample_keys;

/// Capture and analyze indexed record logs.
#[derive(Parser)]
#[command(name = "framelog")]
#[command(about = "Capture and analyze indexed record logs", long_about = None)]
struct Cli {
    /// JSON configuration file. Flags override its values.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data log path.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Index snapshot path.
    #[arg(long, global = true)]
    index: Option<PathBuf>,

    /// Number of value-change records to capture.
    #[arg(long, global = true)]
    records: Option<u32>,

    /// Sync the data log after every append.
    #[arg(long, global = true)]
    fsync: bool,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the demonstration log and its index snapshot.
    Capture,

    /// Load the index snapshot and report records.
    Analyze(AnalyzeArgs),

    /// Capture, then analyze.
    Run(AnalyzeArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Keys to report before the random samples.
    #[arg(allow_negative_numbers = true)]
    keys: Vec<i32>,

    /// Number of random keys to report (defaults to the configured count).
    #[arg(short, long)]
    samples: Option<usize>,

    /// Seed for reproducible sampling.
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the probes just outside the captured key range.
    #[arg(long)]
    no_boundary: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = build_config(&cli)?;

    match &cli.command {
        Commands::Capture => capture(&config),
        Commands::Analyze(args) => analyze(&config, args),
        Commands::Run(args) => {
            capture(&config)?;
            analyze(&config, args)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> Result<FramelogConfig> {
    let mut config = match &cli.config {
        Some(path) => FramelogConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => FramelogConfig::default(),
    };

    if let Some(data) = &cli.data {
        config.data_path = data.clone();
    }
    if let Some(index) = &cli.index {
        config.index_path = index.clone();
    }
    if let Some(records) = cli.records {
        config.record_count = records;
    }
    if cli.fsync {
        config.fsync = true;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn capture(config: &FramelogConfig) -> Result<()> {
    let summary = capture_demo(config)
        .with_context(|| format!("Capture into {} failed", config.data_path.display()))?;

    println!(
        "Captured {} records ({} bytes), index {} bytes",
        summary.entries, summary.log_bytes, summary.index_bytes
    );
    Ok(())
}

fn analyze(config: &FramelogConfig, args: &AnalyzeArgs) -> Result<()> {
    let mut analysis = Analysis::open(config).with_context(|| {
        format!(
            "Failed to open {} / {}",
            config.data_path.display(),
            config.index_path.display()
        )
    })?;

    let mut keys: Vec<RecordKey> = args.keys.iter().copied().map(RecordKey::new).collect();

    let samples = args.samples.unwrap_or(config.sample_count);
    if let (Some(first), Some(last)) = (analysis.index().first_key(), analysis.index().last_key())
    {
        let mut rng = match args.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        keys.extend(sample_keys(&mut rng, first, last, samples));
    }

    if !args.no_boundary {
        keys.extend(boundary_keys(analysis.index()));
    }

    let reports = analysis.report(keys).context("Analysis failed")?;

    for report in &reports {
        println!("{report}");
    }

    let failed = reports
        .iter()
        .filter(|r| matches!(r, KeyReport::Failed { .. }))
        .count();
    tracing::info!(reported = reports.len(), failed, "analysis finished");
    Ok(())
}
