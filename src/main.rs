//! Caltech dataset CLI
//!
//! Inspect a Caltech-101 split, verify that every image decodes, and compute
//! reproducible stratified splits.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use caltech_dataset::dataset::NUM_CLASSES;
use caltech_dataset::utils::format_duration;
use caltech_dataset::utils::logging::{init_logging, LogConfig, LogLevel};
use caltech_dataset::{CaltechConfig, CaltechDataset, LoadStrategy};

/// Caltech-101 dataset tooling
#[derive(Parser, Debug)]
#[command(name = "caltech")]
#[command(version)]
#[command(about = "Load and split Caltech-101 style datasets", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Log level when not verbose (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct DatasetArgs {
    /// Image root directory (manifest paths are relative to it)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Split name; reads `<split>.txt`
    #[arg(short, long, default_value = "train")]
    split: String,

    /// Directory holding the manifest (default: parent of root)
    #[arg(long)]
    manifest_dir: Option<PathBuf>,

    /// TOML config file; replaces root/split/manifest-dir
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl DatasetArgs {
    fn to_config(&self) -> Result<CaltechConfig> {
        if let Some(path) = &self.config {
            return Ok(CaltechConfig::from_toml_file(path)?);
        }

        let root = self
            .root
            .clone()
            .context("either --root or --config is required")?;
        let mut config = CaltechConfig::new(root, self.split.clone());
        if let Some(dir) = &self.manifest_dir {
            config = config.with_manifest_dir(dir);
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print per-class sample counts (no image decoding)
    Stats {
        #[command(flatten)]
        dataset: DatasetArgs,
    },

    /// Compute a stratified split and write it as JSON
    Split {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Fraction of every class placed in the first split (0.0-1.0)
        #[arg(short, long, default_value = "0.5")]
        percentage: f64,

        /// Output JSON file
        #[arg(short, long, default_value = "split.json")]
        output: PathBuf,
    },

    /// Decode every image of the split
    Check {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Number of loader threads
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig {
            level: LogLevel::parse(&cli.log_level),
            ..LogConfig::default()
        }
    };
    init_logging(&log_config).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Stats { dataset } => cmd_stats(&dataset),
        Commands::Split {
            dataset,
            percentage,
            output,
        } => cmd_split(&dataset, percentage, &output),
        Commands::Check { dataset, workers } => cmd_check(&dataset, workers),
    }
}

fn open_lazy(args: &DatasetArgs) -> Result<CaltechDataset> {
    let config = args.to_config()?.with_load_strategy(LoadStrategy::Lazy);
    let split = config.split.clone();
    CaltechDataset::new(config).with_context(|| format!("Failed to open split '{}'", split))
}

fn cmd_stats(args: &DatasetArgs) -> Result<()> {
    let dataset = open_lazy(args)?;
    let stats = dataset.stats();

    println!("\n{}", "Caltech dataset".green().bold());
    print!("{}", stats);

    if stats.num_classes != NUM_CLASSES {
        println!(
            "{}",
            format!(
                "  note: {} classes found, full Caltech-101 has {}",
                stats.num_classes, NUM_CLASSES
            )
            .yellow()
        );
    }

    Ok(())
}

fn cmd_split(args: &DatasetArgs, percentage: f64, output: &Path) -> Result<()> {
    let dataset = open_lazy(args)?;
    let split = dataset.stratified_subsets(percentage)?;

    split
        .save(output)
        .with_context(|| format!("Failed to write {:?}", output))?;
    info!("Wrote split to {:?}", output);

    println!("\n{}", "Stratified split".green().bold());
    print!("{}", split.stats(&dataset.labels()));
    println!("  Saved to: {}", output.display().to_string().cyan());

    Ok(())
}

fn cmd_check(args: &DatasetArgs, workers: Option<usize>) -> Result<()> {
    let mut config = args
        .to_config()?
        .with_load_strategy(LoadStrategy::Eager)
        .with_progress(true);
    if let Some(workers) = workers {
        config = config.with_workers(workers);
    }

    let start = Instant::now();
    let dataset = CaltechDataset::new(config).context("Dataset check failed")?;

    println!(
        "{} {} images in {} classes decoded in {}",
        "OK".green().bold(),
        dataset.len(),
        dataset.num_classes(),
        format_duration(start.elapsed().as_secs_f64())
    );

    Ok(())
}
