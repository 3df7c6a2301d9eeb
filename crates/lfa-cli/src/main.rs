use clap::{Parser, Subcommand};
use lfa_cli::{AnnotationArgs, EngineArgs, RegionArgs};
use lfa_core::config::{install_config, load_config, log_config_usage};
use std::path::PathBuf;

mod commands;

use commands::{cmd_batch, cmd_classify, cmd_crop, cmd_init, cmd_labels, cmd_train};

#[derive(Parser)]
#[command(name = "lfa")]
#[command(version, about = "Lateral flow assay image analyzer", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (overrides the lfa.yml search)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a region of an image and save it
    Crop {
        /// Input image (png or tiff)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[command(flatten)]
        region: RegionArgs,

        /// Output file or directory
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Classify an image (or a region of it) and write a report
    Classify {
        /// Input image (png or tiff)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[command(flatten)]
        region: RegionArgs,

        #[command(flatten)]
        engine: EngineArgs,

        #[command(flatten)]
        annotations: AnnotationArgs,

        /// Report directory
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Skip writing the report
        #[arg(long)]
        no_report: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify many images and write an analysis log
    Batch {
        /// Input files or directories
        #[arg(value_name = "INPUTS")]
        inputs: Vec<PathBuf>,

        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,

        #[command(flatten)]
        engine: EngineArgs,

        #[command(flatten)]
        annotations: AnnotationArgs,

        /// Log directory
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Number of parallel threads
        #[arg(short = 'j', long, value_name = "N")]
        threads: Option<usize>,

        /// Only print the log path
        #[arg(short, long)]
        silent: bool,
    },

    /// List concentration labels and their derived counts
    Labels {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run simulated training over a dataset
    Train {
        /// Training files or directories (searched recursively)
        #[arg(value_name = "INPUTS")]
        inputs: Vec<PathBuf>,

        /// Progress per tick in percent
        #[arg(long, value_name = "FLOAT")]
        step: Option<f64>,

        /// Milliseconds between ticks
        #[arg(long, value_name = "MS")]
        cadence_ms: Option<u64>,

        /// Stop once progress reaches this percentage
        #[arg(long, value_name = "PERCENT")]
        stop_at: Option<f64>,
    },

    /// Write a default configuration file
    Init {
        /// Target path (defaults to ~/lfa/lfa.yml)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Some(path) = &cli.config {
        install_config(load_config(Some(path)));
    }
    log_config_usage();

    let result = match cli.command {
        Commands::Crop { input, region, out } => cmd_crop(input, region, out),

        Commands::Classify {
            input,
            region,
            engine,
            annotations,
            out,
            no_report,
            json,
        } => cmd_classify(input, region, engine, annotations, out, no_report, json),

        Commands::Batch {
            inputs,
            recursive,
            engine,
            annotations,
            out,
            threads,
            silent,
        } => cmd_batch(inputs, recursive, engine, annotations, out, threads, silent),

        Commands::Labels { json } => cmd_labels(json),

        Commands::Train {
            inputs,
            step,
            cadence_ms,
            stop_at,
        } => cmd_train(inputs, step, cadence_ms, stop_at),

        Commands::Init { path, force } => cmd_init(path, force),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
