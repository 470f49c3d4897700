//! covbench CLI binary.
//!
//! Runs Monte Carlo simulations and sample-size sweeps of the covariance
//! shrinkage estimators and prints or exports the results.

use clap::{Args, Parser, Subcommand, ValueEnum};
use covbench::prelude::*;
use covbench::sim::sweep_with_callback;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "covbench")]
#[command(about = "Monte Carlo benchmark of covariance shrinkage estimators", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the estimators at a single sample size
    Simulate {
        #[command(flatten)]
        process: ProcessArgs,

        #[command(flatten)]
        run: RunArgs,

        /// Sample size n
        #[arg(long, default_value = "20")]
        samples: usize,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: SimulateFormat,
    },

    /// Run the estimators over a list of sample sizes
    Sweep {
        #[command(flatten)]
        process: ProcessArgs,

        #[command(flatten)]
        run: RunArgs,

        /// Comma-separated sample sizes
        #[arg(long, value_delimiter = ',', default_value = "5,10,20,50,100,120")]
        sizes: Vec<usize>,

        /// Write the sweep table to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format (file format when --output is given)
        #[arg(long, value_enum, default_value = "text")]
        format: SweepFormat,
    },
}

#[derive(Args)]
struct ProcessArgs {
    /// Ground-truth process family
    #[arg(long, value_enum, default_value = "ar1")]
    process: ProcessKind,

    /// AR(1) coefficient
    #[arg(long, default_value_t = covbench::sim::process::DEFAULT_RHO, allow_hyphen_values = true)]
    rho: f64,

    /// FBM Hurst exponent
    #[arg(long, default_value_t = covbench::sim::process::DEFAULT_HURST)]
    hurst: f64,
}

impl ProcessArgs {
    const fn to_config(&self) -> ProcessConfig {
        match self.process {
            ProcessKind::Ar1 => ProcessConfig::ar1(self.rho),
            ProcessKind::Fbm => ProcessConfig::fbm(self.hurst),
        }
    }
}

#[derive(Args)]
struct RunArgs {
    /// Number of variables p
    #[arg(long, default_value = "100")]
    dimension: usize,

    /// Monte Carlo trials per sample size
    #[arg(long, default_value = "100")]
    trials: usize,

    /// Base random seed
    #[arg(long, default_value = "2024")]
    seed: u64,

    /// Run trials on a single thread
    #[arg(long)]
    sequential: bool,

    /// DOASD / dual diagonal intensity
    #[arg(long, default_value = "0.4")]
    diagonal: f64,

    /// DOASD / dual off-diagonal intensity
    #[arg(long, default_value = "0.3")]
    off_diagonal: f64,

    /// Schafer-Strimmer intensity
    #[arg(long, default_value = "0.4")]
    schafer_strimmer: f64,
}

impl RunArgs {
    const fn to_config(&self) -> SimulationConfig {
        SimulationConfig {
            dimension: self.dimension,
            trial_count: self.trials,
            seed: self.seed,
            parallel: !self.sequential,
            shrinkage: ShrinkageConfig {
                diagonal: self.diagonal,
                off_diagonal: self.off_diagonal,
                schafer_strimmer: self.schafer_strimmer,
            },
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ProcessKind {
    Ar1,
    Fbm,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SimulateFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SweepFormat {
    Text,
    Markdown,
    Csv,
    Json,
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Log to stderr, filtered by `COVBENCH_LOG` (default: warnings only).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("COVBENCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            process: process_args,
            run: run_args,
            samples,
            format,
        } => {
            simulate(
                &process_args.to_config(),
                &run_args.to_config(),
                samples,
                format,
            )?;
        }
        Commands::Sweep {
            process: process_args,
            run: run_args,
            sizes,
            output,
            format,
        } => {
            run_sweep(
                &process_args.to_config(),
                &run_args.to_config(),
                &sizes,
                output.as_deref(),
                format,
            )?;
        }
    }

    Ok(())
}

fn simulate(
    process: &ProcessConfig,
    config: &SimulationConfig,
    samples: usize,
    format: SimulateFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!(
        "Running {} trials of {process} (p = {}, n = {samples})...",
        config.trial_count, config.dimension
    ));

    let result = match run_simulation(process, config, samples) {
        Ok(result) => {
            spinner.finish_and_clear();
            result
        }
        Err(e) => {
            spinner.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    let table = AggregateTable::from_result(process, config.dimension, samples, &result);

    match format {
        SimulateFormat::Text => {
            print!("{}", table.to_ascii_table());
            if let Some((best, metrics)) = result.best() {
                println!("\nBest estimator: {best} (MSE {:.4})", metrics.mse);
            }
        }
        SimulateFormat::Json => {
            let output = json!({
                "process": process,
                "config": config,
                "sample_size": samples,
                "results": table,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn run_sweep(
    process: &ProcessConfig,
    config: &SimulationConfig,
    sizes: &[usize],
    output: Option<&Path>,
    format: SweepFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(sizes.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Sweeping {process} (p = {})...", config.dimension));

    let result = sweep_with_callback(process, config, sizes, |n, _| {
        pb.set_message(format!("n = {n} done"));
        pb.inc(1);
    });
    let result = match result {
        Ok(result) => {
            pb.finish_with_message(format!("Swept {} sample sizes", sizes.len()));
            result
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    let table = SweepTable::from_sweep(&result);

    if let Some(path) = output {
        let export_format = match format {
            SweepFormat::Csv => ExportFormat::Csv,
            SweepFormat::Json => ExportFormat::PrettyJson,
            SweepFormat::Text | SweepFormat::Markdown => ExportFormat::from_path(path)?,
        };
        table.export_to_file(path, export_format)?;
        info!(path = %path.display(), "Wrote sweep table");
        println!("Wrote {}", path.display());
        print!("{}", table.to_ascii_table());
        return Ok(());
    }

    match format {
        SweepFormat::Text => print!("{}", table.to_ascii_table()),
        SweepFormat::Markdown => print!("{}", table.to_markdown()),
        SweepFormat::Csv => print!("{}", table.export_to_string(ExportFormat::Csv)?),
        SweepFormat::Json => println!("{}", table.export_to_string(ExportFormat::PrettyJson)?),
    }

    Ok(())
}
