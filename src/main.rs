//! CASAS Event Log CLI
//!
//! Builds process-mining event logs from smart-home sensor dumps.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use casas_eventlog::{
    config::Config,
    core::{ActivityPolicy, CaseStrategy, HourRange},
    pipeline::{Pipeline, PipelineOutput},
    report::{render_profile, render_statistics},
    VERSION,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "casas-eventlog")]
#[command(version = VERSION)]
#[command(about = "Build process-mining event logs from smart-home sensor data", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the event log and export it with statistics and a run summary
    Build {
        #[command(flatten)]
        run: RunArgs,

        /// Output directory (defaults to the configured output directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Build the event log and print the analysis report
    Stats {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Show configuration
    Config {
        /// Write the default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Sensor file with date, time, sensor id and value per line
    input: PathBuf,

    /// Configuration file (defaults to the user config file, if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only read this many lines
    #[arg(long)]
    sample_size: Option<usize>,

    /// Case strategy (daily or session)
    #[arg(long)]
    case_strategy: Option<String>,

    /// Activity labeling policy (default or binary)
    #[arg(long)]
    activity_policy: Option<String>,

    /// Keep rapid-fire repeats of the same sensor
    #[arg(long)]
    keep_duplicates: bool,

    /// Minimum seconds between kept firings of one sensor
    #[arg(long, allow_negative_numbers = true)]
    time_threshold: Option<f64>,

    /// Idle seconds that start a new session
    #[arg(long, allow_negative_numbers = true)]
    session_gap: Option<f64>,

    /// Only keep sensors whose id contains this text (case-insensitive)
    #[arg(long)]
    sensor: Option<String>,

    /// Only keep events in this inclusive hour window, e.g. 8-20
    #[arg(long)]
    hours: Option<String>,

    /// Number of entries listed per report table
    #[arg(long)]
    top: Option<usize>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Build { run, output } => cmd_build(&run, output),
        Commands::Stats { run } => cmd_stats(&run),
        Commands::Config { init } => cmd_config(init),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
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

/// Merge the config file with command-line overrides.
fn resolve_config(args: &RunArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("could not load config from {path:?}"))?,
        None => Config::load().context("could not load config")?,
    };

    if let Some(n) = args.sample_size {
        config.sample_size = Some(n);
    }
    if let Some(name) = &args.case_strategy {
        config.case_strategy = name.parse::<CaseStrategy>()?;
    }
    if let Some(name) = &args.activity_policy {
        config.activity_policy = name.parse::<ActivityPolicy>()?;
    }
    if args.keep_duplicates {
        config.remove_duplicates = false;
    }
    if let Some(secs) = args.time_threshold {
        config.time_threshold_seconds = secs;
    }
    if let Some(secs) = args.session_gap {
        config.session_gap_seconds = secs;
    }
    if let Some(sensor) = &args.sensor {
        config.filters.sensor_contains = Some(sensor.clone());
    }
    if let Some(text) = &args.hours {
        match HourRange::parse(text) {
            Some(range) => config.filters.hour_range = Some(range),
            None => bail!("invalid hour window '{text}' (expected e.g. 8-20)"),
        }
    }
    if let Some(n) = args.top {
        config.top_n = n;
    }

    Ok(config)
}

fn run_pipeline(input: &Path, config: Config) -> anyhow::Result<PipelineOutput> {
    println!("CASAS Event Log v{VERSION}");
    println!();
    println!("Configuration:");
    println!("  - File: {input:?}");
    match config.sample_size {
        Some(n) => println!("  - Sample size: {n}"),
        None => println!("  - Sample size: Full dataset"),
    }
    println!("  - Case strategy: {}", config.case_strategy);
    println!("  - Activity policy: {}", config.activity_policy);
    println!("  - Remove duplicates: {}", config.remove_duplicates);
    println!("  - Time threshold: {}s", config.time_threshold_seconds);
    if config.case_strategy == CaseStrategy::Session {
        println!("  - Session gap: {}s", config.session_gap_seconds);
    }

    let pipeline = Pipeline::new(config)?;
    let output = pipeline
        .run_path(input)
        .with_context(|| format!("could not process {input:?}"))?;
    Ok(output)
}

fn cmd_build(args: &RunArgs, output: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = resolve_config(args)?;
    if let Some(dir) = output {
        config.output_dir = dir;
    }
    config
        .ensure_directories()
        .with_context(|| format!("could not create output directory {:?}", config.output_dir))?;
    let out_dir = config.output_dir.clone();
    let result = run_pipeline(&args.input, config)?;

    let stamp = Utc::now().format("%Y%m%d_%H%M%S");

    let log_path = out_dir.join(format!("event_log_{stamp}.csv"));
    result.log.export_csv(&log_path)?;

    let stats_path = out_dir.join(format!("statistics_{stamp}.json"));
    write_json(&stats_path, &result.statistics)?;

    let summary_path = out_dir.join(format!("summary_{stamp}.json"));
    result
        .summary
        .save(&summary_path)
        .with_context(|| format!("could not write {summary_path:?}"))?;

    println!();
    println!("{}", result.summary.summary());
    println!();
    println!("Generated Files:");
    println!("  1. {} - event log (case_id, activity, timestamp)", log_path.display());
    println!("  2. {} - statistics", stats_path.display());
    println!("  3. {} - run summary", summary_path.display());

    Ok(())
}

fn cmd_stats(args: &RunArgs) -> anyhow::Result<()> {
    let config = resolve_config(args)?;
    let top_n = config.top_n;
    let result = run_pipeline(&args.input, config)?;

    print!("{}", render_profile(&result.profile));
    print!("{}", render_statistics(&result.statistics, top_n));
    println!();
    println!("{}", result.summary.summary());

    for sample in &result.summary.drop_samples {
        println!("  [{}] {}", sample.reason, sample.message);
    }

    Ok(())
}

fn cmd_config(init: bool) -> anyhow::Result<()> {
    let path = Config::config_path();
    if init && !path.exists() {
        Config::default().save()?;
        println!("Wrote default configuration to {path:?}");
    }

    let config = Config::load()?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {path:?}");
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("could not write {path:?}"))?;
    Ok(())
}
