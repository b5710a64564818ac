use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use deckeval_client::{Capability, HttpClientConfig, HttpModelClient};
use deckeval_core::{ScoreConfig, SessionRegistry};

mod config;
mod dataset;
mod paths;
mod prompt;
mod runner;

use config::Config;

#[derive(Parser)]
#[command(name = "deckeval", about = "Grade model answers to single-choice solitaire puzzles")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a dataset against a model API and grade the answers
    Run(RunArgs),
    /// Normalize a raw dataset into evaluation records on disk
    Prepare(PrepareArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Raw dataset file (.json or .jsonl)
    #[arg(long)]
    data: PathBuf,

    /// Output file for per-case outcomes (.jsonl); summary written alongside
    #[arg(long)]
    output: PathBuf,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the chat-completions endpoint
    #[arg(long)]
    api_url: Option<String>,

    /// Override the model name
    #[arg(long)]
    model: Option<String>,

    /// Override the concurrency ceiling
    #[arg(long)]
    max_concurrent: Option<usize>,
}

#[derive(clap::Args)]
struct PrepareArgs {
    /// Raw dataset file (.json or .jsonl)
    #[arg(long)]
    data: PathBuf,

    /// Output file for normalized evaluation records (.jsonl)
    #[arg(long)]
    output: PathBuf,

    /// Keep only records whose data_id contains this substring
    #[arg(long)]
    filter: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Prepare(args) => prepare(args),
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(url) = args.api_url {
        config.api.url = url;
    }
    if let Some(model) = args.model {
        config.api.model = model;
    }
    if let Some(n) = args.max_concurrent {
        config.run.max_concurrent = n;
    }
    anyhow::ensure!(!config.api.url.is_empty(), "no API url configured (--api-url or config file)");
    anyhow::ensure!(!config.api.model.is_empty(), "no model configured (--model or config file)");

    let api_key = std::env::var(&config.api.key_env)
        .with_context(|| format!("API key env var {} not set", config.api.key_env))?;

    let capability = if config.api.multimodal {
        Capability::Multimodal
    } else {
        Capability::TextOnly
    };
    let client = HttpModelClient::new(HttpClientConfig {
        api_url: config.api.url.clone(),
        api_key,
        model: config.api.model.clone(),
        capability,
        timeout: Duration::from_secs(config.api.timeout_secs),
        max_attempts: config.api.max_attempts,
    })?;

    let registry = SessionRegistry::new(ScoreConfig {
        format_weight: config.scoring.format_weight,
        enforce_format: config.scoring.enforce_format,
    });

    let cases = dataset::load_cases(&args.data, config.run.dataset_filter.as_deref())?;
    anyhow::ensure!(!cases.is_empty(), "dataset contains no usable cases");
    tracing::info!(cases = cases.len(), model = %config.api.model, "starting evaluation");

    let report = runner::run_cases(
        Arc::new(client),
        Arc::new(registry),
        cases,
        &runner::RunOptions {
            dataset_path: args.data.clone(),
            image_root: config.run.image_root.clone(),
            max_concurrent: config.run.max_concurrent,
        },
    )
    .await;

    runner::write_report(&args.output, &report)?;
    tracing::info!(
        total = report.summary.total,
        failed = report.summary.failed,
        mean_reward = report.summary.mean_reward,
        accuracy = report.summary.accuracy,
        "evaluation complete"
    );
    Ok(())
}

fn prepare(args: PrepareArgs) -> Result<()> {
    let cases = dataset::load_cases(&args.data, args.filter.as_deref())?;
    let written = dataset::write_prepared(&args.output, &cases)?;
    tracing::info!(records = written, output = %args.output.display(), "dataset prepared");
    Ok(())
}
