//! Thermoscan batch worker: analyse stored sessions and emit JSON reports.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thermoscan_pipeline::{load_analysis_config, ReportAggregator};
use thermoscan_store::FsCaptureStore;
use thermoscan_worker::analyze_sessions;

#[derive(Parser, Debug)]
#[command(name = "thermoscan-worker")]
#[command(about = "Analyse thermographic capture sessions and write JSON reports")]
struct Cli {
    /// Capture root: one directory per session
    #[arg(long, env = "IMAGES_DIR", default_value = "./images")]
    images: PathBuf,

    /// Prefix for image references in the report
    #[arg(long, env = "IMAGES_BASE_URL", default_value = "/images")]
    images_base_url: String,

    /// Analysis configuration JSON (defaults to the built-in catalog)
    #[arg(short, long, env = "ANALYSIS_CONFIG")]
    config: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum number of views analysed concurrently
    #[arg(long, env = "ANALYSIS_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Analyse every session under the capture root
    #[arg(long, conflicts_with = "sessions")]
    all: bool,

    /// Session identifiers to analyse
    sessions: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thermoscan_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let analysis = load_analysis_config(cli.config.as_deref())
        .context("Failed to load analysis configuration")?;
    let store = FsCaptureStore::new(&cli.images, cli.images_base_url.clone(), analysis.skin_range);
    let mut aggregator = ReportAggregator::new(Arc::new(store), analysis)
        .context("Invalid analysis configuration")?;
    if let Some(concurrency) = cli.concurrency {
        aggregator = aggregator.with_concurrency(concurrency);
    }

    let sessions = if cli.all {
        aggregator
            .list_sessions()
            .await
            .context("Failed to list sessions")?
    } else {
        cli.sessions.clone()
    };
    if sessions.is_empty() {
        bail!("No sessions to analyse (pass session ids or --all)");
    }
    tracing::info!(count = sessions.len(), root = %cli.images.display(), "Worker starting");

    let outcome = analyze_sessions(&aggregator, &sessions).await;
    let json = outcome.to_json().context("Failed to serialize reports")?;

    match &cli.output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => println!("{json}"),
    }

    if !outcome.is_success() {
        let failed: Vec<&str> = outcome.failures.iter().map(|(id, _)| id.as_str()).collect();
        bail!("{} session(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}
