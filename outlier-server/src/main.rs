use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use outlier_adapters::prometheus::PrometheusAdapter;
use outlier_server::{server, AppState, Settings};

#[derive(Parser, Debug)]
#[command(name = "outlier")]
#[command(about = "Latency outlier detection for service meshes")]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (host:port)
    #[arg(short, long)]
    listen: Option<String>,

    /// Prometheus HTTP API endpoint
    #[arg(long, env = "PROMETHEUS_HOST")]
    prometheus_url: Option<String>,

    /// Directory with the web UI build
    #[arg(long, env = "WEB_DIST_PATH")]
    web_dist: Option<PathBuf>,

    /// Margin (in seconds) a window median must exceed the baseline by to
    /// be labelled high
    #[arg(long)]
    high_tolerance: Option<f64>,

    /// Log filter used when RUST_LOG is not set (e.g. "debug", "outlier_engine=trace")
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let settings = apply_args(Settings::load(args.config.as_deref())?, &args);

    let adapter = PrometheusAdapter::builder()
        .endpoint(&settings.prometheus_url)
        .timeout(settings.request_timeout())
        .build()
        .context("failed to create Prometheus adapter")?;

    info!(
        prometheus = adapter.endpoint(),
        web_dist = %settings.web_dist_path.display(),
        policy = ?settings.label_policy(),
        "starting outlier"
    );

    let state = Arc::new(AppState::new(Arc::new(adapter), &settings));

    tokio::select! {
        result = server::run(&settings.listen_addr, state) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    }
}

/// Command line flags win over file and environment settings. Empty values
/// (e.g. an empty `PROMETHEUS_HOST`) are ignored.
fn apply_args(mut settings: Settings, args: &Args) -> Settings {
    if let Some(listen) = args.listen.as_ref().filter(|s| !s.is_empty()) {
        settings.listen_addr = listen.clone();
    }
    if let Some(url) = args.prometheus_url.as_ref().filter(|s| !s.is_empty()) {
        settings.prometheus_url = url.clone();
    }
    if let Some(dir) = args.web_dist.as_ref().filter(|p| !p.as_os_str().is_empty()) {
        settings.web_dist_path = dir.clone();
    }
    if args.high_tolerance.is_some() {
        settings.high_tolerance = args.high_tolerance;
    }
    settings
}
