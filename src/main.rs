mod app;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use disease_explorer::api::{HttpApi, NetworkApi};
use disease_explorer::config::{self, RawConfig};
use disease_explorer::export;
use disease_explorer::model::InterpretabilityFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InterpretabilityArg {
    All,
    Yes,
    No,
}

impl From<InterpretabilityArg> for InterpretabilityFilter {
    fn from(value: InterpretabilityArg) -> Self {
        match value {
            InterpretabilityArg::All => Self::All,
            InterpretabilityArg::Yes => Self::Yes,
            InterpretabilityArg::No => Self::No,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the network backend.
    #[arg(long, env = "DISEASE_EXPLORER_API_URL", default_value = config::DEFAULT_API_URL)]
    api_url: String,
    /// Upper bound for any fetch limit; lowered to the dataset's edge count
    /// once statistics arrive.
    #[arg(long, default_value_t = config::DEFAULT_EDGE_CAP)]
    edge_cap: usize,
    /// Initial minimum edge weight, on the backend's raw weight scale.
    #[arg(long, default_value_t = config::DEFAULT_MIN_WEIGHT)]
    min_weight: f64,
    #[arg(long, default_value_t = config::DEFAULT_LIMIT)]
    limit: usize,
    #[arg(long, value_enum, default_value_t = InterpretabilityArg::All)]
    interpretability: InterpretabilityArg,
    #[arg(long, default_value_t = config::DEFAULT_SEARCH_LIMIT)]
    search_limit: usize,
    /// circle, grid, random or concentric.
    #[arg(long, default_value = "circle")]
    layout: String,
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    /// File written by the canvas "Export" button.
    #[arg(long, default_value = export::DEFAULT_EXPORT_FILE)]
    export_path: PathBuf,
}

impl From<Args> for RawConfig {
    fn from(args: Args) -> Self {
        Self {
            api_url: args.api_url,
            edge_cap: args.edge_cap,
            min_weight: args.min_weight,
            interpretability: args.interpretability.into(),
            limit: args.limit,
            search_limit: args.search_limit,
            layout: args.layout,
            timeout_secs: args.timeout_secs,
            export_path: args.export_path,
        }
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,disease_explorer=debug"))
        .context("invalid tracing filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!(error))
        .context("failed to install tracing subscriber")
}

fn main() -> Result<()> {
    init_tracing()?;

    let args = Args::parse();
    let config = RawConfig::from(args)
        .validate()
        .context("invalid configuration")?;
    let api = HttpApi::new(config.api_url.clone(), config.request_timeout)
        .context("failed to build http client")?;

    match api.health() {
        Ok(health) => info!(
            status = %health.status,
            nodes = health.nodes_count,
            edges = health.edges_count,
            "backend reachable"
        ),
        Err(error) => warn!(%error, url = %config.api_url, "backend health check failed"),
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let api: Arc<dyn NetworkApi> = Arc::new(api);
    eframe::run_native(
        "Disease Network Explorer",
        options,
        Box::new(move |cc| Ok(Box::new(app::ExplorerApp::new(cc, &config, api)))),
    )
    .map_err(|error| anyhow::anyhow!("ui terminated: {error}"))
}
