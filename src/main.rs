use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fracture_tui::api::{check_health, FractureApiClient, FractureBackend};
use fracture_tui::models::Config;
use fracture_tui::ui;

/// Startup reachability check runs beside the TUI and gives up after this
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

/// Terminal client for the X-ray fracture analysis workflow
#[derive(Parser, Debug)]
#[command(name = "fracture-tui")]
#[command(version)]
#[command(about = "Upload an X-ray, mark four landmarks, and read the fracture report")]
struct Args {
    /// Backend base URL (overrides FRACTURE_API_BASE)
    #[arg(long)]
    api_base: Option<String>,

    /// Maximum displayed X-ray height in canvas pixels (overrides FRACTURE_VIEWPORT_HEIGHT)
    #[arg(long)]
    viewport_height: Option<u32>,

    /// Per-request timeout in seconds (overrides FRACTURE_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log file path (overrides FRACTURE_LOG_FILE)
    #[arg(long)]
    log_file: Option<String>,

    /// X-ray path to prefill on the upload page
    #[arg(long)]
    xray: Option<PathBuf>,
}

impl Args {
    fn apply(self, mut config: Config) -> Result<(Config, Option<PathBuf>)> {
        if let Some(api_base) = self.api_base {
            config.api_base = api_base;
        }
        if let Some(height) = self.viewport_height {
            anyhow::ensure!(height > 0, "--viewport-height must be greater than zero");
            config.viewport_height = height;
        }
        if let Some(timeout) = self.timeout_secs {
            config.request_timeout_secs = timeout;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = log_file;
        }
        Ok((config, self.xray))
    }
}

/// Logs go to a file; the terminal belongs to the TUI
fn init_logging(path: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fracture_tui=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("setting default subscriber failed: {}", e))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, initial_xray) = match Config::from_env().and_then(|config| args.apply(config)) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log_file)?;
    info!("Starting fracture-tui against {}", config.api_base);

    let client = FractureApiClient::new(&config)?;
    let backend: Arc<dyn FractureBackend> = Arc::new(client);
    let health_backend = Arc::clone(&backend);
    tokio::spawn(async move {
        check_health(health_backend.as_ref(), HEALTH_CHECK_TIMEOUT).await;
    });

    if let Err(e) = ui::run_app(config, backend, initial_xray).await {
        error!("TUI error: {}", e);
        eprintln!("TUI error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
