//! incident_service: one batch run over the latest raw payloads.
//!
//! Reads `stop_ice.json` and `local_networks.json` from the configured raw
//! directory, normalizes and deduplicates them, and writes the persisted
//! layout under the output directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use incident_service::config::{CONFIG_ENV_VAR, Config, DEFAULT_CONFIG_PATH};
use incident_service::logging::init_logger;
use incident_service::regions::RegionLocator;
use incident_service::{pipeline, store};

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config_path = std::env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    init_logger(&config.logging.level, config.logging.file.as_deref()).context("initializing logger")?;
    info!(
        "Starting incident_service v{} (config: {})",
        env!("CARGO_PKG_VERSION"),
        config_path.display()
    );

    let input = store::load_raw_batches(&config.paths.raw_dir)
        .with_context(|| format!("reading raw payloads from {}", config.paths.raw_dir.display()))?;

    let output = pipeline::run(&input, &RegionLocator, &config.dedup);

    let summary = store::export(&output, &config.paths.output_dir)
        .with_context(|| format!("writing output to {}", config.paths.output_dir.display()))?;
    info!(
        "Wrote {} incidents ({} day files, {} region files)",
        output.index.incident_count, summary.date_files, summary.state_files
    );
    Ok(())
}
