//! Structured logging for the incident service.
//!
//! The library emits `tracing` events with source identifiers attached;
//! this module installs the subscriber (console, plus an optional
//! append-only log file for scheduled runs) and provides the per-stage
//! summary helpers used by the pipeline.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::model::{Error, Result, Source};

// ---------------------------------------------------------------------------
// Subscriber setup
// ---------------------------------------------------------------------------

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. When `log_file` is given,
/// output goes to that file (appended, no ANSI colors) instead of stderr.
/// Fails if a global subscriber is already installed.
pub fn init_logger(level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| Error::Config(format!("invalid log level '{}': {}", level, e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| Error::Config(format!("logger already initialized: {}", e)))
}

// ---------------------------------------------------------------------------
// Stage summaries
// ---------------------------------------------------------------------------

/// Summary of one source's normalization pass. Dropped records are a data
/// quality signal, not a failure, so the worst level here is a warning.
pub fn log_normalize_summary(source: Source, total: usize, kept: usize) {
    let dropped = total.saturating_sub(kept);
    if dropped == 0 {
        info!(source = %source, total, "normalized {}/{} records", kept, total);
    } else if kept == 0 {
        warn!(source = %source, total, "all {} records dropped (no usable coordinates)", total);
    } else {
        warn!(source = %source, total, dropped, "normalized {}/{} records, {} dropped", kept, total, dropped);
    }
}

pub fn log_dedup_summary(input: usize, output: usize) {
    let merged = input.saturating_sub(output);
    info!(input, output, merged, "deduplication complete: {} -> {} incidents", input, output);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
