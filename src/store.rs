//! File layout for raw payloads and persisted output.
//!
//! Raw payloads are the JSON files left by the fetch layer:
//!   - `stop_ice.json`        `{ fetched_at, records: [...] }`
//!   - `local_networks.json`  `{ fetched_at, sources: [{ id: "ojonc", records: [...] }, ...] }`
//!
//! Output layout under the output root:
//!   - `normalized/<source>.json`
//!   - `incidents/<YYYY-MM-DD>.json` (incidents with an unknown date are not written)
//!   - `states/<ST>.json`
//!   - `index.json`

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::analysis::groupings::dated_buckets;
use crate::model::{IncidentRecord, Result, Source};
use crate::pipeline::{PipelineInput, PipelineOutput, SourceBatch};
use crate::timestamps::ingestion_time;

pub const STOP_ICE_FILE: &str = "stop_ice.json";
pub const LOCAL_NETWORKS_FILE: &str = "local_networks.json";

// ---------------------------------------------------------------------------
// Raw payloads
// ---------------------------------------------------------------------------

fn read_json(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        warn!(path = %path.display(), "raw payload file missing; treating as empty batch");
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&text)?))
}

fn fetched_at_of(payload: &Value) -> Option<String> {
    payload
        .get("fetched_at")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Finds the `ojonc` entry among the local network sources.
fn ojonc_records(payload: &Value) -> Value {
    payload
        .get("sources")
        .and_then(Value::as_array)
        .and_then(|sources| {
            sources
                .iter()
                .find(|s| s.get("id").and_then(Value::as_str) == Some(Source::Ojonc.tag()))
        })
        .and_then(|s| s.get("records"))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Reads the raw payload files in `raw_dir`.
///
/// Missing files yield empty batches. `fetched_at` comes from the first
/// payload that records one, else the current time.
pub fn load_raw_batches(raw_dir: &Path) -> Result<PipelineInput> {
    let stop_ice = read_json(&raw_dir.join(STOP_ICE_FILE))?;
    let local_networks = read_json(&raw_dir.join(LOCAL_NETWORKS_FILE))?;

    let fetched_at = [&stop_ice, &local_networks]
        .into_iter()
        .flatten()
        .find_map(fetched_at_of)
        .unwrap_or_else(ingestion_time);

    let stop_ice_batch = match &stop_ice {
        Some(payload) => SourceBatch::decode(Source::StopIce, payload.get("records").unwrap_or(&Value::Null)),
        None => SourceBatch::empty(Source::StopIce),
    };
    let ojonc_batch = match &local_networks {
        Some(payload) => SourceBatch::decode(Source::Ojonc, &ojonc_records(payload)),
        None => SourceBatch::empty(Source::Ojonc),
    };

    Ok(PipelineInput {
        fetched_at,
        batches: vec![stop_ice_batch, ojonc_batch],
    })
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct NormalizedFile<'a> {
    source: &'a str,
    fetched_at: &'a str,
    count: usize,
    incidents: &'a [IncidentRecord],
}

#[derive(Serialize)]
struct DateFile<'a> {
    date: String,
    count: usize,
    incidents: &'a [IncidentRecord],
}

#[derive(Serialize)]
struct StateFile<'a> {
    state: &'a str,
    count: usize,
    incidents: &'a [IncidentRecord],
}

/// Counts of files written by `export`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub normalized_files: usize,
    pub date_files: usize,
    pub state_files: usize,
}

/// Pretty-prints `data` to `path`, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(data)?;
    fs::write(path, text)?;
    Ok(())
}

pub fn export(output: &PipelineOutput, root: &Path) -> Result<ExportSummary> {
    let mut summary = ExportSummary::default();

    for (source, incidents) in &output.normalized {
        write_json(
            &root.join("normalized").join(format!("{}.json", source.tag())),
            &NormalizedFile {
                source: source.tag(),
                fetched_at: &output.fetched_at,
                count: incidents.len(),
                incidents,
            },
        )?;
        summary.normalized_files += 1;
    }

    for (date, incidents) in dated_buckets(&output.by_date) {
        let date = date.format("%Y-%m-%d").to_string();
        write_json(
            &root.join("incidents").join(format!("{}.json", date)),
            &DateFile { date, count: incidents.len(), incidents },
        )?;
        summary.date_files += 1;
    }

    for (state, incidents) in &output.by_state {
        write_json(
            &root.join("states").join(format!("{}.json", state)),
            &StateFile { state, count: incidents.len(), incidents },
        )?;
        summary.state_files += 1;
    }

    write_json(&root.join("index.json"), &output.index)?;

    info!(
        root = %root.display(),
        normalized = summary.normalized_files,
        dates = summary.date_files,
        states = summary.state_files,
        "export complete"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_raw_files_yield_empty_batches() {
        let dir = tempfile::tempdir().unwrap();
        let input = load_raw_batches(dir.path()).unwrap();
        assert_eq!(input.batches.len(), 2);
        assert!(input.batches.iter().all(|b| b.records.is_empty()));
        assert!(!input.fetched_at.is_empty());
    }

    #[test]
    fn test_raw_layout_is_read() {
        let dir = tempfile::tempdir().unwrap();
        write_json(
            &dir.path().join(STOP_ICE_FILE),
            &json!({"fetched_at": "2026-01-18T12:00:00+00:00", "records": [{"id": "1", "lat": "1", "long": "2"}]}),
        )
        .unwrap();
        write_json(
            &dir.path().join(LOCAL_NETWORKS_FILE),
            &json!({"sources": [
                {"id": "icirr", "status": "no_public_feed"},
                {"id": "ojonc", "records": [{"id": 1}, {"id": 2}]}
            ]}),
        )
        .unwrap();

        let input = load_raw_batches(dir.path()).unwrap();
        assert_eq!(input.fetched_at, "2026-01-18T12:00:00+00:00");
        assert_eq!(input.batches[0].source, Source::StopIce);
        assert_eq!(input.batches[0].records.len(), 1);
        assert_eq!(input.batches[1].source, Source::Ojonc);
        assert_eq!(input.batches[1].records.len(), 2);
    }

    #[test]
    fn test_corrupt_raw_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STOP_ICE_FILE), "{not json").unwrap();
        assert!(load_raw_batches(dir.path()).is_err());
    }
}
