//! End-to-end batch transformation.
//!
//! raw per-source batches → normalize → combine → deduplicate → group.
//!
//! The run is sequential and deterministic: sources are normalized in the
//! order given, and the merge pass sorts its input before clustering, so
//! the same input always yields the same output and the same ids.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::info;

use crate::analysis::dedup::{DedupParams, deduplicate_with};
use crate::analysis::groupings::{DateBucket, IncidentIndex, build_index, group_by_date, group_by_state};
use crate::ingest::{RawRecord, decode_batch, normalize_batch};
use crate::logging::{log_dedup_summary, log_normalize_summary};
use crate::model::{IncidentRecord, Source};
use crate::regions::Locate;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Raw records fetched from one upstream feed.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBatch {
    pub source: Source,
    pub records: Vec<RawRecord>,
}

impl SourceBatch {
    pub fn empty(source: Source) -> Self {
        Self { source, records: Vec::new() }
    }

    /// Decodes a JSON array of field bags; see `ingest::decode_batch`.
    pub fn decode(source: Source, payload: &Value) -> Self {
        Self {
            source,
            records: decode_batch(source, payload),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineInput {
    /// Ingestion time, used as the fallback `reported_at` and as the
    /// index's `generated_at`.
    pub fetched_at: String,
    pub batches: Vec<SourceBatch>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub fetched_at: String,
    /// Per-source normalizer output, before deduplication.
    pub normalized: Vec<(Source, Vec<IncidentRecord>)>,
    /// Deduplicated incident set.
    pub incidents: Vec<IncidentRecord>,
    pub by_date: BTreeMap<DateBucket, Vec<IncidentRecord>>,
    pub by_state: BTreeMap<String, Vec<IncidentRecord>>,
    pub index: IncidentIndex,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

pub fn run(input: &PipelineInput, locator: &dyn Locate, params: &DedupParams) -> PipelineOutput {
    let normalized: Vec<(Source, Vec<IncidentRecord>)> = input
        .batches
        .iter()
        .map(|batch| {
            let incidents = normalize_batch(&batch.records, &input.fetched_at, locator);
            log_normalize_summary(batch.source, batch.records.len(), incidents.len());
            (batch.source, incidents)
        })
        .collect();

    let combined: Vec<IncidentRecord> = normalized
        .iter()
        .flat_map(|(_, incidents)| incidents.iter().cloned())
        .collect();
    let input_count = combined.len();

    let incidents = deduplicate_with(combined, params);
    log_dedup_summary(input_count, incidents.len());

    let by_date = group_by_date(&incidents);
    let by_state = group_by_state(&incidents);

    let source_tags: Vec<&str> = input.batches.iter().map(|b| b.source.tag()).collect();
    let index = build_index(&input.fetched_at, &source_tags, &incidents);
    info!(
        incidents = index.incident_count,
        states = index.states.len(),
        days = by_date.len(),
        "pipeline run complete"
    );

    PipelineOutput {
        fetched_at: input.fetched_at.clone(),
        normalized,
        incidents,
        by_date,
        by_state,
        index,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
