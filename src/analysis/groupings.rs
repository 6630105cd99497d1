//! Partitions deduplicated incidents for downstream consumers.
//!
//! Organizes the flat merge output into per-date and per-region
//! collections, plus a global index summarizing the run.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::IncidentRecord;
use crate::timestamps::parse_reported_at;

// ---------------------------------------------------------------------------
// By date
// ---------------------------------------------------------------------------

/// Calendar day (UTC) an incident was reported, or `Unknown` when its
/// timestamp does not parse. `Unknown` sorts after every real day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateBucket {
    Day(NaiveDate),
    Unknown,
}

impl DateBucket {
    pub fn of(inc: &IncidentRecord) -> Self {
        parse_reported_at(&inc.reported_at)
            .map(|dt| DateBucket::Day(dt.date_naive()))
            .unwrap_or(DateBucket::Unknown)
    }
}

impl fmt::Display for DateBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateBucket::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            DateBucket::Unknown => write!(f, "unknown"),
        }
    }
}

/// Every incident lands in exactly one bucket. Input order is preserved
/// within a bucket.
pub fn group_by_date(incidents: &[IncidentRecord]) -> BTreeMap<DateBucket, Vec<IncidentRecord>> {
    let mut buckets: BTreeMap<DateBucket, Vec<IncidentRecord>> = BTreeMap::new();
    for inc in incidents {
        buckets.entry(DateBucket::of(inc)).or_default().push(inc.clone());
    }
    buckets
}

/// The date partition as persisted: real days only, keyed `YYYY-MM-DD`.
pub fn dated_buckets(
    by_date: &BTreeMap<DateBucket, Vec<IncidentRecord>>,
) -> impl Iterator<Item = (NaiveDate, &Vec<IncidentRecord>)> {
    by_date.iter().filter_map(|(bucket, items)| match bucket {
        DateBucket::Day(date) => Some((*date, items)),
        DateBucket::Unknown => None,
    })
}

// ---------------------------------------------------------------------------
// By region
// ---------------------------------------------------------------------------

/// Incidents keyed by region code. Incidents without a resolved region
/// are left out of this view only.
pub fn group_by_state(incidents: &[IncidentRecord]) -> BTreeMap<String, Vec<IncidentRecord>> {
    let mut buckets: BTreeMap<String, Vec<IncidentRecord>> = BTreeMap::new();
    for inc in incidents {
        let state = inc.location.state.trim();
        if state.is_empty() {
            continue;
        }
        buckets.entry(state.to_string()).or_default().push(inc.clone());
    }
    buckets
}

// ---------------------------------------------------------------------------
// Global index
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentIndex {
    pub generated_at: String,
    pub incident_count: usize,
    /// Region codes that have at least one incident, sorted.
    pub states: Vec<String>,
    /// Tags of the feeds that contributed to this run.
    pub sources: Vec<String>,
    /// Most recent parseable `reported_at`, as stored on the incident.
    pub latest_reported_at: Option<String>,
    pub incidents: Vec<IncidentRecord>,
}

pub fn build_index(generated_at: &str, sources: &[&str], incidents: &[IncidentRecord]) -> IncidentIndex {
    let states = group_by_state(incidents).into_keys().collect();
    let latest_reported_at = incidents
        .iter()
        .filter_map(|inc| parse_reported_at(&inc.reported_at).map(|dt| (dt, &inc.reported_at)))
        .max_by_key(|(dt, _)| *dt)
        .map(|(_, reported_at)| reported_at.clone());

    IncidentIndex {
        generated_at: generated_at.to_string(),
        incident_count: incidents.len(),
        states,
        sources: sources.iter().map(|s| s.to_string()).collect(),
        latest_reported_at,
        incidents: incidents.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
