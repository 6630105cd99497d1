//! Core data types for the incident normalization and deduplication service.
//!
//! This module defines the canonical incident schema shared by every other
//! module: normalizers produce it, the merge engine combines it, and the
//! grouping stage partitions it. It contains no I/O.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Upstream sources
// ---------------------------------------------------------------------------

/// Upstream feeds that carry incident rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    StopIce,
    Ojonc,
}

impl Source {
    /// Tag written into `IncidentRecord::source`.
    pub fn tag(self) -> &'static str {
        match self {
            Source::StopIce => "stop_ice",
            Source::Ojonc => "ojonc",
        }
    }

    /// Prefix for identifiers seeded by this source's normalizer.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Source::StopIce => "stopice-",
            Source::Ojonc => "ojonc-",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// Classification enums
// ---------------------------------------------------------------------------

/// Kind of enforcement activity described by a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Raid,
    Checkpoint,
    Arrest,
    Presence,
    Unknown,
}

/// Provenance tier of a report. Independent of the numeric confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    Moderator,
    Community,
    Unverified,
}

// ---------------------------------------------------------------------------
// Source tag set
// ---------------------------------------------------------------------------

/// Sorted, de-duplicated set of source tags.
///
/// Serialized as a single semicolon-joined string, e.g. `"ojonc;stop_ice"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet(BTreeSet<String>);

impl SourceSet {
    pub fn single(tag: &str) -> Self {
        let mut set = SourceSet::default();
        set.insert(tag);
        set
    }

    /// Inserts a tag after trimming; blank tags are ignored.
    pub fn insert(&mut self, tag: &str) {
        let tag = tag.trim();
        if !tag.is_empty() {
            self.0.insert(tag.to_string());
        }
    }

    pub fn union_with(&mut self, other: &SourceSet) {
        for tag in &other.0 {
            self.0.insert(tag.clone());
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Parses a semicolon-joined tag list.
    pub fn parse(joined: &str) -> Self {
        let mut set = SourceSet::default();
        for tag in joined.split(';') {
            set.insert(tag);
        }
        set
    }
}

impl fmt::Display for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(";"))
    }
}

impl Serialize for SourceSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SourceSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let joined = String::deserialize(deserializer)?;
        Ok(SourceSet::parse(&joined))
    }
}

// ---------------------------------------------------------------------------
// Canonical record
// ---------------------------------------------------------------------------

/// Where an incident was reported. `city` and `state` may be empty when the
/// upstream location text could not be resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub state: String,
    pub lat: f64,
    pub lng: f64,
}

/// The unified schema every upstream source is normalized into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub id: String,
    pub source: SourceSet,
    pub reported_at: String, // ISO 8601, UTC when produced by a normalizer
    pub location: Location,
    pub activity_type: ActivityType,
    pub description: String,
    pub verification: Verification,
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from the non-core edges of the service: configuration loading,
/// raw payload files and export. Normalization and deduplication never fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
