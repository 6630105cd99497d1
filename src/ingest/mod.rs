//! Source normalizers.
//!
//! Each upstream feed has its own raw record type (`stop_ice`, `ojonc`)
//! that implements `SourceRecord`, the set of extraction capabilities the
//! shared `normalize` step needs. `RawRecord` is the tagged union handed in
//! by the fetch layer; it dispatches to the right adapter so every source
//! sits behind the same `raw -> Option<IncidentRecord>` signature.
//!
//! Normalizers never perform I/O. A raw record without usable coordinates
//! is dropped; every other missing field degrades to a fallback value.

pub mod ojonc;
pub mod stop_ice;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::confidence::{VerificationSignals, score_confidence};
use crate::model::{ActivityType, IncidentRecord, Location, Source, SourceSet};
use crate::regions::Locate;

pub use ojonc::OjoncRecord;
pub use stop_ice::StopIceRecord;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// What a source adapter must be able to extract from one raw record.
pub trait SourceRecord {
    fn source(&self) -> Source;

    /// Stable identifier assigned upstream, if any.
    fn upstream_id(&self) -> Option<String>;

    /// `(lat, lng)`, or `None` if either is missing or not a finite number.
    fn coordinates(&self) -> Option<(f64, f64)>;

    /// Canonical UTC timestamp, or `fetched_at` when the source value is
    /// unusable.
    fn reported_at(&self, fetched_at: &str) -> String;

    /// Trimmed free-text description, possibly empty.
    fn description(&self) -> String;

    /// Text to feed the location resolver.
    fn location_text(&self) -> &str;

    /// Text to feed `classify`.
    fn activity_text(&self) -> &str;

    fn signals(&self) -> VerificationSignals;
}

/// Maps one raw record into the canonical schema.
pub fn normalize<R: SourceRecord + ?Sized>(
    raw: &R,
    fetched_at: &str,
    locator: &dyn Locate,
) -> Option<IncidentRecord> {
    let source = raw.source();
    let Some((lat, lng)) = raw.coordinates() else {
        debug!(source = %source, id = ?raw.upstream_id(), "dropping record without usable coordinates");
        return None;
    };

    let reported_at = raw.reported_at(fetched_at);
    let description = raw.description();
    let (city, state) = locator.locate(raw.location_text());
    let signals = raw.signals();

    Some(IncidentRecord {
        id: seed_id(source, raw.upstream_id().as_deref(), &description, &reported_at),
        source: SourceSet::single(source.tag()),
        reported_at,
        location: Location { city, state, lat, lng },
        activity_type: classify(raw.activity_text()),
        confidence: score_confidence(&signals, &description),
        verification: signals.verification,
        description,
    })
}

// ---------------------------------------------------------------------------
// Tagged raw records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    StopIce(StopIceRecord),
    Ojonc(OjoncRecord),
}

impl RawRecord {
    pub fn source(&self) -> Source {
        self.as_source_record().source()
    }

    pub fn as_source_record(&self) -> &dyn SourceRecord {
        match self {
            RawRecord::StopIce(rec) => rec,
            RawRecord::Ojonc(rec) => rec,
        }
    }

    pub fn normalize(&self, fetched_at: &str, locator: &dyn Locate) -> Option<IncidentRecord> {
        normalize(self.as_source_record(), fetched_at, locator)
    }
}

/// Normalizes a batch, silently excluding records that cannot be placed.
pub fn normalize_batch(
    records: &[RawRecord],
    fetched_at: &str,
    locator: &dyn Locate,
) -> Vec<IncidentRecord> {
    records
        .iter()
        .filter_map(|rec| rec.normalize(fetched_at, locator))
        .collect()
}

/// Decodes a JSON array of raw field bags for `source`.
///
/// Never fails: a non-array payload yields an empty batch and elements that
/// do not decode are skipped.
pub fn decode_batch(source: Source, payload: &Value) -> Vec<RawRecord> {
    let Some(items) = payload.as_array() else {
        if !payload.is_null() {
            warn!(source = %source, "raw payload is not an array; treating as empty batch");
        }
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let decoded = match source {
                Source::StopIce => decode_one(item).map(RawRecord::StopIce),
                Source::Ojonc => decode_one(item).map(RawRecord::Ojonc),
            };
            if decoded.is_none() {
                debug!(source = %source, index = idx, "skipping raw record that failed to decode");
            }
            decoded
        })
        .collect()
}

fn decode_one<T: DeserializeOwned>(item: &Value) -> Option<T> {
    if !item.is_object() {
        return None;
    }
    serde_json::from_value(item.clone()).ok()
}

// ---------------------------------------------------------------------------
// Shared sub-steps
// ---------------------------------------------------------------------------

/// Keyword classification with fixed precedence; first category wins.
pub fn classify(text: &str) -> ActivityType {
    fn has_any(text: &str, terms: &[&str]) -> bool {
        terms.iter().any(|t| text.contains(t))
    }

    let text = text.to_lowercase();
    if has_any(&text, &["raid"]) {
        ActivityType::Raid
    } else if has_any(&text, &["checkpoint", "traffic stop"]) {
        ActivityType::Checkpoint
    } else if has_any(&text, &["arrest", "detain", "detention"]) {
        ActivityType::Arrest
    } else if has_any(&text, &["sighting", "presence", "stakeout", "staging", "patrol"]) {
        ActivityType::Presence
    } else {
        ActivityType::Unknown
    }
}

/// Hex SHA-256 of `value`.
pub fn content_hash(value: &str) -> String {
    format!("{:x}", Sha256::digest(value.as_bytes()))
}

/// `<prefix><upstream id>`, or `<prefix><hash(description + reported_at)>`
/// when the upstream record carries no id.
pub fn seed_id(source: Source, upstream_id: Option<&str>, description: &str, reported_at: &str) -> String {
    match upstream_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => format!("{}{}", source.id_prefix(), id),
        None => format!("{}{}", source.id_prefix(), content_hash(&format!("{description}{reported_at}"))),
    }
}

/// Parses a coordinate from text, rejecting non-finite values.
pub fn parse_coordinate(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coordinate from a JSON number or numeric string.
pub fn coordinate_from_value(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_coordinate(s),
        _ => None,
    }
}

/// First non-blank candidate, trimmed.
pub fn first_non_blank<'a>(candidates: &[&'a str]) -> &'a str {
    candidates
        .iter()
        .map(|c| c.trim())
        .find(|c| !c.is_empty())
        .unwrap_or("")
}

/// Accepts a string, number, bool or null and yields a `String`
/// (null becomes empty). Upstream field bags are loosely typed.
pub fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_precedence() {
        assert_eq!(classify("RAID at apartment complex"), ActivityType::Raid);
        // raid outranks arrest even when both appear
        assert_eq!(classify("arrests made during raid"), ActivityType::Raid);
        assert_eq!(classify("Traffic stop on I-40"), ActivityType::Checkpoint);
        assert_eq!(classify("checkpoint and detention"), ActivityType::Checkpoint);
        assert_eq!(classify("Person detained"), ActivityType::Arrest);
        assert_eq!(classify("agents staging in parking lot"), ActivityType::Presence);
        assert_eq!(classify("Sighting"), ActivityType::Presence);
        assert_eq!(classify(""), ActivityType::Unknown);
        assert_eq!(classify("other"), ActivityType::Unknown);
    }

    #[test]
    fn test_seed_id_prefers_upstream_id() {
        assert_eq!(seed_id(Source::StopIce, Some("123"), "d", "t"), "stopice-123");
        assert_eq!(seed_id(Source::Ojonc, Some("  "), "d", "t"), format!("ojonc-{}", content_hash("dt")));
    }

    #[test]
    fn test_seed_id_is_deterministic() {
        let a = seed_id(Source::Ojonc, None, "vans on main", "2026-01-17T23:15:54+00:00");
        let b = seed_id(Source::Ojonc, None, "vans on main", "2026-01-17T23:15:54+00:00");
        let c = seed_id(Source::Ojonc, None, "vans on main", "2026-01-17T23:15:55+00:00");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(content_hash("").len(), 64);
    }

    #[test]
    fn test_coordinates_reject_garbage() {
        assert_eq!(parse_coordinate(" 34.05 "), Some(34.05));
        assert_eq!(parse_coordinate("abc"), None);
        assert_eq!(parse_coordinate(""), None);
        assert_eq!(parse_coordinate("NaN"), None);
        assert_eq!(coordinate_from_value(Some(&json!(35.5))), Some(35.5));
        assert_eq!(coordinate_from_value(Some(&json!("-78.6"))), Some(-78.6));
        assert_eq!(coordinate_from_value(Some(&json!(null))), None);
        assert_eq!(coordinate_from_value(None), None);
    }

    #[test]
    fn test_decode_batch_is_total() {
        assert!(decode_batch(Source::StopIce, &json!(null)).is_empty());
        assert!(decode_batch(Source::StopIce, &json!({"records": []})).is_empty());
        let batch = decode_batch(Source::StopIce, &json!([{"id": "1"}, 42, "x", {"id": 7}]));
        assert_eq!(batch.len(), 2, "non-object elements should be skipped");
        assert!(batch.iter().all(|r| r.source() == Source::StopIce));
    }

    #[test]
    fn test_first_non_blank() {
        assert_eq!(first_non_blank(&["  ", " b ", "c"]), "b");
        assert_eq!(first_non_blank(&["", ""]), "");
    }
}
