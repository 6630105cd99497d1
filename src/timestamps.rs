//! Timestamp parsing and canonicalization.
//!
//! Every canonical record carries `reported_at` as an ISO 8601 UTC string.
//! Upstream feeds use different formats, so this module turns each of them
//! into that form and substitutes the ingestion time when a value cannot be
//! parsed.
//!
//! # Clock injection
//! Nothing here calls `Utc::now()` except `ingestion_time`. Normalizers take
//! the ingestion time as a `&str` parameter, which keeps normalization
//! deterministic in tests.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, TimeZone, Utc};

// ---------------------------------------------------------------------------
// Canonical form
// ---------------------------------------------------------------------------

/// Formats a UTC instant the way `reported_at` is stored:
/// `2026-01-17T23:15:54+00:00`.
pub fn to_canonical(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Current time in canonical form, used as the ingestion-time fallback.
pub fn ingestion_time() -> String {
    to_canonical(Utc::now())
}

/// Parses an ISO 8601 timestamp. Values with an offset (or `Z`) are
/// converted to UTC; values without one are taken to be UTC already.
pub fn parse_reported_at(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Canonicalizes `value`, or returns `fallback` unchanged if it does not
/// parse.
pub fn canonicalize_or(value: &str, fallback: &str) -> String {
    parse_reported_at(value)
        .map(to_canonical)
        .unwrap_or_else(|| fallback.to_string())
}

// ---------------------------------------------------------------------------
// Abbreviated-zone format
// ---------------------------------------------------------------------------

/// Fixed UTC offsets, in hours, for the zone abbreviations that appear in
/// human-readable upstream timestamps.
const ZONE_OFFSETS: &[(&str, i32)] = &[
    ("pst", -8),
    ("pdt", -7),
    ("mst", -7),
    ("mdt", -6),
    ("cst", -6),
    ("cdt", -5),
    ("est", -5),
    ("edt", -4),
    ("akst", -9),
    ("akdt", -8),
    ("hst", -10),
    ("utc", 0),
    ("gmt", 0),
];

pub fn zone_offset(abbreviation: &str) -> Option<FixedOffset> {
    let abbreviation = abbreviation.to_ascii_lowercase();
    ZONE_OFFSETS
        .iter()
        .find(|(name, _)| *name == abbreviation)
        .and_then(|(_, hours)| FixedOffset::east_opt(hours * 3600))
}

/// Parses timestamps like `"jan 17, 2026 (15:15:54) PST"`.
///
/// Month names and the zone abbreviation are case-insensitive; runs of
/// whitespace are collapsed. Returns `None` for anything else.
pub fn parse_zoned_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let cleaned = value.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase();
    let (body, zone) = cleaned.rsplit_once(' ')?;
    let offset = zone_offset(zone)?;
    let naive = NaiveDateTime::parse_from_str(body, "%b %d, %Y (%H:%M:%S)").ok()?;
    let local = offset.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc))
}

/// `parse_zoned_timestamp` in canonical form, falling back to `fallback`.
pub fn zoned_or(value: &str, fallback: &str) -> String {
    parse_zoned_timestamp(value)
        .map(to_canonical)
        .unwrap_or_else(|| fallback.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
