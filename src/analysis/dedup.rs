//! Duplicate report collapse.
//!
//! Reports from different feeds (or repeated reports in one feed) that
//! describe the same event are folded into a single representative. The
//! algorithm is a single greedy pass over time-sorted input: each record
//! joins the first existing representative it matches on time, distance
//! and description, otherwise it starts a new cluster. First match wins,
//! so the result depends on input order; sorting first makes it
//! reproducible.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::similarity::{distance_km, text_similarity};
use crate::confidence::clamp_confidence;
use crate::ingest::content_hash;
use crate::model::IncidentRecord;
use crate::timestamps::{parse_reported_at, to_canonical};

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Match thresholds and the confidence bonus applied on each merge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupParams {
    /// Maximum time between two reports, inclusive.
    pub window_minutes: i64,
    /// Maximum great-circle distance, inclusive.
    pub radius_km: f64,
    /// Minimum description similarity, inclusive.
    pub min_similarity: f64,
    pub corroboration_bonus: f64,
}

impl Default for DedupParams {
    fn default() -> Self {
        Self {
            window_minutes: 120,
            radius_km: 1.0,
            min_similarity: 0.75,
            corroboration_bonus: 0.10,
        }
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Ordering key for the merge pass: the canonical UTC form when
/// `reported_at` parses, otherwise the literal string.
///
/// Unparseable values therefore sort lexicographically among real
/// timestamps, which is coarse but stable.
pub fn sort_key(reported_at: &str) -> String {
    parse_reported_at(reported_at)
        .map(to_canonical)
        .unwrap_or_else(|| reported_at.to_string())
}

fn within_window(a: &str, b: &str, window_minutes: i64) -> bool {
    match (parse_reported_at(a), parse_reported_at(b)) {
        (Some(ta), Some(tb)) => (ta - tb).num_seconds().abs() <= window_minutes.saturating_mul(60),
        _ => false,
    }
}

/// True when `incoming` plausibly describes the same event as `rep`.
/// A pair whose timestamps do not both parse never matches.
pub fn is_match(rep: &IncidentRecord, incoming: &IncidentRecord, params: &DedupParams) -> bool {
    if !within_window(&incoming.reported_at, &rep.reported_at, params.window_minutes) {
        return false;
    }
    let dist = distance_km(
        incoming.location.lat,
        incoming.location.lng,
        rep.location.lat,
        rep.location.lng,
    );
    if dist > params.radius_km {
        return false;
    }
    text_similarity(&incoming.description, &rep.description) >= params.min_similarity
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Folds `incoming` into `rep`.
///
/// Sources are unioned and the longer description kept. If `incoming` is
/// more confident it replaces the representative's confidence, location,
/// activity, verification and timestamp as one unit. Every merge then adds
/// the corroboration bonus.
pub fn merge_into(rep: &mut IncidentRecord, incoming: IncidentRecord, params: &DedupParams) {
    rep.source.union_with(&incoming.source);

    if incoming.description.chars().count() > rep.description.chars().count() {
        rep.description = incoming.description;
    }

    if incoming.confidence > rep.confidence {
        rep.confidence = incoming.confidence;
        rep.location = incoming.location;
        rep.activity_type = incoming.activity_type;
        rep.verification = incoming.verification;
        rep.reported_at = incoming.reported_at;
    }

    rep.confidence = clamp_confidence(rep.confidence + params.corroboration_bonus);
}

/// Content-derived id for a (possibly merged) record.
pub fn merged_id(inc: &IncidentRecord) -> String {
    let seed = format!(
        "{}|{}|{}|{}|{}",
        inc.source, inc.reported_at, inc.location.lat, inc.location.lng, inc.description
    );
    format!("inc-{}", content_hash(&seed))
}

/// Collapses duplicates using the default thresholds.
pub fn deduplicate(incidents: Vec<IncidentRecord>) -> Vec<IncidentRecord> {
    deduplicate_with(incidents, &DedupParams::default())
}

pub fn deduplicate_with(mut incidents: Vec<IncidentRecord>, params: &DedupParams) -> Vec<IncidentRecord> {
    // stable: equal keys keep their input order
    incidents.sort_by(|a, b| compare_reported(a, b));

    let mut representatives: Vec<IncidentRecord> = Vec::new();
    for incoming in incidents {
        match representatives.iter().position(|rep| is_match(rep, &incoming, params)) {
            Some(idx) => {
                let rep = &mut representatives[idx];
                debug!(into = %rep.id, from = %incoming.id, "merging duplicate report");
                merge_into(rep, incoming, params);
            }
            None => representatives.push(incoming),
        }
    }

    for rep in &mut representatives {
        rep.id = merged_id(rep);
    }
    representatives
}

fn compare_reported(a: &IncidentRecord, b: &IncidentRecord) -> Ordering {
    sort_key(&a.reported_at).cmp(&sort_key(&b.reported_at))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActivityType, Location, SourceSet, Verification};

    const DESC: &str = "ICE agents detaining people at the corner of 5th and Main street";
    const DESC_SHORT: &str = "ICE agents detaining people at the corner of 5th and Main st";

    fn incident(source: &str, reported_at: &str, lat: f64, lng: f64, description: &str, confidence: f64) -> IncidentRecord {
        IncidentRecord {
            id: format!("{}-{}", source, reported_at),
            source: SourceSet::single(source),
            reported_at: reported_at.to_string(),
            location: Location {
                city: "Los Angeles".to_string(),
                state: "CA".to_string(),
                lat,
                lng,
            },
            activity_type: ActivityType::Arrest,
            description: description.to_string(),
            verification: Verification::Community,
            confidence,
        }
    }

    #[test]
    fn test_same_place_thirty_minutes_apart_similar_text_merges() {
        assert!(text_similarity(DESC, DESC_SHORT) >= 0.9);
        let input = vec![
            incident("stop_ice", "2026-01-17T10:00:00+00:00", 34.05, -118.25, DESC, 0.6),
            incident("ojonc", "2026-01-17T10:30:00+00:00", 34.05, -118.25, DESC_SHORT, 0.5),
        ];
        let out = deduplicate(input);
        assert_eq!(out.len(), 1, "duplicates should collapse into one record");
        assert_eq!(out[0].source.to_string(), "ojonc;stop_ice");
        assert_eq!(out[0].description, DESC, "longer description should win");
    }

    #[test]
    fn test_five_km_apart_stays_separate() {
        let input = vec![
            incident("stop_ice", "2026-01-17T10:00:00+00:00", 34.05, -118.25, DESC, 0.6),
            incident("ojonc", "2026-01-17T10:00:00+00:00", 34.095, -118.25, DESC, 0.6),
        ];
        assert!(distance_km(34.05, -118.25, 34.095, -118.25) > 4.9);
        assert_eq!(deduplicate(input).len(), 2);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let rep = incident("a", "2026-01-17T10:00:00+00:00", 34.05, -118.25, DESC, 0.6);
        let at_edge = incident("b", "2026-01-17T12:00:00+00:00", 34.05, -118.25, DESC, 0.6);
        let past_edge = incident("b", "2026-01-17T12:00:01+00:00", 34.05, -118.25, DESC, 0.6);
        let params = DedupParams::default();
        assert!(is_match(&rep, &at_edge, &params));
        assert!(!is_match(&rep, &past_edge, &params));
    }

    #[test]
    fn test_huge_window_does_not_overflow() {
        let rep = incident("a", "2026-01-17T10:00:00+00:00", 34.05, -118.25, DESC, 0.6);
        let years_later = incident("b", "2031-06-01T10:00:00+00:00", 34.05, -118.25, DESC, 0.6);
        let params = DedupParams {
            window_minutes: i64::MAX,
            ..DedupParams::default()
        };
        assert!(is_match(&rep, &years_later, &params), "an unbounded window accepts any gap");
    }

    #[test]
    fn test_dissimilar_descriptions_do_not_match() {
        let rep = incident("a", "2026-01-17T10:00:00+00:00", 34.05, -118.25, DESC, 0.6);
        let other = incident("b", "2026-01-17T10:05:00+00:00", 34.05, -118.25, "checkpoint on the freeway ramp", 0.6);
        assert!(!is_match(&rep, &other, &DedupParams::default()));
    }

    #[test]
    fn test_unparseable_timestamp_never_matches() {
        let rep = incident("a", "not-a-time", 34.05, -118.25, DESC, 0.6);
        let twin = incident("b", "not-a-time", 34.05, -118.25, DESC, 0.6);
        assert!(!is_match(&rep, &twin, &DedupParams::default()));
        assert_eq!(deduplicate(vec![rep, twin]).len(), 2);
    }

    #[test]
    fn test_more_confident_incoming_swaps_evidence_as_a_unit() {
        let mut rep = incident("stop_ice", "2026-01-17T10:00:00+00:00", 34.05, -118.25, DESC, 0.4);
        let mut incoming = incident("ojonc", "2026-01-17T10:20:00+00:00", 34.051, -118.25, DESC_SHORT, 0.7);
        incoming.activity_type = ActivityType::Raid;
        incoming.verification = Verification::Moderator;

        merge_into(&mut rep, incoming, &DedupParams::default());
        assert!((rep.confidence - 0.8).abs() < 1e-9, "0.7 + bonus, got {}", rep.confidence);
        assert_eq!(rep.reported_at, "2026-01-17T10:20:00+00:00");
        assert_eq!(rep.location.lat, 34.051);
        assert_eq!(rep.activity_type, ActivityType::Raid);
        assert_eq!(rep.verification, Verification::Moderator);
        assert_eq!(rep.description, DESC, "description is chosen by length, not by confidence");
    }

    #[test]
    fn test_less_confident_incoming_still_adds_bonus() {
        let mut rep = incident("stop_ice", "2026-01-17T10:00:00+00:00", 34.05, -118.25, DESC, 0.6);
        let incoming = incident("ojonc", "2026-01-17T10:20:00+00:00", 34.05, -118.25, DESC, 0.2);
        merge_into(&mut rep, incoming, &DedupParams::default());
        assert!((rep.confidence - 0.7).abs() < 1e-9);
        assert_eq!(rep.reported_at, "2026-01-17T10:00:00+00:00");
    }

    #[test]
    fn test_merge_confidence_is_monotonic_and_clamped() {
        for (base, other) in [(0.0, 0.0), (0.5, 0.3), (0.5, 0.9), (0.95, 0.2), (1.0, 1.0)] {
            let mut rep = incident("a", "2026-01-17T10:00:00+00:00", 34.05, -118.25, DESC, base);
            let incoming = incident("b", "2026-01-17T10:00:00+00:00", 34.05, -118.25, DESC, other);
            merge_into(&mut rep, incoming, &DedupParams::default());
            assert!(rep.confidence >= base, "merge lowered confidence from {} to {}", base, rep.confidence);
            assert!((0.0..=1.0).contains(&rep.confidence));
        }
    }

    #[test]
    fn test_first_match_wins_over_better_match() {
        // Both representatives are within range of the third report; it
        // joins the earlier one even though the later one is identical.
        let input = vec![
            incident("a", "2026-01-17T10:00:00+00:00", 34.05, -118.25, DESC_SHORT, 0.5),
            incident("b", "2026-01-17T10:10:00+00:00", 34.05, -118.25, "unrelated checkpoint on the highway", 0.5),
            incident("c", "2026-01-17T10:20:00+00:00", 34.05, -118.25, DESC, 0.5),
        ];
        let out = deduplicate(input);
        assert_eq!(out.len(), 2);
        assert!(out[0].source.contains("a") && out[0].source.contains("c"));
        assert_eq!(out[1].source.to_string(), "b");
    }

    #[test]
    fn test_output_never_larger_than_input_and_sources_nonempty() {
        let input: Vec<_> = (0..12)
            .map(|i| {
                let minute = (i * 17) % 60;
                incident(
                    if i % 2 == 0 { "stop_ice" } else { "ojonc" },
                    &format!("2026-01-17T1{}:{:02}:00+00:00", i % 3, minute),
                    34.05 + (i % 4) as f64 * 0.004,
                    -118.25,
                    if i % 3 == 0 { DESC } else { DESC_SHORT },
                    0.1 * (i % 10) as f64,
                )
            })
            .collect();
        let n = input.len();
        let out = deduplicate(input);
        assert!(out.len() <= n);
        for inc in &out {
            assert!(!inc.source.is_empty());
            assert!((0.0..=1.0).contains(&inc.confidence));
        }
    }

    #[test]
    fn test_ids_are_recomputed_and_reproducible() {
        let input = vec![
            incident("stop_ice", "2026-01-17T10:00:00+00:00", 34.05, -118.25, DESC, 0.6),
            incident("ojonc", "2026-01-17T10:30:00+00:00", 34.05, -118.25, DESC_SHORT, 0.5),
            incident("ojonc", "2026-01-17T18:00:00+00:00", 35.0, -80.0, "patrol cars staged at the mall", 0.5),
        ];
        let a = deduplicate(input.clone());
        let b = deduplicate(input);
        assert_eq!(a, b);
        for inc in &a {
            assert!(inc.id.starts_with("inc-"));
            assert_eq!(inc.id, merged_id(inc));
        }
        assert_ne!(a[0].id, a[1].id);
    }

    #[test]
    fn test_sort_uses_instant_for_parseable_timestamps() {
        // 10:00-05:00 is 15:00Z, later than 14:00Z despite sorting first
        // as a literal string.
        let input = vec![
            incident("a", "2026-01-17T10:00:00-05:00", 34.05, -118.25, "first text about vans", 0.5),
            incident("b", "2026-01-17T14:00:00+00:00", 40.0, -80.0, "second text about a checkpoint", 0.5),
        ];
        let out = deduplicate(input);
        assert_eq!(out[0].source.to_string(), "b");
        assert_eq!(out[1].source.to_string(), "a");
    }

    #[test]
    fn test_unparseable_timestamps_sort_by_literal_string() {
        // Known coarse ordering: an unparseable value is compared as raw
        // text, so "unknown" lands after every "2026-..." timestamp while
        // "0000-garbage" lands before them.
        let input = vec![
            incident("late", "unknown", 34.05, -118.25, "alpha report text here", 0.5),
            incident("real", "2026-01-17T10:00:00+00:00", 36.0, -100.0, "beta report text here", 0.5),
            incident("early", "0000-garbage", 38.0, -90.0, "gamma report text here", 0.5),
        ];
        let order: Vec<String> = deduplicate(input).iter().map(|i| i.source.to_string()).collect();
        assert_eq!(order, vec!["early", "real", "late"]);
    }
}
