//! Confidence scoring for a single normalized report.
//!
//! The score starts from a base determined by the report's provenance tier
//! and is nudged by verification signals and by red flags in the
//! description text. Scoring is a pure function of its inputs so the same
//! rules apply to every source.

use crate::model::Verification;

// ---------------------------------------------------------------------------
// Adjustments
// ---------------------------------------------------------------------------

/// Base confidence for reports explicitly marked unconfirmed or inactive.
pub const UNVERIFIED_BASE: f64 = 0.30;

pub const MEDIA_BONUS: f64 = 0.05;
pub const CONFIRMATION_BONUS: f64 = 0.10;
pub const VAGUE_PENALTY: f64 = 0.15;
pub const RUMOR_PENALTY: f64 = 0.20;

/// Descriptions shorter than this many characters are considered vague.
pub const MIN_SPECIFIC_LENGTH: usize = 40;

const VAGUE_TERMS: &[&str] = &["maybe", "possible", "possibly", "seems", "unclear"];
const RUMOR_TERMS: &[&str] = &["rumor", "unconfirmed"];

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// Verification-relevant signals extracted from a raw record by its source
/// adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerificationSignals {
    pub verification: Verification,
    pub base_confidence: f64,
    /// Photo, video or other attachment present.
    pub has_media: bool,
    /// Confirmation count above zero or an explicit "confirmed" marker.
    pub confirmed: bool,
}

impl VerificationSignals {
    /// Signals for a report that carries an explicit unconfirmed/inactive
    /// flag. Forces the `Unverified` tier and the low base.
    pub fn unverified() -> Self {
        Self {
            verification: Verification::Unverified,
            base_confidence: UNVERIFIED_BASE,
            has_media: false,
            confirmed: false,
        }
    }

    pub fn tier(verification: Verification, base_confidence: f64) -> Self {
        Self {
            verification,
            base_confidence,
            has_media: false,
            confirmed: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Text red flags
// ---------------------------------------------------------------------------

/// Empty, shorter than `MIN_SPECIFIC_LENGTH` characters, or hedged.
pub fn is_vague(description: &str) -> bool {
    if description.is_empty() {
        return true;
    }
    let lowered = description.to_lowercase();
    if lowered.chars().count() < MIN_SPECIFIC_LENGTH {
        return true;
    }
    VAGUE_TERMS.iter().any(|term| lowered.contains(term))
}

pub fn has_rumor_language(description: &str) -> bool {
    let lowered = description.to_lowercase();
    RUMOR_TERMS.iter().any(|term| lowered.contains(term))
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Computes the `[0, 1]` confidence for a report.
pub fn score_confidence(signals: &VerificationSignals, description: &str) -> f64 {
    let mut confidence = signals.base_confidence;
    if signals.has_media {
        confidence += MEDIA_BONUS;
    }
    if signals.confirmed {
        confidence += CONFIRMATION_BONUS;
    }
    if is_vague(description) {
        confidence -= VAGUE_PENALTY;
    }
    if has_rumor_language(description) {
        confidence -= RUMOR_PENALTY;
    }
    clamp_confidence(confidence)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
