//! StopICE public map-data adapter.
//!
//! Rows arrive as flat string field bags extracted from the `<map_data>`
//! feed: `id, url, lat, long, priorityimg, thispriority, location,
//! timestamp, comments, media`. Timestamps look like
//! `"jan 17, 2026 (15:15:54) PST"`.

use serde::Deserialize;

use super::{SourceRecord, first_non_blank, lenient_string, parse_coordinate};
use crate::confidence::VerificationSignals;
use crate::model::{Source, Verification};
use crate::timestamps;

/// Base confidence for an ordinary community submission.
pub const COMMUNITY_BASE: f64 = 0.65;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StopIceRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub lat: String,
    #[serde(deserialize_with = "lenient_string")]
    pub long: String,
    #[serde(deserialize_with = "lenient_string")]
    pub priorityimg: String,
    /// Free-text priority label, e.g. "Confirmed ICE raid" or
    /// "Unconfirmed sighting".
    #[serde(deserialize_with = "lenient_string")]
    pub thispriority: String,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(deserialize_with = "lenient_string")]
    pub timestamp: String,
    #[serde(deserialize_with = "lenient_string")]
    pub comments: String,
    #[serde(deserialize_with = "lenient_string")]
    pub media: String,
}

impl StopIceRecord {
    fn priority_words(&self) -> impl Iterator<Item = String> + '_ {
        self.thispriority
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
    }

    fn is_unconfirmed(&self) -> bool {
        self.thispriority.to_lowercase().contains("unconfirmed")
    }

    /// "confirmed" as a whole word; "unconfirmed" does not count.
    fn is_confirmed(&self) -> bool {
        self.priority_words().any(|w| w == "confirmed")
    }
}

impl SourceRecord for StopIceRecord {
    fn source(&self) -> Source {
        Source::StopIce
    }

    fn upstream_id(&self) -> Option<String> {
        Some(self.id.trim().to_string()).filter(|id| !id.is_empty())
    }

    fn coordinates(&self) -> Option<(f64, f64)> {
        Some((parse_coordinate(&self.lat)?, parse_coordinate(&self.long)?))
    }

    fn reported_at(&self, fetched_at: &str) -> String {
        timestamps::zoned_or(&self.timestamp, fetched_at)
    }

    fn description(&self) -> String {
        first_non_blank(&[self.comments.as_str(), self.thispriority.as_str()]).to_string()
    }

    fn location_text(&self) -> &str {
        &self.location
    }

    fn activity_text(&self) -> &str {
        first_non_blank(&[self.thispriority.as_str(), self.comments.as_str()])
    }

    fn signals(&self) -> VerificationSignals {
        let tier = if self.is_unconfirmed() {
            VerificationSignals::unverified()
        } else {
            VerificationSignals::tier(Verification::Community, COMMUNITY_BASE)
        };
        VerificationSignals {
            has_media: !self.media.trim().is_empty(),
            confirmed: self.is_confirmed(),
            ..tier
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
