//! OjoNC (Siembra NC "Ojo Obrero") marker adapter.
//!
//! Markers come from a Supabase REST table as JSON objects. Types are loose:
//! ids may be numbers or strings, coordinates may be numbers or numeric
//! strings, and most text fields may be null.

use serde::Deserialize;
use serde_json::Value;

use super::{SourceRecord, coordinate_from_value, first_non_blank, lenient_string};
use crate::confidence::VerificationSignals;
use crate::model::{Source, Verification};
use crate::timestamps;

/// Base confidence for a marker approved by a network moderator.
pub const MODERATOR_BASE: f64 = 0.55;
/// Base confidence for a marker still awaiting moderation.
pub const COMMUNITY_BASE: f64 = 0.45;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OjoncRecord {
    pub id: Option<Value>,
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
    #[serde(deserialize_with = "lenient_string")]
    pub incident_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description_en: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(deserialize_with = "lenient_string")]
    pub city_or_town: String,
    #[serde(deserialize_with = "lenient_string")]
    pub specific_location: String,
    #[serde(deserialize_with = "lenient_string")]
    pub incident_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub moderation_status: String,
    /// Bool, number or string. Missing, null or unrecognized means active.
    pub active: Option<Value>,
    pub confirmations_count: Option<Value>,
    #[serde(deserialize_with = "lenient_string")]
    pub image_url: String,
}

impl OjoncRecord {
    fn is_active(&self) -> bool {
        match &self.active {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64() != Some(0.0),
            Some(Value::String(s)) => {
                let s = s.trim();
                !(s == "0" || s.eq_ignore_ascii_case("false"))
            }
            _ => true,
        }
    }

    fn confirmations(&self) -> f64 {
        match &self.confirmations_count {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

impl SourceRecord for OjoncRecord {
    fn source(&self) -> Source {
        Source::Ojonc
    }

    fn upstream_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        }
    }

    fn coordinates(&self) -> Option<(f64, f64)> {
        Some((
            coordinate_from_value(self.latitude.as_ref())?,
            coordinate_from_value(self.longitude.as_ref())?,
        ))
    }

    /// `incident_time`, else `created_at`, else the fetch time.
    fn reported_at(&self, fetched_at: &str) -> String {
        let fallback = timestamps::canonicalize_or(&self.created_at, fetched_at);
        timestamps::canonicalize_or(&self.incident_time, &fallback)
    }

    fn description(&self) -> String {
        first_non_blank(&[self.description_en.as_str(), self.description.as_str()]).to_string()
    }

    fn location_text(&self) -> &str {
        first_non_blank(&[
            self.address.as_str(),
            self.city_or_town.as_str(),
            self.specific_location.as_str(),
        ])
    }

    fn activity_text(&self) -> &str {
        &self.incident_type
    }

    fn signals(&self) -> VerificationSignals {
        let tier = if !self.is_active() {
            VerificationSignals::unverified()
        } else if self.moderation_status.trim().eq_ignore_ascii_case("approved") {
            VerificationSignals::tier(Verification::Moderator, MODERATOR_BASE)
        } else {
            VerificationSignals::tier(Verification::Community, COMMUNITY_BASE)
        };
        VerificationSignals {
            has_media: !self.image_url.trim().is_empty(),
            confirmed: self.confirmations() > 0.0,
            ..tier
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
