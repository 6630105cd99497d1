//! Geospatial and textual proximity measures used by duplicate detection.

/// Mean Earth radius used by the haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two WGS84 points in kilometres
/// (haversine on a sphere of radius `EARTH_RADIUS_KM`).
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Similarity ratio in `[0, 1]` between two descriptions, compared
/// lowercased and trimmed. 1.0 means identical.
///
/// Normalized Levenshtein: `1 - edits / max(len_a, len_b)`, symmetric in
/// its arguments. Two empty strings are identical.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    strsim::normalized_levenshtein(&a, &b).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
