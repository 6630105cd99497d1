//! Region registry and location text resolution.
//!
//! Defines the canonical list of US region codes (50 states plus DC) and
//! the default resolver that turns free location text such as
//! `"Raleigh, NC"` or `"downtown Chicago Illinois"` into a `(city, state)`
//! pair. This is the single source of truth for region codes; all other
//! modules should resolve locations through a `Locate` implementation
//! rather than hardcoding state names.

// ---------------------------------------------------------------------------
// Region metadata
// ---------------------------------------------------------------------------

/// A two-letter region code and its full name.
#[derive(Debug)]
pub struct Region {
    pub code: &'static str,
    pub name: &'static str,
}

macro_rules! regions {
    ($($code:literal => $name:literal),* $(,)?) => {
        &[$(Region { code: $code, name: $name }),*]
    };
}

/// All recognized regions, in code order as published by USPS.
pub static REGION_REGISTRY: &[Region] = regions![
    "AL" => "Alabama",
    "AK" => "Alaska",
    "AZ" => "Arizona",
    "AR" => "Arkansas",
    "CA" => "California",
    "CO" => "Colorado",
    "CT" => "Connecticut",
    "DE" => "Delaware",
    "FL" => "Florida",
    "GA" => "Georgia",
    "HI" => "Hawaii",
    "ID" => "Idaho",
    "IL" => "Illinois",
    "IN" => "Indiana",
    "IA" => "Iowa",
    "KS" => "Kansas",
    "KY" => "Kentucky",
    "LA" => "Louisiana",
    "ME" => "Maine",
    "MD" => "Maryland",
    "MA" => "Massachusetts",
    "MI" => "Michigan",
    "MN" => "Minnesota",
    "MS" => "Mississippi",
    "MO" => "Missouri",
    "MT" => "Montana",
    "NE" => "Nebraska",
    "NV" => "Nevada",
    "NH" => "New Hampshire",
    "NJ" => "New Jersey",
    "NM" => "New Mexico",
    "NY" => "New York",
    "NC" => "North Carolina",
    "ND" => "North Dakota",
    "OH" => "Ohio",
    "OK" => "Oklahoma",
    "OR" => "Oregon",
    "PA" => "Pennsylvania",
    "RI" => "Rhode Island",
    "SC" => "South Carolina",
    "SD" => "South Dakota",
    "TN" => "Tennessee",
    "TX" => "Texas",
    "UT" => "Utah",
    "VT" => "Vermont",
    "VA" => "Virginia",
    "WA" => "Washington",
    "WV" => "West Virginia",
    "WI" => "Wisconsin",
    "WY" => "Wyoming",
    "DC" => "District of Columbia",
];

/// Looks up a region by its two-letter code. Case-sensitive: upstream text
/// like "in" or "me" must not be mistaken for Indiana or Maine.
pub fn find_region(code: &str) -> Option<&'static Region> {
    REGION_REGISTRY.iter().find(|r| r.code == code)
}

pub fn is_region_code(code: &str) -> bool {
    find_region(code).is_some()
}

// ---------------------------------------------------------------------------
// Location resolution
// ---------------------------------------------------------------------------

/// Resolves free location text into `(city, state)`. Unresolvable text
/// yields a pair of empty strings rather than an error.
pub trait Locate {
    fn locate(&self, text: &str) -> (String, String);
}

impl<F> Locate for F
where
    F: Fn(&str) -> (String, String),
{
    fn locate(&self, text: &str) -> (String, String) {
        self(text)
    }
}

/// Default resolver backed by `REGION_REGISTRY`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegionLocator;

impl Locate for RegionLocator {
    fn locate(&self, text: &str) -> (String, String) {
        parse_city_state(text)
    }
}

/// Resolution order:
///   1. `", ST"` after the first comma-like boundary, city = text before the first comma
///   2. any whitespace/comma separated token that is a region code
///   3. any full region name (longest names first), city = text before it
pub fn parse_city_state(value: &str) -> (String, String) {
    let cleaned = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return unresolved();
    }

    if let Some(code) = code_after_comma(&cleaned) {
        if is_region_code(code) {
            let city = cleaned.split(',').next().unwrap_or("").trim();
            return (city.to_string(), code.to_string());
        }
    }

    let tokens: Vec<&str> = cleaned
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();
    for (idx, token) in tokens.iter().enumerate() {
        if is_region_code(token) {
            let city = tokens[..idx].join(" ");
            return (city.trim().to_string(), token.to_string());
        }
    }

    // Byte offsets stay aligned because only ASCII is case-folded.
    let lowered = cleaned.to_ascii_lowercase();
    let mut by_length: Vec<&Region> = REGION_REGISTRY.iter().collect();
    by_length.sort_by_key(|r| std::cmp::Reverse(r.name.len()));
    for region in by_length {
        if let Some(pos) = lowered.find(&region.name.to_ascii_lowercase()) {
            let city = cleaned[..pos].trim_matches(|c: char| c == ' ' || c == ',');
            return (city.to_string(), region.code.to_string());
        }
    }

    unresolved()
}

fn unresolved() -> (String, String) {
    (String::new(), String::new())
}

/// Finds the first `,<spaces>XX` where `XX` is two uppercase ASCII letters
/// followed by a word boundary.
fn code_after_comma(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    for (comma, _) in text.match_indices(',') {
        let mut start = comma + 1;
        while start < bytes.len() && bytes[start].is_ascii_whitespace() {
            start += 1;
        }
        let end = start + 2;
        if end > bytes.len() {
            continue;
        }
        let pair = &bytes[start..end];
        if !pair.iter().all(u8::is_ascii_uppercase) {
            continue;
        }
        let boundary = bytes
            .get(end)
            .is_none_or(|b| !(b.is_ascii_alphanumeric() || *b == b'_'));
        if boundary {
            return Some(&text[start..end]);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
