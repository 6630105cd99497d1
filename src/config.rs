//! Service configuration loaded from TOML.
//!
//! Every section is optional; a missing file or an empty one yields the
//! defaults, which reproduce the standard matching thresholds.
//!
//! ```toml
//! [dedup]
//! window_minutes = 120
//! radius_km = 1.0
//! min_similarity = 0.75
//! corroboration_bonus = 0.10
//!
//! [paths]
//! raw_dir = "data/raw"
//! output_dir = "data"
//!
//! [logging]
//! level = "info"
//! file = "incident_service.log"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::analysis::dedup::DedupParams;
use crate::model::{Error, Result};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "INCIDENT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "incident_service.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dedup: DedupParams,
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the raw payload files from the fetch layer.
    pub raw_dir: PathBuf,
    /// Root of the persisted output layout.
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. "info" or "incident_service=debug".
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Like `load`, but a file that does not exist yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        let d = &self.dedup;
        if d.window_minutes < 0 {
            return Err(Error::Config(format!(
                "dedup.window_minutes must be >= 0, got {}",
                d.window_minutes
            )));
        }
        if !(d.radius_km.is_finite() && d.radius_km >= 0.0) {
            return Err(Error::Config(format!("dedup.radius_km must be >= 0, got {}", d.radius_km)));
        }
        if !(0.0..=1.0).contains(&d.min_similarity) {
            return Err(Error::Config(format!(
                "dedup.min_similarity must be within [0, 1], got {}",
                d.min_similarity
            )));
        }
        if !(d.corroboration_bonus.is_finite() && d.corroboration_bonus >= 0.0) {
            return Err(Error::Config(format!(
                "dedup.corroboration_bonus must be >= 0, got {}",
                d.corroboration_bonus
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = Config::from_toml_str("").expect("empty config should be valid");
        assert_eq!(config, Config::default());
        assert_eq!(config.dedup.window_minutes, 120);
        assert_eq!(config.dedup.radius_km, 1.0);
        assert_eq!(config.dedup.min_similarity, 0.75);
        assert_eq!(config.dedup.corroboration_bonus, 0.10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [dedup]
            radius_km = 0.5

            [paths]
            output_dir = "/tmp/out"
            "#,
        )
        .unwrap();
        assert_eq!(config.dedup.radius_km, 0.5);
        assert_eq!(config.dedup.window_minutes, 120);
        assert_eq!(config.paths.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.paths.raw_dir, PathBuf::from("data/raw"));
    }

    #[test]
    fn test_similarity_out_of_range_is_rejected() {
        let err = Config::from_toml_str("[dedup]\nmin_similarity = 1.5\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {:?}", err);
    }

    #[test]
    fn test_negative_window_is_rejected() {
        assert!(Config::from_toml_str("[dedup]\nwindow_minutes = -5\n").is_err());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let err = Config::from_toml_str("[dedup\n").unwrap_err();
        assert!(matches!(err, Error::Toml(_)), "got {:?}", err);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load_or_default(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
