use crate::common::{DEFAULT_IDLE_GAP, DEFAULT_MAX_UPLOAD_BYTES};
use anyhow::{Context, Result};
use dotenv::dotenv;
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

/// Runtime settings, read from `STAMP_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_logo_dir")]
    pub logo_dir: PathBuf,
    #[serde(default = "std::env::temp_dir")]
    pub scratch_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_idle_gap_ms")]
    pub idle_gap_ms: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_logo_dir() -> PathBuf {
    PathBuf::from("./Logo")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_idle_gap_ms() -> u64 {
    DEFAULT_IDLE_GAP.as_millis() as u64
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logo_dir: default_logo_dir(),
            scratch_dir: std::env::temp_dir(),
            output_dir: default_output_dir(),
            idle_gap_ms: default_idle_gap_ms(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the prefixed environment.
    pub fn load() -> Result<Self> {
        dotenv().ok();
        Self::from_iter(std::env::vars())
    }

    pub fn from_iter<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed("STAMP_")
            .from_iter(vars)
            .context("failed to read STAMP_* configuration from environment")
    }

    pub fn idle_gap(&self) -> Duration {
        Duration::from_millis(self.idle_gap_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = AppConfig::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.logo_dir, PathBuf::from("./Logo"));
        assert_eq!(config.idle_gap(), Duration::from_secs(5));
        assert_eq!(config.max_upload_bytes, 30 * 1024 * 1024);
    }

    #[test]
    fn prefixed_variables_override_defaults() {
        let vars = vec![
            ("STAMP_LOGO_DIR".to_string(), "/srv/logos".to_string()),
            ("STAMP_IDLE_GAP_MS".to_string(), "2500".to_string()),
            ("UNRELATED".to_string(), "ignored".to_string()),
        ];
        let config = AppConfig::from_iter(vars).unwrap();
        assert_eq!(config.logo_dir, PathBuf::from("/srv/logos"));
        assert_eq!(config.idle_gap(), Duration::from_millis(2500));
    }

    #[test]
    fn malformed_number_is_an_error() {
        let vars = vec![("STAMP_IDLE_GAP_MS".to_string(), "soon".to_string())];
        assert!(AppConfig::from_iter(vars).is_err());
    }
}
