//! Client configuration
//!
//! Config is resolved in three layers:
//! 1. Embedded defaults (compiled into binary)
//! 2. Override file (~/.config/pare/config.toml, or an explicit path)
//! 3. Environment variables (`PARE_API_URL`, `PARE_BACKEND`, `PARE_TIMEOUT_SECS`)
//!
//! Keys missing from the override file keep their default values.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::projection::DEFAULT_PIE_LIMIT;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/pare.toml");

/// Which expense service implementation to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// The REST backend at `base_url`
    Http,
    /// Canned in-process responses (demos and offline development)
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Mock => "mock",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" | "rest" => Ok(Self::Http),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the finance backend, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    pub backend: BackendKind,
    /// Default analysis period in months
    pub months: u32,
    /// Categories shown in the pie projection
    pub pie_limit: usize,
    /// Currency symbol for display
    pub currency: String,
    /// Override file that was applied, if any
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/api".to_string(),
            timeout: Duration::from_secs(30),
            backend: BackendKind::Http,
            months: 6,
            pie_limit: DEFAULT_PIE_LIMIT,
            currency: "R$".to_string(),
            source: None,
        }
    }
}

impl Config {
    /// Load defaults, then the override file, then the environment
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut config = parse_config(DEFAULT_CONFIG, Config::default())?;

        let path = match override_path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        if let Some(path) = path {
            if path.exists() {
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                config = parse_config(&content, config)?;
                config.source = Some(path);
            } else if override_path.is_some() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        debug!(base_url = %config.base_url, backend = config.backend.as_str(), "Loaded config");
        Ok(config)
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PARE_API_URL").filter(|v| !v.is_empty()) {
            self.base_url = normalize_base_url(&url);
        }
        if let Some(backend) = lookup("PARE_BACKEND").filter(|v| !v.is_empty()) {
            self.backend = backend.parse().map_err(Error::Config)?;
        }
        if let Some(secs) = lookup("PARE_TIMEOUT_SECS").filter(|v| !v.is_empty()) {
            let secs: u64 = secs
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| Error::Config(format!("Invalid PARE_TIMEOUT_SECS: {}", secs)))?;
            self.timeout = Duration::from_secs(secs);
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pare").join("config.toml"))
}

pub(crate) fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    api: Option<RawApi>,
    analysis: Option<RawAnalysis>,
    display: Option<RawDisplay>,
}

#[derive(Debug, Deserialize)]
struct RawApi {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    backend: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    months: Option<u32>,
    pie_limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawDisplay {
    currency: Option<String>,
}

/// Parse TOML content on top of an existing config
fn parse_config(content: &str, mut config: Config) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    if let Some(api) = raw.api {
        if let Some(url) = api.base_url {
            config.base_url = normalize_base_url(&url);
        }
        if let Some(timeout) = api.timeout_secs {
            if timeout == 0 {
                return Err(Error::Config("api.timeout_secs must be at least 1".into()));
            }
            config.timeout = Duration::from_secs(timeout);
        }
        if let Some(backend) = api.backend {
            config.backend = backend.parse().map_err(Error::Config)?;
        }
    }

    if let Some(analysis) = raw.analysis {
        if let Some(months) = analysis.months {
            if months == 0 {
                return Err(Error::Config("analysis.months must be at least 1".into()));
            }
            config.months = months;
        }
        if let Some(limit) = analysis.pie_limit {
            config.pie_limit = limit;
        }
    }

    if let Some(display) = raw.display {
        if let Some(currency) = display.currency {
            config.currency = currency;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG, Config::default()).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:5000/api");
        assert_eq!(config.months, 6);
        assert_eq!(config.pie_limit, 5);
        assert_eq!(config.backend, BackendKind::Http);
    }

    #[test]
    fn test_override_file_keeps_unset_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"http://finance.local/api/\"\n[display]\ncurrency = \"$\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.base_url, "http://finance.local/api");
        assert_eq!(config.currency, "$");
        assert_eq!(config.months, 6);
        assert_eq!(config.source.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_months_rejected() {
        let result = parse_config("[analysis]\nmonths = 0", Config::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PARE_API_URL", "http://10.0.0.2:8000/api/"),
            ("PARE_BACKEND", "mock"),
            ("PARE_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.2:8000/api");
        assert_eq!(config.backend, BackendKind::Mock);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = parse_config("[api]\ntimeout_secs = 0", Config::default());
        assert!(matches!(result, Err(Error::Config(_))));

        let mut config = Config::default();
        let result = config.apply_env(|k| (k == "PARE_TIMEOUT_SECS").then(|| "0".into()));
        assert!(result.is_err());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_env_backend() {
        let mut config = Config::default();
        let result = config.apply_env(|k| (k == "PARE_BACKEND").then(|| "carrier-pigeon".into()));
        assert!(result.is_err());
    }
}
