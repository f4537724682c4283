//! Configuration loading for the WorkFun binary.
//!
//! A single optional TOML file, `workfun.toml` in the user config directory
//! (overridable with `WORKFUN_CONFIG`). A missing file is not an error;
//! defaults apply.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct WorkfunConfig {
    pub app: Option<AppConfig>,
    pub log: Option<LogConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Override for the data directory holding the accounts database,
    /// logs, and the onboarding marker.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogConfig {
    /// Tracing filter directive, e.g. `"info"` or `"workfun_store=debug"`.
    pub filter: Option<String>,
}

impl WorkfunConfig {
    /// Resolve the config file path: `WORKFUN_CONFIG` wins, otherwise
    /// `<config dir>/workfun/workfun.toml`.
    #[must_use]
    pub fn path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("WORKFUN_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("workfun").join("workfun.toml"))
    }

    pub fn load() -> Result<Self> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Data directory: config override, then the platform data dir, then a
    /// dot-directory in the working directory as a last resort.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = self.app.as_ref().and_then(|app| app.data_dir.clone()) {
            return dir;
        }
        dirs::data_dir()
            .map(|dir| dir.join("workfun"))
            .unwrap_or_else(|| PathBuf::from(".workfun"))
    }

    #[must_use]
    pub fn log_filter(&self) -> Option<&str> {
        self.log.as_ref().and_then(|log| log.filter.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: WorkfunConfig = toml::from_str(
            r#"
            [app]
            data_dir = "/tmp/workfun-test"

            [log]
            filter = "workfun_store=debug"
            "#,
        )
        .expect("parse");

        assert_eq!(config.data_dir(), PathBuf::from("/tmp/workfun-test"));
        assert_eq!(config.log_filter(), Some("workfun_store=debug"));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: WorkfunConfig = toml::from_str("").expect("parse");
        assert!(config.log_filter().is_none());
        // Falls back to a platform dir or the local dot-directory.
        assert!(config.data_dir().ends_with("workfun") || config.data_dir() == PathBuf::from(".workfun"));
    }
}
