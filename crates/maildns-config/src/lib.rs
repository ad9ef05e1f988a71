//! # maildns configuration
//!
//! Serde-backed configuration for the mail routing resolver.
//!
//! Every section has defaults, so an empty file is a valid
//! configuration. Files may be YAML, JSON, or TOML; the extension picks
//! the parser. The system `resolv.conf` can be merged into the resolver
//! section with [`ResolvConf`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod mail;
pub mod resolv_conf;
pub mod resolver;

pub use mail::{DaneConfig, MxConfig};
pub use resolv_conf::ResolvConf;
pub use resolver::ResolverConfig;

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("File not found: {0}")]
    NotFound(PathBuf),
}

impl ConfigError {
    /// Creates a new `InvalidValue` error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Nameservers, search list, and query behaviour.
    pub resolver: ResolverConfig,

    /// MX resolution options.
    pub mx: MxConfig,

    /// TLSA cache options.
    pub dane: DaneConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            // YAML is the default
            _ => serde_yaml::from_str(&content)?,
        };

        Ok(config)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.resolver.validate()?;
        self.mx.validate()?;
        self.dane.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Serializes to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (overridden by `RUST_LOG`).
    pub level: String,

    /// Log format (text, json).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Returns true if JSON output was requested.
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.format.to_ascii_lowercase().as_str(), "text" | "json") {
            return Err(ConfigError::invalid(
                "logging.format",
                format!("'{}' is not one of text, json", self.format),
            ));
        }
        if self.level.trim().is_empty() {
            return Err(ConfigError::invalid("logging.level", "must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = Config::default();
        config.mx.fallback_mx = Some("relay.example.net".to_string());
        let yaml = config.to_yaml().unwrap();
        let parsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("maildns.toml");
        let mut file = std::fs::File::create(&toml_path).unwrap();
        writeln!(file, "[mx]\nlocal_names = [\"mail.example.org\"]\n[logging]\nformat = \"json\"").unwrap();
        let config = Config::from_file(&toml_path).unwrap();
        assert_eq!(config.mx.local_names, vec!["mail.example.org".to_string()]);
        assert!(config.logging.is_json());

        let json_path = dir.path().join("maildns.json");
        std::fs::write(&json_path, r#"{"dane": {"enabled": false}}"#).unwrap();
        assert!(!Config::from_file(&json_path).unwrap().dane.enabled);

        let yaml_path = dir.path().join("maildns.yml");
        std::fs::write(&yaml_path, "resolver:\n  ndots: 2\n").unwrap();
        assert_eq!(Config::from_file(&yaml_path).unwrap().resolver.ndots, 2);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::from_file("/nonexistent/maildns.yaml"),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_invalid_logging_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "logging.format"
        ));
    }
}
