//! Mail routing and DANE options.

use super::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// MX resolution options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MxConfig {
    /// Names under which this host receives mail.
    ///
    /// The system hostname is added at startup when the list is empty.
    pub local_names: Vec<String>,

    /// Host whose own MX set is used when resolution fails or is empty.
    pub fallback_mx: Option<String>,

    /// Try the domain's address when the local host is its best MX.
    pub try_null_mx_list: bool,

    /// Wildcard MX records exist in the local domains.
    pub has_wildcard_mx: bool,

    /// Do not follow CNAMEs while canonicalizing.
    pub dont_expand_cnames: bool,
}

impl MxConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = self.local_names.iter().find(|n| n.trim().is_empty()) {
            return Err(ConfigError::invalid(
                "mx.local_names",
                format!("'{name}' is not a host name"),
            ));
        }

        if let Some(fallback) = &self.fallback_mx {
            if fallback.trim_end_matches('.').is_empty() {
                return Err(ConfigError::invalid("mx.fallback_mx", "must not be empty"));
            }
        }

        Ok(())
    }
}

/// TLSA cache options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaneConfig {
    /// Fetch TLSA records for MX hosts.
    pub enabled: bool,

    /// Ceiling on how long a fetched entry is kept (seconds).
    pub default_ttl_secs: u64,

    /// How long a transient failure is remembered (seconds).
    pub negative_ttl_secs: u64,

    /// Maximum number of cached hosts. `None` is unbounded.
    pub max_entries: Option<usize>,
}

impl Default for DaneConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_secs: 3600,
            negative_ttl_secs: 60,
            max_entries: None,
        }
    }
}

impl DaneConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl_secs == 0 {
            return Err(ConfigError::invalid("dane.default_ttl_secs", "must be at least 1"));
        }

        if self.negative_ttl_secs == 0 {
            return Err(ConfigError::invalid("dane.negative_ttl_secs", "must be at least 1"));
        }

        if self.negative_ttl_secs > self.default_ttl_secs {
            return Err(ConfigError::invalid(
                "dane.negative_ttl_secs",
                "must not exceed dane.default_ttl_secs",
            ));
        }

        if self.max_entries == Some(0) {
            return Err(ConfigError::invalid("dane.max_entries", "must be at least 1"));
        }

        Ok(())
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn negative_ttl(&self) -> Duration {
        Duration::from_secs(self.negative_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mx_validation() {
        assert!(MxConfig::default().validate().is_ok());

        let config = MxConfig {
            local_names: vec![" ".to_string()],
            ..MxConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MxConfig {
            fallback_mx: Some(".".to_string()),
            ..MxConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dane_validation() {
        let config = DaneConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_ttl(), Duration::from_secs(3600));
        assert_eq!(config.negative_ttl(), Duration::from_secs(60));

        let config = DaneConfig {
            negative_ttl_secs: 7200,
            ..DaneConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "dane.negative_ttl_secs"
        ));

        let config = DaneConfig {
            max_entries: Some(0),
            ..DaneConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
