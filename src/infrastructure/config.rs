//! Admission settings loaded from a YAML file.
//!
//! ```yaml
//! rateLimit:
//!   maxRequestsPerWindow: 100
//!   windowSizeSeconds: 60
//! identityHeader: X-Forwarded-For
//! maxClients: 50000
//! sweepIntervalSecs: 30
//! idleMultiplier: 2
//! ```
//!
//! Every field is optional. `maxClients: null` removes the capacity bound.

use crate::application::gate::AdmissionGate;
use crate::application::resolver::ClientKeyResolver;
use crate::domain::policy::RateLimitPolicy;
use crate::infrastructure::builder::{AdmissionGateBuilder, BuildError, CounterStorage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[cfg(feature = "async")]
use crate::application::sweeper::{SweeperConfig, SweeperConfigError};

/// Error returned when a configuration file cannot be loaded.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read admission config: {}", e),
            ConfigError::Parse(e) => write!(f, "failed to parse admission config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Startup configuration for admission control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdmissionConfig {
    pub rate_limit: RateLimitPolicy,
    pub identity_header: String,
    /// `None` tracks any number of identities
    pub max_clients: Option<usize>,
    pub sweep_interval_secs: u64,
    pub idle_multiplier: u32,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitPolicy::default(),
            identity_header: ClientKeyResolver::DEFAULT_HEADER.to_string(),
            max_clients: Some(AdmissionGateBuilder::DEFAULT_MAX_CLIENTS),
            sweep_interval_secs: Self::DEFAULT_SWEEP_INTERVAL_SECS,
            idle_multiplier: Self::DEFAULT_IDLE_MULTIPLIER,
        }
    }
}

impl AdmissionConfig {
    /// Default `sweepIntervalSecs`.
    pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
    /// Default `idleMultiplier`.
    pub const DEFAULT_IDLE_MULTIPLIER: u32 = 2;

    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Load a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&raw)?;
        info!(path = %path.display(), "loaded admission config");
        Ok(config)
    }

    /// Time between idle-eviction sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Sweeper settings derived from this configuration.
    #[cfg(feature = "async")]
    pub fn sweeper_config(&self) -> Result<SweeperConfig, SweeperConfigError> {
        SweeperConfig::new(self.sweep_interval(), self.idle_multiplier)
    }

    /// Build a gate from this configuration with the system clock.
    pub fn build_gate(&self) -> Result<AdmissionGate<CounterStorage>, BuildError> {
        AdmissionGateBuilder::from_config(self).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AdmissionConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, AdmissionConfig::default());
        assert_eq!(config.max_clients, Some(10_000));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_full_document() {
        let config = AdmissionConfig::from_yaml_str(
            r#"
rateLimit:
  maxRequestsPerWindow: 100
  windowSizeSeconds: 30
identityHeader: X-Real-IP
maxClients: null
sweepIntervalSecs: 5
idleMultiplier: 4
"#,
        )
        .unwrap();

        assert_eq!(config.rate_limit, RateLimitPolicy::new(100, 30).unwrap());
        assert_eq!(config.identity_header, "X-Real-IP");
        assert_eq!(config.max_clients, None);
        assert_eq!(config.idle_multiplier, 4);

        let gate = config.build_gate().unwrap();
        assert_eq!(gate.counter().limit(), 100);
        assert_eq!(gate.resolver().identity_header(), "X-Real-IP");
    }

    #[test]
    fn test_parse_error() {
        let err = AdmissionConfig::from_yaml_str("rateLimit: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rateLimit:\n  maxRequestsPerWindow: 5\n  windowSizeSeconds: 1").unwrap();

        let config = AdmissionConfig::from_path(file.path()).unwrap();
        assert_eq!(config.rate_limit.max_requests_per_window, 5);

        let missing = AdmissionConfig::from_path(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[cfg(feature = "async")]
    #[test]
    fn test_default_sweeper_config_matches() {
        assert_eq!(AdmissionConfig::default().sweeper_config(), Ok(SweeperConfig::default()));
    }

    #[cfg(feature = "async")]
    #[test]
    fn test_sweeper_config_rejects_zero_interval() {
        let config = AdmissionConfig {
            sweep_interval_secs: 0,
            ..AdmissionConfig::default()
        };
        assert_eq!(config.sweeper_config(), Err(SweeperConfigError::ZeroInterval));
    }
}
