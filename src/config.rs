//! Configuration for keystroke biometrics.

use crate::core::gate::{ConsistencyGate, DEFAULT_MAX_DEVIATION_MS, DEFAULT_MIN_SAMPLE_COUNT};
use crate::core::verifier::{Verifier, DEFAULT_TOP_N};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the profile store and audit stats
    pub data_path: PathBuf,

    /// Anti-poisoning thresholds
    #[serde(default)]
    pub gate: GateConfig,

    /// Verification matrix settings
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keystroke-biometrics");

        Self {
            data_path: data_dir,
            gate: GateConfig::default(),
            verifier: VerifierConfig::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::Io(e.to_string()))?;
            let config: Config =
                serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keystroke-biometrics")
            .join("config.json")
    }

    /// Path of the JSON profile store.
    pub fn profiles_path(&self) -> PathBuf {
        self.data_path.join("profiles.json")
    }

    /// Path of the persisted audit counters.
    pub fn audit_path(&self) -> PathBuf {
        self.data_path.join("audit.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }
}

/// Consistency gate thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Largest accepted per-axis deviation from the profile (ms)
    pub max_deviation_ms: f64,
    /// Profiles with this many sessions or fewer accept anything
    pub min_sample_count: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_deviation_ms: DEFAULT_MAX_DEVIATION_MS,
            min_sample_count: DEFAULT_MIN_SAMPLE_COUNT,
        }
    }
}

impl From<&GateConfig> for ConsistencyGate {
    fn from(config: &GateConfig) -> Self {
        ConsistencyGate::new(config.max_deviation_ms, config.min_sample_count)
    }
}

/// Verifier settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Rows reported in the verification matrix
    pub top_n: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl From<&VerifierConfig> for Verifier {
    fn from(config: &VerifierConfig) -> Self {
        Verifier::new(config.top_n)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub port: u16,
    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

impl ServerSettings {
    /// Parse allowed origins from a comma-separated string.
    pub fn origins_from_csv(s: &str) -> Vec<String> {
        s.split(',')
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gate.max_deviation_ms, 60.0);
        assert_eq!(config.gate.min_sample_count, 2);
        assert_eq!(config.verifier.top_n, 5);
        assert!(config.profiles_path().ends_with("profiles.json"));
    }

    #[test]
    fn test_origins_parsing() {
        let origins = ServerSettings::origins_from_csv("http://localhost:5173, https://app.example.com,,");
        assert_eq!(
            origins,
            vec!["http://localhost:5173", "https://app.example.com"]
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"data_path": "/tmp/kb"}"#).unwrap();
        assert_eq!(config.data_path, PathBuf::from("/tmp/kb"));
        assert_eq!(config.gate, GateConfig::default());
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_thresholds_flow_into_gate() {
        let gate = ConsistencyGate::from(&GateConfig {
            max_deviation_ms: 40.0,
            min_sample_count: 5,
        });
        assert_eq!(gate.max_deviation_ms(), 40.0);
        assert_eq!(gate.min_sample_count(), 5);
        assert_eq!(Verifier::from(&VerifierConfig { top_n: 3 }).top_n(), 3);
    }
}
