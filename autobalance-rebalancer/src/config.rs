//! Rebalancer configuration
//!
//! Loaded from a TOML file, with environment fallbacks for the manager URL.
//!
//! ```toml
//! [manager]
//! base_url = "https://localhost:8089"
//! auth_scheme = "Splunk"
//! ca_cert = "/etc/autobalance/ca.pem"
//! insecure = false
//! timeout_secs = 60
//! token_file = "/run/autobalance/token"
//!
//! [logging]
//! dir = "/var/log/autobalance"
//! json = false
//!
//! [[inputs]]
//! name = "nightly"
//! threshold = 0.9
//! searchable = "true"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use autobalance_core::RawInput;
use serde::Deserialize;
use thiserror::Error;

use crate::logging::LoggingConfig;
use crate::manager_client::{ManagerClientConfig, TlsConfig, DEFAULT_AUTH_SCHEME, DEFAULT_BASE_URL};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("No session token: pass --token, set AUTOBALANCE_TOKEN or configure manager.token_file")]
    MissingToken,
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RebalancerConfig {
    #[serde(default)]
    pub manager: ManagerSettings,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Inputs processed in file order
    #[serde(default)]
    pub inputs: Vec<InputConfig>,
}

/// Cluster manager connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ManagerSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,

    /// Extra CA certificate (PEM)
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,

    /// Skip certificate verification (DANGEROUS)
    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// File holding the session token
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_scheme: default_auth_scheme(),
            ca_cert: None,
            insecure: false,
            timeout_secs: default_timeout_secs(),
            token_file: None,
        }
    }
}

fn default_base_url() -> String {
    std::env::var("AUTOBALANCE_MANAGER_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

fn default_auth_scheme() -> String {
    DEFAULT_AUTH_SCHEME.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl ManagerSettings {
    /// Pick the session token: explicit value first, then the token file
    pub fn resolve_token(&self, explicit: Option<String>) -> Result<String, ConfigError> {
        if let Some(token) = explicit.filter(|t| !t.trim().is_empty()) {
            return Ok(token.trim().to_string());
        }

        let path = self.token_file.as_ref().ok_or(ConfigError::MissingToken)?;
        let token = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let token = token.trim();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(token.to_string())
    }

    pub fn client_config(&self, token: String) -> ManagerClientConfig {
        ManagerClientConfig {
            base_url: self.base_url.clone(),
            auth_scheme: self.auth_scheme.clone(),
            token,
            tls: TlsConfig {
                ca_cert: self.ca_cert.clone(),
                danger_accept_invalid_certs: self.insecure,
            },
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// One `[[inputs]]` table
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub name: String,

    #[serde(flatten)]
    pub options: BTreeMap<String, toml::Value>,
}

impl InputConfig {
    /// Convert option values to the raw string form the host would deliver
    pub fn to_raw(&self) -> Result<RawInput, ConfigError> {
        let mut input = RawInput::new(&self.name);
        for (key, value) in &self.options {
            let raw = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(ConfigError::InvalidValue(
                        format!("{}.{}", self.name, key),
                        format!("unsupported value {}", other),
                    ))
                }
            };
            input.values.insert(key.clone(), raw);
        }
        Ok(input)
    }
}

impl RebalancerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn raw_inputs(&self) -> Result<Vec<RawInput>, ConfigError> {
        self.inputs.iter().map(InputConfig::to_raw).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RebalancerConfig::parse("").unwrap();
        assert_eq!(config.manager.auth_scheme, "Splunk");
        assert_eq!(config.manager.timeout_secs, 60);
        assert!(!config.manager.insecure);
        assert!(config.logging.dir.is_none());
        assert!(config.inputs.is_empty());
    }

    #[test]
    fn test_inputs_keep_file_order_and_raw_forms() {
        let config = RebalancerConfig::parse(
            r#"
            [[inputs]]
            name = "second"
            threshold = 0.9
            max_runtime = 30
            searchable = true

            [[inputs]]
            name = "first"
            excess_buckets = "1"
            target_index = "main"
            "#,
        )
        .unwrap();

        let inputs = config.raw_inputs().unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].name, "second");
        assert_eq!(inputs[0].get("threshold"), Some("0.9"));
        assert_eq!(inputs[0].get("max_runtime"), Some("30"));
        assert_eq!(inputs[0].get("searchable"), Some("true"));
        assert_eq!(inputs[1].name, "first");
        assert_eq!(inputs[1].get("excess_buckets"), Some("1"));
        assert_eq!(inputs[1].get("target_index"), Some("main"));
        assert!(inputs[1].get("name").is_none());
    }

    #[test]
    fn test_unsupported_input_value() {
        let config = RebalancerConfig::parse(
            r#"
            [[inputs]]
            name = "bad"
            target_index = ["a", "b"]
            "#,
        )
        .unwrap();
        let err = config.raw_inputs().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref field, _) if field == "bad.target_index"));
    }

    #[test]
    fn test_client_config_mapping() {
        let config = RebalancerConfig::parse(
            r#"
            [manager]
            base_url = "https://cm.example:8089"
            auth_scheme = "Bearer"
            ca_cert = "/etc/ca.pem"
            insecure = true
            timeout_secs = 5
            "#,
        )
        .unwrap();
        let client = config.manager.client_config("tok".into());
        assert_eq!(client.base_url, "https://cm.example:8089");
        assert_eq!(client.auth_scheme, "Bearer");
        assert_eq!(client.token, "tok");
        assert_eq!(client.tls.ca_cert, Some(PathBuf::from("/etc/ca.pem")));
        assert!(client.tls.danger_accept_invalid_certs);
        assert_eq!(client.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_resolve_token_prefers_explicit() {
        let settings = ManagerSettings::default();
        assert_eq!(settings.resolve_token(Some("abc".into())).unwrap(), "abc");
        assert!(matches!(
            settings.resolve_token(None),
            Err(ConfigError::MissingToken)
        ));
    }

    #[test]
    fn test_resolve_token_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  session-key  ").unwrap();

        let settings = ManagerSettings {
            token_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert_eq!(settings.resolve_token(None).unwrap(), "session-key");
        assert_eq!(settings.resolve_token(Some("".into())).unwrap(), "session-key");
    }

    #[test]
    fn test_load_missing_file() {
        let err = RebalancerConfig::load(Path::new("/nonexistent/autobalance.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
