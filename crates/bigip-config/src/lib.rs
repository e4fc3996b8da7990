//! Connection parameters for a BIG-IP management endpoint.
//!
//! TOML + environment layering via figment, with retry/TLS defaults
//! matching what appliance deployments actually need (self-signed
//! management certs, transient 5xx during config sync). Embedders that
//! manage their own configuration can skip this crate and construct
//! `bigip-api` types directly.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use bigip_api::{RetryPolicy, TlsMode, TransportConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Device config ───────────────────────────────────────────────────

/// TLS verification mode for the management endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TlsVerification {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate (PEM file).
    CustomCa { ca_file: PathBuf },
    /// Accept any certificate. The default: management certs are almost
    /// always self-signed.
    #[default]
    InsecureSkipVerify,
}

/// Connection parameters for one appliance.
#[derive(Debug, Deserialize)]
pub struct DeviceConfig {
    /// Management endpoint base URL (e.g. "https://bigip1.example.net").
    pub url: String,

    pub username: String,
    pub password: SecretString,

    /// Total attempts per request, including the first.
    #[serde(default = "default_max_retries")]
    pub max_request_retries: u32,

    /// Exponential backoff seed between attempts.
    #[serde(default = "default_backoff_seconds")]
    pub retry_backoff_seconds: u64,

    /// HTTP statuses retried as transient.
    #[serde(default = "default_retry_on_status")]
    pub retry_on_status: Vec<u16>,

    /// Per-request timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default)]
    pub tls: TlsVerification,
}

fn default_max_retries() -> u32 {
    3
}
fn default_backoff_seconds() -> u64 {
    2
}
fn default_retry_on_status() -> Vec<u16> {
    vec![408, 429, 500, 502, 503, 504]
}
fn default_timeout_seconds() -> u64 {
    30
}

impl DeviceConfig {
    /// Load from `bigtop.toml` in the working directory (or the user
    /// config directory) layered under `BIGTOP_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::new();
        if let Some(path) = Self::config_path() {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment
            .merge(Toml::file("bigtop.toml"))
            .merge(Env::prefixed("BIGTOP_"));
        Self::from_figment(figment)
    }

    /// Load from an explicit figment (tests, embedders with their own
    /// providers).
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The user-level config file, if a home directory exists.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "nexxos", "bigtop")
            .map(|dirs| dirs.config_dir().join("bigtop.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        if self.username.is_empty() {
            return Err(ConfigError::Validation {
                field: "username".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.password.expose_secret().is_empty() {
            return Err(ConfigError::Validation {
                field: "password".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.max_request_retries == 0 {
            return Err(ConfigError::Validation {
                field: "max_request_retries".into(),
                reason: "at least one attempt is required".into(),
            });
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.url).map_err(|e| ConfigError::Validation {
            field: "url".into(),
            reason: e.to_string(),
        })
    }

    // ── Translation to bigip-api types ───────────────────────────────

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_request_retries,
            backoff: Duration::from_secs(self.retry_backoff_seconds),
            retry_on_status: self.retry_on_status.clone(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::System => TlsMode::System,
                TlsVerification::CustomCa { ca_file } => TlsMode::CustomCa(ca_file.clone()),
                TlsVerification::InsecureSkipVerify => TlsMode::DangerAcceptInvalid,
            },
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use figment::providers::{Env, Format, Toml};

    use super::*;

    const MINIMAL: &str = r#"
url = "https://bigip1.example.net"
username = "monitor"
password = "hunter2"
"#;

    #[test]
    fn minimal_config_gets_retry_defaults() {
        let config =
            DeviceConfig::from_figment(Figment::new().merge(Toml::string(MINIMAL))).unwrap();

        assert_eq!(config.max_request_retries, 3);
        assert_eq!(config.retry_backoff_seconds, 2);
        assert_eq!(config.retry_on_status, vec![408, 429, 500, 502, 503, 504]);
        assert_eq!(config.timeout_seconds, 30);
        assert!(matches!(config.tls, TlsVerification::InsecureSkipVerify));

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Duration::from_secs(2));
    }

    #[test]
    fn env_overrides_toml() {
        Jail::expect_with(|jail| {
            jail.create_file("bigtop.toml", MINIMAL)?;
            jail.set_env("BIGTOP_MAX_REQUEST_RETRIES", "5");
            jail.set_env("BIGTOP_USERNAME", "ops");

            let config = DeviceConfig::from_figment(
                Figment::new()
                    .merge(Toml::file("bigtop.toml"))
                    .merge(Env::prefixed("BIGTOP_")),
            )
            .expect("config should load");

            assert_eq!(config.max_request_retries, 5);
            assert_eq!(config.username, "ops");
            Ok(())
        });
    }

    #[test]
    fn invalid_url_fails_validation() {
        let toml = r#"
url = "not a url"
username = "monitor"
password = "hunter2"
"#;
        let result = DeviceConfig::from_figment(Figment::new().merge(Toml::string(toml)));
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "url"
        ));
    }

    #[test]
    fn empty_credentials_fail_validation() {
        let toml = r#"
url = "https://bigip1.example.net"
username = ""
password = "hunter2"
"#;
        let result = DeviceConfig::from_figment(Figment::new().merge(Toml::string(toml)));
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "username"
        ));
    }
}
