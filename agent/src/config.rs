//! Agent configuration.
//!
//! An [`AgentConfigBuilder`] assembles defaults plus overrides into an
//! immutable [`AgentConfig`], which [`AgentConfig::load_from_toml`] can
//! populate from a TOML file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Lower bound accepted for `poll_interval_min` and the default value used
/// when a config omits it entirely.
pub const DEFAULT_POLL_INTERVAL_MIN: Duration = Duration::from_secs(2 * 60);
/// Upper bound: `poll_interval_max` must stay strictly below 720 minutes.
pub const POLL_INTERVAL_MAX_CEILING: Duration = Duration::from_secs(720 * 60);
/// Default `poll_interval_max` when a config omits it.
pub const DEFAULT_POLL_INTERVAL_MAX: Duration = Duration::from_secs(60 * 60);
/// Cadence used before the server has ever supplied a `sleep` value.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Per-request receive timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
/// Maximum DNS resolution attempts before giving up with a networking error.
pub const RESOLVE_MAX_ATTEMPTS: usize = 10;
/// Pause between resolution attempts.
pub const RESOLVE_RETRY_PAUSE: Duration = Duration::from_millis(1);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}")]
    Read {
        path: String,
        #[source]
        error: std::io::Error,
    },

    #[error("could not parse config file {path}")]
    Parse {
        path: String,
        #[source]
        error: toml::de::Error,
    },

    #[error("could not load CA certificate {path}")]
    Certificate {
        path: String,
        #[source]
        error: std::io::Error,
    },

    #[error("could not parse CA certificate {path}")]
    InvalidCertificate {
        path: String,
        #[source]
        error: reqwest::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// On-disk representation loaded via `toml`, deliberately permissive
/// (everything but the endpoint and board id has a default) so a minimal
/// config file is enough to get started.
#[derive(Debug, Deserialize)]
struct RawAgentConfig {
    server_host: String,
    server_port: u16,
    #[serde(default)]
    tls_enabled: bool,
    ca_certificate_path: Option<String>,
    #[serde(default)]
    poll_interval_min_secs: Option<u64>,
    #[serde(default)]
    poll_interval_max_secs: Option<u64>,
    #[serde(default)]
    poll_interval_default_secs: Option<u64>,
    board: String,
}

/// Fully resolved, immutable agent configuration.
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into), build_fn(validate = "AgentConfig::validate_builder"))]
pub struct AgentConfig {
    /// Target server hostname, used both for the connection and for SNI.
    pub server_host: String,
    /// Target server port.
    pub server_port: u16,
    /// Board identifier interpolated into URLs.
    pub board: String,

    /// Use TLS 1.2+ with a pinned CA credential.
    #[builder(default = "false")]
    pub tls_enabled: bool,
    /// Pinned CA credential. Required when `tls_enabled` is set.
    #[builder(default, setter(strip_option))]
    pub ca_certificate: Option<reqwest::Certificate>,

    #[builder(default = "DEFAULT_POLL_INTERVAL_MIN")]
    pub poll_interval_min: Duration,
    #[builder(default = "DEFAULT_POLL_INTERVAL_MAX")]
    pub poll_interval_max: Duration,
    #[builder(default = "DEFAULT_POLL_INTERVAL")]
    pub poll_interval_default: Duration,
}

impl AgentConfigBuilder {
    fn validate_builder(&self) -> Result<(), String> {
        let min = self.poll_interval_min.unwrap_or(DEFAULT_POLL_INTERVAL_MIN);
        let max = self.poll_interval_max.unwrap_or(DEFAULT_POLL_INTERVAL_MAX);
        if min >= max {
            return Err(format!(
                "poll_interval_min ({min:?}) must be less than poll_interval_max ({max:?})"
            ));
        }
        if max >= POLL_INTERVAL_MAX_CEILING {
            return Err(format!(
                "poll_interval_max ({max:?}) must be less than 720 minutes"
            ));
        }
        if min < DEFAULT_POLL_INTERVAL_MIN {
            return Err(format!(
                "poll_interval_min ({min:?}) must be at least 2 minutes"
            ));
        }
        let tls_enabled = self.tls_enabled.unwrap_or(false);
        let has_ca_certificate = self
            .ca_certificate
            .as_ref()
            .is_some_and(|cert| cert.is_some());
        if tls_enabled && !has_ca_certificate {
            return Err("tls_enabled requires a ca_certificate to be set".to_string());
        }
        Ok(())
    }
}

impl AgentConfig {
    /// Loads configuration from a TOML file on disk.
    pub fn load_from_toml(path: &Path) -> Result<AgentConfig, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.display().to_string(),
            error,
        })?;
        let raw: RawAgentConfig = toml::from_str(&text).map_err(|error| ConfigError::Parse {
            path: path.display().to_string(),
            error,
        })?;

        let mut builder = AgentConfigBuilder::default();
        builder
            .server_host(raw.server_host)
            .server_port(raw.server_port)
            .board(raw.board)
            .tls_enabled(raw.tls_enabled);

        if let Some(secs) = raw.poll_interval_min_secs {
            builder.poll_interval_min(Duration::from_secs(secs));
        }
        if let Some(secs) = raw.poll_interval_max_secs {
            builder.poll_interval_max(Duration::from_secs(secs));
        }
        if let Some(secs) = raw.poll_interval_default_secs {
            builder.poll_interval_default(Duration::from_secs(secs));
        }
        if let Some(cert_path) = raw.ca_certificate_path {
            let pem = std::fs::read(&cert_path).map_err(|error| ConfigError::Certificate {
                path: cert_path.clone(),
                error,
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|error| {
                ConfigError::InvalidCertificate {
                    path: cert_path,
                    error,
                }
            })?;
            builder.ca_certificate(cert);
        }

        builder
            .build()
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}
