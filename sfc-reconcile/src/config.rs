//! Cloud connection settings.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("network endpoint is required (--endpoint or OS_NETWORK_ENDPOINT)")]
    MissingEndpoint,

    #[error("invalid network endpoint '{0}': expected an http:// or https:// URL")]
    InvalidEndpoint(String),

    #[error("timeout must be greater than zero")]
    InvalidTimeout,
}

/// Where and how to reach the Neutron API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudConfig {
    /// Network endpoint without trailing slash (e.g. `https://neutron:9696`).
    pub endpoint: String,
    /// Pre-issued Keystone token, sent as `X-Auth-Token`.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl CloudConfig {
    pub fn new(
        endpoint: Option<&str>,
        token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ConfigError> {
        let endpoint = endpoint
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(ConfigError::MissingEndpoint)?;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
        }
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
