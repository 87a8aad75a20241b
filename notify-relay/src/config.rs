//! Relay Configuration
//!
//! Read once from environment variables at startup. Provider credentials
//! are loaded separately through `notify_core::ProviderCredentials`.

use std::net::SocketAddr;
use std::time::Duration;

use notify_core::provider::{ProviderConfig, DEFAULT_PROVIDER_BASE_URL};
use notify_core::RelayOptions;
use thiserror::Error;

use crate::rate_limit::DEFAULT_MAX_CLIENTS;

/// Configuration errors. Any of these aborts startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Relay server configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address the relay endpoint listens on.
    pub listen_addr: SocketAddr,
    /// Address of the health/metrics listener.
    pub http_addr: SocketAddr,
    /// Messaging provider API base URL.
    pub provider_base_url: String,
    /// Upper bound on a single provider call.
    pub provider_timeout_secs: u64,
    /// Sends allowed per client per minute (0 disables limiting).
    pub rate_limit_per_min: u32,
    /// Most clients the rate limiter tracks at once.
    pub rate_limit_max_clients: usize,
    /// Key rate limiting on `X-Forwarded-For` (only behind a trusted proxy).
    pub trust_forwarded_for: bool,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Bearer token protecting `/metrics`, if set.
    pub metrics_token: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        let listen_addr: SocketAddr = ([0, 0, 0, 0], 8080).into();
        RelayConfig {
            listen_addr,
            http_addr: SocketAddr::new(listen_addr.ip(), 8081),
            provider_base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            provider_timeout_secs: 10,
            rate_limit_per_min: 60,
            rate_limit_max_clients: DEFAULT_MAX_CLIENTS,
            trust_forwarded_for: false,
            max_body_bytes: 64 * 1024,
            metrics_token: None,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`; unset values take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RelayConfig::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let listen_addr = match get("RELAY_LISTEN_ADDR") {
            Some(v) => parse_var("RELAY_LISTEN_ADDR", &v, "expected host:port")?,
            None => defaults.listen_addr,
        };

        // The operational listener follows the relay's host unless overridden
        let http_addr = match get("RELAY_HTTP_ADDR") {
            Some(v) => parse_var("RELAY_HTTP_ADDR", &v, "expected host:port")?,
            None => SocketAddr::new(listen_addr.ip(), defaults.http_addr.port()),
        };

        let provider_base_url = get("TWILIO_API_BASE").unwrap_or(defaults.provider_base_url);

        let provider_timeout_secs = match get("RELAY_PROVIDER_TIMEOUT_SECS") {
            Some(v) => {
                let secs: u64 = parse_var("RELAY_PROVIDER_TIMEOUT_SECS", &v, "expected seconds")?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        var: "RELAY_PROVIDER_TIMEOUT_SECS",
                        value: v,
                        reason: "timeout must be positive",
                    });
                }
                secs
            }
            None => defaults.provider_timeout_secs,
        };

        let rate_limit_per_min = match get("RELAY_RATE_LIMIT_PER_MIN") {
            Some(v) => parse_var("RELAY_RATE_LIMIT_PER_MIN", &v, "expected integer")?,
            None => defaults.rate_limit_per_min,
        };

        let rate_limit_max_clients = match get("RELAY_RATE_LIMIT_MAX_CLIENTS") {
            Some(v) => parse_var("RELAY_RATE_LIMIT_MAX_CLIENTS", &v, "expected integer")?,
            None => defaults.rate_limit_max_clients,
        };

        let trust_forwarded_for = match get("RELAY_TRUST_FORWARDED_FOR") {
            Some(v) => parse_var("RELAY_TRUST_FORWARDED_FOR", &v, "expected true or false")?,
            None => defaults.trust_forwarded_for,
        };

        let max_body_bytes = match get("RELAY_MAX_BODY_BYTES") {
            Some(v) => parse_var("RELAY_MAX_BODY_BYTES", &v, "expected byte count")?,
            None => defaults.max_body_bytes,
        };

        Ok(RelayConfig {
            listen_addr,
            http_addr,
            provider_base_url,
            provider_timeout_secs,
            rate_limit_per_min,
            rate_limit_max_clients,
            trust_forwarded_for,
            max_body_bytes,
            metrics_token: get("RELAY_METRICS_TOKEN"),
        })
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// HTTP client settings for the provider.
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::default()
            .with_base_url(self.provider_base_url.clone())
            .with_timeout(self.provider_timeout())
    }

    pub fn relay_options(&self) -> RelayOptions {
        RelayOptions {
            provider_timeout: self.provider_timeout(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    var: &'static str,
    value: &str,
    reason: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason,
    })
}
