//! Sync client configuration

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::Backoff;

/// Endpoints and tuning for a market sync session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// GraphQL HTTP endpoint (queries and mutations)
    #[serde(default = "default_http_url")]
    pub http_url: String,
    /// GraphQL WebSocket endpoint (subscriptions)
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Bearer token sent on both transports
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Markets per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Port the HTTP API listens on
    #[serde(default = "default_server_port")]
    pub server_port: u16,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            http_url: default_http_url(),
            ws_url: default_ws_url(),
            auth_token: None,
            page_size: default_page_size(),
            reconnect_base_ms: default_reconnect_base_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            server_port: default_server_port(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables
    ///
    /// Reads (all optional):
    /// - ODDSSYNC_HTTP_URL, ODDSSYNC_WS_URL: service endpoints
    /// - ODDSSYNC_AUTH_TOKEN: bearer token
    /// - ODDSSYNC_PAGE_SIZE: markets per page
    /// - ODDSSYNC_RECONNECT_BASE_MS, ODDSSYNC_RECONNECT_MAX_MS: backoff bounds
    /// - ODDSSYNC_REQUEST_TIMEOUT_SECS: HTTP request timeout
    /// - SERVER_PORT: API listen port
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            http_url: get("ODDSSYNC_HTTP_URL").unwrap_or_else(default_http_url),
            ws_url: get("ODDSSYNC_WS_URL").unwrap_or_else(default_ws_url),
            auth_token: get("ODDSSYNC_AUTH_TOKEN"),
            page_size: parse_or(get("ODDSSYNC_PAGE_SIZE"), "ODDSSYNC_PAGE_SIZE", default_page_size())?,
            reconnect_base_ms: parse_or(
                get("ODDSSYNC_RECONNECT_BASE_MS"),
                "ODDSSYNC_RECONNECT_BASE_MS",
                default_reconnect_base_ms(),
            )?,
            reconnect_max_ms: parse_or(
                get("ODDSSYNC_RECONNECT_MAX_MS"),
                "ODDSSYNC_RECONNECT_MAX_MS",
                default_reconnect_max_ms(),
            )?,
            request_timeout_secs: parse_or(
                get("ODDSSYNC_REQUEST_TIMEOUT_SECS"),
                "ODDSSYNC_REQUEST_TIMEOUT_SECS",
                default_request_timeout_secs(),
            )?,
            server_port: parse_or(get("SERVER_PORT"), "SERVER_PORT", default_server_port())?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "ODDSSYNC_PAGE_SIZE".to_string(),
                error: "must be greater than zero".to_string(),
            });
        }
        if self.reconnect_base_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "ODDSSYNC_RECONNECT_BASE_MS".to_string(),
                error: "must be greater than zero".to_string(),
            });
        }
        if self.reconnect_max_ms < self.reconnect_base_ms {
            return Err(ConfigError::OutOfRange {
                field: "ODDSSYNC_RECONNECT_MAX_MS".to_string(),
                error: "must not be below the base delay".to_string(),
            });
        }
        if !self.ws_url.starts_with("ws://") && !self.ws_url.starts_with("wss://") {
            return Err(ConfigError::OutOfRange {
                field: "ODDSSYNC_WS_URL".to_string(),
                error: format!("expected a ws:// or wss:// URL, got {}", self.ws_url),
            });
        }
        Ok(())
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.reconnect_base_ms),
            Duration::from_millis(self.reconnect_max_ms),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    field: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            field: field.to_string(),
            error: format!("{} ({})", e, raw),
        }),
        None => Ok(default),
    }
}

fn default_http_url() -> String {
    "http://localhost:8080/graphql".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:8080/graphql".to_string()
}

fn default_page_size() -> u32 {
    6
}

fn default_reconnect_base_ms() -> u64 {
    1_000
}

fn default_reconnect_max_ms() -> u64 {
    10_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_server_port() -> u16 {
    3001
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {error}")]
    InvalidValue { field: String, error: String },

    #[error("{field} out of range: {error}")]
    OutOfRange { field: String, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.page_size, 6);
        assert_eq!(config.backoff(), Backoff::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.server_port, 3001);
    }

    #[test]
    fn test_overrides() {
        let config = SyncConfig::from_lookup(lookup(&[
            ("ODDSSYNC_HTTP_URL", "https://api.example.com/graphql"),
            ("ODDSSYNC_WS_URL", "wss://api.example.com/graphql"),
            ("ODDSSYNC_AUTH_TOKEN", "tok"),
            ("ODDSSYNC_PAGE_SIZE", "12"),
            ("ODDSSYNC_RECONNECT_BASE_MS", "500"),
            ("ODDSSYNC_RECONNECT_MAX_MS", "4000"),
            ("SERVER_PORT", "8081"),
        ]))
        .unwrap();

        assert_eq!(config.page_size, 12);
        assert_eq!(config.auth_token.as_deref(), Some("tok"));
        assert_eq!(config.backoff().delay(3), Duration::from_millis(4000));
        assert_eq!(config.server_port, 8081);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = SyncConfig::from_lookup(lookup(&[("ODDSSYNC_AUTH_TOKEN", "  ")])).unwrap();
        assert_eq!(config.auth_token, None);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            SyncConfig::from_lookup(lookup(&[("ODDSSYNC_PAGE_SIZE", "six")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            SyncConfig::from_lookup(lookup(&[("SERVER_PORT", "70000")])),
            Err(ConfigError::InvalidValue { field, .. }) if field == "SERVER_PORT"
        ));
        assert!(matches!(
            SyncConfig::from_lookup(lookup(&[("ODDSSYNC_PAGE_SIZE", "0")])),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            SyncConfig::from_lookup(lookup(&[
                ("ODDSSYNC_RECONNECT_BASE_MS", "5000"),
                ("ODDSSYNC_RECONNECT_MAX_MS", "1000"),
            ])),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            SyncConfig::from_lookup(lookup(&[("ODDSSYNC_WS_URL", "http://localhost")])),
            Err(ConfigError::OutOfRange { .. })
        ));
    }
}
