//! Application configuration loaded from environment variables.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Gateway configuration.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `8080`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `text` or `json` (default: `text`)
/// - `LIBRARY_ADDRESS`, `RESERVATION_ADDRESS`, `RATING_ADDRESS` — base URLs
///   of the downstream services (required)
/// - `RETRY_DELAY_SECS` — minimum wait before a retry is processed (default: `10`)
/// - `REQUEST_TIMEOUT_SECS` — inbound and outbound request deadline (default: `30`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub library_address: String,
    pub reservation_address: String,
    pub rating_address: String,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for
    /// optional values. Unparseable optional values also fall back.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let secs = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
            library_address: required("LIBRARY_ADDRESS")?,
            reservation_address: required("RESERVATION_ADDRESS")?,
            rating_address: required("RATING_ADDRESS")?,
            retry_delay: secs("RETRY_DELAY_SECS", defaults.retry_delay),
            request_timeout: secs("REQUEST_TIMEOUT_SECS", defaults.request_timeout),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    /// Local development defaults, with the downstream services on their
    /// usual ports.
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            library_address: "http://localhost:8060".to_string(),
            reservation_address: "http://localhost:8070".to_string(),
            rating_address: "http://localhost:8050".to_string(),
            retry_delay: saga::DEFAULT_RETRY_DELAY,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const ADDRESSES: [(&str, &str); 3] = [
        ("LIBRARY_ADDRESS", "http://library:8060"),
        ("RESERVATION_ADDRESS", "http://reservation:8070"),
        ("RATING_ADDRESS", "http://rating:8050"),
    ];

    #[test]
    fn test_default_values() {
        let config = Config::from_lookup(env(&ADDRESSES)).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.retry_delay, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.library_address, "http://library:8060");
    }

    #[test]
    fn test_overrides() {
        let mut pairs = ADDRESSES.to_vec();
        pairs.extend([
            ("PORT", "9000"),
            ("LOG_FORMAT", "JSON"),
            ("RETRY_DELAY_SECS", "2"),
            ("REQUEST_TIMEOUT_SECS", "5"),
        ]);
        let config = Config::from_lookup(env(&pairs)).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_unparseable_port_falls_back() {
        let mut pairs = ADDRESSES.to_vec();
        pairs.push(("PORT", "eighty"));
        assert_eq!(Config::from_lookup(env(&pairs)).unwrap().port, 8080);
    }

    #[test]
    fn test_missing_address_is_an_error() {
        let err = Config::from_lookup(env(&ADDRESSES[..2])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("RATING_ADDRESS"));
    }

    #[test]
    fn test_blank_address_is_missing() {
        let mut pairs = ADDRESSES.to_vec();
        pairs[0] = ("LIBRARY_ADDRESS", "  ");
        let err = Config::from_lookup(env(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("LIBRARY_ADDRESS"));
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
