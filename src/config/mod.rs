//! Network settings — the read-only defaults every call is merged against.
//!
//! Settings are usually deserialized from the host application's configuration
//! document. Field names follow that document's camelCase convention
//! (`baseURL`, `withCredentials`) and `timeout` is expressed in milliseconds.
//!
//! ```
//! use std::time::Duration;
//! use fetchward::config::NetworkSettings;
//!
//! let settings = NetworkSettings::from_json_str(
//!     r#"{ "baseURL": "https://api.example.com", "timeout": 5000, "withCredentials": true }"#,
//! ).unwrap();
//!
//! assert!(settings.enabled);
//! assert_eq!(settings.timeout, Some(Duration::from_millis(5000)));
//! assert_eq!(settings.retry, Some(0));
//! assert!(settings.advisories().is_empty());
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::Headers;

/// Default per-request timeout when the settings document does not specify one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Errors produced while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid network settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Module-wide network defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkSettings {
    /// When `false`, calls still proceed but each one logs an advisory.
    pub enabled: bool,
    /// Prefix the transport resolves relative URLs against. Empty means none.
    #[serde(rename = "baseURL")]
    pub base_url: String,
    #[serde(with = "millis")]
    pub timeout: Option<Duration>,
    pub retry: Option<u32>,
    pub headers: Headers,
    /// Forward credentials (cookies) on every call that does not choose a policy itself.
    pub with_credentials: bool,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: String::new(),
            timeout: Some(DEFAULT_TIMEOUT),
            retry: Some(0),
            headers: Headers::new(),
            with_credentials: false,
        }
    }
}

impl NetworkSettings {
    /// Parses settings from a JSON document. Missing fields take their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Parses settings from an already-decoded JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns the non-fatal configuration problems these settings carry.
    ///
    /// None of these block a request; they are logged so misconfiguration is
    /// visible before the first call fails against the wrong host.
    pub fn advisories(&self) -> Vec<Advisory> {
        let mut advisories = Vec::new();
        if !self.enabled {
            advisories.push(Advisory::Disabled);
        } else if self.base_url.is_empty() {
            advisories.push(Advisory::MissingBaseUrl);
        }
        advisories
    }
}

/// A non-fatal configuration warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    /// The network module is disabled, yet requests will still be attempted.
    Disabled,
    /// The network module is enabled without a base URL.
    MissingBaseUrl,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::Disabled => f.write_str("network module is disabled; requests are still attempted"),
            Advisory::MissingBaseUrl => {
                f.write_str("network module is enabled but no baseURL is configured")
            }
        }
    }
}

// Option<Duration> <-> optional integer milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_empty_document() {
        let parsed = NetworkSettings::from_json_str("{}").unwrap();
        assert_eq!(parsed, NetworkSettings::default());
        assert_eq!(parsed.timeout, Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn null_timeout_defers_to_transport() {
        let parsed = NetworkSettings::from_json_str(r#"{"timeout": null, "retry": null}"#).unwrap();
        assert_eq!(parsed.timeout, None);
        assert_eq!(parsed.retry, None);
    }

    #[test]
    fn headers_and_flags_are_read() {
        let parsed = NetworkSettings::from_json_value(serde_json::json!({
            "enabled": false,
            "headers": { "X-Client": "web" },
            "withCredentials": true
        }))
        .unwrap();
        assert!(!parsed.enabled);
        assert!(parsed.with_credentials);
        assert_eq!(parsed.headers.get("x-client"), Some("web"));
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = NetworkSettings::from_json_str(r#"{"timeout": "soon"}"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid network settings"));
    }

    #[test]
    fn advisories() {
        assert_eq!(
            NetworkSettings::default().advisories(),
            vec![Advisory::MissingBaseUrl]
        );
        assert_eq!(
            NetworkSettings::default().enabled(false).advisories(),
            vec![Advisory::Disabled]
        );
        assert!(
            NetworkSettings::default()
                .base_url("https://api.example.com")
                .advisories()
                .is_empty()
        );
    }
}
