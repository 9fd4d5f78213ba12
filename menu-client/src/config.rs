//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default path of the menu document on menu-server
pub const DEFAULT_PRODUCTS_PATH: &str = "api/products";

/// Client configuration for connecting to menu-server
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:3001")
    pub base_url: String,

    /// Path of the menu document, relative to `base_url`
    pub products_path: String,

    /// Full version-check URL; derived from `products_path` when `None`
    pub version_url: Option<String>,

    /// JWT token for admin calls
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            products_path: DEFAULT_PRODUCTS_PATH.to_string(),
            version_url: None,
            token: None,
            timeout: 30,
        }
    }

    pub fn with_products_path(mut self, path: impl Into<String>) -> Self {
        self.products_path = path.into();
        self
    }

    /// Poll a different endpoint for version tokens
    pub fn with_version_url(mut self, url: impl Into<String>) -> Self {
        self.version_url = Some(url.into());
        self
    }

    /// Set the JWT token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Absolute URL of the menu document
    pub fn products_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.products_path.trim_start_matches('/')
        )
    }

    /// Absolute URL polled by the change detector
    pub fn version_check_url(&self) -> String {
        self.version_url
            .clone()
            .unwrap_or_else(|| format!("{}?action=version_check", self.products_url()))
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self) -> crate::ClientResult<crate::NetworkHttpClient> {
        crate::NetworkHttpClient::from_config(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:3001")
    }
}

/// Change detector settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangeDetectorConfig {
    /// Polling disabled means `start_polling` is a no-op
    pub enabled: bool,
    /// Time between checks
    #[serde(with = "millis")]
    pub interval: Duration,
    /// Delay between `on_change` and `reload`
    #[serde(with = "millis")]
    pub reload_delay: Duration,
}

impl ChangeDetectorConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_reload_delay(mut self, delay: Duration) -> Self {
        self.reload_delay = delay;
        self
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for ChangeDetectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(5),
            reload_delay: Duration::from_millis(500),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let config = ClientConfig::new("http://menu.local/");
        assert_eq!(config.products_url(), "http://menu.local/api/products");
        assert_eq!(
            config.version_check_url(),
            "http://menu.local/api/products?action=version_check"
        );

        let config = config.with_version_url("http://cdn.local/version.json");
        assert_eq!(config.version_check_url(), "http://cdn.local/version.json");
    }

    #[test]
    fn test_detector_config_from_json() {
        let config: ChangeDetectorConfig =
            serde_json::from_str(r#"{"interval": 10000}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.reload_delay, Duration::from_millis(500));
    }
}
