//! Classifier client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default classifier endpoint
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000";

/// Default request timeout (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout (5 seconds)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Settings for [`HttpClassifier`](crate::HttpClassifier)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Base URL of the service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Path of the analysis route
    #[serde(default = "default_analyze_path")]
    pub analyze_path: String,

    /// Path of the health route
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Whole-request timeout, including reading the body
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for establishing the connection
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_analyze_path() -> String {
    "/analyze".to_string()
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            analyze_path: default_analyze_path(),
            health_path: default_health_path(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl ClassifierConfig {
    /// Configuration for an endpoint with default paths and timeouts
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Full URL of the analysis route
    pub fn analyze_url(&self) -> String {
        join(&self.endpoint, &self.analyze_path)
    }

    /// Full URL of the health route
    pub fn health_url(&self) -> String {
        join(&self.endpoint, &self.health_path)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if self.connect_timeout_secs == 0 {
            return Err("connect_timeout_secs must be greater than 0".to_string());
        }
        if self.connect_timeout_secs > self.request_timeout_secs {
            return Err("connect_timeout_secs must not exceed request_timeout_secs".to_string());
        }
        Ok(())
    }
}

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
