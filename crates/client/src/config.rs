//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Host used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Versioned path prefix appended to the host
pub const API_V1_PREFIX: &str = "/api/v1";

/// Request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Storage key holding the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Where the browser is sent after a 401
pub const LOGIN_PATH: &str = "/auth/login";

/// Environment variable overriding the API host
pub const API_BASE_URL_ENV: &str = "PORTAL_API_BASE_URL";

/// Portal client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API host, without the versioned prefix
    pub api_base_url: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Storage key for the persisted token
    pub token_key: String,

    /// Redirect target after an unauthorized response
    pub login_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            token_key: ACCESS_TOKEN_KEY.to_string(),
            login_path: LOGIN_PATH.to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults with `PORTAL_API_BASE_URL` applied when set
    pub fn from_env() -> Self {
        Self::default().with_base_url_override(std::env::var(API_BASE_URL_ENV).ok())
    }

    fn with_base_url_override(mut self, host: Option<String>) -> Self {
        if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
            self.api_base_url = host;
        }
        self
    }

    /// Set the API host
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Full URL every request path is appended to
    pub fn api_url(&self) -> String {
        format!(
            "{}{API_V1_PREFIX}",
            self.api_base_url.trim().trim_end_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
