use anyhow::{Context, Result};
use std::time::Duration;

/// Default path of the credential refresh endpoint
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// Default login route used when the refresh protocol fails
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Default storage key for the access credential
pub const DEFAULT_ACCESS_TOKEN_KEY: &str = "portal:access-token";

/// Default storage key for the refresh credential
pub const DEFAULT_REFRESH_TOKEN_KEY: &str = "portal:refresh-token";

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base origin requests are sent to, without trailing slash
    pub base_url: String,

    /// Path of the refresh endpoint, relative to the base origin
    pub refresh_path: String,

    /// Login route used when the refresh protocol fails
    pub login_route: String,

    /// Storage key for the access credential
    pub access_token_key: String,

    /// Storage key for the refresh credential
    pub refresh_token_key: String,

    /// TCP connect timeout in seconds
    pub connect_timeout: u64,

    /// Whole-request timeout in seconds
    pub request_timeout: u64,
}

impl ClientConfig {
    /// Create a configuration for the given origin with default settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            access_token_key: DEFAULT_ACCESS_TOKEN_KEY.to_string(),
            refresh_token_key: DEFAULT_REFRESH_TOKEN_KEY.to_string(),
            connect_timeout: 30,
            request_timeout: 300,
        }
    }

    /// Load configuration from the environment with priority: ENV > defaults
    ///
    /// Reads a `.env` file if one exists. `PORTAL_API_URL` is required,
    /// everything else falls back to defaults.
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let base_url = std::env::var("PORTAL_API_URL")
            .context("PORTAL_API_URL is required (set it in the environment or .env)")?;

        let config = Self {
            base_url: base_url.trim_end_matches('/').to_string(),

            refresh_path: env_or("PORTAL_REFRESH_PATH", DEFAULT_REFRESH_PATH),

            login_route: env_or("PORTAL_LOGIN_ROUTE", DEFAULT_LOGIN_ROUTE),

            access_token_key: env_or("PORTAL_ACCESS_TOKEN_KEY", DEFAULT_ACCESS_TOKEN_KEY),

            refresh_token_key: env_or("PORTAL_REFRESH_TOKEN_KEY", DEFAULT_REFRESH_TOKEN_KEY),

            connect_timeout: std::env::var("HTTP_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),

            request_timeout: std::env::var("HTTP_REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("base_url must be an http(s) origin: {}", self.base_url);
        }

        if !self.refresh_path.starts_with('/') {
            anyhow::bail!("refresh_path must start with '/': {}", self.refresh_path);
        }

        if !self.login_route.starts_with('/') {
            anyhow::bail!("login_route must start with '/': {}", self.login_route);
        }

        Ok(())
    }

    pub(crate) fn connect_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub(crate) fn request_duration(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Read an environment variable with a fallback default
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_defaults() {
        let config = ClientConfig::new("https://api.example.com/");
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.refresh_path, "/auth/refresh");
        assert_eq!(config.login_route, "/login");
        assert_eq!(config.access_token_key, "portal:access-token");
        assert_eq!(config.refresh_token_key, "portal:refresh-token");
        assert_eq!(config.connect_timeout, 30);
        assert_eq!(config.request_timeout, 300);
    }

    #[test]
    fn test_validate_accepts_http_and_https() {
        assert!(ClientConfig::new("http://localhost:8080").validate().is_ok());
        assert!(ClientConfig::new("https://api.example.com")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_origin() {
        let config = ClientConfig::new("api.example.com");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_relative_routes() {
        let mut config = ClientConfig::new("https://api.example.com");
        config.login_route = "login".to_string();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::new("https://api.example.com");
        config.refresh_path = "auth/refresh".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_overrides_and_defaults() {
        // Single test mutates the process environment to avoid races
        // between parallel test threads.
        std::env::set_var("PORTAL_API_URL", "https://env.example.com/");
        std::env::set_var("PORTAL_LOGIN_ROUTE", "/sign-in");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, "https://env.example.com");
        assert_eq!(config.login_route, "/sign-in");
        assert_eq!(config.refresh_path, "/auth/refresh");

        std::env::remove_var("PORTAL_LOGIN_ROUTE");
        std::env::remove_var("PORTAL_API_URL");

        assert!(ClientConfig::from_env().is_err());
    }
}
