//! Client configuration.
//!
//! # Design
//! Configuration is plain data owned by the caller and frozen once a client
//! is built. The test-mode flag is what lets a client talk to a plain-HTTP
//! base URL (the sandbox, or a local mock); production clients must use TLS.

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ApiError;

pub const PRODUCTION_API_URL: &str = "https://api.authy.com";
pub const SANDBOX_API_URL: &str = "http://sandbox-api.authy.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub test_mode: bool,
    /// Whole-request timeout. `None` leaves it to the transport.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

// Hand-written so the API key never lands in logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("test_mode", &self.test_mode)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: PRODUCTION_API_URL.to_string(),
            test_mode: false,
            timeout: Some(DEFAULT_TIMEOUT),
            user_agent: format!("authy-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Configuration for the public sandbox, with test mode on.
    pub fn sandbox(api_key: impl Into<String>) -> Self {
        Self::new(api_key)
            .with_base_url(SANDBOX_API_URL)
            .with_test_mode(true)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Read `AUTHY_API_KEY` (required), `AUTHY_API_URL`, `AUTHY_TEST_MODE`
    /// and `AUTHY_TIMEOUT_SECS` from the environment.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let api_key = lookup("AUTHY_API_KEY")
            .ok_or_else(|| ApiError::InvalidConfig("AUTHY_API_KEY must be set".to_string()))?;
        let mut config = Self::new(api_key);

        if let Some(flag) = lookup("AUTHY_TEST_MODE") {
            config.test_mode = parse_flag(&flag).ok_or_else(|| {
                ApiError::InvalidConfig(format!("AUTHY_TEST_MODE is not a boolean: {flag:?}"))
            })?;
            if config.test_mode {
                config.base_url = SANDBOX_API_URL.to_string();
            }
        }
        if let Some(url) = lookup("AUTHY_API_URL") {
            config = config.with_base_url(&url);
        }
        if let Some(secs) = lookup("AUTHY_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ApiError::InvalidConfig(format!("AUTHY_TIMEOUT_SECS is not a number: {secs:?}"))
            })?;
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the key is present and the base URL is usable.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.api_key.trim().is_empty() {
            return Err(ApiError::InvalidConfig("API key is empty".to_string()));
        }
        let url = Url::parse(&self.base_url)?;
        match url.scheme() {
            "https" => Ok(()),
            "http" if self.test_mode => Ok(()),
            "http" => Err(ApiError::InvalidConfig(format!(
                "plain HTTP base URL {} requires test mode",
                self.base_url
            ))),
            other => Err(ApiError::InvalidConfig(format!("unsupported URL scheme {other:?}"))),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn production_defaults() {
        let config = ClientConfig::new("key");
        assert_eq!(config.base_url, PRODUCTION_API_URL);
        assert!(!config.test_mode);
        assert_eq!(config.timeout, Some(DEFAULT_TIMEOUT));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sandbox_enables_test_mode() {
        let config = ClientConfig::sandbox("key");
        assert_eq!(config.base_url, SANDBOX_API_URL);
        assert!(config.test_mode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn plain_http_requires_test_mode() {
        let config = ClientConfig::new("key").with_base_url("http://127.0.0.1:3000");
        assert!(matches!(config.validate(), Err(ApiError::InvalidConfig(_))));
        assert!(config.with_test_mode(true).validate().is_ok());
    }

    #[test]
    fn empty_key_is_rejected() {
        let config = ClientConfig::new("  ");
        assert!(matches!(config.validate(), Err(ApiError::InvalidConfig(_))));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::new("key").with_base_url("https://api.authy.com/");
        assert_eq!(config.base_url, "https://api.authy.com");
    }

    #[test]
    fn debug_output_redacts_key() {
        let rendered = format!("{:?}", ClientConfig::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn env_requires_api_key() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ApiError::InvalidConfig(_)));
    }

    #[test]
    fn env_test_mode_switches_to_sandbox() {
        let config =
            ClientConfig::from_lookup(lookup(&[("AUTHY_API_KEY", "k"), ("AUTHY_TEST_MODE", "true")]))
                .unwrap();
        assert!(config.test_mode);
        assert_eq!(config.base_url, SANDBOX_API_URL);
    }

    #[test]
    fn env_overrides_url_and_timeout() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("AUTHY_API_KEY", "k"),
            ("AUTHY_TEST_MODE", "1"),
            ("AUTHY_API_URL", "http://localhost:4000/"),
            ("AUTHY_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:4000");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn env_rejects_bad_values() {
        let bad_flag =
            ClientConfig::from_lookup(lookup(&[("AUTHY_API_KEY", "k"), ("AUTHY_TEST_MODE", "maybe")]));
        assert!(matches!(bad_flag, Err(ApiError::InvalidConfig(_))));

        let bad_timeout =
            ClientConfig::from_lookup(lookup(&[("AUTHY_API_KEY", "k"), ("AUTHY_TIMEOUT_SECS", "soon")]));
        assert!(matches!(bad_timeout, Err(ApiError::InvalidConfig(_))));
    }

    #[test]
    fn env_http_url_without_test_mode_fails_validation() {
        let result = ClientConfig::from_lookup(lookup(&[
            ("AUTHY_API_KEY", "k"),
            ("AUTHY_API_URL", "http://localhost:4000"),
        ]));
        assert!(matches!(result, Err(ApiError::InvalidConfig(_))));
    }
}
