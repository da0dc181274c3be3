use std::time::Duration;

use derivative::Derivative;
use thiserror::Error;
use url::Url;

/// Configuration error, raised when [`crate::PushAdapter`] is constructed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// OneSignal application ID is absent or empty.
    #[error("trying to initialize OneSignal adapter without app ID")]
    MissingAppId,
    /// OneSignal REST API key is absent or empty.
    #[error("trying to initialize OneSignal adapter without API key")]
    MissingApiKey,
    /// Base URL of OneSignal API can not be parsed.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    /// HTTP client can not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// OneSignal credentials and endpoint. <https://documentation.onesignal.com/reference/create-notification>
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Config {
    app_id: String,
    #[derivative(Debug = "ignore")]
    api_key: String,
    base_url: Url,
    timeout: Option<Duration>,
}

impl Config {
    /// Production host of OneSignal API.
    pub const DEFAULT_BASE_URL: &'static str = "https://onesignal.com";

    /// Creates a [`Config`] from app ID and REST API key, both are required.
    ///
    /// ```rust
    /// # use onesignal::Config;
    /// assert!(Config::new("app-id", "api-key").is_ok());
    /// assert!(Config::new("", "api-key").is_err());
    /// ```
    pub fn new<T, U>(app_id: T, api_key: U) -> Result<Self, ConfigError>
    where
        T: Into<String>,
        U: Into<String>,
    {
        let app_id = app_id.into();
        if app_id.trim().is_empty() {
            return Err(ConfigError::MissingAppId);
        }
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(Self {
            app_id,
            api_key,
            base_url: Url::parse(Self::DEFAULT_BASE_URL)?,
            timeout: None,
        })
    }

    /// Replaces the API host, e.g. for a proxy or a mock server.
    pub fn with_base_url<T>(self, base_url: T) -> Result<Self, ConfigError>
    where
        T: AsRef<str>,
    {
        Ok(Self {
            base_url: Url::parse(base_url.as_ref())?,
            ..self
        })
    }

    /// Sets timeout of each outbound request. No timeout by default.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    /// OneSignal application ID.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Host of OneSignal API.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Timeout of each outbound request.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
