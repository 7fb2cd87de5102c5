//! Client configuration.
//!
//! Loaded from the environment or from a JSON document. Only the server
//! location is configurable; everything about individual requests lives in
//! the endpoint tables.

use serde::Deserialize;

use crate::error::ConfigurationError;

pub const BASE_URL_ENV: &str = "SEARCHREQ_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "http://localhost:9200";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl ClientConfig {
    /// Read `SEARCHREQ_BASE_URL`, falling back to `http://localhost:9200`.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        match std::env::var(BASE_URL_ENV) {
            Ok(base_url) => Self::with_base_url(base_url),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(ConfigurationError::InvalidConfig(format!("{BASE_URL_ENV}: {e}"))),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ConfigurationError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn with_base_url(base_url: String) -> Result<Self, ConfigurationError> {
        let config = Self { base_url };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| ConfigurationError::InvalidConfig(format!("base_url `{}`: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigurationError::InvalidConfig(format!(
                "base_url `{}` must use http or https",
                self.base_url
            )));
        }
        Ok(())
    }
}
