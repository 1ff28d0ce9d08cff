//! Collaborator service configuration.
//!
//! Keys and base URLs for the geocoding, weather and narrative services,
//! read from the environment. Every service is optional: a missing key only
//! disables the features that need it.

use serde::{Deserialize, Serialize};

use crate::util::{normalize_base_url, normalize_text_option};

pub const DEFAULT_GEOCODE_BASE_URL: &str = "https://maps.googleapis.com";
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

pub const GEOCODE_API_KEY_ENV: &str = "DAYLOG_GEOCODE_API_KEY";
pub const GEOCODE_BASE_URL_ENV: &str = "DAYLOG_GEOCODE_BASE_URL";
pub const WEATHER_API_KEY_ENV: &str = "DAYLOG_WEATHER_API_KEY";
pub const WEATHER_BASE_URL_ENV: &str = "DAYLOG_WEATHER_BASE_URL";
pub const OPENAI_API_KEY_ENV: &str = "DAYLOG_OPENAI_API_KEY";
pub const OPENAI_BASE_URL_ENV: &str = "DAYLOG_OPENAI_BASE_URL";

/// API keys and endpoints for the collaborator services.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default)]
    pub geocode_api_key: Option<String>,
    #[serde(default)]
    pub geocode_base_url: Option<String>,
    #[serde(default)]
    pub weather_api_key: Option<String>,
    #[serde(default)]
    pub weather_base_url: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub openai_base_url: Option<String>,
}

impl ServiceConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| normalize_text_option(lookup(name));
        Self {
            geocode_api_key: read(GEOCODE_API_KEY_ENV),
            geocode_base_url: read(GEOCODE_BASE_URL_ENV),
            weather_api_key: read(WEATHER_API_KEY_ENV),
            weather_base_url: read(WEATHER_BASE_URL_ENV),
            openai_api_key: read(OPENAI_API_KEY_ENV),
            openai_base_url: read(OPENAI_BASE_URL_ENV),
        }
    }

    /// Reject base URL overrides that are not HTTP(S).
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            (GEOCODE_BASE_URL_ENV, &self.geocode_base_url),
            (WEATHER_BASE_URL_ENV, &self.weather_base_url),
            (OPENAI_BASE_URL_ENV, &self.openai_base_url),
        ] {
            if let Some(value) = value {
                if normalize_base_url(value).is_none() {
                    return Err(format!("{name} must include http:// or https://"));
                }
            }
        }
        Ok(())
    }

    pub fn geocode_base_url(&self) -> String {
        resolve_base_url(self.geocode_base_url.as_deref(), DEFAULT_GEOCODE_BASE_URL)
    }

    pub fn weather_base_url(&self) -> String {
        resolve_base_url(self.weather_base_url.as_deref(), DEFAULT_WEATHER_BASE_URL)
    }

    pub fn openai_base_url(&self) -> String {
        resolve_base_url(self.openai_base_url.as_deref(), DEFAULT_OPENAI_BASE_URL)
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "[REDACTED]");
        formatter
            .debug_struct("ServiceConfig")
            .field("geocode_api_key", &redact(&self.geocode_api_key))
            .field("geocode_base_url", &self.geocode_base_url)
            .field("weather_api_key", &redact(&self.weather_api_key))
            .field("weather_base_url", &self.weather_base_url)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .finish()
    }
}

fn resolve_base_url(value: Option<&str>, default: &str) -> String {
    value
        .and_then(normalize_base_url)
        .unwrap_or_else(|| default.to_string())
}
