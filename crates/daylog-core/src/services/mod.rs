//! HTTP clients for the collaborator services.
//!
//! Geocoding and weather lookups enrich new entries and are non-fatal:
//! [`Collaborators`] turns their failures into "unavailable" values. The
//! narrative client surfaces its errors, since the caller asked for it
//! explicitly.

mod geocoding;
mod narrative;
mod weather;

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::config::ServiceConfig;
use crate::models::{Location, Weather};
use crate::util::compact_text;

pub use geocoding::{AddressResolver, GeocodingClient};
pub use narrative::{NarrativeClient, NarrativeRequest, DEFAULT_NARRATIVE_WORDS};
pub use weather::{parse_weather_payload, Units, WeatherClient, WeatherReport};

const HTTP_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// No API key configured for the service
    #[error("{0} API key is missing")]
    MissingCredential(&'static str),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid service response: {0}")]
    InvalidResponse(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

fn http_client() -> ServiceResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()?)
}

/// Send a request, mapping transport and HTTP failures to
/// [`ServiceError::ServiceUnavailable`].
async fn send(
    client: &reqwest::Client,
    request: reqwest::Request,
) -> ServiceResult<reqwest::Response> {
    let response = client
        .execute(request)
        .await
        .map_err(|error| ServiceError::ServiceUnavailable(error.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::ServiceUnavailable(parse_api_error(
            status, &body,
        )));
    }
    Ok(response)
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<serde_json::Value>,
    message: Option<String>,
}

/// Error text from a failed response body.
///
/// Understands `{"message": ...}`, `{"error": "..."}` and OpenAI's
/// `{"error": {"message": ...}}`.
fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        let nested = payload.error.as_ref().and_then(|error| match error {
            serde_json::Value::String(text) => Some(text.clone()),
            serde_json::Value::Object(fields) => fields
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(ToString::to_string),
            _ => None,
        });
        if let Some(message) = payload.message.or(nested) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

/// All collaborator clients, built from one [`ServiceConfig`].
#[derive(Clone)]
pub struct Collaborators {
    pub addresses: AddressResolver,
    pub weather: WeatherClient,
    pub narrative: NarrativeClient,
}

impl Collaborators {
    pub fn from_config(config: &ServiceConfig) -> ServiceResult<Self> {
        Ok(Self {
            addresses: AddressResolver::new(GeocodingClient::new(
                config.geocode_base_url(),
                config.geocode_api_key.clone(),
            )?),
            weather: WeatherClient::new(config.weather_base_url(), config.weather_api_key.clone())?,
            narrative: NarrativeClient::new(
                config.openai_base_url(),
                config.openai_api_key.clone(),
            )?,
        })
    }

    /// Location with its resolved address, or without one when the lookup
    /// fails.
    pub async fn locate(&self, latitude: f64, longitude: f64) -> Location {
        let address = self.addresses.resolve(latitude, longitude).await;
        Location::new(latitude, longitude).with_address(address)
    }

    /// Current weather condition, `None` when unavailable.
    pub async fn current_weather(&self, latitude: f64, longitude: f64) -> Option<Weather> {
        match self.weather.current(latitude, longitude).await {
            Ok(report) => report.condition,
            Err(error) => {
                tracing::warn!("Weather lookup failed: {error}");
                None
            }
        }
    }

    pub async fn narrate(&self, request: &NarrativeRequest) -> ServiceResult<String> {
        self.narrative.narrate(request).await
    }
}
