//! Current weather from the OpenWeather API.

use serde::Deserialize;

use super::{http_client, send, ServiceError, ServiceResult};
use crate::models::Weather;

/// Measurement system for temperatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Units {
    Standard,
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }
}

/// Current conditions at a location.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    /// `None` when the service reports a condition outside [`Weather`]
    pub condition: Option<Weather>,
    pub description: String,
    pub temperature: f64,
    pub location_name: String,
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    base_url: String,
    api_key: Option<String>,
    units: Units,
    language: String,
    client: reqwest::Client,
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> ServiceResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key,
            units: Units::default(),
            language: "en".to_string(),
            client: http_client()?,
        })
    }

    #[must_use]
    pub const fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    fn build_request(&self, latitude: f64, longitude: f64) -> ServiceResult<reqwest::Request> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ServiceError::MissingCredential("OpenWeather"))?;
        Ok(self
            .client
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("units", self.units.as_str().to_string()),
                ("lang", self.language.clone()),
                ("appid", api_key.to_string()),
            ])
            .build()?)
    }

    pub async fn current(&self, latitude: f64, longitude: f64) -> ServiceResult<WeatherReport> {
        let request = self.build_request(latitude, longitude)?;
        let response = send(&self.client, request).await?;
        let body = response.text().await?;
        parse_weather_payload(&body)
    }
}

#[derive(Debug, Deserialize)]
struct WeatherPayload {
    #[serde(default)]
    weather: Vec<ConditionPayload>,
    main: MainPayload,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ConditionPayload {
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainPayload {
    temp: f64,
}

/// Parse a current-weather response body.
///
/// Public for testability; callers can exercise parsing without network access.
pub fn parse_weather_payload(payload: &str) -> ServiceResult<WeatherReport> {
    let payload: WeatherPayload = serde_json::from_str(payload)
        .map_err(|error| ServiceError::InvalidResponse(error.to_string()))?;

    let first = payload.weather.into_iter().next();
    let condition = first.as_ref().and_then(|c| c.main.parse::<Weather>().ok());
    if condition.is_none() {
        tracing::debug!("Unrecognized weather condition {:?}", first.as_ref().map(|c| &c.main));
    }

    Ok(WeatherReport {
        condition,
        description: first.map(|c| c.description).unwrap_or_default(),
        temperature: payload.main.temp,
        location_name: payload.name,
    })
}
