//! Reverse geocoding against the Google Geocoding API.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;

use super::{http_client, send, ServiceError, ServiceResult};

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GeocodingClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> ServiceResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key,
            client: http_client()?,
        })
    }

    fn build_request(&self, latitude: f64, longitude: f64) -> ServiceResult<reqwest::Request> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ServiceError::MissingCredential("Google Geocode"))?;
        Ok(self
            .client
            .get(format!("{}/maps/api/geocode/json", self.base_url))
            .query(&[
                ("latlng", format!("{latitude},{longitude}")),
                ("key", api_key.to_string()),
            ])
            .header("Accept", "application/json")
            .build()?)
    }

    /// Formatted address of the best match, `None` when nothing matches.
    pub async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> ServiceResult<Option<String>> {
        let request = self.build_request(latitude, longitude)?;
        let response = send(&self.client, request).await?;
        let body = response.text().await?;
        parse_geocode_payload(&body)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
}

fn parse_geocode_payload(payload: &str) -> ServiceResult<Option<String>> {
    let response: GeocodeResponse = serde_json::from_str(payload)
        .map_err(|error| ServiceError::InvalidResponse(error.to_string()))?;

    match response.status.as_str() {
        "OK" => Ok(response
            .results
            .into_iter()
            .next()
            .map(|result| result.formatted_address)),
        "ZERO_RESULTS" => Ok(None),
        status => Err(ServiceError::ServiceUnavailable(
            response
                .error_message
                .unwrap_or_else(|| format!("geocoding status {status}")),
        )),
    }
}

/// Reverse geocoder that remembers addresses by coordinates.
///
/// Failed lookups are not cached and resolve to `None`.
#[derive(Clone)]
pub struct AddressResolver {
    client: GeocodingClient,
    cache: Arc<Mutex<HashMap<CoordinateKey, Option<String>>>>,
}

/// Coordinates at microdegree precision.
type CoordinateKey = (i64, i64);

#[allow(clippy::cast_possible_truncation)]
fn coordinate_key(latitude: f64, longitude: f64) -> CoordinateKey {
    (
        (latitude * 1e6).round() as i64,
        (longitude * 1e6).round() as i64,
    )
}

impl AddressResolver {
    pub fn new(client: GeocodingClient) -> Self {
        Self {
            client,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn resolve(&self, latitude: f64, longitude: f64) -> Option<String> {
        let key = coordinate_key(latitude, longitude);
        if let Some(cached) = self.cache.lock().get(&key) {
            return cached.clone();
        }

        match self.client.reverse_geocode(latitude, longitude).await {
            Ok(address) => {
                self.cache.lock().insert(key, address.clone());
                address
            }
            Err(error) => {
                tracing::warn!("Address lookup failed: {error}");
                None
            }
        }
    }

    /// Seed the cache, e.g. with an address already stored on an entry.
    pub fn remember(&self, latitude: f64, longitude: f64, address: Option<String>) {
        self.cache
            .lock()
            .insert(coordinate_key(latitude, longitude), address);
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(key: Option<&str>) -> GeocodingClient {
        GeocodingClient::new("https://maps.example.test", key.map(ToString::to_string)).unwrap()
    }

    #[test]
    fn request_carries_coordinates_and_key() {
        let request = client(Some("abc")).build_request(51.5, -0.12).unwrap();
        let url = request.url();
        assert_eq!(url.path(), "/maps/api/geocode/json");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("latlng".to_string(), "51.5,-0.12".to_string())));
        assert!(query.contains(&("key".to_string(), "abc".to_string())));
    }

    #[test]
    fn missing_key_is_reported() {
        assert!(matches!(
            client(None).build_request(0.0, 0.0),
            Err(ServiceError::MissingCredential(_))
        ));
    }

    #[test]
    fn parses_first_formatted_address() {
        let payload = r#"{
            "results": [
                {"formatted_address": "10 Downing St, London SW1A 2AA, UK"},
                {"formatted_address": "London, UK"}
            ],
            "status": "OK"
        }"#;
        assert_eq!(
            parse_geocode_payload(payload).unwrap().as_deref(),
            Some("10 Downing St, London SW1A 2AA, UK")
        );
        assert_eq!(
            parse_geocode_payload(r#"{"results": [], "status": "ZERO_RESULTS"}"#).unwrap(),
            None
        );
        assert!(matches!(
            parse_geocode_payload(r#"{"status": "REQUEST_DENIED", "error_message": "bad key"}"#),
            Err(ServiceError::ServiceUnavailable(message)) if message == "bad key"
        ));
    }

    #[tokio::test]
    async fn resolver_serves_cached_addresses() {
        let resolver = AddressResolver::new(client(None));
        resolver.remember(51.5, -0.12, Some("London".to_string()));

        assert_eq!(resolver.resolve(51.5, -0.12).await.as_deref(), Some("London"));
        // uncached and keyless: falls back to no address, nothing cached
        assert_eq!(resolver.resolve(40.0, -74.0).await, None);
        assert_eq!(resolver.cached_len(), 1);
    }
}
