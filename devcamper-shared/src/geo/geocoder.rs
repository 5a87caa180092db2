//! Address geocoding.
//!
//! The [`Geocoder`] trait is the seam used by bootcamp creation and the
//! radius search. [`MapQuestGeocoder`] talks to the MapQuest address API;
//! [`UnconfiguredGeocoder`] stands in when no provider key is set.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const MAPQUEST_ENDPOINT: &str = "https://www.mapquestapi.com/geocoding/v1/address";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// A resolved address
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
}

/// Error type for geocoding
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// Provider answered but found nothing
    #[error("Could not geocode {0}")]
    NoResults(String),

    /// Network or HTTP client failure
    #[error("Geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider reported an error or sent an unexpected payload
    #[error("Geocoding provider error: {0}")]
    Provider(String),

    /// No provider is configured
    #[error("Geocoding service is not configured")]
    NotConfigured,
}

/// Resolves free-form addresses and postal codes to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<GeocodedLocation, GeocodeError>;
}

/// Geocoder settings
#[derive(Debug, Clone, Default)]
pub struct GeocoderConfig {
    /// Provider name; only `mapquest` is supported
    pub provider: String,
    pub api_key: Option<String>,
    /// Overrides the provider endpoint
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Builds the geocoder described by `config`
///
/// Falls back to [`UnconfiguredGeocoder`] when the provider is unknown or the
/// key is missing.
pub fn build_geocoder(config: &GeocoderConfig) -> Result<Arc<dyn Geocoder>, GeocodeError> {
    match (config.provider.to_ascii_lowercase().as_str(), &config.api_key) {
        ("mapquest", Some(key)) if !key.is_empty() => {
            let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
            let mut geocoder = MapQuestGeocoder::new(key.clone(), timeout)?;
            if let Some(endpoint) = &config.endpoint {
                geocoder.endpoint = endpoint.clone();
            }
            Ok(Arc::new(geocoder))
        }
        (provider, _) => {
            tracing::warn!(provider, "Geocoder not configured; address lookups will fail");
            Ok(Arc::new(UnconfiguredGeocoder))
        }
    }
}

/// MapQuest address API client
pub struct MapQuestGeocoder {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl MapQuestGeocoder {
    /// Builds a client with an explicit request timeout
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: MAPQUEST_ENDPOINT.to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for MapQuestGeocoder {
    async fn geocode(&self, query: &str) -> Result<GeocodedLocation, GeocodeError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("key", self.api_key.as_str()), ("location", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Provider(format!("HTTP {}", status)));
        }

        let body: MapQuestResponse = response.json().await?;
        let location = parse_response(body, query)?;

        tracing::debug!(
            query,
            latitude = location.latitude,
            longitude = location.longitude,
            "Geocoded address"
        );

        Ok(location)
    }
}

/// Geocoder that always fails with [`GeocodeError::NotConfigured`]
pub struct UnconfiguredGeocoder;

#[async_trait]
impl Geocoder for UnconfiguredGeocoder {
    async fn geocode(&self, _query: &str) -> Result<GeocodedLocation, GeocodeError> {
        Err(GeocodeError::NotConfigured)
    }
}

#[derive(Debug, Deserialize)]
struct MapQuestResponse {
    #[serde(default)]
    info: Option<MapQuestInfo>,
    #[serde(default)]
    results: Vec<MapQuestResult>,
}

#[derive(Debug, Deserialize)]
struct MapQuestInfo {
    #[serde(default)]
    statuscode: i64,
    #[serde(default)]
    messages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MapQuestResult {
    #[serde(default)]
    locations: Vec<MapQuestLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapQuestLocation {
    lat_lng: MapQuestLatLng,
    #[serde(default)]
    street: Option<String>,
    #[serde(default)]
    admin_area5: Option<String>,
    #[serde(default)]
    admin_area3: Option<String>,
    #[serde(default)]
    admin_area1: Option<String>,
    #[serde(default)]
    postal_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MapQuestLatLng {
    lat: f64,
    lng: f64,
}

fn parse_response(body: MapQuestResponse, query: &str) -> Result<GeocodedLocation, GeocodeError> {
    if let Some(info) = &body.info {
        if info.statuscode != 0 {
            return Err(GeocodeError::Provider(format!(
                "status {}: {}",
                info.statuscode,
                info.messages.join("; ")
            )));
        }
    }

    let location = body
        .results
        .into_iter()
        .next()
        .and_then(|result| result.locations.into_iter().next())
        .ok_or_else(|| GeocodeError::NoResults(query.to_string()))?;

    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    let street = non_empty(location.street);
    let city = non_empty(location.admin_area5);
    let state = non_empty(location.admin_area3);
    let zipcode = non_empty(location.postal_code);
    let country = non_empty(location.admin_area1);

    Ok(GeocodedLocation {
        latitude: location.lat_lng.lat,
        longitude: location.lat_lng.lng,
        formatted_address: format_address(
            street.as_deref(),
            city.as_deref(),
            state.as_deref(),
            zipcode.as_deref(),
            country.as_deref(),
        ),
        street,
        city,
        state,
        zipcode,
        country,
    })
}

/// Joins address parts as `street, city, state zipcode, country`
fn format_address(
    street: Option<&str>,
    city: Option<&str>,
    state: Option<&str>,
    zipcode: Option<&str>,
    country: Option<&str>,
) -> Option<String> {
    let region = match (state, zipcode) {
        (Some(s), Some(z)) => Some(format!("{} {}", s, z)),
        (Some(s), None) => Some(s.to_string()),
        (None, Some(z)) => Some(z.to_string()),
        (None, None) => None,
    };

    let parts: Vec<String> = [
        street.map(str::to_string),
        city.map(str::to_string),
        region,
        country.map(str::to_string),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}
