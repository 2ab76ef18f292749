//! Location input parsing and reverse geocoding

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::DirectionsConfig;
use crate::http;
use crate::models::LatLng;
use crate::{EcoRouteError, ErrorCode};

/// Types of location input
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Coordinates (latitude, longitude)
    Coordinates(LatLng),
    /// Free-text address, resolved by the directions provider
    Address(String),
}

impl LocationInput {
    /// Value to send as `origin`/`destination`
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            LocationInput::Coordinates(position) => position.to_query(),
            LocationInput::Address(address) => address.clone(),
        }
    }
}

/// Location parsing utilities
pub struct LocationParser;

impl LocationParser {
    /// Parse location input (coordinates or address text)
    pub fn parse(input: &str) -> Result<LocationInput> {
        let input = input.trim();
        if input.is_empty() {
            return Err(EcoRouteError::validation("Location cannot be empty").into());
        }

        if let Ok(position) = Self::parse_coordinates(input) {
            return Ok(LocationInput::Coordinates(position));
        }

        Ok(LocationInput::Address(input.to_string()))
    }

    /// Parse coordinates from string like "46.8182,8.2275" or "46.8182 8.2275"
    fn parse_coordinates(input: &str) -> Result<LatLng> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return Err(
                EcoRouteError::validation("Coordinates must be in format 'lat,lng'").into(),
            );
        }

        let lat = parts[0]
            .parse::<f64>()
            .with_context(|| format!("Invalid latitude: {}", parts[0]))?;
        let lng = parts[1]
            .parse::<f64>()
            .with_context(|| format!("Invalid longitude: {}", parts[1]))?;

        let position = LatLng::new(lat, lng);
        if !position.is_valid() {
            return Err(EcoRouteError::validation(format!(
                "Coordinates out of range: {lat}, {lng}"
            ))
            .into());
        }

        Ok(position)
    }
}

/// Coordinates-to-address lookup
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Formatted address for `position`, `None` when the provider knows nothing there
    async fn reverse(&self, position: LatLng) -> Result<Option<String>>;
}

/// Google Geocoding API client
pub struct GoogleGeocoder {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(config: &DirectionsConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout_seconds, config.max_retries)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    #[instrument(skip(self))]
    async fn reverse(&self, position: LatLng) -> Result<Option<String>> {
        let url = http::build_url(
            &format!("{}/geocode/json", self.base_url),
            &[
                ("latlng", position.to_query()),
                ("key", self.api_key.clone()),
            ],
        );
        let response: GeocodeResponse = http::get_json(&self.client, "Geocoding API", &url).await?;
        response.into_address()
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
}

impl GeocodeResponse {
    fn into_address(self) -> Result<Option<String>> {
        match self.status.as_str() {
            "OK" => {
                let address = self.results.into_iter().next().map(|r| r.formatted_address);
                debug!("Reverse geocoded to {:?}", address);
                Ok(address)
            }
            "ZERO_RESULTS" => Ok(None),
            status => {
                warn!("Geocoder failed: {status}");
                Err(EcoRouteError::api(
                    format!(
                        "Geocoding failed: {status}{}",
                        self.error_message
                            .map(|m| format!(" ({m})"))
                            .unwrap_or_default()
                    ),
                    ErrorCode::ApiNetworkError,
                )
                .into())
            }
        }
    }
}
