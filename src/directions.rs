//! Directions provider client (Google Maps Directions API)
//!
//! Turns a [`DirectionsRequest`] into route candidates. Only the first leg of
//! each route is used since requests never carry waypoints.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::cache::PersistentCache;
use crate::config::DirectionsConfig;
use crate::http;
use crate::models::{LatLng, RouteCandidate, RouteStep, TextValue, TravelMode, VehicleType};
use crate::{EcoRouteError, ErrorCode};

/// Input for a route search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionsRequest {
    pub origin: String,
    pub destination: String,
    pub vehicle: VehicleType,
    /// Ask the provider for alternative routes
    #[serde(default)]
    pub alternatives: bool,
    #[serde(default)]
    pub avoid_highways: bool,
    #[serde(default)]
    pub avoid_tolls: bool,
    /// Planned departure; `None` departs now
    #[serde(default)]
    pub departure_time: Option<DateTime<Utc>>,
}

impl DirectionsRequest {
    #[must_use]
    pub fn travel_mode(&self) -> TravelMode {
        self.vehicle.travel_mode()
    }

    /// Pipe-joined `avoid` value, `None` when nothing is avoided
    #[must_use]
    pub fn avoid(&self) -> Option<String> {
        let mut avoid = Vec::new();
        if self.avoid_highways {
            avoid.push("highways");
        }
        if self.avoid_tolls {
            avoid.push("tolls");
        }
        (!avoid.is_empty()).then(|| avoid.join("|"))
    }

    /// `departure_time` query value. Only driving requests carry one, since
    /// the provider returns `duration_in_traffic` only for them.
    #[must_use]
    pub fn departure(&self) -> Option<String> {
        if self.travel_mode() != TravelMode::Driving {
            return None;
        }
        Some(match self.departure_time {
            Some(time) => time.timestamp().to_string(),
            None => "now".to_string(),
        })
    }

    /// Whether the response depends on current traffic
    #[must_use]
    pub fn is_live_traffic(&self) -> bool {
        self.departure().as_deref() == Some("now")
    }

    /// Key identifying the provider-visible part of the request.
    /// `None` for live traffic requests, which must never be served from cache.
    #[must_use]
    pub fn cache_key(&self) -> Option<String> {
        if self.is_live_traffic() {
            return None;
        }
        Some(format!(
            "directions:{}:{}:{}:{}:{}:{}",
            urlencoding::encode(&self.origin.to_lowercase()),
            urlencoding::encode(&self.destination.to_lowercase()),
            self.travel_mode().as_query(),
            self.alternatives,
            self.avoid().unwrap_or_default(),
            self.departure().unwrap_or_default()
        ))
    }
}

/// Source of route candidates
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn routes(&self, request: &DirectionsRequest) -> Result<Vec<RouteCandidate>>;
}

/// Google Directions API client with optional response cache
pub struct GoogleDirectionsClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    cache: Option<Arc<PersistentCache>>,
}

impl GoogleDirectionsClient {
    pub fn new(config: &DirectionsConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout_seconds, config.max_retries)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            cache: None,
        })
    }

    /// Cache responses of requests that do not depend on live traffic
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<PersistentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn url(&self, request: &DirectionsRequest) -> String {
        let mut query = vec![
            ("origin", request.origin.clone()),
            ("destination", request.destination.clone()),
            ("mode", request.travel_mode().as_query().to_string()),
            ("alternatives", request.alternatives.to_string()),
        ];
        if let Some(avoid) = request.avoid() {
            query.push(("avoid", avoid));
        }
        if let Some(departure) = request.departure() {
            query.push(("departure_time", departure));
        }
        query.push(("key", self.api_key.clone()));
        http::build_url(&format!("{}/directions/json", self.base_url), &query)
    }

    async fn fetch(&self, request: &DirectionsRequest) -> Result<Vec<RouteCandidate>> {
        let response: DirectionsResponse =
            http::get_json(&self.client, "Directions API", &self.url(request)).await?;
        response.into_candidates()
    }
}

#[async_trait]
impl DirectionsProvider for GoogleDirectionsClient {
    #[instrument(skip(self), fields(origin = %request.origin, destination = %request.destination))]
    async fn routes(&self, request: &DirectionsRequest) -> Result<Vec<RouteCandidate>> {
        let cache = self.cache.as_ref().zip(request.cache_key());

        if let Some((cache, key)) = &cache {
            match cache.get::<Vec<RouteCandidate>>(key).await {
                Ok(Some(cached)) => {
                    info!("Using {} cached route candidates", cached.len());
                    return Ok(cached);
                }
                Ok(None) => {}
                Err(e) => warn!("Directions cache read failed: {e}"),
            }
        }

        let candidates = self.fetch(request).await?;
        info!("Directions API returned {} route candidates", candidates.len());

        if let Some((cache, key)) = &cache {
            if let Err(e) = cache.put(key, candidates.clone()).await {
                warn!("Directions cache write failed: {e}");
            }
        }

        Ok(candidates)
    }
}

/// Decode a Google encoded polyline (precision 5)
pub fn decode_path(encoded: &str) -> Result<Vec<LatLng>> {
    let line: geo_types::LineString<f64> = polyline::decode_polyline(encoded, 5).map_err(|e| {
        EcoRouteError::api(
            format!("Invalid polyline in directions response: {e}"),
            ErrorCode::ApiInvalidResponse,
        )
    })?;
    Ok(line.0.iter().map(|c| LatLng::new(c.y, c.x)).collect())
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<ApiRoute>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    #[serde(default)]
    summary: String,
    overview_polyline: ApiPolyline,
    legs: Vec<ApiLeg>,
}

#[derive(Debug, Deserialize)]
struct ApiPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct ApiTextValue {
    text: String,
    value: f64,
}

impl From<ApiTextValue> for TextValue {
    fn from(value: ApiTextValue) -> Self {
        TextValue::new(value.value, value.text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiLatLng {
    lat: f64,
    lng: f64,
}

impl From<ApiLatLng> for LatLng {
    fn from(value: ApiLatLng) -> Self {
        LatLng::new(value.lat, value.lng)
    }
}

#[derive(Debug, Deserialize)]
struct ApiLeg {
    distance: ApiTextValue,
    duration: ApiTextValue,
    duration_in_traffic: Option<ApiTextValue>,
    #[serde(default)]
    start_address: String,
    #[serde(default)]
    end_address: String,
    start_location: ApiLatLng,
    end_location: ApiLatLng,
    #[serde(default)]
    steps: Vec<ApiStep>,
}

#[derive(Debug, Deserialize)]
struct ApiStep {
    html_instructions: Option<String>,
    distance: ApiTextValue,
    duration: ApiTextValue,
    polyline: ApiPolyline,
}

impl DirectionsResponse {
    fn into_candidates(self) -> Result<Vec<RouteCandidate>> {
        match self.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => {
                return Err(EcoRouteError::api("No route found", ErrorCode::ApiNoRoute).into());
            }
            "NOT_FOUND" => {
                return Err(EcoRouteError::api(
                    "Origin or destination could not be found",
                    ErrorCode::ApiLocationNotFound,
                )
                .into());
            }
            "REQUEST_DENIED" => {
                return Err(EcoRouteError::api(
                    self.error_message
                        .unwrap_or_else(|| "Directions request denied".to_string()),
                    ErrorCode::ApiUnauthorized,
                )
                .into());
            }
            status => {
                return Err(EcoRouteError::api_with_context(
                    format!(
                        "Directions request failed: {status}{}",
                        self.error_message
                            .map(|m| format!(" ({m})"))
                            .unwrap_or_default()
                    ),
                    ErrorCode::ApiNetworkError,
                    HashMap::from([("status".to_string(), status.to_string())]),
                )
                .into());
            }
        }

        let mut candidates = Vec::with_capacity(self.routes.len());
        for route in self.routes {
            let Some(leg) = route.legs.into_iter().next() else {
                warn!("Skipping route without legs");
                continue;
            };

            let steps = leg
                .steps
                .into_iter()
                .map(|step| {
                    Ok(RouteStep {
                        instructions: step.html_instructions,
                        distance: step.distance.into(),
                        duration: step.duration.into(),
                        path: decode_path(&step.polyline.points)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            candidates.push(RouteCandidate {
                summary: route.summary,
                distance: leg.distance.into(),
                duration: leg.duration.into(),
                duration_in_traffic: leg.duration_in_traffic.map(Into::into),
                start_address: leg.start_address,
                end_address: leg.end_address,
                start_location: leg.start_location.into(),
                end_location: leg.end_location.into(),
                overview_path: decode_path(&route.overview_polyline.points)?,
                steps,
            });
        }

        if candidates.is_empty() {
            return Err(EcoRouteError::api("No route found", ErrorCode::ApiNoRoute).into());
        }

        Ok(candidates)
    }
}
