//! Application state and the route planning use cases
//!
//! [`RoutePlanner`] owns the providers, the scorer and everything the user
//! has entered or computed so far. Handlers take it behind a lock and call one
//! use case at a time.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::animation::{AnimationFrame, VehicleAnimation};
use crate::cache::PersistentCache;
use crate::chat;
use crate::config::EcoRouteConfig;
use crate::directions::{DirectionsProvider, DirectionsRequest, GoogleDirectionsClient};
use crate::geocoding::{Geocoder, GoogleGeocoder};
use crate::model::RouteModel;
use crate::models::{LatLng, Location, VehicleType, WeatherSnapshot};
use crate::render::{self, MapOverlay, RouteCard, WeatherPanel};
use crate::safety::{WeatherAnalysis, analyze_weather};
use crate::scoring::{RouteScorer, ScoredRoute, ScoringContext, ScoringStrategy};
use crate::weather::{OpenWeatherMapClient, WeatherProvider};
use crate::{EcoRouteError, ErrorCode};

pub const LOCATED_ZOOM: u8 = 12;
pub const DEFAULT_ZOOM: u8 = 4;
pub const LOCATION_UNAVAILABLE: &str =
    "Could not retrieve your location for weather information and starting point.";

const MISSING_ENDPOINTS: &str = "Please enter both starting location and destination";
const ADDRESS_NOT_FOUND: &str = "Could not get address for this location.";

fn default_alternatives() -> bool {
    true
}

/// A route search as entered by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin: String,
    pub destination: String,
    pub vehicle: VehicleType,
    #[serde(default)]
    pub cargo_weight_kg: f64,
    #[serde(default = "default_alternatives")]
    pub alternatives: bool,
    #[serde(default)]
    pub avoid_highways: bool,
    #[serde(default)]
    pub avoid_tolls: bool,
    /// Planned departure; `None` means leaving now with live traffic
    #[serde(default)]
    pub departure_time: Option<DateTime<Utc>>,
}

impl RouteRequest {
    #[must_use]
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, vehicle: VehicleType) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            vehicle,
            cargo_weight_kg: 0.0,
            alternatives: true,
            avoid_highways: false,
            avoid_tolls: false,
            departure_time: None,
        }
    }

    fn directions(&self) -> DirectionsRequest {
        DirectionsRequest {
            origin: self.origin.trim().to_string(),
            destination: self.destination.trim().to_string(),
            vehicle: self.vehicle,
            alternatives: self.alternatives,
            avoid_highways: self.avoid_highways,
            avoid_tolls: self.avoid_tolls,
            departure_time: self.departure_time,
        }
    }
}

/// Result of a successful search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub request: RouteRequest,
    pub routes: Vec<ScoredRoute>,
    pub best_index: usize,
    pub weather: WeatherAnalysis,
    pub strategy: ScoringStrategy,
    pub generated_at: DateTime<Utc>,
}

impl RoutePlan {
    #[must_use]
    pub fn best(&self) -> &ScoredRoute {
        &self.routes[self.best_index]
    }

    #[must_use]
    pub fn cards(&self) -> Vec<RouteCard> {
        render::route_cards(&self.routes, self.strategy, &self.weather)
    }

    #[must_use]
    pub fn overlay(&self) -> MapOverlay {
        render::map_overlay(&self.routes)
    }

    #[must_use]
    pub fn weather_panel(&self) -> WeatherPanel {
        render::weather_panel(&self.weather)
    }

    /// Marker frames along the best route
    #[must_use]
    pub fn best_animation(&self) -> Vec<AnimationFrame> {
        VehicleAnimation::new(&self.best().candidate.steps, self.request.vehicle).collect()
    }
}

/// Start and destination fields as filled in so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    pub from: Option<Location>,
    pub to: Option<Location>,
}

/// Initial map state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
    pub weather: WeatherAnalysis,
    pub endpoints: Endpoints,
}

/// A route the user picked from the list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSelection {
    pub index: usize,
    pub card: RouteCard,
    pub overlay: MapOverlay,
    /// Only the best route is animated
    pub animation: Option<Vec<AnimationFrame>>,
}

pub struct RoutePlanner {
    directions: Arc<dyn DirectionsProvider>,
    weather: Arc<dyn WeatherProvider>,
    geocoder: Arc<dyn Geocoder>,
    scorer: RouteScorer,
    default_center: LatLng,
    endpoints: Endpoints,
    plan: Option<RoutePlan>,
    last_weather: Option<WeatherSnapshot>,
}

impl RoutePlanner {
    pub fn new(
        directions: Arc<dyn DirectionsProvider>,
        weather: Arc<dyn WeatherProvider>,
        geocoder: Arc<dyn Geocoder>,
        scorer: RouteScorer,
    ) -> Self {
        Self {
            directions,
            weather,
            geocoder,
            scorer,
            default_center: LatLng::new(-15.793889, -47.882778),
            endpoints: Endpoints::default(),
            plan: None,
            last_weather: None,
        }
    }

    #[must_use]
    pub fn with_default_center(mut self, center: LatLng) -> Self {
        self.default_center = center;
        self
    }

    /// Wire the real provider clients, cache and model from configuration
    pub fn from_config(config: &EcoRouteConfig, model: Arc<RouteModel>) -> Result<Self> {
        let (directions_key, weather_key) = config.require_api_keys()?;

        let mut directions = GoogleDirectionsClient::new(&config.directions, directions_key.clone())?;
        if config.cache.enabled {
            let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 3600);
            match PersistentCache::open(&config.cache.location, ttl) {
                Ok(cache) => directions = directions.with_cache(Arc::new(cache)),
                Err(e) => warn!("Directions cache disabled: {e:#}"),
            }
        }

        let weather = OpenWeatherMapClient::new(&config.weather, weather_key)?;
        let geocoder = GoogleGeocoder::new(&config.directions, directions_key)?;
        let strategy: ScoringStrategy = config.defaults.scoring.parse()?;

        Ok(Self::new(
            Arc::new(directions),
            Arc::new(weather),
            Arc::new(geocoder),
            RouteScorer::new(strategy, model),
        )
        .with_default_center(LatLng::new(
            config.defaults.center_lat,
            config.defaults.center_lng,
        )))
    }

    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    #[must_use]
    pub fn current_plan(&self) -> Option<&RoutePlan> {
        self.plan.as_ref()
    }

    #[must_use]
    pub fn last_weather(&self) -> Option<&WeatherSnapshot> {
        self.last_weather.as_ref()
    }

    /// Search, score and rank routes; replaces the previous plan
    #[instrument(skip(self), fields(origin = %request.origin, destination = %request.destination))]
    pub async fn plan(&mut self, request: RouteRequest) -> Result<&RoutePlan> {
        if request.origin.trim().is_empty() || request.destination.trim().is_empty() {
            return Err(EcoRouteError::validation(MISSING_ENDPOINTS).into());
        }

        let candidates = self
            .directions
            .routes(&request.directions())
            .await
            .map_err(|e| {
                warn!("Directions lookup failed: {e:#}");
                if e.downcast_ref::<EcoRouteError>().is_some() {
                    e
                } else {
                    EcoRouteError::api(format!("{e:#}"), ErrorCode::ApiNetworkError).into()
                }
            })?;
        let Some(first) = candidates.first() else {
            return Err(EcoRouteError::api("No routes found", ErrorCode::ApiNoRoute).into());
        };

        let snapshot = self.fetch_weather(first.start_location).await;
        let analysis = analyze_weather(snapshot.as_ref());

        let context = ScoringContext {
            vehicle: request.vehicle,
            cargo_weight_kg: request.cargo_weight_kg.max(0.0),
            weather: analysis.clone(),
            time_of_day: time_of_day(request.departure_time),
        };
        let routes = self.scorer.score_routes(&candidates, &context)?;
        let best_index = routes.iter().position(|r| r.is_best).unwrap_or(0);

        info!(
            "Planned {} routes, best is #{} ({})",
            routes.len(),
            best_index + 1,
            routes[best_index].candidate.summary
        );

        let best = &routes[best_index].candidate;
        self.endpoints = Endpoints {
            from: Some(Location::new(
                best.start_location.lat,
                best.start_location.lng,
                best.start_address.clone(),
            )),
            to: Some(Location::new(
                best.end_location.lat,
                best.end_location.lng,
                best.end_address.clone(),
            )),
        };
        self.last_weather = snapshot;
        let plan = self.plan.insert(RoutePlan {
            request,
            routes,
            best_index,
            weather: analysis,
            strategy: self.scorer.strategy(),
            generated_at: Utc::now(),
        });
        Ok(plan)
    }

    /// Overlay for one route of the current plan
    pub fn select_route(&self, index: usize) -> Result<RouteSelection> {
        let plan = self.require_plan()?;
        let Some(route) = plan.routes.get(index) else {
            return Err(EcoRouteError::validation(format!(
                "Route {} does not exist",
                index + 1
            ))
            .into());
        };

        Ok(RouteSelection {
            index,
            card: render::route_cards(&plan.routes, plan.strategy, &plan.weather)
                .swap_remove(index),
            overlay: render::route_overlay(index, route),
            animation: route.is_best.then(|| plan.best_animation()),
        })
    }

    pub fn best_animation(&self) -> Result<Vec<AnimationFrame>> {
        Ok(self.require_plan()?.best_animation())
    }

    /// Fill the next empty endpoint with the address under a map click
    #[instrument(skip(self))]
    pub async fn map_click(&mut self, position: LatLng) -> Result<&Endpoints> {
        let clicked = match self.geocoder.reverse(position).await {
            Ok(Some(address)) => Location::new(position.lat, position.lng, address),
            Ok(None) => return Err(EcoRouteError::validation(ADDRESS_NOT_FOUND).into()),
            Err(e) => {
                warn!("Reverse geocoding failed: {e:#}");
                return Err(EcoRouteError::validation(ADDRESS_NOT_FOUND).into());
            }
        };

        let endpoints = &mut self.endpoints;
        if endpoints.from.is_none() {
            endpoints.from = Some(clicked);
        } else if endpoints.to.is_none() {
            endpoints.to = Some(clicked);
        } else {
            endpoints.from = Some(clicked);
            endpoints.to = None;
        }
        Ok(&self.endpoints)
    }

    /// Map centre, weather and start field for the user position, if known
    #[instrument(skip(self))]
    pub async fn initialize(&mut self, position: Option<LatLng>) -> MapView {
        let Some(position) = position else {
            info!("User position unknown, using default map centre");
            return MapView {
                center: self.default_center,
                zoom: DEFAULT_ZOOM,
                weather: WeatherAnalysis::location_unavailable(LOCATION_UNAVAILABLE),
                endpoints: self.endpoints.clone(),
            };
        };

        let (snapshot, address) =
            futures::join!(self.fetch_weather(position), self.geocoder.reverse(position));
        let analysis = analyze_weather(snapshot.as_ref());
        self.last_weather = snapshot;

        self.endpoints.from = Some(match address {
            Ok(Some(address)) => Location::new(position.lat, position.lng, address),
            Ok(None) => Location::unnamed(position),
            Err(e) => {
                warn!("Reverse geocoding of user position failed: {e:#}");
                Location::unnamed(position)
            }
        });

        MapView {
            center: position,
            zoom: LOCATED_ZOOM,
            weather: analysis,
            endpoints: self.endpoints.clone(),
        }
    }

    /// Weather analysis for an arbitrary point; lookup failure degrades to unavailable
    pub async fn weather_at(&self, position: LatLng) -> WeatherAnalysis {
        analyze_weather(self.fetch_weather(position).await.as_ref())
    }

    #[must_use]
    pub fn chat(&self, message: &str) -> Option<String> {
        chat::reply(message, self.last_weather.as_ref())
    }

    async fn fetch_weather(&self, position: LatLng) -> Option<WeatherSnapshot> {
        match self.weather.current(position.lat, position.lng).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Weather lookup failed: {e:#}");
                None
            }
        }
    }

    fn require_plan(&self) -> Result<&RoutePlan> {
        self.plan.as_ref().ok_or_else(|| {
            EcoRouteError::validation("No route has been calculated yet").into()
        })
    }
}

/// Local time as a fraction of the day
/// Fraction of the local day at departure
fn time_of_day(departure: Option<DateTime<Utc>>) -> f64 {
    let local = departure.map_or_else(Local::now, |t| t.with_timezone(&Local));
    (f64::from(local.hour()) + f64::from(local.minute()) / 60.0) / 24.0
}
