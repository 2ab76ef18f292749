//! `EcoRoute` - Weather-aware delivery route planning
//!
//! This library provides route search through a directions provider, weather
//! safety analysis at the start of the trip, simulated carbon and fuel figures,
//! and a learned model that picks the best of the alternative routes.

pub mod animation;
pub mod api;
pub mod cache;
pub mod chat;
pub mod config;
pub mod directions;
pub mod emissions;
pub mod error;
pub mod geocoding;
pub mod http;
pub mod model;
pub mod models;
pub mod planner;
pub mod render;
pub mod safety;
pub mod scoring;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use cache::PersistentCache;
pub use config::EcoRouteConfig;
pub use directions::{DirectionsProvider, DirectionsRequest, GoogleDirectionsClient};
pub use error::{EcoRouteError, ErrorCode};
pub use geocoding::{Geocoder, GoogleGeocoder, LocationInput, LocationParser};
pub use model::{RouteFeatures, RouteModel, RoutePredictor, TrainingReport};
pub use models::{LatLng, Location, RouteCandidate, VehicleType, WeatherSnapshot};
pub use planner::{RoutePlan, RoutePlanner, RouteRequest};
pub use safety::{WeatherAnalysis, analyze_weather};
pub use scoring::{RouteScorer, ScoredRoute, ScoringStrategy, select_best};
pub use weather::{OpenWeatherMapClient, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, EcoRouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
