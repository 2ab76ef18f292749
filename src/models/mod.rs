//! Data models for the EcoRoute application
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates and metadata
//! - Route: Route candidates returned by the directions provider
//! - Weather: Current weather snapshot
//! - Vehicle: Vehicle types and their per-vehicle factors

pub mod location;
pub mod route;
pub mod vehicle;
pub mod weather;

// Re-export all public types for convenient access
pub use location::{LatLng, Location};
pub use route::{RouteCandidate, RouteStep, TextValue};
pub use vehicle::{TravelMode, VehicleType};
pub use weather::WeatherSnapshot;
