//! Closed-form carbon, fuel and route-score formulas
//!
//! All three results are clamped to be non-negative so they stay comparable
//! for any route the provider can return.

use serde::{Deserialize, Serialize};

use crate::models::{RouteCandidate, VehicleType};

/// kg CO2e added per minute of travel, standing in for congestion losses
const CARBON_PER_MINUTE: f64 = 0.001;

// Normalisation ceilings of the closed-form score
const SCORE_MAX_DISTANCE_KM: f64 = 100.0;
const SCORE_MAX_FUEL_L: f64 = 20.0;

const WEIGHT_DISTANCE: f64 = 0.3;
const WEIGHT_FUEL: f64 = 0.3;
const WEIGHT_TRAFFIC: f64 = 0.4;

/// Simulated carbon footprint of a trip in kg CO2e
#[must_use]
pub fn carbon_footprint(
    distance_m: f64,
    duration_s: f64,
    cargo_weight_kg: f64,
    vehicle: VehicleType,
) -> f64 {
    let Some((per_km, per_kg_km)) = vehicle.carbon_factors() else {
        return 0.0;
    };

    let distance_km = distance_m / 1000.0;
    let footprint = distance_km * per_km
        + cargo_weight_kg * per_kg_km * distance_km
        + (duration_s / 60.0) * CARBON_PER_MINUTE;

    footprint.max(0.0)
}

/// Fuel used over `distance_km` in litres
#[must_use]
pub fn fuel_consumption(distance_km: f64, vehicle: VehicleType, cargo_weight_kg: f64) -> f64 {
    let mut rate = vehicle.fuel_rate();
    if vehicle.is_cargo() {
        rate += (cargo_weight_kg / 1000.0) * vehicle.cargo_fuel_impact();
    }
    (rate * distance_km / 100.0).max(0.0)
}

/// Inputs of the closed-form score, kept for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMetrics {
    pub distance_km: f64,
    pub duration_min: f64,
    pub fuel_l: f64,
    /// Traffic duration over free-flow duration
    pub traffic_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedFormScore {
    pub score: f64,
    pub metrics: RouteMetrics,
}

/// Weighted distance/fuel/traffic score, higher is better
#[must_use]
pub fn closed_form_score(
    route: &RouteCandidate,
    vehicle: VehicleType,
    cargo_weight_kg: f64,
) -> ClosedFormScore {
    let distance_km = route.distance_km();
    let traffic_level = route.traffic_ratio();
    let fuel_l = fuel_consumption(distance_km, vehicle, cargo_weight_kg);

    let normalized_distance = 1.0 - distance_km / SCORE_MAX_DISTANCE_KM;
    let normalized_fuel = 1.0 - fuel_l / SCORE_MAX_FUEL_L;
    let normalized_traffic = 1.0 - (traffic_level - 1.0);

    let score = normalized_distance * WEIGHT_DISTANCE
        + normalized_fuel * WEIGHT_FUEL
        + normalized_traffic * WEIGHT_TRAFFIC;

    ClosedFormScore {
        score: score.max(0.0),
        metrics: RouteMetrics {
            distance_km,
            duration_min: route.duration_min(),
            fuel_l,
            traffic_level,
        },
    }
}
