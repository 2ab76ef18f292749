//! Route feature vector shared by training and inference

use serde::{Deserialize, Serialize};

use crate::models::{RouteCandidate, VehicleType};
use crate::safety::WeatherAnalysis;

pub const FEATURE_COUNT: usize = 7;

/// Divisors that bring every raw feature onto roughly 0-1
const FEATURE_SCALE: [f64; FEATURE_COUNT] = [100.0, 120.0, 1.0, 1.0, 1.0, 5000.0, 1.0];

/// Raw, unscaled inputs of the route model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteFeatures {
    pub distance_km: f64,
    pub duration_min: f64,
    /// 0 for free flow, 1 for twice the free-flow duration or worse
    pub traffic: f64,
    /// 0 for clear weather, 1 for severe
    pub weather_risk: f64,
    /// `VehicleType::model_value`
    pub vehicle: f64,
    pub cargo_kg: f64,
    /// Fraction of the day, 0 at midnight
    pub time_of_day: f64,
}

impl RouteFeatures {
    #[must_use]
    pub fn from_route(
        route: &RouteCandidate,
        vehicle: VehicleType,
        cargo_weight_kg: f64,
        weather: &WeatherAnalysis,
        time_of_day: f64,
    ) -> Self {
        Self {
            distance_km: route.distance_km(),
            duration_min: route.duration_min(),
            traffic: (route.traffic_ratio() - 1.0).clamp(0.0, 1.0),
            weather_risk: weather.risk(),
            vehicle: vehicle.model_value(),
            cargo_kg: cargo_weight_kg.max(0.0),
            time_of_day: time_of_day.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn raw(&self) -> [f64; FEATURE_COUNT] {
        [
            self.distance_km,
            self.duration_min,
            self.traffic,
            self.weather_risk,
            self.vehicle,
            self.cargo_kg,
            self.time_of_day,
        ]
    }

    /// Network input: raw features divided by their fixed ranges
    #[must_use]
    pub fn to_input(&self) -> Vec<f64> {
        self.raw()
            .iter()
            .zip(FEATURE_SCALE)
            .map(|(value, scale)| value / scale)
            .collect()
    }

    /// Noise-free synthetic suitability, clamped to 0-1
    #[must_use]
    pub fn heuristic_score(&self) -> f64 {
        let score = 0.4 * (1.0 - self.distance_km / 100.0)
            + 0.3 * (1.0 - self.duration_min / 120.0)
            + 0.2 * (1.0 - self.traffic)
            + 0.05 * (1.0 - self.weather_risk)
            + 0.05 * (1.0 - (self.vehicle - 0.5).abs())
            + 0.05 * (1.0 - self.cargo_kg / 5000.0)
            + 0.05 * (1.0 - (self.time_of_day - 0.5).abs());
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::route::fixtures::candidate;
    use crate::safety::analyze_weather;

    #[test]
    fn test_from_route() {
        let route = candidate(25_000.0, 1_800.0, Some(2_700.0));
        let features =
            RouteFeatures::from_route(&route, VehicleType::CargoSmall, 800.0, &analyze_weather(None), 0.75);

        assert_eq!(features.distance_km, 25.0);
        assert_eq!(features.duration_min, 30.0);
        assert_eq!(features.traffic, 0.5);
        assert_eq!(features.weather_risk, 0.5);
        assert_eq!(features.vehicle, 0.4);
        assert_eq!(features.cargo_kg, 800.0);
        assert_eq!(features.time_of_day, 0.75);
    }

    #[test]
    fn test_traffic_is_capped() {
        let route = candidate(25_000.0, 600.0, Some(6_000.0));
        let features =
            RouteFeatures::from_route(&route, VehicleType::Driving, 0.0, &analyze_weather(None), 0.5);
        assert_eq!(features.traffic, 1.0);
    }

    #[test]
    fn test_input_scaling() {
        let features = RouteFeatures {
            distance_km: 50.0,
            duration_min: 60.0,
            traffic: 0.2,
            weather_risk: 0.4,
            vehicle: 0.6,
            cargo_kg: 2500.0,
            time_of_day: 0.5,
        };
        assert_eq!(features.to_input(), vec![0.5, 0.5, 0.2, 0.4, 0.6, 0.5, 0.5]);
    }

    #[test]
    fn test_heuristic_score_bounds() {
        let best = RouteFeatures {
            distance_km: 0.0,
            duration_min: 0.0,
            traffic: 0.0,
            weather_risk: 0.0,
            vehicle: 0.5,
            cargo_kg: 0.0,
            time_of_day: 0.5,
        };
        assert!((best.heuristic_score() - 1.0).abs() < 1e-12);

        let worst = RouteFeatures {
            distance_km: 500.0,
            duration_min: 600.0,
            traffic: 1.0,
            weather_risk: 1.0,
            vehicle: 0.0,
            cargo_kg: 5000.0,
            time_of_day: 0.0,
        };
        assert_eq!(worst.heuristic_score(), 0.0);
    }
}
