//! Vehicle types and the per-vehicle constants used by scoring

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EcoRouteError;

/// Travel mode understood by the directions provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelMode {
    Driving,
    Bicycling,
    Walking,
    Transit,
}

impl TravelMode {
    /// Lower-case value of the `mode` query parameter
    #[must_use]
    pub fn as_query(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Walking => "walking",
            TravelMode::Transit => "transit",
        }
    }
}

/// Vehicle selected for a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Driving,
    Bicycling,
    Walking,
    Transit,
    CargoSmall,
    CargoMedium,
    CargoLarge,
    /// Refrigerated cargo vehicle
    CargoRef,
}

impl VehicleType {
    pub const ALL: [VehicleType; 8] = [
        VehicleType::Driving,
        VehicleType::Bicycling,
        VehicleType::Walking,
        VehicleType::Transit,
        VehicleType::CargoSmall,
        VehicleType::CargoMedium,
        VehicleType::CargoLarge,
        VehicleType::CargoRef,
    ];

    #[must_use]
    pub fn is_cargo(&self) -> bool {
        matches!(
            self,
            VehicleType::CargoSmall
                | VehicleType::CargoMedium
                | VehicleType::CargoLarge
                | VehicleType::CargoRef
        )
    }

    /// Cargo vehicles are routed as ordinary cars
    #[must_use]
    pub fn travel_mode(&self) -> TravelMode {
        match self {
            VehicleType::Bicycling => TravelMode::Bicycling,
            VehicleType::Walking => TravelMode::Walking,
            VehicleType::Transit => TravelMode::Transit,
            _ => TravelMode::Driving,
        }
    }

    /// Marker label for the animated vehicle
    #[must_use]
    pub fn icon(&self) -> &'static str {
        match self {
            VehicleType::Driving => "🚗",
            VehicleType::Bicycling => "🚲",
            VehicleType::Walking => "🚶",
            VehicleType::Transit => "🚌",
            VehicleType::CargoSmall => "🚐",
            VehicleType::CargoMedium => "🚚",
            VehicleType::CargoLarge => "🚛",
            VehicleType::CargoRef => "🚛❄️",
        }
    }

    /// Position of the vehicle on the model's 0-1 vehicle axis
    #[must_use]
    pub fn model_value(&self) -> f64 {
        match self {
            VehicleType::Driving => 0.2,
            VehicleType::Bicycling => 0.8,
            VehicleType::Walking => 1.0,
            VehicleType::Transit => 0.6,
            VehicleType::CargoSmall => 0.4,
            VehicleType::CargoMedium => 0.3,
            VehicleType::CargoLarge => 0.2,
            VehicleType::CargoRef => 0.25,
        }
    }

    /// `(kg CO2 per km, kg CO2 per kg cargo per km)`; `None` for zero-emission travel
    #[must_use]
    pub fn carbon_factors(&self) -> Option<(f64, f64)> {
        match self {
            VehicleType::Driving => Some((0.15, 0.0002)),
            VehicleType::Transit => Some((0.05, 0.00005)),
            VehicleType::CargoSmall => Some((0.2, 0.0003)),
            VehicleType::CargoMedium => Some((0.3, 0.0004)),
            VehicleType::CargoLarge => Some((0.4, 0.0005)),
            VehicleType::CargoRef => Some((0.25, 0.00035)),
            VehicleType::Bicycling | VehicleType::Walking => None,
        }
    }

    /// Base fuel consumption in L/100km
    #[must_use]
    pub fn fuel_rate(&self) -> f64 {
        match self {
            VehicleType::Driving => 7.5,
            VehicleType::Transit => 2.5,
            VehicleType::CargoSmall => 10.0,
            VehicleType::CargoMedium => 15.0,
            VehicleType::CargoLarge => 20.0,
            VehicleType::CargoRef => 12.0,
            VehicleType::Bicycling | VehicleType::Walking => 0.0,
        }
    }

    /// Additional L/100km per tonne of cargo
    #[must_use]
    pub fn cargo_fuel_impact(&self) -> f64 {
        match self {
            VehicleType::CargoSmall => 2.0,
            VehicleType::CargoMedium => 3.0,
            VehicleType::CargoLarge => 4.0,
            VehicleType::CargoRef => 2.5,
            _ => 0.0,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Driving => "DRIVING",
            VehicleType::Bicycling => "BICYCLING",
            VehicleType::Walking => "WALKING",
            VehicleType::Transit => "TRANSIT",
            VehicleType::CargoSmall => "CARGO_SMALL",
            VehicleType::CargoMedium => "CARGO_MEDIUM",
            VehicleType::CargoLarge => "CARGO_LARGE",
            VehicleType::CargoRef => "CARGO_REF",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = EcoRouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        VehicleType::ALL
            .into_iter()
            .find(|vehicle| vehicle.as_str() == normalized)
            .ok_or_else(|| EcoRouteError::validation(format!("Unknown vehicle type: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("DRIVING", VehicleType::Driving)]
    #[case("cargo_small", VehicleType::CargoSmall)]
    #[case("cargo-ref", VehicleType::CargoRef)]
    #[case(" Walking ", VehicleType::Walking)]
    fn test_parse_vehicle(#[case] input: &str, #[case] expected: VehicleType) {
        assert_eq!(input.parse::<VehicleType>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_vehicle() {
        assert!("HOVERCRAFT".parse::<VehicleType>().is_err());
    }

    #[rstest]
    #[case(VehicleType::CargoSmall, TravelMode::Driving)]
    #[case(VehicleType::CargoRef, TravelMode::Driving)]
    #[case(VehicleType::Bicycling, TravelMode::Bicycling)]
    #[case(VehicleType::Transit, TravelMode::Transit)]
    fn test_cargo_routes_as_driving(#[case] vehicle: VehicleType, #[case] mode: TravelMode) {
        assert_eq!(vehicle.travel_mode(), mode);
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for vehicle in VehicleType::ALL {
            assert_eq!(vehicle.to_string().parse::<VehicleType>().unwrap(), vehicle);
        }
    }

    #[test]
    fn test_serde_uses_provider_names() {
        let json = serde_json::to_string(&VehicleType::CargoMedium).unwrap();
        assert_eq!(json, "\"CARGO_MEDIUM\"");
    }
}
