//! Route candidate model

use serde::{Deserialize, Serialize};

use super::LatLng;

/// A provider quantity with its machine value and display text
/// (e.g. `{ value: 12345, text: "12.3 km" }`)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TextValue {
    pub value: f64,
    pub text: String,
}

impl TextValue {
    #[must_use]
    pub fn new(value: f64, text: impl Into<String>) -> Self {
        Self {
            value,
            text: text.into(),
        }
    }
}

/// One maneuver of a route with its own geometry
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteStep {
    pub instructions: Option<String>,
    pub distance: TextValue,
    pub duration: TextValue,
    pub path: Vec<LatLng>,
}

/// One possible path between origin and destination
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteCandidate {
    /// Provider's short route name (usually the main road)
    pub summary: String,
    /// Distance in metres
    pub distance: TextValue,
    /// Duration in seconds
    pub duration: TextValue,
    /// Duration in seconds with current traffic, when the provider knows it
    pub duration_in_traffic: Option<TextValue>,
    pub start_address: String,
    pub end_address: String,
    pub start_location: LatLng,
    pub end_location: LatLng,
    /// Decoded overview polyline
    pub overview_path: Vec<LatLng>,
    pub steps: Vec<RouteStep>,
}

impl RouteCandidate {
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.distance.value / 1000.0
    }

    #[must_use]
    pub fn duration_min(&self) -> f64 {
        self.duration.value / 60.0
    }

    /// Ratio of traffic duration to free-flow duration, 1.0 when unknown
    #[must_use]
    pub fn traffic_ratio(&self) -> f64 {
        match &self.duration_in_traffic {
            Some(traffic) if self.duration.value > 0.0 => traffic.value / self.duration.value,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Candidate with a straight two-step path, for tests across the crate
    pub fn candidate(distance_m: f64, duration_s: f64, traffic_s: Option<f64>) -> RouteCandidate {
        let start = LatLng::new(52.5200, 13.4050);
        let middle = LatLng::new(52.5300, 13.4150);
        let end = LatLng::new(52.5400, 13.4250);
        RouteCandidate {
            summary: "A100".to_string(),
            distance: TextValue::new(distance_m, format!("{:.1} km", distance_m / 1000.0)),
            duration: TextValue::new(duration_s, format!("{} mins", (duration_s / 60.0).round())),
            duration_in_traffic: traffic_s
                .map(|s| TextValue::new(s, format!("{} mins", (s / 60.0).round()))),
            start_address: "Alexanderplatz, Berlin".to_string(),
            end_address: "Prenzlauer Berg, Berlin".to_string(),
            start_location: start,
            end_location: end,
            overview_path: vec![start, middle, end],
            steps: vec![
                RouteStep {
                    instructions: Some("Head north".to_string()),
                    distance: TextValue::new(distance_m / 2.0, "half"),
                    duration: TextValue::new(duration_s / 2.0, "half"),
                    path: vec![start, middle],
                },
                RouteStep {
                    instructions: Some("Continue".to_string()),
                    distance: TextValue::new(distance_m / 2.0, "half"),
                    duration: TextValue::new(duration_s / 2.0, "half"),
                    path: vec![middle, end],
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::candidate;

    #[test]
    fn test_unit_conversions() {
        let route = candidate(12_500.0, 1_800.0, None);
        assert_eq!(route.distance_km(), 12.5);
        assert_eq!(route.duration_min(), 30.0);
    }

    #[test]
    fn test_traffic_ratio_defaults_to_one() {
        assert_eq!(candidate(1000.0, 600.0, None).traffic_ratio(), 1.0);
        assert_eq!(candidate(1000.0, 600.0, Some(900.0)).traffic_ratio(), 1.5);
        assert_eq!(candidate(1000.0, 0.0, Some(900.0)).traffic_ratio(), 1.0);
    }
}
