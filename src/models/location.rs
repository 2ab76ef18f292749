//! Location model for geographic coordinates and metadata

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

/// A bare coordinate pair, as used in route geometry
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct LatLng {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are inside the valid WGS84 range
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance in metres
    #[must_use]
    pub fn distance_m(&self, other: &LatLng) -> f64 {
        let from = HaversineLocation {
            latitude: self.lat,
            longitude: self.lng,
        };
        let to = HaversineLocation {
            latitude: other.lat,
            longitude: other.lng,
        };
        distance(from, to, Units::Kilometers) * 1000.0
    }

    /// Format as the `lat,lng` string the providers accept
    #[must_use]
    pub fn to_query(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

/// Named location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Formatted address or coordinate label
    pub name: String,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
        }
    }

    /// Location named after its own coordinates
    #[must_use]
    pub fn unnamed(position: LatLng) -> Self {
        Self::new(
            position.lat,
            position.lng,
            format!("{:.4}, {:.4}", position.lat, position.lng),
        )
    }

    #[must_use]
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unnamed_location_uses_coordinates() {
        let location = Location::unnamed(LatLng::new(46.818_234, 8.227_456));
        assert_eq!(location.name, "46.8182, 8.2275");
        assert_eq!(location.position(), LatLng::new(46.818_234, 8.227_456));
    }

    #[test]
    fn test_latlng_validity() {
        assert!(LatLng::new(-15.793889, -47.882778).is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
        assert!(!LatLng::new(0.0, -181.0).is_valid());
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let a = LatLng::new(0.0, 0.0);
        let b = LatLng::new(1.0, 0.0);
        let metres = a.distance_m(&b);
        assert!((metres - 111_195.0).abs() < 500.0, "got {metres}");
        assert_eq!(a.distance_m(&a), 0.0);
    }
}
