//! Weather snapshot model and display methods

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current weather at a single point, fetched fresh per search
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Visibility in metres
    pub visibility: f64,
    /// Condition group, e.g. `Rain` or `Thunderstorm`
    pub condition: String,
    /// Human-readable description of weather conditions
    pub description: String,
}

impl WeatherSnapshot {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{}°C", self.temperature)
    }

    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{} m/s", self.wind_speed)
    }

    /// Visibility in kilometres
    #[must_use]
    pub fn format_visibility(&self) -> String {
        format!("{} km", self.visibility / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatting() {
        let snapshot = WeatherSnapshot {
            timestamp: Utc::now(),
            temperature: 21.5,
            wind_speed: 3.6,
            visibility: 10_000.0,
            condition: "Clear".to_string(),
            description: "clear sky".to_string(),
        };
        assert_eq!(snapshot.format_temperature(), "21.5°C");
        assert_eq!(snapshot.format_wind(), "3.6 m/s");
        assert_eq!(snapshot.format_visibility(), "10 km");
    }
}
