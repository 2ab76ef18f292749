//! Rule-based weather safety classification

use serde::{Deserialize, Serialize};

use crate::models::WeatherSnapshot;

pub const FREEZING_BELOW_C: f64 = 0.0;
pub const EXTREME_HEAT_ABOVE_C: f64 = 35.0;
pub const STRONG_WIND_ABOVE_MS: f64 = 20.0;
pub const POOR_VISIBILITY_BELOW_M: f64 = 1000.0;
pub const SEVERE_CONDITIONS: [&str; 5] = ["Thunderstorm", "Heavy Rain", "Snow", "Sleet", "Hail"];

pub const WEATHER_UNAVAILABLE: &str = "Weather data unavailable";

/// Outcome of checking a snapshot against the travel-safety thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAnalysis {
    pub safe: bool,
    pub warnings: Vec<String>,
    /// Snapshot that was analysed; absent when weather could not be fetched
    pub conditions: Option<WeatherSnapshot>,
    /// Status note for the degraded states
    pub message: Option<String>,
}

impl WeatherAnalysis {
    /// No snapshot: travel is not discouraged, the panel shows a notice
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            safe: true,
            warnings: Vec::new(),
            conditions: None,
            message: Some(WEATHER_UNAVAILABLE.to_string()),
        }
    }

    /// The user position is unknown, so nothing could be checked
    #[must_use]
    pub fn location_unavailable(reason: impl Into<String>) -> Self {
        Self {
            safe: false,
            warnings: vec![reason.into()],
            conditions: None,
            message: None,
        }
    }

    /// Weather risk on the model's 0-1 axis, one fifth per warning
    #[must_use]
    pub fn risk(&self) -> f64 {
        if self.conditions.is_none() {
            return 0.5;
        }
        (self.warnings.len() as f64 / 5.0).min(1.0)
    }
}

/// Apply the threshold rules; `safe` holds iff no rule fires
#[must_use]
pub fn analyze_weather(weather: Option<&WeatherSnapshot>) -> WeatherAnalysis {
    let Some(weather) = weather else {
        return WeatherAnalysis::unavailable();
    };

    let mut warnings = Vec::new();

    if weather.temperature < FREEZING_BELOW_C {
        warnings.push("Freezing conditions".to_string());
    } else if weather.temperature > EXTREME_HEAT_ABOVE_C {
        warnings.push("Extreme heat".to_string());
    }

    if weather.wind_speed > STRONG_WIND_ABOVE_MS {
        warnings.push("Strong winds".to_string());
    }

    if weather.visibility < POOR_VISIBILITY_BELOW_M {
        warnings.push("Poor visibility".to_string());
    }

    if SEVERE_CONDITIONS.contains(&weather.condition.as_str()) {
        warnings.push(format!("Severe weather: {}", weather.description));
    }

    WeatherAnalysis {
        safe: warnings.is_empty(),
        warnings,
        conditions: Some(weather.clone()),
        message: None,
    }
}
