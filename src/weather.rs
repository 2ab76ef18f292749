//! Weather provider client (OpenWeatherMap current weather)

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::config::WeatherConfig;
use crate::http;
use crate::models::WeatherSnapshot;

/// The API omits `visibility` in clear air; treat that as its 10 km cap
const DEFAULT_VISIBILITY_M: f64 = 10_000.0;

/// Source of current weather
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot>;
}

/// OpenWeatherMap client
pub struct OpenWeatherMapClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

impl OpenWeatherMapClient {
    pub fn new(config: &WeatherConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout_seconds, config.max_retries)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, lat: f64, lon: f64) -> String {
        http::build_url(
            &format!("{}/weather", self.base_url),
            &[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ],
        )
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMapClient {
    #[instrument(skip(self))]
    async fn current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot> {
        info!("Getting current weather for coordinates: {lat:.4}, {lon:.4}");
        let response: CurrentWeatherResponse =
            http::get_json(&self.client, "Weather API", &self.url(lat, lon)).await?;
        Ok(response.into())
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    #[serde(default)]
    weather: Vec<ApiCondition>,
    main: ApiMain,
    wind: ApiWind,
    visibility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ApiWind {
    speed: f64,
}

impl From<CurrentWeatherResponse> for WeatherSnapshot {
    fn from(response: CurrentWeatherResponse) -> Self {
        let (condition, description) = response
            .weather
            .into_iter()
            .next()
            .map(|c| (c.main, c.description))
            .unwrap_or_else(|| ("Clear".to_string(), "clear sky".to_string()));

        WeatherSnapshot {
            timestamp: Utc::now(),
            temperature: response.main.temp,
            wind_speed: response.wind.speed,
            visibility: response.visibility.unwrap_or(DEFAULT_VISIBILITY_M),
            condition,
            description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_current_weather() {
        let body = r#"{
            "coord": { "lon": -74.006, "lat": 40.7128 },
            "weather": [ { "id": 211, "main": "Thunderstorm", "description": "thunderstorm", "icon": "11d" } ],
            "main": { "temp": 24.3, "feels_like": 25.0, "pressure": 1009, "humidity": 80 },
            "visibility": 800,
            "wind": { "speed": 12.4, "deg": 220 },
            "cod": 200
        }"#;
        let response: CurrentWeatherResponse = serde_json::from_str(body).unwrap();
        let snapshot = WeatherSnapshot::from(response);

        assert_eq!(snapshot.temperature, 24.3);
        assert_eq!(snapshot.wind_speed, 12.4);
        assert_eq!(snapshot.visibility, 800.0);
        assert_eq!(snapshot.condition, "Thunderstorm");
        assert_eq!(snapshot.description, "thunderstorm");
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let body = r#"{ "main": { "temp": -3.0 }, "wind": { "speed": 1.0 } }"#;
        let response: CurrentWeatherResponse = serde_json::from_str(body).unwrap();
        let snapshot = WeatherSnapshot::from(response);

        assert_eq!(snapshot.visibility, DEFAULT_VISIBILITY_M);
        assert_eq!(snapshot.condition, "Clear");
        assert_eq!(snapshot.description, "clear sky");
    }

    #[test]
    fn test_url_uses_metric_units() {
        let client =
            OpenWeatherMapClient::new(&WeatherConfig::default(), "weather_key_123".to_string())
                .unwrap();
        let url = client.url(40.7128, -74.006);
        assert_eq!(
            url,
            "https://api.openweathermap.org/data/2.5/weather?lat=40.7128&lon=-74.006&appid=weather_key_123&units=metric"
        );
    }
}
