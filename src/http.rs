//! Shared HTTP plumbing for the provider clients
//!
//! Each provider gets a `reqwest` client wrapped in retry middleware. Status
//! codes are mapped onto [`ErrorCode`]s once here so the clients only deal
//! with provider-level payloads.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::{EcoRouteError, ErrorCode};

/// Build a client with timeout and exponential-backoff retries for transient failures
pub fn build_client(timeout_seconds: u32, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(concat!("EcoRoute/", env!("CARGO_PKG_VERSION")))
        .build()
        .with_context(|| "Failed to create HTTP client")?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Append url-encoded query parameters to `base`
#[must_use]
pub fn build_url(base: &str, query: &[(&str, String)]) -> String {
    let params = query
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    if params.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{params}")
    }
}

/// GET `url` and decode the JSON body.
///
/// `label` names the provider in logs; only the path is logged since the
/// query carries the API key.
pub async fn get_json<T: DeserializeOwned>(
    client: &ClientWithMiddleware,
    label: &str,
    url: &str,
) -> Result<T> {
    let start_time = Instant::now();
    debug!(
        "{label} request to {}",
        url.split('?').next().unwrap_or(url)
    );

    let response = client.get(url).send().await.map_err(|e| {
        warn!("{label} network error: {e}");
        EcoRouteError::api_with_context(
            format!("Network error calling {label}: {e}"),
            ErrorCode::ApiNetworkError,
            HashMap::from([("provider".to_string(), label.to_string())]),
        )
    })?;

    let status = response.status();
    debug!(
        "{label} response {status} in {:.3}s",
        start_time.elapsed().as_secs_f64()
    );

    if !status.is_success() {
        let code = match status.as_u16() {
            401 | 403 => ErrorCode::ApiUnauthorized,
            404 => ErrorCode::ApiLocationNotFound,
            429 => ErrorCode::ApiRateLimit,
            _ => ErrorCode::ApiNetworkError,
        };
        error!("{label} request failed with status {status}");
        return Err(EcoRouteError::api_with_context(
            format!(
                "{label} request failed with status: {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            ),
            code,
            HashMap::from([("status_code".to_string(), status.as_u16().to_string())]),
        )
        .into());
    }

    let body = response.json::<T>().await.map_err(|e| {
        error!("Failed to parse {label} response: {e}");
        EcoRouteError::api(
            format!("Invalid data received from {label}"),
            ErrorCode::ApiInvalidResponse,
        )
    })?;

    let total = start_time.elapsed();
    if total.as_secs() > 5 {
        warn!("Slow {label} response: {:.3}s", total.as_secs_f64());
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client() {
        assert!(build_client(30, 3).is_ok());
        assert!(build_client(1, 0).is_ok());
    }

    #[test]
    fn test_build_url_encodes_values() {
        let url = build_url(
            "https://example.com/json",
            &[
                ("origin", "São Paulo, SP".to_string()),
                ("avoid", "highways|tolls".to_string()),
            ],
        );
        assert_eq!(
            url,
            "https://example.com/json?origin=S%C3%A3o%20Paulo%2C%20SP&avoid=highways%7Ctolls"
        );
        assert_eq!(build_url("https://example.com", &[]), "https://example.com");
    }
}
