//! Learned route suitability model
//!
//! A small feed-forward regressor trained on synthetic routes whose labels
//! come from a fixed heuristic. It is trained once per process, on first use
//! or eagerly through [`RouteModel::ensure_trained`].

pub mod features;
pub mod network;
pub mod training;

use std::sync::OnceLock;

use anyhow::Result;

pub use features::RouteFeatures;
pub use network::FeedForwardNetwork;
pub use training::{TrainingReport, train};

use crate::EcoRouteError;
use crate::config::ModelConfig;

/// Anything that maps route features onto a 0-1 suitability score
pub trait RoutePredictor: Send + Sync {
    fn predict(&self, features: &RouteFeatures) -> Result<f64>;
}

impl RoutePredictor for FeedForwardNetwork {
    fn predict(&self, features: &RouteFeatures) -> Result<f64> {
        let score = FeedForwardNetwork::predict(self, &features.to_input())?;
        Ok(score.clamp(0.0, 1.0))
    }
}

type Trained = std::result::Result<(FeedForwardNetwork, TrainingReport), String>;

/// Lazily trained route model
pub struct RouteModel {
    config: ModelConfig,
    trained: OnceLock<Trained>,
}

impl RouteModel {
    #[must_use]
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            trained: OnceLock::new(),
        }
    }

    /// Train now if nobody has yet; returns the report of the single training run.
    /// A failed run is remembered and reported on every call.
    pub fn ensure_trained(&self) -> Result<&TrainingReport> {
        Ok(&self.trained()?.1)
    }

    #[must_use]
    pub fn is_trained(&self) -> bool {
        matches!(self.trained.get(), Some(Ok(_)))
    }

    fn trained(&self) -> Result<&(FeedForwardNetwork, TrainingReport)> {
        self.trained
            .get_or_init(|| train(&self.config).map_err(|e| format!("{e:#}")))
            .as_ref()
            .map_err(|message| {
                EcoRouteError::general(format!("Route model training failed: {message}")).into()
            })
    }
}

impl RoutePredictor for RouteModel {
    fn predict(&self, features: &RouteFeatures) -> Result<f64> {
        RoutePredictor::predict(&self.trained()?.0, features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ModelConfig {
        ModelConfig {
            samples: 200,
            epochs: 5,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_first_prediction_trains_once() {
        let model = RouteModel::new(small_config());
        assert!(!model.is_trained());

        let features = RouteFeatures {
            distance_km: 10.0,
            duration_min: 15.0,
            traffic: 0.1,
            weather_risk: 0.0,
            vehicle: 0.2,
            cargo_kg: 0.0,
            time_of_day: 0.4,
        };
        let first = model.predict(&features).unwrap();
        assert!(model.is_trained());
        assert!((0.0..=1.0).contains(&first));

        let report = model.ensure_trained().unwrap().clone();
        assert_eq!(model.predict(&features).unwrap(), first);
        assert_eq!(model.ensure_trained().unwrap(), &report);
    }
}
