//! Synthetic dataset generation and the training loop

use std::time::Instant;

use anyhow::{Context, Result};
use candle_core::Module;
use candle_nn::{AdamW, Optimizer, ParamsAdamW, loss};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngExt, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::features::{FEATURE_COUNT, RouteFeatures};
use super::network::{FeedForwardNetwork, column_tensor, rows_tensor};
use crate::config::ModelConfig;

/// Layer widths of the route model
pub const TOPOLOGY: [usize; 4] = [FEATURE_COUNT, 32, 16, 1];

const LABEL_NOISE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs: usize,
    pub final_loss: f64,
    pub validation_loss: f64,
    pub samples: usize,
}

/// One labelled example
#[derive(Debug, Clone)]
pub struct Sample {
    pub features: RouteFeatures,
    pub label: f64,
}

/// Uniformly sampled routes labelled with the noisy heuristic score
pub fn synthetic_samples(count: usize, rng: &mut StdRng) -> Vec<Sample> {
    (0..count)
        .map(|_| {
            let features = RouteFeatures {
                distance_km: rng.random_range(0.0..100.0),
                duration_min: rng.random_range(0.0..120.0),
                traffic: rng.random_range(0.0..1.0),
                weather_risk: rng.random_range(0.0..1.0),
                vehicle: rng.random_range(0.0..1.0),
                cargo_kg: rng.random_range(0.0..5000.0),
                time_of_day: rng.random_range(0.0..1.0),
            };
            let noise = rng.random_range(-LABEL_NOISE..=LABEL_NOISE);
            let label = (features.heuristic_score() + noise).clamp(0.0, 1.0);
            Sample { features, label }
        })
        .collect()
}

/// Train a fresh network on synthetic data. Deterministic for a given seed.
#[instrument(skip(config), fields(samples = config.samples, epochs = config.epochs))]
pub fn train(config: &ModelConfig) -> Result<(FeedForwardNetwork, TrainingReport)> {
    let start = Instant::now();
    let mut rng = StdRng::seed_from_u64(config.seed);

    let network = FeedForwardNetwork::new(&TOPOLOGY, &mut rng)
        .context("Failed to build route model")?;
    let samples = synthetic_samples(config.samples, &mut rng);

    let validation_len = ((samples.len() as f64) * config.validation_split).round() as usize;
    let validation_len = validation_len.min(samples.len());
    let (train_set, validation_set) = samples.split_at(samples.len() - validation_len);

    let mut train_set: Vec<(Vec<f64>, f64)> = train_set
        .iter()
        .map(|s| (s.features.to_input(), s.label))
        .collect();
    let validation_inputs: Vec<Vec<f64>> =
        validation_set.iter().map(|s| s.features.to_input()).collect();
    let validation_targets: Vec<f64> = validation_set.iter().map(|s| s.label).collect();

    // Plain Adam: AdamW without weight decay
    let params = ParamsAdamW {
        lr: config.learning_rate,
        weight_decay: 0.0,
        ..ParamsAdamW::default()
    };
    let mut optimizer =
        AdamW::new(network.vars(), params).context("Failed to create optimiser")?;

    let batch_size = config.batch_size.max(1);
    let device = network.device().clone();
    let mut final_loss = 0.0;
    let mut validation_loss = 0.0;

    for epoch in 1..=config.epochs {
        train_set.shuffle(&mut rng);

        let mut epoch_loss = 0.0;
        for chunk in train_set.chunks(batch_size) {
            let (inputs, targets): (Vec<Vec<f64>>, Vec<f64>) = chunk.iter().cloned().unzip();
            let xs = rows_tensor(&inputs, &device)?;
            let ys = column_tensor(&targets, &device)?;

            let loss = loss::mse(&network.forward(&xs)?, &ys)?;
            optimizer.backward_step(&loss)?;
            epoch_loss += loss.to_scalar::<f64>()? * chunk.len() as f64;
        }

        final_loss = if train_set.is_empty() {
            0.0
        } else {
            epoch_loss / train_set.len() as f64
        };
        validation_loss = network.mse(&validation_inputs, &validation_targets)?;
        debug!(
            "Epoch {}: loss = {:.4}, val_loss = {:.4}",
            epoch, final_loss, validation_loss
        );
    }

    info!(
        "Trained route model in {:.2?}: loss = {:.4}, val_loss = {:.4}",
        start.elapsed(),
        final_loss,
        validation_loss
    );

    let report = TrainingReport {
        epochs: config.epochs,
        final_loss,
        validation_loss,
        samples: samples.len(),
    };
    Ok((network, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_samples_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let samples = synthetic_samples(500, &mut rng);
        assert_eq!(samples.len(), 500);
        for sample in &samples {
            let f = sample.features;
            assert!((0.0..100.0).contains(&f.distance_km));
            assert!((0.0..120.0).contains(&f.duration_min));
            assert!((0.0..5000.0).contains(&f.cargo_kg));
            assert!((0.0..=1.0).contains(&sample.label));
            assert!((sample.label - f.heuristic_score()).abs() <= LABEL_NOISE + 1e-12);
        }
    }

    #[test]
    fn test_training_learns_the_heuristic() {
        let config = ModelConfig::default();
        let (network, report) = train(&config).unwrap();

        assert_eq!(report.samples, 1000);
        assert_eq!(report.epochs, 50);

        // Baseline: always predicting the mean label
        let mut rng = StdRng::seed_from_u64(99);
        let holdout = synthetic_samples(200, &mut rng);
        let mean = holdout.iter().map(|s| s.label).sum::<f64>() / holdout.len() as f64;
        let variance =
            holdout.iter().map(|s| (s.label - mean).powi(2)).sum::<f64>() / holdout.len() as f64;

        assert!(
            report.validation_loss < variance / 2.0,
            "validation loss {} vs label variance {}",
            report.validation_loss,
            variance
        );

        let short = RouteFeatures {
            distance_km: 5.0,
            duration_min: 10.0,
            traffic: 0.0,
            weather_risk: 0.0,
            vehicle: 0.2,
            cargo_kg: 100.0,
            time_of_day: 0.5,
        };
        let long = RouteFeatures {
            distance_km: 95.0,
            duration_min: 115.0,
            traffic: 0.9,
            ..short
        };
        let short_score = network.predict(&short.to_input()).unwrap();
        let long_score = network.predict(&long.to_input()).unwrap();
        assert!(short_score > long_score, "{short_score} vs {long_score}");
    }

    #[test]
    fn test_training_is_reproducible() {
        let config = ModelConfig {
            samples: 100,
            epochs: 3,
            ..ModelConfig::default()
        };
        let (a, report_a) = train(&config).unwrap();
        let (b, report_b) = train(&config).unwrap();
        assert_eq!(report_a.samples, report_b.samples);
        assert!((report_a.final_loss - report_b.final_loss).abs() < 1e-9);
        assert!((report_a.validation_loss - report_b.validation_loss).abs() < 1e-9);
        let input = [0.3, 0.2, 0.1, 0.0, 0.5, 0.4, 0.5];
        assert!((a.predict(&input).unwrap() - b.predict(&input).unwrap()).abs() < 1e-9);
    }
}
