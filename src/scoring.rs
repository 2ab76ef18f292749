//! Per-route scoring and best-route selection

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::EcoRouteError;
use crate::emissions::{RouteMetrics, carbon_footprint, closed_form_score};
use crate::model::{RouteFeatures, RoutePredictor};
use crate::models::{RouteCandidate, VehicleType};
use crate::safety::WeatherAnalysis;

/// How route candidates are ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringStrategy {
    /// Learned regressor prediction
    #[default]
    Model,
    /// Weighted distance/fuel/traffic formula
    ClosedForm,
}

impl ScoringStrategy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringStrategy::Model => "model",
            ScoringStrategy::ClosedForm => "closed-form",
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringStrategy {
    type Err = EcoRouteError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "model" | "ml" => Ok(ScoringStrategy::Model),
            "closed-form" | "closedform" => Ok(ScoringStrategy::ClosedForm),
            other => Err(EcoRouteError::validation(format!(
                "Unknown scoring strategy: {other}"
            ))),
        }
    }
}

/// Everything besides the route itself that goes into a score
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub vehicle: VehicleType,
    pub cargo_weight_kg: f64,
    pub weather: WeatherAnalysis,
    /// Fraction of the day at departure
    pub time_of_day: f64,
}

/// A candidate with its score and derived figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRoute {
    pub candidate: RouteCandidate,
    pub score: f64,
    pub carbon_kg: f64,
    pub fuel_l: f64,
    pub metrics: RouteMetrics,
    pub is_best: bool,
}

pub struct RouteScorer {
    strategy: ScoringStrategy,
    predictor: Arc<dyn RoutePredictor>,
}

impl RouteScorer {
    pub fn new(strategy: ScoringStrategy, predictor: Arc<dyn RoutePredictor>) -> Self {
        Self {
            strategy,
            predictor,
        }
    }

    #[must_use]
    pub fn strategy(&self) -> ScoringStrategy {
        self.strategy
    }

    /// Score every candidate in provider order and flag the best one
    pub fn score_routes(
        &self,
        candidates: &[RouteCandidate],
        context: &ScoringContext,
    ) -> Result<Vec<ScoredRoute>> {
        let mut scored: Vec<ScoredRoute> = candidates
            .iter()
            .map(|candidate| -> Result<ScoredRoute> {
                let closed_form =
                    closed_form_score(candidate, context.vehicle, context.cargo_weight_kg);
                let score = match self.strategy {
                    ScoringStrategy::ClosedForm => closed_form.score,
                    ScoringStrategy::Model => {
                        let features = RouteFeatures::from_route(
                            candidate,
                            context.vehicle,
                            context.cargo_weight_kg,
                            &context.weather,
                            context.time_of_day,
                        );
                        self.predictor.predict(&features)?
                    }
                };
                Ok(ScoredRoute {
                    carbon_kg: carbon_footprint(
                        candidate.distance.value,
                        candidate.duration.value,
                        context.cargo_weight_kg,
                        context.vehicle,
                    ),
                    fuel_l: closed_form.metrics.fuel_l,
                    metrics: closed_form.metrics,
                    candidate: candidate.clone(),
                    score,
                    is_best: false,
                })
            })
            .collect::<Result<_>>()?;

        let scores: Vec<f64> = scored.iter().map(|s| s.score).collect();
        let best = select_best(&scores).unwrap_or_else(|| {
            if !scored.is_empty() {
                warn!("No comparable route score, keeping the provider's first route");
            }
            0
        });
        if let Some(route) = scored.get_mut(best) {
            route.is_best = true;
            debug!(
                "Best of {} routes is #{} with score {:.3}",
                scores.len(),
                best + 1,
                route.score
            );
        }
        Ok(scored)
    }
}

/// Index of the highest score; ties go to the earliest index and NaN never wins
#[must_use]
pub fn select_best(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::route::fixtures::candidate;
    use crate::safety::analyze_weather;
    use rstest::rstest;

    /// Predictor that prefers shorter routes, without training anything
    struct InverseDistance;

    impl RoutePredictor for InverseDistance {
        fn predict(&self, features: &RouteFeatures) -> Result<f64> {
            Ok(1.0 / (1.0 + features.distance_km))
        }
    }

    struct Unscored;

    impl RoutePredictor for Unscored {
        fn predict(&self, _features: &RouteFeatures) -> Result<f64> {
            Ok(f64::NAN)
        }
    }

    struct Broken;

    impl RoutePredictor for Broken {
        fn predict(&self, _features: &RouteFeatures) -> Result<f64> {
            Err(EcoRouteError::general("Route model training failed: boom").into())
        }
    }

    fn context() -> ScoringContext {
        ScoringContext {
            vehicle: VehicleType::Driving,
            cargo_weight_kg: 0.0,
            weather: analyze_weather(None),
            time_of_day: 0.5,
        }
    }

    #[rstest]
    #[case(&[0.4], Some(0))]
    #[case(&[0.2, 0.9, 0.5], Some(1))]
    #[case(&[0.7, 0.7, 0.3], Some(0))]
    #[case(&[0.1, 0.8, 0.8], Some(1))]
    #[case(&[f64::NAN, 0.1], Some(1))]
    #[case(&[0.3, f64::NAN, 0.2], Some(0))]
    #[case(&[f64::NAN, f64::NAN], None)]
    #[case(&[-1.0, -0.5], Some(1))]
    fn test_select_best(#[case] scores: &[f64], #[case] expected: Option<usize>) {
        assert_eq!(select_best(scores), expected);
    }

    #[test]
    fn test_select_best_is_an_arg_max() {
        let scores = [0.31, 0.77, 0.12, 0.77, 0.5, 0.05];
        let best = select_best(&scores).unwrap();
        assert!(scores.iter().all(|s| *s <= scores[best]));
        assert!(scores[..best].iter().all(|s| *s < scores[best]));
    }

    #[test]
    fn test_model_strategy_marks_shortest_best() {
        let scorer = RouteScorer::new(ScoringStrategy::Model, Arc::new(InverseDistance));
        let routes = vec![
            candidate(30_000.0, 1_800.0, None),
            candidate(12_000.0, 1_500.0, None),
            candidate(45_000.0, 2_400.0, None),
        ];
        let scored = scorer.score_routes(&routes, &context()).unwrap();

        assert_eq!(scored.len(), 3);
        let best: Vec<bool> = scored.iter().map(|s| s.is_best).collect();
        assert_eq!(best, vec![false, true, false]);
        assert!((scored[1].score - 1.0 / 13.0).abs() < 1e-12);
        assert!(scored.iter().all(|s| s.carbon_kg > 0.0));
    }

    #[test]
    fn test_closed_form_strategy_uses_formula() {
        let scorer = RouteScorer::new(ScoringStrategy::ClosedForm, Arc::new(InverseDistance));
        let routes = vec![
            candidate(10_000.0, 900.0, Some(1_800.0)),
            candidate(10_000.0, 900.0, None),
        ];
        let scored = scorer.score_routes(&routes, &context()).unwrap();

        assert!((scored[1].score - 0.95875).abs() < 1e-9);
        assert!(scored[1].is_best);
        assert!(!scored[0].is_best);
        assert_eq!(scored[0].metrics.traffic_level, 2.0);
    }

    #[test]
    fn test_no_candidates() {
        assert_eq!(select_best(&[]), None);
        let scorer = RouteScorer::new(ScoringStrategy::Model, Arc::new(InverseDistance));
        assert!(scorer.score_routes(&[], &context()).unwrap().is_empty());
    }

    #[test]
    fn test_first_route_is_best_without_comparable_scores() {
        let scorer = RouteScorer::new(ScoringStrategy::Model, Arc::new(Unscored));
        let routes = vec![
            candidate(30_000.0, 1_800.0, None),
            candidate(12_000.0, 1_500.0, None),
        ];
        let scored = scorer.score_routes(&routes, &context()).unwrap();

        let best: Vec<bool> = scored.iter().map(|s| s.is_best).collect();
        assert_eq!(best, vec![true, false]);
    }

    #[test]
    fn test_prediction_failure_is_an_error() {
        let scorer = RouteScorer::new(ScoringStrategy::Model, Arc::new(Broken));
        let routes = vec![candidate(30_000.0, 1_800.0, None)];
        let err = scorer.score_routes(&routes, &context()).unwrap_err();
        assert!(err.to_string().contains("training failed"));

        // The closed form never asks the predictor
        let scorer = RouteScorer::new(ScoringStrategy::ClosedForm, Arc::new(Broken));
        assert!(scorer.score_routes(&routes, &context()).unwrap()[0].is_best);
    }

    #[rstest]
    #[case("model", ScoringStrategy::Model)]
    #[case("Closed-Form", ScoringStrategy::ClosedForm)]
    #[case("closed_form", ScoringStrategy::ClosedForm)]
    fn test_parse_strategy(#[case] input: &str, #[case] expected: ScoringStrategy) {
        assert_eq!(input.parse::<ScoringStrategy>().unwrap(), expected);
    }

    #[test]
    fn test_parse_strategy_rejects_unknown() {
        assert!("random".parse::<ScoringStrategy>().is_err());
    }
}
