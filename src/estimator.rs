use std::cmp::Ordering;

use crate::error::{EngineError, Result};
use crate::model::{Direction, SimulatedDistribution};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionSummary {
    pub mean: f64,
    pub median: f64,
}

/// Fraction of simulated outcomes strictly beyond `threshold` in `direction`.
///
/// Outcomes exactly on the line are a push and count toward neither side, so
/// `over + under` can be below 1 for whole-number lines.
pub fn estimate(
    distribution: &SimulatedDistribution,
    threshold: f64,
    direction: Direction,
) -> Result<f64> {
    let trials = distribution.trials();
    if trials == 0 {
        return Err(EngineError::invalid(
            "cannot estimate from an empty distribution (trials = 0)",
        ));
    }
    if !threshold.is_finite() {
        return Err(EngineError::invalid(format!(
            "threshold must be finite, got {threshold}"
        )));
    }

    let hits = distribution
        .outcomes()
        .iter()
        .filter(|v| direction.clears(**v, threshold))
        .count();
    Ok((hits as f64 / trials as f64).clamp(0.0, 1.0))
}

pub fn summarize(distribution: &SimulatedDistribution) -> Option<DistributionSummary> {
    let outcomes = distribution.outcomes();
    if outcomes.is_empty() {
        return None;
    }
    let mean = outcomes.iter().sum::<f64>() / outcomes.len() as f64;

    let mut sorted = outcomes.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    Some(DistributionSummary { mean, median })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(values: &[f64]) -> SimulatedDistribution {
        SimulatedDistribution::from_outcomes(values.to_vec())
    }

    #[test]
    fn counts_strictly_over_and_under() {
        let d = dist(&[20.0, 24.0, 24.0, 25.0, 30.0]);
        assert!((estimate(&d, 24.0, Direction::Over).unwrap() - 0.4).abs() < 1e-12);
        assert!((estimate(&d, 24.0, Direction::Under).unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn empty_distribution_is_invalid() {
        let err = estimate(&dist(&[]), 10.5, Direction::Over).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }

    #[test]
    fn far_lines_are_not_errors() {
        let d = dist(&[20.0, 22.0]);
        assert_eq!(estimate(&d, -100.0, Direction::Over).unwrap(), 1.0);
        assert_eq!(estimate(&d, 1000.0, Direction::Over).unwrap(), 0.0);
    }

    #[test]
    fn summary_median_handles_even_length() {
        let s = summarize(&dist(&[4.0, 1.0, 3.0, 2.0])).unwrap();
        assert!((s.mean - 2.5).abs() < 1e-12);
        assert!((s.median - 2.5).abs() < 1e-12);
        assert!(summarize(&dist(&[])).is_none());
    }
}
