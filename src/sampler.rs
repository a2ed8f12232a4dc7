use rand::Rng;
use rand::distributions::Distribution;
use statrs::distribution::Normal;

use crate::error::{EngineError, Result};
use crate::model::{SampleSet, SimulatedDistribution};

/// Bootstrap draw with Gaussian jitter.
///
/// Each trial picks one historical value uniformly (with replacement) and adds
/// `N(0, noise_scale * sd)` where `sd` is the sample standard deviation.
/// Samples under two games get no jitter. Outcomes are floored at zero since
/// box-score counts cannot go negative.
pub fn simulate<R: Rng + ?Sized>(
    sample: &SampleSet,
    trials: usize,
    noise_scale: f64,
    rng: &mut R,
) -> Result<SimulatedDistribution> {
    if trials == 0 {
        return Err(EngineError::invalid("trials must be positive"));
    }
    if !noise_scale.is_finite() || noise_scale < 0.0 {
        return Err(EngineError::invalid(format!(
            "noise_scale must be a non-negative number, got {noise_scale}"
        )));
    }

    let values: Vec<f64> = sample.values().collect();
    let jitter = sample
        .std_dev()
        .map(|sd| sd * noise_scale)
        .filter(|sigma| *sigma > 0.0)
        .and_then(|sigma| Normal::new(0.0, sigma).ok());

    let mut outcomes = Vec::with_capacity(trials);
    for _ in 0..trials {
        let base = values[rng.gen_range(0..values.len())];
        let noise = match &jitter {
            Some(normal) => normal.sample(rng),
            None => 0.0,
        };
        outcomes.push((base + noise).max(0.0));
    }

    Ok(SimulatedDistribution::from_outcomes(outcomes))
}
