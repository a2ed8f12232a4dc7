use crate::model::SampleSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceParams {
    pub target_sample_size: usize,
    pub fallback_discount: f64,
}

impl Default for ConfidenceParams {
    fn default() -> Self {
        Self {
            target_sample_size: crate::config::DEFAULT_TARGET_SAMPLE_SIZE,
            fallback_discount: crate::config::DEFAULT_FALLBACK_DISCOUNT,
        }
    }
}

/// Confidence in [0, 1]: `size * consistency * discount`.
///
/// - size = `min(1, n / target_sample_size)`
/// - consistency = `1 / (1 + cv)` with cv the coefficient of variation
/// - discount = `fallback_discount` when the full-history pool was used, else 1
///
/// A single game has undefined variance and is scored as maximal dispersion,
/// which makes its confidence zero.
pub fn score(sample: &SampleSet, used_fallback_pool: bool, params: ConfidenceParams) -> f64 {
    let target = params.target_sample_size.max(1) as f64;
    let size = (sample.len() as f64 / target).min(1.0);

    let consistency = match coefficient_of_variation(sample) {
        Some(cv) => 1.0 / (1.0 + cv),
        None => 0.0,
    };

    let discount = if used_fallback_pool {
        params.fallback_discount.clamp(0.0, 1.0)
    } else {
        1.0
    };

    (size * consistency * discount).clamp(0.0, 1.0)
}

/// `sd / |mean|`; `None` stands for unbounded dispersion.
fn coefficient_of_variation(sample: &SampleSet) -> Option<f64> {
    let sd = sample.std_dev()?;
    if sd == 0.0 {
        return Some(0.0);
    }
    let mean = sample.mean().abs();
    if mean < 1e-9 {
        return None;
    }
    Some(sd / mean)
}
