use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::collector;
use crate::confidence::{self, ConfidenceParams};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::estimator;
use crate::model::{EstimationResult, PropLine, PropRequest, StatCategory, StatObservation};
use crate::sampler;

/// Supplies per-athlete game history for one stat category.
///
/// `None` means the provider has nothing for the athlete; the engine reports
/// that as insufficient data rather than failing the batch.
pub trait HistoryProvider {
    fn history(&self, athlete: &str, category: StatCategory) -> Option<Vec<StatObservation>>;
}

#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub athlete: String,
    pub opponent_id: String,
    pub line: PropLine,
    pub result: Result<EstimationResult>,
}

#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Estimates one prop with a call-scoped RNG (seeded when the config has a seed).
    pub fn estimate(
        &self,
        history: &[StatObservation],
        opponent_id: &str,
        line: &PropLine,
    ) -> Result<EstimationResult> {
        let mut rng = self.call_rng(0);
        self.estimate_with_rng(history, opponent_id, line, &mut rng)
    }

    pub fn estimate_with_rng<R: Rng + ?Sized>(
        &self,
        history: &[StatObservation],
        opponent_id: &str,
        line: &PropLine,
        rng: &mut R,
    ) -> Result<EstimationResult> {
        line.validate()?;
        self.config.validate()?;

        let cfg = &self.config;
        let sample = collector::collect_recent(
            history,
            opponent_id,
            cfg.min_sample_size,
            cfg.lookback_games,
        )?;
        let distribution = sampler::simulate(&sample, cfg.trials, cfg.noise_scale, rng)?;

        let probability = estimator::estimate(&distribution, line.threshold, line.direction)?;
        let opposite_probability =
            estimator::estimate(&distribution, line.threshold, line.direction.opposite())?;
        let summary = estimator::summarize(&distribution)
            .ok_or_else(|| EngineError::invalid("empty simulated distribution"))?;

        let confidence = confidence::score(
            &sample,
            sample.used_fallback(),
            ConfidenceParams {
                target_sample_size: cfg.target_sample_size,
                fallback_discount: cfg.fallback_discount,
            },
        );

        debug!(
            line = %line,
            opponent = opponent_id,
            sample_size = sample.len(),
            probability,
            confidence,
            "estimated prop"
        );

        Ok(EstimationResult {
            probability,
            opposite_probability,
            confidence,
            sample_size: sample.len(),
            used_fallback: sample.used_fallback(),
            stat_category: line.stat_category,
            threshold: line.threshold,
            direction: line.direction,
            simulated_mean: summary.mean,
            simulated_median: summary.median,
        })
    }

    /// Runs every request independently and in parallel. Failures stay with
    /// their entry; output order matches `requests`.
    ///
    /// With a seed, each request's stream is keyed on athlete, opponent,
    /// category and threshold. Both sides of one line therefore see the same
    /// simulated outcomes, and a request's result does not depend on its
    /// position in the batch.
    pub fn estimate_batch<P>(&self, requests: &[PropRequest], provider: &P) -> Vec<BatchEntry>
    where
        P: HistoryProvider + Sync,
    {
        requests
            .par_iter()
            .map(|req| {
                let mut rng = self.call_rng(stream_key(req));
                let result = match provider.history(&req.athlete, req.line.stat_category) {
                    Some(history) => {
                        self.estimate_with_rng(&history, &req.opponent_id, &req.line, &mut rng)
                    }
                    None => Err(EngineError::insufficient(format!(
                        "no game log for {}",
                        req.athlete
                    ))),
                };
                if let Err(err) = &result {
                    warn!(athlete = %req.athlete, line = %req.line, error = %err, "skipping prop");
                }
                BatchEntry {
                    athlete: req.athlete.clone(),
                    opponent_id: req.opponent_id.clone(),
                    line: req.line,
                    result,
                }
            })
            .collect()
    }

    fn call_rng(&self, stream: u64) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ stream),
            None => StdRng::from_entropy(),
        }
    }
}

/// FNV-1a over the parts of a request that identify its line, direction excluded.
/// Stable across builds, unlike `DefaultHasher`.
fn stream_key(req: &PropRequest) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let athlete = req.athlete.trim().to_lowercase();
    let opponent = req.opponent_id.trim().to_ascii_uppercase();
    let threshold = req.line.threshold.to_bits().to_le_bytes();
    let parts: [&[u8]; 4] = [
        athlete.as_bytes(),
        opponent.as_bytes(),
        req.line.stat_category.market_key().as_bytes(),
        &threshold,
    ];

    let mut hash = OFFSET;
    for part in parts {
        for byte in part.iter().chain(&[0xff]) {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(PRIME);
        }
    }
    hash
}
