use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub const DEFAULT_TRIALS: usize = 10_000;
pub const DEFAULT_MIN_SAMPLE_SIZE: usize = 3;
pub const DEFAULT_NOISE_SCALE: f64 = 0.10;
pub const DEFAULT_TARGET_SAMPLE_SIZE: usize = 10;
pub const DEFAULT_FALLBACK_DISCOUNT: f64 = 0.75;
pub const DEFAULT_BOOKMAKER: &str = "draftkings";
/// Largest discount `from_env` will accept; 1.0 would leave fallback pools unpenalized.
pub const MAX_FALLBACK_DISCOUNT: f64 = 0.99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Simulated outcomes per estimation.
    pub trials: usize,
    /// Opponent-specific games needed before the opponent pool is trusted.
    pub min_sample_size: usize,
    /// Keep only the most recent N games of the chosen pool.
    pub lookback_games: Option<usize>,
    /// Noise spread as a multiple of the sample standard deviation.
    pub noise_scale: f64,
    /// Sample size at which the size component of confidence saturates.
    pub target_sample_size: usize,
    /// Multiplier applied to confidence when the fallback pool was used, in `[0, 1)`.
    pub fallback_discount: f64,
    pub seed: Option<u64>,
    /// Bookmaker key the odds adapter keeps; `None` keeps every bookmaker.
    pub bookmaker: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            min_sample_size: DEFAULT_MIN_SAMPLE_SIZE,
            lookback_games: None,
            noise_scale: DEFAULT_NOISE_SCALE,
            target_sample_size: DEFAULT_TARGET_SAMPLE_SIZE,
            fallback_discount: DEFAULT_FALLBACK_DISCOUNT,
            seed: None,
            bookmaker: Some(DEFAULT_BOOKMAKER.to_string()),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let trials = env::var("PROPSIM_TRIALS")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_TRIALS);
        let min_sample_size = env::var("PROPSIM_MIN_SAMPLE_SIZE")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_MIN_SAMPLE_SIZE)
            .clamp(0, 100);
        let lookback_games = env::var("PROPSIM_LOOKBACK_GAMES")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0);
        let noise_scale = env_f64("PROPSIM_NOISE_SCALE")
            .unwrap_or(DEFAULT_NOISE_SCALE)
            .clamp(0.0, 2.0);
        let target_sample_size = env::var("PROPSIM_TARGET_SAMPLE_SIZE")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_TARGET_SAMPLE_SIZE)
            .clamp(1, 500);
        let fallback_discount = env_f64("PROPSIM_FALLBACK_DISCOUNT")
            .unwrap_or(DEFAULT_FALLBACK_DISCOUNT)
            .clamp(0.0, MAX_FALLBACK_DISCOUNT);
        let seed = env::var("PROPSIM_SEED")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok());
        let bookmaker = match env::var("PROPSIM_BOOKMAKER") {
            Ok(v) => Some(v.trim().to_ascii_lowercase()).filter(|s| !s.is_empty()),
            Err(_) => Some(DEFAULT_BOOKMAKER.to_string()),
        };

        Self {
            trials,
            min_sample_size,
            lookback_games,
            noise_scale,
            target_sample_size,
            fallback_discount,
            seed,
            bookmaker,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(EngineError::invalid("trials must be positive"));
        }
        if !self.noise_scale.is_finite() || self.noise_scale < 0.0 {
            return Err(EngineError::invalid(format!(
                "noise_scale must be a non-negative number, got {}",
                self.noise_scale
            )));
        }
        if self.target_sample_size == 0 {
            return Err(EngineError::invalid("target_sample_size must be positive"));
        }
        if !(0.0..1.0).contains(&self.fallback_discount) {
            return Err(EngineError::invalid(format!(
                "fallback_discount must be within [0, 1), got {}",
                self.fallback_discount
            )));
        }
        Ok(())
    }
}

fn env_f64(key: &str) -> Option<f64> {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
