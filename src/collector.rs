use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::model::{SampleSet, StatObservation};

/// Selects the games against `opponent_id`, or every game when fewer than
/// `min_sample_size` (or zero) opponent games exist.
pub fn collect(
    history: &[StatObservation],
    opponent_id: &str,
    min_sample_size: usize,
) -> Result<SampleSet> {
    collect_recent(history, opponent_id, min_sample_size, None)
}

/// Like [`collect`], then keeps the `lookback` most recent games of the chosen
/// pool. The fallback decision is made before the lookback cut.
pub fn collect_recent(
    history: &[StatObservation],
    opponent_id: &str,
    min_sample_size: usize,
    lookback: Option<usize>,
) -> Result<SampleSet> {
    if history.is_empty() {
        return Err(EngineError::insufficient(format!(
            "empty game history (opponent {opponent_id})"
        )));
    }

    let key = normalize_opponent(opponent_id);
    let matched: Vec<&StatObservation> = history
        .iter()
        .filter(|o| normalize_opponent(&o.opponent_id) == key)
        .collect();

    let used_fallback = matched.is_empty() || matched.len() < min_sample_size;
    let mut pool: Vec<StatObservation> = if used_fallback {
        warn!(
            opponent = opponent_id,
            matched = matched.len(),
            min_sample_size,
            total = history.len(),
            "opponent sample too small, using full history"
        );
        history.to_vec()
    } else {
        matched.into_iter().cloned().collect()
    };

    if let Some(n) = lookback.filter(|n| *n > 0) {
        // Newest first; stable so same-day games keep provider order.
        pool.sort_by(|a, b| b.game_date.cmp(&a.game_date));
        pool.truncate(n);
    }

    debug!(
        opponent = opponent_id,
        sample_size = pool.len(),
        used_fallback,
        "collected sample"
    );
    SampleSet::new(pool, opponent_id, used_fallback)
}

fn normalize_opponent(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}
