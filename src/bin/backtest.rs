use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use propsim::calibration;
use propsim::config::EngineConfig;
use propsim::engine::Engine;
use propsim::game_log;
use propsim::model::{Direction, PropLine, StatCategory};

const DEFAULT_SEED: u64 = 2024;
const DEFAULT_BINS: usize = 10;

/// Walk-forward check: every game is predicted from the games before it only.
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let logs_path = parse_str_arg("--logs")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("game_logs.json"));
    let athlete = parse_str_arg("--athlete").context("--athlete is required")?;
    let stat_raw = parse_str_arg("--stat").unwrap_or_else(|| "points".to_string());
    let category = StatCategory::from_market_key(&stat_raw)
        .ok_or_else(|| anyhow!("unknown --stat {stat_raw}"))?;
    let threshold = parse_f64_arg("--line").context("--line is required")?;
    let side_raw = parse_str_arg("--side").unwrap_or_else(|| "over".to_string());
    let direction =
        Direction::parse(&side_raw).ok_or_else(|| anyhow!("unknown --side {side_raw}"))?;
    let line = PropLine::new(category, threshold, direction)?;

    let mut config = EngineConfig::from_env();
    let seed = config.seed.unwrap_or(DEFAULT_SEED);
    config.seed = Some(seed);
    let engine = Engine::new(config);

    let book = game_log::load_game_logs(&logs_path, Some(&athlete))?;
    let rows = book
        .rows(&athlete)
        .ok_or_else(|| anyhow!("no game log for {athlete}"))?;
    let mut games = game_log::observations(rows, category);
    games.sort_by(|a, b| a.game_date.cmp(&b.game_date));

    let mut predictions = Vec::new();
    let mut outcomes = Vec::new();
    let mut pushes = 0usize;
    let warmup = engine.config().min_sample_size.max(1);

    for idx in warmup..games.len() {
        let game = &games[idx];
        if game.value == threshold {
            pushes += 1;
            continue;
        }
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(idx as u64));
        let result =
            engine.estimate_with_rng(&games[..idx], &game.opponent_id, &line, &mut rng)?;
        let hit = direction.clears(game.value, threshold);
        debug!(
            date = %game.game_date,
            opponent = %game.opponent_id,
            value = game.value,
            probability = result.probability,
            hit,
            "walk-forward game"
        );
        predictions.push(result.probability);
        outcomes.push(hit);
    }

    if predictions.is_empty() {
        return Err(anyhow!(
            "not enough games for {athlete}: {} logged, {warmup} needed before the first prediction",
            games.len()
        ));
    }

    let metrics = calibration::evaluate(&predictions, &outcomes);
    let bins = calibration::reliability_bins(&predictions, &outcomes, DEFAULT_BINS);
    let base_rate = outcomes.iter().filter(|h| **h).count() as f64 / outcomes.len() as f64;

    println!("Athlete: {athlete}");
    println!("Line: {line}");
    println!("Games scored: {} (pushes skipped: {pushes})", metrics.samples);
    println!("Hit rate: {:.1}%", base_rate * 100.0);
    println!("Brier: {:.4}", metrics.brier);
    println!("Log loss: {:.4}", metrics.log_loss);
    println!("Accuracy: {:.1}%", metrics.accuracy * 100.0);
    println!("ECE: {:.4}", calibration::expected_calibration_error(&bins));
    for bin in &bins {
        println!(
            "  [{:.1}, {:.1}) n={:<4} pred={:.3} actual={:.3}",
            bin.bucket_start, bin.bucket_end, bin.count, bin.avg_pred, bin.actual_rate
        );
    }

    Ok(())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,propsim=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_str_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && !raw.trim().is_empty()
        {
            return Some(raw.trim().to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_f64_arg(name: &str) -> Option<f64> {
    parse_str_arg(name).and_then(|v| v.parse::<f64>().ok())
}
