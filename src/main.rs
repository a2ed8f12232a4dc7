use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::info;
use tracing_subscriber::EnvFilter;

use propsim::config::EngineConfig;
use propsim::engine::Engine;
use propsim::{export, game_log, props};

const DEFAULT_LOGS_PATH: &str = "game_logs.json";
const DEFAULT_PROPS_PATH: &str = "nba_player_props.json";
const DEFAULT_ROSTERS_PATH: &str = "rosters.json";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    if has_flag("--help") || has_flag("-h") {
        print_usage();
        return Ok(());
    }

    let mut config = EngineConfig::from_env();
    if let Some(trials) = parse_u64_arg("--trials") {
        config.trials = usize::try_from(trials).context("--trials out of range")?;
    }
    if let Some(seed) = parse_u64_arg("--seed") {
        config.seed = Some(seed);
    }
    if let Some(n) = parse_u64_arg("--lookback") {
        config.lookback_games = usize::try_from(n).ok().filter(|n| *n > 0);
    }
    if let Some(book) = parse_str_arg("--bookmaker") {
        config.bookmaker = Some(book.to_ascii_lowercase());
    }
    if has_flag("--any-bookmaker") {
        config.bookmaker = None;
    }
    config
        .validate()
        .map_err(|e| anyhow!("bad configuration: {e}"))?;

    let logs_path = parse_path_arg("--logs").unwrap_or_else(|| PathBuf::from(DEFAULT_LOGS_PATH));
    let props_path =
        parse_path_arg("--props").unwrap_or_else(|| PathBuf::from(DEFAULT_PROPS_PATH));
    let rosters_path =
        parse_path_arg("--rosters").unwrap_or_else(|| PathBuf::from(DEFAULT_ROSTERS_PATH));

    // Array-form log files without per-row names belong to `--athlete`.
    let default_athlete = parse_str_arg("--athlete");
    let book = game_log::load_game_logs(&logs_path, default_athlete.as_deref())?;
    let rosters = props::load_rosters(&rosters_path)?;
    let parsed = props::load_props(&props_path, &rosters, config.bookmaker.as_deref())?;
    info!(
        athletes = book.len(),
        lines = parsed.listings.len(),
        rejected = parsed.rejected.len(),
        bookmaker = config.bookmaker.as_deref().unwrap_or("any"),
        "loaded inputs"
    );
    for reason in &parsed.rejected {
        info!(reason = %reason, "line skipped");
    }

    let engine = Engine::new(config);
    let entries = engine.estimate_batch(&parsed.to_requests(), &book);
    let ok = entries.iter().filter(|e| e.result.is_ok()).count();
    info!(estimated = ok, skipped = entries.len() - ok, "batch finished");

    print!("{}", export::render_table(&entries));

    if let Some(path) = parse_path_arg("--json") {
        export::write_json(&path, &entries)?;
        info!(path = %path.display(), "wrote json");
    }
    if let Some(path) = parse_path_arg("--xlsx") {
        export::write_xlsx(&path, &entries)?;
        info!(path = %path.display(), "wrote workbook");
    }

    Ok(())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,propsim=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_usage() {
    println!(
        "usage: propsim [--logs FILE [--athlete NAME]] [--props FILE] [--rosters FILE]\n\
         \x20              [--bookmaker KEY | --any-bookmaker] [--trials N] [--seed N]\n\
         \x20              [--lookback N] [--json OUT] [--xlsx OUT]"
    );
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

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_str_arg(name).map(PathBuf::from)
}

fn parse_u64_arg(name: &str) -> Option<u64> {
    parse_str_arg(name).and_then(|v| v.parse::<u64>().ok())
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
