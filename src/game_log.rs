use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::engine::HistoryProvider;
use crate::model::{StatCategory, StatObservation};

/// One box-score line as delivered by the stats provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLogRow {
    #[serde(alias = "GAME_DATE", deserialize_with = "deserialize_game_date")]
    pub game_date: NaiveDate,
    /// Needed only in array-form files that mix athletes.
    #[serde(default, alias = "PLAYER_NAME", skip_serializing_if = "Option::is_none")]
    pub athlete: Option<String>,
    #[serde(default)]
    pub opponent: Option<String>,
    /// Provider matchup string, e.g. `LAL vs. BOS` or `LAL @ BOS`.
    #[serde(default, alias = "MATCHUP")]
    pub matchup: Option<String>,
    #[serde(default, alias = "PTS")]
    pub pts: f64,
    #[serde(default, alias = "REB")]
    pub reb: f64,
    #[serde(default, alias = "AST")]
    pub ast: f64,
    #[serde(default, alias = "FG3M")]
    pub fg3m: f64,
    #[serde(default, alias = "BLK")]
    pub blk: f64,
    #[serde(default, alias = "STL")]
    pub stl: f64,
    #[serde(default, alias = "TOV")]
    pub tov: f64,
}

/// ISO dates, or the stats provider's `APR 14, 2024` form.
const GAME_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%b %d, %Y"];

fn deserialize_game_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    GAME_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized game date `{raw}`")))
}

impl GameLogRow {
    pub fn stat(&self, category: StatCategory) -> f64 {
        match category {
            StatCategory::Points => self.pts,
            StatCategory::Rebounds => self.reb,
            StatCategory::Assists => self.ast,
            StatCategory::Threes => self.fg3m,
            StatCategory::Blocks => self.blk,
            StatCategory::Steals => self.stl,
            StatCategory::Turnovers => self.tov,
        }
    }

    /// Explicit opponent, else the last token of the matchup string.
    pub fn opponent_id(&self) -> Option<String> {
        if let Some(opp) = self.opponent.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return Some(opp.to_ascii_uppercase());
        }
        self.matchup
            .as_deref()
            .and_then(|m| m.split_whitespace().last())
            .filter(|tok| tok.chars().all(|c| c.is_ascii_alphabetic()))
            .map(str::to_ascii_uppercase)
    }
}

/// Projects rows onto one category. Rows without an identifiable opponent are dropped.
pub fn observations(rows: &[GameLogRow], category: StatCategory) -> Vec<StatObservation> {
    rows.iter()
        .filter_map(|row| {
            let opponent = row.opponent_id()?;
            Some(StatObservation::new(row.stat(category), opponent, row.game_date))
        })
        .collect()
}

/// Game logs for many athletes keyed by normalized name.
#[derive(Debug, Clone, Default)]
pub struct GameLogBook {
    by_athlete: HashMap<String, Vec<GameLogRow>>,
}

impl GameLogBook {
    pub fn insert(&mut self, athlete: &str, rows: Vec<GameLogRow>) {
        self.by_athlete
            .entry(normalize_name(athlete))
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, athlete: &str) -> Option<&[GameLogRow]> {
        self.by_athlete
            .get(&normalize_name(athlete))
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.by_athlete.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_athlete.is_empty()
    }
}

impl HistoryProvider for GameLogBook {
    fn history(&self, athlete: &str, category: StatCategory) -> Option<Vec<StatObservation>> {
        self.rows(athlete).map(|rows| observations(rows, category))
    }
}

/// A game-log file is either an object of athlete -> rows or one array of rows.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GameLogFile {
    ByAthlete(HashMap<String, Vec<GameLogRow>>),
    Rows(Vec<GameLogRow>),
}

/// Parses either file form. Array rows are filed under their own `athlete`
/// field, else under `default_athlete`; a row with neither is an error.
pub fn parse_game_logs_json(raw: &str, default_athlete: Option<&str>) -> Result<GameLogBook> {
    let parsed: Option<GameLogFile> = serde_json::from_str(raw).context("invalid game log json")?;
    let mut book = GameLogBook::default();
    match parsed {
        None => {}
        Some(GameLogFile::ByAthlete(map)) => {
            for (athlete, rows) in map {
                book.insert(&athlete, rows);
            }
        }
        Some(GameLogFile::Rows(rows)) => {
            for row in rows {
                let athlete = row
                    .athlete
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .or(default_athlete)
                    .ok_or_else(|| {
                        anyhow!("game log row on {} names no athlete; pass one", row.game_date)
                    })?
                    .to_string();
                book.insert(&athlete, vec![row]);
            }
        }
    }
    Ok(book)
}

pub fn load_game_logs(path: &Path, default_athlete: Option<&str>) -> Result<GameLogBook> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading game logs {}", path.display()))?;
    parse_game_logs_json(&raw, default_athlete)
        .with_context(|| format!("failed parsing game logs {}", path.display()))
}

pub fn normalize_name(input: &str) -> String {
    let lower = input.trim().to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut prev_us = false;
    for ch in lower.chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            prev_us = false;
        } else if ch == '.' || ch == '\'' {
            // "C.J." and "De'Aaron" match "CJ" and "DeAaron".
            continue;
        } else if !prev_us && !out.is_empty() {
            out.push('_');
            prev_us = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGS: &str = r#"{
        "Jayson Tatum": [
            {"game_date": "2024-01-05", "opponent": "nyk", "pts": 31, "reb": 8, "ast": 4},
            {"GAME_DATE": "2024-01-09", "MATCHUP": "BOS @ MIA", "PTS": 24, "REB": 11},
            {"game_date": "2024-01-12", "pts": 19}
        ]
    }"#;

    #[test]
    fn normalize_name_collapses_punctuation() {
        assert_eq!(normalize_name(" C.J. McCollum "), "cj_mccollum");
        assert_eq!(normalize_name("De'Aaron Fox"), "deaaron_fox");
        assert_eq!(normalize_name("Jayson  Tatum"), "jayson_tatum");
    }

    #[test]
    fn opponent_comes_from_field_or_matchup() {
        let book = parse_game_logs_json(LOGS, None).unwrap();
        let rows = book.rows("jayson tatum").unwrap();
        assert_eq!(rows[0].opponent_id().as_deref(), Some("NYK"));
        assert_eq!(rows[1].opponent_id().as_deref(), Some("MIA"));
        assert!(rows[2].opponent_id().is_none());
    }

    #[test]
    fn provider_projects_requested_category() {
        let book = parse_game_logs_json(LOGS, None).unwrap();
        let reb = book.history("Jayson Tatum", StatCategory::Rebounds).unwrap();
        assert_eq!(reb.len(), 2);
        assert_eq!(reb[1].value, 11.0);
        assert!(book.history("Nobody", StatCategory::Points).is_none());
    }

    #[test]
    fn null_is_empty() {
        assert!(parse_game_logs_json("null", None).unwrap().is_empty());
        assert!(parse_game_logs_json("[]", None).unwrap().is_empty());
    }

    #[test]
    fn provider_dates_parse_in_either_format() {
        let raw = r#"[
            {"GAME_DATE": "APR 14, 2024", "MATCHUP": "BOS vs. WAS", "PTS": 31},
            {"GAME_DATE": "Apr 12, 2024", "MATCHUP": "BOS @ CHA", "PTS": 22},
            {"GAME_DATE": "2024-04-10", "MATCHUP": "BOS vs. MIL", "PTS": 27}
        ]"#;
        let book = parse_game_logs_json(raw, Some("Jayson Tatum")).unwrap();
        let rows = book.rows("Jayson Tatum").unwrap();
        assert_eq!(rows[0].game_date, NaiveDate::from_ymd_opt(2024, 4, 14).unwrap());
        assert_eq!(rows[1].game_date, NaiveDate::from_ymd_opt(2024, 4, 12).unwrap());
        assert_eq!(rows[0].opponent_id().as_deref(), Some("WAS"));
        assert!(parse_game_logs_json(r#"[{"GAME_DATE": "14/04/2024"}]"#, Some("x")).is_err());
    }

    #[test]
    fn array_rows_group_by_athlete_field_or_default() {
        let raw = r#"[
            {"game_date": "2024-01-05", "PLAYER_NAME": "Bam Adebayo", "opponent": "BOS", "reb": 12},
            {"game_date": "2024-01-06", "opponent": "NYK", "reb": 9}
        ]"#;
        let book = parse_game_logs_json(raw, Some("Jimmy Butler")).unwrap();
        assert_eq!(book.len(), 2);
        assert_eq!(book.rows("bam adebayo").unwrap().len(), 1);
        assert_eq!(book.rows("Jimmy Butler").unwrap()[0].reb, 9.0);
        assert!(parse_game_logs_json(raw, None).is_err());
    }

    #[test]
    fn load_accepts_array_files() {
        let path = std::env::temp_dir().join(format!(
            "propsim_game_log_rows_{}.json",
            std::process::id()
        ));
        let raw = r#"[{"GAME_DATE": "APR 14, 2024", "MATCHUP": "BOS vs. WAS", "PTS": 31}]"#;
        fs::write(&path, raw).unwrap();
        let book = load_game_logs(&path, Some("Jayson Tatum"));
        fs::remove_file(&path).ok();
        let history = book.unwrap().history("Jayson Tatum", StatCategory::Points).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].value, 31.0);
        assert_eq!(history[0].opponent_id, "WAS");
    }
}
