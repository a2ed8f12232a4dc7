use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;

use crate::engine::BatchEntry;
use crate::model::{Direction, EstimationResult, StatCategory};

#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub athlete: String,
    pub opponent_id: String,
    /// Odds-provider market key, e.g. `player_points`.
    pub market: &'static str,
    pub stat_category: StatCategory,
    pub threshold: f64,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<EstimationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&BatchEntry> for ExportRow {
    fn from(entry: &BatchEntry) -> Self {
        let (result, error) = match &entry.result {
            Ok(r) => (Some(r.clone()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            athlete: entry.athlete.clone(),
            opponent_id: entry.opponent_id.clone(),
            market: entry.line.stat_category.market_key(),
            stat_category: entry.line.stat_category,
            threshold: entry.line.threshold,
            direction: entry.line.direction,
            result,
            error,
        }
    }
}

pub fn write_json(path: &Path, entries: &[BatchEntry]) -> Result<()> {
    let rows: Vec<ExportRow> = entries.iter().map(ExportRow::from).collect();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(&rows).context("serialize results")?;
    fs::write(&tmp, json).context("write results")?;
    fs::rename(&tmp, path).context("swap results")?;
    Ok(())
}

pub fn write_xlsx(path: &Path, entries: &[BatchEntry]) -> Result<()> {
    let mut result_rows = vec![vec![
        "Athlete".to_string(),
        "Opponent".to_string(),
        "Market".to_string(),
        "Stat".to_string(),
        "Line".to_string(),
        "Side".to_string(),
        "Probability %".to_string(),
        "Opposite %".to_string(),
        "Confidence".to_string(),
        "Games".to_string(),
        "All-opponent pool".to_string(),
        "Sim Mean".to_string(),
        "Sim Median".to_string(),
    ]];
    let mut failure_rows = vec![vec![
        "Athlete".to_string(),
        "Opponent".to_string(),
        "Market".to_string(),
        "Stat".to_string(),
        "Line".to_string(),
        "Side".to_string(),
        "Error".to_string(),
    ]];

    for entry in entries {
        match &entry.result {
            Ok(r) => result_rows.push(result_row(entry, r)),
            Err(e) => failure_rows.push(vec![
                entry.athlete.clone(),
                entry.opponent_id.clone(),
                entry.line.stat_category.market_key().to_string(),
                entry.line.stat_category.to_string(),
                entry.line.threshold.to_string(),
                entry.line.direction.to_string(),
                e.to_string(),
            ]),
        }
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Results")?;
        write_rows(sheet, &result_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Skipped")?;
        write_rows(sheet, &failure_rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

/// Fixed-width table for the terminal.
pub fn render_table(entries: &[BatchEntry]) -> String {
    let mut out = format!(
        "{:<24} {:<4} {:<4} {:>6} {:<5} {:>7} {:>6} {:>5}\n",
        "ATHLETE", "OPP", "STAT", "LINE", "SIDE", "PROB%", "CONF", "N"
    );
    for entry in entries {
        let head = format!(
            "{:<24} {:<4} {:<4} {:>6.1} {:<5}",
            truncate(&entry.athlete, 24),
            entry.opponent_id,
            entry.line.stat_category,
            entry.line.threshold,
            entry.line.direction,
        );
        match &entry.result {
            Ok(r) => {
                let pool = if r.used_fallback { "*" } else { "" };
                out.push_str(&format!(
                    "{head} {:>7.2} {:>6.2} {:>4}{pool}\n",
                    r.probability * 100.0,
                    r.confidence,
                    r.sample_size,
                ));
            }
            Err(e) => out.push_str(&format!("{head} skipped: {e}\n")),
        }
    }
    out
}

fn result_row(entry: &BatchEntry, r: &EstimationResult) -> Vec<String> {
    vec![
        entry.athlete.clone(),
        entry.opponent_id.clone(),
        r.stat_category.market_key().to_string(),
        r.stat_category.to_string(),
        r.threshold.to_string(),
        r.direction.to_string(),
        format!("{:.2}", r.probability * 100.0),
        format!("{:.2}", r.opposite_probability * 100.0),
        format!("{:.2}", r.confidence),
        r.sample_size.to_string(),
        r.used_fallback.to_string(),
        format!("{:.2}", r.simulated_mean),
        format!("{:.2}", r.simulated_median),
    ]
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::model::PropLine;

    fn entries() -> Vec<BatchEntry> {
        let line = PropLine::new(StatCategory::Points, 24.5, Direction::Over).unwrap();
        vec![
            BatchEntry {
                athlete: "Jayson Tatum".to_string(),
                opponent_id: "MIA".to_string(),
                line,
                result: Ok(EstimationResult {
                    probability: 0.4012,
                    opposite_probability: 0.5988,
                    confidence: 0.31,
                    sample_size: 5,
                    used_fallback: true,
                    stat_category: StatCategory::Points,
                    threshold: 24.5,
                    direction: Direction::Over,
                    simulated_mean: 23.0,
                    simulated_median: 22.0,
                }),
            },
            BatchEntry {
                athlete: "Rookie".to_string(),
                opponent_id: "MIA".to_string(),
                line,
                result: Err(EngineError::insufficient("empty game history")),
            },
        ]
    }

    #[test]
    fn table_marks_fallback_and_skips() {
        let table = render_table(&entries());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("40.12"));
        assert!(lines[1].ends_with("5*"));
        assert!(lines[2].contains("skipped: insufficient data"));
    }

    #[test]
    fn export_row_splits_result_and_error() {
        let rows: Vec<ExportRow> = entries().iter().map(ExportRow::from).collect();
        assert!(rows[0].result.is_some() && rows[0].error.is_none());
        assert!(rows[1].result.is_none() && rows[1].error.is_some());
        let json = serde_json::to_value(&rows[1]).unwrap();
        assert!(json.get("result").is_none());
        assert_eq!(json["direction"], "over");
        assert_eq!(json["market"], "player_points");
    }

    #[test]
    fn sheet_rows_carry_market_key() {
        let entries = entries();
        let BatchEntry { result: Ok(r), .. } = &entries[0] else {
            panic!("first entry should be estimated");
        };
        let row = result_row(&entries[0], r);
        assert_eq!(row[2], "player_points");
        assert_eq!(row[3], "PTS");
    }
}
