use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// One historical game for one stat category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatObservation {
    pub value: f64,
    pub opponent_id: String,
    pub game_date: NaiveDate,
}

impl StatObservation {
    pub fn new(value: f64, opponent_id: impl Into<String>, game_date: NaiveDate) -> Self {
        Self {
            value,
            opponent_id: opponent_id.into(),
            game_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatCategory {
    Points,
    Rebounds,
    Assists,
    Threes,
    Blocks,
    Steals,
    Turnovers,
}

impl StatCategory {
    pub const ALL: [StatCategory; 7] = [
        StatCategory::Points,
        StatCategory::Rebounds,
        StatCategory::Assists,
        StatCategory::Threes,
        StatCategory::Blocks,
        StatCategory::Steals,
        StatCategory::Turnovers,
    ];

    /// Accepts odds-provider market keys (`player_points`) as well as bare names.
    pub fn from_market_key(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase();
        let key = key.strip_prefix("player_").unwrap_or(&key);
        match key {
            "points" | "pts" => Some(Self::Points),
            "rebounds" | "reb" => Some(Self::Rebounds),
            "assists" | "ast" => Some(Self::Assists),
            "threes" | "fg3m" => Some(Self::Threes),
            "blocks" | "blk" => Some(Self::Blocks),
            "steals" | "stl" => Some(Self::Steals),
            "turnovers" | "tov" => Some(Self::Turnovers),
            _ => None,
        }
    }

    pub fn market_key(self) -> &'static str {
        match self {
            Self::Points => "player_points",
            Self::Rebounds => "player_rebounds",
            Self::Assists => "player_assists",
            Self::Threes => "player_threes",
            Self::Blocks => "player_blocks",
            Self::Steals => "player_steals",
            Self::Turnovers => "player_turnovers",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Points => "PTS",
            Self::Rebounds => "REB",
            Self::Assists => "AST",
            Self::Threes => "3PM",
            Self::Blocks => "BLK",
            Self::Steals => "STL",
            Self::Turnovers => "TOV",
        }
    }
}

impl fmt::Display for StatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Over,
    Under,
}

impl Direction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "over" | "o" => Some(Self::Over),
            "under" | "u" => Some(Self::Under),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Over => Self::Under,
            Self::Under => Self::Over,
        }
    }

    /// Strict comparison: an outcome equal to the threshold clears neither side.
    pub fn clears(self, outcome: f64, threshold: f64) -> bool {
        match self {
            Self::Over => outcome > threshold,
            Self::Under => outcome < threshold,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Over => "Over",
            Self::Under => "Under",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropLine {
    pub stat_category: StatCategory,
    pub threshold: f64,
    pub direction: Direction,
}

impl PropLine {
    pub fn new(stat_category: StatCategory, threshold: f64, direction: Direction) -> Result<Self> {
        let line = Self {
            stat_category,
            threshold,
            direction,
        };
        line.validate()?;
        Ok(line)
    }

    /// Builds a line from loosely-typed provider fields. Every missing or
    /// unparseable part is an `InvalidConfiguration`.
    pub fn from_parts(market_key: &str, point: Option<f64>, side: Option<&str>) -> Result<Self> {
        let stat_category = StatCategory::from_market_key(market_key)
            .ok_or_else(|| EngineError::invalid(format!("unknown market `{market_key}`")))?;
        let threshold = point.ok_or_else(|| {
            EngineError::invalid(format!("missing threshold for market `{market_key}`"))
        })?;
        let direction = side.and_then(Direction::parse).ok_or_else(|| {
            EngineError::invalid(format!(
                "missing or unknown direction {:?} for market `{market_key}`",
                side.unwrap_or_default()
            ))
        })?;
        Self::new(stat_category, threshold, direction)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(EngineError::invalid(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

impl fmt::Display for PropLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.stat_category, self.direction, self.threshold
        )
    }
}

/// Observations selected for one estimation. Never empty, every value finite.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    observations: Vec<StatObservation>,
    opponent_id: String,
    used_fallback: bool,
}

impl SampleSet {
    pub fn new(
        observations: Vec<StatObservation>,
        opponent_id: impl Into<String>,
        used_fallback: bool,
    ) -> Result<Self> {
        let opponent_id = opponent_id.into();
        if observations.is_empty() {
            return Err(EngineError::insufficient(format!(
                "no historical observations (opponent {opponent_id})"
            )));
        }
        if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
            return Err(EngineError::invalid(format!(
                "observation on {} vs {} is not a finite number: {}",
                bad.game_date, bad.opponent_id, bad.value
            )));
        }
        Ok(Self {
            observations,
            opponent_id,
            used_fallback,
        })
    }

    pub fn observations(&self) -> &[StatObservation] {
        &self.observations
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|o| o.value)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn opponent_id(&self) -> &str {
        &self.opponent_id
    }

    /// True when the opponent-specific pool was too small and all games were used.
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    pub fn mean(&self) -> f64 {
        self.values().sum::<f64>() / self.len() as f64
    }

    /// Sample standard deviation (n - 1). `None` below two observations.
    pub fn std_dev(&self) -> Option<f64> {
        let n = self.len();
        if n < 2 {
            return None;
        }
        let mean = self.mean();
        let ss = self.values().map(|v| (v - mean).powi(2)).sum::<f64>();
        Some((ss / (n - 1) as f64).sqrt())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulatedDistribution {
    outcomes: Vec<f64>,
}

impl SimulatedDistribution {
    pub fn from_outcomes(outcomes: Vec<f64>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[f64] {
        &self.outcomes
    }

    pub fn trials(&self) -> usize {
        self.outcomes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub probability: f64,
    /// Probability of the other side of the same line; ties count for neither.
    pub opposite_probability: f64,
    pub confidence: f64,
    pub sample_size: usize,
    pub used_fallback: bool,
    pub stat_category: StatCategory,
    pub threshold: f64,
    pub direction: Direction,
    pub simulated_mean: f64,
    pub simulated_median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropRequest {
    pub athlete: String,
    pub opponent_id: String,
    pub line: PropLine,
}
