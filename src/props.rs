use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::game_log::normalize_name;
use crate::model::{Direction, PropLine, PropRequest, StatCategory};

const NBA_TEAMS: &[(&str, &str)] = &[
    ("Atlanta Hawks", "ATL"),
    ("Boston Celtics", "BOS"),
    ("Brooklyn Nets", "BKN"),
    ("Charlotte Hornets", "CHA"),
    ("Chicago Bulls", "CHI"),
    ("Cleveland Cavaliers", "CLE"),
    ("Dallas Mavericks", "DAL"),
    ("Denver Nuggets", "DEN"),
    ("Detroit Pistons", "DET"),
    ("Golden State Warriors", "GSW"),
    ("Houston Rockets", "HOU"),
    ("Indiana Pacers", "IND"),
    ("Los Angeles Clippers", "LAC"),
    ("Los Angeles Lakers", "LAL"),
    ("Memphis Grizzlies", "MEM"),
    ("Miami Heat", "MIA"),
    ("Milwaukee Bucks", "MIL"),
    ("Minnesota Timberwolves", "MIN"),
    ("New Orleans Pelicans", "NOP"),
    ("New York Knicks", "NYK"),
    ("Oklahoma City Thunder", "OKC"),
    ("Orlando Magic", "ORL"),
    ("Philadelphia 76ers", "PHI"),
    ("Phoenix Suns", "PHX"),
    ("Portland Trail Blazers", "POR"),
    ("Sacramento Kings", "SAC"),
    ("San Antonio Spurs", "SAS"),
    ("Toronto Raptors", "TOR"),
    ("Utah Jazz", "UTA"),
    ("Washington Wizards", "WAS"),
];

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EventsFile {
    ById(BTreeMap<String, OddsEvent>),
    List(Vec<OddsEvent>),
}

#[derive(Debug, Deserialize)]
struct OddsEvent {
    #[serde(default)]
    id: Option<String>,
    home_team: String,
    away_team: String,
    #[serde(default)]
    bookmakers: Vec<OddsBookmaker>,
}

#[derive(Debug, Deserialize)]
struct OddsBookmaker {
    key: String,
    #[serde(default)]
    markets: Vec<OddsMarket>,
}

#[derive(Debug, Deserialize)]
struct OddsMarket {
    key: String,
    #[serde(default)]
    outcomes: Vec<OddsOutcome>,
}

#[derive(Debug, Deserialize)]
struct OddsOutcome {
    #[serde(default)]
    name: Option<String>,
    /// Athlete name for player markets.
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    point: Option<serde_json::Value>,
    #[serde(default)]
    price: Option<f64>,
}

/// One bookmaker line for one athlete, resolved against its opponent.
#[derive(Debug, Clone, PartialEq)]
pub struct PropListing {
    pub event_id: String,
    pub athlete: String,
    pub opponent_id: String,
    pub bookmaker: String,
    pub line: PropLine,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedProps {
    pub listings: Vec<PropListing>,
    /// Human-readable reasons for lines that were dropped.
    pub rejected: Vec<String>,
}

impl ParsedProps {
    pub fn to_requests(&self) -> Vec<PropRequest> {
        self.listings
            .iter()
            .map(|l| PropRequest {
                athlete: l.athlete.clone(),
                opponent_id: l.opponent_id.clone(),
                line: l.line,
            })
            .collect()
    }
}

/// `wanted = None` keeps every bookmaker.
pub fn bookmaker_matches(key: &str, wanted: Option<&str>) -> bool {
    match wanted {
        Some(w) => key.trim().eq_ignore_ascii_case(w.trim()),
        None => true,
    }
}

pub fn team_abbreviation(team: &str) -> Option<&'static str> {
    let t = team.trim();
    NBA_TEAMS
        .iter()
        .find(|(name, abbr)| name.eq_ignore_ascii_case(t) || abbr.eq_ignore_ascii_case(t))
        .map(|(_, abbr)| *abbr)
}

/// Athlete -> team map. Values may be full team names or abbreviations.
pub fn parse_rosters_json(raw: &str) -> Result<HashMap<String, String>> {
    let parsed: Option<HashMap<String, String>> =
        serde_json::from_str(raw).context("invalid roster json")?;
    Ok(parsed
        .unwrap_or_default()
        .into_iter()
        .map(|(athlete, team)| {
            let abbr = team_abbreviation(&team)
                .map(str::to_string)
                .unwrap_or_else(|| team.trim().to_ascii_uppercase());
            (normalize_name(&athlete), abbr)
        })
        .collect())
}

pub fn load_rosters(path: &Path) -> Result<HashMap<String, String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading rosters {}", path.display()))?;
    parse_rosters_json(&raw)
}

pub fn parse_props_json(
    raw: &str,
    rosters: &HashMap<String, String>,
    bookmaker: Option<&str>,
) -> Result<ParsedProps> {
    let parsed: Option<EventsFile> = serde_json::from_str(raw).context("invalid odds json")?;
    let events: Vec<(String, OddsEvent)> = match parsed {
        None => Vec::new(),
        Some(EventsFile::ById(map)) => map.into_iter().collect(),
        Some(EventsFile::List(list)) => list
            .into_iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone().unwrap_or_else(|| format!("event-{i}")), e))
            .collect(),
    };

    let mut out = ParsedProps::default();
    let mut seen: HashSet<(String, StatCategory, Direction)> = HashSet::new();

    for (event_id, event) in &events {
        let home = resolve_team(&event.home_team);
        let away = resolve_team(&event.away_team);

        for book in event
            .bookmakers
            .iter()
            .filter(|b| bookmaker_matches(&b.key, bookmaker))
        {
            for market in &book.markets {
                if StatCategory::from_market_key(&market.key).is_none() {
                    continue;
                }
                for outcome in &market.outcomes {
                    let Some(athlete) = outcome
                        .description
                        .as_deref()
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                    else {
                        warn!(
                            event = %event_id,
                            market = %market.key,
                            "rejected prop line without athlete"
                        );
                        out.rejected
                            .push(format!("{event_id}/{}: outcome without athlete", market.key));
                        continue;
                    };

                    let point = outcome.point.as_ref().and_then(parse_point);
                    let line =
                        match PropLine::from_parts(&market.key, point, outcome.name.as_deref()) {
                            Ok(line) => line,
                            Err(err) => {
                                warn!(
                                    event = %event_id,
                                    athlete,
                                    error = %err,
                                    "rejected prop line"
                                );
                                out.rejected.push(format!("{event_id}/{athlete}: {err}"));
                                continue;
                            }
                        };

                    let Some(team) = rosters.get(&normalize_name(athlete)) else {
                        warn!(
                            event = %event_id,
                            athlete,
                            "rejected prop line, athlete not on any roster"
                        );
                        out.rejected
                            .push(format!("{event_id}/{athlete}: athlete not on any roster"));
                        continue;
                    };
                    let opponent_id = if *team == home {
                        away.clone()
                    } else if *team == away {
                        home.clone()
                    } else {
                        warn!(
                            event = %event_id,
                            athlete,
                            team = %team,
                            "rejected prop line, team not in event"
                        );
                        out.rejected.push(format!(
                            "{event_id}/{athlete}: team {team} not in {home} vs {away}"
                        ));
                        continue;
                    };

                    let key = (normalize_name(athlete), line.stat_category, line.direction);
                    if !seen.insert(key) {
                        continue;
                    }

                    out.listings.push(PropListing {
                        event_id: event_id.clone(),
                        athlete: athlete.to_string(),
                        opponent_id,
                        bookmaker: book.key.clone(),
                        line,
                        price: outcome.price,
                    });
                }
            }
        }
    }

    Ok(out)
}

pub fn load_props(
    path: &Path,
    rosters: &HashMap<String, String>,
    bookmaker: Option<&str>,
) -> Result<ParsedProps> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading props {}", path.display()))?;
    parse_props_json(&raw, rosters, bookmaker)
}

fn resolve_team(raw: &str) -> String {
    team_abbreviation(raw)
        .map(str::to_string)
        .unwrap_or_else(|| raw.trim().to_ascii_uppercase())
}

fn parse_point(value: &serde_json::Value) -> Option<f64> {
    let v = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: &str = r#"{
        "evt1": {
            "home_team": "Boston Celtics",
            "away_team": "Miami Heat",
            "bookmakers": [
                {"key": "fanduel", "markets": [
                    {"key": "player_points", "outcomes": [
                        {"name": "Over", "description": "Jayson Tatum", "point": 30.5, "price": 1.9}
                    ]}
                ]},
                {"key": "draftkings", "markets": [
                    {"key": "player_points", "outcomes": [
                        {"name": "Over", "description": "Jayson Tatum", "point": 27.5, "price": 1.87},
                        {"name": "Under", "description": "Jayson Tatum", "point": "27.5", "price": 1.93},
                        {"name": "Over", "description": "Jayson Tatum", "point": 28.5, "price": 2.1},
                        {"name": "Over", "description": "Bam Adebayo", "point": "n/a"},
                        {"description": "Bam Adebayo", "point": 18.5}
                    ]},
                    {"key": "player_double_double", "outcomes": [
                        {"name": "Yes", "description": "Bam Adebayo"}
                    ]},
                    {"key": "player_rebounds", "outcomes": [
                        {"name": "Over", "description": "Bam Adebayo", "point": 9.5}
                    ]}
                ]}
            ]
        }
    }"#;

    fn rosters() -> HashMap<String, String> {
        parse_rosters_json(r#"{"Jayson Tatum": "Boston Celtics", "Bam Adebayo": "MIA"}"#).unwrap()
    }

    #[test]
    fn keeps_only_wanted_bookmaker() {
        let parsed = parse_props_json(EVENTS, &rosters(), Some("draftkings")).unwrap();
        assert!(parsed.listings.iter().all(|l| l.bookmaker == "draftkings"));
        assert_eq!(parsed.listings.len(), 3);
    }

    #[test]
    fn opponent_is_the_other_team() {
        let parsed = parse_props_json(EVENTS, &rosters(), Some("draftkings")).unwrap();
        let tatum = &parsed.listings[0];
        assert_eq!(tatum.opponent_id, "MIA");
        assert_eq!(tatum.line.direction, Direction::Over);
        assert!((tatum.line.threshold - 27.5).abs() < 1e-12);
        let bam = parsed
            .listings
            .iter()
            .find(|l| l.athlete == "Bam Adebayo")
            .unwrap();
        assert_eq!(bam.opponent_id, "BOS");
        assert_eq!(bam.line.stat_category, StatCategory::Rebounds);
    }

    #[test]
    fn malformed_lines_are_rejected_not_fatal() {
        let parsed = parse_props_json(EVENTS, &rosters(), Some("draftkings")).unwrap();
        assert_eq!(parsed.rejected.len(), 2);
        assert!(parsed.listings.iter().all(|l| l.line.threshold.is_finite()));
    }

    #[test]
    fn every_rejection_reason_is_reported() {
        let raw = r#"[{
            "id": "evt2",
            "home_team": "Boston Celtics",
            "away_team": "Miami Heat",
            "bookmakers": [{"key": "draftkings", "markets": [
                {"key": "player_points", "outcomes": [
                    {"name": "Over", "point": 20.5},
                    {"name": "Over", "description": "Mystery Guard", "point": 12.5},
                    {"name": "Over", "description": "Jalen Brunson", "point": 26.5}
                ]}
            ]}]
        }]"#;
        let mut rosters = rosters();
        rosters.insert(normalize_name("Jalen Brunson"), "NYK".to_string());
        let parsed = parse_props_json(raw, &rosters, Some("draftkings")).unwrap();
        assert!(parsed.listings.is_empty());
        assert_eq!(parsed.rejected.len(), 3);
        assert!(parsed.rejected[0].ends_with("outcome without athlete"));
        assert!(parsed.rejected[1].contains("not on any roster"));
        assert!(parsed.rejected[2].contains("not in BOS vs MIA"));
    }

    #[test]
    fn duplicate_lines_keep_first() {
        let parsed = parse_props_json(EVENTS, &rosters(), None).unwrap();
        let tatum_over: Vec<_> = parsed
            .listings
            .iter()
            .filter(|l| l.athlete == "Jayson Tatum" && l.line.direction == Direction::Over)
            .collect();
        assert_eq!(tatum_over.len(), 1);
        assert_eq!(tatum_over[0].bookmaker, "fanduel");
    }

    #[test]
    fn bookmaker_predicate() {
        assert!(bookmaker_matches("DraftKings", Some("draftkings")));
        assert!(!bookmaker_matches("fanduel", Some("draftkings")));
        assert!(bookmaker_matches("fanduel", None));
    }

    #[test]
    fn team_lookup_accepts_names_and_abbreviations() {
        assert_eq!(team_abbreviation("los angeles lakers"), Some("LAL"));
        assert_eq!(team_abbreviation("phx"), Some("PHX"));
        assert!(team_abbreviation("Seattle SuperSonics").is_none());
    }
}
