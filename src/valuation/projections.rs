// Projection data loading and normalization.
//
// Reads one CSV per position (QB.csv, RB.csv, ...) with `player`, `team`,
// `fantasy`, `positionRank` and `overallRank` columns, plus an optional
// ages file used to enrich players with their age.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DataPaths;
use crate::draft::position::{Position, ALL_POSITIONS};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A projected player, as handed to the valuation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub team: Option<String>,
    pub position: Position,
    /// Projected season fantasy points. Always finite.
    pub proj_pts: f64,
    pub pos_rank: u32,
    pub overall_rank: u32,
    /// Age from the optional enrichment file.
    #[serde(default)]
    pub age: Option<u32>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// Projection row. Every field is read as text so that a bad number drops
/// the row instead of failing the whole file; extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawProjection {
    #[serde(default)]
    player: Option<String>,
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    fantasy: Option<String>,
    #[serde(default, rename = "positionRank")]
    position_rank: Option<String>,
    #[serde(default, rename = "overallRank")]
    overall_rank: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAge {
    player: String,
    #[serde(default)]
    age: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a numeric cell, returning `None` for blanks, junk and non-finite values.
fn parse_number(cell: Option<&str>) -> Option<f64> {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parse a rank cell, falling back to the 1-based row number.
fn parse_rank(cell: Option<&str>, row: usize) -> u32 {
    parse_number(cell)
        .filter(|v| *v >= 0.0)
        .map(|v| v.round() as u32)
        .unwrap_or(row as u32 + 1)
}

/// Normalize a player name for fuzzy matching: lowercase, punctuation
/// removed, generational suffix (Jr., Sr., II, III, IV) stripped.
pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect::<String>()
        .to_lowercase();
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() > 1 {
        if let Some(last) = words.last() {
            if matches!(*last, "jr" | "sr" | "ii" | "iii" | "iv" | "v") {
                words.pop();
            }
        }
    }
    words.join(" ")
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_position_from_reader<R: Read>(rdr: R, position: Position) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);

    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h.trim() == "player") {
        return Err(csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("expected 'player' column in {} projections", position),
        )));
    }
    if !headers.iter().any(|h| h.trim() == "fantasy") {
        warn!("{} projections have no 'fantasy' column; no players loaded", position);
    }

    let mut players = Vec::new();
    for (row, result) in reader.deserialize::<RawProjection>().enumerate() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed {} row: {}", position, e);
                continue;
            }
        };

        let name = raw.player.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            debug!("skipping {} row {} with no player name", position, row + 1);
            continue;
        }
        let Some(proj_pts) = parse_number(raw.fantasy.as_deref()) else {
            debug!("skipping {} '{}': no usable projection", position, name);
            continue;
        };

        players.push(Player {
            name: name.to_string(),
            team: raw
                .team
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            position,
            proj_pts,
            pos_rank: parse_rank(raw.position_rank.as_deref(), row),
            overall_rank: parse_rank(raw.overall_rank.as_deref(), row),
            age: None,
        });
    }
    Ok(players)
}

fn load_ages_from_reader<R: Read>(rdr: R) -> Result<HashMap<String, u32>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut ages = HashMap::new();
    for result in reader.deserialize::<RawAge>() {
        match result {
            Ok(raw) => {
                let Some(age) = parse_number(raw.age.as_deref()).filter(|a| *a > 0.0) else {
                    continue;
                };
                ages.insert(normalize_name(&raw.player), age.round() as u32);
            }
            Err(e) => {
                warn!("skipping malformed age row: {}", e);
            }
        }
    }
    Ok(ages)
}

/// Keep one entry per (name, position): the one with the highest projection.
/// Output order is by name, then position.
pub fn dedupe_players(mut players: Vec<Player>) -> Vec<Player> {
    players.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.position.cmp(&b.position))
            .then_with(|| b.proj_pts.total_cmp(&a.proj_pts))
    });
    players.dedup_by(|later, earlier| later.name == earlier.name && later.position == earlier.position);
    players
}

/// Attach ages to players whose normalized name appears in `ages`.
/// Returns how many players were matched.
pub fn enrich_ages(players: &mut [Player], ages: &HashMap<String, u32>) -> usize {
    let mut matched = 0;
    for player in players.iter_mut() {
        if let Some(&age) = ages.get(&normalize_name(&player.name)) {
            player.age = Some(age);
            matched += 1;
        }
    }
    matched
}

// ---------------------------------------------------------------------------
// Public file-based loaders
// ---------------------------------------------------------------------------

/// Load one position's projections from a CSV file.
pub fn load_position_file(path: &Path, position: Position) -> Result<Vec<Player>, ProjectionError> {
    let file = std::fs::File::open(path).map_err(|e| ProjectionError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_position_from_reader(file, position).map_err(|e| ProjectionError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load the optional ages file (`player`, `age` columns).
pub fn load_ages(path: &Path) -> Result<HashMap<String, u32>, ProjectionError> {
    let file = std::fs::File::open(path).map_err(|e| ProjectionError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_ages_from_reader(file).map_err(|e| ProjectionError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load every position file from the configured data directory, dedupe, and
/// enrich with ages when an ages file is configured.
///
/// Age enrichment is best-effort: a missing or unreadable ages file is
/// logged and otherwise ignored.
pub fn load_all(paths: &DataPaths) -> Result<Vec<Player>, ProjectionError> {
    let dir = Path::new(&paths.dir);
    let mut players = Vec::new();
    for pos in ALL_POSITIONS {
        let path = dir.join(pos.file_name());
        let loaded = load_position_file(&path, pos)?;
        info!("Loaded {} {} projections from {}", loaded.len(), pos, path.display());
        players.extend(loaded);
    }

    let mut players = dedupe_players(players);
    if players.is_empty() {
        return Err(ProjectionError::Validation(format!(
            "no usable projections found in {}",
            dir.display()
        )));
    }

    if let Some(ages_file) = &paths.ages {
        match load_ages(&dir.join(ages_file)) {
            Ok(ages) => {
                let matched = enrich_ages(&mut players, &ages);
                info!("Age enrichment matched {} of {} players", matched, players.len());
            }
            Err(e) => warn!("age enrichment skipped: {}", e),
        }
    }

    Ok(players)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
