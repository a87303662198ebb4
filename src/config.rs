// Configuration loading and parsing (league.toml, strategy.toml).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::draft::position::RosterSlot;
use crate::draft::roster::RosterConfig;
use crate::valuation::recommend::RecommendationsWeights;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub strategy: StrategyConfig,
    pub db_path: String,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub num_teams: usize,
    /// Bench spots per team. A `BE`/`BENCH` entry in `[league.roster]` wins
    /// over this value.
    #[serde(default)]
    pub bench: usize,
    /// Starter slots keyed by position, plus an optional `FLEX` entry.
    pub roster: HashMap<String, usize>,
}

impl LeagueConfig {
    /// The typed roster configuration for this league.
    pub fn roster_config(&self) -> RosterConfig {
        RosterConfig::from_table(&self.roster, self.bench)
    }
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    #[serde(default)]
    weights: RecommendationsWeights,
    #[serde(default)]
    display: DisplaySection,
    database: DatabaseSection,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DisplaySection {
    #[serde(default = "default_top_n")]
    top_n: usize,
}

impl Default for DisplaySection {
    fn default() -> Self {
        DisplaySection {
            top_n: default_top_n(),
        }
    }
}

fn default_top_n() -> usize {
    25
}

/// The public strategy config assembled from the strategy.toml sections.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub weights: RecommendationsWeights,
    /// Rows shown by `top` when no count is given.
    pub top_n: usize,
}

/// Where projection CSVs live.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataPaths {
    /// Directory holding QB.csv, RB.csv, WR.csv, TE.csv, K.csv and DST.csv.
    pub dir: String,
    /// Optional ages file, relative to `dir`.
    #[serde(default)]
    pub ages: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/strategy.toml`, relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    // --- strategy.toml (required) ---
    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    let config = Config {
        league: league_file.league,
        strategy: StrategyConfig {
            weights: strategy_file.weights,
            top_n: strategy_file.display.top_n,
        },
        db_path: strategy_file.database.path,
        data_paths: strategy_file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Files that make up a configuration directory.
const CONFIG_FILES: [&str; 2] = ["league.toml", "strategy.toml"];

/// Copy each of `league.toml` and `strategy.toml` from `defaults/` into
/// `config/` unless the user already has one. Returns the files copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither defaults/ nor config/ directory found in {}; \
                 run from the project root or ensure defaults/ is present",
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create {}: {e}", config_dir.display()),
    })?;

    let mut copied = Vec::new();
    for name in CONFIG_FILES {
        let source = defaults_dir.join(name);
        let target = config_dir.join(name);
        if target.exists() || !source.is_file() {
            continue;
        }
        std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
        })?;
        info!("Created {} from defaults", target.display());
        copied.push(target);
    }
    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.num_teams == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.num_teams".into(),
            message: "must be greater than 0".into(),
        });
    }

    for key in config.league.roster.keys() {
        if RosterSlot::from_key(key).is_none() {
            return Err(ConfigError::ValidationError {
                field: format!("league.roster.{key}"),
                message: "unknown roster slot".into(),
            });
        }
    }

    if config.league.roster_config().starters.values().sum::<usize>() == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.roster".into(),
            message: "must define at least one starter slot".into(),
        });
    }

    let w = &config.strategy.weights;
    let weight_fields: &[(&str, f64)] = &[
        ("weights.w_delta", w.w_delta),
        ("weights.w_vor", w.w_vor),
        ("weights.w_scarcity", w.w_scarcity),
        ("weights.bench_depth_boost", w.bench_depth_boost),
    ];
    for (name, val) in weight_fields {
        if !val.is_finite() || *val < 0.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be a non-negative number, got {val}"),
            });
        }
    }

    if config.strategy.top_n == 0 {
        return Err(ConfigError::ValidationError {
            field: "display.top_n".into(),
            message: "must be > 0".into(),
        });
    }

    if config.data_paths.dir.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data_paths.dir".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::position::Position;
    use std::fs;

    fn project_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    }

    /// Create `<tmp>/config/` holding the shipped defaults and return `<tmp>`.
    fn temp_config_dir(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        let config_dir = tmp.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), config_dir.join("league.toml")).unwrap();
        fs::copy(
            root.join("defaults/strategy.toml"),
            config_dir.join("strategy.toml"),
        )
        .unwrap();
        tmp
    }

    /// Rewrite one config file by applying a string replacement.
    fn patch(tmp: &Path, file: &str, from: &str, to: &str) {
        let path = tmp.join("config").join(file);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(from), "{file} does not contain {from:?}");
        fs::write(&path, text.replace(from, to)).unwrap();
    }

    #[test]
    fn load_valid_config_from_defaults() {
        let tmp = temp_config_dir("gridiron_config_valid");
        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(config.league.num_teams, 14);
        assert_eq!(config.league.bench, 7);
        assert_eq!(config.league.roster.get("FLEX"), Some(&1));
        assert_eq!(config.league.roster_config(), RosterConfig::default());

        assert!((config.strategy.weights.w_delta - 0.6).abs() < f64::EPSILON);
        assert!((config.strategy.weights.w_vor - 0.3).abs() < f64::EPSILON);
        assert!((config.strategy.weights.w_scarcity - 0.1).abs() < f64::EPSILON);
        assert!((config.strategy.weights.bench_depth_boost - 0.15).abs() < f64::EPSILON);
        assert_eq!(config.strategy.top_n, 25);

        assert_eq!(config.db_path, "gridiron.db");
        assert_eq!(config.data_paths.dir, "data");
        assert_eq!(config.data_paths.ages.as_deref(), Some("ages.csv"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_weights_section_defaults_to_zero() {
        let tmp = temp_config_dir("gridiron_config_no_weights");
        fs::write(
            tmp.join("config/strategy.toml"),
            "[database]\npath = \"x.db\"\n\n[data_paths]\ndir = \"data\"\n",
        )
        .unwrap();
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.strategy.weights, RecommendationsWeights::default());
        assert_eq!(config.strategy.top_n, 25);
        assert_eq!(config.data_paths.ages, None);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_flex_entry_is_none() {
        let tmp = temp_config_dir("gridiron_config_no_flex");
        patch(&tmp, "league.toml", "FLEX = 1\n", "");
        let config = load_config_from(&tmp).unwrap();
        let roster = config.league.roster_config();
        assert_eq!(roster.flex, None);
        assert_eq!(roster.starter_slots(Position::RunningBack), 2);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_num_teams_zero() {
        let tmp = temp_config_dir("gridiron_config_num_teams_zero");
        patch(&tmp, "league.toml", "num_teams = 14", "num_teams = 0");

        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "league.num_teams");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_roster_slot() {
        let tmp = temp_config_dir("gridiron_config_unknown_slot");
        patch(&tmp, "league.toml", "K = 1", "K = 1\nIDP = 2");

        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "league.roster.IDP");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_negative_weight() {
        let tmp = temp_config_dir("gridiron_config_negative_weight");
        patch(&tmp, "strategy.toml", "w_vor = 0.3", "w_vor = -0.3");

        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "weights.w_vor");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_top_n() {
        let tmp = temp_config_dir("gridiron_config_zero_top_n");
        patch(&tmp, "strategy.toml", "top_n = 25", "top_n = 0");
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::ValidationError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_league_toml() {
        let tmp = temp_config_dir("gridiron_config_missing_league");
        fs::remove_file(tmp.join("config/league.toml")).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::FileNotFound { path } => {
                assert!(path.ends_with("league.toml"));
            }
            other => panic!("expected FileNotFound, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = temp_config_dir("gridiron_config_invalid_toml");
        fs::write(tmp.join("config/strategy.toml"), "this is [not valid toml").unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = std::env::temp_dir().join("gridiron_config_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);

        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), defaults_dir.join("league.toml")).unwrap();
        fs::copy(root.join("defaults/strategy.toml"), defaults_dir.join("strategy.toml")).unwrap();
        fs::write(defaults_dir.join("notes.txt"), "scratch\n").unwrap();

        assert!(!tmp.join("config").exists());

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 2);
        assert!(tmp.join("config/league.toml").exists());
        assert!(tmp.join("config/strategy.toml").exists());
        assert!(!tmp.join("config/notes.txt").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = std::env::temp_dir().join("gridiron_config_ensure_skips");
        let _ = fs::remove_dir_all(&tmp);

        let defaults_dir = tmp.join("defaults");
        let config_dir = tmp.join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();
        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), defaults_dir.join("league.toml")).unwrap();
        fs::copy(root.join("defaults/strategy.toml"), defaults_dir.join("strategy.toml")).unwrap();

        fs::write(config_dir.join("league.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(copied[0].ends_with("strategy.toml"));
        let content = fs::read_to_string(config_dir.join("league.toml")).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("gridiron_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        match &err {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
