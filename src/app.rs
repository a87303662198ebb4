// Application state and command handling.
//
// Owns the player pool, the draft state and the latest ranking. Every
// mutation re-runs the ranking pipeline from scratch and autosaves the draft
// to SQLite so a crash or restart resumes where the user left off.

use std::path::Path;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::Database;
use crate::draft::position::Position;
use crate::draft::snapshot::{DraftSnapshot, SnapshotError};
use crate::draft::state::{DraftState, TakeOutcome};
use crate::protocol::{UiUpdate, UserCommand};
use crate::render;
use crate::valuation;
use crate::valuation::baseline::PlayerWithCalcs;
use crate::valuation::projections::Player;
use crate::valuation::recommend::RecommendationsWeights;
use crate::valuation::scarcity::position_dropoffs;

/// Most candidates listed when a name query is ambiguous.
const MAX_SUGGESTIONS: usize = 8;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no available player matches '{0}'")]
    NotFound(String),

    #[error("'{query}' matches several players: {}", candidates.join(", "))]
    Ambiguous {
        query: String,
        candidates: Vec<String>,
    },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("database error: {0:#}")]
    Database(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// View filter
// ---------------------------------------------------------------------------

/// Display-only filters. They narrow what is shown, never what is ranked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewFilter {
    pub position: Option<Position>,
    /// Lowercased substring matched against player name and team.
    pub search: Option<String>,
}

impl ViewFilter {
    pub fn matches(&self, p: &PlayerWithCalcs) -> bool {
        if self.position.is_some_and(|pos| pos != p.position()) {
            return false;
        }
        match &self.search {
            None => true,
            Some(s) => {
                p.name().to_lowercase().contains(s)
                    || p.player
                        .team
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(s))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    /// Every loaded player, taken or not.
    pub pool: Vec<Player>,
    pub draft_state: DraftState,
    pub weights: RecommendationsWeights,
    /// Available players, best first. Rebuilt after every mutation.
    pub ranked: Vec<PlayerWithCalcs>,
    pub view: ViewFilter,
    pub db: Database,
    /// Identifies the current draft session in the database.
    pub draft_id: String,
}

impl AppState {
    pub fn new(config: Config, pool: Vec<Player>, db: Database, draft_id: String) -> Self {
        let draft_state = DraftState::new(config.league.roster_config());
        let weights = config.strategy.weights;
        let mut state = AppState {
            config,
            pool,
            draft_state,
            weights,
            ranked: Vec::new(),
            view: ViewFilter::default(),
            db,
            draft_id,
        };
        state.recompute();
        state
    }

    pub fn league_size(&self) -> usize {
        self.config.league.num_teams
    }

    /// Re-run the ranking pipeline for the current draft state.
    pub fn recompute(&mut self) {
        self.ranked = valuation::rank_players(
            &self.pool,
            &self.draft_state,
            self.league_size(),
            &self.weights,
        );
        debug!("recomputed ranking: {} available", self.ranked.len());
    }

    /// Position of the first pool player with this exact name.
    pub fn position_of(&self, name: &str) -> Option<Position> {
        self.pool.iter().find(|p| p.name == name).map(|p| p.position)
    }

    /// The top `n` ranked players passing the view filter, with their
    /// overall rank.
    pub fn visible(&self, n: usize) -> Vec<(usize, &PlayerWithCalcs)> {
        self.ranked
            .iter()
            .enumerate()
            .filter(|(_, p)| self.view.matches(p))
            .take(n)
            .map(|(i, p)| (i + 1, p))
            .collect()
    }

    /// Find an available player by name: a case-insensitive exact match wins,
    /// otherwise a unique substring match.
    fn resolve_available(&self, query: &str) -> Result<&PlayerWithCalcs, CommandError> {
        let q = query.trim().to_lowercase();
        if let Some(p) = self.ranked.iter().find(|p| p.name().to_lowercase() == q) {
            return Ok(p);
        }

        let mut names: Vec<&str> = Vec::new();
        let mut first = None;
        for p in self.ranked.iter().filter(|p| p.name().to_lowercase().contains(&q)) {
            if !names.contains(&p.name()) {
                names.push(p.name());
                first.get_or_insert(p);
            }
        }
        match (names.len(), first) {
            (1, Some(p)) => Ok(p),
            (0, _) | (_, None) => Err(CommandError::NotFound(query.to_string())),
            _ => Err(CommandError::Ambiguous {
                query: query.to_string(),
                candidates: names
                    .into_iter()
                    .take(MAX_SUGGESTIONS)
                    .map(String::from)
                    .collect(),
            }),
        }
    }

    /// Mark a player as taken and recompute. Returns a one-line summary.
    pub fn take_player(&mut self, query: &str, mine: bool) -> Result<String, CommandError> {
        // A name already in the ledger is reported, not re-recorded.
        let already = self
            .draft_state
            .taken()
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(query.trim()))
            .map(|(name, _)| name.to_string());

        let (name, position) = match already {
            Some(name) => {
                let pos = self.position_of(&name);
                (name, pos)
            }
            None => {
                let p = self.resolve_available(query)?;
                (p.name().to_string(), Some(p.position()))
            }
        };

        let summary = match self.draft_state.take(&name, position, mine) {
            TakeOutcome::AlreadyTaken(status) => {
                return Ok(format!("{name} is already taken ({})", status.label()));
            }
            TakeOutcome::Recorded { slot: Some(slot) } => {
                format!("Drafted {name} -> {slot}")
            }
            TakeOutcome::Recorded { slot: None } if mine => format!("Drafted {name}"),
            TakeOutcome::Recorded { slot: None } => format!("{name} marked gone"),
        };
        info!("{}", summary);

        self.recompute();
        self.autosave();
        Ok(summary)
    }

    /// Revert the newest pick and recompute.
    pub fn undo_last(&mut self) -> String {
        let pool = &self.pool;
        let undone = self
            .draft_state
            .undo(|name| pool.iter().find(|p| p.name == name).map(|p| p.position));

        let Some(undone) = undone else {
            return "Nothing to undo".to_string();
        };
        let summary = match undone.slot {
            Some(slot) => format!("Undid {} ({}, removed from {slot})", undone.name, undone.status.label()),
            None => format!("Undid {} ({})", undone.name, undone.status.label()),
        };
        info!("{}", summary);

        self.recompute();
        self.autosave();
        summary
    }

    /// Replace the scoring weights and recompute.
    pub fn set_weights(&mut self, weights: RecommendationsWeights) {
        info!("weights changed: {:?}", weights);
        self.weights = weights;
        self.recompute();
    }

    /// Persist the current draft to SQLite. Failures are logged, never fatal.
    pub fn autosave(&self) {
        let snapshot = DraftSnapshot::capture(&self.draft_state);
        if let Err(e) = self.db.save_snapshot(&self.draft_id, &snapshot) {
            warn!("autosave failed for {}: {:#}", self.draft_id, e);
        }
    }

    /// Clear every pick and stored draft, then start a new draft session.
    pub fn reset_draft(&mut self) -> anyhow::Result<()> {
        self.db.clear_draft()?;
        self.draft_state.reset();
        self.draft_id = Database::generate_draft_id();
        self.db.set_draft_id(&self.draft_id)?;
        info!("draft reset; new draft_id={}", self.draft_id);
        self.recompute();
        self.autosave();
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SnapshotError> {
        DraftSnapshot::capture(&self.draft_state).save(path)?;
        info!("draft state written to {}", path.display());
        Ok(())
    }

    /// Replace the draft state from a snapshot file. Returns the pick count.
    pub fn load_from(&mut self, path: &Path) -> Result<usize, SnapshotError> {
        let snapshot = DraftSnapshot::load(path)?;
        snapshot.apply_to(&mut self.draft_state);
        info!(
            "draft state loaded from {} ({} picks)",
            path.display(),
            self.draft_state.taken_count()
        );
        self.recompute();
        self.autosave();
        Ok(self.draft_state.taken_count())
    }

    /// Status header plus the top of the filtered ranking.
    pub fn render_top(&self, n: usize) -> String {
        let mut out = render::status_line(&self.draft_state, self.league_size(), self.ranked.len());
        if self.view != ViewFilter::default() {
            let pos = self.view.position.map_or("ALL", |p| p.display_str());
            let search = self.view.search.as_deref().unwrap_or("");
            out.push_str(&format!("Filter: pos={pos} find='{search}'\n"));
        }
        out.push_str(&render::rankings(&self.visible(n)));
        out
    }
}

// ---------------------------------------------------------------------------
// Command handling
// ---------------------------------------------------------------------------

/// Execute one command and return the text to show. `Quit` is handled by
/// the caller.
pub fn handle_command(state: &mut AppState, cmd: UserCommand) -> Result<String, CommandError> {
    let top_n = state.config.strategy.top_n;
    let out = match cmd {
        UserCommand::Mine(name) => {
            let summary = state.take_player(&name, true)?;
            format!("{summary}\n{}", state.render_top(top_n))
        }
        UserCommand::Gone(name) => {
            let summary = state.take_player(&name, false)?;
            format!("{summary}\n{}", state.render_top(top_n))
        }
        UserCommand::Undo => {
            let summary = state.undo_last();
            format!("{summary}\n{}", state.render_top(top_n))
        }
        UserCommand::Top(n) => state.render_top(n.unwrap_or(top_n)),
        UserCommand::FilterPosition(pos) => {
            state.view.position = pos;
            state.render_top(top_n)
        }
        UserCommand::Find(text) => {
            state.view.search = text.map(|t| t.to_lowercase());
            state.render_top(top_n)
        }
        UserCommand::Roster => render::roster(&state.draft_state),
        UserCommand::Scarcity => {
            let available: Vec<&Player> = state.ranked.iter().map(|p| &p.player).collect();
            render::dropoffs(&position_dropoffs(available))
        }
        UserCommand::Weights(None) => render::weights(&state.weights),
        UserCommand::Weights(Some(w)) => {
            state.set_weights(w);
            format!("{}{}", render::weights(&state.weights), state.render_top(top_n))
        }
        UserCommand::Save(path) => {
            state.save_to(Path::new(&path))?;
            format!("Saved draft state to {path}\n")
        }
        UserCommand::Load(path) => {
            let picks = state.load_from(Path::new(&path))?;
            format!("Loaded {picks} picks from {path}\n{}", state.render_top(top_n))
        }
        UserCommand::Reset => {
            state.reset_draft()?;
            format!("Draft reset ({})\n{}", state.draft_id, state.render_top(top_n))
        }
        UserCommand::Help => render::help().to_string(),
        UserCommand::Quit => String::new(),
    };
    Ok(out)
}

/// Main application loop: consume commands, push rendered output.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");
    let initial = state.render_top(state.config.strategy.top_n);
    let _ = ui_tx.send(UiUpdate::Output(initial)).await;

    while let Some(cmd) = cmd_rx.recv().await {
        if cmd == UserCommand::Quit {
            info!("Quit command received, shutting down");
            break;
        }
        debug!("command: {:?}", cmd);
        let update = match handle_command(&mut state, cmd) {
            Ok(text) => UiUpdate::Output(text),
            Err(e) => {
                warn!("command failed: {}", e);
                UiUpdate::Error(e.to_string())
            }
        };
        if ui_tx.send(update).await.is_err() {
            info!("UI channel closed, shutting down");
            break;
        }
    }

    let _ = ui_tx.send(UiUpdate::Shutdown).await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Crash recovery
// ---------------------------------------------------------------------------

/// Restore the draft from the database after a crash/restart.
///
/// Returns `true` when a snapshot with at least one pick was restored.
pub fn recover_from_db(state: &mut AppState) -> anyhow::Result<bool> {
    if !state.db.has_draft_in_progress(&state.draft_id)? {
        info!("No draft in progress for draft_id={}, starting fresh", state.draft_id);
        return Ok(false);
    }
    let Some(snapshot) = state.db.load_snapshot(&state.draft_id)? else {
        return Ok(false);
    };

    let pick_count = snapshot.taken.len();
    info!(
        "Crash recovery: restoring {} picks from DB for draft_id={}",
        pick_count, state.draft_id
    );
    snapshot.apply_to(&mut state.draft_state);
    state.recompute();

    info!(
        "Crash recovery complete: {} players remaining",
        state.ranked.len()
    );
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataPaths, LeagueConfig, StrategyConfig};
    use crate::draft::position::RosterSlot;
    use crate::draft::state::TakenStatus;
    use std::collections::HashMap;

    fn test_config() -> Config {
        let roster: HashMap<String, usize> = [
            ("QB", 1),
            ("RB", 2),
            ("WR", 2),
            ("TE", 1),
            ("FLEX", 1),
            ("DST", 1),
            ("K", 1),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Config {
            league: LeagueConfig {
                name: "Test League".into(),
                num_teams: 10,
                bench: 6,
                roster,
            },
            strategy: StrategyConfig {
                weights: RecommendationsWeights {
                    w_delta: 0.6,
                    w_vor: 0.3,
                    w_scarcity: 0.1,
                    bench_depth_boost: 0.15,
                },
                top_n: 5,
            },
            db_path: ":memory:".into(),
            data_paths: DataPaths {
                dir: "data".into(),
                ages: None,
            },
        }
    }

    fn make_player(name: &str, team: &str, pos: Position, pts: f64) -> Player {
        Player {
            name: name.into(),
            team: Some(team.into()),
            position: pos,
            proj_pts: pts,
            pos_rank: 0,
            overall_rank: 0,
            age: None,
        }
    }

    fn test_pool() -> Vec<Player> {
        vec![
            make_player("Josh Allen", "BUF", Position::Quarterback, 380.0),
            make_player("Jalen Hurts", "PHI", Position::Quarterback, 370.0),
            make_player("Bijan Robinson", "ATL", Position::RunningBack, 310.0),
            make_player("Jahmyr Gibbs", "DET", Position::RunningBack, 300.0),
            make_player("Breece Hall", "NYJ", Position::RunningBack, 260.0),
            make_player("Ja'Marr Chase", "CIN", Position::WideReceiver, 320.0),
            make_player("Justin Jefferson", "MIN", Position::WideReceiver, 300.0),
            make_player("Sam LaPorta", "DET", Position::TightEnd, 190.0),
            make_player("Justin Tucker", "BAL", Position::Kicker, 150.0),
            make_player("Ravens D/ST", "BAL", Position::Defense, 130.0),
        ]
    }

    fn test_state() -> AppState {
        let db = Database::open(":memory:").unwrap();
        AppState::new(test_config(), test_pool(), db, "draft_test".into())
    }

    #[test]
    fn new_state_ranks_everyone() {
        let state = test_state();
        assert_eq!(state.ranked.len(), 10);
        assert_eq!(state.draft_state.roster_config().bench, 6);
    }

    #[test]
    fn take_player_case_insensitive() {
        let mut state = test_state();
        let summary = state.take_player("josh allen", true).unwrap();
        assert_eq!(summary, "Drafted Josh Allen -> QB");
        assert_eq!(state.ranked.len(), 9);
        assert_eq!(
            state.draft_state.slot_names(RosterSlot::Starter(Position::Quarterback)),
            ["Josh Allen".to_string()]
        );
    }

    #[test]
    fn take_player_by_unique_substring() {
        let mut state = test_state();
        let summary = state.take_player("laporta", false).unwrap();
        assert_eq!(summary, "Sam LaPorta marked gone");
        assert_eq!(
            state.draft_state.taken().status("Sam LaPorta"),
            Some(TakenStatus::Gone)
        );
    }

    #[test]
    fn ambiguous_and_unknown_names() {
        let mut state = test_state();
        match state.take_player("justin", true) {
            Err(CommandError::Ambiguous { candidates, .. }) => {
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
        assert!(matches!(
            state.take_player("Patrick Mahomes", true),
            Err(CommandError::NotFound(_))
        ));
        assert_eq!(state.draft_state.taken_count(), 0);
    }

    #[test]
    fn taking_twice_is_reported() {
        let mut state = test_state();
        state.take_player("Breece Hall", false).unwrap();
        let summary = state.take_player("breece hall", true).unwrap();
        assert_eq!(summary, "Breece Hall is already taken (gone)");
        assert_eq!(state.draft_state.taken_count(), 1);
        assert!(state.draft_state.my_player_names().is_empty());
    }

    #[test]
    fn undo_restores_previous_ranking() {
        let mut state = test_state();
        let before = state.ranked.clone();
        state.take_player("Bijan Robinson", true).unwrap();
        let summary = state.undo_last();
        assert_eq!(summary, "Undid Bijan Robinson (mine, removed from RB)");
        assert_eq!(state.ranked, before);
        assert_eq!(state.undo_last(), "Nothing to undo");
    }

    #[test]
    fn view_filters_do_not_change_ranking() {
        let mut state = test_state();
        let ranked = state.ranked.clone();
        handle_command(&mut state, UserCommand::FilterPosition(Some(Position::RunningBack))).unwrap();
        let visible = state.visible(10);
        assert_eq!(visible.len(), 3);
        assert!(visible.iter().all(|(_, p)| p.position() == Position::RunningBack));
        assert_eq!(state.ranked, ranked);

        handle_command(&mut state, UserCommand::FilterPosition(None)).unwrap();
        handle_command(&mut state, UserCommand::Find(Some("DET".into()))).unwrap();
        let names: Vec<&str> = state.visible(10).iter().map(|(_, p)| p.name()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Sam LaPorta"));
        assert!(names.contains(&"Jahmyr Gibbs"));
    }

    #[test]
    fn visible_keeps_overall_rank() {
        let mut state = test_state();
        state.view.position = Some(Position::Kicker);
        let visible = state.visible(5);
        assert_eq!(visible.len(), 1);
        let (rank, p) = visible[0];
        assert_eq!(state.ranked[rank - 1].name(), p.name());
    }

    #[test]
    fn weights_command_recomputes() {
        let mut state = test_state();
        let vor_only = RecommendationsWeights {
            w_vor: 1.0,
            ..Default::default()
        };
        handle_command(&mut state, UserCommand::Weights(Some(vor_only))).unwrap();
        assert_eq!(state.weights, vor_only);
        for p in &state.ranked {
            assert!((p.score_base - p.scoring_vor()).abs() < 1e-9);
        }
    }

    #[test]
    fn autosave_and_recover() {
        let mut state = test_state();
        state.take_player("Ja'Marr Chase", true).unwrap();
        state.take_player("Jalen Hurts", false).unwrap();

        // Rebuild on the same database: recovery replays the snapshot.
        let AppState { db, draft_id, .. } = state;
        let mut restored = AppState::new(test_config(), test_pool(), db, draft_id);
        assert!(recover_from_db(&mut restored).unwrap());
        assert_eq!(restored.draft_state.taken_count(), 2);
        assert_eq!(restored.ranked.len(), 8);
        assert_eq!(
            restored.draft_state.slot_names(RosterSlot::Starter(Position::WideReceiver)),
            ["Ja'Marr Chase".to_string()]
        );
    }

    #[test]
    fn recover_without_snapshot_is_fresh() {
        let mut state = test_state();
        assert!(!recover_from_db(&mut state).unwrap());
    }

    #[test]
    fn reset_starts_new_draft() {
        let mut state = test_state();
        state.take_player("Josh Allen", true).unwrap();
        let old_id = state.draft_id.clone();
        handle_command(&mut state, UserCommand::Reset).unwrap();
        assert_ne!(state.draft_id, old_id);
        assert_eq!(state.draft_state.taken_count(), 0);
        assert_eq!(state.ranked.len(), 10);
        assert_eq!(state.db.get_draft_id().unwrap(), Some(state.draft_id.clone()));
        assert!(state.db.load_snapshot(&old_id).unwrap().is_none());
        assert!(!state.db.has_draft_in_progress(&state.draft_id).unwrap());
    }

    #[test]
    fn save_and_load_snapshot_file() {
        let path = std::env::temp_dir().join("gridiron_app_snapshot_test.json");
        let _ = std::fs::remove_file(&path);

        let mut state = test_state();
        state.take_player("Jahmyr Gibbs", true).unwrap();
        let path_str = path.display().to_string();
        handle_command(&mut state, UserCommand::Save(path_str.clone())).unwrap();

        let mut other = test_state();
        let out = handle_command(&mut other, UserCommand::Load(path_str)).unwrap();
        assert!(out.starts_with("Loaded 1 picks"));
        assert_eq!(other.draft_state, state.draft_state);
        assert_eq!(other.ranked, state.ranked);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_missing_file_is_error() {
        let mut state = test_state();
        let err = handle_command(
            &mut state,
            UserCommand::Load("/nonexistent/gridiron/snapshot.json".into()),
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::Snapshot(SnapshotError::Read { .. })));
    }

    #[test]
    fn roster_and_scarcity_render() {
        let mut state = test_state();
        state.take_player("Sam LaPorta", true).unwrap();
        let roster = handle_command(&mut state, UserCommand::Roster).unwrap();
        assert!(roster.contains("Sam LaPorta"));
        let scarcity = handle_command(&mut state, UserCommand::Scarcity).unwrap();
        assert!(scarcity.lines().count() >= 7);
    }

    #[tokio::test]
    async fn run_loop_processes_commands_until_quit() {
        let state = test_state();
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (ui_tx, mut ui_rx) = mpsc::channel(8);

        cmd_tx.send(UserCommand::Gone("Josh Allen".into())).await.unwrap();
        cmd_tx.send(UserCommand::Mine("nobody".into())).await.unwrap();
        cmd_tx.send(UserCommand::Quit).await.unwrap();

        run(cmd_rx, ui_tx, state).await.unwrap();

        let mut updates = Vec::new();
        while let Some(u) = ui_rx.recv().await {
            updates.push(u);
        }
        assert_eq!(updates.len(), 4);
        assert!(matches!(&updates[0], UiUpdate::Output(_)));
        assert!(matches!(&updates[1], UiUpdate::Output(t) if t.starts_with("Josh Allen marked gone")));
        assert!(matches!(&updates[2], UiUpdate::Error(_)));
        assert_eq!(updates[3], UiUpdate::Shutdown);
    }
}
