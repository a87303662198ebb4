// Valuation engine: replacement baselines, lineup value, scarcity, scoring.

pub mod baseline;
pub mod lineup;
pub mod projections;
pub mod recommend;
pub mod scarcity;

use tracing::debug;

use crate::draft::state::{apply_taken, DraftState};
use baseline::{add_vor, compute_replacement_ranks, PlayerWithCalcs};
use projections::Player;
use recommend::{recommend, RecommendationsWeights};

/// Players from `pool` who are on the user's roster.
pub fn my_team(pool: &[Player], state: &DraftState) -> Vec<Player> {
    let names = state.my_player_names();
    pool.iter()
        .filter(|p| names.contains(&p.name.as_str()))
        .cloned()
        .collect()
}

/// Run the full ranking pipeline for the current draft state.
///
/// Baselines are computed over the whole pool so they stay anchored to the
/// preseason player population; scarcity and deltas only look at players
/// still available.
pub fn rank_players(
    pool: &[Player],
    state: &DraftState,
    league_size: usize,
    weights: &RecommendationsWeights,
) -> Vec<PlayerWithCalcs> {
    let roster = state.roster_config();
    let ranks = compute_replacement_ranks(roster, league_size);
    let with_vor = add_vor(pool, &ranks, league_size, roster);
    let available = apply_taken(&with_vor, state.taken(), PlayerWithCalcs::name);
    let team = my_team(pool, state);

    debug!(
        "ranking {} available players ({} taken, {} on my roster)",
        available.len(),
        state.taken_count(),
        team.len()
    );

    recommend(
        available,
        roster,
        &team,
        state.taken_count(),
        league_size,
        weights,
    )
}
