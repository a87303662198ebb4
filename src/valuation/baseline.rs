// Replacement-level baselines and value over replacement (VOR).
//
// The replacement player at a position is the one a team could pick up once
// every starter slot in the league plus a share of bench demand is filled.
// VOR is a player's projection minus that baseline; flex-eligible players
// also get a VOR against the pooled RB/WR/TE replacement.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::draft::position::{Position, ALL_POSITIONS};
use crate::draft::roster::RosterConfig;
use crate::valuation::projections::Player;

/// Share of league size added to the FLEX starter count when locating the
/// flex replacement player.
const FLEX_BENCH_SHARE: f64 = 0.8;

// ---------------------------------------------------------------------------
// Per-player valuation record
// ---------------------------------------------------------------------------

/// A player plus every derived number the ranking pipeline attaches.
///
/// Rebuilt from scratch on every pipeline run; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerWithCalcs {
    pub player: Player,
    /// Replacement-level projection at this position. `None` when the league
    /// has no slot configured for the position.
    pub baseline: Option<f64>,
    pub vor: Option<f64>,
    /// VOR against the pooled RB/WR/TE replacement (flex-eligible only).
    pub vor_flex: Option<f64>,
    /// Marginal lineup points this player would add to the user's team.
    pub delta: f64,
    pub would_start: bool,
    pub scarcity: f64,
    pub pos_w: f64,
    pub bench_w: f64,
    pub score_base: f64,
    pub score: f64,
}

impl PlayerWithCalcs {
    fn new(player: Player) -> Self {
        PlayerWithCalcs {
            player,
            baseline: None,
            vor: None,
            vor_flex: None,
            delta: 0.0,
            would_start: false,
            scarcity: 0.0,
            pos_w: 1.0,
            bench_w: 1.0,
            score_base: 0.0,
            score: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.player.name
    }

    pub fn position(&self) -> Position {
        self.player.position
    }

    pub fn proj_pts(&self) -> f64 {
        self.player.proj_pts
    }

    /// The VOR figure used for scoring: flex VOR for RB/WR/TE, falling back
    /// to positional VOR, then 0.
    pub fn scoring_vor(&self) -> f64 {
        if self.player.position.is_flex_eligible() {
            self.vor_flex.or(self.vor).unwrap_or(0.0)
        } else {
            self.vor.unwrap_or(0.0)
        }
    }
}

// ---------------------------------------------------------------------------
// Replacement ranks
// ---------------------------------------------------------------------------

/// Round half to even, matching how the draft tool has always rounded ranks.
fn round_rank(x: f64) -> usize {
    x.round_ties_even().max(0.0) as usize
}

/// 1-based replacement rank for every position with a configured slot entry:
/// `max(1, league_size * slots + round(league_size * bench_share))`.
pub fn compute_replacement_ranks(
    roster: &RosterConfig,
    league_size: usize,
) -> BTreeMap<Position, usize> {
    roster
        .starters
        .iter()
        .map(|(&pos, &slots)| {
            let bench_part = round_rank(league_size as f64 * pos.bench_share());
            (pos, (league_size * slots + bench_part).max(1))
        })
        .collect()
}

/// 1-based rank of the flex replacement player. A league without a FLEX
/// entry is treated as having one slot here.
pub fn flex_replacement_rank(roster: &RosterConfig, league_size: usize) -> usize {
    let flex = roster.flex.unwrap_or(1);
    (league_size * flex + round_rank(league_size as f64 * FLEX_BENCH_SHARE)).max(1)
}

/// Projection at a 1-based rank in a descending list, clamped to the list
/// bounds. An empty list has a baseline of 0.
fn baseline_at(sorted_desc: &[f64], rank: usize) -> f64 {
    match sorted_desc.len() {
        0 => 0.0,
        len => sorted_desc[rank.saturating_sub(1).min(len - 1)],
    }
}

fn sorted_projections<'a>(players: impl Iterator<Item = &'a Player>) -> Vec<f64> {
    let mut pts: Vec<f64> = players.map(|p| p.proj_pts).collect();
    pts.sort_by(|a, b| b.total_cmp(a));
    pts
}

// ---------------------------------------------------------------------------
// VOR
// ---------------------------------------------------------------------------

/// Attach baseline, VOR and flex VOR to every player. Input order is kept.
pub fn add_vor(
    players: &[Player],
    replacement_ranks: &BTreeMap<Position, usize>,
    league_size: usize,
    roster: &RosterConfig,
) -> Vec<PlayerWithCalcs> {
    let mut baselines: BTreeMap<Position, f64> = BTreeMap::new();
    for pos in ALL_POSITIONS {
        let Some(&rank) = replacement_ranks.get(&pos) else {
            continue;
        };
        let pts = sorted_projections(players.iter().filter(|p| p.position == pos));
        baselines.insert(pos, baseline_at(&pts, rank));
    }

    let flex_pts = sorted_projections(players.iter().filter(|p| p.position.is_flex_eligible()));
    let flex_baseline = baseline_at(&flex_pts, flex_replacement_rank(roster, league_size));

    players
        .iter()
        .map(|p| {
            let mut calcs = PlayerWithCalcs::new(p.clone());
            calcs.baseline = baselines.get(&p.position).copied();
            calcs.vor = calcs.baseline.map(|b| p.proj_pts - b);
            if p.position.is_flex_eligible() {
                calcs.vor_flex = Some(p.proj_pts - flex_baseline);
            }
            calcs
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
