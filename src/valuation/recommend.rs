// Multi-factor recommendation scoring.
//
// score_base = w_delta * delta + w_vor * vor + w_scarcity * scarcity
// score      = score_base * pos_w * bench_w
//
// `delta` is the lineup points a candidate adds to the user's team, `pos_w`
// fades QB/DST/K in until later in the draft, and `bench_w` discounts players
// who would only sit on the bench.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::draft::position::Position;
use crate::draft::roster::RosterConfig;
use crate::valuation::baseline::PlayerWithCalcs;
use crate::valuation::lineup::compute_lineup_total;
use crate::valuation::projections::Player;
use crate::valuation::scarcity::compute_scarcity;

/// Delta above which a candidate is considered a starter for the user.
const WOULD_START_EPS: f64 = 0.05;

/// Boost applied to RB/WR/TE candidates who would start.
const STARTER_SKILL_BOOST: f64 = 1.08;

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// User-tunable scoring weights. Missing fields default to 0; nothing is
/// normalized.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationsWeights {
    pub w_delta: f64,
    pub w_vor: f64,
    pub w_scarcity: f64,
    /// Extra multiplier for RB/WR/TE depth picks that would not start.
    pub bench_depth_boost: f64,
}

// ---------------------------------------------------------------------------
// Phase and bench weights
// ---------------------------------------------------------------------------

/// Draft-phase multiplier. QB, DST and K ramp up toward 1.0 as the draft
/// progresses; RB/WR/TE get a small bump when they would start.
pub fn pos_w(position: Position, progress: f64, would_start: bool) -> f64 {
    match position {
        Position::Quarterback => {
            if progress < 0.5 {
                0.5
            } else if progress < 0.75 {
                0.75
            } else {
                1.0
            }
        }
        Position::Defense => {
            if progress < 0.9 {
                0.2
            } else if progress < 0.98 {
                0.6
            } else {
                1.0
            }
        }
        Position::Kicker => {
            if progress < 0.95 {
                0.15
            } else if progress < 0.99 {
                0.5
            } else {
                1.0
            }
        }
        Position::RunningBack | Position::WideReceiver | Position::TightEnd => {
            if would_start {
                STARTER_SKILL_BOOST
            } else {
                1.0
            }
        }
    }
}

/// Bench multiplier for candidates who would not start.
pub fn bench_w(position: Position, progress: f64, would_start: bool, bench_depth_boost: f64) -> f64 {
    if would_start {
        return 1.0;
    }
    match position {
        Position::RunningBack | Position::WideReceiver | Position::TightEnd => 1.0 + bench_depth_boost,
        Position::Quarterback => {
            if progress < 0.7 {
                0.5
            } else {
                0.7
            }
        }
        Position::Defense => {
            if progress < 0.9 {
                0.3
            } else {
                0.6
            }
        }
        Position::Kicker => {
            if progress < 0.95 {
                0.2
            } else {
                0.5
            }
        }
    }
}

/// Fraction of all draft picks already made, clamped to [0, 1].
pub fn draft_progress(taken_count: usize, league_size: usize, roster: &RosterConfig) -> f64 {
    let total_picks = roster.total_draft_picks(league_size).max(1);
    (taken_count as f64 / total_picks as f64).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

fn rank_order(a: &PlayerWithCalcs, b: &PlayerWithCalcs) -> Ordering {
    let vor = |p: &PlayerWithCalcs| p.vor.unwrap_or(f64::NEG_INFINITY);
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.score_base.total_cmp(&a.score_base))
        .then_with(|| b.delta.total_cmp(&a.delta))
        .then_with(|| vor(b).total_cmp(&vor(a)))
        .then_with(|| b.proj_pts().total_cmp(&a.proj_pts()))
}

/// Score every candidate against the user's current team and return them
/// best first.
///
/// `candidates` should already exclude taken players; scarcity is measured
/// within this pool. `my_team` is the user's drafted players.
pub fn recommend(
    candidates: Vec<PlayerWithCalcs>,
    roster: &RosterConfig,
    my_team: &[Player],
    taken_count: usize,
    league_size: usize,
    weights: &RecommendationsWeights,
) -> Vec<PlayerWithCalcs> {
    let baseline_total = compute_lineup_total(my_team, roster);
    let progress = draft_progress(taken_count, league_size, roster);
    let scarcity = compute_scarcity(candidates.iter().map(|c| &c.player));

    let mut ranked: Vec<PlayerWithCalcs> = candidates
        .into_iter()
        .zip(scarcity)
        .map(|(mut c, scarcity)| {
            let with_candidate = my_team.iter().chain(std::iter::once(&c.player));
            c.delta = compute_lineup_total(with_candidate, roster) - baseline_total;

            c.would_start = c.delta > WOULD_START_EPS;
            c.scarcity = scarcity;
            c.pos_w = pos_w(c.position(), progress, c.would_start);
            c.bench_w = bench_w(c.position(), progress, c.would_start, weights.bench_depth_boost);
            c.score_base = weights.w_delta * c.delta
                + weights.w_vor * c.scoring_vor()
                + weights.w_scarcity * c.scarcity;
            c.score = c.score_base * c.pos_w * c.bench_w;
            c
        })
        .collect();

    ranked.sort_by(rank_order);
    ranked
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
