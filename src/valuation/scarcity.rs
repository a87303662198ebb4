// Positional scarcity.
//
// A player's scarcity is how far the position falls off after them: their
// projection minus the average of the next (up to) three players at the same
// position in the pool being evaluated.

use std::collections::HashMap;

use serde::Serialize;

use crate::draft::position::{Position, ALL_POSITIONS};
use crate::valuation::projections::Player;

/// How many lower-ranked players make up the "next tier".
const NEXT_TIER: usize = 3;

// ---------------------------------------------------------------------------
// Per-player scarcity
// ---------------------------------------------------------------------------

/// Drop-off from `proj` to the mean of `below` (at most the first three are
/// used). Never negative; 0 when nobody is below.
fn dropoff(proj: f64, below: &[f64]) -> f64 {
    let next: Vec<f64> = below.iter().take(NEXT_TIER).copied().collect();
    if next.is_empty() {
        return 0.0;
    }
    let mean = next.iter().sum::<f64>() / next.len() as f64;
    (proj - mean).max(0.0)
}

/// Projections per position, sorted descending.
fn by_position<'a>(pool: impl IntoIterator<Item = &'a Player>) -> HashMap<Position, Vec<f64>> {
    let mut groups: HashMap<Position, Vec<f64>> = HashMap::new();
    for p in pool {
        groups.entry(p.position).or_default().push(p.proj_pts);
    }
    for pts in groups.values_mut() {
        pts.sort_by(|a, b| b.total_cmp(a));
    }
    groups
}

/// Scarcity of every player in `pool`, returned in input order.
///
/// Ties at a position are ordered by input order, so the first of two equal
/// projections sees the second in its next tier.
pub fn compute_scarcity<'a>(pool: impl IntoIterator<Item = &'a Player>) -> Vec<f64> {
    let players: Vec<&Player> = pool.into_iter().collect();
    let mut scarcity = vec![0.0; players.len()];

    for pos in ALL_POSITIONS {
        let mut idx: Vec<usize> = (0..players.len())
            .filter(|&i| players[i].position == pos)
            .collect();
        idx.sort_by(|&a, &b| players[b].proj_pts.total_cmp(&players[a].proj_pts));
        let pts: Vec<f64> = idx.iter().map(|&i| players[i].proj_pts).collect();
        for (rank, &i) in idx.iter().enumerate() {
            scarcity[i] = dropoff(pts[rank], &pts[rank + 1..]);
        }
    }
    scarcity
}

// ---------------------------------------------------------------------------
// Position overview
// ---------------------------------------------------------------------------

/// Drop-off summary for one position among the available players.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionDropoff {
    pub position: Position,
    /// Available players at this position.
    pub available: usize,
    /// Projection of the best available player (0 when none).
    pub top_proj: f64,
    /// Mean projection of the next tier below the top player (0 when none).
    pub next_tier_avg: f64,
    /// Scarcity of the top player.
    pub dropoff: f64,
}

/// Per-position drop-off summary, steepest first. Positions with no
/// available players are listed last with zeros.
pub fn position_dropoffs<'a>(pool: impl IntoIterator<Item = &'a Player>) -> Vec<PositionDropoff> {
    let groups = by_position(pool);

    let mut entries: Vec<PositionDropoff> = ALL_POSITIONS
        .iter()
        .map(|&pos| {
            let pts = groups.get(&pos).map(Vec::as_slice).unwrap_or(&[]);
            let top_proj = pts.first().copied().unwrap_or(0.0);
            let next: Vec<f64> = pts.iter().skip(1).take(NEXT_TIER).copied().collect();
            let next_tier_avg = if next.is_empty() {
                0.0
            } else {
                next.iter().sum::<f64>() / next.len() as f64
            };
            PositionDropoff {
                position: pos,
                available: pts.len(),
                top_proj,
                next_tier_avg,
                dropoff: pts.get(1..).map_or(0.0, |rest| dropoff(top_proj, rest)),
            }
        })
        .collect();

    // Stable: ties keep position display order.
    entries.sort_by(|a, b| {
        (b.available > 0)
            .cmp(&(a.available > 0))
            .then_with(|| b.dropoff.total_cmp(&a.dropoff))
    });
    entries
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn make_player(name: &str, pos: Position, pts: f64) -> Player {
        Player {
            name: name.into(),
            team: None,
            position: pos,
            proj_pts: pts,
            pos_rank: 0,
            overall_rank: 0,
            age: None,
        }
    }

    #[test]
    fn next_three_average() {
        let pool = vec![
            make_player("A", Position::WideReceiver, 30.0),
            make_player("B", Position::WideReceiver, 25.0),
            make_player("C", Position::WideReceiver, 20.0),
            make_player("D", Position::WideReceiver, 15.0),
        ];
        let s = compute_scarcity(&pool);
        assert!(approx_eq(s[0], 10.0, 1e-9));
        // B: 25 - mean(20, 15)
        assert!(approx_eq(s[1], 7.5, 1e-9));
        assert!(approx_eq(s[2], 5.0, 1e-9));
        assert!(approx_eq(s[3], 0.0, 1e-9));
    }

    #[test]
    fn only_next_three_count() {
        let pool = vec![
            make_player("A", Position::RunningBack, 100.0),
            make_player("B", Position::RunningBack, 90.0),
            make_player("C", Position::RunningBack, 80.0),
            make_player("D", Position::RunningBack, 70.0),
            make_player("E", Position::RunningBack, 0.0),
        ];
        let s = compute_scarcity(&pool);
        assert!(approx_eq(s[0], 20.0, 1e-9));
    }

    #[test]
    fn positions_do_not_mix() {
        let pool = vec![
            make_player("QB", Position::Quarterback, 300.0),
            make_player("K", Position::Kicker, 120.0),
            make_player("K2", Position::Kicker, 100.0),
        ];
        let s = compute_scarcity(&pool);
        assert_eq!(s[0], 0.0);
        assert!(approx_eq(s[1], 20.0, 1e-9));
        assert_eq!(s[2], 0.0);
    }

    #[test]
    fn input_order_is_preserved() {
        let pool = vec![
            make_player("Low", Position::TightEnd, 50.0),
            make_player("High", Position::TightEnd, 90.0),
        ];
        let s = compute_scarcity(&pool);
        assert_eq!(s[0], 0.0);
        assert!(approx_eq(s[1], 40.0, 1e-9));
    }

    #[test]
    fn scarcity_is_never_negative() {
        let pool = vec![
            make_player("A", Position::Defense, 100.0),
            make_player("B", Position::Defense, 100.0),
            make_player("C", Position::Defense, 100.0),
        ];
        assert!(compute_scarcity(&pool).iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn empty_pool() {
        let pool: Vec<Player> = Vec::new();
        assert!(compute_scarcity(&pool).is_empty());
        let entries = position_dropoffs(&pool);
        assert_eq!(entries.len(), 6);
        assert!(entries.iter().all(|e| e.available == 0 && e.dropoff == 0.0));
    }

    #[test]
    fn dropoffs_sorted_steepest_first() {
        let pool = vec![
            make_player("TE1", Position::TightEnd, 200.0),
            make_player("TE2", Position::TightEnd, 120.0),
            make_player("WR1", Position::WideReceiver, 250.0),
            make_player("WR2", Position::WideReceiver, 240.0),
            make_player("WR3", Position::WideReceiver, 236.0),
            make_player("K1", Position::Kicker, 140.0),
        ];
        let entries = position_dropoffs(&pool);
        assert_eq!(entries[0].position, Position::TightEnd);
        assert!(approx_eq(entries[0].dropoff, 80.0, 1e-9));
        assert_eq!(entries[1].position, Position::WideReceiver);
        assert!(approx_eq(entries[1].next_tier_avg, 238.0, 1e-9));
        assert_eq!(entries[1].available, 3);

        // The lone kicker has no drop-off but is still listed ahead of the
        // empty positions.
        assert_eq!(entries[2].position, Position::Kicker);
        assert_eq!(entries[2].dropoff, 0.0);
        assert!(entries[3..].iter().all(|e| e.available == 0));
    }
}
