// Greedy starting-lineup valuation.
//
// Fills QB, TE, DST and K first, then RB, then WR, then FLEX from whatever
// RB/WR/TE remain. Bench players contribute nothing. The fill order is fixed
// so results are reproducible; it is a heuristic, not an optimal assignment.

use crate::draft::position::Position;
use crate::draft::roster::RosterConfig;
use crate::valuation::projections::Player;

/// Dedicated positions in the order their slots are filled.
const FILL_ORDER: [Position; 6] = [
    Position::Quarterback,
    Position::TightEnd,
    Position::Defense,
    Position::Kicker,
    Position::RunningBack,
    Position::WideReceiver,
];

/// Total projected points of the best greedy starting lineup the given
/// players can field. Returns 0 for an empty set.
pub fn compute_lineup_total<'a>(
    players: impl IntoIterator<Item = &'a Player>,
    roster: &RosterConfig,
) -> f64 {
    let mut pool: Vec<&Player> = players.into_iter().collect();
    // Stable, so equal projections keep their input order.
    pool.sort_by(|a, b| b.proj_pts.total_cmp(&a.proj_pts));

    let mut claimed = vec![false; pool.len()];
    let mut total = 0.0;

    for pos in FILL_ORDER {
        let mut open = roster.starter_slots(pos);
        for (i, player) in pool.iter().enumerate() {
            if open == 0 {
                break;
            }
            if !claimed[i] && player.position == pos {
                claimed[i] = true;
                total += player.proj_pts;
                open -= 1;
            }
        }
    }

    let mut open = roster.flex_slots();
    for (i, player) in pool.iter().enumerate() {
        if open == 0 {
            break;
        }
        if !claimed[i] && player.position.is_flex_eligible() {
            claimed[i] = true;
            total += player.proj_pts;
            open -= 1;
        }
    }

    total
}

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
    fn empty_team_is_zero() {
        let players: Vec<Player> = Vec::new();
        assert_eq!(compute_lineup_total(&players, &RosterConfig::default()), 0.0);
    }

    #[test]
    fn fills_dedicated_slots_then_flex() {
        let roster = RosterConfig::default();
        let players = vec![
            make_player("QB1", Position::Quarterback, 300.0),
            make_player("QB2", Position::Quarterback, 280.0),
            make_player("RB1", Position::RunningBack, 250.0),
            make_player("RB2", Position::RunningBack, 200.0),
            make_player("RB3", Position::RunningBack, 150.0),
            make_player("WR1", Position::WideReceiver, 240.0),
            make_player("WR2", Position::WideReceiver, 220.0),
            make_player("WR3", Position::WideReceiver, 160.0),
            make_player("TE1", Position::TightEnd, 120.0),
        ];
        // QB2 is a bench player; FLEX takes WR3 (160) over RB3 (150).
        let expected = 300.0 + 250.0 + 200.0 + 240.0 + 220.0 + 120.0 + 160.0;
        assert!(approx_eq(
            compute_lineup_total(&players, &roster),
            expected,
            1e-9
        ));
    }

    #[test]
    fn second_te_can_fill_flex() {
        let roster = RosterConfig::default();
        let players = vec![
            make_player("TE1", Position::TightEnd, 150.0),
            make_player("TE2", Position::TightEnd, 100.0),
        ];
        assert!(approx_eq(compute_lineup_total(&players, &roster), 250.0, 1e-9));
    }

    #[test]
    fn no_flex_configured() {
        let mut roster = RosterConfig::default();
        roster.flex = None;
        let players = vec![
            make_player("RB1", Position::RunningBack, 100.0),
            make_player("RB2", Position::RunningBack, 90.0),
            make_player("RB3", Position::RunningBack, 80.0),
        ];
        assert!(approx_eq(compute_lineup_total(&players, &roster), 190.0, 1e-9));
    }

    #[test]
    fn kickers_never_fill_flex() {
        let roster = RosterConfig::default();
        let players = vec![
            make_player("K1", Position::Kicker, 140.0),
            make_player("K2", Position::Kicker, 130.0),
        ];
        assert!(approx_eq(compute_lineup_total(&players, &roster), 140.0, 1e-9));
    }

    #[test]
    fn input_order_does_not_matter() {
        let roster = RosterConfig::default();
        let mut players = vec![
            make_player("WR1", Position::WideReceiver, 100.0),
            make_player("WR2", Position::WideReceiver, 200.0),
            make_player("WR3", Position::WideReceiver, 300.0),
            make_player("WR4", Position::WideReceiver, 50.0),
        ];
        let forward = compute_lineup_total(&players, &roster);
        players.reverse();
        assert!(approx_eq(forward, compute_lineup_total(&players, &roster), 1e-9));
        assert!(approx_eq(forward, 600.0, 1e-9));
    }

    #[test]
    fn adding_a_player_never_lowers_total() {
        let roster = RosterConfig::default();
        let pool = vec![
            make_player("QB1", Position::Quarterback, 310.0),
            make_player("RB1", Position::RunningBack, 260.0),
            make_player("RB2", Position::RunningBack, 180.0),
            make_player("WR1", Position::WideReceiver, 230.0),
            make_player("TE1", Position::TightEnd, 140.0),
            make_player("TE2", Position::TightEnd, 90.0),
            make_player("DST1", Position::Defense, 110.0),
            make_player("K1", Position::Kicker, 130.0),
            make_player("WR2", Position::WideReceiver, 20.0),
        ];
        let mut team: Vec<Player> = Vec::new();
        let mut previous = 0.0;
        for player in pool {
            team.push(player);
            let total = compute_lineup_total(&team, &roster);
            assert!(total >= previous - 1e-9, "total dropped to {total}");
            previous = total;
        }
    }
}
