// Roster configuration: starter slots per position, FLEX, and bench.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::position::{Position, RosterSlot};

/// How many players of each kind a team starts, plus bench depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Dedicated starter slots per position. Positions absent from the map
    /// have no dedicated slot.
    pub starters: BTreeMap<Position, usize>,
    /// FLEX slot count (RB/WR/TE eligible). `None` when the league config has
    /// no FLEX entry at all.
    pub flex: Option<usize>,
    /// Bench size.
    pub bench: usize,
}

impl RosterConfig {
    /// Build a roster config from a league.toml roster table, e.g.
    /// `{"QB": 1, "RB": 2, "WR": 2, "TE": 1, "FLEX": 1, "DST": 1, "K": 1}`.
    ///
    /// A bench entry in the table ("BE"/"BENCH") overrides `bench`. Unknown
    /// keys are skipped with a warning.
    pub fn from_table(table: &HashMap<String, usize>, bench: usize) -> Self {
        let mut starters = BTreeMap::new();
        let mut flex = None;
        let mut bench = bench;

        for (key, &count) in table {
            match RosterSlot::from_key(key) {
                Some(RosterSlot::Starter(pos)) => {
                    starters.insert(pos, count);
                }
                Some(RosterSlot::Flex) => flex = Some(count),
                Some(RosterSlot::Bench) => bench = count,
                None => warn!("ignoring unknown roster slot '{}' in league config", key),
            }
        }

        RosterConfig {
            starters,
            flex,
            bench,
        }
    }

    /// Dedicated starter slots for a position (0 if not configured).
    pub fn starter_slots(&self, pos: Position) -> usize {
        self.starters.get(&pos).copied().unwrap_or(0)
    }

    /// FLEX slots available to fill (0 if not configured).
    pub fn flex_slots(&self) -> usize {
        self.flex.unwrap_or(0)
    }

    /// Capacity of a roster bucket.
    pub fn capacity(&self, slot: RosterSlot) -> usize {
        match slot {
            RosterSlot::Starter(pos) => self.starter_slots(pos),
            RosterSlot::Flex => self.flex_slots(),
            RosterSlot::Bench => self.bench,
        }
    }

    /// Every bucket the user's roster tracks, in display order: configured
    /// starter positions, then FLEX (if configured), then bench.
    pub fn slots(&self) -> Vec<RosterSlot> {
        let mut slots: Vec<RosterSlot> = self
            .starters
            .keys()
            .map(|&pos| RosterSlot::Starter(pos))
            .collect();
        if self.flex.is_some() {
            slots.push(RosterSlot::Flex);
        }
        slots.push(RosterSlot::Bench);
        slots
    }

    /// Total roster spots per team, starters + FLEX + bench.
    pub fn spots_per_team(&self) -> usize {
        self.starters.values().sum::<usize>() + self.flex_slots() + self.bench
    }

    /// Total number of picks in the draft across all teams.
    pub fn total_draft_picks(&self, league_size: usize) -> usize {
        league_size * self.spots_per_team()
    }
}

impl Default for RosterConfig {
    /// The standard 1 QB / 2 RB / 2 WR / 1 TE / 1 FLEX / 1 DST / 1 K lineup
    /// with a 7-player bench.
    fn default() -> Self {
        let starters = BTreeMap::from([
            (Position::Quarterback, 1),
            (Position::RunningBack, 2),
            (Position::WideReceiver, 2),
            (Position::TightEnd, 1),
            (Position::Defense, 1),
            (Position::Kicker, 1),
        ]);
        RosterConfig {
            starters,
            flex: Some(1),
            bench: 7,
        }
    }
}
