// Football positions and the roster slots they can occupy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Football positions used for valuation and roster slot assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Defense,
    Kicker,
}

/// Every position, in display order.
pub const ALL_POSITIONS: [Position; 6] = [
    Position::Quarterback,
    Position::RunningBack,
    Position::WideReceiver,
    Position::TightEnd,
    Position::Defense,
    Position::Kicker,
];

/// Positions that may fill a FLEX slot.
pub const FLEX_POSITIONS: [Position; 3] = [
    Position::RunningBack,
    Position::WideReceiver,
    Position::TightEnd,
];

impl Position {
    /// Parse a position string into a Position enum.
    ///
    /// Accepts the usual abbreviations case-insensitively:
    /// - "QB", "RB", "WR", "TE"
    /// - "DST" / "DEF" / "D/ST" -> Defense
    /// - "K" / "PK" -> Kicker
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "DST" | "DEF" | "D/ST" => Some(Position::Defense),
            "K" | "PK" => Some(Position::Kicker),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Defense => "DST",
            Position::Kicker => "K",
        }
    }

    /// Whether this position can fill a FLEX slot (RB/WR/TE).
    pub fn is_flex_eligible(&self) -> bool {
        FLEX_POSITIONS.contains(self)
    }

    /// Fraction of league size added to the starter count when locating the
    /// replacement-level player, modelling demand for backups.
    pub fn bench_share(&self) -> f64 {
        match self {
            Position::Quarterback => 0.3,
            Position::RunningBack => 1.5,
            Position::WideReceiver => 1.5,
            Position::TightEnd => 0.4,
            Position::Defense => 0.2,
            Position::Kicker => 0.2,
        }
    }

    /// Name of the per-position projections file.
    pub fn file_name(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB.csv",
            Position::RunningBack => "RB.csv",
            Position::WideReceiver => "WR.csv",
            Position::TightEnd => "TE.csv",
            Position::Defense => "DST.csv",
            Position::Kicker => "K.csv",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Roster slots
// ---------------------------------------------------------------------------

/// A bucket on the user's roster: a dedicated position slot, the shared FLEX
/// slot, or the bench.
///
/// Serialized as its slot key ("QB", "FLEX", "BENCH", ...) so snapshot files
/// stay readable and compatible with string-keyed maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RosterSlot {
    Starter(Position),
    Flex,
    Bench,
}

impl RosterSlot {
    /// Parse a slot key. "BE"/"BN" are accepted as bench aliases.
    pub fn from_key(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "FLEX" => Some(RosterSlot::Flex),
            "BENCH" | "BE" | "BN" => Some(RosterSlot::Bench),
            other => Position::from_str_pos(other).map(RosterSlot::Starter),
        }
    }

    /// The key used in config and snapshot files.
    pub fn key(&self) -> &'static str {
        match self {
            RosterSlot::Starter(pos) => pos.display_str(),
            RosterSlot::Flex => "FLEX",
            RosterSlot::Bench => "BENCH",
        }
    }
}

impl fmt::Display for RosterSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl TryFrom<String> for RosterSlot {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RosterSlot::from_key(&value).ok_or_else(|| format!("unknown roster slot '{value}'"))
    }
}

impl From<RosterSlot> for String {
    fn from(slot: RosterSlot) -> Self {
        slot.key().to_string()
    }
}
