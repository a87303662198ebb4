// Draft state: taken-player ledger, the user's roster buckets, single-step undo.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use super::position::{Position, RosterSlot};
use super::roster::RosterConfig;

// ---------------------------------------------------------------------------
// Taken ledger
// ---------------------------------------------------------------------------

/// Whether a taken player went to the user or to another team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakenStatus {
    Mine,
    Gone,
}

impl TakenStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TakenStatus::Mine => "mine",
            TakenStatus::Gone => "gone",
        }
    }
}

/// Insertion-ordered map of taken player name -> status.
///
/// Serialized as a JSON object whose key order is the pick order, so the
/// newest entry is always the last key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TakenLedger {
    entries: Vec<(String, TakenStatus)>,
}

impl TakenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn status(&self, name: &str) -> Option<TakenStatus> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, status)| status)
    }

    /// Most recently inserted entry.
    pub fn last(&self) -> Option<(&str, TakenStatus)> {
        self.entries.last().map(|(n, s)| (n.as_str(), *s))
    }

    /// Iterate entries in pick order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TakenStatus)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), *s))
    }

    /// Record a status. An existing name keeps its position in the order and
    /// has its status overwritten.
    pub fn insert(&mut self, name: &str, status: TakenStatus) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = status,
            None => self.entries.push((name.to_string(), status)),
        }
    }

    fn pop(&mut self) -> Option<(String, TakenStatus)> {
        self.entries.pop()
    }
}

impl Serialize for TakenLedger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, status) in &self.entries {
            map.serialize_entry(name, status)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TakenLedger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LedgerVisitor;

        impl<'de> Visitor<'de> for LedgerVisitor {
            type Value = TakenLedger;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of player name to \"mine\" or \"gone\"")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut ledger = TakenLedger::new();
                while let Some((name, status)) = access.next_entry::<String, TakenStatus>()? {
                    ledger.insert(&name, status);
                }
                Ok(ledger)
            }
        }

        deserializer.deserialize_map(LedgerVisitor)
    }
}

// ---------------------------------------------------------------------------
// Mutation outcomes
// ---------------------------------------------------------------------------

/// Result of a `take` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeOutcome {
    /// The player was added to the ledger. `slot` is the roster bucket the
    /// player landed in (only for the user's own picks with a known position).
    Recorded { slot: Option<RosterSlot> },
    /// The player was already in the ledger; nothing changed.
    AlreadyTaken(TakenStatus),
}

/// The ledger entry reverted by `undo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoneTake {
    pub name: String,
    pub status: TakenStatus,
    /// Bucket the name was removed from, if it was on the user's roster.
    pub slot: Option<RosterSlot>,
}

/// Remove the first occurrence of `name` from `list`, returning whether a
/// removal happened.
fn remove_by_value(list: &mut Vec<String>, name: &str) -> bool {
    match list.iter().position(|n| n == name) {
        Some(idx) => {
            list.remove(idx);
            true
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// DraftState
// ---------------------------------------------------------------------------

/// The complete draft bookkeeping for the user.
///
/// Roster counts are derived from the per-bucket name lists, so a count can
/// never disagree with the names occupying the bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftState {
    roster: RosterConfig,
    taken: TakenLedger,
    my_roster: BTreeMap<RosterSlot, Vec<String>>,
}

impl DraftState {
    /// Create an empty draft state with one (empty) bucket per roster slot.
    pub fn new(roster: RosterConfig) -> Self {
        let my_roster = roster.slots().into_iter().map(|s| (s, Vec::new())).collect();
        DraftState {
            roster,
            taken: TakenLedger::new(),
            my_roster,
        }
    }

    pub fn roster_config(&self) -> &RosterConfig {
        &self.roster
    }

    pub fn taken(&self) -> &TakenLedger {
        &self.taken
    }

    /// Number of players taken by anyone so far.
    pub fn taken_count(&self) -> usize {
        self.taken.len()
    }

    /// Number of players assigned to a bucket.
    pub fn slot_count(&self, slot: RosterSlot) -> usize {
        self.slot_names(slot).len()
    }

    /// Names occupying a bucket, in the order they were added.
    pub fn slot_names(&self, slot: RosterSlot) -> &[String] {
        self.my_roster.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every bucket with its occupants, in slot order.
    pub fn buckets(&self) -> impl Iterator<Item = (RosterSlot, &[String])> {
        self.my_roster.iter().map(|(slot, names)| (*slot, names.as_slice()))
    }

    /// Distinct names on the user's roster, in slot order.
    pub fn my_player_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for list in self.my_roster.values() {
            for name in list {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    fn has_room(&self, slot: RosterSlot) -> bool {
        self.slot_count(slot) < self.roster.capacity(slot)
    }

    /// Pick the bucket for one of the user's players: own position slot if
    /// under capacity, else FLEX for RB/WR/TE with room, else bench.
    fn assign_slot(&self, position: Position) -> RosterSlot {
        let own = RosterSlot::Starter(position);
        if self.has_room(own) {
            own
        } else if position.is_flex_eligible() && self.has_room(RosterSlot::Flex) {
            RosterSlot::Flex
        } else {
            RosterSlot::Bench
        }
    }

    /// Mark a player as taken.
    ///
    /// `position` is the player's position in the pool; when it is `None` a
    /// pick of the user's is still recorded in the ledger but not slotted.
    pub fn take(&mut self, name: &str, position: Option<Position>, mine: bool) -> TakeOutcome {
        if let Some(status) = self.taken.status(name) {
            debug!("'{}' already taken ({}), ignoring", name, status.label());
            return TakeOutcome::AlreadyTaken(status);
        }

        let status = if mine { TakenStatus::Mine } else { TakenStatus::Gone };
        self.taken.insert(name, status);

        if !mine {
            return TakeOutcome::Recorded { slot: None };
        }

        let Some(position) = position else {
            warn!("'{}' has no known position; recorded without a roster slot", name);
            return TakeOutcome::Recorded { slot: None };
        };

        let slot = self.assign_slot(position);
        self.my_roster.entry(slot).or_default().push(name.to_string());
        TakeOutcome::Recorded { slot: Some(slot) }
    }

    /// Revert the most recent `take`. No-op on an empty ledger.
    ///
    /// `position_of` resolves the reverted player's position so the own
    /// position bucket can be checked first; buckets are searched in order
    /// own position, FLEX, bench (every starter bucket when the position is
    /// unknown).
    pub fn undo<F>(&mut self, position_of: F) -> Option<UndoneTake>
    where
        F: FnOnce(&str) -> Option<Position>,
    {
        let (name, status) = self.taken.pop()?;

        let slot = match status {
            TakenStatus::Gone => None,
            TakenStatus::Mine => {
                let mut search: Vec<RosterSlot> = match position_of(&name) {
                    Some(pos) => vec![RosterSlot::Starter(pos)],
                    None => self.roster.starters.keys().map(|&p| RosterSlot::Starter(p)).collect(),
                };
                search.push(RosterSlot::Flex);
                search.push(RosterSlot::Bench);

                search.into_iter().find(|slot| {
                    self.my_roster
                        .get_mut(slot)
                        .is_some_and(|list| remove_by_value(list, &name))
                })
            }
        };

        Some(UndoneTake { name, status, slot })
    }

    /// Replace the ledger and roster buckets wholesale (snapshot restore).
    ///
    /// Buckets not present in `my_roster` are reset to empty; a name already
    /// placed in an earlier bucket is dropped from later ones.
    pub fn restore(&mut self, taken: TakenLedger, my_roster: BTreeMap<RosterSlot, Vec<String>>) {
        self.taken = taken;
        for list in self.my_roster.values_mut() {
            list.clear();
        }
        let mut seen: Vec<String> = Vec::new();
        for (slot, names) in my_roster {
            let bucket = self.my_roster.entry(slot).or_default();
            for name in names {
                if seen.contains(&name) {
                    warn!("'{}' listed in more than one roster slot; keeping the first", name);
                    continue;
                }
                seen.push(name.clone());
                bucket.push(name);
            }
        }
    }

    /// Clear every pick, keeping the roster configuration.
    pub fn reset(&mut self) {
        *self = DraftState::new(self.roster.clone());
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Drop every player whose name appears in the taken ledger.
pub fn apply_taken<T, F>(players: &[T], taken: &TakenLedger, name_of: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    if taken.is_empty() {
        return players.to_vec();
    }
    players
        .iter()
        .filter(|p| !taken.contains(name_of(p)))
        .cloned()
        .collect()
}
