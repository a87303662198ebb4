// JSON draft snapshots: export/import of the taken ledger and roster buckets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::warn;

use super::position::RosterSlot;
use super::state::{DraftState, TakenLedger};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid snapshot JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk form of the draft state.
///
/// ```json
/// {"taken": {"Bijan Robinson": "gone"},
///  "my_roster": {"QB": 0, "RB": 1, ..., "BENCH": 0},
///  "my_roster_names": {"RB": ["Breece Hall"], ...}}
/// ```
///
/// `my_roster` is written for readability; on import the counts are
/// recomputed from `my_roster_names`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    #[serde(default, deserialize_with = "lenient")]
    pub taken: TakenLedger,
    #[serde(default, deserialize_with = "lenient")]
    pub my_roster: BTreeMap<String, usize>,
    #[serde(default, deserialize_with = "lenient")]
    pub my_roster_names: BTreeMap<String, Vec<String>>,
}

/// Either a well-formed `T` or anything else. Buffering keeps map key order,
/// so the ledger's pick order survives.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Value(T),
    Other(IgnoredAny),
}

impl<T: Default> Lenient<T> {
    fn or_default(self, what: &str) -> T {
        match self {
            Lenient::Value(v) => v,
            Lenient::Other(_) => {
                warn!("snapshot {} has an unexpected shape; treating as empty", what);
                T::default()
            }
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Lenient::<T>::deserialize(deserializer)?.or_default("field"))
}

impl DraftSnapshot {
    /// Capture the current draft state.
    pub fn capture(state: &DraftState) -> Self {
        let mut my_roster = BTreeMap::new();
        let mut my_roster_names = BTreeMap::new();
        for (slot, names) in state.buckets() {
            my_roster.insert(slot.key().to_string(), names.len());
            my_roster_names.insert(slot.key().to_string(), names.to_vec());
        }
        DraftSnapshot {
            taken: state.taken().clone(),
            my_roster,
            my_roster_names,
        }
    }

    /// Load this snapshot into `state`, replacing its ledger and roster.
    ///
    /// Unknown slot keys are skipped; count/name mismatches are logged and the
    /// name lists win.
    pub fn apply_to(self, state: &mut DraftState) {
        let mut buckets: BTreeMap<RosterSlot, Vec<String>> = BTreeMap::new();
        for (key, names) in self.my_roster_names {
            let Some(slot) = RosterSlot::from_key(&key) else {
                warn!("snapshot has unknown roster slot '{}', skipping", key);
                continue;
            };
            if let Some(&count) = self.my_roster.get(&key) {
                if count != names.len() {
                    warn!(
                        "snapshot slot {} lists {} names but a count of {}; using the names",
                        key,
                        names.len(),
                        count
                    );
                }
            }
            buckets.entry(slot).or_default().extend(names);
        }
        state.restore(self.taken, buckets);
    }

    /// Parse a snapshot, treating absent or mistyped top-level fields as empty.
    /// Only malformed JSON is an error.
    pub fn from_json_str(text: &str) -> Result<Self, SnapshotError> {
        let doc: Lenient<DraftSnapshot> = serde_json::from_str(text)?;
        Ok(doc.or_default("document"))
    }

    pub fn to_json_string(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a snapshot file.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Write a snapshot file, replacing any existing one.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let text = self.to_json_string()?;
        std::fs::write(path, text).map_err(|source| SnapshotError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
