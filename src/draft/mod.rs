// Draft bookkeeping: positions, roster configuration, taken ledger, snapshots.

pub mod position;
pub mod roster;
pub mod snapshot;
pub mod state;
