//! Edit history for composed builds.
//!
//! [`EditHistoryRecorder`] turns a before/after pair into an immutable
//! [`EditHistoryEntry`](loadout_types::history::EditHistoryEntry).
//! [`HistoryLedger`] sequences those entries per item and hands them to a
//! [`HistoryStore`].

mod diff;
mod error;
mod ledger;
mod recorder;

pub use diff::parts_diff;
pub use error::HistoryError;
pub use ledger::{HistoryLedger, HistoryStore};
pub use recorder::{Clock, EditHistoryRecorder, SystemClock};
