//! Per-competitor timing state.
//!
//! The [`CarTable`] holds one [`CarState`] per car and turns raw timing
//! events into derived fields: sector and lap times, bests, elapsed time and
//! pit statistics. It is owned by the capture session worker; readers only
//! ever see published snapshots.

mod car_state;
mod table;

pub use car_state::{CarState, UNSET_TIME};
pub use table::{CarTable, EventOutcome, Seeding};
