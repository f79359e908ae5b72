//! Durable, resumable storage of round results.
//!
//! - [`record`]: stage classifications and competition rounds
//! - [`format`]: the fixed-width little-endian file record
//! - [`store`]: the per-season file, its resume rule and saves

pub mod format;
pub mod record;
mod store;

pub use format::{RECORD_SIZE, RecordError};
pub use record::{CompetitionRound, EntryTiming, STAGE_SLOTS, StageEntry, StageRecord};
pub use store::HistoricStore;
