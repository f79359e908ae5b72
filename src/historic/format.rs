//! Historic file record layout and codec
//!
//! The file is a sequence of fixed-size round records, one per round in
//! season order, all little-endian:
//!
//! 1. **Round header** (12 bytes): round id `i32`, sprint flag `u8`, 3 pad
//!    bytes, next stage `i32`
//! 2. **Stage slots** (11 x 724 bytes): practice 1-3, sprint qualifying 1-3,
//!    sprint, qualifying 1-3, feature race
//!
//! A stage slot is the stage wire value (`i32`, 0 for an empty slot) followed
//! by 20 entries of 36 bytes each:
//!
//! ```text
//! offset  field            type
//!      0  car_id           i32
//!      4  pit_stops        i32
//!      8  total_time       u32
//!     12  pit_time         u32
//!     16  best_lap_time    u32
//!     20  best_lap_index   i32
//!     24  best_sector_1    u32
//!     28  best_sector_2    u32
//!     32  best_sector_3    u32
//! ```
//!
//! Time-trial stages store zero pit fields.

use thiserror::Error;

use super::record::{CompetitionRound, EntryTiming, STAGE_SLOTS, StageEntry, StageRecord, slot_index};
use crate::types::{MAX_CARS, Stage};
use crate::wire::{i32_at, u32_at};

/// Size of one classification entry.
pub const ENTRY_SIZE: usize = 36;

/// Size of one stage slot.
pub const STAGE_RECORD_SIZE: usize = 4 + MAX_CARS * ENTRY_SIZE;

const ROUND_HEADER_SIZE: usize = 12;

/// Size of one round record.
pub const RECORD_SIZE: usize = ROUND_HEADER_SIZE + STAGE_SLOTS * STAGE_RECORD_SIZE;

/// Ways a round record can fail to decode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record is {0} bytes, expected {RECORD_SIZE}")]
    Truncated(usize),

    #[error("round id {found} stored at position {expected}")]
    RoundMismatch { expected: usize, found: i32 },

    #[error("invalid sprint flag {0}")]
    SprintFlag(u8),

    #[error("next stage value {0} is not a capturable stage or finished")]
    NextStage(i32),

    #[error("slot for {expected} holds stage value {found}")]
    SlotMismatch { expected: Stage, found: i32 },

    #[error("{stage} entry {index} holds car id {car_id}")]
    Entry { stage: Stage, index: usize, car_id: i32 },

    #[error("next stage {next} is not part of the weekend (sprint weekend: {sprint_weekend})")]
    UnreachableNextStage { next: Stage, sprint_weekend: bool },

    #[error("{stage} results stored: {stored}, but the next stage is {next}")]
    SlotFill { stage: Stage, stored: bool, next: Stage },
}

/// Encode a round into one file record.
pub fn encode_round(round: &CompetitionRound) -> Vec<u8> {
    let mut data = Vec::with_capacity(RECORD_SIZE);
    data.extend_from_slice(&(round.round_id as i32).to_le_bytes());
    data.push(u8::from(round.sprint_weekend));
    data.extend_from_slice(&[0u8; 3]);
    data.extend_from_slice(&round.next_stage.to_wire().to_le_bytes());

    for slot in round.slots() {
        match slot {
            Some(record) => encode_stage(record, &mut data),
            None => data.resize(data.len() + STAGE_RECORD_SIZE, 0),
        }
    }

    debug_assert_eq!(data.len(), RECORD_SIZE);
    data
}

fn encode_stage(record: &StageRecord, data: &mut Vec<u8>) {
    data.extend_from_slice(&record.stage().to_wire().to_le_bytes());
    for entry in record.entries() {
        let (total_time, pit_stops, pit_time) = match entry.timing {
            EntryTiming::TimeTrial { elapsed } => (elapsed, 0, 0),
            EntryTiming::Race { total_time, pit_stops, pit_time } => (total_time, pit_stops, pit_time),
        };
        data.extend_from_slice(&(entry.car_id as i32).to_le_bytes());
        data.extend_from_slice(&(pit_stops as i32).to_le_bytes());
        data.extend_from_slice(&total_time.to_le_bytes());
        data.extend_from_slice(&pit_time.to_le_bytes());
        data.extend_from_slice(&entry.best_lap_time.to_le_bytes());
        data.extend_from_slice(&(entry.best_lap_index as i32).to_le_bytes());
        for sector in entry.best_sectors {
            data.extend_from_slice(&sector.to_le_bytes());
        }
    }
}

/// Decode the round record stored at position `index` of the file.
pub fn decode_round(data: &[u8], index: usize) -> Result<CompetitionRound, RecordError> {
    if data.len() != RECORD_SIZE {
        return Err(RecordError::Truncated(data.len()));
    }

    let round_id = i32_at(data, 0).unwrap_or_default();
    if usize::try_from(round_id).ok() != Some(index) {
        return Err(RecordError::RoundMismatch { expected: index, found: round_id });
    }
    let sprint_weekend = match data[4] {
        0 => false,
        1 => true,
        flag => return Err(RecordError::SprintFlag(flag)),
    };
    let next_value = i32_at(data, 8).unwrap_or_default();
    let next_stage = Stage::from_wire(next_value)
        .filter(|stage| *stage != Stage::Error)
        .ok_or(RecordError::NextStage(next_value))?;

    let mut slots: [Option<StageRecord>; STAGE_SLOTS] = Default::default();
    for (position, (slot, expected)) in slots.iter_mut().zip(Stage::CAPTURABLE).enumerate() {
        let start = ROUND_HEADER_SIZE + position * STAGE_RECORD_SIZE;
        *slot = decode_stage(&data[start..start + STAGE_RECORD_SIZE], expected)?;
    }

    check_progress(sprint_weekend, next_stage, &slots)?;
    Ok(CompetitionRound::from_parts(index, sprint_weekend, next_stage, slots))
}

/// Slots must hold exactly the stages the weekend ran before `next_stage`.
fn check_progress(
    sprint_weekend: bool,
    next_stage: Stage,
    slots: &[Option<StageRecord>; STAGE_SLOTS],
) -> Result<(), RecordError> {
    let mut completed = [false; STAGE_SLOTS];
    let mut stage = Stage::Practice1;
    while stage != next_stage {
        let position = slot_index(stage).ok_or(RecordError::UnreachableNextStage { next: next_stage, sprint_weekend })?;
        completed[position] = true;
        stage = stage
            .next(sprint_weekend)
            .ok_or(RecordError::UnreachableNextStage { next: next_stage, sprint_weekend })?;
    }

    for ((slot, stage), completed) in slots.iter().zip(Stage::CAPTURABLE).zip(completed) {
        if slot.is_some() != completed {
            return Err(RecordError::SlotFill { stage, stored: slot.is_some(), next: next_stage });
        }
    }
    Ok(())
}

fn decode_stage(data: &[u8], expected: Stage) -> Result<Option<StageRecord>, RecordError> {
    let stage_value = i32_at(data, 0).unwrap_or_default();
    if stage_value == Stage::Error.to_wire() {
        return Ok(None);
    }
    if stage_value != expected.to_wire() {
        return Err(RecordError::SlotMismatch { expected, found: stage_value });
    }

    let mut entries = Vec::with_capacity(MAX_CARS);
    let mut seen = [false; MAX_CARS];
    for index in 0..MAX_CARS {
        let entry = &data[4 + index * ENTRY_SIZE..4 + (index + 1) * ENTRY_SIZE];
        let field = |offset| u32_at(entry, offset).unwrap_or_default();

        let raw_car_id = i32_at(entry, 0).unwrap_or_default();
        let car_id = usize::try_from(raw_car_id)
            .ok()
            .filter(|&car_id| car_id < MAX_CARS && !seen[car_id])
            .ok_or(RecordError::Entry { stage: expected, index, car_id: raw_car_id })?;
        seen[car_id] = true;

        let timing = if expected.is_race() {
            EntryTiming::Race { total_time: field(8), pit_stops: field(4), pit_time: field(12) }
        } else {
            EntryTiming::TimeTrial { elapsed: field(8) }
        };
        entries.push(StageEntry {
            car_id,
            best_lap_time: field(16),
            best_lap_index: field(20),
            best_sectors: [field(24), field(28), field(32)],
            timing,
        });
    }

    // entries are complete and distinct at this point
    Ok(StageRecord::new(expected, entries).ok())
}
