//! Timing events and their fixed-width wire representation
//!
//! Each event travels as a 28-byte little-endian record:
//!
//! ```text
//! offset  field          type
//!      0  sequence_id    i32
//!      4  round_number   i32
//!      8  stage          i32 (Stage wire value)
//!     12  car_id         i32
//!     16  lap            i32
//!     20  kind           i32 (EventKind wire value)
//!     24  timestamp_ms   u32
//! ```

use serde::{Deserialize, Serialize};

use super::Stage;
use crate::wire::{i32_at, u32_at};
use crate::{RaceControlError, Result};

/// Size of one event record on the wire.
pub const EVENT_SIZE: usize = 28;

/// Kind of a timing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum EventKind {
    /// Malformed event emitted by the feed
    Error = 0,
    Start = 1,
    Sector1 = 2,
    Sector2 = 3,
    Sector3 = 4,
    PitStart = 5,
    PitEnd = 6,
    Retired = 7,
    Finish = 8,
}

impl EventKind {
    /// Decode a wire value.
    pub fn from_wire(value: i32) -> Option<EventKind> {
        let kind = match value {
            0 => EventKind::Error,
            1 => EventKind::Start,
            2 => EventKind::Sector1,
            3 => EventKind::Sector2,
            4 => EventKind::Sector3,
            5 => EventKind::PitStart,
            6 => EventKind::PitEnd,
            7 => EventKind::Retired,
            8 => EventKind::Finish,
            _ => return None,
        };
        Some(kind)
    }

    /// Encode as a wire value.
    pub fn to_wire(self) -> i32 {
        self as i32
    }
}

/// One timing event produced by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub sequence_id: i32,
    pub round_number: i32,
    pub stage: Stage,
    /// Raw car id, validated against the table when the event is applied
    pub car_id: i32,
    pub lap: i32,
    pub kind: EventKind,
    pub timestamp_ms: u32,
}

impl Event {
    /// Create an event with zeroed sequence and round numbers.
    pub fn new(stage: Stage, car_id: i32, lap: i32, kind: EventKind, timestamp_ms: u32) -> Self {
        Self { sequence_id: 0, round_number: 0, stage, car_id, lap, kind, timestamp_ms }
    }

    /// Set the sequence id.
    pub fn with_sequence(mut self, sequence_id: i32) -> Self {
        self.sequence_id = sequence_id;
        self
    }

    /// Decode one wire record.
    ///
    /// Unknown stage or event kind values are contract violations: the feed and
    /// the receiver disagree on the format.
    pub fn decode(data: &[u8; EVENT_SIZE]) -> Result<Self> {
        let field = |offset| i32_at(data, offset).unwrap_or_default();

        let stage_value = field(8);
        let stage = Stage::from_wire(stage_value).ok_or_else(|| {
            RaceControlError::contract_violation(format!("unknown stage value {stage_value}"))
        })?;
        let kind_value = field(20);
        let kind = EventKind::from_wire(kind_value).ok_or_else(|| {
            RaceControlError::contract_violation(format!("unknown event kind value {kind_value}"))
        })?;

        Ok(Self {
            sequence_id: field(0),
            round_number: field(4),
            stage,
            car_id: field(12),
            lap: field(16),
            kind,
            timestamp_ms: u32_at(data, 24).unwrap_or_default(),
        })
    }

    /// Encode into one wire record.
    pub fn encode(&self) -> [u8; EVENT_SIZE] {
        let mut data = [0u8; EVENT_SIZE];
        data[0..4].copy_from_slice(&self.sequence_id.to_le_bytes());
        data[4..8].copy_from_slice(&self.round_number.to_le_bytes());
        data[8..12].copy_from_slice(&self.stage.to_wire().to_le_bytes());
        data[12..16].copy_from_slice(&self.car_id.to_le_bytes());
        data[16..20].copy_from_slice(&self.lap.to_le_bytes());
        data[20..24].copy_from_slice(&self.kind.to_wire().to_le_bytes());
        data[24..28].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        data
    }
}
