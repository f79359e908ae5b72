//! Per-car timing record

use serde::{Deserialize, Serialize};

use crate::types::{CarId, EventKind};

/// Sentinel stored in best-time fields before a value has been recorded.
///
/// A genuinely zero-duration segment is indistinguishable from this value and
/// will be overwritten by the next segment of any length.
pub const UNSET_TIME: u32 = 0;

/// Timing state derived for one car during a capture session.
///
/// All times are milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarState {
    pub car_id: CarId,
    /// Whether the car was admitted to this session; fixed at session start
    pub seeded: bool,
    /// Inactive cars ignore every further event until the next session
    pub active: bool,
    pub current_lap: u32,
    pub completed_segments: u32,
    /// Kind of the last applied event, used by renderers as a display signal
    pub last_event_kind: Option<EventKind>,
    pub last_segment_timestamp: u32,
    pub last_event_timestamp: u32,
    pub lap_start_timestamp: u32,
    /// Current lap sector times, reset as the next sector starts
    pub sector_times: [u32; 3],
    pub best_sector_times: [u32; 3],
    pub best_lap_time: u32,
    pub best_lap_index: u32,
    pub total_elapsed_time: u32,
    pub pit_stop_count: u32,
    pub total_pit_time: u32,
}

impl CarState {
    /// Fresh record for the start of a session; unseeded cars start inactive.
    pub fn new(car_id: CarId, seeded: bool) -> Self {
        Self {
            car_id,
            seeded,
            active: seeded,
            current_lap: 0,
            completed_segments: 0,
            last_event_kind: None,
            last_segment_timestamp: 0,
            last_event_timestamp: 0,
            lap_start_timestamp: 0,
            sector_times: [UNSET_TIME; 3],
            best_sector_times: [UNSET_TIME; 3],
            best_lap_time: UNSET_TIME,
            best_lap_index: 0,
            total_elapsed_time: 0,
            pit_stop_count: 0,
            total_pit_time: 0,
        }
    }

    /// Whether a best lap has been recorded.
    pub fn has_best_lap(&self) -> bool {
        self.best_lap_time != UNSET_TIME
    }

    /// Whether the car is currently in the pit lane.
    pub fn in_pit(&self) -> bool {
        self.last_event_kind == Some(EventKind::PitStart)
    }

    /// Close sector `index` (0-based) at `timestamp`.
    pub(crate) fn complete_sector(&mut self, index: usize, timestamp: u32) {
        let time = timestamp.saturating_sub(self.last_segment_timestamp);
        self.sector_times[index] = time;
        if is_improvement(self.best_sector_times[index], time) {
            self.best_sector_times[index] = time;
        }
        self.sector_times[(index + 1) % 3] = UNSET_TIME;
        self.total_elapsed_time = self.total_elapsed_time.saturating_add(time);
        self.last_segment_timestamp = timestamp;
        self.completed_segments += 1;
    }

    /// Close the current lap at `timestamp`; called right after the third sector.
    pub(crate) fn complete_lap(&mut self, timestamp: u32) {
        let lap_time = timestamp.saturating_sub(self.lap_start_timestamp);
        if is_improvement(self.best_lap_time, lap_time) {
            self.best_lap_time = lap_time;
            self.best_lap_index = self.current_lap;
        }
        self.current_lap += 1;
        self.lap_start_timestamp = timestamp;
    }

    /// Record a pit stop ending at `timestamp`.
    pub(crate) fn complete_pit_stop(&mut self, timestamp: u32) {
        let pit_time = timestamp.saturating_sub(self.last_event_timestamp);
        self.pit_stop_count += 1;
        self.total_pit_time = self.total_pit_time.saturating_add(pit_time);
    }
}

fn is_improvement(best: u32, candidate: u32) -> bool {
    best == UNSET_TIME || candidate < best
}
