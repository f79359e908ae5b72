//! Car table: one timing record per competitor and the event state machine

use tracing::{debug, error, trace};

use super::CarState;
use crate::types::{CarId, Event, EventKind, MAX_CARS};
use crate::{RaceControlError, Result};

/// Which cars start a session active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Seeding {
    /// Every car takes part
    #[default]
    AllActive,
    /// Only the listed cars take part; the rest start inactive
    Only(Vec<CarId>),
}

impl Seeding {
    /// Whether `car_id` starts the session active.
    pub fn is_active(&self, car_id: CarId) -> bool {
        match self {
            Seeding::AllActive => true,
            Seeding::Only(cars) => cars.contains(&car_id),
        }
    }
}

/// What applying an event did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event updated the car record
    Applied,
    /// The car is inactive; nothing changed
    Ignored,
    /// The event carried the error kind; nothing changed
    Rejected,
}

/// Timing records for every car in a capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarTable {
    cars: [CarState; MAX_CARS],
}

impl Default for CarTable {
    fn default() -> Self {
        Self::new_session(&Seeding::AllActive)
    }
}

impl CarTable {
    /// Reset table for a new session.
    pub fn new_session(seeding: &Seeding) -> Self {
        Self { cars: std::array::from_fn(|car_id| CarState::new(car_id, seeding.is_active(car_id))) }
    }

    /// All records, indexed by car id.
    pub fn cars(&self) -> &[CarState; MAX_CARS] {
        &self.cars
    }

    /// Record for `car_id`, if in range.
    pub fn car(&self, car_id: CarId) -> Option<&CarState> {
        self.cars.get(car_id)
    }

    /// Number of cars still active.
    pub fn active_count(&self) -> usize {
        self.cars.iter().filter(|car| car.active).count()
    }

    /// Apply one event.
    ///
    /// A car id outside `[0, MAX_CARS)` is a contract violation. Events for
    /// inactive cars are ignored. Events of the error kind are rejected
    /// without touching the record.
    pub fn apply_event(&mut self, event: &Event) -> Result<EventOutcome> {
        let car = usize::try_from(event.car_id)
            .ok()
            .and_then(|car_id| self.cars.get_mut(car_id))
            .ok_or_else(|| {
                error!(
                    "Event {} targets car {} outside [0, {})",
                    event.sequence_id, event.car_id, MAX_CARS
                );
                RaceControlError::contract_violation(format!(
                    "event {} targets car id {} outside [0, {})",
                    event.sequence_id, event.car_id, MAX_CARS
                ))
            })?;

        if !car.active {
            debug!("Ignoring {:?} for inactive car {}", event.kind, car.car_id);
            return Ok(EventOutcome::Ignored);
        }

        let timestamp = event.timestamp_ms;
        match event.kind {
            EventKind::Error => {
                error!("Illegal event {} received for car {}", event.sequence_id, car.car_id);
                return Ok(EventOutcome::Rejected);
            }
            EventKind::Start => car.current_lap = 0,
            EventKind::Sector1 => car.complete_sector(0, timestamp),
            EventKind::Sector2 => car.complete_sector(1, timestamp),
            EventKind::Sector3 => {
                car.complete_sector(2, timestamp);
                car.complete_lap(timestamp);
            }
            EventKind::Retired => car.active = false,
            EventKind::Finish | EventKind::PitStart => {}
            EventKind::PitEnd => car.complete_pit_stop(timestamp),
        }

        car.last_event_kind = Some(event.kind);
        car.last_event_timestamp = timestamp;

        trace!(
            "Car {} {:?} at {}ms: lap={}, segments={}, elapsed={}",
            car.car_id,
            event.kind,
            timestamp,
            car.current_lap,
            car.completed_segments,
            car.total_elapsed_time
        );

        Ok(EventOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::UNSET_TIME;
    use crate::types::Stage;
    use proptest::prelude::*;

    fn event(car_id: i32, lap: i32, kind: EventKind, timestamp_ms: u32) -> Event {
        Event::new(Stage::Practice1, car_id, lap, kind, timestamp_ms)
    }

    fn apply_all(table: &mut CarTable, events: &[Event]) {
        for e in events {
            table.apply_event(e).unwrap();
        }
    }

    #[test]
    fn single_lap_derives_sector_and_lap_times() {
        let mut table = CarTable::default();
        apply_all(
            &mut table,
            &[
                event(3, 0, EventKind::Start, 0),
                event(3, 0, EventKind::Sector1, 30_000),
                event(3, 0, EventKind::Sector2, 60_000),
            ],
        );

        let car = table.car(3).unwrap();
        assert_eq!(car.sector_times, [30_000, 30_000, UNSET_TIME]);

        table.apply_event(&event(3, 0, EventKind::Sector3, 90_000)).unwrap();
        let car = table.car(3).unwrap();
        // The third sector resets sector one for the lap that just started.
        assert_eq!(car.sector_times, [UNSET_TIME, 30_000, 30_000]);
        assert_eq!(car.best_sector_times, [30_000, 30_000, 30_000]);
        assert_eq!(car.best_lap_time, 90_000);
        assert_eq!(car.best_lap_index, 0);
        assert_eq!(car.current_lap, 1);
        assert_eq!(car.total_elapsed_time, 90_000);
        assert_eq!(car.completed_segments, 3);
        assert_eq!(car.last_event_kind, Some(EventKind::Sector3));
        assert_eq!(car.last_event_timestamp, 90_000);
    }

    #[test]
    fn best_lap_tracks_fastest_lap_index() {
        let mut table = CarTable::default();
        apply_all(
            &mut table,
            &[
                event(0, 0, EventKind::Start, 0),
                event(0, 0, EventKind::Sector1, 30_000),
                event(0, 0, EventKind::Sector2, 60_000),
                event(0, 0, EventKind::Sector3, 95_000),
                event(0, 1, EventKind::Sector1, 120_000),
                event(0, 1, EventKind::Sector2, 145_000),
                event(0, 1, EventKind::Sector3, 175_000),
                event(0, 2, EventKind::Sector1, 210_000),
                event(0, 2, EventKind::Sector2, 245_000),
                event(0, 2, EventKind::Sector3, 280_000),
            ],
        );

        let car = table.car(0).unwrap();
        assert_eq!(car.best_lap_time, 80_000);
        assert_eq!(car.best_lap_index, 1);
        assert_eq!(car.best_sector_times, [25_000, 25_000, 30_000]);
        assert_eq!(car.current_lap, 3);
        assert_eq!(car.total_elapsed_time, 280_000);
    }

    #[test]
    fn pit_stop_measures_from_pit_entry() {
        let mut table = CarTable::default();
        apply_all(
            &mut table,
            &[
                event(5, 0, EventKind::Start, 0),
                event(5, 0, EventKind::PitStart, 10_000),
                event(5, 0, EventKind::PitEnd, 32_500),
            ],
        );
        let car = table.car(5).unwrap();
        assert!(!car.in_pit());
        assert_eq!(car.pit_stop_count, 1);
        assert_eq!(car.total_pit_time, 22_500);
        assert_eq!(car.total_elapsed_time, 0);
    }

    #[test]
    fn pit_start_is_only_a_display_signal() {
        let mut table = CarTable::default();
        let before = *table.car(2).unwrap();
        table.apply_event(&event(2, 0, EventKind::PitStart, 5_000)).unwrap();
        let after = table.car(2).unwrap();
        assert!(after.in_pit());
        assert_eq!(after.pit_stop_count, before.pit_stop_count);
        assert_eq!(after.total_elapsed_time, before.total_elapsed_time);
        assert_eq!(after.last_event_timestamp, 5_000);
    }

    #[test]
    fn retired_car_never_resumes() {
        let mut table = CarTable::default();
        table.apply_event(&event(7, 0, EventKind::Retired, 1_000)).unwrap();
        let outcome = table.apply_event(&event(7, 0, EventKind::Sector1, 30_000)).unwrap();
        assert_eq!(outcome, EventOutcome::Ignored);

        let car = table.car(7).unwrap();
        assert!(!car.active);
        assert_eq!(car.completed_segments, 0);
        assert_eq!(car.last_event_kind, Some(EventKind::Retired));
        assert_eq!(table.active_count(), MAX_CARS - 1);
    }

    #[test]
    fn out_of_range_car_is_a_contract_violation() {
        let mut table = CarTable::default();
        for car_id in [-1, 20, i32::MAX] {
            let err = table.apply_event(&event(car_id, 0, EventKind::Start, 0)).unwrap_err();
            assert!(matches!(err, RaceControlError::ContractViolation { .. }));
        }
        assert_eq!(table, CarTable::default());
    }

    #[test]
    fn error_kind_is_rejected_without_changes() {
        let mut table = CarTable::default();
        let outcome = table.apply_event(&event(1, 0, EventKind::Error, 500)).unwrap();
        assert_eq!(outcome, EventOutcome::Rejected);
        assert_eq!(table, CarTable::default());
    }

    #[test]
    fn finish_only_tracks_event_kind() {
        let mut table = CarTable::default();
        table.apply_event(&event(4, 3, EventKind::Finish, 400_000)).unwrap();
        let mut expected = CarState::new(4, true);
        expected.last_event_kind = Some(EventKind::Finish);
        expected.last_event_timestamp = 400_000;
        assert_eq!(table.car(4), Some(&expected));
    }

    #[test]
    fn seeding_marks_only_listed_cars_active() {
        let table = CarTable::new_session(&Seeding::Only(vec![0, 4, 19]));
        assert_eq!(table.active_count(), 3);
        assert!(table.car(4).unwrap().active);
        assert!(!table.car(5).unwrap().active);
    }

    // A zero-duration segment leaves the best-time field at the unset sentinel,
    // so the next, slower segment replaces it.
    #[test]
    fn zero_duration_sector_collides_with_unset_sentinel() {
        let mut table = CarTable::default();
        apply_all(
            &mut table,
            &[
                event(9, 0, EventKind::Start, 0),
                event(9, 0, EventKind::Sector1, 0),
                event(9, 0, EventKind::Sector2, 30_000),
                event(9, 0, EventKind::Sector3, 60_000),
                event(9, 1, EventKind::Sector1, 90_000),
            ],
        );
        let car = table.car(9).unwrap();
        assert_eq!(car.best_sector_times[0], 30_000);
    }

    #[test]
    fn out_of_order_timestamps_saturate_to_zero() {
        let mut table = CarTable::default();
        apply_all(
            &mut table,
            &[event(6, 0, EventKind::Sector1, 50_000), event(6, 0, EventKind::Sector2, 40_000)],
        );
        let car = table.car(6).unwrap();
        assert_eq!(car.sector_times[1], 0);
        assert_eq!(car.total_elapsed_time, 50_000);
    }

    proptest! {
        #[test]
        fn elapsed_time_is_sum_of_sector_durations(
            car_id in 0i32..20,
            durations in prop::collection::vec((1u32..60_000, 1u32..60_000, 1u32..60_000), 1..20),
        ) {
            let mut table = CarTable::default();
            table.apply_event(&event(car_id, 0, EventKind::Start, 0)).unwrap();

            let mut timestamp = 0u32;
            let mut expected_total = 0u32;
            for (lap, (s1, s2, s3)) in durations.iter().enumerate() {
                let lap_before = table.car(car_id as usize).unwrap().current_lap;
                for (kind, duration) in [
                    (EventKind::Sector1, s1),
                    (EventKind::Sector2, s2),
                    (EventKind::Sector3, s3),
                ] {
                    timestamp += duration;
                    expected_total += duration;
                    table.apply_event(&event(car_id, lap as i32, kind, timestamp)).unwrap();
                }
                prop_assert_eq!(table.car(car_id as usize).unwrap().current_lap, lap_before + 1);
            }

            let car = table.car(car_id as usize).unwrap();
            prop_assert_eq!(car.total_elapsed_time, expected_total);
            prop_assert_eq!(car.completed_segments as usize, durations.len() * 3);
            let fastest = durations.iter().map(|(a, b, c)| a + b + c).min().unwrap();
            prop_assert_eq!(car.best_lap_time, fastest);
        }
    }
}
