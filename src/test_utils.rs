//! Synthetic seasons, feeds and tables for tests and benchmarks
//!
//! Feeds are generated the way the timing simulator emits them: every
//! participating car runs the same number of laps at its own constant pace,
//! and events are ordered by timestamp, then by car id.

#![cfg(any(test, feature = "benchmark"))]

use crate::Result;
use crate::config::{CaptureOptions, DriverDescriptor, RoundDescriptor, SeasonConfig};
use crate::historic::CompetitionRound;
use crate::progression::StageProgression;
use crate::standings::ChampionshipPoints;
use crate::timing::{CarTable, Seeding};
use crate::types::{CarId, Event, EventKind, MAX_CARS, Stage};

/// Sector time of the fastest car; each following position is 100 ms slower per sector.
pub const BASE_SECTOR_TIME: u32 = 25_000;

/// Season of `rounds` rounds in 2024 with a full roster; `sprint_rounds` lists
/// the sprint weekends by index.
pub fn season_config(rounds: usize, sprint_rounds: &[usize]) -> SeasonConfig {
    SeasonConfig {
        year: 2024,
        rounds: (0..rounds)
            .map(|index| RoundDescriptor {
                name: format!("Round {}", index + 1),
                venue: format!("Circuit {}", index + 1),
                laps: 50 + index as u32,
                sprint_weekend: sprint_rounds.contains(&index),
            })
            .collect(),
        drivers: (0..MAX_CARS)
            .map(|car_id| DriverDescriptor {
                number: car_id as u32 + 1,
                name: format!("Driver {}", car_id + 1),
                team: format!("Team {}", car_id / 2 + 1),
            })
            .collect(),
        points: ChampionshipPoints::default(),
        capture: CaptureOptions::default(),
    }
}

/// Participants of a stage in finishing order: the active cars of `preferred`
/// first, then the remaining active cars by id.
pub fn finishing_order(seeding: &Seeding, preferred: &[CarId]) -> Vec<CarId> {
    let mut order: Vec<CarId> =
        preferred.iter().copied().filter(|&car_id| car_id < MAX_CARS && seeding.is_active(car_id)).collect();
    for car_id in 0..MAX_CARS {
        if seeding.is_active(car_id) && !order.contains(&car_id) {
            order.push(car_id);
        }
    }
    order
}

/// Feed of a whole stage whose result is `preferred` followed by the other
/// participants by id, under either ranking policy.
pub fn stage_events(stage: Stage, seeding: &Seeding, preferred: &[CarId], laps: u32) -> Vec<Event> {
    let mut events = Vec::new();
    for (rank, car_id) in finishing_order(seeding, preferred).into_iter().enumerate() {
        let car = car_id as i32;
        let sector = BASE_SECTOR_TIME + 100 * rank as u32;
        events.push(Event::new(stage, car, 0, EventKind::Start, 0));

        let mut timestamp = 0;
        for lap in 0..laps {
            for kind in [EventKind::Sector1, EventKind::Sector2, EventKind::Sector3] {
                timestamp += sector;
                events.push(Event::new(stage, car, lap as i32, kind, timestamp));
            }
        }
        events.push(Event::new(stage, car, laps as i32, EventKind::Finish, timestamp));
    }

    events.sort_by_key(|event| (event.timestamp_ms, event.car_id));
    events.into_iter().enumerate().map(|(index, event)| event.with_sequence(index as i32 + 1)).collect()
}

/// Encode a feed into its wire form.
pub fn encode_events(events: &[Event]) -> Vec<u8> {
    events.iter().flat_map(|event| event.encode()).collect()
}

/// Table after a stage finished in the given order.
pub fn ordered_table(stage: Stage, seeding: &Seeding, preferred: &[CarId], laps: u32) -> CarTable {
    let mut table = CarTable::new_session(seeding);
    for event in stage_events(stage, seeding, preferred, laps) {
        table.apply_event(&event).expect("synthetic events reference valid cars");
    }
    table
}

/// Table after a two-lap stage, with a finishing order rotated by `seed`.
pub fn synthetic_table(stage: Stage, seeding: &Seeding, seed: u32) -> CarTable {
    let preferred: Vec<CarId> = (0..MAX_CARS).map(|n| (n + seed as usize) % MAX_CARS).collect();
    ordered_table(stage, seeding, &preferred, 2)
}

/// Round with every stage committed; `podium` gives the preferred order of each stage.
pub fn finished_round(
    round_id: usize,
    sprint_weekend: bool,
    podium: impl Fn(Stage) -> Vec<CarId>,
) -> Result<CompetitionRound> {
    let mut round = CompetitionRound::new(round_id, sprint_weekend);
    while !round.is_finished() {
        let stage = round.next_stage;
        let seeding = StageProgression::seeding(&round)?;
        StageProgression::commit(&mut round, &ordered_table(stage, &seeding, &podium(stage), 1))?;
    }
    Ok(round)
}
