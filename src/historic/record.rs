//! Stage results and competition rounds

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::timing::{CarState, CarTable};
use crate::types::{CarId, MAX_CARS, Stage};
use crate::{RaceControlError, Result};

/// Number of result slots in a round, one per capturable stage.
pub const STAGE_SLOTS: usize = Stage::CAPTURABLE.len();

/// Stage-kind specific part of a classification entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryTiming {
    /// Practice and qualifying: only the time spent on track
    TimeTrial { elapsed: u32 },
    /// Sprint and feature race: race time and pit statistics
    Race { total_time: u32, pit_stops: u32, pit_time: u32 },
}

/// One car's line in a stage classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEntry {
    pub car_id: CarId,
    pub best_lap_time: u32,
    pub best_lap_index: u32,
    pub best_sectors: [u32; 3],
    pub timing: EntryTiming,
}

impl StageEntry {
    /// Build the entry for `car` in a stage of the given kind.
    pub fn from_car(car: &CarState, stage: Stage) -> Self {
        let timing = if stage.is_race() {
            EntryTiming::Race {
                total_time: car.total_elapsed_time,
                pit_stops: car.pit_stop_count,
                pit_time: car.total_pit_time,
            }
        } else {
            EntryTiming::TimeTrial { elapsed: car.total_elapsed_time }
        };

        Self {
            car_id: car.car_id,
            best_lap_time: car.best_lap_time,
            best_lap_index: car.best_lap_index,
            best_sectors: car.best_sector_times,
            timing,
        }
    }

    /// Total time on track.
    pub fn total_time(&self) -> u32 {
        match self.timing {
            EntryTiming::TimeTrial { elapsed } => elapsed,
            EntryTiming::Race { total_time, .. } => total_time,
        }
    }
}

/// Ranked classification of one stage. Every car appears exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    stage: Stage,
    entries: Vec<StageEntry>,
}

impl StageRecord {
    /// Create a record, checking it classifies every car exactly once.
    pub fn new(stage: Stage, entries: Vec<StageEntry>) -> Result<Self> {
        if !stage.is_capturable() {
            return Err(RaceControlError::contract_violation(format!(
                "stage {stage} cannot hold results"
            )));
        }
        if entries.len() != MAX_CARS {
            return Err(RaceControlError::contract_violation(format!(
                "{stage} classification has {} entries, expected {MAX_CARS}",
                entries.len()
            )));
        }
        let mut seen = HashSet::with_capacity(MAX_CARS);
        for entry in &entries {
            if entry.car_id >= MAX_CARS || !seen.insert(entry.car_id) {
                return Err(RaceControlError::contract_violation(format!(
                    "{stage} classification lists car {} twice or out of range",
                    entry.car_id
                )));
            }
        }
        Ok(Self { stage, entries })
    }

    /// Build the record for `stage` from a table and its ranking.
    pub fn from_ranking(stage: Stage, table: &CarTable, order: &[CarId; MAX_CARS]) -> Result<Self> {
        let cars = table.cars();
        let entries = order.iter().map(|&car_id| StageEntry::from_car(&cars[car_id], stage)).collect();
        Self::new(stage, entries)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Entries in finishing order.
    pub fn entries(&self) -> &[StageEntry] {
        &self.entries
    }

    /// Entries for the cars that took part in the stage.
    pub fn classified(&self) -> &[StageEntry] {
        &self.entries[..self.stage.classified_cars()]
    }

    /// Car ids of the first `count` positions.
    pub fn top(&self, count: usize) -> impl Iterator<Item = CarId> + '_ {
        self.entries.iter().take(count).map(|entry| entry.car_id)
    }

    /// 0-based finishing position of `car_id`.
    pub fn position_of(&self, car_id: CarId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.car_id == car_id)
    }
}

/// One competition round and the results of every stage run so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionRound {
    pub round_id: usize,
    pub sprint_weekend: bool,
    /// Only moves forward; [`Stage::Finished`] once the feature race is committed
    pub next_stage: Stage,
    slots: [Option<StageRecord>; STAGE_SLOTS],
}

impl CompetitionRound {
    /// Fresh round waiting for its first practice.
    pub fn new(round_id: usize, sprint_weekend: bool) -> Self {
        Self { round_id, sprint_weekend, next_stage: Stage::Practice1, slots: Default::default() }
    }

    pub(crate) fn from_parts(
        round_id: usize,
        sprint_weekend: bool,
        next_stage: Stage,
        slots: [Option<StageRecord>; STAGE_SLOTS],
    ) -> Self {
        Self { round_id, sprint_weekend, next_stage, slots }
    }

    pub fn is_finished(&self) -> bool {
        self.next_stage == Stage::Finished
    }

    /// Whether the results of `stage` are final for this round.
    pub fn has_progressed_past(&self, stage: Stage) -> bool {
        self.next_stage > stage
    }

    /// Stored results for `stage`.
    pub fn record(&self, stage: Stage) -> Option<&StageRecord> {
        slot_index(stage).and_then(|index| self.slots[index].as_ref())
    }

    /// Slots in storage order, filled or not.
    pub fn slots(&self) -> &[Option<StageRecord>; STAGE_SLOTS] {
        &self.slots
    }

    /// Practice session `number` (1-3).
    pub fn practice(&self, number: usize) -> Option<&StageRecord> {
        self.numbered(Stage::Practice1, number)
    }

    /// Sprint qualifying segment `number` (1-3).
    pub fn sprint_qualifying(&self, number: usize) -> Option<&StageRecord> {
        self.numbered(Stage::SprintQualifying1, number)
    }

    pub fn sprint(&self) -> Option<&StageRecord> {
        self.record(Stage::Sprint)
    }

    /// Qualifying segment `number` (1-3).
    pub fn qualifying(&self, number: usize) -> Option<&StageRecord> {
        self.numbered(Stage::Qualifying1, number)
    }

    pub fn feature_race(&self) -> Option<&StageRecord> {
        self.record(Stage::FeatureRace)
    }

    fn numbered(&self, first: Stage, number: usize) -> Option<&StageRecord> {
        if !(1..=3).contains(&number) {
            return None;
        }
        Stage::from_wire(first.to_wire() + number as i32 - 1).and_then(|stage| self.record(stage))
    }

    /// Starting grid of `race` (sprint or feature race).
    ///
    /// Positions 1-10 come from the third qualifying segment, 11-15 from the
    /// second and 16-20 from the first. `None` until the third segment has run.
    pub fn starting_grid(&self, race: Stage) -> Option<Vec<CarId>> {
        let (first, second, third) = match race {
            Stage::Sprint => {
                (Stage::SprintQualifying1, Stage::SprintQualifying2, Stage::SprintQualifying3)
            }
            Stage::FeatureRace => (Stage::Qualifying1, Stage::Qualifying2, Stage::Qualifying3),
            _ => return None,
        };
        let third = self.record(third)?;
        let second = self.record(second)?;
        let first = self.record(first)?;

        let third_cut = third.stage().classified_cars();
        let second_cut = second.stage().classified_cars();
        let grid = third.entries()[..third_cut]
            .iter()
            .chain(&second.entries()[third_cut..second_cut])
            .chain(&first.entries()[second_cut..])
            .map(|entry| entry.car_id)
            .collect();
        Some(grid)
    }

    /// Store the results of `record.stage()`.
    pub(crate) fn set_record(&mut self, record: StageRecord) -> Result<()> {
        let index = slot_index(record.stage()).ok_or_else(|| {
            RaceControlError::contract_violation(format!("no slot for stage {}", record.stage()))
        })?;
        self.slots[index] = Some(record);
        Ok(())
    }
}

/// Storage slot of `stage`, following wire order.
pub(crate) fn slot_index(stage: Stage) -> Option<usize> {
    Stage::CAPTURABLE.iter().position(|&slot| slot == stage)
}
