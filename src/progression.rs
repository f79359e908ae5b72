//! Stage progression controller.
//!
//! Decides who takes part in the next stage of a round and turns a finished
//! capture session into a stored [`StageRecord`], advancing the round along
//! the weekend's transition table.

use tracing::info;

use crate::historic::{CompetitionRound, StageRecord};
use crate::ranking::{RankingPolicy, rank};
use crate::timing::{CarTable, Seeding};
use crate::types::Stage;
use crate::{RaceControlError, Result};

/// Stateless rules applied to a [`CompetitionRound`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StageProgression;

impl StageProgression {
    /// Cars that start the round's next stage active.
    ///
    /// The second qualifying segment admits the top 15 of the first, the third
    /// the top 10 of the second; every other stage admits all cars.
    pub fn seeding(round: &CompetitionRound) -> Result<Seeding> {
        let stage = next_capturable(round)?;
        let Some((previous, cutoff)) = stage.seeded_from() else {
            return Ok(Seeding::AllActive);
        };
        let record = round.record(previous).ok_or_else(|| {
            RaceControlError::contract_violation(format!(
                "round {} cannot seed {stage}: no results for {previous}",
                round.round_id
            ))
        })?;
        Ok(Seeding::Only(record.top(cutoff).collect()))
    }

    /// Rank `table`, store the results in the round's next stage slot and
    /// advance the round. Returns the new next stage.
    pub fn commit(round: &mut CompetitionRound, table: &CarTable) -> Result<Stage> {
        let stage = next_capturable(round)?;
        let next = stage.next(round.sprint_weekend).ok_or_else(|| {
            RaceControlError::contract_violation(format!("{stage} has no successor"))
        })?;

        let order = rank(table, RankingPolicy::for_stage(stage));
        round.set_record(StageRecord::from_ranking(stage, table, &order)?)?;
        round.next_stage = next;

        info!("Round {}: committed {} (winner car {}), next {}", round.round_id, stage, order[0], next);
        Ok(next)
    }
}

fn next_capturable(round: &CompetitionRound) -> Result<Stage> {
    let stage = round.next_stage;
    if !stage.is_capturable() {
        return Err(RaceControlError::contract_violation(format!(
            "round {} has no stage to run (next stage {stage})",
            round.round_id
        )));
    }
    Ok(stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ordered_table, stage_events, synthetic_table};
    use crate::types::{MAX_CARS, SECOND_SEGMENT_CUTOFF, THIRD_SEGMENT_CUTOFF};

    fn run_to(round: &mut CompetitionRound, stage: Stage) -> anyhow::Result<()> {
        while round.next_stage != stage {
            let seeding = StageProgression::seeding(round)?;
            let table = synthetic_table(round.next_stage, &seeding, 4);
            StageProgression::commit(round, &table)?;
        }
        Ok(())
    }

    #[test]
    fn qualifying_segments_seed_from_their_predecessor() -> anyhow::Result<()> {
        let _ = tracing_subscriber::fmt::try_init();
        let mut round = CompetitionRound::new(0, false);
        run_to(&mut round, Stage::Qualifying1)?;
        assert_eq!(StageProgression::seeding(&round)?, Seeding::AllActive);

        let q1_order: Vec<usize> = (0..MAX_CARS).rev().collect();
        StageProgression::commit(&mut round, &ordered_table(Stage::Qualifying1, &Seeding::AllActive, &q1_order, 1))?;

        let Seeding::Only(q2_cars) = StageProgression::seeding(&round)? else {
            panic!("second segment must be seeded");
        };
        assert_eq!(q2_cars, q1_order[..SECOND_SEGMENT_CUTOFF]);

        let q2_seeding = Seeding::Only(q2_cars);
        let table = ordered_table(Stage::Qualifying2, &q2_seeding, &[6, 19, 5], 1);
        assert_eq!(table.active_count(), SECOND_SEGMENT_CUTOFF);
        StageProgression::commit(&mut round, &table)?;

        let Seeding::Only(q3_cars) = StageProgression::seeding(&round)? else {
            panic!("third segment must be seeded");
        };
        assert_eq!(q3_cars.len(), THIRD_SEGMENT_CUTOFF);
        assert_eq!(&q3_cars[..3], &[6, 19, 5]);
        assert!(q3_cars.iter().all(|car| q2_seeding.is_active(*car)));
        Ok(())
    }

    #[test]
    fn knocked_out_cars_stay_out_when_few_laps_are_set() -> anyhow::Result<()> {
        let mut round = CompetitionRound::new(0, false);
        run_to(&mut round, Stage::Qualifying1)?;
        let q1_order: Vec<usize> = (0..MAX_CARS).rev().collect();
        StageProgression::commit(&mut round, &ordered_table(Stage::Qualifying1, &Seeding::AllActive, &q1_order, 1))?;

        // Only cars 11-19 set a time in the second segment; 5-10 take part without one.
        let q2_seeding = StageProgression::seeding(&round)?;
        let mut q2 = CarTable::new_session(&q2_seeding);
        for event in stage_events(Stage::Qualifying2, &Seeding::Only((11..MAX_CARS).collect()), &[], 1) {
            q2.apply_event(&event)?;
        }
        StageProgression::commit(&mut round, &q2)?;

        let Seeding::Only(q3_cars) = StageProgression::seeding(&round)? else {
            panic!("third segment must be seeded");
        };
        let mut expected: Vec<usize> = (11..MAX_CARS).collect();
        expected.push(5);
        assert_eq!(q3_cars, expected);

        let q3 = ordered_table(Stage::Qualifying3, &Seeding::Only(q3_cars), &[], 1);
        StageProgression::commit(&mut round, &q3)?;

        let grid = round.starting_grid(Stage::FeatureRace).expect("qualifying complete");
        let mut distinct = grid.clone();
        distinct.sort_unstable();
        distinct.dedup();
        assert_eq!(distinct.len(), MAX_CARS);
        assert_eq!(&grid[10..15], &[6, 7, 8, 9, 10]);
        assert_eq!(&grid[15..], &[4, 3, 2, 1, 0]);
        Ok(())
    }

    #[test]
    fn commit_fills_slot_and_advances() -> anyhow::Result<()> {
        let mut round = CompetitionRound::new(1, true);
        run_to(&mut round, Stage::Sprint)?;
        assert!(round.sprint().is_none());

        let table = ordered_table(Stage::Sprint, &Seeding::AllActive, &[12, 2], 3);
        assert_eq!(StageProgression::commit(&mut round, &table)?, Stage::Qualifying1);

        let sprint = round.sprint().expect("sprint stored");
        assert_eq!(sprint.stage(), Stage::Sprint);
        assert_eq!(sprint.top(2).collect::<Vec<_>>(), vec![12, 2]);
        assert_eq!(round.starting_grid(Stage::Sprint).map(|grid| grid.len()), Some(MAX_CARS));
        Ok(())
    }

    #[test]
    fn finished_round_rejects_commit() -> anyhow::Result<()> {
        let mut round = CompetitionRound::new(0, false);
        run_to(&mut round, Stage::Finished)?;
        assert!(round.feature_race().is_some());

        let error = StageProgression::commit(&mut round, &CarTable::default()).unwrap_err();
        assert!(error.is_fatal());
        assert!(StageProgression::seeding(&round).is_err());
        Ok(())
    }

    #[test]
    fn missing_predecessor_is_a_contract_violation() {
        let mut round = CompetitionRound::new(0, false);
        round.next_stage = Stage::Qualifying3;
        let error = StageProgression::seeding(&round).unwrap_err();
        assert!(matches!(error, RaceControlError::ContractViolation { .. }));
    }

    #[test]
    fn weekend_commit_counts() -> anyhow::Result<()> {
        for (sprint_weekend, expected) in [(false, 7), (true, 9)] {
            let mut round = CompetitionRound::new(0, sprint_weekend);
            let mut commits = 0;
            while !round.is_finished() {
                let seeding = StageProgression::seeding(&round)?;
                let table = synthetic_table(round.next_stage, &seeding, commits);
                StageProgression::commit(&mut round, &table)?;
                commits += 1;
            }
            assert_eq!(commits, expected);
            let stored = round.slots().iter().filter(|slot| slot.is_some()).count();
            assert_eq!(stored as u32, expected);
        }
        Ok(())
    }
}
