//! Season standings derived from the historic store.
//!
//! Standings are never persisted. [`Standings::compute`] walks the stored
//! rounds and awards points for every sprint and feature race that has been
//! committed, so calling it twice on the same rounds gives the same result.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::historic::CompetitionRound;
use crate::types::{CarId, MAX_CARS, Stage};

/// Points awarded by finishing position; positions past the end score nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointsTable(Vec<u32>);

impl PointsTable {
    pub fn new(points: Vec<u32>) -> Self {
        Self(points)
    }

    /// 8 points for the winner down to 1 for eighth.
    pub fn sprint() -> Self {
        Self(vec![8, 7, 6, 5, 4, 3, 2, 1])
    }

    /// 25 points for the winner down to 1 for tenth.
    pub fn feature_race() -> Self {
        Self(vec![25, 18, 15, 12, 10, 8, 6, 4, 2, 1])
    }

    /// Points for the 0-based finishing `position`.
    pub fn points_for(&self, position: usize) -> u32 {
        self.0.get(position).copied().unwrap_or(0)
    }

    pub fn scoring_positions(&self) -> usize {
        self.0.len()
    }
}

/// Points tables of both race kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChampionshipPoints {
    pub sprint: PointsTable,
    pub feature_race: PointsTable,
}

impl Default for ChampionshipPoints {
    fn default() -> Self {
        Self { sprint: PointsTable::sprint(), feature_race: PointsTable::feature_race() }
    }
}

/// Ordering of the standings table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StandingsOrder {
    /// Most points first, ties by car id
    #[default]
    PointsDescending,
    /// Fewest points first, ties by car id
    PointsAscending,
}

/// One line of the standings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsEntry {
    pub car_id: CarId,
    pub points: u32,
}

/// Championship table over every car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standings {
    entries: Vec<StandingsEntry>,
}

impl Standings {
    /// Aggregate points over `rounds`.
    pub fn compute(rounds: &[CompetitionRound], points: &ChampionshipPoints, order: StandingsOrder) -> Self {
        let mut totals = [0u32; MAX_CARS];

        for round in rounds {
            if round.sprint_weekend && round.has_progressed_past(Stage::Sprint) {
                award(&mut totals, round, Stage::Sprint, &points.sprint);
            }
            if round.has_progressed_past(Stage::FeatureRace) {
                award(&mut totals, round, Stage::FeatureRace, &points.feature_race);
            }
        }

        let mut entries: Vec<StandingsEntry> =
            totals.iter().enumerate().map(|(car_id, &points)| StandingsEntry { car_id, points }).collect();
        match order {
            StandingsOrder::PointsDescending => {
                entries.sort_by(|a, b| b.points.cmp(&a.points).then(a.car_id.cmp(&b.car_id)))
            }
            StandingsOrder::PointsAscending => {
                entries.sort_by(|a, b| a.points.cmp(&b.points).then(a.car_id.cmp(&b.car_id)))
            }
        }

        Self { entries }
    }

    /// Entries in table order.
    pub fn entries(&self) -> &[StandingsEntry] {
        &self.entries
    }

    pub fn points_of(&self, car_id: CarId) -> Option<u32> {
        self.entries.iter().find(|entry| entry.car_id == car_id).map(|entry| entry.points)
    }

    /// First entry of the table.
    pub fn leader(&self) -> Option<&StandingsEntry> {
        self.entries.first()
    }
}

fn award(totals: &mut [u32; MAX_CARS], round: &CompetitionRound, stage: Stage, table: &PointsTable) {
    let Some(record) = round.record(stage) else {
        warn!("Round {} has progressed past {} without its results", round.round_id, stage);
        return;
    };
    for (position, entry) in record.entries().iter().enumerate().take(table.scoring_positions()) {
        totals[entry.car_id] += table.points_for(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::StageProgression;
    use crate::test_utils::{finished_round, synthetic_table};
    use proptest::prelude::*;

    #[test]
    fn sprint_and_feature_race_points_add_up() -> anyhow::Result<()> {
        // car 3 wins the sprint, is second in the feature race
        let round = finished_round(0, true, |stage| match stage {
            Stage::Sprint => vec![3, 0, 1],
            Stage::FeatureRace => vec![0, 3, 1],
            _ => vec![],
        })?;
        let standings = Standings::compute(&[round], &ChampionshipPoints::default(), StandingsOrder::default());

        assert_eq!(standings.points_of(3), Some(8 + 18));
        assert_eq!(standings.points_of(0), Some(7 + 25));
        assert_eq!(standings.leader().map(|entry| entry.car_id), Some(0));
        Ok(())
    }

    #[test]
    fn feature_race_wins_across_two_rounds() -> anyhow::Result<()> {
        let winner_then_second = |first: CarId, second: CarId| {
            move |stage: Stage| if stage == Stage::FeatureRace { vec![first, second] } else { vec![] }
        };
        let rounds = [
            finished_round(0, false, winner_then_second(3, 7))?,
            finished_round(1, false, winner_then_second(7, 3))?,
        ];
        let standings = Standings::compute(&rounds, &ChampionshipPoints::default(), StandingsOrder::default());

        assert_eq!(standings.points_of(3), Some(43));
        assert_eq!(standings.points_of(7), Some(43));
        // tie broken by car id
        assert_eq!(&standings.entries()[..2], &[
            StandingsEntry { car_id: 3, points: 43 },
            StandingsEntry { car_id: 7, points: 43 },
        ]);
        Ok(())
    }

    #[test]
    fn win_and_second_outscore_third_and_win() -> anyhow::Result<()> {
        let feature_race = |order: Vec<CarId>| move |stage: Stage| {
            if stage == Stage::FeatureRace { order.clone() } else { vec![] }
        };
        let rounds = [
            finished_round(0, false, feature_race(vec![3, 1, 7]))?,
            finished_round(1, false, feature_race(vec![7, 3]))?,
        ];
        let standings = Standings::compute(&rounds, &ChampionshipPoints::default(), StandingsOrder::default());

        assert_eq!(&standings.entries()[..2], &[
            StandingsEntry { car_id: 3, points: 25 + 18 },
            StandingsEntry { car_id: 7, points: 15 + 25 },
        ]);
        assert_eq!(standings.leader().map(|entry| entry.car_id), Some(3));
        Ok(())
    }

    #[test]
    fn unfinished_races_score_nothing() -> anyhow::Result<()> {
        let mut round = crate::historic::CompetitionRound::new(0, true);
        while round.next_stage != Stage::Sprint {
            let seeding = StageProgression::seeding(&round)?;
            let table = synthetic_table(round.next_stage, &seeding, 0);
            StageProgression::commit(&mut round, &table)?;
        }
        let standings = Standings::compute(&[round], &ChampionshipPoints::default(), StandingsOrder::default());
        assert!(standings.entries().iter().all(|entry| entry.points == 0));
        Ok(())
    }

    #[test]
    fn sprint_results_ignored_on_standard_weekend() -> anyhow::Result<()> {
        let round = finished_round(0, false, |_| vec![5])?;
        assert!(round.sprint().is_none());
        let standings = Standings::compute(&[round], &ChampionshipPoints::default(), StandingsOrder::default());
        assert_eq!(standings.points_of(5), Some(25));
        Ok(())
    }

    #[test]
    fn ascending_order_is_available() -> anyhow::Result<()> {
        let round = finished_round(0, false, |_| vec![9, 4])?;
        let standings =
            Standings::compute(&[round], &ChampionshipPoints::default(), StandingsOrder::PointsAscending);
        assert_eq!(standings.entries().last(), Some(&StandingsEntry { car_id: 9, points: 25 }));
        assert_eq!(standings.entries()[0].points, 0);
        Ok(())
    }

    #[test]
    fn points_table_scores_zero_past_its_end() {
        let table = PointsTable::new(vec![3, 1]);
        assert_eq!(table.points_for(1), 1);
        assert_eq!(table.points_for(2), 0);
        assert_eq!(PointsTable::new(vec![]).points_for(0), 0);
    }

    proptest! {
        #[test]
        fn compute_is_idempotent_and_conserves_points(
            winners in prop::collection::vec((0..MAX_CARS, any::<bool>()), 1..5),
        ) {
            let rounds: Vec<_> = winners
                .iter()
                .enumerate()
                .map(|(index, &(winner, sprint))| finished_round(index, sprint, |_| vec![winner]).unwrap())
                .collect();
            let points = ChampionshipPoints::default();

            let first = Standings::compute(&rounds, &points, StandingsOrder::default());
            let second = Standings::compute(&rounds, &points, StandingsOrder::default());
            prop_assert_eq!(&first, &second);

            let sprint_total: u32 = (0..MAX_CARS).map(|p| points.sprint.points_for(p)).sum();
            let race_total: u32 = (0..MAX_CARS).map(|p| points.feature_race.points_for(p)).sum();
            let sprints = winners.iter().filter(|(_, sprint)| *sprint).count() as u32;
            let expected = race_total * rounds.len() as u32 + sprint_total * sprints;
            prop_assert_eq!(first.entries().iter().map(|entry| entry.points).sum::<u32>(), expected);
        }
    }
}
