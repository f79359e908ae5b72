//! Competition stages and the progression table between them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{RaceControlError, Result};

/// Number of cars carried from the first qualifying segment into the second.
pub const SECOND_SEGMENT_CUTOFF: usize = 15;

/// Number of cars carried from the second qualifying segment into the third.
pub const THIRD_SEGMENT_CUTOFF: usize = 10;

/// One discrete competition session.
///
/// The discriminants are the wire values used both by the timing feed and the
/// historic file. Their numeric order is the order of a sprint weekend, which
/// the standings aggregator relies on when asking whether a round has
/// progressed past a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Stage {
    /// Uninitialized slot or malformed value
    Error = 0,
    Practice1 = 1,
    Practice2 = 2,
    Practice3 = 3,
    SprintQualifying1 = 4,
    SprintQualifying2 = 5,
    SprintQualifying3 = 6,
    Sprint = 7,
    Qualifying1 = 8,
    Qualifying2 = 9,
    Qualifying3 = 10,
    FeatureRace = 11,
    Finished = 12,
}

impl Stage {
    /// Every stage a capture session can run, in wire order.
    pub const CAPTURABLE: [Stage; 11] = [
        Stage::Practice1,
        Stage::Practice2,
        Stage::Practice3,
        Stage::SprintQualifying1,
        Stage::SprintQualifying2,
        Stage::SprintQualifying3,
        Stage::Sprint,
        Stage::Qualifying1,
        Stage::Qualifying2,
        Stage::Qualifying3,
        Stage::FeatureRace,
    ];

    /// Decode a wire value.
    pub fn from_wire(value: i32) -> Option<Stage> {
        let stage = match value {
            0 => Stage::Error,
            1 => Stage::Practice1,
            2 => Stage::Practice2,
            3 => Stage::Practice3,
            4 => Stage::SprintQualifying1,
            5 => Stage::SprintQualifying2,
            6 => Stage::SprintQualifying3,
            7 => Stage::Sprint,
            8 => Stage::Qualifying1,
            9 => Stage::Qualifying2,
            10 => Stage::Qualifying3,
            11 => Stage::FeatureRace,
            12 => Stage::Finished,
            _ => return None,
        };
        Some(stage)
    }

    /// Encode as a wire value.
    pub fn to_wire(self) -> i32 {
        self as i32
    }

    /// Stage that follows this one once its results are committed.
    ///
    /// Returns `None` for [`Stage::Finished`] and [`Stage::Error`].
    pub fn next(self, sprint_weekend: bool) -> Option<Stage> {
        let next = match self {
            Stage::Practice1 if sprint_weekend => Stage::SprintQualifying1,
            Stage::Practice1 => Stage::Practice2,
            Stage::Practice2 => Stage::Practice3,
            Stage::Practice3 => Stage::Qualifying1,
            Stage::SprintQualifying1 => Stage::SprintQualifying2,
            Stage::SprintQualifying2 => Stage::SprintQualifying3,
            Stage::SprintQualifying3 => Stage::Sprint,
            Stage::Sprint => Stage::Qualifying1,
            Stage::Qualifying1 => Stage::Qualifying2,
            Stage::Qualifying2 => Stage::Qualifying3,
            Stage::Qualifying3 => Stage::FeatureRace,
            Stage::FeatureRace => Stage::Finished,
            Stage::Finished | Stage::Error => return None,
        };
        Some(next)
    }

    /// Whether the stage is ranked by progress and elapsed time.
    pub fn is_race(self) -> bool {
        matches!(self, Stage::Sprint | Stage::FeatureRace)
    }

    /// Whether a capture session can run for this stage.
    pub fn is_capturable(self) -> bool {
        !matches!(self, Stage::Error | Stage::Finished)
    }

    /// Qualifying segment whose results decide who may run in this one, and
    /// how many cars carry over.
    pub fn seeded_from(self) -> Option<(Stage, usize)> {
        match self {
            Stage::Qualifying2 => Some((Stage::Qualifying1, SECOND_SEGMENT_CUTOFF)),
            Stage::Qualifying3 => Some((Stage::Qualifying2, THIRD_SEGMENT_CUTOFF)),
            Stage::SprintQualifying2 => Some((Stage::SprintQualifying1, SECOND_SEGMENT_CUTOFF)),
            Stage::SprintQualifying3 => Some((Stage::SprintQualifying2, THIRD_SEGMENT_CUTOFF)),
            _ => None,
        }
    }

    /// Number of cars that took part in the stage and appear in its classification.
    pub fn classified_cars(self) -> usize {
        match self.seeded_from() {
            Some((_, cutoff)) => cutoff,
            None => crate::MAX_CARS,
        }
    }

    /// Short code used in logs and reports.
    pub fn code(self) -> &'static str {
        match self {
            Stage::Error => "ERROR",
            Stage::Practice1 => "P1",
            Stage::Practice2 => "P2",
            Stage::Practice3 => "P3",
            Stage::SprintQualifying1 => "SQ1",
            Stage::SprintQualifying2 => "SQ2",
            Stage::SprintQualifying3 => "SQ3",
            Stage::Sprint => "SPRINT",
            Stage::Qualifying1 => "Q1",
            Stage::Qualifying2 => "Q2",
            Stage::Qualifying3 => "Q3",
            Stage::FeatureRace => "GP",
            Stage::Finished => "FINISHED",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Stage {
    type Err = RaceControlError;

    fn from_str(s: &str) -> Result<Self> {
        (0..=Stage::Finished.to_wire())
            .filter_map(Stage::from_wire)
            .find(|stage| stage.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| RaceControlError::contract_violation(format!("unknown stage '{s}'")))
    }
}
