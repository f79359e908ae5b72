//! Ranking engine.
//!
//! Orders car ids under one of two policies. Both end on the car id so the
//! comparison is a strict total order and the unstable sort is deterministic.
//! Cars not admitted to the session rank after every admitted car, by car id,
//! so a seeded segment's record lists its participants first.
//!
//! - [`RankingPolicy::Race`]: active before inactive; more completed segments
//!   first; then less elapsed time; then car id. Inactive cars by car id.
//! - [`RankingPolicy::TimeTrial`]: cars with a best lap before cars without;
//!   faster best lap first; then car id.

use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};

use crate::timing::{CarState, CarTable};
use crate::types::{CarId, MAX_CARS, Stage};

/// Comparison policy used to rank a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankingPolicy {
    /// Progress then elapsed time (sprint and feature race)
    Race,
    /// Best single lap (practice and qualifying)
    TimeTrial,
}

impl RankingPolicy {
    /// Policy that ranks `stage`.
    pub fn for_stage(stage: Stage) -> Self {
        if stage.is_race() { RankingPolicy::Race } else { RankingPolicy::TimeTrial }
    }

    /// Compare two cars; `Less` means `a` ranks ahead of `b`.
    pub fn compare(self, a: &CarState, b: &CarState) -> Ordering {
        match self {
            RankingPolicy::Race => race_key(a).cmp(&race_key(b)),
            RankingPolicy::TimeTrial => time_trial_key(a).cmp(&time_trial_key(b)),
        }
    }
}

fn race_key(car: &CarState) -> (bool, bool, Reverse<u32>, u32, CarId) {
    if car.active {
        (false, false, Reverse(car.completed_segments), car.total_elapsed_time, car.car_id)
    } else {
        (!car.seeded, true, Reverse(0), 0, car.car_id)
    }
}

fn time_trial_key(car: &CarState) -> (bool, bool, u32, CarId) {
    if car.seeded {
        (false, !car.has_best_lap(), car.best_lap_time, car.car_id)
    } else {
        (true, true, 0, car.car_id)
    }
}

/// Rank every car of the table; the result is a permutation of all car ids.
pub fn rank(table: &CarTable, policy: RankingPolicy) -> [CarId; MAX_CARS] {
    let cars = table.cars();
    let mut order: [CarId; MAX_CARS] = std::array::from_fn(|car_id| car_id);
    order.sort_unstable_by(|&a, &b| policy.compare(&cars[a], &cars[b]));
    order
}
