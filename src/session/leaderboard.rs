//! Ranked views handed to renderers

use std::sync::Arc;

use crate::ranking::{RankingPolicy, rank};
use crate::timing::{CarState, CarTable};
use crate::types::{CarId, MAX_CARS, Stage};

/// State of the car table published by the ingest worker.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub table: Arc<CarTable>,
    /// Events read from the feed so far, applied or not
    pub events_received: u64,
}

/// A ranked snapshot of a running session.
#[derive(Debug, Clone)]
pub struct Leaderboard {
    pub stage: Stage,
    pub policy: RankingPolicy,
    pub order: [CarId; MAX_CARS],
    pub snapshot: SessionSnapshot,
}

impl Leaderboard {
    /// Rank `snapshot` with the policy of `stage`.
    pub fn rank(stage: Stage, snapshot: SessionSnapshot) -> Self {
        let policy = RankingPolicy::for_stage(stage);
        let order = rank(&snapshot.table, policy);
        Self { stage, policy, order, snapshot }
    }

    /// Cars in ranked order with their 1-based position.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &CarState)> + '_ {
        let cars = self.snapshot.table.cars();
        self.order.iter().enumerate().map(move |(index, &car_id)| (index + 1, &cars[car_id]))
    }

    /// Gap in milliseconds between `car_id` and the car ranked ahead of it.
    ///
    /// Race stages compare elapsed time at equal progress, time-trial stages
    /// compare best laps. `None` for the leader, for cars on different
    /// progress, or when either car has no time.
    pub fn interval_ahead(&self, car_id: CarId) -> Option<u32> {
        let position = self.order.iter().position(|&id| id == car_id)?;
        let ahead = &self.snapshot.table.cars()[*self.order.get(position.checked_sub(1)?)?];
        let car = &self.snapshot.table.cars()[car_id];
        match self.policy {
            RankingPolicy::Race => (car.active
                && ahead.active
                && car.completed_segments == ahead.completed_segments
                && car.completed_segments > 0)
                .then(|| car.total_elapsed_time.saturating_sub(ahead.total_elapsed_time)),
            RankingPolicy::TimeTrial => (car.has_best_lap() && ahead.has_best_lap())
                .then(|| car.best_lap_time.saturating_sub(ahead.best_lap_time)),
        }
    }
}

/// Receives ranked snapshots while a session runs.
pub trait LeaderboardObserver: Send {
    fn render(&mut self, board: &Leaderboard);
}

impl<F> LeaderboardObserver for F
where
    F: FnMut(&Leaderboard) + Send,
{
    fn render(&mut self, board: &Leaderboard) {
        self(board)
    }
}

/// Observer that drops every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRender;

impl LeaderboardObserver for NoRender {
    fn render(&mut self, _board: &Leaderboard) {}
}
