//! Championship orchestration.
//!
//! [`Championship`] is the single writer of the historic store. For every
//! stage it seeds a fresh car table, runs one capture session, and commits
//! and saves the results only when the feed closed normally. Finishing a
//! feature race moves the season to its next round.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{CaptureOptions, SeasonConfig};
use crate::historic::{CompetitionRound, HistoricStore};
use crate::progression::StageProgression;
use crate::session::{CaptureSession, LeaderboardObserver, SessionEnd, SessionOptions};
use crate::standings::{Standings, StandingsOrder};
use crate::timing::CarTable;
use crate::transport::{EventListener, EventSource};
use crate::types::Stage;
use crate::{RaceControlError, Result};

impl From<&CaptureOptions> for SessionOptions {
    fn from(options: &CaptureOptions) -> Self {
        Self { poll_interval: options.poll_interval() }
    }
}

/// What happened to the stage a capture session ran.
#[derive(Debug)]
pub enum StageOutcome {
    /// Results stored; `next` is the round's new next stage
    Committed { round: usize, stage: Stage, next: Stage },
    /// Nothing stored; the stage must be run again
    Abandoned { round: usize, stage: Stage, end: SessionEnd },
}

/// A season in progress.
#[derive(Debug)]
pub struct Championship {
    config: SeasonConfig,
    store: HistoricStore,
}

impl Championship {
    /// Open the season's store at the location named by `config`.
    pub fn open(config: SeasonConfig) -> Result<Self> {
        let store = HistoricStore::open(config.historic_path(), &config)?;
        Ok(Self { config, store })
    }

    /// Use an already opened store.
    pub fn with_store(config: SeasonConfig, store: HistoricStore) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &SeasonConfig {
        &self.config
    }

    pub fn store(&self) -> &HistoricStore {
        &self.store
    }

    pub fn current_round(&self) -> &CompetitionRound {
        self.store.current_round()
    }

    pub fn is_season_complete(&self) -> bool {
        self.store.is_season_complete()
    }

    /// Stage the next capture session will run, `None` once the season is over.
    pub fn next_stage(&self) -> Option<Stage> {
        if self.is_season_complete() {
            return None;
        }
        Some(self.current_round().next_stage).filter(|stage| stage.is_capturable())
    }

    /// Seeded car table for the next stage.
    pub fn prepare_session(&self) -> Result<(Stage, CarTable)> {
        let stage = self
            .next_stage()
            .ok_or_else(|| RaceControlError::contract_violation("season is complete, no stage to run"))?;
        let seeding = StageProgression::seeding(self.current_round())?;
        let table = CarTable::new_session(&seeding);
        info!(
            "Round {} ({}): preparing {} with {} cars",
            self.store.current_index(),
            self.config.round(self.store.current_index())?.name,
            stage,
            table.active_count()
        );
        Ok((stage, table))
    }

    /// Run the next stage from `source` and commit it if the feed closed normally.
    ///
    /// Transport failures and cancellation leave the store untouched and are
    /// reported as [`StageOutcome::Abandoned`].
    pub async fn capture<S, O>(&mut self, source: S, observer: &mut O, cancel: CancellationToken) -> Result<StageOutcome>
    where
        S: EventSource,
        O: LeaderboardObserver + ?Sized,
    {
        let (stage, table) = self.prepare_session()?;
        let round = self.store.current_index();
        let options = SessionOptions::from(&self.config.capture);

        let session = CaptureSession::spawn(stage, source, table, &options, cancel);
        let report = session.run(observer).await?;

        if !report.end.is_complete() {
            warn!("Round {}: {} not committed ({:?})", round, stage, report.end);
            return Ok(StageOutcome::Abandoned { round, stage, end: report.end });
        }

        let next = self.commit(&report.table)?;
        Ok(StageOutcome::Committed { round, stage, next })
    }

    /// Accept the next feed connection on `listener` and capture from it.
    pub async fn capture_from<O>(
        &mut self,
        listener: &EventListener,
        observer: &mut O,
        cancel: CancellationToken,
    ) -> Result<StageOutcome>
    where
        O: LeaderboardObserver + ?Sized,
    {
        let source = tokio::select! {
            source = listener.accept() => source?,
            _ = cancel.cancelled() => {
                let (stage, _) = self.prepare_session()?;
                return Ok(StageOutcome::Abandoned {
                    round: self.store.current_index(),
                    stage,
                    end: SessionEnd::Cancelled,
                });
            }
        };
        self.capture(source, observer, cancel).await
    }

    /// Commit `table` as the results of the next stage, save the round and,
    /// once the round is finished, move to the next one.
    pub fn commit(&mut self, table: &CarTable) -> Result<Stage> {
        let next = StageProgression::commit(self.store.current_round_mut()?, table)?;
        self.store.save()?;

        if next == Stage::Finished {
            let finished = self.store.current_index();
            if self.store.advance_round(&self.config)? {
                info!("Round {} finished, round {} is next", finished, self.store.current_index());
            } else {
                info!("Round {} finished the season", finished);
            }
        }
        Ok(next)
    }

    /// Championship standings over every stored round.
    pub fn standings(&self) -> Standings {
        self.standings_ordered(StandingsOrder::default())
    }

    pub fn standings_ordered(&self, order: StandingsOrder) -> Standings {
        Standings::compute(self.store.rounds(), &self.config.points, order)
    }
}
