//! Capture sessions.
//!
//! A capture session runs one stage. [`CaptureSession::spawn`] starts an
//! ingest worker task that owns the event source and the authoritative
//! [`CarTable`]; after every event it publishes a copy of the table on a
//! `watch` channel. [`CaptureSession::run`] polls the latest snapshot on a
//! fixed interval, ranks it and hands the result to a
//! [`LeaderboardObserver`], then renders a final frame and returns the
//! table once the worker has stopped.
//!
//! ```rust
//! use racecontrol::session::{CaptureSession, SessionEnd, SessionOptions};
//! use racecontrol::timing::CarTable;
//! use racecontrol::transport::StreamEventSource;
//! use racecontrol::types::{Event, EventKind, Stage};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> racecontrol::Result<()> {
//! let feed: Vec<u8> = Event::new(Stage::Practice1, 3, 0, EventKind::Sector1, 30_000).encode().to_vec();
//! let session = CaptureSession::spawn(
//!     Stage::Practice1,
//!     StreamEventSource::new(std::io::Cursor::new(feed)),
//!     CarTable::default(),
//!     &SessionOptions::default(),
//!     CancellationToken::new(),
//! );
//!
//! let report = session.run(&mut racecontrol::session::NoRender).await?;
//! assert!(matches!(report.end, SessionEnd::Closed));
//! assert_eq!(report.table.cars()[3].sector_times[0], 30_000);
//! # Ok(())
//! # }
//! ```

mod leaderboard;

pub use leaderboard::{Leaderboard, LeaderboardObserver, NoRender, SessionSnapshot};

use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::stream::SampleExt;
use crate::timing::CarTable;
use crate::transport::EventSource;
use crate::types::Stage;
use crate::{RaceControlError, Result};

/// How a capture session is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Period between two leaderboard renders
    pub poll_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { poll_interval: Duration::from_secs(1) }
    }
}

/// Why the ingest worker stopped.
#[derive(Debug)]
pub enum SessionEnd {
    /// The feed closed; the stage can be committed
    Closed,
    /// The feed failed; the stage must not be committed
    TransportFailed(RaceControlError),
    /// The session was cancelled; the stage must not be committed
    Cancelled,
}

impl SessionEnd {
    /// Whether the captured table may be committed.
    pub fn is_complete(&self) -> bool {
        matches!(self, SessionEnd::Closed)
    }
}

/// Outcome of a finished capture session.
#[derive(Debug)]
pub struct SessionReport {
    pub stage: Stage,
    pub end: SessionEnd,
    pub events_received: u64,
    pub table: CarTable,
}

struct WorkerExit {
    end: SessionEnd,
    events_received: u64,
    table: CarTable,
}

/// One running capture session.
pub struct CaptureSession {
    stage: Stage,
    snapshots: watch::Receiver<SessionSnapshot>,
    worker: JoinHandle<Result<WorkerExit>>,
    cancel: CancellationToken,
    poll_interval: Duration,
}

impl CaptureSession {
    /// Start ingesting events from `source` into `table`.
    ///
    /// `table` should come from [`CarTable::new_session`] with the stage's
    /// seeding. Cancelling `cancel` stops the worker at its next read.
    pub fn spawn<S>(
        stage: Stage,
        source: S,
        table: CarTable,
        options: &SessionOptions,
        cancel: CancellationToken,
    ) -> Self
    where
        S: EventSource,
    {
        let initial = SessionSnapshot { table: Arc::new(table.clone()), events_received: 0 };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let worker = tokio::spawn(ingest(stage, source, table, snapshot_tx, cancel.clone()));
        info!("Capture session for {} started", stage);

        Self { stage, snapshots: snapshot_rx, worker, cancel, poll_interval: options.poll_interval }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Token that cancels this session.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Snapshots sampled once per poll interval, latest wins.
    ///
    /// The stream ends when the worker stops; the final snapshot is always
    /// delivered.
    pub fn snapshots(&self) -> impl Stream<Item = SessionSnapshot> + Send + 'static {
        WatchStream::new(self.snapshots.clone()).sample(self.poll_interval)
    }

    /// Render leaderboards until the worker stops, then return its report.
    ///
    /// Transport failures and cancellation are reported in
    /// [`SessionReport::end`]; contract violations are returned as errors.
    pub async fn run<O>(self, observer: &mut O) -> Result<SessionReport>
    where
        O: LeaderboardObserver + ?Sized,
    {
        let Self { stage, snapshots, mut worker, poll_interval, .. } = self;
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately; the first render is one period in
        ticker.tick().await;

        let mut frames = 0u64;
        let joined = loop {
            tokio::select! {
                joined = &mut worker => break joined,
                _ = ticker.tick() => {
                    let board = Leaderboard::rank(stage, snapshots.borrow().clone());
                    trace!("Rendering frame {} ({} events)", frames, board.snapshot.events_received);
                    observer.render(&board);
                    frames += 1;
                }
            }
        };

        let exit = joined.map_err(|e| {
            RaceControlError::contract_violation(format!("ingest worker for {stage} did not complete: {e}"))
        })??;

        let final_snapshot = SessionSnapshot { table: Arc::new(exit.table.clone()), events_received: exit.events_received };
        observer.render(&Leaderboard::rank(stage, final_snapshot));
        debug!("Capture session for {} rendered {} frames", stage, frames + 1);

        Ok(SessionReport { stage, end: exit.end, events_received: exit.events_received, table: exit.table })
    }
}

/// Ingest worker: owns the source and the table until the session ends.
async fn ingest<S>(
    stage: Stage,
    mut source: S,
    mut table: CarTable,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    cancel: CancellationToken,
) -> Result<WorkerExit>
where
    S: EventSource,
{
    let mut events_received = 0u64;

    let end = loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Capture session for {} cancelled after {} events", stage, events_received);
                break SessionEnd::Cancelled;
            }
            next = source.next_event() => next,
        };

        match next {
            Ok(Some(event)) => {
                events_received += 1;
                if event.stage != stage {
                    debug!("Event {} tagged {} while capturing {}", event.sequence_id, event.stage, stage);
                }
                if let Err(e) = table.apply_event(&event) {
                    error!("Capture session for {} aborted: {}", stage, e);
                    return Err(e);
                }
                snapshot_tx.send_replace(SessionSnapshot { table: Arc::new(table.clone()), events_received });
            }
            Ok(None) => {
                info!("Capture session for {} closed after {} events", stage, events_received);
                break SessionEnd::Closed;
            }
            Err(e) if e.is_session_scoped() => {
                error!("Capture session for {} lost its feed: {}", stage, e);
                break SessionEnd::TransportFailed(e);
            }
            Err(e) => {
                error!("Capture session for {} aborted: {}", stage, e);
                return Err(e);
            }
        }
    };

    Ok(WorkerExit { end, events_received, table })
}
