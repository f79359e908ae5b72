//! Live race timing, stage progression and season standings for a 20-car
//! championship.
//!
//! # Pipeline
//!
//! ```text
//! event feed ──► CarTable ──(session end)──► ranking ──► stage progression ──► historic store
//!                                                                                   │
//!                                                              standings ◄──────────┘
//! ```
//!
//! - [`transport`]: 28-byte event records over TCP or any async byte stream
//! - [`timing`]: per-car state machine fed by events
//! - [`ranking`]: race and time-trial ordering
//! - [`progression`]: seeding and the weekend's transition table
//! - [`historic`]: durable, resumable per-season results file
//! - [`standings`]: championship points
//! - [`session`]: capture sessions with periodic leaderboards
//! - [`Championship`]: ties it together as the single writer of the store
//!
//! # Example
//!
//! ```rust,no_run
//! use racecontrol::{Championship, SeasonConfig};
//! use racecontrol::session::Leaderboard;
//! use racecontrol::transport::EventListener;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> racecontrol::Result<()> {
//!     racecontrol::init_tracing();
//!     let config = SeasonConfig::load("season.yaml")?;
//!     let listener = EventListener::bind(&config.capture.listen_address).await?;
//!     let mut championship = Championship::open(config)?;
//!
//!     let mut render = |board: &Leaderboard| {
//!         for (position, car) in board.rows().take(3) {
//!             println!("P{position} car {} lap {}", car.car_id, car.current_lap);
//!         }
//!     };
//!     while !championship.is_season_complete() {
//!         let outcome = championship.capture_from(&listener, &mut render, CancellationToken::new()).await?;
//!         println!("{outcome:?}");
//!     }
//!     Ok(())
//! }
//! ```

mod championship;
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;
mod wire;

pub mod config;
pub mod historic;
pub mod progression;
pub mod ranking;
pub mod session;
pub mod standings;
pub mod stream;
pub mod timing;
pub mod transport;

pub use championship::{Championship, StageOutcome};
pub use config::SeasonConfig;
pub use error::*;
pub use types::*;

/// Install a `tracing` subscriber writing to stderr, filtered by `RUST_LOG`.
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
