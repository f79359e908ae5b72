//! Core domain types shared across the crate.
//!
//! - [`Stage`] names each competition session and encodes the progression
//!   table of a race weekend
//! - [`Event`] is one timing event as read from the feed, with its fixed
//!   28-byte wire form
//! - [`CarId`] is a dense index into the car table
//!
//! ```rust
//! use racecontrol::types::{Event, EventKind, Stage};
//!
//! let event = Event::new(Stage::Qualifying1, 7, 2, EventKind::Sector1, 31_250);
//! let decoded = Event::decode(&event.encode()).unwrap();
//! assert_eq!(decoded, event);
//! assert_eq!(Stage::Qualifying1.next(false), Some(Stage::Qualifying2));
//! ```

mod event;
mod stage;

pub use event::{EVENT_SIZE, Event, EventKind};
pub use stage::{SECOND_SEGMENT_CUTOFF, Stage, THIRD_SEGMENT_CUTOFF};

/// Dense car index in `[0, MAX_CARS)`.
pub type CarId = usize;

/// Number of cars on the grid.
pub const MAX_CARS: usize = 20;

/// Maximum number of rounds in a season.
pub const MAX_ROUNDS: usize = 24;
