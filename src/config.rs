//! Season configuration.
//!
//! A season is described by one YAML document: the calendar, the roster of
//! 20 drivers, the points tables and the capture options. Everything except
//! the calendar and the roster has a default.
//!
//! ```rust
//! use racecontrol::SeasonConfig;
//!
//! let yaml = r#"
//! year: 2025
//! rounds:
//!   - { name: Bahrain Grand Prix, venue: Sakhir, laps: 57 }
//!   - { name: Chinese Grand Prix, venue: Shanghai, laps: 56, sprint_weekend: true }
//! drivers:
//! "# .to_string()
//!     + &(1..=20).map(|n| format!("  - {{ number: {n}, name: Driver {n}, team: Team {} }}\n", (n + 1) / 2)).collect::<String>();
//!
//! let config = SeasonConfig::from_yaml_str(&yaml).unwrap();
//! assert!(config.round(1).unwrap().sprint_weekend);
//! assert_eq!(config.capture.listen_address, "127.0.0.1:1111");
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::historic::HistoricStore;
use crate::standings::ChampionshipPoints;
use crate::types::{CarId, MAX_CARS, MAX_ROUNDS};
use crate::{RaceControlError, Result};

/// Whole-season configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonConfig {
    pub year: i32,
    pub rounds: Vec<RoundDescriptor>,
    /// Indexed by car id
    pub drivers: Vec<DriverDescriptor>,
    #[serde(default)]
    pub points: ChampionshipPoints,
    #[serde(default)]
    pub capture: CaptureOptions,
}

/// One round of the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundDescriptor {
    pub name: String,
    pub venue: String,
    /// Feature race distance
    pub laps: u32,
    #[serde(default)]
    pub sprint_weekend: bool,
}

/// One entry of the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverDescriptor {
    pub number: u32,
    pub name: String,
    pub team: String,
}

/// Where events come from and how often leaderboards are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    pub listen_address: String,
    pub poll_interval_ms: u64,
    /// Directory holding the historic store
    pub history_dir: PathBuf,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1:1111".to_string(),
            poll_interval_ms: 1000,
            history_dir: PathBuf::from("."),
        }
    }
}

impl CaptureOptions {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl SeasonConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: SeasonConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        debug!(
            "Loaded season {}: {} rounds, {} drivers",
            config.year,
            config.rounds.len(),
            config.drivers.len()
        );
        Ok(config)
    }

    /// Read, parse and validate the YAML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            RaceControlError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check the calendar and roster.
    pub fn validate(&self) -> Result<()> {
        if self.rounds.is_empty() {
            return Err(RaceControlError::configuration("season has no rounds"));
        }
        if self.rounds.len() > MAX_ROUNDS {
            return Err(RaceControlError::configuration(format!(
                "season has {} rounds, at most {MAX_ROUNDS} are supported",
                self.rounds.len()
            )));
        }
        if self.drivers.len() < MAX_CARS {
            return Err(RaceControlError::configuration(format!(
                "roster lists {} drivers, {MAX_CARS} are required",
                self.drivers.len()
            )));
        }
        if self.capture.poll_interval_ms == 0 {
            return Err(RaceControlError::configuration("poll interval must be positive"));
        }
        Ok(())
    }

    /// Calendar entry of round `index`.
    pub fn round(&self, index: usize) -> Result<&RoundDescriptor> {
        self.rounds.get(index).ok_or_else(|| {
            RaceControlError::configuration(format!(
                "round {index} missing from a {} round calendar",
                self.rounds.len()
            ))
        })
    }

    /// Roster entry of `car_id`.
    pub fn driver(&self, car_id: CarId) -> Option<&DriverDescriptor> {
        self.drivers.get(car_id)
    }

    /// Location of this season's historic store.
    pub fn historic_path(&self) -> PathBuf {
        HistoricStore::season_path(&self.capture.history_dir, self.year)
    }
}
