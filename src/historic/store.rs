use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::format::{RECORD_SIZE, decode_round, encode_round};
use super::record::CompetitionRound;
use crate::config::SeasonConfig;
use crate::types::MAX_ROUNDS;
use crate::{RaceControlError, Result};

/// Durable per-season file of round records.
///
/// Opening the store loads every complete record and positions the season at
/// the first round that is not finished, so a restarted process resumes
/// exactly where the last run stopped. [`HistoricStore::save`] rewrites only
/// the record of the current round.
#[derive(Debug)]
pub struct HistoricStore {
    file: File,
    path: PathBuf,
    rounds: Vec<CompetitionRound>,
    current: usize,
    season_length: usize,
}

impl HistoricStore {
    /// File name of the store for `year` inside `dir`.
    pub fn season_path(dir: impl AsRef<Path>, year: i32) -> PathBuf {
        dir.as_ref().join(format!("season-{year}.bin"))
    }

    /// Open or create the store at `path` for the season described by `config`.
    pub fn open(path: impl AsRef<Path>, config: &SeasonConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| RaceControlError::persistence(path.clone(), "opening store", e))?;

        let season_length = config.rounds.len().min(MAX_ROUNDS);
        let mut rounds = Vec::with_capacity(season_length);
        let mut buffer = vec![0u8; RECORD_SIZE];

        while rounds.len() < season_length {
            let index = rounds.len();
            let filled = read_record(&mut file, &mut buffer)
                .map_err(|e| RaceControlError::persistence(path.clone(), format!("reading round {index}"), e))?;
            if filled == 0 {
                break;
            }
            if filled < RECORD_SIZE {
                return Err(RaceControlError::corrupt_record(
                    path,
                    format!("round {index} is a partial record ({filled} of {RECORD_SIZE} bytes)"),
                ));
            }

            let round = decode_round(&buffer, index).map_err(|e| {
                RaceControlError::corrupt_record(path.clone(), format!("round {index}: {e}"))
            })?;
            let expected = config.round(index)?.sprint_weekend;
            if round.sprint_weekend != expected {
                warn!(
                    "Round {} stored with sprint flag {}, configuration says {}; keeping stored value",
                    index, round.sprint_weekend, expected
                );
            }
            debug!("Loaded round {} (next stage {})", index, round.next_stage);

            let finished = round.is_finished();
            rounds.push(round);
            if !finished {
                break;
            }
        }

        let current = match rounds.last() {
            Some(round) if round.is_finished() => rounds.len(),
            Some(_) => rounds.len() - 1,
            None => 0,
        };
        if current == rounds.len() && current < season_length {
            rounds.push(CompetitionRound::new(current, config.round(current)?.sprint_weekend));
        }

        let store = Self { file, path, rounds, current, season_length };
        if store.is_season_complete() {
            info!("Opened {}: season complete after {} rounds", store.path.display(), store.season_length);
        } else {
            info!(
                "Opened {}: resuming round {} at {}",
                store.path.display(),
                store.current,
                store.current_round().next_stage
            );
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every round loaded or started so far, in season order.
    pub fn rounds(&self) -> &[CompetitionRound] {
        &self.rounds
    }

    /// Index of the round in progress; equals the season length once complete.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Round in progress. After the season ends this is the final round.
    pub fn current_round(&self) -> &CompetitionRound {
        let index = self.current.min(self.rounds.len().saturating_sub(1));
        &self.rounds[index]
    }

    pub(crate) fn current_round_mut(&mut self) -> Result<&mut CompetitionRound> {
        if self.is_season_complete() {
            return Err(RaceControlError::contract_violation("season is complete, no round in progress"));
        }
        Ok(&mut self.rounds[self.current])
    }

    pub fn is_season_complete(&self) -> bool {
        self.current >= self.season_length
    }

    /// Write the current round at its slot and flush it to disk.
    pub fn save(&mut self) -> Result<()> {
        let index = self.current.min(self.rounds.len().saturating_sub(1));
        let Some(round) = self.rounds.get(index) else {
            return Ok(());
        };
        let data = encode_round(round);
        let offset = (index * RECORD_SIZE) as u64;

        let write = |file: &mut File| -> io::Result<()> {
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(&data)?;
            file.sync_data()
        };
        write(&mut self.file)
            .map_err(|e| RaceControlError::persistence(self.path.clone(), format!("writing round {index}"), e))?;

        debug!("Saved round {} ({} bytes at offset {})", index, data.len(), offset);
        Ok(())
    }

    /// Move to the next round once the current one is finished.
    ///
    /// Returns `false` when the season is complete. A fresh record is created in
    /// memory; it reaches the disk with the next [`HistoricStore::save`].
    pub fn advance_round(&mut self, config: &SeasonConfig) -> Result<bool> {
        if self.is_season_complete() {
            return Ok(false);
        }
        if !self.rounds[self.current].is_finished() {
            return Err(RaceControlError::contract_violation(format!(
                "round {} cannot be left at {}",
                self.current, self.rounds[self.current].next_stage
            )));
        }

        self.current += 1;
        if self.is_season_complete() {
            info!("Season complete after {} rounds", self.season_length);
            return Ok(false);
        }
        let sprint_weekend = config.round(self.current)?.sprint_weekend;
        self.rounds.push(CompetitionRound::new(self.current, sprint_weekend));
        info!("Advanced to round {}", self.current);
        Ok(true)
    }
}

/// Fill `buffer` from `file`, returning the number of bytes read before end of file.
fn read_record(file: &mut File, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match file.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
