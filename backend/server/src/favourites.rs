//! # Favourites
//!
//! File-backed favourite logs under the configured data directory.
//!
//! ## Files
//! - `fav_events.jsonl`: append-only audit trail, one toggle per line. Never rewritten.
//! - `fav_state.json`: last known state per `(sid, species)`. Rewritten on every accepted toggle,
//!   used for the idempotence and cooldown checks.
//! - `weekly_winners.jsonl`: append-only, at most one line per week start.
//!
//! A missing file reads as an empty table. A line that does not parse is skipped with a warning, a
//! torn append must not take the scorer down.
//!
//! ## Toggle Rules
//! - Same state as the last recorded one: no-op, reported as idempotent
//! - A flip within the cooldown of the last recorded change for the same pair: rejected
//! - Otherwise: append the event, upsert the state row
//!
//! Writes are serialized inside this process only. Another process appending to the same files can
//! still interleave with us.
use std::{
    collections::HashMap,
    fs::{self, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::error::AppError;

pub const FAV_EVENTS: &str = "fav_events.jsonl";
pub const FAV_STATE: &str = "fav_state.json";
pub const WINNERS: &str = "weekly_winners.jsonl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavEvent {
    pub ts_utc: DateTime<Utc>,
    pub sid: String,
    pub species: String,
    pub state: u8,
}

impl FavEvent {
    pub fn favourited(&self) -> bool {
        self.state == 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavState {
    pub sid: String,
    pub species: String,
    pub last_state: u8,
    pub last_ts_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyWinner {
    pub week_start_utc: DateTime<Utc>,
    pub species: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Applied,
    Idempotent,
}

pub struct FavouriteStore {
    dir: PathBuf,
    cooldown: Duration,
    lock: Mutex<()>,
}

impl FavouriteStore {
    pub fn new(dir: impl Into<PathBuf>, cooldown: Duration) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            cooldown,
            lock: Mutex::new(()),
        })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn events(&self) -> Result<Vec<FavEvent>, AppError> {
        read_lines(&self.path(FAV_EVENTS))
    }

    pub fn states(&self) -> Result<Vec<FavState>, AppError> {
        match fs::read(self.path(FAV_STATE)) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn winners(&self) -> Result<Vec<WeeklyWinner>, AppError> {
        read_lines(&self.path(WINNERS))
    }

    pub fn toggle(
        &self,
        sid: &str,
        species: &str,
        favourited: bool,
        now: DateTime<Utc>,
    ) -> Result<Toggle, AppError> {
        let state = u8::from(favourited);
        let _guard = self.guard();

        let mut states = self.states()?;
        let existing = states
            .iter()
            .position(|row| row.sid == sid && row.species == species);

        if let Some(index) = existing {
            let row = &states[index];

            if row.last_state == state {
                debug!("Idempotent toggle for {sid} on {species}");
                return Ok(Toggle::Idempotent);
            }

            if now - row.last_ts_utc < self.cooldown {
                warn!("Rejected fast flip for {sid} on {species}");
                return Err(AppError::TooFast);
            }
        }

        let event = FavEvent {
            ts_utc: now,
            sid: sid.to_string(),
            species: species.to_string(),
            state,
        };
        append_line(&self.path(FAV_EVENTS), &event)?;

        #[cfg(feature = "verbose")]
        info!("Favourite event: {:?}", event);

        match existing {
            Some(index) => {
                states[index].last_state = state;
                states[index].last_ts_utc = now;
            }
            None => states.push(FavState {
                sid: event.sid,
                species: event.species,
                last_state: state,
                last_ts_utc: now,
            }),
        }

        write_atomic(&self.path(FAV_STATE), &serde_json::to_vec(&states)?)?;

        Ok(Toggle::Applied)
    }

    /// Species the session currently has favourited, sorted.
    pub fn favourites_of(&self, sid: &str) -> Result<Vec<String>, AppError> {
        let mut species: Vec<String> = self
            .states()?
            .into_iter()
            .filter(|row| row.sid == sid && row.last_state == 1)
            .map(|row| row.species)
            .collect();
        species.sort();

        Ok(species)
    }

    /// Number of sessions currently favouriting each species.
    pub fn favourite_counts(&self) -> Result<HashMap<String, u32>, AppError> {
        let mut counts = HashMap::new();

        for row in self.states()? {
            if row.last_state == 1 {
                *counts.entry(row.species).or_insert(0) += 1;
            }
        }

        Ok(counts)
    }

    /// Appends the winner unless the week already has one. Returns whether a row was written.
    pub fn record_winner(&self, week_start: DateTime<Utc>, species: &str) -> Result<bool, AppError> {
        let _guard = self.guard();

        if self
            .winners()?
            .iter()
            .any(|row| row.week_start_utc == week_start)
        {
            return Ok(false);
        }

        append_line(
            &self.path(WINNERS),
            &WeeklyWinner {
                week_start_utc: week_start,
                species: species.to_string(),
            },
        )?;
        info!("Recorded {species} as favourite of the week starting {week_start}");

        Ok(true)
    }
}

fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, AppError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    Ok(text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| {
            serde_json::from_str(line)
                .map_err(|e| warn!("Skipping line {} of {}: {e}", index + 1, path.display()))
                .ok()
        })
        .collect())
}

/// Appends one JSON line. A torn last line gets terminated first so it cannot swallow this one.
fn append_line<T: Serialize>(path: &Path, row: &T) -> Result<(), AppError> {
    let mut line = serde_json::to_vec(row)?;
    line.push(b'\n');

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;

    if file.metadata()?.len() > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;

        if last[0] != b'\n' {
            warn!("Terminating torn last line of {}", path.display());
            line.insert(0, b'\n');
        }
    }

    file.write_all(&line)?;

    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(tmp, path)?;

    Ok(())
}
