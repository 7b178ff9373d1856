//! # Favourite of the Week
//!
//! Turns the favourite event log into a leaderboard and a single weekly winner.
//!
//! ## Score
//! - Raw score: distinct sessions favouriting the species inside the window. Two aggregation modes:
//!   the session's final in-window state must be favourited (`final_state`), or any favourited
//!   event in the window counts (`ever_favved`, the default).
//! - Suppression: a species that won recently is multiplied by
//!   `m0 + (1 - m0) * min(n, horizon) / horizon`, `n` being whole weeks since its latest win
//!   before the scored week. Never won is `1.0`. The scored week's own winner row is ignored, so
//!   recording a winner never changes that week's leaderboard.
//!
//! Winners are only ever recorded for calendar weeks. The hourly debug window scores live but
//! leaves the winners log alone.
//!
//! ## Ranking
//! Decayed score descending, then fewer past wins, then species name.
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
    str::FromStr,
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::AppError,
    favourites::{FavEvent, FavouriteStore, WeeklyWinner},
    window::{Span, Window},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Aggregation {
    #[serde(rename = "final_state")]
    FinalState,
    #[serde(rename = "ever_favved")]
    EverFavourited,
}

#[derive(Debug)]
pub struct UnknownAggregation(String);

impl fmt::Display for UnknownAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown aggregation mode {:?}", self.0)
    }
}

impl FromStr for Aggregation {
    type Err = UnknownAggregation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "final_state" => Ok(Aggregation::FinalState),
            "ever_favved" => Ok(Aggregation::EverFavourited),
            other => Err(UnknownAggregation(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Suppression {
    floor: f64,
    horizon: u32,
}

impl Default for Suppression {
    fn default() -> Self {
        Self {
            floor: 0.6,
            horizon: 8,
        }
    }
}

impl Suppression {
    /// `floor` must lie in `(0, 1)` and `horizon` be at least one week.
    pub fn new(floor: f64, horizon: u32) -> Option<Self> {
        (floor > 0.0 && floor < 1.0 && horizon > 0).then_some(Self { floor, horizon })
    }

    pub fn multiplier(&self, weeks_since_win: Option<i64>) -> f64 {
        let Some(weeks) = weeks_since_win else {
            return 1.0;
        };

        let horizon = i64::from(self.horizon);
        if weeks >= horizon {
            return 1.0;
        }

        let progress = weeks.max(0) as f64 / horizon as f64;
        self.floor + (1.0 - self.floor) * progress
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringConfig {
    pub aggregation: Aggregation,
    pub window: Window,
    pub suppression: Suppression,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::EverFavourited,
            window: Window::PreviousWeek,
            suppression: Suppression::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSpecies {
    pub species: String,
    pub raw: u32,
    pub multiplier: f64,
    pub score: f64,
    pub past_wins: u32,
}

/// Distinct favouriting sessions per species inside `span`.
pub fn raw_scores<'a>(
    events: &'a [FavEvent],
    span: Span,
    aggregation: Aggregation,
) -> BTreeMap<&'a str, u32> {
    let mut in_window: Vec<&FavEvent> = events
        .iter()
        .filter(|event| span.contains(event.ts_utc))
        .collect();

    let mut sessions: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();

    match aggregation {
        Aggregation::EverFavourited => {
            for event in in_window.iter().copied().filter(|event| event.favourited()) {
                sessions
                    .entry(event.species.as_str())
                    .or_default()
                    .insert(event.sid.as_str());
            }
        }
        Aggregation::FinalState => {
            // Stable: equal timestamps keep log order, so the later line wins.
            in_window.sort_by_key(|event| event.ts_utc);

            let mut last: HashMap<(&str, &str), &FavEvent> = HashMap::new();
            for event in in_window {
                last.insert((event.sid.as_str(), event.species.as_str()), event);
            }

            for ((sid, species), event) in last {
                if event.favourited() {
                    sessions.entry(species).or_default().insert(sid);
                }
            }
        }
    }

    sessions
        .into_iter()
        .map(|(species, sids)| (species, sids.len() as u32))
        .collect()
}

/// Whole weeks between the species' latest win before `week_start` and `week_start`.
pub fn weeks_since_win(
    species: &str,
    winners: &[WeeklyWinner],
    week_start: DateTime<Utc>,
) -> Option<i64> {
    winners
        .iter()
        .filter(|row| row.species == species && row.week_start_utc < week_start)
        .map(|row| row.week_start_utc)
        .max()
        .map(|last| (week_start - last).num_days() / 7)
}

pub fn leaderboard(
    events: &[FavEvent],
    winners: &[WeeklyWinner],
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> Vec<ScoredSpecies> {
    let span = config.window.span(now);

    let mut past_wins: HashMap<&str, u32> = HashMap::new();
    for row in winners.iter().filter(|row| row.week_start_utc < span.start) {
        *past_wins.entry(row.species.as_str()).or_insert(0) += 1;
    }

    let mut board: Vec<ScoredSpecies> = raw_scores(events, span, config.aggregation)
        .into_iter()
        .map(|(species, raw)| {
            let multiplier = config
                .suppression
                .multiplier(weeks_since_win(species, winners, span.start));

            ScoredSpecies {
                species: species.to_string(),
                raw,
                multiplier,
                score: f64::from(raw) * multiplier,
                past_wins: past_wins.get(species).copied().unwrap_or(0),
            }
        })
        .collect();

    board.sort_by(rank);
    board
}

fn rank(a: &ScoredSpecies, b: &ScoredSpecies) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.past_wins.cmp(&b.past_wins))
        .then_with(|| a.species.cmp(&b.species))
}

pub fn compute_winner(
    events: &[FavEvent],
    winners: &[WeeklyWinner],
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> Option<String> {
    leaderboard(events, winners, now, config)
        .into_iter()
        .next()
        .map(|top| top.species)
}

/// Winner already logged for the window scored at `now`.
pub fn recorded_winner(
    winners: &[WeeklyWinner],
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> Option<String> {
    let week_start = config.window.span(now).start;

    winners
        .iter()
        .find(|row| row.week_start_utc == week_start)
        .map(|row| row.species.clone())
}

/// Scores the calendar week before `now` and records its winner once. The configured window only
/// picks the aggregation and suppression, debug hours are never written to the log.
pub fn record_winner_if_missing(
    store: &FavouriteStore,
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> Result<bool, AppError> {
    let config = ScoringConfig {
        window: Window::PreviousWeek,
        ..*config
    };

    let events = store.events()?;
    let winners = store.winners()?;

    let week_start = config.window.span(now).start;
    if winners.iter().any(|row| row.week_start_utc == week_start) {
        return Ok(false);
    }

    match compute_winner(&events, &winners, now, &config) {
        Some(species) => store.record_winner(week_start, &species),
        None => Ok(false),
    }
}
