//! # Scoring Windows
//!
//! All windows are half-open `[start, end)` in UTC.
//!
//! - Production: the previous full Monday 00:00 to Monday 00:00 week.
//! - Debug: the previous full clock hour, so the favourite of the "week" can be watched turning over
//!   without waiting seven days.
use chrono::{DateTime, Datelike, Duration, DurationRound, NaiveTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    PreviousWeek,
    PreviousHour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Span {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}

impl Window {
    /// The window scored at `now`. Its start doubles as the winners log key.
    pub fn span(self, now: DateTime<Utc>) -> Span {
        match self {
            Window::PreviousWeek => previous_week(now),
            Window::PreviousHour => previous_hour(now),
        }
    }

    /// When the scored window next moves on.
    pub fn next_refresh(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Window::PreviousWeek => next_monday_start(now),
            Window::PreviousHour => floor_to_hour(now) + Duration::hours(1),
        }
    }
}

pub fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(Duration::hours(1)).unwrap_or(ts)
}

fn midnight(date: chrono::NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub fn previous_week(now: DateTime<Utc>) -> Span {
    let today = now.date_naive();
    let days_since_monday = i64::from(today.weekday().num_days_from_monday());
    let start = midnight(today - Duration::days(days_since_monday + 7));

    Span {
        start,
        end: start + Duration::days(7),
    }
}

pub fn previous_hour(now: DateTime<Utc>) -> Span {
    let start = floor_to_hour(now) - Duration::hours(1);

    Span {
        start,
        end: start + Duration::hours(1),
    }
}

/// Strictly after `now`: on a Monday this is the following Monday.
pub fn next_monday_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let days = 7 - i64::from(today.weekday().num_days_from_monday());

    midnight(today + Duration::days(days))
}
