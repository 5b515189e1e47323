//! Current/next prayer selection over a single day's table.
//!
//! The two scans are deliberately asymmetric. `current_prayer` walks the
//! canonical order backwards and accepts an exact boundary match (the prayer
//! has arrived); `next_prayer` walks forwards and requires the time to be
//! strictly later than now.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::models::{PrayerName, PrayerTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NextPrayer {
    pub name: PrayerName,
    pub time: NaiveTime,
    /// When the prayer falls, on the calendar. Tomorrow's date for the
    /// wrap-around to Imsak.
    pub at: NaiveDateTime,
    pub countdown_seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivePrayerState {
    pub current: PrayerName,
    pub next: NextPrayer,
}

/// What the display shows for a tick. `Unavailable` is the normal state
/// until a table has been fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ScheduleState {
    Unavailable,
    Active(ActivePrayerState),
}

impl ScheduleState {
    pub fn active(&self) -> Option<&ActivePrayerState> {
        match self {
            ScheduleState::Active(state) => Some(state),
            ScheduleState::Unavailable => None,
        }
    }
}

/// The most recently passed boundary. Before Imsak the previous night's
/// Isya window is still open.
pub fn current_prayer(table: &PrayerTable, now: NaiveDateTime) -> PrayerName {
    let now_time = now.time();
    table
        .entries()
        .iter()
        .rev()
        .find(|e| e.time <= now_time)
        .map(|e| e.name)
        .unwrap_or(PrayerName::Isya)
}

/// Next boundary after `now`. Once Isya has passed this rolls over to
/// tomorrow's Imsak, assumed to fall at today's Imsak time.
pub fn next_prayer(table: &PrayerTable, now: NaiveDateTime) -> NextPrayer {
    next_prayer_with_tomorrow(table, None, now)
}

/// Same as [`next_prayer`], but takes the rollover Imsak from `tomorrow`
/// when the caller already holds that table.
pub fn next_prayer_with_tomorrow(
    today: &PrayerTable,
    tomorrow: Option<&PrayerTable>,
    now: NaiveDateTime,
) -> NextPrayer {
    let now_time = now.time();
    if let Some(entry) = today.entries().iter().find(|e| e.time > now_time) {
        return make_next(entry.name, entry.time, now.date().and_time(entry.time), now);
    }

    let imsak = tomorrow
        .unwrap_or(today)
        .time_of(PrayerName::Imsak);
    let tomorrow_date = now.date() + Duration::days(1);
    make_next(PrayerName::Imsak, imsak, tomorrow_date.and_time(imsak), now)
}

/// Evaluate current and next against one captured `now`.
pub fn evaluate(
    today: Option<&PrayerTable>,
    tomorrow: Option<&PrayerTable>,
    now: NaiveDateTime,
) -> ScheduleState {
    match today {
        None => ScheduleState::Unavailable,
        Some(table) => ScheduleState::Active(ActivePrayerState {
            current: current_prayer(table, now),
            next: next_prayer_with_tomorrow(table, tomorrow, now),
        }),
    }
}

fn make_next(
    name: PrayerName,
    time: NaiveTime,
    at: NaiveDateTime,
    now: NaiveDateTime,
) -> NextPrayer {
    // num_seconds truncates toward zero, which is floor for a positive span
    let countdown_seconds = (at - now).num_seconds().max(0);
    NextPrayer {
        name,
        time,
        at,
        countdown_seconds,
    }
}
