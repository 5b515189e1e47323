//! Caller-owned schedule state.
//!
//! The engine holds the current table (plus an optional look-ahead table
//! for tomorrow) and the transition tracker. It has no thread and no clock:
//! the host captures `now` once per tick and calls [`ScheduleEngine::tick`].

use chrono::{Duration, NaiveDateTime};
use log::{debug, info};

use super::schedule::{evaluate, ScheduleState};
use super::tracker::{AlarmTrigger, TransitionTracker};
use crate::models::{AlarmSet, PrayerTable};

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub state: ScheduleState,
    pub alarm: Option<AlarmTrigger>,
    /// The held table is for a different day than `now`.
    pub stale: bool,
}

#[derive(Debug, Default)]
pub struct ScheduleEngine {
    today: Option<PrayerTable>,
    tomorrow: Option<PrayerTable>,
    tracker: TransitionTracker,
}

impl ScheduleEngine {
    pub fn new(today: Option<PrayerTable>) -> Self {
        Self {
            today,
            tomorrow: None,
            tracker: TransitionTracker::new(),
        }
    }

    pub fn table(&self) -> Option<&PrayerTable> {
        self.today.as_ref()
    }

    pub fn tomorrow(&self) -> Option<&PrayerTable> {
        self.tomorrow.as_ref()
    }

    /// Supersede the table (city or day changed). The tracker is reset so
    /// the first tick against the new table only sets a baseline.
    pub fn replace_table(&mut self, table: Option<PrayerTable>) {
        match &table {
            Some(t) => info!("schedule table replaced: {} on {}", t.location_id, t.date),
            None => info!("schedule table cleared"),
        }
        self.today = table;
        self.tomorrow = None;
        self.tracker.reset();
    }

    pub fn set_tomorrow(&mut self, table: Option<PrayerTable>) {
        self.tomorrow = table;
    }

    /// `alarms` is the snapshot for this tick; read it once per tick.
    pub fn tick(&mut self, now: NaiveDateTime, alarms: &AlarmSet) -> Tick {
        let state = evaluate(self.today.as_ref(), self.tomorrow.as_ref(), now);
        let Some(active) = state.active() else {
            return Tick {
                state,
                alarm: None,
                stale: false,
            };
        };

        let alarm = self.tracker.observe_with_alarms(active.current, alarms);
        if let Some(trigger) = alarm {
            info!("alarm: {}", trigger.prayer);
        }

        let stale = self.is_stale(now);
        if stale {
            debug!("table for a different day than {}", now.date());
        }

        Tick {
            state,
            alarm,
            stale,
        }
    }

    /// The held table is for another day than `now`.
    pub fn is_stale(&self, now: NaiveDateTime) -> bool {
        self.today.as_ref().is_some_and(|t| t.date != now.date())
    }

    /// Time until the next boundary, for hosts that sleep until the next
    /// change instead of ticking every second. `None` without a table.
    pub fn until_next_boundary(&self, now: NaiveDateTime) -> Option<Duration> {
        evaluate(self.today.as_ref(), self.tomorrow.as_ref(), now)
            .active()
            .map(|s| s.next.at - now)
            .map(|d| d.max(Duration::zero()))
    }
}
