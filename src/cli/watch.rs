//! State behind `watch`, kept out of the ticking loop so it can be driven
//! with a fake clock.
//!
//! Each [`WatchSession::step`] follows the city selection, refetches the
//! table on a new day or city (at most once per [`RETRY_SECS`] while the
//! provider keeps failing), looks ahead to tomorrow once Isya has passed,
//! replans notifications when the table or the alarm set changed, and
//! ticks the engine.

use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use log::{info, warn};
use rusqlite::Connection;

use crate::db::repository::AlarmRepo;
use crate::models::{AlarmSet, PrayerTable};
use crate::notify::{plan_notifications, reschedule, TerminalNotifier};
use crate::prayer_times::engine::Tick;
use crate::prayer_times::myquran::City;
use crate::prayer_times::schedule::next_prayer;
use crate::prayer_times::{load_table, ContentProvider, ScheduleEngine};

/// How long to wait before asking for a table again after a failure.
pub const RETRY_SECS: i64 = 60;

/// Rebuild the advance notification batch. Failures are logged only; the
/// live countdown doesn't depend on them.
pub fn replan(
    notifier: &mut TerminalNotifier,
    today: &PrayerTable,
    tomorrow: Option<&PrayerTable>,
    alarms: &AlarmSet,
    now: NaiveDateTime,
) {
    let plan = plan_notifications(today, tomorrow, alarms, now);
    if let Err(e) = reschedule(notifier, &plan) {
        warn!("could not schedule notifications: {:#}", e);
    }
}

fn due(last: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
    // a clock stepped backwards counts as due
    last.is_none_or(|t| now < t || now - t >= Duration::seconds(RETRY_SECS))
}

#[derive(Default)]
pub struct WatchSession {
    engine: ScheduleEngine,
    notifier: TerminalNotifier,
    city: Option<City>,
    last_attempt: Option<NaiveDateTime>,
    tomorrow_attempt: Option<NaiveDateTime>,
    last_alarms: Option<AlarmSet>,
}

impl WatchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(&self) -> &ScheduleEngine {
        &self.engine
    }

    pub fn notifier(&self) -> &TerminalNotifier {
        &self.notifier
    }

    /// One tick. `city` is the selection as of now; `now` is captured once
    /// by the caller.
    pub fn step(
        &mut self,
        now: NaiveDateTime,
        city: &City,
        conn: &Connection,
        provider: &dyn ContentProvider,
    ) -> Result<Tick> {
        let city_changed = self.city.as_ref().is_none_or(|c| c.id != city.id);
        if city_changed {
            info!("watching {} ({})", city.name, city.id);
            self.city = Some(city.clone());
            self.last_attempt = None;
        }

        let mut table_changed = false;
        let needs_table =
            city_changed || self.engine.table().is_none() || self.engine.is_stale(now);
        if needs_table && due(self.last_attempt, now) {
            let today = load_table(conn, provider, &city.id, now.date());
            // only failures hold back the next attempt
            self.last_attempt = if today.is_some() { None } else { Some(now) };
            table_changed = today.is_some();
            self.engine.replace_table(today);
            self.tomorrow_attempt = None;
        }

        let wraps = self
            .engine
            .table()
            .is_some_and(|t| next_prayer(t, now).at.date() > now.date());
        if wraps && self.engine.tomorrow().is_none() && due(self.tomorrow_attempt, now) {
            // Isya has passed: fetch tomorrow for the Imsak countdown
            self.tomorrow_attempt = Some(now);
            let tomorrow = load_table(conn, provider, &city.id, now.date() + Duration::days(1));
            table_changed |= tomorrow.is_some();
            self.engine.set_tomorrow(tomorrow);
        }

        // one read per tick
        let alarms = AlarmRepo::load(conn)?;
        let alarms_changed = self.last_alarms.as_ref() != Some(&alarms);
        if table_changed || alarms_changed {
            if let Some(today) = self.engine.table() {
                replan(&mut self.notifier, today, self.engine.tomorrow(), &alarms, now);
            }
        }

        let tick = self.engine.tick(now, &alarms);
        self.last_alarms = Some(alarms);
        Ok(tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::table::tests::sample_table;
    use crate::models::PrayerName;
    use crate::prayer_times::provider::tests::FakeProvider;
    use crate::prayer_times::provider::ContentError;
    use crate::prayer_times::ScheduleState;
    use chrono::NaiveDate;
    use std::cell::Cell;
    use std::collections::HashMap;

    /// Serves tables per (city, date); anything else fails.
    struct DayProvider {
        tables: HashMap<(String, NaiveDate), PrayerTable>,
        calls: Cell<usize>,
    }

    impl DayProvider {
        fn new(tables: Vec<PrayerTable>) -> Self {
            Self {
                tables: tables
                    .into_iter()
                    .map(|t| ((t.location_id.clone(), t.date), t))
                    .collect(),
                calls: Cell::new(0),
            }
        }
    }

    impl ContentProvider for DayProvider {
        fn fetch_table(&self, id: &str, date: NaiveDate) -> Result<PrayerTable, ContentError> {
            self.calls.set(self.calls.get() + 1);
            self.tables
                .get(&(id.to_string(), date))
                .cloned()
                .ok_or_else(|| ContentError::Rejected("no data".into()))
        }
    }

    fn day1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn at(date: NaiveDate, h: u32, m: u32, s: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, s).unwrap()
    }

    fn table_for(city: &str, date: NaiveDate) -> PrayerTable {
        let times: Vec<_> = sample_table()
            .entries()
            .iter()
            .map(|e| (e.name, e.time))
            .collect();
        PrayerTable::new(city, date, times).unwrap()
    }

    fn city(id: &str) -> City {
        City {
            id: id.to_string(),
            name: format!("KOTA {}", id),
        }
    }

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn failing_provider_is_retried_once_a_minute() {
        let conn = conn();
        let offline = FakeProvider { table: None, calls: Cell::new(0) };
        let mut session = WatchSession::new();
        let start = at(day1(), 10, 0, 0);
        for i in 0..180 {
            let tick = session
                .step(start + Duration::seconds(i), &city("1301"), &conn, &offline)
                .unwrap();
            assert_eq!(tick.state, ScheduleState::Unavailable);
        }
        assert_eq!(offline.calls.get(), 3);
    }

    #[test]
    fn tomorrow_lookahead_is_throttled() {
        let conn = conn();
        // only today is served; tomorrow keeps failing after Isya
        let provider = DayProvider::new(vec![table_for("1301", day1())]);
        let mut session = WatchSession::new();
        let start = at(day1(), 20, 0, 0);
        for i in 0..180 {
            session
                .step(start + Duration::seconds(i), &city("1301"), &conn, &provider)
                .unwrap();
        }
        // one today fetch, tomorrow at 20:00, 20:01, 20:02
        assert_eq!(provider.calls.get(), 4);
        assert!(session.engine().tomorrow().is_none());
    }

    #[test]
    fn midnight_swaps_table_and_imsak_still_fires() {
        let conn = conn();
        AlarmRepo::set(&conn, PrayerName::Imsak, true).unwrap();
        AlarmRepo::set(&conn, PrayerName::Isya, true).unwrap();
        let day2 = day1().succ_opt().unwrap();
        let provider =
            DayProvider::new(vec![table_for("1301", day1()), table_for("1301", day2)]);
        let mut session = WatchSession::new();
        let jakarta = city("1301");

        let alarms: Vec<_> = [
            at(day1(), 23, 59, 58),
            at(day1(), 23, 59, 59),
            at(day2, 0, 0, 0),
            at(day2, 0, 0, 1),
        ]
        .into_iter()
        .filter_map(|now| session.step(now, &jakarta, &conn, &provider).unwrap().alarm)
        .collect();
        assert!(alarms.is_empty());
        assert_eq!(session.engine().table().map(|t| t.date), Some(day2));
        assert!(!session.engine().is_stale(at(day2, 0, 0, 1)));

        let before = session.step(at(day2, 4, 29, 59), &jakarta, &conn, &provider).unwrap();
        assert_eq!(before.alarm, None);
        let fired = session.step(at(day2, 4, 30, 0), &jakarta, &conn, &provider).unwrap();
        assert_eq!(fired.alarm.map(|a| a.prayer), Some(PrayerName::Imsak));
    }

    #[test]
    fn city_switch_replaces_table_without_alarm() {
        let conn = conn();
        for p in PrayerName::CANONICAL {
            AlarmRepo::set(&conn, p, true).unwrap();
        }
        let bandung = PrayerTable::from_clock_strings(
            "1107",
            day1(),
            [
                (PrayerName::Imsak, "04:20"),
                (PrayerName::Subuh, "04:30"),
                (PrayerName::Terbit, "05:50"),
                (PrayerName::Dzuhur, "11:50"),
                (PrayerName::Ashar, "12:10"),
                (PrayerName::Maghrib, "17:50"),
                (PrayerName::Isya, "19:00"),
            ],
        )
        .unwrap();
        let provider = DayProvider::new(vec![table_for("1301", day1()), bandung]);
        let mut session = WatchSession::new();

        session
            .step(at(day1(), 12, 30, 0), &city("1301"), &conn, &provider)
            .unwrap();
        // Bandung is already in Ashar at 12:30:01
        let tick = session
            .step(at(day1(), 12, 30, 1), &city("1107"), &conn, &provider)
            .unwrap();
        assert_eq!(tick.alarm, None);
        assert_eq!(tick.state.active().map(|s| s.current), Some(PrayerName::Ashar));
        assert_eq!(session.engine().table().map(|t| t.location_id.as_str()), Some("1107"));
    }

    #[test]
    fn alarm_change_replans_notifications() {
        let conn = conn();
        let provider = DayProvider::new(vec![table_for("1301", day1())]);
        let mut session = WatchSession::new();
        let jakarta = city("1301");

        session.step(at(day1(), 10, 0, 0), &jakarta, &conn, &provider).unwrap();
        assert!(session.notifier().pending().is_empty());

        // toggled from another terminal
        AlarmRepo::set(&conn, PrayerName::Maghrib, true).unwrap();
        session.step(at(day1(), 10, 0, 1), &jakarta, &conn, &provider).unwrap();
        let planned: Vec<_> = session.notifier().pending().iter().map(|n| n.prayer).collect();
        assert_eq!(planned, vec![PrayerName::Maghrib, PrayerName::Maghrib]);

        AlarmRepo::set(&conn, PrayerName::Maghrib, false).unwrap();
        session.step(at(day1(), 10, 0, 2), &jakarta, &conn, &provider).unwrap();
        assert!(session.notifier().pending().is_empty());
    }
}
