use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use log::debug;
use rusqlite::Connection;
use std::io::{self, Write};
use std::str::FromStr;

use crate::cli::args::{AlarmCommands, CityCommands};
use crate::cli::watch::{replan, WatchSession, RETRY_SECS};
use crate::config::AppConfig;
use crate::db::repository::{
    AlarmRepo, CacheRepo, MetaRepo, SELECTED_CITY, SELECTED_CITY_NAME,
};
use crate::models::{PrayerName, PrayerTable};
use crate::notify::TerminalNotifier;
use crate::prayer_times::myquran::City;
use crate::prayer_times::schedule::{evaluate, next_prayer};
use crate::prayer_times::ticker::Ticker;
use crate::prayer_times::{
    load_table, ContentProvider, MyQuranClient, PrayerCalculator, ScheduleEngine, ScheduleState,
};
use crate::utils::format::{format_countdown, format_time};
use crate::utils::hijri::hijri_string;

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;196;160;68m";

// ─── Shared plumbing ─────────────────────────────────────────────────────────

fn selected_city(conn: &Connection, config: &AppConfig) -> Result<City> {
    let id = MetaRepo::get(conn, SELECTED_CITY)?;
    let name = MetaRepo::get(conn, SELECTED_CITY_NAME)?;
    Ok(match id {
        Some(id) => City {
            name: name.unwrap_or_else(|| id.clone()),
            id,
        },
        None => City {
            id: config.location.city_id.clone(),
            name: config.location.city_name.clone(),
        },
    })
}

fn make_provider(config: &AppConfig, offline: bool) -> Result<Box<dyn ContentProvider>> {
    if offline || config.source.offline {
        let loc = &config.location;
        let calc = PrayerCalculator::new(
            loc.latitude,
            loc.longitude,
            &loc.calc_method,
            &loc.madhab,
            loc.timezone_offset,
        )?;
        return Ok(Box::new(calc));
    }
    let client = MyQuranClient::new(&config.source.api_base_url, config.source.timeout())
        .context("Building HTTP client")?;
    Ok(Box::new(client))
}

fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Today's table plus, once Isya has passed, tomorrow's so the Imsak
/// countdown uses tomorrow's real time.
fn load_engine_tables(
    conn: &Connection,
    provider: &dyn ContentProvider,
    city: &City,
    now: NaiveDateTime,
) -> (Option<PrayerTable>, Option<PrayerTable>) {
    let today = load_table(conn, provider, &city.id, now.date());
    let tomorrow = today
        .as_ref()
        .filter(|t| next_prayer(t, now).at.date() > now.date())
        .and_then(|t| load_table(conn, provider, &city.id, t.date + Duration::days(1)));
    (today, tomorrow)
}

// ─── Times ───────────────────────────────────────────────────────────────────

pub fn handle_times(
    conn: &Connection,
    config: &AppConfig,
    offline: bool,
    date: Option<NaiveDate>,
) -> Result<()> {
    let provider = make_provider(config, offline)?;
    let city = selected_city(conn, config)?;
    let now = now_local();
    let day = date.unwrap_or(now.date());

    let Some(table) = load_table(conn, provider.as_ref(), &city.id, day) else {
        println!();
        println_colored!(DIM, "  Prayer times for {} are not available yet.", city.name);
        println!();
        return Ok(());
    };
    let alarms = AlarmRepo::load(conn)?;

    println!();
    println_colored!(
        GOLD,
        "  Jadwal Sholat — {} ({})",
        table.location_name.as_deref().unwrap_or(&city.name),
        day.format("%Y-%m-%d")
    );
    if let Some(hijri) = hijri_string(day, config.display.hijri_offset) {
        println_colored!(DIM, "  {}", hijri);
    }
    println!();

    let is_today = day == now.date();
    let state = if is_today {
        let tomorrow = if next_prayer(&table, now).at.date() > day {
            load_table(conn, provider.as_ref(), &city.id, day + Duration::days(1))
        } else {
            None
        };
        evaluate(Some(&table), tomorrow.as_ref(), now)
    } else {
        ScheduleState::Unavailable
    };
    let current = state.active().map(|s| s.current);

    for entry in table.entries() {
        let bell = if alarms.is_enabled(entry.name) { "♪" } else { " " };
        let line = format!(
            "  {:<8}  {}  {}",
            entry.name.display_name(),
            format_time(entry.time),
            bell
        );
        if current == Some(entry.name) {
            println_colored!(GREEN, "{}  ◀ now", line);
        } else if is_today && entry.time <= now.time() {
            println_colored!(DIM, "{}", line);
        } else {
            println_colored!(BOLD, "{}", line);
        }
    }

    if let Some(active) = state.active() {
        println!();
        println_colored!(
            AMBER,
            "  Next: {} {} in {}",
            active.next.name,
            format_time(active.next.time),
            format_countdown(active.next.countdown_seconds)
        );
    }
    println!();
    Ok(())
}

// ─── Watch ───────────────────────────────────────────────────────────────────

fn arm_ticker(engine: &ScheduleEngine, now: NaiveDateTime, precise: bool) -> Ticker {
    if !precise {
        return Ticker::every(std::time::Duration::from_secs(1));
    }
    // Wake at the next boundary, or at midnight to pick up the new day's
    // table, whichever comes first.
    let midnight = (now.date() + Duration::days(1)).and_time(chrono::NaiveTime::MIN) - now;
    let wait = engine
        .until_next_boundary(now)
        .map(|d| d.min(midnight))
        .unwrap_or(Duration::seconds(RETRY_SECS));
    debug!("next wake in {}s", wait.num_seconds());
    Ticker::once_after(wait.to_std().unwrap_or_default())
}

pub fn handle_watch(
    conn: &Connection,
    config: &AppConfig,
    offline: bool,
    precise: bool,
) -> Result<()> {
    let provider = make_provider(config, offline)?;
    let mut session = WatchSession::new();

    println_colored!(GOLD, "  {} — Ctrl-C to stop", selected_city(conn, config)?.name);

    let mut ticker = arm_ticker(session.engine(), now_local(), precise);
    loop {
        if ticker.next().is_err() {
            // one-shot ticker finished without a pending tick
            ticker = arm_ticker(session.engine(), now_local(), precise);
            continue;
        }

        let now = now_local();
        // re-read so `city set` from another terminal is picked up
        let city = selected_city(conn, config)?;
        let tick = session.step(now, &city, conn, provider.as_ref())?;

        if let Some(trigger) = tick.alarm {
            if config.display.bell {
                print!("\x07");
            }
            println!();
            println_colored!(GOLD, "  ♪ Waktunya {} ({})", trigger.prayer, now.format("%H:%M"));
        }

        render_state(&tick.state, precise)?;

        if precise {
            ticker = arm_ticker(session.engine(), now, precise);
        } else {
            // a slow fetch leaves ticks queued; they are all stale now
            while ticker.try_next().is_some() {}
        }
    }
}

fn render_state(state: &ScheduleState, precise: bool) -> Result<()> {
    let line = match state {
        ScheduleState::Unavailable => "  Loading prayer times...".to_string(),
        ScheduleState::Active(active) => format!(
            "  {} · next {} {} in {}",
            active.current,
            active.next.name,
            format_time(active.next.time),
            format_countdown(active.next.countdown_seconds)
        ),
    };
    let mut out = io::stdout().lock();
    if precise {
        writeln!(out, "{}", line)?;
    } else {
        write!(out, "\r{}\x1b[K", line)?;
    }
    out.flush()?;
    Ok(())
}

// ─── Alarms ──────────────────────────────────────────────────────────────────

pub fn handle_alarm(
    conn: &Connection,
    config: &AppConfig,
    offline: bool,
    action: &AlarmCommands,
) -> Result<()> {
    let (prayer, on) = match action {
        AlarmCommands::List => {
            let alarms = AlarmRepo::load(conn)?;
            println!();
            for prayer in PrayerName::CANONICAL {
                if alarms.is_enabled(prayer) {
                    println_colored!(GREEN, "  {:<8}  on", prayer.display_name());
                } else {
                    println_colored!(DIM, "  {:<8}  off", prayer.display_name());
                }
            }
            println!();
            return Ok(());
        }
        AlarmCommands::On { prayer } => (prayer, true),
        AlarmCommands::Off { prayer } => (prayer, false),
    };

    let prayer = PrayerName::from_str(prayer)?;
    AlarmRepo::set(conn, prayer, on)?;
    println_colored!(
        GREEN,
        "  ✓ {} alarm {}",
        prayer.display_name(),
        if on { "on" } else { "off" }
    );

    // alarm set changed: rebuild the advance batch
    let provider = make_provider(config, offline)?;
    let city = selected_city(conn, config)?;
    let now = now_local();
    let (today, tomorrow) = load_engine_tables(conn, provider.as_ref(), &city, now);
    if let Some(today) = today {
        let alarms = AlarmRepo::load(conn)?;
        let mut notifier = TerminalNotifier::default();
        replan(&mut notifier, &today, tomorrow.as_ref(), &alarms, now);
        println_colored!(DIM, "  {} notification(s) scheduled", notifier.pending().len());
    }
    Ok(())
}

// ─── City ────────────────────────────────────────────────────────────────────

pub fn handle_city(
    conn: &Connection,
    config: &AppConfig,
    offline: bool,
    action: &CityCommands,
) -> Result<()> {
    match action {
        CityCommands::Show => {
            let city = selected_city(conn, config)?;
            println!("  {} ({})", city.name, city.id);
        }
        CityCommands::Set { id } => {
            let provider = make_provider(config, offline)?;
            let today = now_local().date();
            let table = provider
                .fetch_table(id, today)
                .with_context(|| format!("Fetching prayer times for city {}", id))?;
            CacheRepo::store_table(conn, &table)?;
            let name = table.location_name.clone().unwrap_or_else(|| id.clone());
            MetaRepo::set(conn, SELECTED_CITY, id)?;
            MetaRepo::set(conn, SELECTED_CITY_NAME, &name)?;
            CacheRepo::prune_before(conn, today)?;
            println_colored!(GREEN, "  ✓ City set to {} ({})", name, id);
        }
        CityCommands::Search { keyword } => {
            let client = MyQuranClient::new(&config.source.api_base_url, config.source.timeout())?;
            let cities = client
                .search_city(keyword)
                .with_context(|| format!("Searching cities for '{}'", keyword))?;
            if cities.is_empty() {
                println_colored!(DIM, "  No city matches '{}'", keyword);
            }
            for city in cities {
                println!("  {:<6}  {}", city.id, city.name);
            }
        }
    }
    Ok(())
}

// ─── Notify ──────────────────────────────────────────────────────────────────

pub fn handle_notify(conn: &Connection, config: &AppConfig, offline: bool) -> Result<()> {
    let provider = make_provider(config, offline)?;
    let city = selected_city(conn, config)?;
    let now = now_local();

    let today = load_table(conn, provider.as_ref(), &city.id, now.date());
    let Some(today) = today else {
        println_colored!(DIM, "  Prayer times for {} are not available yet.", city.name);
        return Ok(());
    };
    let tomorrow = load_table(conn, provider.as_ref(), &city.id, now.date() + Duration::days(1));

    let alarms = AlarmRepo::load(conn)?;
    let mut notifier = TerminalNotifier::default();
    replan(&mut notifier, &today, tomorrow.as_ref(), &alarms, now);

    println!();
    if notifier.pending().is_empty() {
        println_colored!(DIM, "  Nothing scheduled. Turn alarms on with `alarm on <prayer>`.");
    }
    for n in notifier.pending() {
        println!("  {}  {}", n.fire_at.format("%a %d %b %H:%M"), n.text);
    }
    println!();
    Ok(())
}
