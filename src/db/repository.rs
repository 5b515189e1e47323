use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

use crate::models::{AlarmSet, PrayerName, PrayerTable};

// ─── Cached prayer tables ───────────────────────────────────────────────────

pub struct CacheRepo;

impl CacheRepo {
    pub fn get_table(
        conn: &Connection,
        location_id: &str,
        date: NaiveDate,
    ) -> Result<Option<PrayerTable>> {
        let row = conn
            .query_row(
                "SELECT location_name, imsak, subuh, terbit, dzuhur, ashar, maghrib, isya
                 FROM prayer_table_cache WHERE location_id = ?1 AND date = ?2",
                params![location_id, date.format("%Y-%m-%d").to_string()],
                |row| {
                    let name = row.get::<_, Option<String>>(0)?;
                    let mut times = Vec::with_capacity(7);
                    for (i, prayer) in PrayerName::CANONICAL.into_iter().enumerate() {
                        times.push((prayer, row.get::<_, String>(i + 1)?));
                    }
                    Ok((name, times))
                },
            )
            .optional()?;

        let Some((name, times)) = row else {
            return Ok(None);
        };
        let table = PrayerTable::from_clock_strings(
            location_id,
            date,
            times.iter().map(|(p, s)| (*p, s.as_str())),
        )
        .map_err(|e| anyhow!("Corrupt cache row for {} on {}: {}", location_id, date, e))?;
        Ok(Some(match name {
            Some(name) => table.with_location_name(name),
            None => table,
        }))
    }

    pub fn store_table(conn: &Connection, table: &PrayerTable) -> Result<()> {
        let t = |p: PrayerName| table.time_of(p).format("%H:%M").to_string();
        conn.execute(
            "INSERT OR REPLACE INTO prayer_table_cache
                (location_id, date, location_name,
                 imsak, subuh, terbit, dzuhur, ashar, maghrib, isya)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                table.location_id,
                table.date.format("%Y-%m-%d").to_string(),
                table.location_name,
                t(PrayerName::Imsak),
                t(PrayerName::Subuh),
                t(PrayerName::Terbit),
                t(PrayerName::Dzuhur),
                t(PrayerName::Ashar),
                t(PrayerName::Maghrib),
                t(PrayerName::Isya),
            ],
        )?;
        Ok(())
    }

    /// Drop cached days before `keep_from`.
    pub fn prune_before(conn: &Connection, keep_from: NaiveDate) -> Result<usize> {
        let n = conn.execute(
            "DELETE FROM prayer_table_cache WHERE date < ?1",
            params![keep_from.format("%Y-%m-%d").to_string()],
        )?;
        Ok(n)
    }
}

// ─── Alarms ──────────────────────────────────────────────────────────────────

pub struct AlarmRepo;

impl AlarmRepo {
    /// Read the whole alarm set in one query.
    pub fn load(conn: &Connection) -> Result<AlarmSet> {
        let mut stmt = conn.prepare("SELECT prayer, enabled FROM alarms")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?))
        })?;

        let mut alarms = AlarmSet::default();
        for r in rows {
            let (prayer, enabled) = r?;
            alarms.set(PrayerName::from_str(&prayer)?, enabled != 0);
        }
        Ok(alarms)
    }

    pub fn set(conn: &Connection, prayer: PrayerName, enabled: bool) -> Result<()> {
        conn.execute(
            "INSERT INTO alarms (prayer, enabled) VALUES (?1, ?2)
             ON CONFLICT(prayer) DO UPDATE SET enabled = excluded.enabled",
            params![prayer.as_str(), enabled as i32],
        )?;
        Ok(())
    }
}

// ─── App meta (key-value) ────────────────────────────────────────────────────

pub const SELECTED_CITY: &str = "selected_city";
pub const SELECTED_CITY_NAME: &str = "selected_city_name";

pub struct MetaRepo;

impl MetaRepo {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        let val = conn
            .query_row(
                "SELECT value FROM app_meta WHERE key = ?1",
                params![key],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();
        Ok(val)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO app_meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::table::tests::sample_table;

    fn open_temp() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join("test.db")).unwrap();
        run_migrations(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn table_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let table = sample_table().with_location_name("KOTA JAKARTA");
        {
            let conn = Connection::open(&path).unwrap();
            run_migrations(&conn).unwrap();
            CacheRepo::store_table(&conn, &table).unwrap();
        }
        let conn = Connection::open(&path).unwrap();
        let loaded = CacheRepo::get_table(&conn, "1301", table.date).unwrap();
        assert_eq!(loaded, Some(table));
    }

    #[test]
    fn cache_is_keyed_by_location() {
        let (_dir, conn) = open_temp();
        let table = sample_table();
        CacheRepo::store_table(&conn, &table).unwrap();
        assert_eq!(CacheRepo::get_table(&conn, "1609", table.date).unwrap(), None);
    }

    #[test]
    fn prune_drops_old_days() {
        let (_dir, conn) = open_temp();
        let table = sample_table();
        CacheRepo::store_table(&conn, &table).unwrap();
        let next_day = table.date.succ_opt().unwrap();
        assert_eq!(CacheRepo::prune_before(&conn, next_day).unwrap(), 1);
        assert_eq!(CacheRepo::get_table(&conn, "1301", table.date).unwrap(), None);
    }

    #[test]
    fn alarms_round_trip_and_default_off() {
        let (_dir, conn) = open_temp();
        assert_eq!(AlarmRepo::load(&conn).unwrap(), AlarmSet::default());

        AlarmRepo::set(&conn, PrayerName::Subuh, true).unwrap();
        AlarmRepo::set(&conn, PrayerName::Maghrib, true).unwrap();
        AlarmRepo::set(&conn, PrayerName::Subuh, false).unwrap();

        let alarms = AlarmRepo::load(&conn).unwrap();
        assert!(!alarms.is_enabled(PrayerName::Subuh));
        assert!(alarms.is_enabled(PrayerName::Maghrib));
        assert!(!alarms.is_enabled(PrayerName::Isya));
    }

    #[test]
    fn meta_overwrites() {
        let (_dir, conn) = open_temp();
        assert_eq!(MetaRepo::get(&conn, SELECTED_CITY).unwrap(), None);
        MetaRepo::set(&conn, SELECTED_CITY, "1301").unwrap();
        MetaRepo::set(&conn, SELECTED_CITY, "1609").unwrap();
        assert_eq!(MetaRepo::get(&conn, SELECTED_CITY).unwrap().as_deref(), Some("1609"));
    }
}
