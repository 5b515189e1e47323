use anyhow::Result;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("
        CREATE TABLE IF NOT EXISTS prayer_table_cache (
            location_id   TEXT NOT NULL,
            date          TEXT NOT NULL,
            location_name TEXT,
            imsak         TEXT NOT NULL,
            subuh         TEXT NOT NULL,
            terbit        TEXT NOT NULL,
            dzuhur        TEXT NOT NULL,
            ashar         TEXT NOT NULL,
            maghrib       TEXT NOT NULL,
            isya          TEXT NOT NULL,
            fetched_at    TEXT DEFAULT (datetime('now')),
            PRIMARY KEY (location_id, date)
        );

        CREATE TABLE IF NOT EXISTS alarms (
            prayer   TEXT PRIMARY KEY
                     CHECK(prayer IN ('imsak','subuh','terbit','dzuhur','ashar','maghrib','isya')),
            enabled  INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS app_meta (
            key   TEXT PRIMARY KEY,
            value TEXT
        );
    ")?;
    Ok(())
}
