use chrono::NaiveDate;
use log::{debug, info, warn};
use rusqlite::Connection;
use thiserror::Error;

use crate::db::repository::CacheRepo;
use crate::models::{PrayerTable, TableError};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("content provider rejected the request: {0}")]
    Rejected(String),
    #[error("malformed prayer table: {0}")]
    Table(#[from] TableError),
    #[error("prayer calculation failed: {0}")]
    Calculation(String),
}

/// Source of prayer tables for a (location, date).
pub trait ContentProvider {
    fn fetch_table(&self, location_id: &str, date: NaiveDate) -> Result<PrayerTable, ContentError>;
}

/// Best-effort cache then refetch. A fresh fetch wins and refreshes the
/// cache; a failed fetch falls back to whatever was cached. Errors stop
/// here: callers only see "table or no table".
pub fn load_table(
    conn: &Connection,
    provider: &dyn ContentProvider,
    location_id: &str,
    date: NaiveDate,
) -> Option<PrayerTable> {
    match provider.fetch_table(location_id, date) {
        Ok(table) => {
            info!("fetched prayer table for {} on {}", location_id, date);
            if let Err(e) = CacheRepo::store_table(conn, &table) {
                warn!("could not cache prayer table: {:#}", e);
            }
            Some(table)
        }
        Err(fetch_err) => match CacheRepo::get_table(conn, location_id, date) {
            Ok(Some(table)) => {
                debug!("using cached table after fetch error: {}", fetch_err);
                Some(table)
            }
            Ok(None) => {
                warn!("no prayer table for {} on {}: {}", location_id, date, fetch_err);
                None
            }
            Err(cache_err) => {
                warn!("fetch failed ({}) and cache unreadable ({:#})", fetch_err, cache_err);
                None
            }
        },
    }
}
