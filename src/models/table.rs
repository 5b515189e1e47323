use chrono::{NaiveDate, NaiveTime, Timelike};
use std::collections::HashMap;
use thiserror::Error;

use super::PrayerName;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("prayer table for {date} is missing {prayer}")]
    MissingPrayer { date: NaiveDate, prayer: PrayerName },
    #[error("bad time '{value}' for {prayer}")]
    BadTime { prayer: PrayerName, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrayerEntry {
    pub name: PrayerName,
    pub time: NaiveTime,
}

/// One day of prayer times for one location. Entries are always held in
/// canonical order, one per prayer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrayerTable {
    pub location_id: String,
    pub location_name: Option<String>,
    pub date: NaiveDate,
    entries: [PrayerEntry; 7],
}

impl PrayerTable {
    /// Build a table from a name → time mapping. Seconds are truncated.
    /// Order of the input doesn't matter, but every prayer must be present.
    pub fn new(
        location_id: impl Into<String>,
        date: NaiveDate,
        times: impl IntoIterator<Item = (PrayerName, NaiveTime)>,
    ) -> Result<Self, TableError> {
        let times: HashMap<PrayerName, NaiveTime> = times.into_iter().collect();
        let mut entries = [PrayerEntry {
            name: PrayerName::Imsak,
            time: NaiveTime::MIN,
        }; 7];
        for (slot, name) in entries.iter_mut().zip(PrayerName::CANONICAL) {
            let time = times.get(&name).ok_or(TableError::MissingPrayer {
                date,
                prayer: name,
            })?;
            *slot = PrayerEntry {
                name,
                time: truncate_seconds(*time),
            };
        }
        Ok(Self {
            location_id: location_id.into(),
            location_name: None,
            date,
            entries,
        })
    }

    /// Build a table from `"HH:MM"` strings, as the content API delivers them.
    pub fn from_clock_strings<'a>(
        location_id: impl Into<String>,
        date: NaiveDate,
        times: impl IntoIterator<Item = (PrayerName, &'a str)>,
    ) -> Result<Self, TableError> {
        let parsed = times
            .into_iter()
            .map(|(name, s)| parse_clock(s).map(|t| (name, t)).ok_or_else(|| TableError::BadTime {
                prayer: name,
                value: s.to_string(),
            }))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(location_id, date, parsed)
    }

    pub fn with_location_name(mut self, name: impl Into<String>) -> Self {
        self.location_name = Some(name.into());
        self
    }

    pub fn entries(&self) -> &[PrayerEntry] {
        &self.entries
    }

    pub fn time_of(&self, prayer: PrayerName) -> NaiveTime {
        // entries are indexed by canonical position
        self.entries[prayer as usize].time
    }
}

/// Parse `"HH:MM"` (a trailing `":SS"` is accepted and dropped).
pub fn parse_clock(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
        .map(truncate_seconds)
}

fn truncate_seconds(t: NaiveTime) -> NaiveTime {
    t.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(t)
}
