use anyhow::{anyhow, Result};
use chrono::{Duration, FixedOffset, NaiveDate, NaiveTime};
use salah::prelude::*;

use super::provider::{ContentError, ContentProvider};
use crate::models::{PrayerName, PrayerTable};

/// Imsak sits this long before Subuh in the Kemenag tables.
const IMSAK_LEAD_MINUTES: i64 = 10;

/// Offline prayer times computed from coordinates, used when the API
/// can't be reached.
pub struct PrayerCalculator {
    pub lat: f64,
    pub lng: f64,
    pub method_str: String,
    pub madhab_str: String,
    pub tz_offset_minutes: i32,
}

impl PrayerCalculator {
    pub fn new(
        lat: f64,
        lng: f64,
        method: &str,
        madhab: &str,
        tz_offset_minutes: i32,
    ) -> Result<Self> {
        // Validate method + madhab early
        parse_method(method)?;
        parse_madhab(madhab)?;
        FixedOffset::east_opt(tz_offset_minutes * 60)
            .ok_or_else(|| anyhow!("Invalid timezone offset: {}", tz_offset_minutes))?;
        Ok(Self {
            lat,
            lng,
            method_str: method.to_string(),
            madhab_str: madhab.to_string(),
            tz_offset_minutes,
        })
    }

    fn compute_times(&self, date: NaiveDate) -> Result<Vec<(PrayerName, NaiveTime)>> {
        let coords = Coordinates::new(self.lat, self.lng);
        let method = parse_method(&self.method_str)?;
        let madhab = parse_madhab(&self.madhab_str)?;
        let params = Configuration::with(method, madhab);

        let times = PrayerSchedule::new()
            .on(date)
            .for_location(coords)
            .with_configuration(params)
            .calculate()
            .map_err(|e| anyhow!("Prayer calculation failed: {}", e))?;

        let offset = FixedOffset::east_opt(self.tz_offset_minutes * 60)
            .ok_or_else(|| anyhow!("Invalid timezone offset: {}", self.tz_offset_minutes))?;

        let to_local = |utc: chrono::DateTime<chrono::Utc>| -> NaiveTime {
            utc.with_timezone(&offset).time()
        };

        let subuh = to_local(times.time(Prayer::Fajr));
        // wraps past midnight on purpose for far-north locations
        let imsak = subuh - Duration::minutes(IMSAK_LEAD_MINUTES);

        Ok(vec![
            (PrayerName::Imsak, imsak),
            (PrayerName::Subuh, subuh),
            (PrayerName::Terbit, to_local(times.time(Prayer::Sunrise))),
            (PrayerName::Dzuhur, to_local(times.time(Prayer::Dhuhr))),
            (PrayerName::Ashar, to_local(times.time(Prayer::Asr))),
            (PrayerName::Maghrib, to_local(times.time(Prayer::Maghrib))),
            (PrayerName::Isya, to_local(times.time(Prayer::Isha))),
        ])
    }
}

impl ContentProvider for PrayerCalculator {
    fn fetch_table(&self, location_id: &str, date: NaiveDate) -> Result<PrayerTable, ContentError> {
        let times = self
            .compute_times(date)
            .map_err(|e| ContentError::Calculation(format!("{:#}", e)))?;
        Ok(PrayerTable::new(location_id, date, times)?)
    }
}

fn parse_method(s: &str) -> Result<Method> {
    match s {
        "MuslimWorldLeague" => Ok(Method::MuslimWorldLeague),
        "Egyptian" => Ok(Method::Egyptian),
        "Karachi" => Ok(Method::Karachi),
        "UmmAlQura" => Ok(Method::UmmAlQura),
        "Dubai" => Ok(Method::Dubai),
        "MoonsightingCommittee" => Ok(Method::MoonsightingCommittee),
        "NorthAmerica" => Ok(Method::NorthAmerica),
        "Kuwait" => Ok(Method::Kuwait),
        "Qatar" => Ok(Method::Qatar),
        "Singapore" => Ok(Method::Singapore),
        "Tehran" => Ok(Method::Tehran),
        "Turkey" => Ok(Method::Turkey),
        "Other" => Ok(Method::Other),
        _ => Err(anyhow!("Unknown calculation method: '{}'", s)),
    }
}

fn parse_madhab(s: &str) -> Result<Madhab> {
    match s {
        "Hanafi" => Ok(Madhab::Hanafi),
        "Shafi" | "Shafi'i" => Ok(Madhab::Shafi),
        _ => Err(anyhow!("Unknown madhab: '{}'", s)),
    }
}
