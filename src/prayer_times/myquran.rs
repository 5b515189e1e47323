use chrono::NaiveDate;
use log::debug;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use super::provider::{ContentError, ContentProvider};
use crate::models::{PrayerName, PrayerTable};

pub const DEFAULT_BASE_URL: &str = "https://api.myquran.com/v2";

#[derive(Debug, Deserialize)]
struct Envelope {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ScheduleData {
    #[serde(default)]
    lokasi: Option<String>,
    jadwal: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct CityRow {
    id: Value,
    lokasi: String,
}

/// myquran.com prayer schedule API (Kemenag data for Indonesian cities).
pub struct MyQuranClient {
    client: Client,
    base_url: String,
}

impl MyQuranClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ContentError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn search_city(&self, keyword: &str) -> Result<Vec<City>, ContentError> {
        let url = format!("{}/sholat/kota/cari/{}", self.base_url, keyword.trim());
        let body = self.get(&url)?;
        parse_cities(&body)
    }

    fn get(&self, url: &str) -> Result<String, ContentError> {
        debug!("GET {}", url);
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        Ok(body)
    }
}

impl ContentProvider for MyQuranClient {
    fn fetch_table(&self, location_id: &str, date: NaiveDate) -> Result<PrayerTable, ContentError> {
        let url = format!(
            "{}/sholat/jadwal/{}/{}",
            self.base_url,
            location_id,
            date.format("%Y/%m/%d")
        );
        let body = self.get(&url)?;
        parse_schedule(location_id, date, &body)
    }
}

fn unwrap_envelope(body: &str) -> Result<Value, ContentError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    if !envelope.status {
        return Err(ContentError::Rejected(
            envelope.message.unwrap_or_else(|| "status false".to_string()),
        ));
    }
    envelope
        .data
        .ok_or_else(|| ContentError::Rejected("response has no data".to_string()))
}

pub(crate) fn parse_schedule(
    location_id: &str,
    date: NaiveDate,
    body: &str,
) -> Result<PrayerTable, ContentError> {
    let data: ScheduleData = serde_json::from_value(unwrap_envelope(body)?)?;
    // dhuha and the date fields are ignored; absent prayers surface as
    // TableError::MissingPrayer
    let times = PrayerName::CANONICAL.into_iter().filter_map(|name| {
        data.jadwal
            .get(name.as_str())
            .and_then(Value::as_str)
            .map(|s| (name, s))
    });
    let table = PrayerTable::from_clock_strings(location_id, date, times)?;
    Ok(match data.lokasi {
        Some(name) => table.with_location_name(name),
        None => table,
    })
}

pub(crate) fn parse_cities(body: &str) -> Result<Vec<City>, ContentError> {
    let rows: Vec<CityRow> = serde_json::from_value(unwrap_envelope(body)?)?;
    Ok(rows
        .into_iter()
        .map(|row| City {
            id: match row.id {
                Value::String(s) => s,
                other => other.to_string(),
            },
            name: row.lokasi,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableError;
    use chrono::NaiveTime;

    const SCHEDULE: &str = r#"{
        "status": true,
        "request": {"path": "/sholat/jadwal/1301/2026/10/19"},
        "data": {
            "id": "1301",
            "lokasi": "KOTA JAKARTA",
            "daerah": "DKI JAKARTA",
            "jadwal": {
                "tanggal": "Senin, 19/10/2026",
                "imsak": "04:05",
                "subuh": "04:15",
                "terbit": "05:33",
                "dhuha": "06:01",
                "dzuhur": "11:41",
                "ashar": "14:58",
                "maghrib": "17:49",
                "isya": "18:59",
                "date": "2026-10-19"
            }
        }
    }"#;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn parses_schedule_response() {
        let table = parse_schedule("1301", date(), SCHEDULE).unwrap();
        assert_eq!(table.location_name.as_deref(), Some("KOTA JAKARTA"));
        assert_eq!(
            table.time_of(PrayerName::Maghrib),
            NaiveTime::from_hms_opt(17, 49, 0).unwrap()
        );
    }

    #[test]
    fn missing_key_is_an_error() {
        let body = SCHEDULE.replace("\"isya\": \"18:59\",", "");
        let err = parse_schedule("1301", date(), &body).unwrap_err();
        assert!(matches!(
            err,
            ContentError::Table(TableError::MissingPrayer { prayer: PrayerName::Isya, .. })
        ));
    }

    #[test]
    fn status_false_is_rejected() {
        let body = r#"{"status": false, "message": "kota tidak ditemukan"}"#;
        let err = parse_schedule("9999", date(), body).unwrap_err();
        assert!(matches!(err, ContentError::Rejected(m) if m == "kota tidak ditemukan"));
    }

    #[test]
    fn parses_city_search() {
        let body = r#"{"status": true, "data": [
            {"id": "1301", "lokasi": "KOTA JAKARTA"},
            {"id": 1107, "lokasi": "KAB. BANDUNG"}
        ]}"#;
        let cities = parse_cities(body).unwrap();
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[1].id, "1107");
        assert_eq!(cities[0].name, "KOTA JAKARTA");
    }
}
