use chrono::{Datelike, Duration, NaiveDate};
use hijri_date::HijriDate;

/// Islamic month names as used on Indonesian calendars (index 0 = Muharram)
const HIJRI_MONTH_NAMES: &[&str] = &[
    "Muharram",
    "Safar",
    "Rabiul Awal",
    "Rabiul Akhir",
    "Jumadil Awal",
    "Jumadil Akhir",
    "Rajab",
    "Sya'ban",
    "Ramadhan",
    "Syawal",
    "Dzulqa'dah",
    "Dzulhijjah",
];

fn hijri_month_name(month: usize) -> &'static str {
    if (1..=12).contains(&month) {
        HIJRI_MONTH_NAMES[month - 1]
    } else {
        "?"
    }
}

/// Hijri date for `date`, shifted by `offset_days` for local moon sighting.
/// `None` if the date is outside what the converter supports.
pub fn hijri_string(date: NaiveDate, offset_days: i32) -> Option<String> {
    let adjusted = date + Duration::days(offset_days as i64);
    HijriDate::from_gr(
        adjusted.year() as usize,
        adjusted.month() as usize,
        adjusted.day() as usize,
    )
    .ok()
    .map(|hd| format!("{} {} {} H", hd.day(), hijri_month_name(hd.month()), hd.year()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_names_are_bounded() {
        assert_eq!(hijri_month_name(9), "Ramadhan");
        assert_eq!(hijri_month_name(0), "?");
        assert_eq!(hijri_month_name(13), "?");
    }

    #[test]
    fn offset_moves_the_day() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let base = hijri_string(date, 0).unwrap();
        let shifted = hijri_string(date, 1).unwrap();
        assert!(base.ends_with(" H"));
        assert_ne!(base, shifted);
    }
}
