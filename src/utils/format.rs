use chrono::NaiveTime;

/// Format seconds as "HH:MM:SS". Hours are not wrapped at 24; negative
/// input is treated as zero.
pub fn format_countdown(secs: i64) -> String {
    let secs = secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Format a NaiveTime to "HH:MM"
pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_formats() {
        assert_eq!(format_countdown(0), "00:00:00");
        assert_eq!(format_countdown(3661), "01:01:01");
        assert_eq!(format_countdown(86399), "23:59:59");
        assert_eq!(format_countdown(100 * 3600 + 5), "100:00:05");
        assert_eq!(format_countdown(-30), "00:00:00");
    }

    #[test]
    fn time_formats() {
        let t = NaiveTime::from_hms_opt(4, 5, 59).unwrap();
        assert_eq!(format_time(t), "04:05");
    }
}
