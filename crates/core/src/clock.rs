//! Server-local time formatting for chat output

use chrono::{DateTime, Local, TimeZone};

fn local(timestamp: i64) -> Option<DateTime<Local>> {
    Local.timestamp_opt(timestamp, 0).single()
}

/// `MM/DD/YYYY HH:MM`, used for ban expiries
pub fn format_expiry(timestamp: i64) -> String {
    local(timestamp)
        .map(|t| t.format("%m/%d/%Y %H:%M").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// `DD/MM/YYYY`, used for first-visit dates
pub fn format_date(timestamp: i64) -> String {
    local(timestamp)
        .map(|t| t.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// `HH:MM`
pub fn format_time_of_day(timestamp: i64) -> String {
    local(timestamp)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_have_expected_shape() {
        let ts = 1_700_000_000;
        let expiry = format_expiry(ts);
        assert_eq!(expiry.len(), "11/14/2023 22:13".len());
        assert!(expiry.contains("/2023 "));

        assert_eq!(format_date(ts).len(), "14/11/2023".len());
        assert_eq!(format_time_of_day(ts).len(), 5);
    }

    #[test]
    fn test_out_of_range_falls_back_to_number() {
        assert_eq!(format_expiry(i64::MAX), i64::MAX.to_string());
    }
}
