use crate::error::{Result, WorklogError};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Weekday};

/// Accepted input formats for `--date` style arguments, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

/// Parse a user-supplied date string.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(WorklogError::Date(format!(
        "could not parse '{trimmed}' (expected YYYY-MM-DD, DD/MM/YYYY, or MM/DD/YYYY)"
    )))
}

/// Inclusive start/end timestamps covering a single day.
pub fn day_range(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let end = date.and_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(start);
    (start, end)
}

/// Range covering the ISO week containing `date` (Monday through Sunday).
pub fn week_range(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let monday = date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64);
    let sunday = monday + chrono::Duration::days(6);
    (day_range(monday).0, day_range(sunday).1)
}

/// Range covering the calendar month containing `date`.
pub fn month_range(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let first = date.with_day(1).unwrap_or(date);
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    let last = next_month
        .map(|d| d - chrono::Duration::days(1))
        .unwrap_or(first);
    (day_range(first).0, day_range(last).1)
}

/// Resolve a week argument to the Monday of that week.
///
/// Accepts `YYYY-Wnn` (e.g. `2026-W35`) or a bare week number, which is
/// interpreted against the current year.
pub fn parse_week(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    let (year, week) = if let Some((y, w)) = trimmed.split_once("-W").or_else(|| trimmed.split_once("-w")) {
        let year: i32 = y
            .parse()
            .map_err(|_| WorklogError::Date(format!("invalid week year in '{trimmed}'")))?;
        let week: u32 = w
            .parse()
            .map_err(|_| WorklogError::Date(format!("invalid week number in '{trimmed}'")))?;
        (year, week)
    } else {
        let week: u32 = trimmed
            .parse()
            .map_err(|_| WorklogError::Date(format!("invalid week '{trimmed}' (expected YYYY-Wnn or a week number)")))?;
        (Local::now().year(), week)
    };
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
        .ok_or_else(|| WorklogError::Date(format!("week {week} does not exist in {year}")))
}

const MONTH_NAMES: &[&str] = &[
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Resolve a month argument to the first day of that month.
///
/// Accepts `YYYY-MM`, a month name ("march" or "mar"), or a bare month
/// number; names and numbers are interpreted against the current year.
pub fn parse_month(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    if let Some((y, m)) = trimmed.split_once('-') {
        if let (Ok(year), Ok(month)) = (y.parse::<i32>(), m.parse::<u32>()) {
            return NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| WorklogError::Date(format!("invalid month '{trimmed}'")));
        }
    }
    if let Ok(month) = trimmed.parse::<u32>() {
        return NaiveDate::from_ymd_opt(Local::now().year(), month, 1)
            .ok_or_else(|| WorklogError::Date(format!("invalid month number {month}")));
    }
    let lower = trimmed.to_lowercase();
    for (i, name) in MONTH_NAMES.iter().enumerate() {
        if *name == lower || (lower.len() >= 3 && name.starts_with(&lower)) {
            let month = (i + 1) as u32;
            return NaiveDate::from_ymd_opt(Local::now().year(), month, 1)
                .ok_or_else(|| WorklogError::Date(format!("invalid month '{trimmed}'")));
        }
    }
    Err(WorklogError::Date(format!(
        "could not parse month '{trimmed}' (expected YYYY-MM, a month name, or 1-12)"
    )))
}

/// Human-readable duration, e.g. "2h 05m" or "45m".
pub fn format_duration(seconds: i64) -> String {
    let total_minutes = seconds.max(0) / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(parse_date("2026-03-14").unwrap(), expected);
        assert_eq!(parse_date("14/03/2026").unwrap(), expected);
        assert_eq!(parse_date("03/14/2026").unwrap(), expected);
        assert!(parse_date("not a date").is_err());
    }

    #[test]
    fn test_day_range_covers_whole_day() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let (start, end) = day_range(date);
        assert_eq!(start.to_string(), "2026-01-05 00:00:00");
        assert!(end > start);
        assert_eq!(end.date(), date);
    }

    #[test]
    fn test_week_range_monday_to_sunday() {
        // 2026-08-27 is a Thursday
        let date = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
        let (start, end) = week_range(date);
        assert_eq!(start.date().weekday(), Weekday::Mon);
        assert_eq!(end.date().weekday(), Weekday::Sun);
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2026, 8, 24).unwrap());
        assert_eq!(end.date(), NaiveDate::from_ymd_opt(2026, 8, 30).unwrap());
    }

    #[test]
    fn test_month_range_handles_leap_february() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        let (start, end) = month_range(date);
        assert_eq!(start.date().day(), 1);
        assert_eq!(end.date().day(), 29);

        let dec = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        let (_, dec_end) = month_range(dec);
        assert_eq!(dec_end.date(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_parse_week() {
        let monday = parse_week("2026-W35").unwrap();
        assert_eq!(monday.weekday(), Weekday::Mon);
        assert_eq!(monday.iso_week().week(), 35);
        assert_eq!(monday.iso_week().year(), 2026);

        let bare = parse_week("10").unwrap();
        assert_eq!(bare.weekday(), Weekday::Mon);
        assert_eq!(bare.iso_week().week(), 10);

        assert!(parse_week("2026-W60").is_err());
        assert!(parse_week("garbage").is_err());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(
            parse_month("2026-03").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        let march = parse_month("march").unwrap();
        assert_eq!(march.month(), 3);
        let sep = parse_month("sep").unwrap();
        assert_eq!(sep.month(), 9);
        let by_number = parse_month("11").unwrap();
        assert_eq!(by_number.month(), 11);

        assert!(parse_month("13").is_err());
        assert!(parse_month("smarch").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(59), "0m");
        assert_eq!(format_duration(60), "1m");
        assert_eq!(format_duration(3600), "1h 00m");
        assert_eq!(format_duration(7500), "2h 05m");
        assert_eq!(format_duration(-5), "0m");
    }
}
