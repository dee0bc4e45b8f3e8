pub use chrono;
pub mod range;

use chrono::{Datelike as _, Duration, NaiveDate, Weekday};

const DISPLAY_FMT: &str = "%d/%m/%Y";
const QUERY_FMT: &str = "%Y-%m-%d";

/// Monday-aligned days of the given ISO week, or `None` if the pair does not name a week.
pub fn week_days(year: i32, week: u32) -> Option<[NaiveDate; 7]> {
    let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
    let mut days = [monday; 7];
    for (offset, day) in days.iter_mut().enumerate() {
        *day = monday + Duration::days(offset as i64);
    }
    Some(days)
}

/// ISO (year, week) the date belongs to. Inverse of [`week_days`].
pub fn iso_week_of(date: NaiveDate) -> (i32, u32) {
    let week = date.iso_week();
    (week.year(), week.week())
}

pub fn at_monday(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).first_day()
}

pub fn fmt_display(date: &NaiveDate) -> String {
    date.format(DISPLAY_FMT).to_string()
}

pub fn fmt_query(date: &NaiveDate) -> String {
    date.format(QUERY_FMT).to_string()
}

pub fn parse_query(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), QUERY_FMT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_days_are_consecutive() {
        for year in [2023, 2024, 2025, 2026] {
            for week in 1..=52 {
                let days = week_days(year, week).unwrap();
                assert_eq!(days[0].weekday(), Weekday::Mon);
                for pair in days.windows(2) {
                    assert_eq!(pair[1] - pair[0], Duration::days(1));
                }
            }
        }
    }

    #[test]
    fn test_week_round_trip() {
        for year in [2020, 2021, 2024, 2026] {
            for week in 1..=52 {
                let days = week_days(year, week).unwrap();
                assert_eq!(iso_week_of(days[0]), (year, week));
                assert_eq!(iso_week_of(days[6]), (year, week));
            }
        }
    }

    #[test]
    fn test_first_week_may_start_in_previous_year() {
        let days = week_days(2025, 1).unwrap();
        assert_eq!(days[0], date(2024, 12, 30));
        assert_eq!(days[6], date(2025, 1, 5));
    }

    #[test]
    fn test_invalid_week() {
        assert!(week_days(2024, 0).is_none());
        assert!(week_days(2025, 53).is_none());
    }

    #[test]
    fn test_formats() {
        let d = date(2024, 3, 7);
        assert_eq!(fmt_display(&d), "07/03/2024");
        assert_eq!(fmt_query(&d), "2024-03-07");
        assert_eq!(parse_query("2024-03-07"), Some(d));
        assert_eq!(parse_query("07/03/2024"), None);
    }

    #[test]
    fn test_at_monday() {
        assert_eq!(at_monday(date(2024, 3, 10)), date(2024, 3, 4));
        assert_eq!(at_monday(date(2024, 3, 4)), date(2024, 3, 4));
    }
}
