use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::errors::{LoanError, Result};

/// true unless `date` falls on the weekly rest day
pub fn is_working_day(date: NaiveDate, rest_day: Weekday) -> bool {
    date.weekday() != rest_day
}

/// working days in `(start, start + window_days]`, in order
pub fn working_days_after(start: NaiveDate, window_days: u32, rest_day: Weekday) -> Vec<NaiveDate> {
    (1..=window_days as i64)
        .map(|offset| start + Duration::days(offset))
        .filter(|date| is_working_day(*date, rest_day))
        .collect()
}

/// number of working days in `(start, start + window_days]`
pub fn count_working_days(start: NaiveDate, window_days: u32, rest_day: Weekday) -> u32 {
    working_days_after(start, window_days, rest_day).len() as u32
}

/// same day-of-month `months` later, clamped to the target month's last day
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    let total_months = date.month0() as i64 + months as i64;
    let year = date.year() as i64 + total_months / 12;
    let month = (total_months % 12) as u32 + 1;

    let year = i32::try_from(year)
        .map_err(|_| LoanError::invalid(format!("date out of range: {} + {} months", date, months)))?;
    let day = date.day().min(days_in_month(year, month));

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| LoanError::invalid(format!("date out of range: {} + {} months", date, months)))
}

/// signed number of days from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_working_days_reference_dates() {
        // tuesday: window dec 3 - jan 1 holds 4 sundays
        assert_eq!(count_working_days(date(2025, 12, 2), 30, Weekday::Sun), 26);
        // friday: window dec 6 - jan 4 holds 5 sundays
        assert_eq!(count_working_days(date(2025, 12, 5), 30, Weekday::Sun), 25);
    }

    #[test]
    fn test_working_days_every_weekday() {
        // 2025-12-01 is a monday
        let expected = [
            (1, 26), // mon: dec 2 - dec 31
            (2, 26), // tue
            (3, 26), // wed: dec 4 - jan 2
            (4, 26), // thu
            (5, 25), // fri: reaches sunday jan 4
            (6, 25), // sat
            (7, 26), // sun: dec 8 - jan 6, sundays 14/21/28/4
        ];
        for (day, count) in expected {
            assert_eq!(
                count_working_days(date(2025, 12, day), 30, Weekday::Sun),
                count,
                "start 2025-12-{:02}",
                day
            );
        }
    }

    #[test]
    fn test_window_excludes_start_day() {
        let days = working_days_after(date(2025, 12, 2), 30, Weekday::Sun);
        assert_eq!(days.first(), Some(&date(2025, 12, 3)));
        assert_eq!(days.last(), Some(&date(2026, 1, 1)));
        assert!(days.iter().all(|d| d.weekday() != Weekday::Sun));
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(add_months(date(2025, 1, 31), 1).unwrap(), date(2025, 2, 28));
        assert_eq!(add_months(date(2024, 1, 31), 1).unwrap(), date(2024, 2, 29));
        assert_eq!(add_months(date(2025, 3, 31), 1).unwrap(), date(2025, 4, 30));
        assert_eq!(add_months(date(2025, 1, 31), 2).unwrap(), date(2025, 3, 31));
        assert_eq!(add_months(date(2025, 12, 15), 1).unwrap(), date(2026, 1, 15));
        assert_eq!(add_months(date(2025, 11, 30), 3).unwrap(), date(2026, 2, 28));
    }

    #[test]
    fn test_leap_year() {
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2025));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(date(2025, 12, 2), date(2026, 1, 1)), 30);
        assert_eq!(days_between(date(2026, 1, 1), date(2025, 12, 2)), -30);
    }
}
