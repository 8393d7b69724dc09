//! Calendar helpers shared by recurrence and projection code.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("expected YYYY-MM, got `{0}`")]
    InvalidFormat(String),
}

/// Number of days in the given month, accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Returns `day` within the month, clamped to the month's last day.
pub fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let day = day.min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Adds whole days, returning `None` past the representable range.
pub fn add_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}

/// A calendar month, the unit of projection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, CalendarError> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.days())
    }

    /// The configured day-of-month, clamped for short months.
    pub fn clamped_day(&self, day: u32) -> Option<NaiveDate> {
        clamped_date(self.year, self.month, day)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Every date of the month in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (1..=self.days()).filter_map(move |day| NaiveDate::from_ymd_opt(self.year, self.month, day))
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = CalendarError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (year, month) = value
            .trim()
            .split_once('-')
            .ok_or_else(|| CalendarError::InvalidFormat(value.to_string()))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| CalendarError::InvalidFormat(value.to_string()))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| CalendarError::InvalidFormat(value.to_string()))?;
        Self::new(year, month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn february_respects_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
    }

    #[test]
    fn clamped_date_falls_back_to_month_end() {
        assert_eq!(
            clamped_date(2025, 4, 31),
            NaiveDate::from_ymd_opt(2025, 4, 30)
        );
        assert_eq!(
            clamped_date(2024, 2, 30),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn year_month_parses_and_rolls_over() {
        let month: YearMonth = "2025-12".parse().unwrap();
        assert_eq!(month.next(), YearMonth::new(2026, 1).unwrap());
        assert_eq!(month.to_string(), "2025-12");
        assert!("2025-13".parse::<YearMonth>().is_err());
        assert!("december".parse::<YearMonth>().is_err());
    }

    #[test]
    fn dates_cover_the_whole_month() {
        let month = YearMonth::new(2025, 9).unwrap();
        let dates: Vec<_> = month.dates().collect();
        assert_eq!(dates.len(), 30);
        assert_eq!(dates.first().copied(), month.first_day());
        assert_eq!(dates.last().copied(), month.last_day());
    }
}
