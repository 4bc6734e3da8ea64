//! Business-day calendar
//!
//! This module contains the calendar interface the simulation clock advances
//! through, and the default weekday calendar with a holiday list.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;
use std::fmt::Debug;
use tracing::debug;

use crate::simulation::error::{SimulationError, SimulationResult};

/// Longest run of consecutive non-business days a calendar may contain
const MAX_NON_BUSINESS_RUN: i64 = 366;

/// Answers business-day queries for the simulation clock
pub trait BusinessCalendar: Debug {
    /// Whether clinic operations happen on `date`
    fn is_business_day(&self, date: NaiveDate) -> bool;

    /// Advance `date` by `n` business days
    ///
    /// The result is always a business day, even when `date` is not.
    fn add_business_days(&self, date: NaiveDate, n: u32) -> SimulationResult<NaiveDate> {
        let mut current = date;
        for _ in 0..n {
            current = self.next_business_day_after(current)?;
        }
        Ok(current)
    }

    /// `date` itself if it is a business day, else the next one
    fn first_business_day_on_or_after(&self, date: NaiveDate) -> SimulationResult<NaiveDate> {
        if self.is_business_day(date) {
            Ok(date)
        } else {
            self.next_business_day_after(date)
        }
    }

    /// The first business day strictly after `date`
    fn next_business_day_after(&self, date: NaiveDate) -> SimulationResult<NaiveDate> {
        let mut candidate = date;
        for _ in 0..MAX_NON_BUSINESS_RUN {
            candidate = candidate.checked_add_signed(Duration::days(1)).ok_or_else(|| {
                SimulationError::calendar_error(format!("date overflow after {}", date))
            })?;
            if self.is_business_day(candidate) {
                return Ok(candidate);
            }
        }
        Err(SimulationError::calendar_error(format!(
            "no business day within {} days after {}",
            MAX_NON_BUSINESS_RUN, date
        )))
    }
}

/// Monday to Friday, minus configured holidays
#[derive(Debug, Clone, Default)]
pub struct WeekdayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WeekdayCalendar {
    /// Create a calendar with no holidays
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a calendar with the given holidays
    pub fn with_holidays<I>(holidays: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let holidays: BTreeSet<NaiveDate> = holidays.into_iter().collect();
        debug!("Weekday calendar with {} holidays", holidays.len());
        Self { holidays }
    }

    /// Whether `date` is a configured holiday
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

impl BusinessCalendar for WeekdayCalendar {
    fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Rejects every date
    #[derive(Debug)]
    struct ClosedCalendar;

    impl BusinessCalendar for ClosedCalendar {
        fn is_business_day(&self, _date: NaiveDate) -> bool {
            false
        }
    }

    #[test]
    fn test_weekends_are_not_business_days() {
        let calendar = WeekdayCalendar::new();
        assert!(calendar.is_business_day(date(2021, 1, 8))); // Friday
        assert!(!calendar.is_business_day(date(2021, 1, 9))); // Saturday
        assert!(!calendar.is_business_day(date(2021, 1, 10))); // Sunday
        assert!(calendar.is_business_day(date(2021, 1, 11))); // Monday
    }

    #[test]
    fn test_add_business_days_skips_weekend() {
        let calendar = WeekdayCalendar::new();
        assert_eq!(calendar.add_business_days(date(2021, 1, 8), 1).unwrap(), date(2021, 1, 11));
        assert_eq!(calendar.add_business_days(date(2021, 1, 4), 5).unwrap(), date(2021, 1, 11));
        assert_eq!(calendar.add_business_days(date(2021, 1, 4), 0).unwrap(), date(2021, 1, 4));
    }

    #[test]
    fn test_add_business_days_skips_holidays() {
        let calendar = WeekdayCalendar::with_holidays([date(2021, 1, 1), date(2021, 1, 4)]);
        assert_eq!(calendar.add_business_days(date(2020, 12, 31), 1).unwrap(), date(2021, 1, 5));
    }

    #[test]
    fn test_first_business_day_on_or_after() {
        let calendar = WeekdayCalendar::with_holidays([date(2021, 1, 4)]);
        assert_eq!(calendar.first_business_day_on_or_after(date(2021, 1, 5)).unwrap(), date(2021, 1, 5));
        // Saturday, Sunday and a Monday holiday
        assert_eq!(calendar.first_business_day_on_or_after(date(2021, 1, 2)).unwrap(), date(2021, 1, 5));
    }

    #[test]
    fn test_closed_calendar_fails_instead_of_looping() {
        let result = ClosedCalendar.add_business_days(date(2021, 1, 4), 1);
        assert!(matches!(result, Err(SimulationError::CalendarError(_))));
    }
}
