//! Calendar helpers shared by the generator, the guard and the logistics grid.
//!
//! Every "which week is this" question goes through [`week_start`], so the
//! capacity checks and the logistics grid agree on Monday-anchored weeks.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// A scheduling period (calendar month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Create a validated period.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ValidationError::InvalidPeriod { year, month }.into());
        }
        Ok(Self { year, month })
    }

    /// Period containing the given date.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First calendar day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// First calendar day of the following month.
    pub fn next_first_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
    }

    /// Last calendar day of the month.
    pub fn last_day(&self) -> NaiveDate {
        self.next_first_day().pred_opt().unwrap_or(NaiveDate::MIN)
    }

    /// All calendar days of the month, in order.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.first_day()
            .iter_days()
            .take_while(|d| d.month() == self.month)
            .collect()
    }

    /// `[first day 00:00, next month 00:00)`
    pub fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        (start_of_day(self.first_day()), start_of_day(self.next_first_day()))
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// `[Monday 00:00, next Monday 00:00)` of the week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let monday = week_start(date);
    (start_of_day(monday), start_of_day(monday + Duration::days(7)))
}

/// Midnight at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap_or(NaiveDateTime::MIN)
}

/// Half-open interval intersection test.
#[inline]
pub fn intervals_overlap(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Days Monday..=Saturday of the week starting at `monday`.
pub fn working_week(monday: NaiveDate) -> [NaiveDate; 6] {
    std::array::from_fn(|i| monday + Duration::days(i as i64))
}

/// Parse a weekday name ("Mon", "monday", ...).
pub fn parse_weekday(value: &str) -> Result<Weekday> {
    value.parse::<Weekday>().map_err(|_| {
        ValidationError::InvalidValue {
            field: "weekday".to_string(),
            message: format!("'{value}' is not a weekday"),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_start_is_monday_on_or_before() {
        // 2025-03-05 is a Wednesday
        assert_eq!(week_start(date(2025, 3, 5)), date(2025, 3, 3));
        assert_eq!(week_start(date(2025, 3, 3)), date(2025, 3, 3));
        // Sunday belongs to the week that started six days earlier
        assert_eq!(week_start(date(2025, 3, 9)), date(2025, 3, 3));
    }

    #[test]
    fn period_days_cover_whole_month() {
        let feb = Period::new(2024, 2).unwrap();
        let days = feb.days();
        assert_eq!(days.len(), 29);
        assert_eq!(days[0], date(2024, 2, 1));
        assert_eq!(feb.last_day(), date(2024, 2, 29));

        let dec = Period::new(2025, 12).unwrap();
        assert_eq!(dec.next_first_day(), date(2026, 1, 1));
    }

    #[test]
    fn invalid_period_is_rejected() {
        assert!(Period::new(2025, 0).is_err());
        assert!(Period::new(2025, 13).is_err());
    }

    #[test]
    fn overlap_is_half_open() {
        let a = date(2025, 3, 3).and_hms_opt(8, 0, 0).unwrap();
        let b = date(2025, 3, 3).and_hms_opt(10, 0, 0).unwrap();
        let c = date(2025, 3, 3).and_hms_opt(12, 0, 0).unwrap();
        assert!(!intervals_overlap(a, b, b, c));
        assert!(intervals_overlap(a, c, b, c));
    }

    #[test]
    fn weekday_names_parse() {
        assert_eq!(parse_weekday("Mon").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("saturday").unwrap(), Weekday::Sat);
        assert!(parse_weekday("someday").is_err());
    }
}
