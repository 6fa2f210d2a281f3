//! Site operating hours and holidays.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Opening window of one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayHours {
    pub weekday: Weekday,
    pub opening: NaiveTime,
    pub closing: NaiveTime,
    #[serde(default)]
    pub break_start: Option<NaiveTime>,
    #[serde(default)]
    pub break_end: Option<NaiveTime>,
}

impl WeekdayHours {
    pub fn span_hours(&self) -> u32 {
        let minutes = (self.closing - self.opening).num_minutes();
        if minutes <= 0 {
            0
        } else {
            (minutes / 60) as u32
        }
    }

    pub fn break_window(&self) -> Option<(NaiveTime, NaiveTime)> {
        match (self.break_start, self.break_end) {
            (Some(start), Some(end)) if start < end => Some((start, end)),
            _ => None,
        }
    }
}

/// Weekly opening-hours table of a site. Weekdays without a row are closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteHours {
    pub site_id: String,
    pub days: Vec<WeekdayHours>,
}

impl SiteHours {
    pub fn for_weekday(&self, weekday: Weekday) -> Option<&WeekdayHours> {
        self.days.iter().find(|d| d.weekday == weekday)
    }

    pub fn for_date(&self, date: NaiveDate) -> Option<&WeekdayHours> {
        self.for_weekday(date.weekday())
    }

    /// `(opening, closing)` as timestamps on `date`.
    pub fn window(&self, date: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.for_date(date)
            .filter(|h| h.opening < h.closing)
            .map(|h| (date.and_time(h.opening), date.and_time(h.closing)))
    }

    /// Longest opening-to-closing span of any open weekday.
    pub fn max_span_hours(&self) -> u32 {
        self.days.iter().map(WeekdayHours::span_hours).max().unwrap_or(0)
    }

    /// `opening <= start` and `start + hours <= closing` on the start's weekday.
    pub fn fits(&self, start: NaiveDateTime, hours: u32) -> bool {
        self.fits_range(start, start + chrono::Duration::hours(hours as i64))
    }

    /// `[start, end)` lies inside the opening window of the start's day.
    pub fn fits_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        match self.window(start.date()) {
            Some((opening, closing)) => start >= opening && end <= closing && start < end,
            None => false,
        }
    }
}

/// A day the site is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// `None` applies to every site.
    #[serde(default)]
    pub site_id: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub name: String,
}
