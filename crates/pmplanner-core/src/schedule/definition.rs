//! Recurring maintenance definitions and their frequency rule table.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::{Priority, ResourcePlan};

/// How often a definition recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Bimonthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl Frequency {
    /// Whether a block is due on `date`.
    ///
    /// Fixed rule table: weekly work lands on Mondays, biweekly on the 1st and
    /// 16th, everything coarser on the 1st of the qualifying months.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        let day = date.day();
        let month = date.month();
        match self {
            Frequency::Daily => true,
            Frequency::Weekly => date.weekday() == Weekday::Mon,
            Frequency::Biweekly => day == 1 || day == 16,
            Frequency::Monthly => day == 1,
            Frequency::Bimonthly => day == 1 && month % 2 == 0,
            Frequency::Quarterly => day == 1 && matches!(month, 1 | 4 | 7 | 10),
            Frequency::Semiannual => day == 1 && matches!(month, 1 | 7),
            Frequency::Annual => day == 1 && month == 1,
        }
    }

    /// Days of `days` on which this frequency applies.
    pub fn select(&self, days: &[NaiveDate]) -> Vec<NaiveDate> {
        days.iter().copied().filter(|d| self.applies_on(*d)).collect()
    }
}

/// How long one occurrence takes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DurationRule {
    FixedHours { hours: u32 },
    AreaYield { area: f64, yield_rate: f64 },
}

impl DurationRule {
    /// Block length in whole hours, at least 1.
    ///
    /// Returns `None` when the area/yield rule cannot be evaluated; callers
    /// substitute their fallback length.
    pub fn block_hours(&self) -> Option<u32> {
        match *self {
            DurationRule::FixedHours { hours } => Some(hours.max(1)),
            DurationRule::AreaYield { area, yield_rate } => {
                if !(yield_rate > 0.0) || !area.is_finite() {
                    return None;
                }
                let hours = (area / yield_rate).round();
                Some(if hours < 1.0 { 1 } else { hours as u32 })
            }
        }
    }
}

/// A recurring maintenance definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub id: String,
    pub site_id: String,
    pub description: String,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub element_id: Option<String>,
    pub frequency: Frequency,
    #[serde(default)]
    pub priority: Priority,
    pub duration: DurationRule,
    #[serde(default)]
    pub workers: BTreeSet<String>,
    #[serde(default)]
    pub supervisor_id: Option<String>,
    #[serde(default)]
    pub resource_plan: ResourcePlan,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
