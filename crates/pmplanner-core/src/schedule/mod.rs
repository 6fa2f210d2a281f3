//! Schedule types: work items, manual block requests and their shared parts.
//!
//! A [`WorkItem`] is a DRAFT until it is published; published items are
//! terminal and are never edited, split or deleted by this crate.

mod definition;
mod hours;

pub use definition::{Definition, DurationRule, Frequency};
pub use hours::{Holiday, SiteHours, WeekdayHours};

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::calendar::{intervals_overlap, Period};

/// Lifecycle state of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkState {
    Draft,
    Published,
}

impl WorkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkState::Draft => "DRAFT",
            WorkState::Published => "PUBLISHED",
        }
    }
}

impl std::fmt::Display for WorkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority of a maintenance definition and the items it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// Supplies and machinery expected to be needed by a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResourcePlan {
    #[serde(default)]
    pub supplies: Vec<String>,
    #[serde(default)]
    pub machinery: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Position of a block inside a split group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockGroup {
    pub group_id: String,
    /// 1-based
    pub index: u32,
    pub total: u32,
}

/// A dated, time-boxed maintenance assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub site_id: String,
    pub definition_id: Option<String>,
    pub description: String,
    pub location_id: Option<String>,
    pub element_id: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Whole hours, at least 1.
    pub duration_hours: u32,
    pub workers: BTreeSet<String>,
    pub supervisor_id: Option<String>,
    #[serde(default)]
    pub resource_plan: ResourcePlan,
    #[serde(default)]
    pub priority: Priority,
    pub group: Option<BlockGroup>,
    pub period: Period,
    pub state: WorkState,
}

impl WorkItem {
    /// Build a DRAFT from a definition-less block request.
    pub fn draft(site_id: &str, block: NewBlock) -> Self {
        let end = block.start + Duration::hours(block.duration_hours as i64);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            site_id: site_id.to_string(),
            definition_id: block.definition_id,
            description: block.description,
            location_id: block.location_id,
            element_id: block.element_id,
            start: block.start,
            end,
            duration_hours: block.duration_hours,
            workers: block.workers,
            supervisor_id: block.supervisor_id,
            resource_plan: block.resource_plan,
            priority: block.priority,
            group: None,
            period: Period::of(block.start.date()),
            state: WorkState::Draft,
        }
    }

    /// Build a DRAFT for one placement of a definition.
    pub fn from_definition(def: &Definition, start: NaiveDateTime, hours: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            site_id: def.site_id.clone(),
            definition_id: Some(def.id.clone()),
            description: def.description.clone(),
            location_id: def.location_id.clone(),
            element_id: def.element_id.clone(),
            start,
            end: start + Duration::hours(hours as i64),
            duration_hours: hours,
            workers: def.workers.clone(),
            supervisor_id: def.supervisor_id.clone(),
            resource_plan: def.resource_plan.clone(),
            priority: def.priority,
            group: None,
            period: Period::of(start.date()),
            state: WorkState::Draft,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.state == WorkState::Draft
    }

    pub fn has_worker(&self, worker: &str) -> bool {
        self.workers.contains(worker)
    }

    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        intervals_overlap(self.start, self.end, start, end)
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    /// Same job at the same place: used to avoid regenerating published work.
    pub fn same_job(&self, description: &str, location: Option<&str>, element: Option<&str>) -> bool {
        self.description == description
            && self.location_id.as_deref() == location
            && self.element_id.as_deref() == element
    }
}

/// Manually authored block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBlock {
    pub description: String,
    pub start: NaiveDateTime,
    pub duration_hours: u32,
    pub workers: BTreeSet<String>,
    #[serde(default)]
    pub definition_id: Option<String>,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub element_id: Option<String>,
    #[serde(default)]
    pub supervisor_id: Option<String>,
    #[serde(default)]
    pub resource_plan: ResourcePlan,
    #[serde(default)]
    pub priority: Priority,
}

/// Partial update of a DRAFT block. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockEdit {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    pub duration_hours: Option<u32>,
    #[serde(default)]
    pub workers: Option<BTreeSet<String>>,
    #[serde(default)]
    pub supervisor_id: Option<Option<String>>,
    #[serde(default)]
    pub resource_plan: Option<ResourcePlan>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl BlockEdit {
    /// Whether applying this edit moves time or changes who works on it.
    pub fn touches_allocation(&self) -> bool {
        self.start.is_some() || self.duration_hours.is_some() || self.workers.is_some()
    }
}

/// One piece of a split request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitBlock {
    pub start: NaiveDateTime,
    /// Must be a whole, positive number of hours.
    pub hours: f64,
}

impl SplitBlock {
    pub fn is_whole_hours(&self) -> bool {
        self.hours.is_finite() && self.hours >= 1.0 && self.hours.fract() == 0.0
    }

    /// Stored duration; only meaningful once [`Self::is_whole_hours`] holds.
    pub fn whole_hours(&self) -> u32 {
        self.hours.max(0.0) as u32
    }

    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::hours(self.whole_hours() as i64)
    }
}

/// Outcome of a publish call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishSummary {
    pub published: usize,
    pub groups_consolidated: usize,
    pub simple_published: usize,
}
