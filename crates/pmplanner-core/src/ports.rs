//! Storage ports consumed by the scheduling core.
//!
//! The core never talks to a database directly: it reads through these
//! traits, validates in memory and hands a [`ChangeSet`] to
//! [`TaskStore::commit`], which must apply it all-or-nothing.

use chrono::NaiveDateTime;

use crate::calendar::Period;
use crate::error::Result;
use crate::logistics::{Machine, UsageInterval};
use crate::schedule::{Definition, Holiday, SiteHours, WorkItem, WorkState};

/// Filter for [`TaskStore::list_items`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemQuery {
    pub site_id: String,
    pub period: Option<Period>,
    pub state: Option<WorkState>,
    pub worker: Option<String>,
    /// Items whose `[start, end)` intersects this range.
    pub overlapping: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl ItemQuery {
    pub fn site(site_id: &str) -> Self {
        Self {
            site_id: site_id.to_string(),
            ..Self::default()
        }
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn state(mut self, state: WorkState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn worker(mut self, worker: &str) -> Self {
        self.worker = Some(worker.to_string());
        self
    }

    pub fn overlapping(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.overlapping = Some((start, end));
        self
    }

    /// In-memory evaluation, shared by adapters that filter after loading.
    pub fn matches(&self, item: &WorkItem) -> bool {
        item.site_id == self.site_id
            && self.period.map_or(true, |p| item.period == p)
            && self.state.map_or(true, |s| item.state == s)
            && self.worker.as_deref().map_or(true, |w| item.has_worker(w))
            && self
                .overlapping
                .map_or(true, |(start, end)| item.overlaps(start, end))
    }
}

/// Rows written by one mutating operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub deletes: Vec<String>,
    pub inserts: Vec<WorkItem>,
    pub updates: Vec<WorkItem>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.inserts.is_empty() && self.updates.is_empty()
    }

    pub fn delete(&mut self, id: impl Into<String>) -> &mut Self {
        self.deletes.push(id.into());
        self
    }

    pub fn insert(&mut self, item: WorkItem) -> &mut Self {
        self.inserts.push(item);
        self
    }

    pub fn update(&mut self, item: WorkItem) -> &mut Self {
        self.updates.push(item);
        self
    }
}

/// Draft and published work items.
pub trait TaskStore {
    fn get_item(&self, id: &str) -> Result<Option<WorkItem>>;

    fn list_items(&self, query: &ItemQuery) -> Result<Vec<WorkItem>>;

    /// Apply deletes, then inserts, then updates as one atomic unit.
    fn commit(&mut self, changes: ChangeSet) -> Result<()>;
}

/// Active recurring maintenance definitions.
pub trait DefinitionStore {
    fn active_definitions(&self, site_id: &str) -> Result<Vec<Definition>>;
}

/// Operating hours and holiday calendar.
pub trait HoursStore {
    fn site_hours(&self, site_id: &str) -> Result<SiteHours>;

    fn holidays(&self, site_id: &str, period: Period) -> Result<Vec<Holiday>>;
}

/// Machine catalog and usage intervals.
pub trait MachineryStore {
    fn machines(&self, company_id: &str, machine_type: Option<&str>) -> Result<Vec<Machine>>;

    /// Usage of the given machines intersecting `[from, to)`; open usage
    /// (no end) always counts once it has started before `to`.
    fn usage_overlapping(
        &self,
        machine_ids: &[String],
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<UsageInterval>>;
}
