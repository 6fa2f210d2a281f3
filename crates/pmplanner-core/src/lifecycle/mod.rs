//! Draft lifecycle: manual authoring, split and publish.
//!
//! State machine per item:
//!
//! ```text
//! DRAFT --edit--> DRAFT
//! DRAFT --split--> N x DRAFT (original removed)
//! DRAFT --publish--> PUBLISHED (flipped, or merged into one item per group)
//! DRAFT --delete--> (gone)
//! ```
//!
//! Every operation reads what it needs, validates in memory through the
//! [`Guard`], and commits a single [`ChangeSet`]. A failed check returns
//! before the commit, so nothing is written.

mod publish;
mod split;

use tracing::info;

use crate::calendar::Period;
use crate::error::{CoreError, Result, ValidationError};
use crate::guard::{load_snapshot, CapacityPolicy, Guard};
use crate::ports::{ChangeSet, HoursStore, ItemQuery, TaskStore};
use crate::schedule::{BlockEdit, NewBlock, SiteHours, WorkItem, WorkState};
use crate::storage::SchedulingConfig;

/// Create, edit, delete, split and publish DRAFT work items.
#[derive(Debug, Clone, Copy, Default)]
pub struct DraftLifecycle {
    policy: CapacityPolicy,
}

impl DraftLifecycle {
    pub fn new(policy: CapacityPolicy) -> Self {
        Self { policy }
    }

    pub fn with_config(config: &SchedulingConfig) -> Self {
        Self::new(CapacityPolicy::from(config))
    }

    /// Drafts of `(site, year, month)` ordered by start.
    pub fn list_draft<S: TaskStore + ?Sized>(
        &self,
        store: &S,
        site_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<WorkItem>> {
        let period = Period::new(year, month)?;
        let mut items = store.list_items(
            &ItemQuery::site(site_id)
                .period(period)
                .state(WorkState::Draft),
        )?;
        items.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    /// Author a DRAFT block by hand.
    pub fn create_block<S>(&self, store: &mut S, site_id: &str, block: NewBlock) -> Result<WorkItem>
    where
        S: TaskStore + HoursStore,
    {
        if block.duration_hours == 0 {
            return Err(ValidationError::InvalidTimeRange {
                start: block.start,
                end: block.start,
            }
            .into());
        }

        let item = WorkItem::draft(site_id, block);
        let hours = store.site_hours(site_id)?;
        check_opening_hours(&hours, &item)?;

        let snapshot = load_snapshot(&*store, site_id, item.date(), item.date())?;
        let guard = Guard::new(&snapshot, self.policy);
        for worker in &item.workers {
            guard.check_worker(worker, item.start, item.end, item.duration_hours, None)?;
        }

        let mut changes = ChangeSet::default();
        changes.insert(item.clone());
        store.commit(changes)?;

        info!(site = site_id, id = %item.id, start = %item.start, hours = item.duration_hours, "block created");
        Ok(item)
    }

    /// Apply a partial edit to a DRAFT block.
    ///
    /// A change of start, duration or workers re-checks every worker now on
    /// the block, with the block itself excluded from the snapshot.
    pub fn edit_block<S>(
        &self,
        store: &mut S,
        site_id: &str,
        id: &str,
        edit: BlockEdit,
    ) -> Result<WorkItem>
    where
        S: TaskStore + HoursStore,
    {
        let current = fetch_draft(&*store, site_id, id)?;
        let mut item = current.clone();

        if let Some(description) = edit.description.clone() {
            item.description = description;
        }
        if let Some(start) = edit.start {
            item.start = start;
        }
        if let Some(hours) = edit.duration_hours {
            if hours == 0 {
                return Err(ValidationError::InvalidTimeRange {
                    start: item.start,
                    end: item.start,
                }
                .into());
            }
            item.duration_hours = hours;
        }
        if let Some(workers) = edit.workers.clone() {
            item.workers = workers;
        }
        if let Some(supervisor) = edit.supervisor_id.clone() {
            item.supervisor_id = supervisor;
        }
        if let Some(plan) = edit.resource_plan.clone() {
            item.resource_plan = plan;
        }
        if let Some(priority) = edit.priority {
            item.priority = priority;
        }
        item.end = item.start + chrono::Duration::hours(item.duration_hours as i64);
        item.period = Period::of(item.start.date());

        if edit.touches_allocation() {
            let hours = store.site_hours(site_id)?;
            check_opening_hours(&hours, &item)?;

            let snapshot = load_snapshot(&*store, site_id, item.date(), item.date())?;
            let guard = Guard::new(&snapshot, self.policy);
            for worker in &item.workers {
                guard.check_worker(
                    worker,
                    item.start,
                    item.end,
                    item.duration_hours,
                    Some(item.id.as_str()),
                )?;
            }
        }

        if item == current {
            return Ok(item);
        }

        let mut changes = ChangeSet::default();
        changes.update(item.clone());
        store.commit(changes)?;

        info!(site = site_id, id, start = %item.start, hours = item.duration_hours, "block edited");
        Ok(item)
    }

    /// Remove a DRAFT block.
    pub fn delete_block<S: TaskStore>(&self, store: &mut S, site_id: &str, id: &str) -> Result<()> {
        let item = fetch_draft(&*store, site_id, id)?;
        let mut changes = ChangeSet::default();
        changes.delete(item.id);
        store.commit(changes)?;
        info!(site = site_id, id, "block deleted");
        Ok(())
    }
}

/// Load an item of `site_id` and require it to still be a DRAFT.
pub(crate) fn fetch_draft<S: TaskStore + ?Sized>(store: &S, site_id: &str, id: &str) -> Result<WorkItem> {
    let item = store
        .get_item(id)?
        .filter(|item| item.site_id == site_id)
        .ok_or_else(|| CoreError::not_found("work item", id))?;
    if item.state != WorkState::Draft {
        return Err(ValidationError::NotDraft {
            id: item.id,
            state: item.state.to_string(),
        }
        .into());
    }
    Ok(item)
}

fn check_opening_hours(hours: &SiteHours, item: &WorkItem) -> Result<()> {
    if !hours.fits_range(item.start, item.end) {
        return Err(ValidationError::OutsideOpeningHours {
            date: item.date(),
            start: item.start,
            hours: item.duration_hours,
        }
        .into());
    }
    Ok(())
}
