use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::info;

use super::{fetch_draft, DraftLifecycle};
use crate::calendar::{intervals_overlap, week_start, Period};
use crate::error::{CoreError, Result, ValidationError};
use crate::guard::{load_snapshot, Guard};
use crate::ports::{ChangeSet, HoursStore, TaskStore};
use crate::schedule::{BlockGroup, SplitBlock, WorkItem, WorkState};

impl DraftLifecycle {
    /// Replace a DRAFT item by two or more blocks carrying the same hours.
    ///
    /// The blocks inherit everything but timing from the original and form a
    /// new group; whatever group the original belonged to is dropped.
    pub fn split_task<S>(
        &self,
        store: &mut S,
        site_id: &str,
        id: &str,
        blocks: &[SplitBlock],
    ) -> Result<Vec<WorkItem>>
    where
        S: TaskStore + HoursStore,
    {
        let original = fetch_draft(&*store, site_id, id)?;

        if blocks.len() < 2 {
            return Err(ValidationError::InvalidValue {
                field: "blocks".to_string(),
                message: format!("a split needs at least 2 blocks, got {}", blocks.len()),
            }
            .into());
        }
        if let Some(bad) = blocks.iter().find(|b| !b.is_whole_hours()) {
            return Err(ValidationError::InvalidValue {
                field: "hours".to_string(),
                message: format!(
                    "block at {} must last a whole number of hours, got {}",
                    bad.start, bad.hours
                ),
            }
            .into());
        }

        let total: u32 = blocks.iter().map(SplitBlock::whole_hours).sum();
        if total != original.duration_hours {
            return Err(CoreError::InvariantViolation(format!(
                "split blocks add up to {total}h, item '{}' has {}h",
                original.id, original.duration_hours
            )));
        }

        let hours = store.site_hours(site_id)?;
        for block in blocks {
            if !hours.fits_range(block.start, block.end()) {
                return Err(ValidationError::OutsideOpeningHours {
                    date: block.start.date(),
                    start: block.start,
                    hours: block.whole_hours(),
                }
                .into());
            }
        }

        for (i, a) in blocks.iter().enumerate() {
            for b in &blocks[i + 1..] {
                if intervals_overlap(a.start, a.end(), b.start, b.end()) {
                    return Err(ValidationError::InvalidValue {
                        field: "blocks".to_string(),
                        message: format!("blocks at {} and {} overlap", a.start, b.start),
                    }
                    .into());
                }
            }
        }

        let first_day = blocks.iter().map(|b| b.start.date()).min().unwrap_or(original.date());
        let last_day = blocks.iter().map(|b| b.start.date()).max().unwrap_or(original.date());
        let snapshot = load_snapshot(&*store, site_id, first_day, last_day)?;
        let guard = Guard::new(&snapshot, self.policy);

        let mut hours_per_week: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        for block in blocks {
            *hours_per_week.entry(week_start(block.start.date())).or_insert(0) += block.whole_hours();
        }

        for worker in &original.workers {
            for block in blocks {
                if let Some(other) =
                    guard.find_overlap(worker, block.start, block.end(), Some(original.id.as_str()))
                {
                    return Err(CoreError::OverlapConflict {
                        worker: worker.clone(),
                        conflicting_item: other.id.clone(),
                    });
                }
            }
            for (monday, added) in &hours_per_week {
                guard.check_capacity(worker, *monday, *added, Some(original.id.as_str()))?;
            }
        }

        let group_id = uuid::Uuid::new_v4().to_string();
        let total_blocks = blocks.len() as u32;
        let created: Vec<WorkItem> = blocks
            .iter()
            .enumerate()
            .map(|(i, block)| WorkItem {
                id: uuid::Uuid::new_v4().to_string(),
                start: block.start,
                end: block.end(),
                duration_hours: block.whole_hours(),
                group: Some(BlockGroup {
                    group_id: group_id.clone(),
                    index: i as u32 + 1,
                    total: total_blocks,
                }),
                period: Period::of(block.start.date()),
                state: WorkState::Draft,
                ..original.clone()
            })
            .collect();

        let mut changes = ChangeSet::default();
        changes.delete(original.id.clone());
        changes.inserts = created.clone();
        store.commit(changes)?;

        info!(
            site = site_id,
            original = %original.id,
            group = %group_id,
            blocks = created.len(),
            "item split"
        );
        Ok(created)
    }
}
