//! Draft generator for preventive maintenance.
//!
//! Expands a site's active definitions into dated DRAFT blocks for one month:
//! - Selects due days per frequency (see [`crate::schedule::Frequency::applies_on`])
//! - Skips holidays, closed weekdays and days already covered by published work
//! - Packs blocks per worker from the opening time onward, never past closing
//! - Keeps every assigned worker under the weekly hour cap
//!
//! A block that does not fit its day is skipped, never reported as an error.

mod packing;

pub use packing::PackingCursor;

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calendar::Period;
use crate::error::Result;
use crate::guard::{load_snapshot, CapacityPolicy, Guard};
use crate::ports::{ChangeSet, DefinitionStore, HoursStore, ItemQuery, TaskStore};
use crate::schedule::{Definition, Holiday, SiteHours, WorkItem, WorkState};
use crate::storage::SchedulingConfig;

/// Why a candidate day produced no block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Holiday,
    Closed,
    AlreadyPublished,
    PastClosing,
    CapacityExceeded,
}

/// A day that a definition was due but got no block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDay {
    pub definition_id: String,
    pub date: NaiveDate,
    pub reason: SkipReason,
}

/// Result of planning one month, before anything is written.
#[derive(Debug, Clone, Default)]
pub struct DraftPlan {
    pub items: Vec<WorkItem>,
    pub skipped_days: Vec<SkippedDay>,
    /// Definitions whose block is longer than any opening span.
    pub skipped_definitions: Vec<String>,
}

/// Inputs of [`DraftGenerator::plan`], gathered from the ports.
pub struct PlanInput<'a> {
    pub period: Period,
    pub definitions: &'a [Definition],
    pub hours: &'a SiteHours,
    pub holidays: &'a [Holiday],
    /// Items that survive regeneration: published work and drafts of other periods.
    pub existing: &'a [WorkItem],
    pub fallback_block_hours: u32,
}

/// Expands definitions into draft blocks.
pub struct DraftGenerator {
    config: SchedulingConfig,
}

impl DraftGenerator {
    pub fn new() -> Self {
        Self {
            config: SchedulingConfig::default(),
        }
    }

    pub fn with_config(config: SchedulingConfig) -> Self {
        Self { config }
    }

    /// Regenerate the drafts of `(site, year, month)` and return how many
    /// blocks were placed.
    ///
    /// Existing drafts of exactly this period are replaced; published items
    /// are never touched. Purge and inserts are committed together.
    pub fn generate_draft<S>(
        &self,
        store: &mut S,
        site_id: &str,
        year: i32,
        month: u32,
        fallback_block_hours: Option<u32>,
    ) -> Result<usize>
    where
        S: TaskStore + DefinitionStore + HoursStore,
    {
        let period = Period::new(year, month)?;

        let mut definitions = store.active_definitions(site_id)?;
        definitions.retain(|d| d.active);
        if definitions.is_empty() {
            info!(site = site_id, %period, "no active definitions, nothing to generate");
            return Ok(0);
        }

        let hours = store.site_hours(site_id)?;
        let holidays = if self.config.skip_holidays {
            store.holidays(site_id, period)?
        } else {
            Vec::new()
        };

        let stale: Vec<WorkItem> = store.list_items(
            &ItemQuery::site(site_id)
                .period(period)
                .state(WorkState::Draft),
        )?;
        let stale_ids: HashSet<&str> = stale.iter().map(|i| i.id.as_str()).collect();

        let existing: Vec<WorkItem> =
            load_snapshot(&*store, site_id, period.first_day(), period.last_day())?
                .into_iter()
                .filter(|item| !stale_ids.contains(item.id.as_str()))
                .collect();

        let plan = self.plan(&PlanInput {
            period,
            definitions: &definitions,
            hours: &hours,
            holidays: &holidays,
            existing: &existing,
            fallback_block_hours: fallback_block_hours
                .unwrap_or(self.config.fallback_block_hours)
                .max(1),
        });

        let placed = plan.items.len();
        let mut changes = ChangeSet::default();
        for item in &stale {
            changes.delete(item.id.clone());
        }
        changes.inserts = plan.items;
        store.commit(changes)?;

        info!(
            site = site_id,
            %period,
            purged = stale.len(),
            placed,
            skipped_days = plan.skipped_days.len(),
            skipped_definitions = plan.skipped_definitions.len(),
            "draft generated"
        );
        Ok(placed)
    }

    /// Pure packing step: decide every block of the month.
    pub fn plan(&self, input: &PlanInput<'_>) -> DraftPlan {
        // Surviving work of any state counts toward the cap of new drafts.
        let policy = CapacityPolicy {
            count_published: true,
            ..CapacityPolicy::from(&self.config)
        };
        let guard = Guard::new(input.existing, policy);
        let mut cursor = PackingCursor::new();
        let mut plan = DraftPlan::default();

        let days = input.period.days();
        let holidays: HashSet<NaiveDate> = input.holidays.iter().map(|h| h.date).collect();
        let max_span = input.hours.max_span_hours();

        let mut definitions: Vec<&Definition> =
            input.definitions.iter().filter(|d| d.active).collect();
        definitions.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));

        for def in definitions {
            let hours = def
                .duration
                .block_hours()
                .unwrap_or(input.fallback_block_hours);

            if hours > max_span {
                warn!(
                    definition = %def.id,
                    hours,
                    max_span,
                    "block longer than any opening span, definition skipped"
                );
                plan.skipped_definitions.push(def.id.clone());
                continue;
            }

            for day in def.frequency.select(&days) {
                match self.place(def, day, hours, input, &holidays, &guard, &mut cursor) {
                    Ok(item) => {
                        debug!(definition = %def.id, start = %item.start, hours, "block placed");
                        plan.items.push(item);
                    }
                    Err(reason) => {
                        debug!(definition = %def.id, %day, ?reason, "day skipped");
                        plan.skipped_days.push(SkippedDay {
                            definition_id: def.id.clone(),
                            date: day,
                            reason,
                        });
                    }
                }
            }
        }

        plan
    }

    #[allow(clippy::too_many_arguments)]
    fn place(
        &self,
        def: &Definition,
        day: NaiveDate,
        hours: u32,
        input: &PlanInput<'_>,
        holidays: &HashSet<NaiveDate>,
        guard: &Guard<'_>,
        cursor: &mut PackingCursor,
    ) -> std::result::Result<WorkItem, SkipReason> {
        if holidays.contains(&day) {
            return Err(SkipReason::Holiday);
        }
        let (opening, closing) = input.hours.window(day).ok_or(SkipReason::Closed)?;

        let covered = input.existing.iter().any(|item| {
            item.state == WorkState::Published
                && item.date() == day
                && item.same_job(
                    &def.description,
                    def.location_id.as_deref(),
                    def.element_id.as_deref(),
                )
        });
        if covered {
            return Err(SkipReason::AlreadyPublished);
        }

        let length = Duration::hours(hours as i64);
        let mut start = cursor.earliest_start(day, opening, &def.workers);
        // Each pass moves strictly forward past one obstacle, so this ends.
        for _ in 0..=input.existing.len() + 1 {
            let moved = self.skip_obstacles(def, day, start, length, input, guard);
            if moved == start {
                break;
            }
            start = moved;
        }
        let end = start + length;
        if end > closing {
            return Err(SkipReason::PastClosing);
        }

        let cap = guard.policy().weekly_cap;
        for worker in &def.workers {
            let booked = guard.weekly_hours(worker, day, None) + cursor.packed_in_week(worker, day);
            if booked + hours > cap {
                return Err(SkipReason::CapacityExceeded);
            }
        }

        cursor.occupy(day, &def.workers, end, hours);
        Ok(WorkItem::from_definition(def, start, hours))
    }

    /// Later start that clears the break window and surviving items, or `start`.
    fn skip_obstacles(
        &self,
        def: &Definition,
        day: NaiveDate,
        start: NaiveDateTime,
        length: Duration,
        input: &PlanInput<'_>,
        guard: &Guard<'_>,
    ) -> NaiveDateTime {
        let end = start + length;

        if self.config.avoid_breaks {
            if let Some((break_start, break_end)) =
                input.hours.for_date(day).and_then(|h| h.break_window())
            {
                let (break_start, break_end) = (day.and_time(break_start), day.and_time(break_end));
                if start < break_end && end > break_start {
                    return break_end;
                }
            }
        }

        def.workers
            .iter()
            .filter_map(|w| guard.find_overlap(w, start, end, None))
            .map(|item| item.end)
            .max()
            .unwrap_or(start)
    }
}

impl Default for DraftGenerator {
    fn default() -> Self {
        Self::new()
    }
}
