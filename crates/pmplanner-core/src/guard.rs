//! Overlap and weekly-capacity checks.
//!
//! The guard is a read-only view over a snapshot of work items. Every
//! mutation that changes a worker's time allocation asks it first; it never
//! writes anything itself.

use chrono::{NaiveDate, NaiveDateTime};

use crate::calendar::{week_bounds, week_start};
use crate::error::{CoreError, Result};
use crate::ports::{ItemQuery, TaskStore};
use crate::schedule::{WorkItem, WorkState};
use crate::storage::SchedulingConfig;

/// Which items count toward the weekly cap, and the cap itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPolicy {
    pub weekly_cap: u32,
    pub count_published: bool,
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self {
            weekly_cap: 42,
            count_published: false,
        }
    }
}

impl From<&SchedulingConfig> for CapacityPolicy {
    fn from(cfg: &SchedulingConfig) -> Self {
        Self {
            weekly_cap: cfg.weekly_hour_cap,
            count_published: cfg.count_published_hours,
        }
    }
}

/// Overlap and capacity predicates over a snapshot of one site's items.
#[derive(Debug, Clone, Copy)]
pub struct Guard<'a> {
    items: &'a [WorkItem],
    policy: CapacityPolicy,
}

impl<'a> Guard<'a> {
    pub fn new(items: &'a [WorkItem], policy: CapacityPolicy) -> Self {
        Self { items, policy }
    }

    pub fn policy(&self) -> CapacityPolicy {
        self.policy
    }

    /// First other item of `worker` intersecting `[start, end)`.
    pub fn find_overlap(
        &self,
        worker: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude: Option<&str>,
    ) -> Option<&'a WorkItem> {
        self.items
            .iter()
            .filter(|item| exclude != Some(item.id.as_str()))
            .find(|item| item.has_worker(worker) && item.overlaps(start, end))
    }

    pub fn has_overlap(
        &self,
        worker: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude: Option<&str>,
    ) -> bool {
        self.find_overlap(worker, start, end, exclude).is_some()
    }

    /// Hours already booked for `worker` in the Monday–Sunday week of `date`.
    pub fn weekly_hours(&self, worker: &str, date: NaiveDate, exclude: Option<&str>) -> u32 {
        let (week_from, week_to) = week_bounds(date);
        self.items
            .iter()
            .filter(|item| exclude != Some(item.id.as_str()))
            .filter(|item| self.policy.count_published || item.state == WorkState::Draft)
            .filter(|item| item.has_worker(worker) && item.overlaps(week_from, week_to))
            .map(|item| item.duration_hours)
            .sum()
    }

    /// Fails when `weekly_hours + additional` exceeds the cap.
    pub fn check_capacity(
        &self,
        worker: &str,
        date: NaiveDate,
        additional: u32,
        exclude: Option<&str>,
    ) -> Result<()> {
        let total = self.weekly_hours(worker, date, exclude) + additional;
        if total > self.policy.weekly_cap {
            return Err(CoreError::CapacityExceeded {
                worker: worker.to_string(),
                week_start: week_start(date),
                hours: total,
                cap: self.policy.weekly_cap,
            });
        }
        Ok(())
    }

    /// Overlap, then capacity, for one worker and one candidate interval.
    pub fn check_worker(
        &self,
        worker: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        hours: u32,
        exclude: Option<&str>,
    ) -> Result<()> {
        if let Some(other) = self.find_overlap(worker, start, end, exclude) {
            return Err(CoreError::OverlapConflict {
                worker: worker.to_string(),
                conflicting_item: other.id.clone(),
            });
        }
        self.check_capacity(worker, start.date(), hours, exclude)
    }
}

/// Items of `site_id` intersecting the whole weeks that contain `from..=to`.
///
/// Large enough for both the overlap and the weekly-hours questions about
/// any interval inside `[from, to]`.
pub fn load_snapshot<S: TaskStore + ?Sized>(
    store: &S,
    site_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<WorkItem>> {
    let (range_start, _) = week_bounds(from);
    let (_, range_end) = week_bounds(to);
    store.list_items(&ItemQuery::site(site_id).overlapping(range_start, range_end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Period;
    use crate::schedule::{Priority, ResourcePlan};
    use chrono::Duration;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn item(id: &str, workers: &[&str], start: NaiveDateTime, hours: u32, state: WorkState) -> WorkItem {
        WorkItem {
            id: id.to_string(),
            site_id: "site".to_string(),
            definition_id: None,
            description: id.to_string(),
            location_id: None,
            element_id: None,
            start,
            end: start + Duration::hours(hours as i64),
            duration_hours: hours,
            workers: workers.iter().map(|w| w.to_string()).collect(),
            supervisor_id: None,
            resource_plan: ResourcePlan::default(),
            priority: Priority::Medium,
            group: None,
            period: Period::of(start.date()),
            state,
        }
    }

    #[test]
    fn overlap_requires_shared_worker_and_intersection() {
        let items = vec![item("x", &["a"], at(3, 8), 2, WorkState::Draft)];
        let guard = Guard::new(&items, CapacityPolicy::default());
        assert!(guard.has_overlap("a", at(3, 9), at(3, 11), None));
        assert!(!guard.has_overlap("b", at(3, 9), at(3, 11), None));
        // Touching intervals do not overlap
        assert!(!guard.has_overlap("a", at(3, 10), at(3, 12), None));
        // The item itself can be excluded
        assert!(!guard.has_overlap("a", at(3, 9), at(3, 11), Some("x")));
    }

    #[test]
    fn weekly_hours_counts_only_the_monday_week() {
        // 2025-03-03 Monday .. 2025-03-09 Sunday
        let items = vec![
            item("mon", &["a"], at(3, 8), 8, WorkState::Draft),
            item("sun", &["a"], at(9, 8), 4, WorkState::Draft),
            item("next", &["a"], at(10, 8), 5, WorkState::Draft),
            item("pub", &["a"], at(4, 8), 3, WorkState::Published),
        ];
        let guard = Guard::new(&items, CapacityPolicy::default());
        assert_eq!(guard.weekly_hours("a", NaiveDate::from_ymd_opt(2025, 3, 6).unwrap(), None), 12);
        assert_eq!(guard.weekly_hours("a", NaiveDate::from_ymd_opt(2025, 3, 6).unwrap(), Some("mon")), 4);

        let counting = Guard::new(
            &items,
            CapacityPolicy {
                weekly_cap: 42,
                count_published: true,
            },
        );
        assert_eq!(counting.weekly_hours("a", NaiveDate::from_ymd_opt(2025, 3, 6).unwrap(), None), 15);
    }

    #[test]
    fn capacity_boundary_is_inclusive() {
        let items = vec![item("x", &["a"], at(3, 8), 8, WorkState::Draft)];
        let guard = Guard::new(
            &items,
            CapacityPolicy {
                weekly_cap: 10,
                count_published: false,
            },
        );
        let day = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        assert!(guard.check_capacity("a", day, 2, None).is_ok());
        let err = guard.check_capacity("a", day, 3, None).unwrap_err();
        assert!(matches!(err, CoreError::CapacityExceeded { hours: 11, cap: 10, .. }));
    }

    #[test]
    fn check_worker_reports_overlap_first() {
        let items = vec![item("x", &["a"], at(3, 8), 2, WorkState::Published)];
        let guard = Guard::new(&items, CapacityPolicy::default());
        let err = guard.check_worker("a", at(3, 9), at(3, 10), 1, None).unwrap_err();
        match err {
            CoreError::OverlapConflict { conflicting_item, .. } => assert_eq!(conflicting_item, "x"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(guard.check_worker("a", at(3, 10), at(3, 11), 1, None).is_ok());
    }
}
