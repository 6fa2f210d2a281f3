use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::info;

use super::DraftLifecycle;
use crate::calendar::Period;
use crate::error::{CoreError, Result};
use crate::ports::{ChangeSet, ItemQuery, TaskStore};
use crate::schedule::{PublishSummary, WorkItem, WorkState};

impl DraftLifecycle {
    /// Promote every DRAFT of `(site, year, month)` to PUBLISHED.
    ///
    /// All-or-nothing: if any two drafts sharing a worker overlap, nothing is
    /// published. With `consolidate`, each split group becomes a single
    /// published item spanning its blocks; ungrouped drafts are flipped.
    pub fn publish<S: TaskStore>(
        &self,
        store: &mut S,
        site_id: &str,
        year: i32,
        month: u32,
        consolidate: bool,
    ) -> Result<PublishSummary> {
        let period = Period::new(year, month)?;
        let drafts = store.list_items(
            &ItemQuery::site(site_id)
                .period(period)
                .state(WorkState::Draft),
        )?;
        if drafts.is_empty() {
            return Ok(PublishSummary::default());
        }

        check_batch_overlaps(&drafts)?;

        let mut changes = ChangeSet::default();
        let mut summary = PublishSummary::default();

        if consolidate {
            let mut groups: BTreeMap<String, Vec<WorkItem>> = BTreeMap::new();
            for item in drafts {
                match item.group.as_ref().map(|g| g.group_id.clone()) {
                    Some(group_id) => groups.entry(group_id).or_default().push(item),
                    None => {
                        changes.update(published(item));
                        summary.simple_published += 1;
                    }
                }
            }
            for (group_id, members) in groups {
                for member in &members {
                    changes.delete(member.id.clone());
                }
                let merged = consolidate_group(members).ok_or_else(|| {
                    CoreError::InvariantViolation(format!("group '{group_id}' has no blocks"))
                })?;
                changes.insert(merged);
                summary.groups_consolidated += 1;
            }
        } else {
            for item in drafts {
                changes.update(published(item));
                summary.simple_published += 1;
            }
        }

        summary.published = summary.simple_published + summary.groups_consolidated;
        store.commit(changes)?;

        info!(
            site = site_id,
            %period,
            consolidate,
            published = summary.published,
            groups = summary.groups_consolidated,
            simple = summary.simple_published,
            "period published"
        );
        Ok(summary)
    }
}

fn published(mut item: WorkItem) -> WorkItem {
    item.state = WorkState::Published;
    item
}

/// One PUBLISHED item covering `[min start, max end]` of the group.
///
/// Hours are summed and workers unioned; the remaining attributes come from
/// the block with the lowest index.
pub fn consolidate_group(mut members: Vec<WorkItem>) -> Option<WorkItem> {
    members.sort_by_key(|m| (m.group.as_ref().map(|g| g.index).unwrap_or(0), m.start));
    let start = members.iter().map(|m| m.start).min()?;
    let end = members.iter().map(|m| m.end).max()?;
    let duration_hours = members.iter().map(|m| m.duration_hours).sum();
    let workers: BTreeSet<String> = members.iter().flat_map(|m| m.workers.iter().cloned()).collect();

    let first = members.into_iter().next()?;
    Some(WorkItem {
        id: uuid::Uuid::new_v4().to_string(),
        start,
        end,
        duration_hours,
        workers,
        group: None,
        period: Period::of(start.date()),
        state: WorkState::Published,
        ..first
    })
}

/// Fails on the first pair of drafts sharing a worker with intersecting intervals.
fn check_batch_overlaps(drafts: &[WorkItem]) -> Result<()> {
    let mut by_worker: HashMap<&str, Vec<&WorkItem>> = HashMap::new();
    for item in drafts {
        for worker in &item.workers {
            by_worker.entry(worker.as_str()).or_default().push(item);
        }
    }

    let mut workers: Vec<_> = by_worker.into_iter().collect();
    workers.sort_by_key(|(worker, _)| *worker);
    for (worker, mut items) in workers {
        items.sort_by_key(|i| (i.start, i.end));
        // Sorted by start: a conflict with any earlier item implies a
        // conflict with the running maximum end.
        let mut latest: Option<&WorkItem> = None;
        for item in items {
            if let Some(prev) = latest {
                if item.start < prev.end {
                    return Err(CoreError::OverlapConflict {
                        worker: worker.to_string(),
                        conflicting_item: item.id.clone(),
                    });
                }
            }
            if latest.map_or(true, |prev| item.end > prev.end) {
                latest = Some(item);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{BlockGroup, Priority, ResourcePlan};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn block(index: u32, start: NaiveDateTime, hours: u32, workers: &[&str]) -> WorkItem {
        WorkItem {
            id: format!("b{index}"),
            site_id: "site".to_string(),
            definition_id: Some("def".to_string()),
            description: "Roof drains".to_string(),
            location_id: Some("roof".to_string()),
            element_id: Some("drain-3".to_string()),
            start,
            end: start + chrono::Duration::hours(hours as i64),
            duration_hours: hours,
            workers: workers.iter().map(|w| w.to_string()).collect(),
            supervisor_id: Some("sup".to_string()),
            resource_plan: ResourcePlan::default(),
            priority: Priority::High,
            group: Some(BlockGroup {
                group_id: "g".to_string(),
                index,
                total: 3,
            }),
            period: Period::of(start.date()),
            state: WorkState::Draft,
        }
    }

    #[test]
    fn consolidation_spans_group_and_unions_workers() {
        // Mon 08-10 {A}, Wed 08-11 {B}, Fri 08-09 {A, C}
        let members = vec![
            block(2, at(5, 8), 3, &["B"]),
            block(1, at(3, 8), 2, &["A"]),
            block(3, at(7, 8), 1, &["A", "C"]),
        ];
        let merged = consolidate_group(members).unwrap();
        assert_eq!(merged.start, at(3, 8));
        assert_eq!(merged.end, at(7, 9));
        assert_eq!(merged.duration_hours, 6);
        assert_eq!(
            merged.workers.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["A", "B", "C"]
        );
        assert_eq!(merged.state, WorkState::Published);
        assert!(merged.group.is_none());
        assert_eq!(merged.element_id.as_deref(), Some("drain-3"));
    }

    #[test]
    fn batch_overlap_is_detected_across_non_adjacent_items() {
        let long = block(1, at(3, 8), 6, &["A"]);
        let short = block(2, at(3, 9), 1, &["B"]);
        let late = block(3, at(3, 12), 1, &["A"]);
        let err = check_batch_overlaps(&[long, short, late]).unwrap_err();
        match err {
            CoreError::OverlapConflict { worker, conflicting_item } => {
                assert_eq!(worker, "A");
                assert_eq!(conflicting_item, "b3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn touching_items_publish_cleanly() {
        let a = block(1, at(3, 8), 2, &["A"]);
        let b = block(2, at(3, 10), 2, &["A"]);
        assert!(check_batch_overlaps(&[a, b]).is_ok());
    }
}
