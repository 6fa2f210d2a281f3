//! In-memory store used by tests and dry runs.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

use super::fixture::Fixture;
use crate::calendar::Period;
use crate::error::{CoreError, Result};
use crate::logistics::{Machine, UsageInterval};
use crate::ports::{ChangeSet, DefinitionStore, HoursStore, ItemQuery, MachineryStore, TaskStore};
use crate::schedule::{Definition, Holiday, SiteHours, WorkItem};

/// Implements every storage port over plain collections.
///
/// `commit` checks the whole change set before touching anything, so a
/// rejected commit leaves the store exactly as it was.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub items: BTreeMap<String, WorkItem>,
    pub definitions: Vec<Definition>,
    pub hours: HashMap<String, SiteHours>,
    pub holidays: Vec<Holiday>,
    pub machines: Vec<Machine>,
    pub usage: Vec<UsageInterval>,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let mut store = Self::new();
        store.load_fixture(fixture);
        store
    }

    /// Merge a fixture, replacing rows with the same key.
    pub fn load_fixture(&mut self, fixture: Fixture) {
        for def in fixture.definitions {
            self.definitions.retain(|d| d.id != def.id);
            self.definitions.push(def);
        }
        for hours in fixture.hours {
            self.hours.insert(hours.site_id.clone(), hours);
        }
        self.holidays.extend(fixture.holidays);
        for machine in fixture.machines {
            self.machines.retain(|m| m.id != machine.id);
            self.machines.push(machine);
        }
        for usage in fixture.usage {
            self.usage.retain(|u| u.id != usage.id);
            self.usage.push(usage);
        }
        for item in fixture.items {
            self.items.insert(item.id.clone(), item);
        }
    }

    pub fn put_item(&mut self, item: WorkItem) {
        self.items.insert(item.id.clone(), item);
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits
    }
}

impl TaskStore for MemoryStore {
    fn get_item(&self, id: &str) -> Result<Option<WorkItem>> {
        Ok(self.items.get(id).cloned())
    }

    fn list_items(&self, query: &ItemQuery) -> Result<Vec<WorkItem>> {
        let mut items: Vec<WorkItem> = self
            .items
            .values()
            .filter(|item| query.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| (a.start, &a.id).cmp(&(b.start, &b.id)));
        Ok(items)
    }

    fn commit(&mut self, changes: ChangeSet) -> Result<()> {
        for id in &changes.deletes {
            if !self.items.contains_key(id) {
                return Err(CoreError::not_found("work item", id.clone()));
            }
        }
        for item in &changes.updates {
            let exists = self.items.contains_key(&item.id) && !changes.deletes.contains(&item.id);
            let inserted = changes.inserts.iter().any(|i| i.id == item.id);
            if !exists && !inserted {
                return Err(CoreError::not_found("work item", item.id.clone()));
            }
        }
        for item in &changes.inserts {
            if self.items.contains_key(&item.id) && !changes.deletes.contains(&item.id) {
                return Err(CoreError::InvariantViolation(format!(
                    "work item '{}' already exists",
                    item.id
                )));
            }
        }

        for id in &changes.deletes {
            self.items.remove(id);
        }
        for item in changes.inserts.into_iter().chain(changes.updates) {
            self.items.insert(item.id.clone(), item);
        }
        self.commits += 1;
        Ok(())
    }
}

impl DefinitionStore for MemoryStore {
    fn active_definitions(&self, site_id: &str) -> Result<Vec<Definition>> {
        let mut defs: Vec<Definition> = self
            .definitions
            .iter()
            .filter(|d| d.active && d.site_id == site_id)
            .cloned()
            .collect();
        defs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(defs)
    }
}

impl HoursStore for MemoryStore {
    fn site_hours(&self, site_id: &str) -> Result<SiteHours> {
        Ok(self.hours.get(site_id).cloned().unwrap_or_else(|| SiteHours {
            site_id: site_id.to_string(),
            days: Vec::new(),
        }))
    }

    fn holidays(&self, site_id: &str, period: Period) -> Result<Vec<Holiday>> {
        let mut holidays: Vec<Holiday> = self
            .holidays
            .iter()
            .filter(|h| h.site_id.as_deref().map_or(true, |s| s == site_id))
            .filter(|h| Period::of(h.date) == period)
            .cloned()
            .collect();
        holidays.sort_by_key(|h| h.date);
        Ok(holidays)
    }
}

impl MachineryStore for MemoryStore {
    fn machines(&self, company_id: &str, machine_type: Option<&str>) -> Result<Vec<Machine>> {
        let mut machines: Vec<Machine> = self
            .machines
            .iter()
            .filter(|m| m.company_id == company_id)
            .filter(|m| machine_type.map_or(true, |t| m.machine_type == t))
            .cloned()
            .collect();
        machines.sort_by(|a, b| (&a.name, &a.id).cmp(&(&b.name, &b.id)));
        Ok(machines)
    }

    fn usage_overlapping(
        &self,
        machine_ids: &[String],
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<UsageInterval>> {
        let mut usage: Vec<UsageInterval> = self
            .usage
            .iter()
            .filter(|u| machine_ids.contains(&u.machine_id))
            .filter(|u| u.start < to && u.end.map_or(true, |end| end > from))
            .cloned()
            .collect();
        usage.sort_by(|a, b| (a.start, &a.id).cmp(&(b.start, &b.id)));
        Ok(usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Priority, ResourcePlan, WorkState};
    use chrono::{Duration, NaiveDate};

    fn item(id: &str, day: u32) -> WorkItem {
        let start = NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        WorkItem {
            id: id.to_string(),
            site_id: "hq".to_string(),
            definition_id: None,
            description: "Boiler check".to_string(),
            location_id: None,
            element_id: None,
            start,
            end: start + Duration::hours(2),
            duration_hours: 2,
            workers: ["ana".to_string()].into_iter().collect(),
            supervisor_id: None,
            resource_plan: ResourcePlan::default(),
            priority: Priority::Medium,
            group: None,
            period: Period::of(start.date()),
            state: WorkState::Draft,
        }
    }

    #[test]
    fn rejected_commit_changes_nothing() {
        let mut store = MemoryStore::new();
        store.put_item(item("a", 3));

        let mut changes = ChangeSet::default();
        changes.delete("a").delete("missing").insert(item("b", 4));
        let err = store.commit(changes).unwrap_err();

        assert!(matches!(err, CoreError::NotFound { .. }));
        assert!(store.items.contains_key("a"));
        assert!(!store.items.contains_key("b"));
        assert_eq!(store.commit_count(), 0);
    }

    #[test]
    fn list_is_ordered_by_start() {
        let mut store = MemoryStore::new();
        store.put_item(item("late", 10));
        store.put_item(item("early", 3));
        let items = store.list_items(&ItemQuery::site("hq")).unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[test]
    fn open_usage_overlaps_everything_after_its_start() {
        let mut store = MemoryStore::new();
        let start = NaiveDate::from_ymd_opt(2025, 2, 20)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        store.usage.push(UsageInterval {
            id: "u".to_string(),
            machine_id: "m".to_string(),
            start,
            end: None,
            work_item_id: None,
            plan_group_id: None,
        });
        let (from, to) = Period::new(2025, 3).unwrap().bounds();
        let found = store.usage_overlapping(&["m".to_string()], from, to).unwrap();
        assert_eq!(found.len(), 1);
        let none = store.usage_overlapping(&["other".to_string()], from, to).unwrap();
        assert!(none.is_empty());
    }
}
