//! Shared builders for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use pmplanner_core::calendar::Period;
use pmplanner_core::schedule::{
    BlockGroup, Definition, DurationRule, Frequency, Priority, ResourcePlan, SiteHours,
    WeekdayHours, WorkItem, WorkState,
};
use pmplanner_core::{MemoryStore, NewBlock};

pub const SITE: &str = "hq";

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

/// 2025-03-`day` at `hour`:00.
pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    date(3, day).and_hms_opt(hour, 0, 0).unwrap()
}

pub fn workers(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn open(weekday: Weekday, from: u32, to: u32) -> WeekdayHours {
    WeekdayHours {
        weekday,
        opening: NaiveTime::from_hms_opt(from, 0, 0).unwrap(),
        closing: NaiveTime::from_hms_opt(to, 0, 0).unwrap(),
        break_start: Some(NaiveTime::from_hms_opt(13, 0, 0).unwrap()),
        break_end: Some(NaiveTime::from_hms_opt(14, 0, 0).unwrap()),
    }
}

/// Mon..Fri 08:00-17:00, Sat 08:00-13:00, Sunday closed.
pub fn site_hours() -> SiteHours {
    let mut days: Vec<WeekdayHours> = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ]
    .into_iter()
    .map(|d| open(d, 8, 17))
    .collect();
    let mut saturday = open(Weekday::Sat, 8, 13);
    saturday.break_start = None;
    saturday.break_end = None;
    days.push(saturday);
    SiteHours {
        site_id: SITE.to_string(),
        days,
    }
}

pub fn definition(id: &str, frequency: Frequency, hours: u32, crew: &[&str]) -> Definition {
    Definition {
        id: id.to_string(),
        site_id: SITE.to_string(),
        description: format!("Routine {id}"),
        location_id: Some("plant-room".to_string()),
        element_id: Some(format!("el-{id}")),
        frequency,
        priority: Priority::Medium,
        duration: DurationRule::FixedHours { hours },
        workers: workers(crew),
        supervisor_id: Some("sup-1".to_string()),
        resource_plan: ResourcePlan {
            supplies: vec!["filters".to_string()],
            machinery: Vec::new(),
            notes: None,
        },
        active: true,
    }
}

pub fn store_with(definitions: Vec<Definition>) -> MemoryStore {
    let mut store = MemoryStore::new();
    store.hours.insert(SITE.to_string(), site_hours());
    store.definitions = definitions;
    store
}

pub fn new_block(start: NaiveDateTime, hours: u32, crew: &[&str]) -> NewBlock {
    NewBlock {
        description: "Replace lamp".to_string(),
        start,
        duration_hours: hours,
        workers: workers(crew),
        definition_id: None,
        location_id: Some("corridor".to_string()),
        element_id: Some("lamp-7".to_string()),
        supervisor_id: Some("sup-1".to_string()),
        resource_plan: ResourcePlan::default(),
        priority: Priority::Medium,
    }
}

/// A stored item with a fixed id, for seeding stores directly.
pub fn item(id: &str, start: NaiveDateTime, hours: u32, crew: &[&str], state: WorkState) -> WorkItem {
    WorkItem {
        id: id.to_string(),
        site_id: SITE.to_string(),
        definition_id: None,
        description: format!("Task {id}"),
        location_id: Some("roof".to_string()),
        element_id: None,
        start,
        end: start + Duration::hours(hours as i64),
        duration_hours: hours,
        workers: workers(crew),
        supervisor_id: Some("sup-1".to_string()),
        resource_plan: ResourcePlan::default(),
        priority: Priority::Medium,
        group: None,
        period: Period::of(start.date()),
        state,
    }
}

pub fn grouped(mut item: WorkItem, group_id: &str, index: u32, total: u32) -> WorkItem {
    item.group = Some(BlockGroup {
        group_id: group_id.to_string(),
        index,
        total,
    });
    item
}

/// Content of an item without its generated id, for idempotence checks.
pub fn content_key(item: &WorkItem) -> (NaiveDateTime, NaiveDateTime, String, Vec<String>, &'static str) {
    (
        item.start,
        item.end,
        item.description.clone(),
        item.workers.iter().cloned().collect(),
        item.state.as_str(),
    )
}
