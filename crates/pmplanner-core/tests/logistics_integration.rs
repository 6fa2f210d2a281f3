//! Integration tests for the machinery agenda.

mod common;

use chrono::Weekday;
use common::*;
use pmplanner_core::logistics::{GridCell, Machine, MachineAgenda, UsageInterval};
use pmplanner_core::schedule::WorkState;
use pmplanner_core::storage::LogisticsConfig;
use pmplanner_core::{Fixture, LogisticsPlanner, MemoryStore, ScheduleDb};

fn letters(cells: &[GridCell; 6]) -> String {
    cells
        .iter()
        .map(|c| if c.letter().is_empty() { "." } else { c.letter() })
        .collect()
}

fn machine(id: &str, kind: &str) -> Machine {
    Machine {
        id: id.to_string(),
        company_id: "acme".to_string(),
        name: format!("{kind} {id}"),
        machine_type: kind.to_string(),
    }
}

fn usage(id: &str, machine_id: &str, start: chrono::NaiveDateTime, end: Option<chrono::NaiveDateTime>) -> UsageInterval {
    UsageInterval {
        id: id.to_string(),
        machine_id: machine_id.to_string(),
        start,
        end,
        work_item_id: None,
        plan_group_id: None,
    }
}

fn only_entry(agenda: &MachineAgenda) -> (i64, u32, &pmplanner_core::GridEntry) {
    let (week, buckets) = agenda.weeks.iter().next().unwrap();
    let (bucket, entries) = buckets.iter().next().unwrap();
    (*week, *bucket, &entries[0])
}

#[test]
fn test_tuesday_to_thursday_usage_grid() {
    let mut store = MemoryStore::new();
    store.machines.push(machine("m1", "lift"));
    store.usage.push(usage("u1", "m1", at(4, 8), Some(at(6, 17))));

    let agenda = LogisticsPlanner::new()
        .monthly_agenda(&store, "acme", 2025, 3, None)
        .unwrap();
    assert_eq!(agenda.len(), 1);
    assert_eq!(agenda[0].weeks.len(), 1);

    let (week, bucket, entry) = only_entry(&agenda[0]);
    // 2025-03-01 is a Saturday, so the week of the 3rd is week 2
    assert_eq!(week, 2);
    assert_eq!(bucket, 3);
    assert_eq!(entry.entrega, date(3, 3));
    assert_eq!(entry.recogida, date(3, 8));
    assert_eq!(entry.week_start, date(3, 3));
    assert_eq!(letters(&entry.grid), "EAAAPR");
    assert_eq!(entry.usage_ids, vec!["u1".to_string()]);
}

#[test]
fn test_window_spanning_two_weeks_emits_a_row_per_week() {
    let mut store = MemoryStore::new();
    store.machines.push(machine("m1", "lift"));
    // Friday to Tuesday: delivered Wednesday, picked up next Wednesday
    store.usage.push(usage("u1", "m1", at(7, 8), Some(at(11, 12))));

    let agenda = LogisticsPlanner::new()
        .monthly_agenda(&store, "acme", 2025, 3, None)
        .unwrap();
    let weeks: Vec<i64> = agenda[0].weeks.keys().copied().collect();
    assert_eq!(weeks, vec![2, 3]);

    let first = &agenda[0].weeks[&2][&5][0];
    let second = &agenda[0].weeks[&3][&5][0];
    assert_eq!(letters(&first.grid), "..EPAA");
    assert_eq!(letters(&second.grid), "AAR...");
}

#[test]
fn test_plan_group_uses_linked_work_items() {
    let mut store = MemoryStore::new();
    store.machines.push(machine("m1", "lift"));
    store.put_item(item("w1", at(4, 8), 4, &["ana"], WorkState::Published));
    store.put_item(item("w2", at(6, 13), 3, &["ana"], WorkState::Published));

    let mut first = usage("u1", "m1", at(4, 8), Some(at(4, 12)));
    first.work_item_id = Some("w1".to_string());
    first.plan_group_id = Some("job-7".to_string());
    let mut second = usage("u2", "m1", at(6, 13), Some(at(6, 16)));
    second.work_item_id = Some("w2".to_string());
    second.plan_group_id = Some("job-7".to_string());
    store.usage.extend([first, second]);

    let agenda = LogisticsPlanner::new()
        .monthly_agenda(&store, "acme", 2025, 3, None)
        .unwrap();
    let (_, bucket, entry) = only_entry(&agenda[0]);
    assert_eq!(bucket, 2);
    assert_eq!(entry.plan_group_id.as_deref(), Some("job-7"));
    assert_eq!(entry.usage_ids, vec!["u1".to_string(), "u2".to_string()]);
    assert_eq!(entry.work_item_ids, vec!["w1".to_string(), "w2".to_string()]);
    assert_eq!(entry.uso_ini, at(4, 8));
    assert_eq!(entry.uso_fin, at(6, 16));
    assert_eq!(letters(&entry.grid), "EAAAPR");
}

#[test]
fn test_type_filter_and_company_scope() {
    let mut store = MemoryStore::new();
    store.machines.push(machine("m1", "lift"));
    store.machines.push(machine("m2", "chipper"));
    let mut foreign = machine("m3", "lift");
    foreign.company_id = "other".to_string();
    store.machines.push(foreign);

    let lifts = LogisticsPlanner::new()
        .monthly_agenda(&store, "acme", 2025, 3, Some("lift"))
        .unwrap();
    assert_eq!(lifts.len(), 1);
    assert_eq!(lifts[0].machine.id, "m1");
    assert!(lifts[0].weeks.is_empty());

    let all = LogisticsPlanner::new()
        .monthly_agenda(&store, "acme", 2025, 3, None)
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn test_exhausted_search_falls_back_to_usage_days() {
    let mut store = MemoryStore::new();
    store.machines.push(machine("m1", "lift"));
    store.usage.push(usage("u1", "m1", at(4, 8), Some(at(6, 17))));

    // Tue..Thu usage: no Wednesday within two days before Tuesday or after Thursday
    let config = LogisticsConfig {
        allowed_weekdays: vec![Weekday::Wed],
        search_limit_days: 2,
        ..LogisticsConfig::default()
    };
    let agenda = LogisticsPlanner::with_config(config)
        .monthly_agenda(&store, "acme", 2025, 3, None)
        .unwrap();
    let (_, _, entry) = only_entry(&agenda[0]);
    assert_eq!(entry.entrega, date(3, 4));
    assert_eq!(entry.recogida, date(3, 6));
    assert_eq!(letters(&entry.grid), ".EAR..");
}

#[test]
fn test_open_usage_runs_to_month_end() {
    let mut store = MemoryStore::new();
    store.machines.push(machine("m1", "lift"));
    store.usage.push(usage("u1", "m1", at(24, 8), None));

    let agenda = LogisticsPlanner::new()
        .monthly_agenda(&store, "acme", 2025, 3, None)
        .unwrap();
    let weeks: Vec<i64> = agenda[0].weeks.keys().copied().collect();
    // Delivered Sat 22nd, in use until Mon 31st, picked up Wed 2 April
    assert_eq!(weeks, vec![4, 5, 6]);
    let entry = &agenda[0].weeks[&6][&6][0];
    assert_eq!(entry.recogida, date(4, 2));
    assert_eq!(letters(&entry.grid), "APR...");
}

#[test]
fn test_agenda_through_sqlite() {
    let mut db = ScheduleDb::open_memory().unwrap();
    db.import_fixture(&Fixture {
        machines: vec![machine("m1", "lift")],
        usage: vec![usage("u1", "m1", at(4, 8), Some(at(6, 17)))],
        ..Fixture::default()
    })
    .unwrap();

    let agenda = LogisticsPlanner::new()
        .monthly_agenda(&db, "acme", 2025, 3, None)
        .unwrap();
    let (_, _, entry) = only_entry(&agenda[0]);
    assert_eq!(letters(&entry.grid), "EAAAPR");
}
