//! Machinery logistics planner.
//!
//! Turns equipment usage intervals into reservation windows (delivery day
//! before use, pickup day after use, both on allowed weekdays) and renders
//! them on a Monday-anchored weekly grid per machine.
//!
//! Grouping: usage intervals sharing a plan group are one multi-day job and
//! produce one window; ungrouped usage stands alone.

mod grid;
mod window;

pub use grid::{grid_anchor, render_week, week_index, week_monday, GridCell};
pub use window::{search_weekday, Direction, ReservationWindow};

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calendar::Period;
use crate::error::Result;
use crate::ports::{MachineryStore, TaskStore};
use crate::storage::LogisticsConfig;

/// A machine from the company catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub machine_type: String,
}

/// A period during which a machine is out on a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageInterval {
    pub id: String,
    pub machine_id: String,
    pub start: NaiveDateTime,
    /// `None` while the machine is still out.
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
    #[serde(default)]
    pub work_item_id: Option<String>,
    #[serde(default)]
    pub plan_group_id: Option<String>,
}

/// One grid row of one usage group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridEntry {
    pub usage_ids: Vec<String>,
    pub work_item_ids: Vec<String>,
    pub plan_group_id: Option<String>,
    pub uso_ini: NaiveDateTime,
    pub uso_fin: NaiveDateTime,
    pub entrega: NaiveDate,
    pub recogida: NaiveDate,
    pub dias_trabajo: u32,
    pub week_start: NaiveDate,
    pub grid: [GridCell; 6],
}

/// Agenda of one machine: week index -> work-day bucket -> entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineAgenda {
    pub machine: Machine,
    pub weeks: BTreeMap<i64, BTreeMap<u32, Vec<GridEntry>>>,
}

/// Usage intervals that form one logistics job.
#[derive(Debug, Clone)]
struct UsageGroup<'a> {
    plan_group_id: Option<String>,
    usages: Vec<&'a UsageInterval>,
}

/// Resolved usage span of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UsageSpan {
    uso_ini: NaiveDateTime,
    uso_fin: NaiveDateTime,
    dias_trabajo: u32,
}

/// Builds the monthly machinery agenda.
pub struct LogisticsPlanner {
    config: LogisticsConfig,
}

impl LogisticsPlanner {
    pub fn new() -> Self {
        Self {
            config: LogisticsConfig::default(),
        }
    }

    pub fn with_config(config: LogisticsConfig) -> Self {
        Self { config }
    }

    /// Per-machine weekly grid for `(company, year, month)`.
    pub fn monthly_agenda<S>(
        &self,
        store: &S,
        company_id: &str,
        year: i32,
        month: u32,
        machine_type: Option<&str>,
    ) -> Result<Vec<MachineAgenda>>
    where
        S: MachineryStore + TaskStore + ?Sized,
    {
        let period = Period::new(year, month)?;
        let (from, to) = period.bounds();
        let anchor = grid_anchor(period);

        let machines = store.machines(company_id, machine_type)?;
        let machine_ids: Vec<String> = machines.iter().map(|m| m.id.clone()).collect();
        let usage = store.usage_overlapping(&machine_ids, from, to)?;

        let mut agendas = Vec::with_capacity(machines.len());
        for machine in machines {
            let own: Vec<&UsageInterval> = usage.iter().filter(|u| u.machine_id == machine.id).collect();
            let mut weeks: BTreeMap<i64, BTreeMap<u32, Vec<GridEntry>>> = BTreeMap::new();

            for group in group_usage(&own) {
                let span = self.resolve_span(store, &group, period)?;
                let window = ReservationWindow::around(
                    span.uso_ini.date(),
                    span.uso_fin.date(),
                    &self.config.allowed_weekdays,
                    self.config.search_limit_days,
                );

                let usage_ids: Vec<String> = group.usages.iter().map(|u| u.id.clone()).collect();
                let work_item_ids: Vec<String> = group
                    .usages
                    .iter()
                    .filter_map(|u| u.work_item_id.clone())
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect();

                let first_week = week_index(anchor, window.entrega);
                let last_week = week_index(anchor, window.recogida);
                debug!(
                    machine = %machine.id,
                    entrega = %window.entrega,
                    recogida = %window.recogida,
                    first_week,
                    last_week,
                    "reservation window"
                );

                for index in first_week..=last_week {
                    let monday = week_monday(anchor, index);
                    let entry = GridEntry {
                        usage_ids: usage_ids.clone(),
                        work_item_ids: work_item_ids.clone(),
                        plan_group_id: group.plan_group_id.clone(),
                        uso_ini: span.uso_ini,
                        uso_fin: span.uso_fin,
                        entrega: window.entrega,
                        recogida: window.recogida,
                        dias_trabajo: span.dias_trabajo,
                        week_start: monday,
                        grid: render_week(monday, &window, span.uso_ini.date(), span.uso_fin.date()),
                    };
                    weeks
                        .entry(index)
                        .or_default()
                        .entry(span.dias_trabajo)
                        .or_default()
                        .push(entry);
                }
            }

            agendas.push(MachineAgenda { machine, weeks });
        }

        info!(
            company = company_id,
            %period,
            machines = agendas.len(),
            usage = usage.len(),
            "machinery agenda built"
        );
        Ok(agendas)
    }

    /// Usage span across the group's linked work items, falling back to the
    /// intervals themselves for ungrouped usage or unresolvable links.
    fn resolve_span<S>(&self, store: &S, group: &UsageGroup<'_>, period: Period) -> Result<UsageSpan>
    where
        S: TaskStore + ?Sized,
    {
        let open_end = period
            .last_day()
            .and_hms_opt(23, 59, 59)
            .unwrap_or(NaiveDateTime::MAX);

        let own_start = group.usages.iter().map(|u| u.start).min();
        let own_end = group
            .usages
            .iter()
            .map(|u| u.end.unwrap_or(open_end.max(u.start)))
            .max();

        let mut linked = Vec::new();
        for usage in &group.usages {
            if let Some(item_id) = usage.work_item_id.as_deref() {
                if let Some(item) = store.get_item(item_id)? {
                    linked.push(item);
                }
            }
        }

        let (uso_ini, uso_fin) = if group.plan_group_id.is_some() && !linked.is_empty() {
            (
                linked.iter().map(|i| i.start).min(),
                linked.iter().map(|i| i.end).max(),
            )
        } else {
            (own_start, own_end)
        };
        let uso_ini = uso_ini.unwrap_or(open_end);
        let uso_fin = uso_fin.unwrap_or(uso_ini).max(uso_ini);

        let days = if linked.is_empty() {
            ((uso_fin.date() - uso_ini.date()).num_days() + 1) as usize
        } else {
            linked.iter().map(|i| i.date()).collect::<BTreeSet<_>>().len()
        };
        let dias_trabajo = (days as u32).clamp(1, self.config.max_work_days_bucket.max(1));

        Ok(UsageSpan {
            uso_ini,
            uso_fin,
            dias_trabajo,
        })
    }
}

impl Default for LogisticsPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Plan-group buckets first (by id), then each ungrouped usage alone.
fn group_usage<'a>(usage: &[&'a UsageInterval]) -> Vec<UsageGroup<'a>> {
    let mut grouped: BTreeMap<&str, Vec<&'a UsageInterval>> = BTreeMap::new();
    let mut singles = Vec::new();
    for u in usage {
        match u.plan_group_id.as_deref() {
            Some(group_id) => grouped.entry(group_id).or_default().push(*u),
            None => singles.push(UsageGroup {
                plan_group_id: None,
                usages: vec![*u],
            }),
        }
    }

    let mut groups: Vec<UsageGroup<'a>> = grouped
        .into_iter()
        .map(|(id, usages)| UsageGroup {
            plan_group_id: Some(id.to_string()),
            usages,
        })
        .collect();
    singles.sort_by_key(|g| g.usages[0].start);
    groups.extend(singles);
    groups
}
