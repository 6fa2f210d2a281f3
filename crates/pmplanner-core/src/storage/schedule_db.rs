//! SQLite-based storage for work items, definitions, site calendars and machinery.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use super::data_dir;
use super::fixture::{Fixture, ImportSummary};
use super::migrations;
use crate::calendar::Period;
use crate::error::{CoreError, DatabaseError, Result};
use crate::logistics::{Machine, UsageInterval};
use crate::ports::{ChangeSet, DefinitionStore, HoursStore, ItemQuery, MachineryStore, TaskStore};
use crate::schedule::{
    BlockGroup, Definition, Holiday, Priority, ResourcePlan, SiteHours, WeekdayHours, WorkItem,
    WorkState,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const ITEM_COLUMNS: &str = "id, site_id, definition_id, description, location_id, element_id,
    start_at, end_at, duration_hours, workers, supervisor_id, resource_plan, priority,
    group_id, group_index, group_total, period_year, period_month, state";

// === Helper Functions ===

fn format_timestamp(dt: NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(table: &'static str, value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| corrupt(table, format!("{value}: {e}")))
}

fn parse_date(table: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| corrupt(table, format!("{value}: {e}")))
}

fn corrupt(table: &'static str, message: String) -> CoreError {
    DatabaseError::CorruptRow { table, message }.into()
}

fn parse_state(state_str: &str) -> Result<WorkState> {
    match state_str {
        "DRAFT" => Ok(WorkState::Draft),
        "PUBLISHED" => Ok(WorkState::Published),
        other => Err(corrupt("work_items", format!("unknown state '{other}'"))),
    }
}

fn parse_priority(priority_str: &str) -> Result<Priority> {
    match priority_str {
        "high" => Ok(Priority::High),
        "medium" => Ok(Priority::Medium),
        "low" => Ok(Priority::Low),
        other => Err(corrupt("work_items", format!("unknown priority '{other}'"))),
    }
}

/// Format priority for database storage
fn format_priority(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}

/// Raw `work_items` row, decoded after the statement finishes.
struct ItemRow {
    id: String,
    site_id: String,
    definition_id: Option<String>,
    description: String,
    location_id: Option<String>,
    element_id: Option<String>,
    start_at: String,
    end_at: String,
    duration_hours: u32,
    workers: String,
    supervisor_id: Option<String>,
    resource_plan: String,
    priority: String,
    group_id: Option<String>,
    group_index: Option<u32>,
    group_total: Option<u32>,
    period_year: i32,
    period_month: u32,
    state: String,
}

impl ItemRow {
    fn read(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            site_id: row.get(1)?,
            definition_id: row.get(2)?,
            description: row.get(3)?,
            location_id: row.get(4)?,
            element_id: row.get(5)?,
            start_at: row.get(6)?,
            end_at: row.get(7)?,
            duration_hours: row.get(8)?,
            workers: row.get(9)?,
            supervisor_id: row.get(10)?,
            resource_plan: row.get(11)?,
            priority: row.get(12)?,
            group_id: row.get(13)?,
            group_index: row.get(14)?,
            group_total: row.get(15)?,
            period_year: row.get(16)?,
            period_month: row.get(17)?,
            state: row.get(18)?,
        })
    }

    fn into_item(self) -> Result<WorkItem> {
        let workers: BTreeSet<String> = serde_json::from_str(&self.workers)?;
        let resource_plan: ResourcePlan = serde_json::from_str(&self.resource_plan)?;
        let group = match (self.group_id, self.group_index, self.group_total) {
            (Some(group_id), Some(index), Some(total)) => Some(BlockGroup {
                group_id,
                index,
                total,
            }),
            (None, _, _) => None,
            (Some(group_id), _, _) => {
                return Err(corrupt(
                    "work_items",
                    format!("item '{}' in group '{group_id}' lacks index or total", self.id),
                ))
            }
        };

        Ok(WorkItem {
            start: parse_timestamp("work_items", &self.start_at)?,
            end: parse_timestamp("work_items", &self.end_at)?,
            period: Period::new(self.period_year, self.period_month)?,
            state: parse_state(&self.state)?,
            priority: parse_priority(&self.priority)?,
            id: self.id,
            site_id: self.site_id,
            definition_id: self.definition_id,
            description: self.description,
            location_id: self.location_id,
            element_id: self.element_id,
            duration_hours: self.duration_hours,
            workers,
            supervisor_id: self.supervisor_id,
            resource_plan,
            group,
        })
    }
}

fn insert_item(conn: &Connection, item: &WorkItem) -> Result<()> {
    let workers_json = serde_json::to_string(&item.workers)?;
    let plan_json = serde_json::to_string(&item.resource_plan)?;
    conn.execute(
        &format!(
            "INSERT INTO work_items ({ITEM_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
        ),
        params![
            item.id,
            item.site_id,
            item.definition_id,
            item.description,
            item.location_id,
            item.element_id,
            format_timestamp(item.start),
            format_timestamp(item.end),
            item.duration_hours,
            workers_json,
            item.supervisor_id,
            plan_json,
            format_priority(item.priority),
            item.group.as_ref().map(|g| g.group_id.as_str()),
            item.group.as_ref().map(|g| g.index),
            item.group.as_ref().map(|g| g.total),
            item.period.year,
            item.period.month,
            item.state.as_str(),
        ],
    )?;
    Ok(())
}

/// Returns false when no row has the item's id.
fn update_item(conn: &Connection, item: &WorkItem) -> Result<bool> {
    let workers_json = serde_json::to_string(&item.workers)?;
    let plan_json = serde_json::to_string(&item.resource_plan)?;
    let changed = conn.execute(
        "UPDATE work_items
         SET site_id = ?2, definition_id = ?3, description = ?4, location_id = ?5,
             element_id = ?6, start_at = ?7, end_at = ?8, duration_hours = ?9,
             workers = ?10, supervisor_id = ?11, resource_plan = ?12, priority = ?13,
             group_id = ?14, group_index = ?15, group_total = ?16,
             period_year = ?17, period_month = ?18, state = ?19
         WHERE id = ?1",
        params![
            item.id,
            item.site_id,
            item.definition_id,
            item.description,
            item.location_id,
            item.element_id,
            format_timestamp(item.start),
            format_timestamp(item.end),
            item.duration_hours,
            workers_json,
            item.supervisor_id,
            plan_json,
            format_priority(item.priority),
            item.group.as_ref().map(|g| g.group_id.as_str()),
            item.group.as_ref().map(|g| g.index),
            item.group.as_ref().map(|g| g.total),
            item.period.year,
            item.period.month,
            item.state.as_str(),
        ],
    )?;
    Ok(changed > 0)
}

/// SQLite database for schedule storage.
///
/// Implements every storage port; [`TaskStore::commit`] runs in a single
/// transaction.
pub struct ScheduleDb {
    conn: Connection,
}

impl ScheduleDb {
    /// Open the schedule database at `<data dir>/pmplanner.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("pmplanner.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened schedule database");
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and dry runs).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Load a fixture in one transaction, replacing rows with the same key.
    pub fn import_fixture(&mut self, fixture: &Fixture) -> Result<ImportSummary> {
        let tx = self.conn.transaction()?;

        for def in &fixture.definitions {
            tx.execute(
                "INSERT OR REPLACE INTO definitions (id, site_id, active, body) VALUES (?1, ?2, ?3, ?4)",
                params![def.id, def.site_id, def.active, serde_json::to_string(def)?],
            )?;
        }
        for hours in &fixture.hours {
            tx.execute(
                "INSERT OR REPLACE INTO site_hours (site_id, days) VALUES (?1, ?2)",
                params![hours.site_id, serde_json::to_string(&hours.days)?],
            )?;
        }
        for holiday in &fixture.holidays {
            tx.execute(
                "INSERT INTO holidays (site_id, date, name) VALUES (?1, ?2, ?3)",
                params![holiday.site_id, holiday.date.to_string(), holiday.name],
            )?;
        }
        for machine in &fixture.machines {
            tx.execute(
                "INSERT OR REPLACE INTO machines (id, company_id, name, machine_type)
                 VALUES (?1, ?2, ?3, ?4)",
                params![machine.id, machine.company_id, machine.name, machine.machine_type],
            )?;
        }
        for usage in &fixture.usage {
            tx.execute(
                "INSERT OR REPLACE INTO machine_usage
                    (id, machine_id, start_at, end_at, work_item_id, plan_group_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    usage.id,
                    usage.machine_id,
                    format_timestamp(usage.start),
                    usage.end.map(format_timestamp),
                    usage.work_item_id,
                    usage.plan_group_id,
                ],
            )?;
        }
        for item in &fixture.items {
            tx.execute("DELETE FROM work_items WHERE id = ?1", params![item.id])?;
            insert_item(&tx, item)?;
        }

        tx.commit()?;
        let summary = fixture.summary();
        info!(
            definitions = summary.definitions,
            items = summary.items,
            machines = summary.machines,
            usage = summary.usage,
            "fixture imported"
        );
        Ok(summary)
    }

    fn query_items(&self, sql: &str, values: Vec<Value>) -> Result<Vec<WorkItem>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), ItemRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ItemRow::into_item).collect()
    }
}

impl TaskStore for ScheduleDb {
    fn get_item(&self, id: &str) -> Result<Option<WorkItem>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM work_items WHERE id = ?1"),
                params![id],
                ItemRow::read,
            )
            .optional()?;
        row.map(ItemRow::into_item).transpose()
    }

    fn list_items(&self, query: &ItemQuery) -> Result<Vec<WorkItem>> {
        let mut sql = format!("SELECT {ITEM_COLUMNS} FROM work_items WHERE site_id = ?1");
        let mut values = vec![Value::Text(query.site_id.clone())];

        if let Some(period) = query.period {
            values.push(Value::Integer(period.year as i64));
            sql.push_str(&format!(" AND period_year = ?{}", values.len()));
            values.push(Value::Integer(period.month as i64));
            sql.push_str(&format!(" AND period_month = ?{}", values.len()));
        }
        if let Some(state) = query.state {
            values.push(Value::Text(state.as_str().to_string()));
            sql.push_str(&format!(" AND state = ?{}", values.len()));
        }
        if let Some((start, end)) = query.overlapping {
            values.push(Value::Text(format_timestamp(end)));
            sql.push_str(&format!(" AND start_at < ?{}", values.len()));
            values.push(Value::Text(format_timestamp(start)));
            sql.push_str(&format!(" AND end_at > ?{}", values.len()));
        }
        sql.push_str(" ORDER BY start_at, id");

        // Worker membership lives in a JSON column; filter after decoding.
        let items = self.query_items(&sql, values)?;
        Ok(items.into_iter().filter(|item| query.matches(item)).collect())
    }

    fn commit(&mut self, changes: ChangeSet) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;

        for id in &changes.deletes {
            let deleted = tx.execute("DELETE FROM work_items WHERE id = ?1", params![id])?;
            if deleted == 0 {
                return Err(CoreError::not_found("work item", id.clone()));
            }
        }
        for item in &changes.inserts {
            insert_item(&tx, item)?;
        }
        for item in &changes.updates {
            if !update_item(&tx, item)? {
                return Err(CoreError::not_found("work item", item.id.clone()));
            }
        }

        tx.commit()?;
        debug!(
            deletes = changes.deletes.len(),
            inserts = changes.inserts.len(),
            updates = changes.updates.len(),
            "change set committed"
        );
        Ok(())
    }
}

impl DefinitionStore for ScheduleDb {
    fn active_definitions(&self, site_id: &str) -> Result<Vec<Definition>> {
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM definitions WHERE site_id = ?1 AND active = 1 ORDER BY id")?;
        let bodies = stmt
            .query_map(params![site_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        let mut defs = Vec::with_capacity(bodies.len());
        for body in bodies {
            defs.push(serde_json::from_str::<Definition>(&body)?);
        }
        Ok(defs)
    }
}

impl HoursStore for ScheduleDb {
    fn site_hours(&self, site_id: &str) -> Result<SiteHours> {
        let days: Option<String> = self
            .conn
            .query_row(
                "SELECT days FROM site_hours WHERE site_id = ?1",
                params![site_id],
                |row| row.get(0),
            )
            .optional()?;
        let days: Vec<WeekdayHours> = match days {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };
        Ok(SiteHours {
            site_id: site_id.to_string(),
            days,
        })
    }

    fn holidays(&self, site_id: &str, period: Period) -> Result<Vec<Holiday>> {
        let mut stmt = self.conn.prepare(
            "SELECT site_id, date, name FROM holidays
             WHERE (site_id IS NULL OR site_id = ?1) AND date >= ?2 AND date <= ?3
             ORDER BY date",
        )?;
        let rows = stmt
            .query_map(
                params![
                    site_id,
                    period.first_day().to_string(),
                    period.last_day().to_string()
                ],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(site_id, date, name)| -> Result<Holiday> {
                Ok(Holiday {
                    site_id,
                    date: parse_date("holidays", &date)?,
                    name,
                })
            })
            .collect()
    }
}

impl MachineryStore for ScheduleDb {
    fn machines(&self, company_id: &str, machine_type: Option<&str>) -> Result<Vec<Machine>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, name, machine_type FROM machines
             WHERE company_id = ?1 AND (?2 IS NULL OR machine_type = ?2)
             ORDER BY name, id",
        )?;
        let machines = stmt
            .query_map(params![company_id, machine_type], |row| {
                Ok(Machine {
                    id: row.get(0)?,
                    company_id: row.get(1)?,
                    name: row.get(2)?,
                    machine_type: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(machines)
    }

    fn usage_overlapping(
        &self,
        machine_ids: &[String],
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<UsageInterval>> {
        if machine_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut values = vec![
            Value::Text(format_timestamp(to)),
            Value::Text(format_timestamp(from)),
        ];
        let placeholders: Vec<String> = machine_ids
            .iter()
            .map(|id| {
                values.push(Value::Text(id.clone()));
                format!("?{}", values.len())
            })
            .collect();
        let sql = format!(
            "SELECT id, machine_id, start_at, end_at, work_item_id, plan_group_id
             FROM machine_usage
             WHERE start_at < ?1 AND (end_at IS NULL OR end_at > ?2)
               AND machine_id IN ({})
             ORDER BY start_at, id",
            placeholders.join(", ")
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, machine_id, start_at, end_at, work_item_id, plan_group_id)| -> Result<UsageInterval> {
                Ok(UsageInterval {
                    id,
                    machine_id,
                    start: parse_timestamp("machine_usage", &start_at)?,
                    end: end_at
                        .as_deref()
                        .map(|e| parse_timestamp("machine_usage", e))
                        .transpose()?,
                    work_item_id,
                    plan_group_id,
                })
            })
            .collect()
    }
}
