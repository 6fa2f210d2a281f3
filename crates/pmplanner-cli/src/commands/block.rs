//! Manual draft block commands.

use chrono::NaiveDateTime;
use clap::Subcommand;
use pmplanner_core::schedule::{BlockEdit, NewBlock, Priority, ResourcePlan, SplitBlock};
use pmplanner_core::{Config, DraftLifecycle, ScheduleDb};
use serde_json::json;

use super::{parse_datetime, parse_priority, parse_split_block, print_json};

#[derive(Subcommand)]
pub enum BlockAction {
    /// Create a draft block
    Create {
        #[arg(long)]
        site: String,
        #[arg(long)]
        description: String,
        /// Start as YYYY-MM-DDTHH:MM (site-local)
        #[arg(long, value_parser = parse_datetime)]
        start: NaiveDateTime,
        /// Whole hours
        #[arg(long)]
        hours: u32,
        /// Assigned worker (repeatable)
        #[arg(long = "worker", required = true)]
        workers: Vec<String>,
        #[arg(long)]
        supervisor: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        element: Option<String>,
        #[arg(long)]
        definition: Option<String>,
        #[arg(long, value_parser = parse_priority, default_value = "medium")]
        priority: Priority,
        /// Supply needed on site (repeatable)
        #[arg(long = "supply")]
        supplies: Vec<String>,
        /// Machine needed on site (repeatable)
        #[arg(long = "machine")]
        machinery: Vec<String>,
    },
    /// Edit a draft block; omitted fields stay unchanged
    Edit {
        /// Item id
        id: String,
        #[arg(long)]
        site: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_datetime)]
        start: Option<NaiveDateTime>,
        #[arg(long)]
        hours: Option<u32>,
        /// Replace the worker set (repeatable)
        #[arg(long = "worker")]
        workers: Vec<String>,
        #[arg(long)]
        supervisor: Option<String>,
        /// Remove the supervisor
        #[arg(long, conflicts_with = "supervisor")]
        clear_supervisor: bool,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
    },
    /// Delete a draft block
    Delete {
        /// Item id
        id: String,
        #[arg(long)]
        site: String,
    },
    /// Split a draft item into blocks that keep its total hours
    Split {
        /// Item id
        id: String,
        #[arg(long)]
        site: String,
        /// Block as START=HOURS, e.g. 2025-03-04T08:00=2 (at least two)
        #[arg(long = "block", value_parser = parse_split_block, required = true)]
        blocks: Vec<SplitBlock>,
    },
}

pub fn run(action: BlockAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let lifecycle = DraftLifecycle::with_config(&config.scheduling);
    let mut db = ScheduleDb::open()?;

    match action {
        BlockAction::Create {
            site,
            description,
            start,
            hours,
            workers,
            supervisor,
            location,
            element,
            definition,
            priority,
            supplies,
            machinery,
        } => {
            let block = NewBlock {
                description,
                start,
                duration_hours: hours,
                workers: workers.into_iter().collect(),
                definition_id: definition,
                location_id: location,
                element_id: element,
                supervisor_id: supervisor,
                resource_plan: ResourcePlan {
                    supplies,
                    machinery,
                    notes: None,
                },
                priority,
            };
            let item = lifecycle.create_block(&mut db, &site, block)?;
            print_json(&item)?;
        }
        BlockAction::Edit {
            id,
            site,
            description,
            start,
            hours,
            workers,
            supervisor,
            clear_supervisor,
            priority,
        } => {
            let edit = BlockEdit {
                description,
                start,
                duration_hours: hours,
                workers: if workers.is_empty() {
                    None
                } else {
                    Some(workers.into_iter().collect())
                },
                supervisor_id: if clear_supervisor {
                    Some(None)
                } else {
                    supervisor.map(Some)
                },
                resource_plan: None,
                priority,
            };
            let item = lifecycle.edit_block(&mut db, &site, &id, edit)?;
            print_json(&item)?;
        }
        BlockAction::Delete { id, site } => {
            lifecycle.delete_block(&mut db, &site, &id)?;
            print_json(&json!({ "deleted": id }))?;
        }
        BlockAction::Split { id, site, blocks } => {
            let created = lifecycle.split_task(&mut db, &site, &id, &blocks)?;
            print_json(&created)?;
        }
    }
    Ok(())
}
