//! Draft generation and listing commands.

use clap::Subcommand;
use pmplanner_core::{Config, DraftGenerator, DraftLifecycle, ScheduleDb};
use serde_json::json;

use super::{print_json, PeriodArgs};

#[derive(Subcommand)]
pub enum DraftAction {
    /// Regenerate the drafts of a period from the active definitions
    Generate {
        #[command(flatten)]
        period: PeriodArgs,
        /// Block length used when a definition's area/yield rule cannot be evaluated
        #[arg(long)]
        fallback_hours: Option<u32>,
    },
    /// List the drafts of a period
    List {
        #[command(flatten)]
        period: PeriodArgs,
    },
}

pub fn run(action: DraftAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut db = ScheduleDb::open()?;

    match action {
        DraftAction::Generate {
            period,
            fallback_hours,
        } => {
            let generator = DraftGenerator::with_config(config.scheduling);
            let placed = generator.generate_draft(
                &mut db,
                &period.site,
                period.year,
                period.month,
                fallback_hours,
            )?;
            print_json(&json!({
                "site": period.site,
                "year": period.year,
                "month": period.month,
                "placed": placed,
            }))?;
        }
        DraftAction::List { period } => {
            let lifecycle = DraftLifecycle::with_config(&config.scheduling);
            let drafts = lifecycle.list_draft(&db, &period.site, period.year, period.month)?;
            print_json(&drafts)?;
        }
    }
    Ok(())
}
