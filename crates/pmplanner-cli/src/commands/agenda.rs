//! Monthly machinery agenda.

use clap::Args;
use pmplanner_core::{Config, LogisticsPlanner, ScheduleDb};

use super::print_json;

#[derive(Args)]
pub struct AgendaArgs {
    /// Company id owning the machines
    #[arg(long)]
    pub company: String,
    #[arg(long)]
    pub year: i32,
    #[arg(long)]
    pub month: u32,
    /// Only machines of this type
    #[arg(long = "type")]
    pub machine_type: Option<String>,
}

pub fn run(args: AgendaArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = ScheduleDb::open()?;

    let planner = LogisticsPlanner::with_config(config.logistics);
    let agenda = planner.monthly_agenda(
        &db,
        &args.company,
        args.year,
        args.month,
        args.machine_type.as_deref(),
    )?;
    print_json(&agenda)?;
    Ok(())
}
