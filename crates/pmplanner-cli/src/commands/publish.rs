use clap::Args;
use pmplanner_core::{Config, DraftLifecycle, ScheduleDb};

use super::{print_json, PeriodArgs};

#[derive(Args)]
pub struct PublishArgs {
    #[command(flatten)]
    pub period: PeriodArgs,
    /// Merge each split group into one published item
    #[arg(long)]
    pub consolidate: bool,
}

pub fn run(args: PublishArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let lifecycle = DraftLifecycle::with_config(&config.scheduling);
    let mut db = ScheduleDb::open()?;

    let summary = lifecycle.publish(
        &mut db,
        &args.period.site,
        args.period.year,
        args.period.month,
        args.consolidate,
    )?;
    print_json(&summary)?;
    Ok(())
}
