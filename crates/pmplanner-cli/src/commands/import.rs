use std::path::PathBuf;

use clap::Args;
use pmplanner_core::{Fixture, ScheduleDb};

use super::print_json;

#[derive(Args)]
pub struct ImportArgs {
    /// JSON file with definitions, hours, holidays, machines, usage and items
    pub file: PathBuf,
}

pub fn run(args: ImportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::load(&args.file)?;
    let mut db = ScheduleDb::open()?;
    let summary = db.import_fixture(&fixture)?;
    print_json(&summary)?;
    Ok(())
}
