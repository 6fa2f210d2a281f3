pub mod agenda;
pub mod block;
pub mod config;
pub mod draft;
pub mod import;
pub mod publish;

use chrono::NaiveDateTime;
use clap::Args;
use pmplanner_core::schedule::{Priority, SplitBlock};
use serde::Serialize;

/// Site and month selecting one scheduling period.
#[derive(Args, Debug, Clone)]
pub struct PeriodArgs {
    /// Site id
    #[arg(long)]
    pub site: String,
    #[arg(long)]
    pub year: i32,
    /// Month number (1-12)
    #[arg(long)]
    pub month: u32,
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Site-local timestamp: `YYYY-MM-DDTHH:MM` or `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map_err(|_| format!("expected YYYY-MM-DDTHH:MM, got '{value}'"))
}

pub fn parse_priority(value: &str) -> Result<Priority, String> {
    match value.to_ascii_lowercase().as_str() {
        "high" => Ok(Priority::High),
        "medium" => Ok(Priority::Medium),
        "low" => Ok(Priority::Low),
        _ => Err(format!("expected high, medium or low, got '{value}'")),
    }
}

/// Split block as `START=HOURS` with whole hours, e.g. `2025-03-04T08:00=3`.
pub fn parse_split_block(value: &str) -> Result<SplitBlock, String> {
    let (start, hours) = value
        .split_once('=')
        .ok_or_else(|| format!("expected START=HOURS, got '{value}'"))?;
    let hours: f64 = hours
        .trim()
        .parse()
        .map_err(|_| format!("invalid hours in '{value}'"))?;
    Ok(SplitBlock {
        start: parse_datetime(start.trim())?,
        hours,
    })
}
