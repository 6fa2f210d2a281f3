//! Monday-anchored weekly occupancy grid (Mon..Sat, Sunday never rendered).

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::window::ReservationWindow;
use crate::calendar::{week_start, working_week, Period};

/// One day cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GridCell {
    /// Delivery day
    #[serde(rename = "E")]
    Entrega,
    /// Pickup day
    #[serde(rename = "R")]
    Recogida,
    /// Machine in use
    #[serde(rename = "A")]
    Active,
    /// On site between delivery and pickup, not in use
    #[serde(rename = "P")]
    Present,
    #[default]
    #[serde(rename = "")]
    Empty,
}

impl GridCell {
    pub fn letter(&self) -> &'static str {
        match self {
            GridCell::Entrega => "E",
            GridCell::Recogida => "R",
            GridCell::Active => "A",
            GridCell::Present => "P",
            GridCell::Empty => "",
        }
    }
}

/// Monday of week 1: the Monday on or before the 1st of the month.
pub fn grid_anchor(period: Period) -> NaiveDate {
    week_start(period.first_day())
}

/// 1-based week index of `date` relative to `anchor`. Days before the
/// anchor get zero or negative indices.
pub fn week_index(anchor: NaiveDate, date: NaiveDate) -> i64 {
    (week_start(date) - anchor).num_days().div_euclid(7) + 1
}

/// Monday of week `index`.
pub fn week_monday(anchor: NaiveDate, index: i64) -> NaiveDate {
    anchor + Duration::days((index - 1) * 7)
}

/// Six cells for the week starting at `monday`.
///
/// E and R win over everything (E over R on the same day), then A for days
/// inside the usage span, then P for the rest of the logistics window.
pub fn render_week(
    monday: NaiveDate,
    window: &ReservationWindow,
    uso_ini: NaiveDate,
    uso_fin: NaiveDate,
) -> [GridCell; 6] {
    working_week(monday).map(|day| {
        if day == window.entrega {
            GridCell::Entrega
        } else if day == window.recogida {
            GridCell::Recogida
        } else if uso_ini <= day && day <= uso_fin {
            GridCell::Active
        } else if window.contains(day) {
            GridCell::Present
        } else {
            GridCell::Empty
        }
    })
}
