//! Delivery (entrega) and pickup (recogida) day search.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Search direction for [`search_weekday`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

/// Nearest allowed day strictly before (or after) `from`.
///
/// Steps one day at a time for at most `limit` days and returns `None` when
/// the bound is exhausted.
pub fn search_weekday(
    from: NaiveDate,
    direction: Direction,
    allowed: &[Weekday],
    limit: u32,
) -> Option<NaiveDate> {
    let step = match direction {
        Direction::Backward => Duration::days(-1),
        Direction::Forward => Duration::days(1),
    };
    let mut day = from;
    for _ in 0..limit {
        day = day.checked_add_signed(step)?;
        if allowed.contains(&day.weekday()) {
            return Some(day);
        }
    }
    None
}

/// Logistics window around one usage span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationWindow {
    pub entrega: NaiveDate,
    pub recogida: NaiveDate,
    /// The search found no allowed day and fell back to the usage day.
    pub entrega_fallback: bool,
    pub recogida_fallback: bool,
}

impl ReservationWindow {
    /// Delivery before `uso_ini`, pickup after `uso_fin`, both on allowed days.
    ///
    /// When a search exhausts its bound the usage day itself is used, even if
    /// it is not an allowed weekday; the flags record that this happened.
    pub fn around(uso_ini: NaiveDate, uso_fin: NaiveDate, allowed: &[Weekday], limit: u32) -> Self {
        let entrega = search_weekday(uso_ini, Direction::Backward, allowed, limit);
        let recogida = search_weekday(uso_fin, Direction::Forward, allowed, limit);

        if entrega.is_none() {
            warn!(%uso_ini, limit, "no delivery day found, using usage start day");
        }
        if recogida.is_none() {
            warn!(%uso_fin, limit, "no pickup day found, using usage end day");
        }

        Self {
            entrega: entrega.unwrap_or(uso_ini),
            recogida: recogida.unwrap_or(uso_fin),
            entrega_fallback: entrega.is_none(),
            recogida_fallback: recogida.is_none(),
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.entrega <= day && day <= self.recogida
    }
}
