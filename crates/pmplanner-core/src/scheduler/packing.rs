//! Transient packing state for one generation run.
//!
//! Built fresh by every `generate_draft` call and dropped when it returns.

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, NaiveDateTime};

use crate::calendar::week_start;

/// Per-(day, worker) next-free time plus per-(week, worker) hours packed so far.
#[derive(Debug, Default)]
pub struct PackingCursor {
    next_free: HashMap<(NaiveDate, String), NaiveDateTime>,
    packed_hours: HashMap<(NaiveDate, String), u32>,
}

impl PackingCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Earliest start on `day` for a block worked by all of `workers`.
    pub fn earliest_start(
        &self,
        day: NaiveDate,
        opening: NaiveDateTime,
        workers: &BTreeSet<String>,
    ) -> NaiveDateTime {
        workers
            .iter()
            .filter_map(|w| self.next_free.get(&(day, w.clone())))
            .copied()
            .fold(opening, NaiveDateTime::max)
    }

    /// Hours packed in this run for `worker` in the week containing `day`.
    pub fn packed_in_week(&self, worker: &str, day: NaiveDate) -> u32 {
        self.packed_hours
            .get(&(week_start(day), worker.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Record a placement: every worker is busy until `end`.
    pub fn occupy(&mut self, day: NaiveDate, workers: &BTreeSet<String>, end: NaiveDateTime, hours: u32) {
        for worker in workers {
            let cursor = self.next_free.entry((day, worker.clone())).or_insert(end);
            if *cursor < end {
                *cursor = end;
            }
            *self
                .packed_hours
                .entry((week_start(day), worker.clone()))
                .or_insert(0) += hours;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workers(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn earliest_start_takes_latest_worker_cursor() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let opening = day.and_hms_opt(8, 0, 0).unwrap();
        let mut cursor = PackingCursor::new();
        assert_eq!(cursor.earliest_start(day, opening, &workers(&["a", "b"])), opening);

        cursor.occupy(day, &workers(&["a"]), day.and_hms_opt(10, 0, 0).unwrap(), 2);
        cursor.occupy(day, &workers(&["b"]), day.and_hms_opt(12, 0, 0).unwrap(), 4);
        assert_eq!(
            cursor.earliest_start(day, opening, &workers(&["a", "b"])),
            day.and_hms_opt(12, 0, 0).unwrap()
        );
        assert_eq!(
            cursor.earliest_start(day, opening, &workers(&["a"])),
            day.and_hms_opt(10, 0, 0).unwrap()
        );
    }

    #[test]
    fn packed_hours_accumulate_per_week() {
        let tue = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let thu = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
        let next_mon = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut cursor = PackingCursor::new();
        cursor.occupy(tue, &workers(&["a"]), tue.and_hms_opt(11, 0, 0).unwrap(), 3);
        cursor.occupy(thu, &workers(&["a"]), thu.and_hms_opt(12, 0, 0).unwrap(), 4);
        assert_eq!(cursor.packed_in_week("a", thu), 7);
        assert_eq!(cursor.packed_in_week("a", next_mon), 0);
    }
}
