//! JSON seed documents for the stores.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::logistics::{Machine, UsageInterval};
use crate::schedule::{Definition, Holiday, SiteHours, WorkItem};

/// Everything a store needs to plan a site, as one JSON document.
///
/// Every section is optional so a fixture can carry only what it seeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub hours: Vec<SiteHours>,
    #[serde(default)]
    pub holidays: Vec<Holiday>,
    #[serde(default)]
    pub machines: Vec<Machine>,
    #[serde(default)]
    pub usage: Vec<UsageInterval>,
    #[serde(default)]
    pub items: Vec<WorkItem>,
}

/// Row counts written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub definitions: usize,
    pub hours: usize,
    pub holidays: usize,
    pub machines: usize,
    pub usage: usize,
    pub items: usize,
}

impl Fixture {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a fixture file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid fixture.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(CoreError::Io)?;
        Self::from_json(&content)
    }

    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            definitions: self.definitions.len(),
            hours: self.hours.len(),
            holidays: self.holidays.len(),
            machines: self.machines.len(),
            usage: self.usage.len(),
            items: self.items.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_are_optional() {
        let fixture = Fixture::from_json(
            r#"{
                "machines": [
                    {"id": "m1", "company_id": "acme", "name": "Lift 12m", "machine_type": "lift"}
                ],
                "usage": [
                    {"id": "u1", "machine_id": "m1", "start": "2025-03-04T08:00:00", "end": "2025-03-06T17:00:00"}
                ]
            }"#,
        )
        .unwrap();
        assert!(fixture.definitions.is_empty());
        assert_eq!(fixture.summary().machines, 1);
        assert_eq!(fixture.usage[0].end.unwrap().to_string(), "2025-03-06 17:00:00");
        assert!(fixture.usage[0].plan_group_id.is_none());
    }

    #[test]
    fn definition_with_area_yield_rule() {
        let fixture = Fixture::from_json(
            r#"{
                "definitions": [{
                    "id": "d1",
                    "site_id": "hq",
                    "description": "Lawn mowing",
                    "frequency": "weekly",
                    "priority": "high",
                    "duration": {"kind": "area_yield", "area": 1200.0, "yield_rate": 400.0},
                    "workers": ["ana", "luis"]
                }]
            }"#,
        )
        .unwrap();
        let def = &fixture.definitions[0];
        assert!(def.active);
        assert_eq!(def.duration.block_hours(), Some(3));
        assert_eq!(def.workers.len(), 2);
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(matches!(
            Fixture::from_json("{\"items\": 3}"),
            Err(CoreError::Json(_))
        ));
    }
}
