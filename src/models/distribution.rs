use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneStats {
    pub made: u64,
    pub missed: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialBin {
    pub x: i64,
    pub y: i64,
    pub count: u64,
    pub made: u64,
    pub zone: String, // label of the first shot that landed in the bin
}

/// Aggregated summary of one season. Zones absent from the input have no entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub year: i32,
    pub total_shots: u64,
    pub shot_zones: BTreeMap<String, ZoneStats>,
    pub zone_frequency: BTreeMap<String, f64>,
    pub zone_percentage: BTreeMap<String, f64>,
    pub coordinates: Vec<SpatialBin>,
}

impl Distribution {
    pub fn frequency_of(&self, zone: &str) -> f64 {
        self.zone_frequency.get(zone).copied().unwrap_or(0.0)
    }

    pub fn percentage_of(&self, zone: &str) -> f64 {
        self.zone_percentage.get(zone).copied().unwrap_or(0.0)
    }
}
