use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotResult {
    Made,
    Missed,
}

/// A single shot attempt as written by the ingester. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotEvent {
    pub id: String,
    pub game_id: String,
    pub player_id: String,
    pub player_name: String,
    pub team_id: String,
    pub team_name: String,
    pub season: i32,
    pub x: f64,
    pub y: f64,
    pub shot_zone: String, // free-form; not validated against the zone vocabulary
    pub shot_distance: f64,
    pub shot_result: ShotResult,
    pub shot_value: u8,
    pub game_date: String,
}

impl ShotEvent {
    pub fn is_made(&self) -> bool {
        self.shot_result == ShotResult::Made
    }
}
