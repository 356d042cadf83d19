use serde::{Deserialize, Serialize};

/// The fixed court-zone vocabulary, in canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Zone {
    #[serde(rename = "Restricted Area")]
    RestrictedArea,
    #[serde(rename = "Paint")]
    Paint,
    #[serde(rename = "Mid-Range")]
    MidRange,
    #[serde(rename = "Corner 3")]
    CornerThree,
    #[serde(rename = "Above Break 3")]
    AboveBreakThree,
    #[serde(rename = "Backcourt")]
    Backcourt,
}

impl Zone {
    pub const ALL: [Zone; 6] = [
        Zone::RestrictedArea,
        Zone::Paint,
        Zone::MidRange,
        Zone::CornerThree,
        Zone::AboveBreakThree,
        Zone::Backcourt,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Zone::RestrictedArea => "Restricted Area",
            Zone::Paint => "Paint",
            Zone::MidRange => "Mid-Range",
            Zone::CornerThree => "Corner 3",
            Zone::AboveBreakThree => "Above Break 3",
            Zone::Backcourt => "Backcourt",
        }
    }

    /// Hex color used by every chart that renders this zone.
    pub fn color(self) -> &'static str {
        match self {
            Zone::RestrictedArea => "#FF5733",
            Zone::Paint => "#FFC300",
            Zone::MidRange => "#36A2EB",
            Zone::CornerThree => "#4BC0C0",
            Zone::AboveBreakThree => "#9966FF",
            Zone::Backcourt => "#C9CBCF",
        }
    }

    pub fn from_label(label: &str) -> Option<Zone> {
        Zone::ALL.into_iter().find(|zone| zone.label() == label)
    }

    pub fn is_three(self) -> bool {
        matches!(self, Zone::CornerThree | Zone::AboveBreakThree | Zone::Backcourt)
    }

    pub fn expected_shot_value(self) -> u8 {
        if self.is_three() {
            3
        } else {
            2
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// Court geometry in feet, measured from the basket.
const RESTRICTED_RADIUS: f64 = 4.0;
const PAINT_RADIUS: f64 = 14.0;
const PAINT_HALF_WIDTH: f64 = 10.0;
const THREE_POINT_RADIUS: f64 = 23.75;
const CORNER_MIN_X: f64 = 22.0;
const CORNER_MAX_Y: f64 = 14.0;
const BACKCOURT_RADIUS: f64 = 47.0;

/// Classify a court coordinate into its zone.
pub fn classify_zone(x: f64, y: f64) -> Zone {
    let distance = (x * x + y * y).sqrt();

    if distance <= RESTRICTED_RADIUS {
        Zone::RestrictedArea
    } else if distance <= PAINT_RADIUS && x.abs() < PAINT_HALF_WIDTH {
        Zone::Paint
    } else if distance > THREE_POINT_RADIUS {
        if distance > BACKCOURT_RADIUS {
            Zone::Backcourt
        } else if x.abs() > CORNER_MIN_X && y < CORNER_MAX_Y {
            Zone::CornerThree
        } else {
            Zone::AboveBreakThree
        }
    } else {
        Zone::MidRange
    }
}
