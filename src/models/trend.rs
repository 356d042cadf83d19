use crate::models::zone::Zone;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub year: i32,
    pub frequency: f64,
    pub percentage: f64,
}

/// Year-ordered frequency/percentage series for one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTrend {
    pub zone: Zone,
    pub trend: Vec<TrendPoint>,
}

impl ZoneTrend {
    pub fn years(&self) -> Vec<f64> {
        self.trend.iter().map(|p| p.year as f64).collect()
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.trend.iter().map(|p| p.frequency).collect()
    }

    pub fn percentages(&self) -> Vec<f64> {
        self.trend.iter().map(|p| p.percentage).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub year: i32,
    pub frequency: Option<f64>,
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAnalysis {
    pub zone: Zone,
    pub frequency_regression: Option<Regression>,
    pub percentage_regression: Option<Regression>,
    pub frequency_ewma: Vec<f64>,
    pub percentage_ewma: Vec<f64>,
    pub frequency_change: Vec<Option<f64>>,
    pub frequency_cagr: Option<f64>,
    pub forecasts: Vec<Forecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub zones: Vec<ZoneAnalysis>,
    /// Correlation of Mid-Range frequency with combined three-point frequency.
    pub mid_range_to_three_correlation: Option<f64>,
    /// Points per 100 shots, weighted three-pointers minus mid-range, last observed year.
    pub efficiency_differential: Option<f64>,
}
