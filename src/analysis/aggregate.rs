use crate::error::AggregateError;
use crate::models::distribution::{Distribution, SpatialBin, ZoneStats};
use crate::models::shot::ShotEvent;
use crate::models::zone::Zone;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Round to one decimal place, half away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Nearest integer foot, ties toward positive infinity (`-2.5` -> `-2`, `2.5` -> `3`).
pub fn bin_coordinate(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Reduce one season of shots into its zone and spatial summary.
///
/// Order-independent except for the bin label, which keeps the zone of the
/// first shot that landed in the bin.
pub fn aggregate(shots: &[ShotEvent], year: i32) -> Result<Distribution, AggregateError> {
    let mut shot_zones: BTreeMap<String, ZoneStats> = BTreeMap::new();
    let mut bins: HashMap<(i64, i64), SpatialBin> = HashMap::new();

    for (index, shot) in shots.iter().enumerate() {
        validate_shot(index, shot)?;

        let stats = shot_zones.entry(shot.shot_zone.clone()).or_default();
        stats.total += 1;
        if shot.is_made() {
            stats.made += 1;
        } else {
            stats.missed += 1;
        }

        let bin_x = bin_coordinate(shot.x);
        let bin_y = bin_coordinate(shot.y);
        let bin = bins.entry((bin_x, bin_y)).or_insert_with(|| SpatialBin {
            x: bin_x,
            y: bin_y,
            count: 0,
            made: 0,
            zone: shot.shot_zone.clone(),
        });
        bin.count += 1;
        if shot.is_made() {
            bin.made += 1;
        }
    }

    let total_shots = shots.len() as u64;
    let mut zone_frequency = BTreeMap::new();
    let mut zone_percentage = BTreeMap::new();

    for (zone, stats) in &shot_zones {
        zone_frequency.insert(
            zone.clone(),
            round1(stats.total as f64 / total_shots as f64 * 100.0),
        );
        zone_percentage.insert(
            zone.clone(),
            round1(stats.made as f64 / stats.total as f64 * 100.0),
        );
    }

    let mut coordinates: Vec<SpatialBin> = bins.into_values().collect();
    coordinates.sort_by_key(|bin| (bin.x, bin.y));

    Ok(Distribution {
        year,
        total_shots,
        shot_zones,
        zone_frequency,
        zone_percentage,
        coordinates,
    })
}

fn validate_shot(index: usize, shot: &ShotEvent) -> Result<(), AggregateError> {
    let reason = if !shot.x.is_finite() || !shot.y.is_finite() {
        Some(format!("non-finite coordinates ({}, {})", shot.x, shot.y))
    } else if !shot.shot_distance.is_finite() {
        Some("non-finite shot distance".to_string())
    } else if shot.shot_zone.trim().is_empty() {
        Some("empty shot zone".to_string())
    } else {
        None
    };

    match reason {
        Some(reason) => Err(AggregateError::MalformedInput { index, reason }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueAudit {
    pub checked: usize,
    pub inconsistent: usize,
    pub sample_ids: Vec<String>,
}

const AUDIT_SAMPLE_LIMIT: usize = 5;

/// Count shots whose point value disagrees with their zone. Unknown zones are skipped.
pub fn audit_shot_values(shots: &[ShotEvent]) -> ValueAudit {
    let mut audit = ValueAudit::default();

    for shot in shots {
        let Some(zone) = Zone::from_label(&shot.shot_zone) else {
            continue;
        };
        audit.checked += 1;
        if shot.shot_value != zone.expected_shot_value() {
            audit.inconsistent += 1;
            if audit.sample_ids.len() < AUDIT_SAMPLE_LIMIT {
                audit.sample_ids.push(shot.id.clone());
            }
        }
    }

    audit
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::shot::ShotResult;
    use proptest::prelude::*;

    pub(crate) fn shot(zone: &str, x: f64, y: f64, made: bool) -> ShotEvent {
        let value = Zone::from_label(zone)
            .map(Zone::expected_shot_value)
            .unwrap_or(2);
        ShotEvent {
            id: format!("{zone}-{x}-{y}"),
            game_id: "g1".to_string(),
            player_id: "p1".to_string(),
            player_name: "Test Player".to_string(),
            team_id: "t1".to_string(),
            team_name: "Test Team".to_string(),
            season: 2020,
            x,
            y,
            shot_zone: zone.to_string(),
            shot_distance: (x * x + y * y).sqrt(),
            shot_result: if made { ShotResult::Made } else { ShotResult::Missed },
            shot_value: value,
            game_date: "2020-01-15".to_string(),
        }
    }

    #[test]
    fn mid_range_scenario_matches_expected_summary() {
        let shots: Vec<ShotEvent> = (0..10)
            .map(|i| shot("Mid-Range", 12.0 + i as f64, 8.0, i < 6))
            .collect();

        let dist = aggregate(&shots, 2020).expect("aggregate");

        assert_eq!(dist.total_shots, 10);
        assert_eq!(
            dist.shot_zones["Mid-Range"],
            ZoneStats {
                made: 6,
                missed: 4,
                total: 10
            }
        );
        assert_eq!(dist.zone_frequency["Mid-Range"], 100.0);
        assert_eq!(dist.zone_percentage["Mid-Range"], 60.0);
        assert_eq!(dist.shot_zones.len(), 1);
    }

    #[test]
    fn nearby_shots_share_a_bin() {
        let shots = vec![
            shot("Paint", 3.4, 1.2, true),
            shot("Paint", 2.6, 0.9, false),
        ];

        let dist = aggregate(&shots, 2020).expect("aggregate");

        assert_eq!(dist.coordinates.len(), 1);
        let bin = &dist.coordinates[0];
        assert_eq!((bin.x, bin.y), (3, 1));
        assert_eq!(bin.count, 2);
        assert_eq!(bin.made, 1);
    }

    #[test]
    fn bin_ties_round_toward_positive_infinity() {
        assert_eq!(bin_coordinate(2.5), 3);
        assert_eq!(bin_coordinate(-2.5), -2);
        assert_eq!(bin_coordinate(-2.6), -3);
        assert_eq!(bin_coordinate(-0.2), 0);

        let shots = vec![
            shot("Corner 3", -22.5, 1.5, true),
            shot("Corner 3", -22.4, 1.6, false),
        ];
        let dist = aggregate(&shots, 2020).expect("aggregate");

        assert_eq!(dist.coordinates.len(), 1);
        assert_eq!((dist.coordinates[0].x, dist.coordinates[0].y), (-22, 2));
        assert_eq!(dist.coordinates[0].count, 2);
    }

    #[test]
    fn bin_label_keeps_first_zone() {
        let shots = vec![
            shot("Restricted Area", 3.9, 0.1, false),
            shot("Paint", 4.1, -0.2, true),
        ];

        let dist = aggregate(&shots, 2020).expect("aggregate");

        assert_eq!(dist.coordinates.len(), 1);
        assert_eq!(dist.coordinates[0].zone, "Restricted Area");
        assert_eq!(dist.coordinates[0].count, 2);
    }

    #[test]
    fn unknown_zone_strings_become_keys() {
        let shots = vec![shot("Logo", 0.0, 30.0, true)];
        let dist = aggregate(&shots, 2020).expect("aggregate");
        assert_eq!(dist.shot_zones["Logo"].total, 1);
    }

    #[test]
    fn empty_season_yields_empty_maps() {
        let dist = aggregate(&[], 2020).expect("aggregate");
        assert_eq!(dist.total_shots, 0);
        assert!(dist.shot_zones.is_empty());
        assert!(dist.zone_frequency.is_empty());
        assert!(dist.coordinates.is_empty());
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let shots = vec![shot("Paint", 1.0, 1.0, true), shot("Paint", f64::NAN, 1.0, true)];
        let err = aggregate(&shots, 2020).expect_err("should fail");
        assert!(matches!(err, AggregateError::MalformedInput { index: 1, .. }));
    }

    #[test]
    fn rejects_empty_zone() {
        let shots = vec![shot("  ", 1.0, 1.0, true)];
        assert!(aggregate(&shots, 2020).is_err());
    }

    #[test]
    fn rounds_one_decimal_half_away_from_zero() {
        assert_eq!(round1(33.333), 33.3);
        assert_eq!(round1(66.666), 66.7);
        assert_eq!(round1(12.25), 12.3);
    }

    #[test]
    fn audit_flags_mismatched_point_values() {
        let mut bad = shot("Corner 3", 23.0, 2.0, true);
        bad.shot_value = 2;
        let shots = vec![shot("Paint", 5.0, 5.0, true), bad, shot("Logo", 0.0, 30.0, false)];

        let audit = audit_shot_values(&shots);

        assert_eq!(audit.checked, 2);
        assert_eq!(audit.inconsistent, 1);
        assert_eq!(audit.sample_ids.len(), 1);
    }

    fn arb_shot() -> impl Strategy<Value = ShotEvent> {
        (0usize..Zone::ALL.len(), -25.0f64..25.0, -5.0f64..45.0, any::<bool>())
            .prop_map(|(zone, x, y, made)| shot(Zone::ALL[zone].label(), x, y, made))
    }

    proptest! {
        #[test]
        fn conserves_counts(shots in prop::collection::vec(arb_shot(), 1..200)) {
            let dist = aggregate(&shots, 2021).unwrap();
            prop_assert_eq!(dist.total_shots, shots.len() as u64);
            let zone_total: u64 = dist.shot_zones.values().map(|s| s.total).sum();
            prop_assert_eq!(zone_total, shots.len() as u64);
            let bin_total: u64 = dist.coordinates.iter().map(|b| b.count).sum();
            prop_assert_eq!(bin_total, shots.len() as u64);
        }

        #[test]
        fn frequencies_sum_to_hundred(shots in prop::collection::vec(arb_shot(), 1..200)) {
            let dist = aggregate(&shots, 2021).unwrap();
            let sum: f64 = dist.zone_frequency.values().sum();
            let tolerance = 0.1 * dist.zone_frequency.len() as f64 + 1e-9;
            prop_assert!((sum - 100.0).abs() <= tolerance);
        }

        #[test]
        fn percentages_are_bounded(shots in prop::collection::vec(arb_shot(), 1..200)) {
            let dist = aggregate(&shots, 2021).unwrap();
            for pct in dist.zone_percentage.values() {
                prop_assert!((0.0..=100.0).contains(pct));
            }
        }

        #[test]
        fn zone_summary_ignores_input_order(shots in prop::collection::vec(arb_shot(), 1..100)) {
            let forward = aggregate(&shots, 2021).unwrap();
            let mut reversed = shots.clone();
            reversed.reverse();
            let backward = aggregate(&reversed, 2021).unwrap();
            prop_assert_eq!(forward.shot_zones, backward.shot_zones);
            prop_assert_eq!(forward.zone_frequency, backward.zone_frequency);
            prop_assert_eq!(forward.zone_percentage, backward.zone_percentage);
        }

        #[test]
        fn repeated_aggregation_is_identical(shots in prop::collection::vec(arb_shot(), 0..100)) {
            let first = aggregate(&shots, 2021).unwrap();
            let second = aggregate(&shots, 2021).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
