use crate::models::distribution::Distribution;
use crate::models::trend::{TrendPoint, ZoneTrend};
use crate::models::zone::Zone;

/// Pivot year-ordered distributions into one series per zone.
///
/// Always returns every zone in the vocabulary; a zone missing from a year reads as 0.
pub fn compose_trends(distributions: &[(i32, &Distribution)]) -> Vec<ZoneTrend> {
    Zone::ALL
        .into_iter()
        .map(|zone| ZoneTrend {
            zone,
            trend: distributions
                .iter()
                .map(|(year, dist)| TrendPoint {
                    year: *year,
                    frequency: dist.frequency_of(zone.label()),
                    percentage: dist.percentage_of(zone.label()),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate::aggregate;
    use crate::analysis::aggregate::tests::shot;

    #[test]
    fn every_zone_appears_even_without_data() {
        let dist = aggregate(&[shot("Paint", 5.0, 5.0, true)], 2019).expect("aggregate");
        let trends = compose_trends(&[(2019, &dist)]);

        assert_eq!(trends.len(), 6);
        let zones: Vec<Zone> = trends.iter().map(|t| t.zone).collect();
        assert_eq!(zones, Zone::ALL.to_vec());

        let backcourt = &trends[5];
        assert_eq!(backcourt.trend.len(), 1);
        assert_eq!(backcourt.trend[0].frequency, 0.0);
        assert_eq!(backcourt.trend[0].percentage, 0.0);

        let paint = &trends[1];
        assert_eq!(paint.trend[0].frequency, 100.0);
        assert_eq!(paint.trend[0].percentage, 100.0);
    }

    #[test]
    fn keeps_year_order_of_input() {
        let a = aggregate(&[shot("Mid-Range", 12.0, 8.0, true)], 2017).expect("aggregate");
        let b = aggregate(&[shot("Mid-Range", 12.0, 8.0, false)], 2018).expect("aggregate");

        let trends = compose_trends(&[(2017, &a), (2018, &b)]);
        let mid = trends
            .iter()
            .find(|t| t.zone == Zone::MidRange)
            .expect("mid-range trend");

        let years: Vec<i32> = mid.trend.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2017, 2018]);
        assert_eq!(mid.trend[0].percentage, 100.0);
        assert_eq!(mid.trend[1].percentage, 0.0);
    }

    #[test]
    fn no_years_gives_empty_series() {
        let trends = compose_trends(&[]);
        assert_eq!(trends.len(), 6);
        assert!(trends.iter().all(|t| t.trend.is_empty()));
    }
}
