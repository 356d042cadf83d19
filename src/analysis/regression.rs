use crate::models::trend::{Forecast, Regression, TrendAnalysis, ZoneAnalysis, ZoneTrend};
use crate::models::zone::Zone;

pub const DEFAULT_EWMA_ALPHA: f64 = 0.3;

/// Ordinary least squares fit of `ys` against `xs`.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Option<Regression> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);

    let x_mean = xs.iter().sum::<f64>() / n as f64;
    let y_mean = ys.iter().sum::<f64>() / n as f64;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        sxx += (x - x_mean) * (x - x_mean);
        sxy += (x - x_mean) * (y - y_mean);
    }
    if sxx <= f64::EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let total: f64 = ys.iter().map(|y| (y - y_mean).powi(2)).sum();
    let explained: f64 = xs
        .iter()
        .map(|x| (slope * x + intercept - y_mean).powi(2))
        .sum();
    let r_squared = if total <= f64::EPSILON {
        0.0
    } else {
        (explained / total).clamp(0.0, 1.0)
    };

    Some(Regression {
        slope,
        intercept,
        r_squared,
    })
}

pub fn predict(regression: &Regression, x: f64) -> f64 {
    regression.slope * x + regression.intercept
}

/// Exponentially weighted moving average seeded with the first value.
pub fn ewma(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        let next = if i == 0 {
            *value
        } else {
            alpha * value + (1.0 - alpha) * out[i - 1]
        };
        out.push(next);
    }
    out
}

/// Year-over-year percent change; `None` where the previous value is zero.
pub fn rate_of_change(values: &[f64]) -> Vec<Option<f64>> {
    values
        .windows(2)
        .map(|pair| {
            if pair[0] == 0.0 {
                None
            } else {
                Some((pair[1] - pair[0]) / pair[0] * 100.0)
            }
        })
        .collect()
}

/// Compound annual growth rate as a fraction.
pub fn cagr(first: f64, last: f64, periods: f64) -> Option<f64> {
    if first <= 0.0 || last < 0.0 || periods <= 0.0 {
        return None;
    }
    Some((last / first).powf(1.0 / periods) - 1.0)
}

pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let x_mean = xs[..n].iter().sum::<f64>() / n as f64;
    let y_mean = ys[..n].iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        sxy += (x - x_mean) * (y - y_mean);
        sxx += (x - x_mean).powi(2);
        syy += (y - y_mean).powi(2);
    }
    let denom = (sxx * syy).sqrt();
    if denom <= f64::EPSILON {
        None
    } else {
        Some(sxy / denom)
    }
}

pub fn analyze_zone(trend: &ZoneTrend, horizon: u32) -> ZoneAnalysis {
    let years = trend.years();
    let frequencies = trend.frequencies();
    let percentages = trend.percentages();

    let frequency_regression = linear_regression(&years, &frequencies);
    let percentage_regression = linear_regression(&years, &percentages);

    let frequency_cagr = match (trend.trend.first(), trend.trend.last()) {
        (Some(first), Some(last)) => cagr(
            first.frequency,
            last.frequency,
            (last.year - first.year) as f64,
        ),
        _ => None,
    };

    let forecasts = match trend.trend.last() {
        Some(last) => (1..=horizon as i32)
            .map(|offset| {
                let year = last.year + offset;
                Forecast {
                    year,
                    frequency: frequency_regression
                        .as_ref()
                        .map(|r| predict(r, year as f64)),
                    percentage: percentage_regression
                        .as_ref()
                        .map(|r| predict(r, year as f64)),
                }
            })
            .collect(),
        None => Vec::new(),
    };

    ZoneAnalysis {
        zone: trend.zone,
        frequency_regression,
        percentage_regression,
        frequency_ewma: ewma(&frequencies, DEFAULT_EWMA_ALPHA),
        percentage_ewma: ewma(&percentages, DEFAULT_EWMA_ALPHA),
        frequency_change: rate_of_change(&frequencies),
        frequency_cagr,
        forecasts,
    }
}

pub fn analyze_trends(trends: &[ZoneTrend], horizon: u32) -> TrendAnalysis {
    let find = |zone: Zone| trends.iter().find(|t| t.zone == zone);

    let mut mid_range_to_three_correlation = None;
    let mut efficiency_differential = None;

    if let (Some(mid), Some(corner), Some(above)) = (
        find(Zone::MidRange),
        find(Zone::CornerThree),
        find(Zone::AboveBreakThree),
    ) {
        let threes: Vec<f64> = corner
            .frequencies()
            .iter()
            .zip(above.frequencies())
            .map(|(c, a)| c + a)
            .collect();
        mid_range_to_three_correlation = pearson(&mid.frequencies(), &threes);
        efficiency_differential = last_year_differential(mid, corner, above);
    }

    TrendAnalysis {
        zones: trends.iter().map(|t| analyze_zone(t, horizon)).collect(),
        mid_range_to_three_correlation,
        efficiency_differential,
    }
}

fn last_year_differential(mid: &ZoneTrend, corner: &ZoneTrend, above: &ZoneTrend) -> Option<f64> {
    let mid = mid.trend.last()?;
    let corner = corner.trend.last()?;
    let above = above.trend.last()?;

    let three_volume = corner.frequency + above.frequency;
    if three_volume <= 0.0 {
        return None;
    }
    let weighted_three = (corner.frequency * corner.percentage * 3.0
        + above.frequency * above.percentage * 3.0)
        / three_volume;
    Some(weighted_three - mid.percentage * 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trend::TrendPoint;

    fn series(zone: Zone, points: &[(i32, f64, f64)]) -> ZoneTrend {
        ZoneTrend {
            zone,
            trend: points
                .iter()
                .map(|(year, frequency, percentage)| TrendPoint {
                    year: *year,
                    frequency: *frequency,
                    percentage: *percentage,
                })
                .collect(),
        }
    }

    #[test]
    fn fits_exact_line() {
        let fit = linear_regression(&[2017.0, 2018.0, 2019.0], &[30.0, 28.0, 26.0]).expect("fit");
        assert!((fit.slope + 2.0).abs() < 1e-9);
        assert!((predict(&fit, 2020.0) - 24.0).abs() < 1e-6);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn regression_needs_two_distinct_points() {
        assert!(linear_regression(&[2017.0], &[1.0]).is_none());
        assert!(linear_regression(&[2017.0, 2017.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn flat_series_has_zero_r_squared() {
        let fit = linear_regression(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).expect("fit");
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 0.0);
    }

    #[test]
    fn ewma_smooths_toward_new_values() {
        let smoothed = ewma(&[10.0, 20.0], 0.3);
        assert_eq!(smoothed[0], 10.0);
        assert!((smoothed[1] - 13.0).abs() < 1e-9);
    }

    #[test]
    fn rate_of_change_skips_zero_base() {
        assert_eq!(rate_of_change(&[0.0, 5.0, 10.0]), vec![None, Some(100.0)]);
    }

    #[test]
    fn cagr_requires_positive_start() {
        assert!(cagr(0.0, 10.0, 2.0).is_none());
        let growth = cagr(10.0, 40.0, 2.0).expect("growth");
        assert!((growth - 1.0).abs() < 1e-9);
    }

    #[test]
    fn forecasts_extend_past_last_year() {
        let trend = series(
            Zone::AboveBreakThree,
            &[(2017, 20.0, 35.0), (2018, 22.0, 35.5), (2019, 24.0, 36.0)],
        );
        let analysis = analyze_zone(&trend, 2);

        let years: Vec<i32> = analysis.forecasts.iter().map(|f| f.year).collect();
        assert_eq!(years, vec![2020, 2021]);
        let next = analysis.forecasts[0].frequency.expect("frequency forecast");
        assert!((next - 26.0).abs() < 1e-6);
    }

    #[test]
    fn detects_mid_range_displacement() {
        let trends = vec![
            series(Zone::MidRange, &[(2017, 30.0, 40.0), (2018, 25.0, 40.0), (2019, 20.0, 40.0)]),
            series(Zone::CornerThree, &[(2017, 5.0, 38.0), (2018, 7.0, 38.0), (2019, 9.0, 38.0)]),
            series(Zone::AboveBreakThree, &[(2017, 20.0, 35.0), (2018, 23.0, 35.0), (2019, 26.0, 35.0)]),
        ];

        let analysis = analyze_trends(&trends, 2);

        let correlation = analysis.mid_range_to_three_correlation.expect("correlation");
        assert!(correlation < -0.99);
        let differential = analysis.efficiency_differential.expect("differential");
        assert!(differential > 0.0);
        assert_eq!(analysis.zones.len(), 3);
    }
}
