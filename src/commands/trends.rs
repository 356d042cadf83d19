use crate::analysis::regression::analyze_trends;
use crate::analysis::trends::compose_trends;
use crate::commands::scheduler::AggregationScheduler;
use crate::error::{CoreError, CoreResult};
use crate::models::distribution::Distribution;
use crate::models::trend::{TrendAnalysis, ZoneTrend};
use futures::future::try_join_all;
use std::sync::Arc;

/// Builds per-zone series across every season the store knows about.
pub struct TrendComposer {
    scheduler: Arc<AggregationScheduler>,
}

impl TrendComposer {
    pub fn new(scheduler: Arc<AggregationScheduler>) -> Self {
        Self { scheduler }
    }

    /// All-or-nothing: the first failing year fails the whole request.
    ///
    /// Per-year failures surface as `ComputeFailure`. A store that cannot list
    /// its seasons fails with `Discovery`, since there is no year to blame.
    pub async fn get_trends(&self) -> CoreResult<Vec<ZoneTrend>> {
        let mut years = self
            .scheduler
            .store()
            .list_available_years()
            .await
            .map_err(|e| CoreError::Discovery(e.to_string()))?;
        years.sort_unstable();
        years.dedup();

        log::debug!("Composing trends over {} seasons: {years:?}", years.len());

        let distributions = try_join_all(years.iter().map(|&year| {
            let scheduler = Arc::clone(&self.scheduler);
            async move {
                scheduler
                    .get_distribution(year)
                    .await
                    .map(|dist| (year, dist))
                    .map_err(|e| escalate(year, e))
            }
        }))
        .await
        .inspect_err(|e| log::error!("Trend computation failed: {e}"))?;

        let by_year: Vec<(i32, &Distribution)> = distributions
            .iter()
            .map(|(year, dist)| (*year, dist.as_ref()))
            .collect();

        Ok(compose_trends(&by_year))
    }

    pub async fn get_trend_analysis(&self, horizon: u32) -> CoreResult<TrendAnalysis> {
        let trends = self.get_trends().await?;
        Ok(analyze_trends(&trends, horizon))
    }
}

// Inside a trend request every per-year failure is a server-side failure.
fn escalate(year: i32, err: CoreError) -> CoreError {
    match err {
        CoreError::ComputeFailure { .. } => err,
        other => CoreError::compute(year, other.to_string()),
    }
}
