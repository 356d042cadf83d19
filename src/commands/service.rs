use crate::commands::db::{DistributionCache, MemoryDistributionCache, SqliteDistributionCache};
use crate::commands::scheduler::AggregationScheduler;
use crate::commands::settings::EffectiveSettings;
use crate::commands::store::JsonFileStore;
use crate::commands::trends::TrendComposer;
use crate::error::{CoreError, CoreResult};
use crate::models::distribution::Distribution;
use crate::models::trend::{TrendAnalysis, ZoneTrend};
use std::sync::Arc;

/// Entry point for the boundary layer: settings in, distributions and trends out.
pub struct ShotService {
    scheduler: Arc<AggregationScheduler>,
    composer: TrendComposer,
    forecast_horizon: u32,
}

impl ShotService {
    pub fn from_settings(settings: &EffectiveSettings) -> CoreResult<Self> {
        let cache: Arc<dyn DistributionCache> = if settings.persist_cache {
            Arc::new(SqliteDistributionCache::open(&settings.cache_path)?)
        } else {
            log::info!("persistCache is off; distributions live for this process only");
            Arc::new(MemoryDistributionCache::new())
        };

        let store = Arc::new(JsonFileStore::new(
            settings.data_dir.clone(),
            settings.min_year,
            settings.max_year,
        ));

        let scheduler = Arc::new(
            AggregationScheduler::new(store, cache, settings.worker_limit)
                .with_year_window(settings.min_year, settings.max_year),
        );

        Ok(Self::with_scheduler(scheduler, settings.forecast_horizon))
    }

    pub fn with_scheduler(scheduler: Arc<AggregationScheduler>, forecast_horizon: u32) -> Self {
        Self {
            composer: TrendComposer::new(Arc::clone(&scheduler)),
            scheduler,
            forecast_horizon,
        }
    }

    pub async fn get_distribution(&self, year: i32) -> CoreResult<Arc<Distribution>> {
        self.scheduler.get_distribution(year).await
    }

    pub async fn get_trends(&self) -> CoreResult<Vec<ZoneTrend>> {
        self.composer.get_trends().await
    }

    pub async fn get_trend_analysis(&self) -> CoreResult<TrendAnalysis> {
        self.composer.get_trend_analysis(self.forecast_horizon).await
    }

    pub async fn available_years(&self) -> CoreResult<Vec<i32>> {
        self.scheduler
            .store()
            .list_available_years()
            .await
            .map_err(|e| CoreError::Discovery(e.to_string()))
    }

    pub async fn flush(&self) {
        self.scheduler.flush().await;
    }

    pub fn scheduler(&self) -> &Arc<AggregationScheduler> {
        &self.scheduler
    }
}
