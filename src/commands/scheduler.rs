use crate::analysis::aggregate::{aggregate, audit_shot_values};
use crate::commands::db::DistributionCache;
use crate::commands::store::ShotRecordStore;
use crate::error::{AggregateError, CoreError, CoreResult};
use crate::models::distribution::Distribution;
use crate::models::shot::ShotEvent;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, Semaphore};

/// Reduction run on a worker for one season.
pub type Reducer = fn(&[ShotEvent], i32) -> Result<Distribution, AggregateError>;

/// Per-year cache-or-compute orchestration.
///
/// Aggregation runs on the blocking pool with the shot list moved in and the
/// distribution moved out. Concurrent misses for the same year queue on a
/// per-year lock, so only the first one computes; the rest find the cached
/// entry once the write-back releases the lock.
pub struct AggregationScheduler {
    store: Arc<dyn ShotRecordStore>,
    cache: Arc<dyn DistributionCache>,
    workers: Arc<Semaphore>,
    reducer: Reducer,
    inflight: Mutex<HashMap<i32, Arc<Mutex<()>>>>,
    year_window: Option<(i32, i32)>,
    computations: AtomicUsize,
}

impl AggregationScheduler {
    pub fn new(
        store: Arc<dyn ShotRecordStore>,
        cache: Arc<dyn DistributionCache>,
        worker_limit: usize,
    ) -> Self {
        Self {
            store,
            cache,
            workers: Arc::new(Semaphore::new(worker_limit.max(1))),
            reducer: aggregate,
            inflight: Mutex::new(HashMap::new()),
            year_window: None,
            computations: AtomicUsize::new(0),
        }
    }

    /// Reject years outside `[min, max]` before touching the store.
    pub fn with_year_window(mut self, min: i32, max: i32) -> Self {
        self.year_window = Some((min, max));
        self
    }

    /// Swap the reduction, e.g. to fail or panic in tests.
    pub fn with_reducer(mut self, reducer: Reducer) -> Self {
        self.reducer = reducer;
        self
    }

    pub fn store(&self) -> &Arc<dyn ShotRecordStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<dyn DistributionCache> {
        &self.cache
    }

    /// Number of aggregations dispatched to workers so far.
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::SeqCst)
    }

    pub async fn get_distribution(&self, year: i32) -> CoreResult<Arc<Distribution>> {
        if let Some((min, max)) = self.year_window {
            if year < min || year > max {
                return Err(CoreError::InvalidYear { year, min, max });
            }
        }

        if let Some(hit) = self.cached(year).await {
            log::debug!("Cache hit for {year}");
            return Ok(hit);
        }

        let guard = self.acquire_year(year).await;

        // Another caller may have finished while we waited on the lock.
        if let Some(hit) = self.cached(year).await {
            log::debug!("Cache filled for {year} while waiting");
            return Ok(hit);
        }

        let shots = self
            .store
            .read_season_shots(year)
            .await
            .map_err(|e| CoreError::from_store(year, e))?;

        let start = std::time::Instant::now();
        let shot_count = shots.len();
        let distribution = Arc::new(self.dispatch(year, shots).await?);
        log::info!(
            "Aggregated {shot_count} shots for {year} in {}ms",
            start.elapsed().as_millis()
        );

        self.write_back(year, Arc::clone(&distribution), guard);
        Ok(distribution)
    }

    /// Wait for pending cache write-backs to land.
    pub async fn flush(&self) {
        let locks: Vec<Arc<Mutex<()>>> = {
            let inflight = self.inflight.lock().await;
            inflight.values().cloned().collect()
        };
        for lock in locks {
            drop(lock.lock().await);
        }
    }

    async fn acquire_year(&self, year: i32) -> OwnedMutexGuard<()> {
        let lock = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(
                inflight
                    .entry(year)
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    async fn cached(&self, year: i32) -> Option<Arc<Distribution>> {
        let cache = Arc::clone(&self.cache);
        match tokio::task::spawn_blocking(move || cache.get(year)).await {
            Ok(Ok(hit)) => hit.map(Arc::new),
            Ok(Err(e)) => {
                log::warn!("Cache read failed for {year}, recomputing: {e}");
                None
            }
            Err(e) => {
                log::warn!("Cache read task failed for {year}: {e}");
                None
            }
        }
    }

    async fn dispatch(
        &self,
        year: i32,
        shots: Vec<ShotEvent>,
    ) -> CoreResult<Distribution> {
        let _permit = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|_| CoreError::compute(year, "worker pool closed"))?;

        self.computations.fetch_add(1, Ordering::SeqCst);

        let reducer = self.reducer;
        let joined = tokio::task::spawn_blocking(move || {
            let audit = audit_shot_values(&shots);
            if audit.inconsistent > 0 {
                log::warn!(
                    "{} of {} shots in {year} carry a point value inconsistent with their zone (e.g. {:?})",
                    audit.inconsistent,
                    audit.checked,
                    audit.sample_ids
                );
            }
            reducer(&shots, year)
        })
        .await;

        match joined {
            Ok(Ok(distribution)) => Ok(distribution),
            Ok(Err(e)) => {
                log::error!("Aggregation rejected input for {year}: {e}");
                Err(CoreError::compute(year, e.to_string()))
            }
            Err(e) => {
                log::error!("Aggregation worker for {year} terminated abnormally: {e}");
                Err(CoreError::compute(year, format!("worker terminated: {e}")))
            }
        }
    }

    /// Persist without blocking the caller. The year lock is held until the
    /// write lands so queued callers see the entry.
    fn write_back(&self, year: i32, distribution: Arc<Distribution>, guard: OwnedMutexGuard<()>) {
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            let _guard = guard;
            let written = tokio::task::spawn_blocking(move || cache.put(year, &distribution)).await;
            match written {
                Ok(Ok(())) => log::debug!("Cached distribution for {year}"),
                Ok(Err(e)) => log::warn!("Failed to cache distribution for {year}: {e}"),
                Err(e) => log::warn!("Cache write task for {year} failed: {e}"),
            }
        });
    }
}
