//! Caller-facing operations over the two caches.

use std::sync::Arc;

use chrono::FixedOffset;
use tracing::debug;

use crate::domain::distance_resolver::DistanceResolver;
use crate::domain::ports::PersistentCache;
use crate::domain::refresh_scheduler::{RefreshError, RefreshOutcome, RefreshScheduler};
use crate::domain::stats::TripStats;
use crate::domain::{Credentials, Trip};

/// Whether a caller waits for the refresh it triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Wait for the refresh to finish and surface its failure.
    #[default]
    Wait,
    /// Trigger a refresh and answer from the cache straight away.
    Cached,
}

/// Collaborators shared by [`Bikage`].
pub struct BikagePorts {
    /// Durable trip and distance store.
    pub cache: Arc<dyn PersistentCache>,
    /// Trip-history refresh coordinator.
    pub scheduler: RefreshScheduler,
    /// Distance resolver.
    pub resolver: DistanceResolver,
}

/// Trip history and riding statistics for bike-share riders.
#[derive(Clone)]
pub struct Bikage {
    cache: Arc<dyn PersistentCache>,
    scheduler: RefreshScheduler,
    resolver: DistanceResolver,
    offset: FixedOffset,
}

impl Bikage {
    /// Build the service. Days in statistics use `offset`.
    pub fn new(ports: BikagePorts, offset: FixedOffset) -> Self {
        Self {
            cache: ports.cache,
            scheduler: ports.scheduler,
            resolver: ports.resolver,
            offset,
        }
    }

    /// Refresh the rider's history according to `mode`, then return the
    /// cached trips, oldest first.
    pub async fn trips(
        &self,
        credentials: &Credentials,
        mode: RefreshMode,
    ) -> Result<Vec<Trip>, RefreshError> {
        let ticket = self.scheduler.request(credentials.clone()).await;
        match mode {
            RefreshMode::Wait => {
                let outcome = ticket.await?;
                debug!(
                    user = credentials.username(),
                    refreshed = matches!(outcome, RefreshOutcome::Refreshed { .. }),
                    "refresh answered"
                );
            }
            RefreshMode::Cached => drop(ticket),
        }
        Ok(self.cached_trips(credentials.username()).await)
    }

    /// Statistics over the rider's trips.
    pub async fn stats(
        &self,
        credentials: &Credentials,
        mode: RefreshMode,
    ) -> Result<TripStats, RefreshError> {
        let trips = self.trips(credentials, mode).await?;
        let distances = self.resolver.get_for_trips(&trips).await;
        Ok(TripStats::compute(&trips, &distances, self.offset))
    }

    /// Trips already in the cache, without triggering a refresh.
    pub async fn cached_trips(&self, user: &str) -> Vec<Trip> {
        self.cache.get_trips(user).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::batch_fetcher::{BatchFetcher, BatchFetcherConfig};
    use crate::domain::ports::TripSourceError;
    use crate::domain::refresh_scheduler::RefreshSchedulerConfig;
    use crate::test_support::{
        MemoryCache, MutableClock, StubRoutingService, StubTripSource, credentials, route,
        station, trip, utc,
    };

    struct Harness {
        bikage: Bikage,
        source: Arc<StubTripSource>,
        history: Vec<Trip>,
    }

    fn harness(source: StubTripSource, history: Vec<Trip>) -> Harness {
        let source = Arc::new(source);
        let cache: Arc<dyn PersistentCache> = Arc::new(MemoryCache::new());
        let clock = Arc::new(MutableClock::new(utc(2026, 3, 5, 12, 0)));
        let scheduler = RefreshScheduler::spawn(
            source.clone(),
            cache.clone(),
            clock,
            RefreshSchedulerConfig::default(),
        );
        let fetcher = BatchFetcher::spawn(
            Arc::new(StubRoutingService::always(2500)),
            BatchFetcherConfig::default(),
        );
        let resolver = DistanceResolver::new(cache.clone(), fetcher);
        let offset = FixedOffset::east_opt(0).expect("valid offset");
        Harness {
            bikage: Bikage::new(
                BikagePorts {
                    cache,
                    scheduler,
                    resolver,
                },
                offset,
            ),
            source,
            history,
        }
    }

    #[fixture]
    fn history() -> Vec<Trip> {
        let a = station(1, 0.0, 0.0);
        let b = station(2, 1.0, 1.0);
        vec![
            trip(&route(&a, &b), utc(2026, 3, 2, 8, 0), 15),
            trip(&route(&b, &a), utc(2026, 3, 2, 17, 0), 15),
        ]
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn waiting_returns_the_refreshed_history(history: Vec<Trip>) {
        let harness = harness(StubTripSource::returning(history.clone()), history);

        let trips = harness
            .bikage
            .trips(&credentials("rider"), RefreshMode::Wait)
            .await
            .expect("refresh succeeds");

        assert_eq!(trips, harness.history);
        assert_eq!(harness.source.calls(), 1);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn cached_mode_answers_before_the_refresh_lands(history: Vec<Trip>) {
        let harness = harness(StubTripSource::gated(history.clone()), history);

        let trips = harness
            .bikage
            .trips(&credentials("rider"), RefreshMode::Cached)
            .await
            .expect("cached read succeeds");
        assert!(trips.is_empty(), "nothing cached yet");

        harness.source.wait_for_calls(1).await;
        harness.source.release(1);
        let trips = harness
            .bikage
            .trips(&credentials("rider"), RefreshMode::Wait)
            .await
            .expect("second read succeeds");

        assert_eq!(trips, harness.history);
        assert_eq!(harness.source.calls(), 1, "no second fetch within the cool-down");
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn waiting_surfaces_source_failures(history: Vec<Trip>) {
        let harness = harness(
            StubTripSource::failing(TripSourceError::unavailable("login page down")),
            history,
        );

        let error = harness
            .bikage
            .trips(&credentials("rider"), RefreshMode::Wait)
            .await
            .expect_err("refresh should fail");

        assert_eq!(
            error,
            RefreshError::Source(TripSourceError::unavailable("login page down"))
        );
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn stats_cover_every_resolved_trip(history: Vec<Trip>) {
        let harness = harness(StubTripSource::returning(history.clone()), history);

        let stats = harness
            .bikage
            .stats(&credentials("rider"), RefreshMode::Wait)
            .await
            .expect("stats computed");

        assert_eq!(stats.total, 5000);
        assert!((stats.average_speed_kmh - 10.0).abs() < 1e-9);
        assert_eq!(harness.bikage.cached_trips("rider").await.len(), 2);
    }
}
