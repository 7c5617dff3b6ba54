//! Cache-first distance resolution.
//!
//! Hits are answered from the persistent cache. Misses go through the batch
//! fetcher and are written back before being returned, so a route is fetched
//! at most once for the life of the cache.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::domain::batch_fetcher::{BatchFetcher, FetchError};
use crate::domain::ports::{DirectionsRequest, PersistentCache};
use crate::domain::{Meters, Route, Trip, TripId};

/// Errors returned by [`DistanceResolver::get`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DistanceError {
    /// The route was not cached and fetching it failed.
    #[error("failed to resolve distance: {0}")]
    Fetch(#[from] FetchError),
}

/// Resolves route distances through the cache and the batch fetcher.
#[derive(Clone)]
pub struct DistanceResolver {
    cache: Arc<dyn PersistentCache>,
    fetcher: BatchFetcher,
}

impl DistanceResolver {
    /// Compose a resolver from its collaborators.
    pub fn new(cache: Arc<dyn PersistentCache>, fetcher: BatchFetcher) -> Self {
        Self { cache, fetcher }
    }

    /// Resolve one route.
    pub async fn get(&self, route: &Route) -> Result<Meters, DistanceError> {
        if let Some(meters) = self.cache.get_distance(route).await {
            debug!(route = %route, meters, "distance cache hit");
            return Ok(meters);
        }
        debug!(route = %route, "distance cache miss");
        let meters = self.fetch_and_store(route).await?;
        Ok(meters)
    }

    /// Resolve many routes at once.
    ///
    /// Misses are deduplicated and fetched concurrently. Routes that fail to
    /// resolve are logged and left out of the result.
    pub async fn get_all<'a, I>(&self, routes: I) -> HashMap<Route, Meters>
    where
        I: IntoIterator<Item = &'a Route>,
    {
        let mut resolved = HashMap::new();
        let mut misses = Vec::new();
        let mut seen = HashSet::new();
        for route in routes {
            if !seen.insert(route) {
                continue;
            }
            match self.cache.get_distance(route).await {
                Some(meters) => {
                    resolved.insert(route.clone(), meters);
                }
                None => misses.push(route),
            }
        }
        debug!(
            hits = resolved.len(),
            misses = misses.len(),
            "partitioned distance lookups"
        );

        let fetched = join_all(
            misses
                .into_iter()
                .map(|route| async move { (route, self.fetch_and_store(route).await) }),
        )
        .await;

        for (route, outcome) in fetched {
            match outcome {
                Ok(meters) => {
                    resolved.insert(route.clone(), meters);
                }
                Err(error) => warn!(route = %route, error = %error, "leaving route unresolved"),
            }
        }
        resolved
    }

    /// Resolve the distance of every trip, keyed by trip identifier.
    pub async fn get_for_trips(&self, trips: &[Trip]) -> HashMap<TripId, Meters> {
        let routes: Vec<&Route> = trips.iter().map(|trip| &trip.route).collect();
        let distances = self.get_all(routes).await;
        trips
            .iter()
            .filter_map(|trip| {
                distances
                    .get(&trip.route)
                    .map(|meters| (trip.id.clone(), *meters))
            })
            .collect()
    }

    async fn fetch_and_store(&self, route: &Route) -> Result<Meters, FetchError> {
        let meters = self
            .fetcher
            .fetch(DirectionsRequest::bicycling(route))
            .await?;
        if let Err(error) = self.cache.put_distance(route, meters).await {
            warn!(route = %route, error = %error, "failed to persist distance");
        }
        Ok(meters)
    }
}
