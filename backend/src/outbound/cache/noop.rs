//! Cache that stores nothing.

use async_trait::async_trait;

use crate::domain::ports::{CacheError, PersistentCache};
use crate::domain::{Meters, Route, Trip, TripId};

/// Cache implementation that always misses.
///
/// Gets report not-found and puts succeed without storing anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl PersistentCache for NoopCache {
    async fn get_distance(&self, _route: &Route) -> Option<Meters> {
        None
    }

    async fn put_distance(&self, _route: &Route, _distance: Meters) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get_trip(&self, _user: &str, _id: &TripId) -> Option<Trip> {
        None
    }

    async fn get_trips(&self, _user: &str) -> Vec<Trip> {
        Vec::new()
    }

    async fn put_trip(&self, _user: &str, _trip: &Trip) -> Result<(), CacheError> {
        Ok(())
    }
}
