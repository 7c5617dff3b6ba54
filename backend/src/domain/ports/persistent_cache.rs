//! Port interface for the durable route-distance and trip cache.
use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{Meters, Route, Trip, TripId};

define_port_error! {
    /// Errors surfaced by the caching adapter.
    pub enum CacheError {
        /// The durable write did not complete. The in-memory copy is already
        /// updated and stays authoritative.
        Persistence { message: String } as PersistenceFailure =>
            "cache persistence failed: {message}",
        /// Cached content could not be serialised.
        Serialization { message: String } as PersistenceFailure =>
            "cache serialisation failed: {message}",
    }
}

/// Key-value store for resolved distances and per-user trips.
///
/// Implementations must tolerate concurrent puts for the same key; the last
/// write wins. Reads never fail: an unavailable entry is reported as absent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistentCache: Send + Sync {
    /// Read the distance stored for a route.
    async fn get_distance(&self, route: &Route) -> Option<Meters>;

    /// Store the distance for a route.
    async fn put_distance(&self, route: &Route, distance: Meters) -> Result<(), CacheError>;

    /// Read one trip for a user.
    async fn get_trip(&self, user: &str, id: &TripId) -> Option<Trip>;

    /// Read every cached trip for a user, oldest first.
    async fn get_trips(&self, user: &str) -> Vec<Trip>;

    /// Insert or replace a trip keyed by `(user, trip.id)`.
    async fn put_trip(&self, user: &str, trip: &Trip) -> Result<(), CacheError>;
}
