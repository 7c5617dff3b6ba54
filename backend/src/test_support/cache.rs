//! In-memory cache double that counts writes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{CacheError, PersistentCache};
use crate::domain::{Meters, Route, Trip, TripId, sort_chronologically};

/// Cache held entirely in memory.
///
/// With [`MemoryCache::failing_writes`], every put still updates memory but
/// reports a persistence failure, mimicking a durable store that went away.
#[derive(Debug, Default)]
pub struct MemoryCache {
    distances: Mutex<HashMap<Route, Meters>>,
    trips: Mutex<HashMap<String, HashMap<TripId, Trip>>>,
    fail_writes: AtomicBool,
    distance_writes: AtomicUsize,
    trip_writes: AtomicUsize,
}

impl MemoryCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache pre-seeded with one distance.
    pub fn with_distance(self, route: &Route, meters: Meters) -> Self {
        self.distances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(route.clone(), meters);
        self
    }

    /// Report every write as a persistence failure.
    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    /// Number of `put_distance` calls received.
    pub fn distance_writes(&self) -> usize {
        self.distance_writes.load(Ordering::SeqCst)
    }

    /// Number of `put_trip` calls received.
    pub fn trip_writes(&self) -> usize {
        self.trip_writes.load(Ordering::SeqCst)
    }

    fn write_outcome(&self) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(CacheError::persistence("disk unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistentCache for MemoryCache {
    async fn get_distance(&self, route: &Route) -> Option<Meters> {
        self.distances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(route)
            .copied()
    }

    async fn put_distance(&self, route: &Route, distance: Meters) -> Result<(), CacheError> {
        self.distance_writes.fetch_add(1, Ordering::SeqCst);
        self.distances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(route.clone(), distance);
        self.write_outcome()
    }

    async fn get_trip(&self, user: &str, id: &TripId) -> Option<Trip> {
        self.trips
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user)
            .and_then(|trips| trips.get(id))
            .cloned()
    }

    async fn get_trips(&self, user: &str) -> Vec<Trip> {
        let mut trips: Vec<Trip> = self
            .trips
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user)
            .map(|trips| trips.values().cloned().collect())
            .unwrap_or_default();
        sort_chronologically(&mut trips);
        trips
    }

    async fn put_trip(&self, user: &str, trip: &Trip) -> Result<(), CacheError> {
        self.trip_writes.fetch_add(1, Ordering::SeqCst);
        self.trips
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(user.to_owned())
            .or_default()
            .insert(trip.id.clone(), trip.clone());
        self.write_outcome()
    }
}
