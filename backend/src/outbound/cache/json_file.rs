//! JSON-file-backed cache.
//!
//! The whole cache lives in memory behind a read/write lock. Every put
//! rewrites the snapshot file through a temporary sibling plus rename, and
//! flushes are serialised so the file always ends on the newest snapshot.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::ports::{CacheError, PersistentCache};
use crate::domain::{Meters, Route, Trip, TripId, sort_chronologically};

/// Snapshot location used when none is configured.
pub const DEFAULT_CACHE_PATH: &str = "./bikage_cache.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    distances: BTreeMap<String, Meters>,
    #[serde(default)]
    trips: BTreeMap<String, BTreeMap<TripId, Trip>>,
}

/// Cache mirrored to a JSON file.
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    state: RwLock<Snapshot>,
    flush: Mutex<()>,
}

impl JsonFileCache {
    /// Load the snapshot at `path`.
    ///
    /// A missing, unreadable, or undecodable file yields an empty cache; the
    /// next put overwrites it.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let snapshot = load_snapshot(&path).await;
        info!(
            path = %path.display(),
            distances = snapshot.distances.len(),
            users = snapshot.trips.len(),
            "opened JSON cache"
        );
        Self {
            path,
            state: RwLock::new(snapshot),
            flush: Mutex::new(()),
        }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    async fn persist(&self) -> Result<(), CacheError> {
        let _flush = self.flush.lock().await;
        let bytes = serde_json::to_vec_pretty(&*self.read())
            .map_err(|error| CacheError::serialization(error.to_string()))?;

        let staging = staging_path(&self.path);
        tokio::fs::write(&staging, &bytes).await.map_err(|error| {
            CacheError::persistence(format!("write {}: {error}", staging.display()))
        })?;
        tokio::fs::rename(&staging, &self.path).await.map_err(|error| {
            CacheError::persistence(format!("rename onto {}: {error}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "flushed JSON cache");
        Ok(())
    }
}

async fn load_snapshot(path: &Path) -> Snapshot {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "no cache file yet; starting empty");
            return Snapshot::default();
        }
        Err(error) => {
            warn!(path = %path.display(), error = %error, "cache file unreadable; starting empty");
            return Snapshot::default();
        }
    };
    serde_json::from_slice(&bytes).unwrap_or_else(|error| {
        warn!(path = %path.display(), error = %error, "cache file undecodable; starting empty");
        Snapshot::default()
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "bikage_cache.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl PersistentCache for JsonFileCache {
    async fn get_distance(&self, route: &Route) -> Option<Meters> {
        self.read().distances.get(&route.cache_key()).copied()
    }

    async fn put_distance(&self, route: &Route, distance: Meters) -> Result<(), CacheError> {
        self.write().distances.insert(route.cache_key(), distance);
        self.persist().await
    }

    async fn get_trip(&self, user: &str, id: &TripId) -> Option<Trip> {
        self.read()
            .trips
            .get(user)
            .and_then(|trips| trips.get(id))
            .cloned()
    }

    async fn get_trips(&self, user: &str) -> Vec<Trip> {
        let mut trips: Vec<Trip> = self
            .read()
            .trips
            .get(user)
            .map(|trips| trips.values().cloned().collect())
            .unwrap_or_default();
        sort_chronologically(&mut trips);
        trips
    }

    async fn put_trip(&self, user: &str, trip: &Trip) -> Result<(), CacheError> {
        self.write()
            .trips
            .entry(user.to_owned())
            .or_default()
            .insert(trip.id.clone(), trip.clone());
        self.persist().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures_util::future::join_all;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::test_support::{route, scratch_dir, station, trip, utc};

    #[fixture]
    fn commute() -> Route {
        route(&station(72, 40.767, -73.993), &station(79, 40.719, -74.006))
    }

    #[rstest]
    #[tokio::test]
    async fn missing_file_starts_empty(commute: Route) {
        let dir = scratch_dir();

        let cache = JsonFileCache::open(dir.path().join("cache.json")).await;

        assert_eq!(cache.get_distance(&commute).await, None);
        assert!(cache.get_trips("rider").await.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn corrupt_file_starts_empty(commute: Route) {
        let dir = scratch_dir();
        let path = dir.path().join("cache.json");
        tokio::fs::write(&path, b"{ not json").await.expect("seed corrupt file");

        let cache = JsonFileCache::open(&path).await;
        assert_eq!(cache.get_distance(&commute).await, None);

        cache.put_distance(&commute, 6100).await.expect("put recovers file");
        let reopened = JsonFileCache::open(&path).await;
        assert_eq!(reopened.get_distance(&commute).await, Some(6100));
    }

    #[rstest]
    #[tokio::test]
    async fn entries_survive_a_reopen(commute: Route) {
        let dir = scratch_dir();
        let path = dir.path().join("cache.json");
        let later = trip(&commute, utc(2026, 3, 2, 18, 0), 25);
        let earlier = trip(&commute, utc(2026, 3, 2, 8, 0), 20);

        let cache = JsonFileCache::open(&path).await;
        cache.put_distance(&commute, 6100).await.expect("put distance");
        cache.put_trip("rider", &later).await.expect("put trip");
        cache.put_trip("rider", &earlier).await.expect("put trip");
        drop(cache);

        let reopened = JsonFileCache::open(&path).await;
        assert_eq!(reopened.get_distance(&commute).await, Some(6100));
        assert_eq!(reopened.get_trip("rider", &later.id).await, Some(later.clone()));
        assert_eq!(reopened.get_trips("rider").await, vec![earlier, later]);
        assert!(reopened.get_trips("someone-else").await.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn snapshot_uses_route_keys_and_per_user_trips(commute: Route) {
        let dir = scratch_dir();
        let path = dir.path().join("cache.json");
        let ride = trip(&commute, utc(2026, 3, 2, 8, 0), 20);

        let cache = JsonFileCache::open(&path).await;
        cache.put_distance(&commute, 6100).await.expect("put distance");
        cache.put_trip("rider", &ride).await.expect("put trip");

        let raw = tokio::fs::read(&path).await.expect("snapshot written");
        let json: serde_json::Value = serde_json::from_slice(&raw).expect("valid JSON");
        assert_eq!(json["distances"]["72,79"], 6100);
        assert!(json["trips"]["rider"][ride.id.as_str()].is_object());
        assert!(
            !staging_path(&path).exists(),
            "staging file is renamed away"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn repeated_puts_are_idempotent(commute: Route) {
        let dir = scratch_dir();
        let cache = JsonFileCache::open(dir.path().join("cache.json")).await;
        let ride = trip(&commute, utc(2026, 3, 2, 8, 0), 20);

        for _ in 0..3 {
            cache.put_distance(&commute, 6100).await.expect("put distance");
            cache.put_trip("rider", &ride).await.expect("put trip");
        }

        assert_eq!(cache.get_distance(&commute).await, Some(6100));
        assert_eq!(cache.get_trips("rider").await, vec![ride]);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_puts_leave_a_complete_snapshot() {
        let dir = scratch_dir();
        let path = dir.path().join("cache.json");
        let cache = Arc::new(JsonFileCache::open(&path).await);
        let hub = station(1, 0.0, 0.0);
        let routes: Vec<Route> = (2..22)
            .map(|id| route(&hub, &station(id, 0.01 * id as f64, 0.0)))
            .collect();

        let handles = routes.iter().cloned().enumerate().map(|(index, route)| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.put_distance(&route, 100 * index as Meters).await })
        });
        for outcome in join_all(handles).await {
            outcome.expect("task joins").expect("put succeeds");
        }

        let reopened = JsonFileCache::open(&path).await;
        for (index, route) in routes.iter().enumerate() {
            assert_eq!(reopened.get_distance(route).await, Some(100 * index as Meters));
        }
    }

    #[rstest]
    #[tokio::test]
    async fn failed_flushes_keep_the_in_memory_copy(commute: Route) {
        let dir = scratch_dir();
        let path = dir.path().join("missing-dir").join("cache.json");
        let cache = JsonFileCache::open(&path).await;

        let error = cache
            .put_distance(&commute, 6100)
            .await
            .expect_err("parent directory does not exist");

        assert!(matches!(error, CacheError::Persistence { .. }));
        assert_eq!(cache.get_distance(&commute).await, Some(6100));
    }
}
