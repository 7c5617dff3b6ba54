//! Small builders for stations, trips, and credentials.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::domain::{Coord, Credentials, Route, Station, Trip};

/// Station labelled `S<id>`.
pub fn station(id: u64, latitude: f64, longitude: f64) -> Station {
    Station::new(id, format!("S{id}"), Coord::new(latitude, longitude))
}

/// Route between two stations.
pub fn route(origin: &Station, destination: &Station) -> Route {
    Route::new(origin.clone(), destination.clone())
}

/// UTC instant from calendar parts.
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).single() {
        Some(instant) => instant,
        None => panic!("invalid fixture time {year}-{month}-{day} {hour}:{minute}"),
    }
}

/// Trip with a derived identifier lasting `minutes`.
pub fn trip(route: &Route, started_at: DateTime<Utc>, minutes: i64) -> Trip {
    let ended_at = started_at + TimeDelta::minutes(minutes);
    Trip::with_derived_id(route.clone(), started_at, ended_at)
}

/// Valid credentials for `username`.
pub fn credentials(username: &str) -> Credentials {
    match Credentials::try_from_parts(username, "correct horse") {
        Ok(credentials) => credentials,
        Err(error) => panic!("invalid fixture credentials: {error}"),
    }
}

/// Fresh temporary directory removed on drop.
pub fn scratch_dir() -> tempfile::TempDir {
    match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(error) => panic!("failed to create temporary directory: {error}"),
    }
}
