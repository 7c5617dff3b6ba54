//! Completed bike rentals and their identifiers.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::Route;

/// Stable trip identifier, unique per user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(String);

impl TripId {
    /// Wrap an identifier supplied by the trip source.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derive an identifier from the trip content.
    ///
    /// The identifier is the lowercase hex SHA-256 of
    /// `"<origin>-<destination>-<start>-<end>"`, with RFC 3339 timestamps, so
    /// the same rental scraped twice maps to the same cache entry.
    pub fn derive(route: &Route, started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        let content = format!(
            "{}-{}-{}-{}",
            route.origin.label,
            route.destination.label,
            started_at.to_rfc3339(),
            ended_at.to_rfc3339()
        );
        Self(hex::encode(Sha256::digest(content.as_bytes())))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single completed rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Stable identifier.
    pub id: TripId,
    /// Stations the rental started and ended at.
    pub route: Route,
    /// Rental start time.
    pub started_at: DateTime<Utc>,
    /// Rental end time.
    pub ended_at: DateTime<Utc>,
}

impl Trip {
    /// Build a trip with an identifier supplied by the source.
    pub fn new(
        id: TripId,
        route: Route,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            route,
            started_at,
            ended_at,
        }
    }

    /// Build a trip whose identifier is derived from its content.
    pub fn with_derived_id(route: Route, started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        let id = TripId::derive(&route, started_at, ended_at);
        Self::new(id, route, started_at, ended_at)
    }

    /// Time spent riding. Zero when the end precedes the start.
    pub fn duration(&self) -> Duration {
        (self.ended_at - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, start: {}, end: {})",
            self.route,
            self.started_at.format("%b %d, %H:%M"),
            self.ended_at.format("%b %d, %H:%M")
        )
    }
}

/// Sort trips by start time, ties broken by identifier.
pub fn sort_chronologically(trips: &mut [Trip]) {
    trips.sort_by(|a, b| {
        a.started_at
            .cmp(&b.started_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
