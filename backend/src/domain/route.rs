//! Stations, coordinates, and the routes between them.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Road distance in meters.
pub type Meters = u64;

/// Operator-assigned station identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub u64);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coord {
    /// Build a coordinate from latitude and longitude.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coord {
    /// Formats as `lat,lng` with eight decimals, the form directions APIs accept.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.8},{:.8}", self.latitude, self.longitude)
    }
}

/// Docking station reference data.
///
/// Loaded once per process and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Stable identifier.
    pub id: StationId,
    /// Human-readable station name.
    pub label: String,
    /// Station location.
    pub coord: Coord,
}

impl Station {
    /// Build a station.
    pub fn new(id: u64, label: impl Into<String>, coord: Coord) -> Self {
        Self {
            id: StationId(id),
            label: label.into(),
            coord,
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Ordered origin/destination pair used as the distance cache key.
///
/// ## Invariants
/// - Equality and hashing only consider the two station identifiers, so two
///   routes built from differently labelled copies of a station still collide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Station the trip started from.
    pub origin: Station,
    /// Station the trip ended at.
    pub destination: Station,
}

impl Route {
    /// Build a route between two stations.
    pub fn new(origin: Station, destination: Station) -> Self {
        Self {
            origin,
            destination,
        }
    }

    /// Key used by persistent backends, `"<origin_id>,<destination_id>"`.
    ///
    /// # Examples
    /// ```
    /// use bikage::domain::{Coord, Route, Station};
    ///
    /// let a = Station::new(72, "W 52 St & 11 Ave", Coord::new(40.767, -73.993));
    /// let b = Station::new(79, "Franklin St & W Broadway", Coord::new(40.719, -74.006));
    /// assert_eq!(Route::new(a, b).cache_key(), "72,79");
    /// ```
    pub fn cache_key(&self) -> String {
        format!("{},{}", self.origin.id, self.destination.id)
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.origin.id == other.origin.id && self.destination.id == other.destination.id
    }
}

impl Eq for Route {}

impl Hash for Route {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.origin.id.hash(state);
        self.destination.id.hash(state);
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.origin, self.destination)
    }
}
