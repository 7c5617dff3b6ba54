//! Immutable station reference data.

use std::collections::HashMap;

use serde::Deserialize;

use super::{Coord, Station, StationId};

/// Status key the feed uses for stations in service.
const ACTIVE_STATUS: i64 = 1;

/// Errors raised while decoding a station feed.
#[derive(Debug, thiserror::Error)]
pub enum StationFeedError {
    /// Feed body was not the expected JSON shape.
    #[error("station feed could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationFeed {
    station_bean_list: Vec<FeedStation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedStation {
    id: u64,
    station_name: String,
    #[serde(default)]
    status_key: i64,
    latitude: f64,
    longitude: f64,
}

/// Stations indexed by identifier, loaded once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct StationCatalogue {
    by_id: HashMap<StationId, Station>,
}

impl StationCatalogue {
    /// Build a catalogue from already-decoded stations.
    pub fn from_stations(stations: impl IntoIterator<Item = Station>) -> Self {
        let by_id = stations
            .into_iter()
            .map(|station| (station.id, station))
            .collect();
        Self { by_id }
    }

    /// Decode a `{"stationBeanList": [...]}` feed, keeping active stations.
    ///
    /// # Examples
    /// ```
    /// use bikage::domain::{StationCatalogue, StationId};
    ///
    /// let feed = br#"{"stationBeanList":[
    ///     {"id":72,"stationName":"W 52 St","statusKey":1,"latitude":40.76,"longitude":-73.99},
    ///     {"id":73,"stationName":"Closed","statusKey":3,"latitude":40.70,"longitude":-73.90}
    /// ]}"#;
    /// let catalogue = StationCatalogue::from_feed_json(feed).unwrap();
    /// assert_eq!(catalogue.len(), 1);
    /// assert!(catalogue.get(StationId(73)).is_none());
    /// ```
    pub fn from_feed_json(bytes: &[u8]) -> Result<Self, StationFeedError> {
        let feed: StationFeed = serde_json::from_slice(bytes)?;
        Ok(Self::from_stations(
            feed.station_bean_list
                .into_iter()
                .filter(|entry| entry.status_key == ACTIVE_STATUS)
                .map(|entry| {
                    Station::new(
                        entry.id,
                        entry.station_name,
                        Coord::new(entry.latitude, entry.longitude),
                    )
                }),
        ))
    }

    /// Look a station up by identifier.
    pub fn get(&self, id: StationId) -> Option<&Station> {
        self.by_id.get(&id)
    }

    /// Look a station up by its label.
    pub fn by_label(&self, label: &str) -> Option<&Station> {
        self.by_id.values().find(|station| station.label == label)
    }

    /// Number of stations held.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True when no station is held.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
