//! DTOs for decoding exported trip-history pages.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::{Route, StationCatalogue, StationId, Trip, TripId};

#[derive(Debug, Deserialize)]
pub(super) struct TripPageDto {
    #[serde(default)]
    pub(super) trips: Vec<TripDto>,
    #[serde(default)]
    pub(super) next: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TripDto {
    #[serde(default)]
    pub(super) id: Option<String>,
    pub(super) from: u64,
    pub(super) to: u64,
    pub(super) started_at: DateTime<Utc>,
    pub(super) ended_at: DateTime<Utc>,
}

impl TripDto {
    pub(super) fn into_domain_trip(self, stations: &StationCatalogue) -> Result<Trip, String> {
        let origin = stations
            .get(StationId(self.from))
            .ok_or_else(|| format!("unknown origin station {}", self.from))?;
        let destination = stations
            .get(StationId(self.to))
            .ok_or_else(|| format!("unknown destination station {}", self.to))?;
        let route = Route::new(origin.clone(), destination.clone());

        Ok(match self.id {
            Some(id) if !id.trim().is_empty() => {
                Trip::new(TripId::new(id), route, self.started_at, self.ended_at)
            }
            _ => Trip::with_derived_id(route, self.started_at, self.ended_at),
        })
    }
}
