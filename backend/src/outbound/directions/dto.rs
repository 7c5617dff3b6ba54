//! DTOs for decoding Google Directions JSON responses.
//!
//! Only the fields needed to sum leg distances are modelled; everything else
//! in the payload is ignored.

use serde::Deserialize;

use crate::domain::Meters;

#[derive(Debug, Deserialize)]
pub(super) struct DirectionsResponseDto {
    pub(super) status: String,
    #[serde(default)]
    pub(super) error_message: Option<String>,
    #[serde(default)]
    pub(super) routes: Vec<RouteDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RouteDto {
    #[serde(default)]
    pub(super) legs: Vec<LegDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LegDto {
    pub(super) distance: DistanceDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct DistanceDto {
    pub(super) value: Meters,
}

impl DirectionsResponseDto {
    /// Distance of the first route, summed over its legs.
    pub(super) fn first_route_distance(&self) -> Option<Meters> {
        let route = self.routes.first()?;
        if route.legs.is_empty() {
            return None;
        }
        Some(route.legs.iter().map(|leg| leg.distance.value).sum())
    }
}
