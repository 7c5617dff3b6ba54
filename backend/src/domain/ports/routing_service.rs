//! Driven port for the external directions API.
//!
//! The domain owns the request shape so the batch fetcher can stay
//! adapter-agnostic.

use std::fmt;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{Coord, Meters, Route};

/// Travel mode requested from the directions API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TravelMode {
    /// Cycling directions.
    Bicycling,
}

impl TravelMode {
    /// Wire value understood by directions APIs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bicycling => "bicycling",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain-owned directions request passed to the routing adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRequest {
    /// Start coordinate.
    pub origin: Coord,
    /// End coordinate.
    pub destination: Coord,
    /// Travel mode.
    pub mode: TravelMode,
}

impl DirectionsRequest {
    /// Cycling directions between the two stations of a route.
    pub fn bicycling(route: &Route) -> Self {
        Self {
            origin: route.origin.coord,
            destination: route.destination.coord,
            mode: TravelMode::Bicycling,
        }
    }
}

define_port_error! {
    /// Errors surfaced while calling the directions API.
    pub enum RoutingServiceError {
        /// Network transport failed before receiving a response.
        Unavailable { message: String } as UpstreamUnavailable =>
            "routing service unavailable: {message}",
        /// The call exceeded its deadline.
        Timeout { message: String } as UpstreamUnavailable =>
            "routing service timeout: {message}",
        /// The API throttled the request.
        RateLimited { message: String } as UpstreamUnavailable =>
            "routing service rate limited request: {message}",
        /// The response could not be decoded or held no route.
        Malformed { message: String } as MalformedResponse =>
            "routing service response malformed: {message}",
        /// The API refused the request.
        Rejected { message: String } as UpstreamUnavailable =>
            "routing service rejected request: {message}",
    }
}

/// Port for resolving the road distance of a directions request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Fetch the road distance in meters.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use bikage::domain::ports::{DirectionsRequest, RoutingService};
    ///
    /// let meters = service.distance(&DirectionsRequest::bicycling(&route)).await?;
    /// # Ok::<(), bikage::domain::ports::RoutingServiceError>(())
    /// ```
    async fn distance(&self, request: &DirectionsRequest) -> Result<Meters, RoutingServiceError>;
}
