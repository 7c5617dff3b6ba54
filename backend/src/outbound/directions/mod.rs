//! Directions API outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `RoutingService`
//! port.

mod dto;
mod http_client;

pub use http_client::{DEFAULT_DIRECTIONS_ENDPOINT, GoogleDirectionsClient};
