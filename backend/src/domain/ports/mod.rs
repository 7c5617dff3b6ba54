//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod persistent_cache;
mod routing_service;
mod trip_source;

#[cfg(test)]
pub use persistent_cache::MockPersistentCache;
pub use persistent_cache::{CacheError, PersistentCache};
#[cfg(test)]
pub use routing_service::MockRoutingService;
pub use routing_service::{DirectionsRequest, RoutingService, RoutingServiceError, TravelMode};
#[cfg(test)]
pub use trip_source::{MockTripPageSource, MockTripSource};
pub use trip_source::{PageCursor, TripPage, TripPageSource, TripSource, TripSourceError};
