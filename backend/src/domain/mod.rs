//! Domain primitives, ports, and services.
//!
//! Purpose: Keep the two coalescing caches independent of any transport or
//! storage. Adapters in `outbound` implement the traits in [`ports`]; the
//! services here only see those traits.
//!
//! Public surface:
//! - Route, Station, Trip: immutable reference and history data.
//! - BatchFetcher: rate-limited worker pool in front of the routing port.
//! - DistanceResolver: cache-first distance lookups.
//! - RefreshScheduler: per-user coalescing of trip-history refreshes.
//! - TripStats: distance and speed aggregates.
//! - Bikage: the caller-facing facade over all of the above.

pub mod batch_fetcher;
pub mod credentials;
pub mod distance_resolver;
pub mod error;
pub mod ports;
pub mod refresh_scheduler;
pub mod route;
pub mod service;
pub mod stations;
pub mod stats;
pub mod trip;
pub mod trip_pages;

pub use self::batch_fetcher::{BatchFetcher, BatchFetcherConfig, FetchError, PendingDistance};
pub use self::credentials::{Credentials, CredentialsValidationError};
pub use self::distance_resolver::{DistanceError, DistanceResolver};
pub use self::error::FailureClass;
pub use self::refresh_scheduler::{
    RefreshError, RefreshOutcome, RefreshScheduler, RefreshSchedulerConfig, RefreshTicket,
};
pub use self::route::{Coord, Meters, Route, Station, StationId};
pub use self::service::{Bikage, BikagePorts, RefreshMode};
pub use self::stations::{StationCatalogue, StationFeedError};
pub use self::stats::{DailySummary, TripStats};
pub use self::trip::{Trip, TripId, sort_chronologically};
pub use self::trip_pages::{DEFAULT_MAX_PAGES, PaginatedTripSource};
