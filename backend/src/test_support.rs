//! Test utilities for the bikage crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with the
//! `test-support` feature.

mod cache;
mod clock;
mod fixtures;
mod routing;
mod trip_source;

pub use cache::MemoryCache;
pub use clock::MutableClock;
pub use fixtures::{credentials, route, scratch_dir, station, trip, utc};
pub use routing::StubRoutingService;
pub use trip_source::StubTripSource;
