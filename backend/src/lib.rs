//! Coalescing distance and trip-history caches for bike-share riders.
//!
//! The [`domain`] module holds the batch fetcher, distance resolver, refresh
//! scheduler, statistics and the [`domain::Bikage`] facade. Adapters for the
//! routing service, trip exports and cache backends live in [`outbound`].

pub mod domain;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use settings::BikageSettings;
