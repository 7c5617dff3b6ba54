//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **cache**: JSON-file and no-op implementations of the persistent cache
//! - **directions**: Google Directions client behind the routing port
//! - **trip_export**: trip pages read from an exported history directory
//!
//! Adapters translate between domain types and wire or file formats. They
//! contain no business logic.

pub mod cache;
pub mod directions;
pub mod trip_export;
