//! Failure taxonomy shared by every port error.

use std::fmt;

/// Broad failure categories used to decide how a failure propagates.
///
/// None of these categories is fatal to the process: upstream and malformed
/// failures stay local to the request that produced them, and persistence
/// failures leave the in-memory view authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Network or API failure on a single upstream request.
    UpstreamUnavailable,
    /// Upstream answered with data that could not be decoded.
    MalformedResponse,
    /// The durable store could not complete a read or write.
    PersistenceFailure,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpstreamUnavailable => f.write_str("upstream_unavailable"),
            Self::MalformedResponse => f.write_str("malformed_response"),
            Self::PersistenceFailure => f.write_str("persistence_failure"),
        }
    }
}
