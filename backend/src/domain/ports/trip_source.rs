//! Driven ports for fetching a rider's trip history.
use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{Credentials, Trip};

define_port_error! {
    /// Errors surfaced while fetching trip history.
    pub enum TripSourceError {
        /// The source could not be reached.
        Unavailable { message: String } as UpstreamUnavailable =>
            "trip source unavailable: {message}",
        /// The credentials were refused.
        Unauthorized { message: String } as UpstreamUnavailable =>
            "trip source refused credentials: {message}",
        /// A page could not be decoded.
        Malformed { message: String } as MalformedResponse =>
            "trip source response malformed: {message}",
    }
}

/// Port returning a rider's complete trip history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TripSource: Send + Sync {
    /// Fetch every trip for the account, oldest first.
    async fn fetch_all_trips(&self, credentials: &Credentials) -> Result<Vec<Trip>, TripSourceError>;
}

/// One-based page position within a paginated history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageCursor(pub u32);

impl PageCursor {
    /// The first page.
    pub fn first() -> Self {
        Self(1)
    }

    /// Page number.
    pub fn number(self) -> u32 {
        self.0
    }
}

/// One page of trip history.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TripPage {
    /// Trips listed on the page.
    pub trips: Vec<Trip>,
    /// Cursor of the following page, if any.
    pub next: Option<PageCursor>,
}

/// Port returning a single page of trip history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TripPageSource: Send + Sync {
    /// Fetch the page at `cursor`.
    async fn fetch_page(
        &self,
        credentials: &Credentials,
        cursor: PageCursor,
    ) -> Result<TripPage, TripSourceError>;
}
