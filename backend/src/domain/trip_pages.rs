//! Drives a page-at-a-time trip source to completion.

use std::pin::pin;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use futures_util::stream::{self, Stream};
use tracing::{debug, info};

use crate::domain::ports::{PageCursor, TripPageSource, TripSource, TripSourceError};
use crate::domain::{Credentials, Trip, sort_chronologically};

/// Default ceiling on pages followed for one history.
pub const DEFAULT_MAX_PAGES: u32 = 500;

/// [`TripSource`] that follows `next` cursors until the history ends.
pub struct PaginatedTripSource<P> {
    pages: P,
    max_pages: u32,
}

impl<P: TripPageSource> PaginatedTripSource<P> {
    /// Wrap a page source with the default page ceiling.
    pub fn new(pages: P) -> Self {
        Self {
            pages,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Override the page ceiling.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Lazily fetch pages starting from the first one.
    ///
    /// The stream ends after the last page or after the first error. A
    /// `next` cursor that does not move forward, or a history longer than the
    /// page ceiling, ends it with [`TripSourceError::Malformed`].
    fn page_stream<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> impl Stream<Item = Result<Vec<Trip>, TripSourceError>> + Send + 'a {
        let start = (Some(PageCursor::first()), 0_u32);
        stream::try_unfold(start, move |(cursor, fetched)| async move {
            let Some(cursor) = cursor else {
                return Ok(None);
            };
            if fetched >= self.max_pages {
                return Err(TripSourceError::malformed(format!(
                    "history exceeds {} pages",
                    self.max_pages
                )));
            }
            let page = self.pages.fetch_page(credentials, cursor).await?;
            debug!(
                user = credentials.username(),
                page = cursor.number(),
                trips = page.trips.len(),
                "fetched trip page"
            );
            if let Some(next) = page.next.filter(|next| *next <= cursor) {
                return Err(TripSourceError::malformed(format!(
                    "page {} points back to page {}",
                    cursor.number(),
                    next.number()
                )));
            }
            Ok::<_, TripSourceError>(Some((page.trips, (page.next, fetched + 1))))
        })
    }
}

#[async_trait]
impl<P: TripPageSource> TripSource for PaginatedTripSource<P> {
    async fn fetch_all_trips(&self, credentials: &Credentials) -> Result<Vec<Trip>, TripSourceError> {
        let mut pages = pin!(self.page_stream(credentials));
        let mut trips = Vec::new();
        let mut page_count = 0_u32;
        while let Some(page) = pages.try_next().await? {
            page_count += 1;
            trips.extend(page);
        }
        sort_chronologically(&mut trips);
        info!(
            user = credentials.username(),
            pages = page_count,
            trips = trips.len(),
            "collected trip history"
        );
        Ok(trips)
    }
}

#[cfg(test)]
mod tests {
    use mockall::Sequence;
    use mockall::predicate::eq;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::ports::{MockTripPageSource, TripPage};
    use crate::test_support::{credentials, route, station, trip, utc};

    #[fixture]
    fn trips() -> Vec<Trip> {
        let a = station(1, 0.0, 0.0);
        let b = station(2, 1.0, 1.0);
        vec![
            trip(&route(&a, &b), utc(2026, 2, 1, 9, 0), 10),
            trip(&route(&b, &a), utc(2026, 1, 15, 9, 0), 10),
            trip(&route(&a, &b), utc(2026, 1, 20, 9, 0), 10),
        ]
    }

    fn page(trips: &[Trip], next: Option<u32>) -> TripPage {
        TripPage {
            trips: trips.to_vec(),
            next: next.map(PageCursor),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn follows_cursors_and_sorts_the_history(trips: Vec<Trip>) {
        let mut pages = MockTripPageSource::new();
        let mut sequence = Sequence::new();
        let first = page(&trips[..2], Some(2));
        let second = page(&trips[2..], None);
        pages
            .expect_fetch_page()
            .with(mockall::predicate::always(), eq(PageCursor(1)))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |_, _| Ok(first.clone()));
        pages
            .expect_fetch_page()
            .with(mockall::predicate::always(), eq(PageCursor(2)))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |_, _| Ok(second.clone()));

        let history = PaginatedTripSource::new(pages)
            .fetch_all_trips(&credentials("rider"))
            .await
            .expect("history collected");

        let starts: Vec<_> = history.iter().map(|trip| trip.started_at).collect();
        assert_eq!(
            starts,
            vec![
                utc(2026, 1, 15, 9, 0),
                utc(2026, 1, 20, 9, 0),
                utc(2026, 2, 1, 9, 0)
            ]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn page_errors_abort_the_history() {
        let mut pages = MockTripPageSource::new();
        pages
            .expect_fetch_page()
            .times(1)
            .returning(|_, _| Err(TripSourceError::unavailable("connection refused")));

        let error = PaginatedTripSource::new(pages)
            .fetch_all_trips(&credentials("rider"))
            .await
            .expect_err("history should fail");

        assert_eq!(error, TripSourceError::unavailable("connection refused"));
    }

    #[rstest]
    #[tokio::test]
    async fn runaway_pagination_is_rejected(trips: Vec<Trip>) {
        let mut pages = MockTripPageSource::new();
        let looping = page(&trips[..1], Some(1));
        pages
            .expect_fetch_page()
            .times(3)
            .returning(move |_, cursor| {
                Ok(TripPage {
                    next: Some(PageCursor(cursor.number() + 1)),
                    ..looping.clone()
                })
            });

        let error = PaginatedTripSource::new(pages)
            .with_max_pages(3)
            .fetch_all_trips(&credentials("rider"))
            .await
            .expect_err("page ceiling should trip");

        assert!(matches!(error, TripSourceError::Malformed { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn a_page_pointing_at_itself_is_rejected(trips: Vec<Trip>) {
        let mut pages = MockTripPageSource::new();
        let looping = page(&trips[..1], Some(1));
        pages
            .expect_fetch_page()
            .times(1)
            .returning(move |_, _| Ok(looping.clone()));

        let error = PaginatedTripSource::new(pages)
            .with_max_pages(3)
            .fetch_all_trips(&credentials("rider"))
            .await
            .expect_err("self-referencing page should fail");

        assert!(matches!(error, TripSourceError::Malformed { .. }), "got {error:?}");
    }

    #[rstest]
    #[tokio::test]
    async fn a_page_pointing_backwards_is_rejected(trips: Vec<Trip>) {
        let mut pages = MockTripPageSource::new();
        let mut sequence = Sequence::new();
        let first = page(&trips[..1], Some(2));
        let second = page(&trips[1..], Some(1));
        pages
            .expect_fetch_page()
            .with(mockall::predicate::always(), eq(PageCursor(1)))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |_, _| Ok(first.clone()));
        pages
            .expect_fetch_page()
            .with(mockall::predicate::always(), eq(PageCursor(2)))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |_, _| Ok(second.clone()));

        let error = PaginatedTripSource::new(pages)
            .fetch_all_trips(&credentials("rider"))
            .await
            .expect_err("backwards cursor should fail");

        assert!(matches!(error, TripSourceError::Malformed { .. }), "got {error:?}");
    }
}
