//! Trip pages read from a directory of exported history files.
//!
//! Layout: `<root>/<username>/page-<n>.json`, numbered from 1. Each page is
//! `{"trips": [{"id"?, "from", "to", "started_at", "ended_at"}], "next": n?}`
//! with station identifiers resolved through the station catalogue.

mod dto;

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use self::dto::TripPageDto;
use crate::domain::ports::{PageCursor, TripPage, TripPageSource, TripSourceError};
use crate::domain::{Credentials, StationCatalogue};

/// [`TripPageSource`] reading exported pages from disk.
#[derive(Debug, Clone)]
pub struct ExportDirectoryTripPages {
    root: PathBuf,
    stations: Arc<StationCatalogue>,
}

impl ExportDirectoryTripPages {
    /// Read pages below `root`, resolving stations through `stations`.
    pub fn new(root: impl Into<PathBuf>, stations: Arc<StationCatalogue>) -> Self {
        Self {
            root: root.into(),
            stations,
        }
    }

    fn page_path(&self, username: &str, cursor: PageCursor) -> Result<PathBuf, TripSourceError> {
        let mut components = Path::new(username).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => {
                return Err(TripSourceError::unauthorized(format!(
                    "username {username:?} cannot name an export directory"
                )));
            }
        }
        Ok(self
            .root
            .join(username)
            .join(format!("page-{}.json", cursor.number())))
    }
}

#[async_trait]
impl TripPageSource for ExportDirectoryTripPages {
    async fn fetch_page(
        &self,
        credentials: &Credentials,
        cursor: PageCursor,
    ) -> Result<TripPage, TripSourceError> {
        let path = self.page_path(credentials.username(), cursor)?;
        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(error) if error.kind() == ErrorKind::NotFound && cursor == PageCursor::first() => {
                return Err(TripSourceError::unavailable(format!(
                    "no exported history at {}",
                    path.display()
                )));
            }
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(TripSourceError::malformed(format!(
                    "page {} referenced but missing at {}",
                    cursor.number(),
                    path.display()
                )));
            }
            Err(error) => {
                return Err(TripSourceError::unavailable(format!(
                    "read {}: {error}",
                    path.display()
                )));
            }
        };
        parse_page(&body, &self.stations)
    }
}

fn parse_page(body: &[u8], stations: &StationCatalogue) -> Result<TripPage, TripSourceError> {
    let decoded: TripPageDto = serde_json::from_slice(body).map_err(|error| {
        TripSourceError::malformed(format!("invalid trip page JSON payload: {error}"))
    })?;
    let trips = decoded
        .trips
        .into_iter()
        .map(|trip| trip.into_domain_trip(stations))
        .collect::<Result<Vec<_>, _>>()
        .map_err(TripSourceError::malformed)?;
    Ok(TripPage {
        trips,
        next: decoded.next.map(PageCursor),
    })
}
