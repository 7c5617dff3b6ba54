//! Trip source double that can be held open mid-fetch.

use async_trait::async_trait;
use tokio::sync::{Semaphore, watch};

use crate::domain::ports::{TripSource, TripSourceError};
use crate::domain::{Credentials, Trip};

/// Trip source answering with a fixed outcome.
///
/// A gated source blocks every fetch until [`StubTripSource::release`] hands
/// out a permit, which lets tests pile requests onto an in-flight run.
pub struct StubTripSource {
    outcome: Result<Vec<Trip>, TripSourceError>,
    gate: Option<Semaphore>,
    calls: watch::Sender<usize>,
}

impl StubTripSource {
    /// Source returning `trips` immediately.
    pub fn returning(trips: Vec<Trip>) -> Self {
        Self::with_outcome(Ok(trips), None)
    }

    /// Source failing every fetch with `error`.
    pub fn failing(error: TripSourceError) -> Self {
        Self::with_outcome(Err(error), None)
    }

    /// Source returning `trips` once a permit is released.
    pub fn gated(trips: Vec<Trip>) -> Self {
        Self::with_outcome(Ok(trips), Some(Semaphore::new(0)))
    }

    fn with_outcome(outcome: Result<Vec<Trip>, TripSourceError>, gate: Option<Semaphore>) -> Self {
        let (calls, _) = watch::channel(0);
        Self {
            outcome,
            gate,
            calls,
        }
    }

    /// Let `fetches` blocked or future fetches complete.
    pub fn release(&self, fetches: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(fetches);
        }
    }

    /// Number of fetches started so far.
    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    /// Wait until at least `count` fetches have started.
    pub async fn wait_for_calls(&self, count: usize) {
        let mut calls = self.calls.subscribe();
        if calls.wait_for(|started| *started >= count).await.is_err() {
            panic!("trip source dropped while waiting for {count} calls");
        }
    }
}

#[async_trait]
impl TripSource for StubTripSource {
    async fn fetch_all_trips(&self, _credentials: &Credentials) -> Result<Vec<Trip>, TripSourceError> {
        self.calls.send_modify(|started| *started += 1);
        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return Err(TripSourceError::unavailable("gate closed")),
            }
        }
        self.outcome.clone()
    }
}
