//! Scripted routing service.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::Meters;
use crate::domain::ports::{DirectionsRequest, RoutingService, RoutingServiceError};

type Responder = dyn Fn(&DirectionsRequest) -> Result<Meters, RoutingServiceError> + Send + Sync;

/// Routing service that answers from a script, then from a fallback closure.
pub struct StubRoutingService {
    script: Mutex<VecDeque<Result<Meters, RoutingServiceError>>>,
    responder: Box<Responder>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubRoutingService {
    /// Answer every call with `responder`.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&DirectionsRequest) -> Result<Meters, RoutingServiceError> + Send + Sync + 'static,
    {
        Self {
            script: Mutex::new(VecDeque::new()),
            responder: Box::new(responder),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer every call with the same distance.
    pub fn always(meters: Meters) -> Self {
        Self::from_fn(move |_| Ok(meters))
    }

    /// Fail every call with the same error.
    pub fn failing(error: RoutingServiceError) -> Self {
        Self::from_fn(move |_| Err(error.clone()))
    }

    /// Answer the first calls from `responses`, in order.
    pub fn with_script(
        self,
        responses: impl IntoIterator<Item = Result<Meters, RoutingServiceError>>,
    ) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(responses);
        self
    }

    /// Sleep on the Tokio clock before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutingService for StubRoutingService {
    async fn distance(&self, request: &DirectionsRequest) -> Result<Meters, RoutingServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        scripted.unwrap_or_else(|| (self.responder)(request))
    }
}
