//! Rate-limited pool of workers in front of the routing service.
//!
//! Callers submit directions requests onto a bounded queue. A fixed set of
//! workers drains the queue, each taking one token from a ticker before
//! popping a request, so throughput stays at or below the configured rate no
//! matter how many workers run. Every request is answered exactly once on its
//! own single-slot channel.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, warn};

use crate::domain::Meters;
use crate::domain::ports::{DirectionsRequest, RoutingService, RoutingServiceError};

/// Pool sizing and pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFetcherConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Requests that may wait in the queue before submitters block.
    pub queue_capacity: usize,
    /// Tokens issued per second.
    pub requests_per_second: u32,
    /// Optional deadline applied to each routing call.
    pub request_timeout: Option<Duration>,
}

impl Default for BatchFetcherConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            queue_capacity: 50,
            requests_per_second: 8,
            request_timeout: None,
        }
    }
}

impl BatchFetcherConfig {
    fn tick_period(&self) -> Duration {
        Duration::from_secs(1) / self.requests_per_second.max(1)
    }
}

/// Errors delivered to a submitter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The routing call failed.
    #[error(transparent)]
    Routing(#[from] RoutingServiceError),
    /// The worker pool is gone and the request will never be answered.
    #[error("batch fetcher is shut down")]
    Closed,
}

type Reply = Result<Meters, FetchError>;

struct DistanceRequest {
    request: DirectionsRequest,
    reply: oneshot::Sender<Reply>,
}

/// Response to one submitted request.
///
/// Resolves to [`FetchError::Closed`] if the worker that owned the request
/// went away without answering.
#[derive(Debug)]
pub struct PendingDistance {
    reply: oneshot::Receiver<Reply>,
}

impl Future for PendingDistance {
    type Output = Reply;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.reply)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(FetchError::Closed)))
    }
}

/// Handle used to submit requests to the worker pool.
///
/// Cloning is cheap. The pool shuts down once every handle is dropped and the
/// queue has drained.
#[derive(Debug, Clone)]
pub struct BatchFetcher {
    queue: mpsc::Sender<DistanceRequest>,
}

impl BatchFetcher {
    /// Start the ticker and the worker pool on the current Tokio runtime.
    pub fn spawn(service: Arc<dyn RoutingService>, config: BatchFetcherConfig) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (token_tx, token_rx) = mpsc::channel(1);
        let queue = Arc::new(Mutex::new(queue_rx));
        let tokens = Arc::new(Mutex::new(token_rx));

        tokio::spawn(run_ticker(token_tx, config.tick_period()));
        for worker in 0..config.workers.max(1) {
            tokio::spawn(run_worker(
                worker,
                Arc::clone(&service),
                Arc::clone(&queue),
                Arc::clone(&tokens),
                config.request_timeout,
            ));
        }

        Self { queue: queue_tx }
    }

    /// Enqueue a request, waiting while the queue is full.
    pub async fn submit(&self, request: DirectionsRequest) -> PendingDistance {
        let (reply, receiver) = oneshot::channel();
        if let Err(mpsc::error::SendError(rejected)) =
            self.queue.send(DistanceRequest { request, reply }).await
        {
            let _ = rejected.reply.send(Err(FetchError::Closed));
        }
        PendingDistance { reply: receiver }
    }

    /// Submit a request and wait for its response.
    pub async fn fetch(&self, request: DirectionsRequest) -> Reply {
        self.submit(request).await.await
    }
}

async fn run_ticker(tokens: mpsc::Sender<()>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        match tokens.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Closed(())) => {
                debug!("all fetch workers stopped; ticker exiting");
                return;
            }
        }
    }
}

async fn run_worker(
    worker: usize,
    service: Arc<dyn RoutingService>,
    queue: Arc<Mutex<mpsc::Receiver<DistanceRequest>>>,
    tokens: Arc<Mutex<mpsc::Receiver<()>>>,
    request_timeout: Option<Duration>,
) {
    while let Some(DistanceRequest { request, reply }) = next_request(&queue, &tokens).await {
        debug!(worker, origin = %request.origin, destination = %request.destination, "fetching distance");
        let outcome = call_service(service.as_ref(), &request, request_timeout).await;
        if let Err(error) = &outcome {
            warn!(worker, error = %error, class = %error.class(), "distance lookup failed");
        }
        if reply.send(outcome.map_err(FetchError::from)).is_err() {
            debug!(worker, "submitter dropped before the response arrived");
        }
    }
    debug!(worker, "request queue closed; worker exiting");
}

/// Take a token, then pop a request.
///
/// The token lock is held until a request is popped so at most one worker
/// sits on an unspent token while the queue is empty.
async fn next_request(
    queue: &Mutex<mpsc::Receiver<DistanceRequest>>,
    tokens: &Mutex<mpsc::Receiver<()>>,
) -> Option<DistanceRequest> {
    let mut tokens = tokens.lock().await;
    tokens.recv().await?;
    let mut queue = queue.lock().await;
    queue.recv().await
}

async fn call_service(
    service: &dyn RoutingService,
    request: &DirectionsRequest,
    request_timeout: Option<Duration>,
) -> Result<Meters, RoutingServiceError> {
    match request_timeout {
        Some(limit) => timeout(limit, service.distance(request))
            .await
            .unwrap_or_else(|_| {
                Err(RoutingServiceError::timeout(format!(
                    "no response within {}ms",
                    limit.as_millis()
                )))
            }),
        None => service.distance(request).await,
    }
}
