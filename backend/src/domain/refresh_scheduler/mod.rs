//! Per-user coalescing of trip-history refreshes.
//!
//! A single coordinator task drains a bounded inbox of refresh jobs. For each
//! user it keeps the start time of the last run and the jobs waiting on the
//! run in flight, if any. A job either joins the in-flight run, is answered
//! immediately because the history is still fresh, or starts a new run. Runs
//! execute on their own task so different users refresh concurrently while
//! one user's runs stay strictly sequential.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::domain::ports::{PersistentCache, TripSource, TripSourceError};
use crate::domain::{Credentials, Trip};

/// Inbox sizing and freshness window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSchedulerConfig {
    /// Minimum interval between two runs for the same user.
    pub cooldown: Duration,
    /// Jobs that may wait in the inbox before submitters block.
    pub inbox_capacity: usize,
}

impl Default for RefreshSchedulerConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(15 * 60),
            inbox_capacity: 10,
        }
    }
}

/// Successful answer to a refresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A run completed; these are the trips it fetched.
    Refreshed {
        /// Full history returned by the trip source.
        trips: Vec<Trip>,
    },
    /// The last run started within the cool-down; nothing was fetched.
    Fresh,
}

/// Errors delivered to refresh requesters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// The run this request waited on failed.
    #[error(transparent)]
    Source(#[from] TripSourceError),
    /// The scheduler no longer accepts jobs.
    #[error("refresh scheduler is shut down")]
    Closed,
    /// The scheduler went away before answering.
    #[error("refresh scheduler dropped the request")]
    Dropped,
}

type Signal = oneshot::Sender<Result<RefreshOutcome, RefreshError>>;

struct RefreshJob {
    credentials: Credentials,
    done: Signal,
}

struct JobDescriptor {
    last_run: DateTime<Utc>,
    waiters: Vec<Signal>,
}

type JobTable = Arc<Mutex<HashMap<String, JobDescriptor>>>;

/// Completion signal for one refresh request.
///
/// Dropping the ticket abandons interest in the outcome without cancelling
/// the run.
#[derive(Debug)]
pub struct RefreshTicket {
    receiver: oneshot::Receiver<Result<RefreshOutcome, RefreshError>>,
}

impl Future for RefreshTicket {
    type Output = Result<RefreshOutcome, RefreshError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(RefreshError::Dropped)))
    }
}

/// Handle used to request refreshes.
#[derive(Clone)]
pub struct RefreshScheduler {
    inbox: mpsc::Sender<RefreshJob>,
    jobs: JobTable,
}

impl RefreshScheduler {
    /// Start the coordinator on the current Tokio runtime.
    pub fn spawn(
        source: Arc<dyn TripSource>,
        cache: Arc<dyn PersistentCache>,
        clock: Arc<dyn Clock>,
        config: RefreshSchedulerConfig,
    ) -> Self {
        let (inbox, jobs_rx) = mpsc::channel(config.inbox_capacity.max(1));
        let jobs = JobTable::default();
        let coordinator = Coordinator {
            source,
            cache,
            clock,
            cooldown: TimeDelta::from_std(config.cooldown).unwrap_or(TimeDelta::MAX),
            jobs: Arc::clone(&jobs),
        };
        tokio::spawn(coordinator.run(jobs_rx));
        Self { inbox, jobs }
    }

    /// Ask for the user's history to be refreshed.
    ///
    /// Waits while the inbox is full. The returned ticket resolves once the
    /// request has been answered.
    pub async fn request(&self, credentials: Credentials) -> RefreshTicket {
        let (done, receiver) = oneshot::channel();
        if let Err(mpsc::error::SendError(rejected)) =
            self.inbox.send(RefreshJob { credentials, done }).await
        {
            let _ = rejected.done.send(Err(RefreshError::Closed));
        }
        RefreshTicket { receiver }
    }

    /// Number of requests waiting on the user's in-flight run.
    pub fn waiter_count(&self, user: &str) -> usize {
        lock_jobs(&self.jobs)
            .get(user)
            .map_or(0, |descriptor| descriptor.waiters.len())
    }
}

#[derive(Clone)]
struct Coordinator {
    source: Arc<dyn TripSource>,
    cache: Arc<dyn PersistentCache>,
    clock: Arc<dyn Clock>,
    cooldown: TimeDelta,
    jobs: JobTable,
}

impl Coordinator {
    async fn run(self, mut inbox: mpsc::Receiver<RefreshJob>) {
        while let Some(job) = inbox.recv().await {
            self.admit(job);
        }
        debug!("refresh inbox closed; coordinator exiting");
    }

    fn admit(&self, job: RefreshJob) {
        let RefreshJob { credentials, done } = job;
        let now = self.clock.utc();
        let mut jobs = lock_jobs(&self.jobs);
        match jobs.entry(credentials.username().to_owned()) {
            Entry::Occupied(mut entry) => {
                let descriptor = entry.get_mut();
                if !descriptor.waiters.is_empty() {
                    descriptor.waiters.push(done);
                    debug!(
                        user = credentials.username(),
                        waiters = descriptor.waiters.len(),
                        "joined in-flight refresh"
                    );
                    return;
                }
                if now - descriptor.last_run < self.cooldown {
                    debug!(user = credentials.username(), "trip history still fresh");
                    let _ = done.send(Ok(RefreshOutcome::Fresh));
                    return;
                }
                descriptor.last_run = now;
                descriptor.waiters.push(done);
            }
            Entry::Vacant(entry) => {
                entry.insert(JobDescriptor {
                    last_run: now,
                    waiters: vec![done],
                });
            }
        }
        drop(jobs);
        tokio::spawn(self.clone().refresh(credentials));
    }

    async fn refresh(self, credentials: Credentials) {
        let user = credentials.username();
        info!(user, "refreshing trip history");
        let outcome = match self.source.fetch_all_trips(&credentials).await {
            Ok(trips) => {
                for trip in &trips {
                    if let Err(error) = self.cache.put_trip(user, trip).await {
                        warn!(user, trip = %trip.id, error = %error, "failed to persist trip");
                    }
                }
                info!(user, trips = trips.len(), "trip history refreshed");
                Ok(RefreshOutcome::Refreshed { trips })
            }
            Err(error) => {
                warn!(user, error = %error, class = %error.class(), "trip history refresh failed");
                Err(RefreshError::Source(error))
            }
        };

        let waiters = lock_jobs(&self.jobs)
            .get_mut(user)
            .map(|descriptor| std::mem::take(&mut descriptor.waiters))
            .unwrap_or_default();
        debug!(user, waiters = waiters.len(), "signalling refresh waiters");
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

fn lock_jobs(jobs: &Mutex<HashMap<String, JobDescriptor>>) -> MutexGuard<'_, HashMap<String, JobDescriptor>> {
    jobs.lock().unwrap_or_else(|poisoned| {
        warn!("refresh job table lock poisoned; recovering");
        poisoned.into_inner()
    })
}
