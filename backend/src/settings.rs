//! Runtime settings loaded via OrthoConfig.
//!
//! Every field is optional; accessors supply the defaults. Values come from
//! `BIKAGE_*` environment variables or a configuration file.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::domain::{BatchFetcherConfig, RefreshSchedulerConfig};
use crate::outbound::cache::DEFAULT_CACHE_PATH;
use crate::outbound::directions::DEFAULT_DIRECTIONS_ENDPOINT;

/// Configuration for the caches, the fetcher pool and the scheduler.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BIKAGE")]
pub struct BikageSettings {
    /// Google Directions API key.
    pub google_api_key: Option<String>,
    /// Directions endpoint override.
    pub directions_endpoint: Option<String>,
    /// Persist the cache to disk.
    pub cache_enabled: Option<bool>,
    /// Location of the JSON cache snapshot.
    pub cache_path: Option<PathBuf>,
    /// Concurrent routing workers.
    pub fetch_workers: Option<usize>,
    /// Routing requests that may queue before submitters wait.
    pub fetch_queue_capacity: Option<usize>,
    /// Routing calls issued per second.
    pub requests_per_second: Option<u32>,
    /// Deadline for a single routing call.
    pub routing_timeout_secs: Option<u64>,
    /// Minimum interval between two history refreshes for one user.
    pub refresh_cooldown_secs: Option<u64>,
    /// Refresh requests that may queue before submitters wait.
    pub refresh_inbox_capacity: Option<usize>,
    /// Offset applied when grouping trips into days.
    pub utc_offset_minutes: Option<i32>,
}

impl BikageSettings {
    /// Fetcher pool configuration, falling back to the defaults.
    pub fn fetcher_config(&self) -> BatchFetcherConfig {
        let defaults = BatchFetcherConfig::default();
        BatchFetcherConfig {
            workers: self.fetch_workers.unwrap_or(defaults.workers),
            queue_capacity: self.fetch_queue_capacity.unwrap_or(defaults.queue_capacity),
            requests_per_second: self
                .requests_per_second
                .unwrap_or(defaults.requests_per_second),
            request_timeout: self.routing_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Scheduler configuration, falling back to the defaults.
    pub fn scheduler_config(&self) -> RefreshSchedulerConfig {
        let defaults = RefreshSchedulerConfig::default();
        RefreshSchedulerConfig {
            cooldown: self
                .refresh_cooldown_secs
                .map_or(defaults.cooldown, Duration::from_secs),
            inbox_capacity: self
                .refresh_inbox_capacity
                .unwrap_or(defaults.inbox_capacity),
        }
    }

    /// Offset used for per-day statistics; UTC when unset or out of range.
    pub fn utc_offset(&self) -> FixedOffset {
        let minutes = self.utc_offset_minutes.unwrap_or(0);
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                warn!(minutes, "UTC offset out of range; using UTC");
                Utc.fix()
            })
    }

    /// Whether the cache should be persisted.
    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled.unwrap_or(true)
    }

    /// Return the configured cache path, falling back to the default.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_PATH))
    }

    /// Directions endpoint, falling back to the public Google endpoint.
    pub fn directions_endpoint(&self) -> Result<Url, url::ParseError> {
        Url::parse(
            self.directions_endpoint
                .as_deref()
                .unwrap_or(DEFAULT_DIRECTIONS_ENDPOINT),
        )
    }
}
