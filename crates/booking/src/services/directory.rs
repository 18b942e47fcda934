//! Route directory client: maps station names to route positions.
//!
//! The directory is owned by the basic-data services of the wider
//! platform; this crate only consumes it through the [`RouteDirectory`]
//! trait. [`DirectoryClient`] adds the call discipline every consumer
//! needs: a per-attempt timeout and a single retry before the lookup is
//! reported unavailable.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::TrainRunKey;
use thiserror::Error;

/// Errors from route directory lookups.
///
/// An unknown station is not an error; it comes back as `Ok(None)`.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The directory could not be reached or did not answer in time.
    #[error("Route directory unavailable: {0}")]
    Unavailable(String),
}

/// Trait for resolving station names against a run's route.
#[async_trait]
pub trait RouteDirectory: Send + Sync {
    /// Returns the zero-based position of `station` on the run's route,
    /// or `Ok(None)` when the run or station is unknown.
    async fn station_index(
        &self,
        key: &TrainRunKey,
        station: &str,
    ) -> Result<Option<u32>, DirectoryError>;
}

#[derive(Debug, Default)]
struct DirectoryState {
    routes: HashMap<TrainRunKey, Vec<String>>,
    unavailable: bool,
    failures_remaining: u32,
    delay: Option<Duration>,
}

/// In-memory route directory for tests and single-process deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRouteDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

impl InMemoryRouteDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the ordered station list of a run's route.
    pub fn register_route<I, S>(&self, key: TrainRunKey, stations: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stations = stations.into_iter().map(Into::into).collect();
        self.state.write().unwrap().routes.insert(key, stations);
    }

    /// Number of stations on a registered route.
    pub fn station_count(&self, key: &TrainRunKey) -> Option<u32> {
        self.state
            .read()
            .unwrap()
            .routes
            .get(key)
            .map(|stations| stations.len() as u32)
    }

    /// Makes every lookup fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Makes the next `count` lookups fail, then recover.
    pub fn inject_failures(&self, count: u32) {
        self.state.write().unwrap().failures_remaining = count;
    }

    /// Adds artificial latency to every lookup.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state.write().unwrap().delay = delay;
    }
}

#[async_trait]
impl RouteDirectory for InMemoryRouteDirectory {
    async fn station_index(
        &self,
        key: &TrainRunKey,
        station: &str,
    ) -> Result<Option<u32>, DirectoryError> {
        // The guard must not be held across the sleep.
        let (fail, delay, index) = {
            let mut state = self.state.write().unwrap();
            let fail = if state.unavailable {
                true
            } else if state.failures_remaining > 0 {
                state.failures_remaining -= 1;
                true
            } else {
                false
            };
            let index = state.routes.get(key).and_then(|stations| {
                stations
                    .iter()
                    .position(|s| s == station)
                    .map(|i| i as u32)
            });
            (fail, state.delay, index)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(DirectoryError::Unavailable("injected fault".to_string()));
        }
        Ok(index)
    }
}

/// Timeout-and-retry wrapper around any [`RouteDirectory`].
///
/// Each attempt is bounded; exactly one retry is made when an attempt
/// fails or times out, after which the error surfaces.
#[derive(Debug, Clone)]
pub struct DirectoryClient<D> {
    inner: D,
    timeout: Duration,
}

impl<D: RouteDirectory> DirectoryClient<D> {
    /// Wraps a directory with a per-attempt timeout.
    pub fn new(inner: D, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn attempt(
        &self,
        key: &TrainRunKey,
        station: &str,
    ) -> Result<Option<u32>, DirectoryError> {
        match tokio::time::timeout(self.timeout, self.inner.station_index(key, station)).await {
            Ok(result) => result,
            Err(_) => Err(DirectoryError::Unavailable(format!(
                "timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

#[async_trait]
impl<D: RouteDirectory> RouteDirectory for DirectoryClient<D> {
    async fn station_index(
        &self,
        key: &TrainRunKey,
        station: &str,
    ) -> Result<Option<u32>, DirectoryError> {
        match self.attempt(key, station).await {
            Err(DirectoryError::Unavailable(reason)) => {
                metrics::counter!("booking_directory_retries_total").increment(1);
                tracing::warn!(%key, station, %reason, "directory lookup failed, retrying once");
                self.attempt(key, station).await
            }
            outcome => outcome,
        }
    }
}
