//! Test doubles for the resolver seam.
//!
//! [`StubResolver`] answers lookups from a fixed response or a closure,
//! optionally after a delay, and records how it was driven: total calls,
//! peak concurrency, close calls and the layer filters it received.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use geo::Coord;

use crate::{PipResolver, Placetype, ResolutionResult, ResolverError};

type Responder = dyn Fn(Coord<f64>) -> Result<ResolutionResult, ResolverError> + Send + Sync;

/// Deterministic [`PipResolver`] for tests.
///
/// Counters are atomics so a single stub can be shared behind an `Arc`
/// between the code under test and the assertions.
pub struct StubResolver {
    responder: Arc<Responder>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    calls: AtomicUsize,
    close_calls: AtomicUsize,
    seen_layers: Mutex<Vec<Vec<Placetype>>>,
}

impl std::fmt::Debug for StubResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubResolver")
            .field("delay", &self.delay)
            .field("calls", &self.calls())
            .field("peak_in_flight", &self.peak_in_flight())
            .field("close_calls", &self.close_calls())
            .finish_non_exhaustive()
    }
}

impl StubResolver {
    /// Answer every lookup with `respond(centroid)`.
    pub fn from_fn<F>(respond: F) -> Self
    where
        F: Fn(Coord<f64>) -> Result<ResolutionResult, ResolverError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(respond),
            delay: None,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
            seen_layers: Mutex::new(Vec::new()),
        }
    }

    /// Answer every lookup with a clone of `result`.
    pub fn with_result(result: ResolutionResult) -> Self {
        Self::from_fn(move |_| Ok(result.clone()))
    }

    /// Fail every lookup with a clone of `error`.
    pub fn with_error(error: ResolverError) -> Self {
        Self::from_fn(move |_| Err(error.clone()))
    }

    /// Answer every lookup with an empty mapping.
    pub fn empty() -> Self {
        Self::with_result(ResolutionResult::new())
    }

    /// Sleep for `delay` before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Lookups received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of lookups outstanding at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Times [`PipResolver::close`] was awaited.
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Layer filters received, in call order.
    pub fn seen_layers(&self) -> Vec<Vec<Placetype>> {
        self.seen_layers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PipResolver for StubResolver {
    async fn lookup(
        &self,
        centroid: Coord<f64>,
        layers: &[Placetype],
    ) -> Result<ResolutionResult, ResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_layers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(layers.to_vec());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let response = (self.responder)(centroid);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Drive `future` to completion on a fresh current-thread runtime.
///
/// # Panics
///
/// Panics if the runtime cannot be built.
pub fn block_on<F>(future: F) -> F::Output
where
    F: Future,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|err| panic!("failed to build Tokio runtime: {err}"))
        .block_on(future)
}
