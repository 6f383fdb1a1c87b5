//! Outcome counters shared by every in-flight lookup.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters updated as places settle.
#[derive(Debug, Default)]
pub struct StageStats {
    received: AtomicU64,
    resolved: AtomicU64,
    bypassed: AtomicU64,
    failed: AtomicU64,
    unmapped: AtomicU64,
    emitted: AtomicU64,
}

/// Point-in-time copy of [`StageStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageSummary {
    /// Places accepted from the input.
    pub received: u64,
    /// Places whose lookup succeeded and passed the policy.
    pub resolved: u64,
    /// Places that skipped the lookup for lack of a centroid.
    pub bypassed: u64,
    /// Places dropped because their lookup failed or timed out.
    pub failed: u64,
    /// Places dropped because the resolver found no hierarchy.
    pub unmapped: u64,
    /// Places handed downstream.
    pub emitted: u64,
}

impl StageSummary {
    /// Places that did not reach the output.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.received.saturating_sub(self.emitted)
    }
}

impl fmt::Display for StageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received={} emitted={} dropped={} resolved={} bypassed={} failed={} unmapped={}",
            self.received,
            self.emitted,
            self.dropped(),
            self.resolved,
            self.bypassed,
            self.failed,
            self.unmapped
        )
    }
}

impl StageStats {
    /// Copy the current counters.
    #[must_use]
    pub fn snapshot(&self) -> StageSummary {
        StageSummary {
            received: self.received.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            unmapped: self.unmapped.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_resolved(&self) {
        self.resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bypassed(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unmapped(&self) {
        self.unmapped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }
}
