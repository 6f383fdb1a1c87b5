//! Concurrent admin lookup stage.
//!
//! [`AdminLookupStage`] turns a stream of places into a stream of enriched
//! places. Each place costs at most one resolver lookup; up to
//! `max_concurrent_requests` lookups run at once and the resolver is released
//! once every lookup has settled.
//!
//! Invariants:
//! - A place without a centroid never reaches the resolver.
//! - Every input place is emitted at most once or dropped.
//! - Per-place failures never end the stream; they are logged and counted.

#![forbid(unsafe_code)]

mod config;
mod error;
mod stage;
mod stats;

pub use config::{DEFAULT_LOOKUP_TIMEOUT, OutputOrder, StageConfig};
pub use error::StageBuildError;
pub use stage::{AdminLookupStage, AdminLookupStageBuilder};
pub use stats::{StageStats, StageSummary};
