//! Errors raised while assembling a stage.

use thiserror::Error;

/// Configuration errors reported by [`crate::AdminLookupStageBuilder::build`].
///
/// These are the only failures the stage propagates; everything that goes
/// wrong for an individual place is logged and absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageBuildError {
    /// No resolver was supplied.
    #[error("a PIP resolver is required to build the admin lookup stage")]
    MissingResolver,
    /// The concurrency bound was zero.
    #[error("max concurrent requests must be at least 1")]
    ZeroConcurrency,
    /// The lookup timeout was zero.
    #[error("lookup timeout must be positive")]
    ZeroTimeout,
    /// Postal cities were enabled without a policy to apply.
    #[error("postal cities are enabled but no postal city policy was supplied")]
    MissingPostalCities,
}
