//! Lookup failures reported by PIP resolvers.

use std::time::Duration;

use thiserror::Error;

/// Errors from [`crate::resolver::PipResolver::lookup`].
///
/// Every variant is a per-place failure: the pipeline drops the affected
/// place and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ResolverError {
    /// The service answered with an HTTP error status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The service could not be reached.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The lookup did not settle in time.
    #[error("lookup timed out after {timeout:?}")]
    Timeout {
        /// Configured timeout.
        timeout: Duration,
    },
    /// The response body could not be decoded.
    #[error("failed to parse resolver response: {message}")]
    Parse {
        /// Decoder error description.
        message: String,
    },
    /// The resolver has been released and accepts no further lookups.
    #[error("resolver has been closed")]
    Closed,
}
