//! Resolve a point to the administrative areas containing it.
//!
//! The [`PipResolver`] trait abstracts the point-in-polygon service. Callers
//! supply a centroid and a placetype filter and receive a
//! [`ResolutionResult`](crate::ResolutionResult). Transports live elsewhere;
//! this module only fixes the contract and its error type.

mod error;
mod provider;

pub use error::ResolverError;
pub use provider::PipResolver;
