//! Resolver trait and its shared-pointer forwarding impl.

use std::sync::Arc;

use async_trait::async_trait;
use geo::Coord;

use super::error::ResolverError;
use crate::{Placetype, ResolutionResult};

/// Look up the administrative hierarchy containing a point.
///
/// One call is made per place. Implementations are shared between
/// concurrent lookups, so they take `&self` and must be `Send + Sync`.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use geo::Coord;
/// use admin_lookup_core::{
///     Candidate, PipResolver, Placetype, ResolutionResult, ResolverError,
/// };
///
/// struct Everywhere;
///
/// #[async_trait]
/// impl PipResolver for Everywhere {
///     async fn lookup(
///         &self,
///         _centroid: Coord<f64>,
///         _layers: &[Placetype],
///     ) -> Result<ResolutionResult, ResolverError> {
///         Ok(ResolutionResult::new()
///             .with(Placetype::Country, vec![Candidate::new("Earth", "0")]))
///     }
/// }
/// ```
#[async_trait]
pub trait PipResolver: Send + Sync {
    /// Resolve `centroid`, restricted to `layers` when it is non-empty.
    ///
    /// An empty filter means every placetype is of interest.
    async fn lookup(
        &self,
        centroid: Coord<f64>,
        layers: &[Placetype],
    ) -> Result<ResolutionResult, ResolverError>;

    /// Release underlying resources such as pooled connections.
    ///
    /// Callers invoke this at most once, after every lookup has settled.
    /// The default does nothing.
    async fn close(&self) {}
}

#[async_trait]
impl<T> PipResolver for Arc<T>
where
    T: PipResolver + ?Sized,
{
    async fn lookup(
        &self,
        centroid: Coord<f64>,
        layers: &[Placetype],
    ) -> Result<ResolutionResult, ResolverError> {
        (**self).lookup(centroid, layers).await
    }

    async fn close(&self) {
        (**self).close().await;
    }
}
