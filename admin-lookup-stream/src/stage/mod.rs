//! The bounded-parallelism lookup stage.
//!
//! Every place moves through `pending -> dispatched -> {resolved | failed |
//! bypassed} -> {emitted | dropped}`. The single suspension point is the
//! resolver lookup; policy decisions, the hierarchy merge and the postal city
//! override all run after that place's lookup settles and before it is
//! emitted.

mod builder;


use std::sync::Arc;

use admin_lookup_core::{
    Disposition, LayerMapper, PipResolver, Place, Placetype, PostalCityPolicy, ResolutionResult,
    ResolverError,
};
use futures_util::future::{self, Either};
use futures_util::stream::{self, Stream, StreamExt};
use geo::Coord;
use log::info;

use crate::{OutputOrder, StageConfig, StageStats};

pub use builder::AdminLookupStageBuilder;

/// Enrich places with their admin hierarchy.
///
/// Build one with [`AdminLookupStage::builder`]. The stage is consumed by
/// [`AdminLookupStage::enrich`] (or [`AdminLookupStage::finish`]), which is
/// what guarantees the resolver is released exactly once.
///
/// # Examples
/// ```
/// use admin_lookup_core::test_support::{StubResolver, block_on};
/// use admin_lookup_core::Place;
/// use admin_lookup_stream::{AdminLookupStage, StageConfig};
/// use futures_util::{StreamExt, stream};
///
/// let stage = AdminLookupStage::builder()
///     .resolver(StubResolver::empty())
///     .config(StageConfig::default().with_max_concurrent_requests(4))
///     .build()?;
///
/// let places = vec![Place::new("g1", "venue")];
/// let out: Vec<Place> = block_on(stage.enrich(stream::iter(places)).collect());
/// assert_eq!(out.len(), 1);
/// # Ok::<(), admin_lookup_stream::StageBuildError>(())
/// ```
pub struct AdminLookupStage {
    inner: Arc<StageInner>,
}

impl std::fmt::Debug for AdminLookupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminLookupStage")
            .field("config", &self.inner.config)
            .field("postal_cities", &self.inner.postal_cities.is_some())
            .field("stats", &self.inner.stats.snapshot())
            .finish_non_exhaustive()
    }
}

struct StageInner {
    resolver: Arc<dyn PipResolver>,
    layer_mapper: Arc<dyn LayerMapper>,
    postal_cities: Option<Arc<dyn PostalCityPolicy>>,
    config: StageConfig,
    stats: Arc<StageStats>,
}

impl AdminLookupStage {
    /// Start assembling a stage.
    #[must_use]
    pub fn builder() -> AdminLookupStageBuilder {
        AdminLookupStageBuilder::default()
    }

    /// Configuration the stage was built with.
    #[must_use]
    pub fn config(&self) -> &StageConfig {
        &self.inner.config
    }

    /// Shared handle on the outcome counters.
    ///
    /// The handle stays valid after the stage has been consumed.
    #[must_use]
    pub fn stats(&self) -> Arc<StageStats> {
        Arc::clone(&self.inner.stats)
    }

    /// Enrich a single place.
    ///
    /// Returns `None` when the place is dropped. This does not release the
    /// resolver; call [`AdminLookupStage::finish`] once done.
    pub async fn process(&self, place: Place) -> Option<Place> {
        self.inner.process(place).await
    }

    /// Release the resolver without streaming.
    pub async fn finish(self) {
        self.inner.release().await;
    }

    /// Enrich every place in `input`.
    ///
    /// At most `max_concurrent_requests` places are in flight; a new place is
    /// pulled from `input` only when a slot frees up. Once `input` ends and
    /// every outstanding lookup has settled the resolver is closed. Dropping
    /// the returned stream early skips the close.
    pub fn enrich<S>(self, input: S) -> impl Stream<Item = Place> + Send + 'static
    where
        S: Stream<Item = Place> + Send + 'static,
    {
        let limit = self.inner.config.max_concurrent_requests.max(1);
        let order = self.inner.config.output_order;
        let worker = Arc::clone(&self.inner);
        let lookups = input.map(move |place| {
            let stage = Arc::clone(&worker);
            async move { stage.process(place).await }
        });
        let settled = match order {
            OutputOrder::Unordered => Either::Left(lookups.buffer_unordered(limit)),
            OutputOrder::Preserved => Either::Right(lookups.buffered(limit)),
        };

        let finisher = self.inner;
        let release = stream::once(async move {
            finisher.release().await;
            None::<Place>
        });
        settled.chain(release).filter_map(future::ready)
    }
}

impl StageInner {
    async fn process(&self, mut place: Place) -> Option<Place> {
        self.stats.record_received();
        let policy = &self.config.policy;

        let centroid = match place.centroid() {
            Some(centroid) if !policy.should_bypass_lookup(&place) => centroid,
            _ => {
                self.stats.record_bypassed();
                return self.settle(place, policy.on_bypass());
            }
        };

        let layers = self.layer_mapper.layers_for(place.layer());
        let mut result = match self.lookup(centroid, &layers).await {
            Ok(result) => result,
            Err(err) => {
                self.stats.record_failed();
                let disposition = policy.on_lookup_error(&place, &err);
                return self.settle(place, disposition);
            }
        };

        if policy.apply(&mut place, &mut result) == Disposition::Drop {
            self.stats.record_unmapped();
            return None;
        }
        if let Some(postal_cities) = &self.postal_cities {
            postal_cities.apply(&result, &mut place);
        }
        self.stats.record_resolved();
        self.settle(place, Disposition::Emit)
    }

    async fn lookup(
        &self,
        centroid: Coord<f64>,
        layers: &[Placetype],
    ) -> Result<ResolutionResult, ResolverError> {
        let lookup = self.resolver.lookup(centroid, layers);
        match self.config.lookup_timeout {
            Some(timeout) => tokio::time::timeout(timeout, lookup)
                .await
                .unwrap_or_else(|_elapsed| Err(ResolverError::Timeout { timeout })),
            None => lookup.await,
        }
    }

    fn settle(&self, place: Place, disposition: Disposition) -> Option<Place> {
        match disposition {
            Disposition::Emit => {
                self.stats.record_emitted();
                Some(place)
            }
            Disposition::Drop => None,
        }
    }

    async fn release(&self) {
        self.resolver.close().await;
        info!("admin lookup finished: {}", self.stats.snapshot());
    }
}
