//! Assembly and validation of [`AdminLookupStage`].

use std::sync::Arc;

use admin_lookup_core::{AdminLayerMapper, LayerMapper, PipResolver, PostalCityPolicy};

use super::{AdminLookupStage, StageInner};
use crate::{StageBuildError, StageConfig, StageStats};

/// Builder for [`AdminLookupStage`].
///
/// A resolver is mandatory. The layer mapper defaults to
/// [`AdminLayerMapper`]; the postal city policy is only consulted when
/// [`StageConfig::use_postal_cities`] is set.
#[derive(Default)]
pub struct AdminLookupStageBuilder {
    resolver: Option<Arc<dyn PipResolver>>,
    layer_mapper: Option<Arc<dyn LayerMapper>>,
    postal_cities: Option<Arc<dyn PostalCityPolicy>>,
    config: StageConfig,
}

impl std::fmt::Debug for AdminLookupStageBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminLookupStageBuilder")
            .field("resolver", &self.resolver.is_some())
            .field("layer_mapper", &self.layer_mapper.is_some())
            .field("postal_cities", &self.postal_cities.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl AdminLookupStageBuilder {
    /// Set the resolver every lookup is sent to.
    #[must_use]
    pub fn resolver<R>(mut self, resolver: R) -> Self
    where
        R: PipResolver + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Replace the default [`AdminLayerMapper`].
    #[must_use]
    pub fn layer_mapper<M>(mut self, mapper: M) -> Self
    where
        M: LayerMapper + 'static,
    {
        self.layer_mapper = Some(Arc::new(mapper));
        self
    }

    /// Supply the postal city strategy.
    #[must_use]
    pub fn postal_cities<P>(mut self, policy: P) -> Self
    where
        P: PostalCityPolicy + 'static,
    {
        self.postal_cities = Some(Arc::new(policy));
        self
    }

    /// Replace the stage configuration.
    #[must_use]
    pub fn config(mut self, config: StageConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration and build the stage.
    ///
    /// # Errors
    ///
    /// Returns [`StageBuildError`] when no resolver was supplied, when the
    /// concurrency bound or timeout is zero, or when postal cities are
    /// enabled without a policy.
    pub fn build(self) -> Result<AdminLookupStage, StageBuildError> {
        let resolver = self.resolver.ok_or(StageBuildError::MissingResolver)?;
        if self.config.max_concurrent_requests == 0 {
            return Err(StageBuildError::ZeroConcurrency);
        }
        if self.config.lookup_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(StageBuildError::ZeroTimeout);
        }
        let postal_cities = if self.config.use_postal_cities {
            Some(self.postal_cities.ok_or(StageBuildError::MissingPostalCities)?)
        } else {
            None
        };
        let layer_mapper = self
            .layer_mapper
            .unwrap_or_else(|| Arc::new(AdminLayerMapper));

        Ok(AdminLookupStage {
            inner: Arc::new(StageInner {
                resolver,
                layer_mapper,
                postal_cities,
                config: self.config,
                stats: Arc::new(StageStats::default()),
            }),
        })
    }
}
