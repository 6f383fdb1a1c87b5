//! Stage configuration.

use std::time::Duration;

use admin_lookup_core::EnrichmentPolicy;

/// Default per-lookup timeout.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Order in which enriched places leave the stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputOrder {
    /// Emit places as their lookups settle.
    #[default]
    Unordered,
    /// Hold finished places until every earlier place has been emitted or
    /// dropped.
    Preserved,
}

/// Configuration for [`crate::AdminLookupStage`].
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use admin_lookup_stream::{OutputOrder, StageConfig};
///
/// let config = StageConfig::default()
///     .with_max_concurrent_requests(8)
///     .with_lookup_timeout(Some(Duration::from_secs(5)))
///     .with_output_order(OutputOrder::Preserved);
/// assert_eq!(config.max_concurrent_requests, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageConfig {
    /// Drop, default-country and merge rules.
    pub policy: EnrichmentPolicy,
    /// Upper bound on lookups outstanding at once. Must be at least one.
    pub max_concurrent_requests: usize,
    /// Per-lookup timeout; `None` waits indefinitely.
    pub lookup_timeout: Option<Duration>,
    /// Output ordering.
    pub output_order: OutputOrder,
    /// Apply the postal city policy after merging.
    pub use_postal_cities: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            policy: EnrichmentPolicy::default(),
            max_concurrent_requests: 1,
            lookup_timeout: Some(DEFAULT_LOOKUP_TIMEOUT),
            output_order: OutputOrder::Unordered,
            use_postal_cities: false,
        }
    }
}

impl StageConfig {
    /// Set the enrichment policy.
    #[must_use]
    pub fn with_policy(mut self, policy: EnrichmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the concurrency bound.
    #[must_use]
    pub fn with_max_concurrent_requests(mut self, limit: usize) -> Self {
        self.max_concurrent_requests = limit;
        self
    }

    /// Set the per-lookup timeout.
    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Set the output ordering.
    #[must_use]
    pub fn with_output_order(mut self, order: OutputOrder) -> Self {
        self.output_order = order;
        self
    }

    /// Enable or disable the postal city policy.
    #[must_use]
    pub fn with_postal_cities(mut self, enabled: bool) -> Self {
        self.use_postal_cities = enabled;
        self
    }
}
