//! Facade crate for admin hierarchy lookup.
//!
//! This crate re-exports the core domain types and the concurrent lookup
//! stage, and exposes the HTTP point-in-polygon resolver and NDJSON place
//! codecs behind the `http` feature.

#![forbid(unsafe_code)]

pub use admin_lookup_core::{
    AdminLayerMapper, Candidate, DefaultCountry, Disposition, EnrichmentPolicy, LayerMapper,
    MissingCountry, Parent, ParentError, PipResolver, Place, Placetype, PostalCity,
    PostalCityPolicy, PostalCityTable, ResolutionResult, ResolverError, UnknownPlacetype,
};
pub use admin_lookup_stream::{
    AdminLookupStage, AdminLookupStageBuilder, DEFAULT_LOOKUP_TIMEOUT, OutputOrder,
    StageBuildError, StageConfig, StageStats, StageSummary,
};

#[cfg(feature = "http")]
pub use admin_lookup_data::{
    HttpPipResolver, HttpPipResolverConfig, PlaceCodecError, PlaceWriter, PostalCityTableError,
    ProviderBuildError, load_postal_cities, read_places,
};

#[cfg(feature = "test-support")]
pub use admin_lookup_core::test_support;
