//! Core domain types for administrative hierarchy lookup.
//!
//! Places flow through a lookup pipeline one at a time. Each place carries a
//! centroid and the set of administrative placetypes it supports; a
//! point-in-polygon resolver answers with candidate parents per placetype and
//! the policies in this crate decide how those candidates are merged back into
//! the place.
//!
//! Responsibilities:
//! - Model places, placetypes and resolver results.
//! - Define the [`PipResolver`] seam implemented by transport adapters.
//! - Encode the merge rules ([`EnrichmentPolicy`], [`PostalCityPolicy`]).
//!
//! Boundaries:
//! - No I/O; transports live in `admin-lookup-data`.
//! - No scheduling; concurrency lives in `admin-lookup-stream`.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod layers;
pub mod place;
pub mod placetype;
pub mod policy;
pub mod postal_city;
pub mod resolution;
pub mod resolver;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use layers::{AdminLayerMapper, LayerMapper};
pub use place::{Parent, ParentError, Place};
pub use placetype::{Placetype, UnknownPlacetype};
pub use policy::{
    DefaultCountry, Disposition, EnrichmentPolicy, MissingCountry, SUSPECT_LOG_TARGET,
    ZIP_ADDRESS_KEY,
};
pub use postal_city::{PostalCity, PostalCityPolicy, PostalCityTable};
pub use resolution::{Candidate, ResolutionResult};
pub use resolver::{PipResolver, ResolverError};
