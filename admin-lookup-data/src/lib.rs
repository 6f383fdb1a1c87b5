//! Adapters connecting the admin lookup pipeline to the outside world.
//!
//! Responsibilities:
//! - Resolve points against an HTTP point-in-polygon service.
//! - Read and write places as newline-delimited JSON.
//! - Load postal city tables from tab-separated files.
//!
//! Boundaries:
//! - Do not encode merge rules (live in `admin-lookup-core`).
//! - Do not schedule lookups (lives in `admin-lookup-stream`).
//!
//! Invariants:
//! - Thread-safe by default where feasible.
//! - No global mutable state.

#![forbid(unsafe_code)]

pub mod pip;
pub mod places;
pub mod postal_cities;

pub use pip::{
    DEFAULT_PIP_TIMEOUT, DEFAULT_USER_AGENT, HttpPipResolver, HttpPipResolverConfig,
    ProviderBuildError,
};
pub use places::{PlaceCodecError, PlaceWriter, decode_place, encode_place, read_places};
pub use postal_cities::{PostalCityTableError, load_postal_cities, parse_postal_cities};
