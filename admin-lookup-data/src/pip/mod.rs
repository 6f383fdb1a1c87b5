//! HTTP point-in-polygon resolver.
//!
//! [`HttpPipResolver`] implements [`admin_lookup_core::PipResolver`] against
//! a service exposing `GET {base_url}/{lon}/{lat}`. An optional `layers`
//! query parameter restricts the placetypes the service considers. The
//! response body is a JSON object keyed by placetype, each value a list of
//! candidates.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use admin_lookup_core::{PipResolver, Placetype};
//! use admin_lookup_data::pip::{HttpPipResolver, HttpPipResolverConfig};
//! use geo::Coord;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpPipResolverConfig::new("http://localhost:3102")
//!     .with_timeout(Duration::from_secs(10));
//! let resolver = HttpPipResolver::with_config(config)?;
//!
//! let result = resolver
//!     .lookup(Coord { x: -122.4194, y: 37.7749 }, &[Placetype::Country])
//!     .await?;
//! println!("{:?}", result.first(Placetype::Country));
//! resolver.close().await;
//! # Ok(())
//! # }
//! ```

mod provider;

pub use provider::{
    DEFAULT_PIP_TIMEOUT, DEFAULT_USER_AGENT, HttpPipResolver, HttpPipResolverConfig,
    ProviderBuildError,
};
