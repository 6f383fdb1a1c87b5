//! `PipResolver` backed by an HTTP point-in-polygon service.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use admin_lookup_core::{PipResolver, Placetype, ResolutionResult, ResolverError};
use async_trait::async_trait;
use geo::Coord;
use log::debug;
use reqwest::{Client, Url};
use thiserror::Error;

/// Error type for [`HttpPipResolver`] construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// The base URL could not be parsed or cannot carry path segments.
    #[error("invalid PIP base URL {url:?}: {message}")]
    InvalidBaseUrl {
        /// URL as configured.
        url: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Default user agent for PIP requests.
pub const DEFAULT_USER_AGENT: &str = "admin-lookup/0.1";

/// Default HTTP request timeout.
pub const DEFAULT_PIP_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`HttpPipResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpPipResolverConfig {
    /// Base URL of the PIP service (e.g., `"http://localhost:3102"`).
    pub base_url: String,
    /// Connect and request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpPipResolverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3102".to_owned(),
            timeout: DEFAULT_PIP_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpPipResolverConfig {
    /// Create a configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// HTTP point-in-polygon resolver.
///
/// The underlying [`Client`] pools connections and is shared by every
/// concurrent lookup. After [`PipResolver::close`] the resolver refuses
/// further lookups with [`ResolverError::Closed`].
#[derive(Debug)]
pub struct HttpPipResolver {
    client: Client,
    config: HttpPipResolverConfig,
    base_url: Url,
    closed: AtomicBool,
}

impl HttpPipResolver {
    /// Create a resolver with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpPipResolverConfig::new(base_url))
    }

    /// Create a resolver with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails
    /// to build.
    pub fn with_config(config: HttpPipResolverConfig) -> Result<Self, ProviderBuildError> {
        let base_url = parse_base_url(&config.base_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        Ok(Self {
            client,
            config,
            base_url,
            closed: AtomicBool::new(false),
        })
    }

    /// Configuration the resolver was built with.
    #[must_use]
    pub fn config(&self) -> &HttpPipResolverConfig {
        &self.config
    }

    /// Whether [`PipResolver::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Build the lookup URL: `{base_url}/{lon}/{lat}[?layers=a,b]`.
    fn build_lookup_url(&self, centroid: Coord<f64>, layers: &[Placetype]) -> String {
        let mut url = format!(
            "{}/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            centroid.x,
            centroid.y
        );
        if !layers.is_empty() {
            let filter: Vec<&str> = layers.iter().map(|placetype| placetype.as_str()).collect();
            url.push_str("?layers=");
            url.push_str(&filter.join(","));
        }
        url
    }

    /// Convert a reqwest error to a `ResolverError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> ResolverError {
        if error.is_timeout() {
            return ResolverError::Timeout {
                timeout: self.config.timeout,
            };
        }

        if let Some(status) = error.status() {
            return ResolverError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        if error.is_decode() {
            return ResolverError::Parse {
                message: error.to_string(),
            };
        }

        ResolverError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ProviderBuildError> {
    let url = Url::parse(raw).map_err(|err| ProviderBuildError::InvalidBaseUrl {
        url: raw.to_owned(),
        message: err.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ProviderBuildError::InvalidBaseUrl {
            url: raw.to_owned(),
            message: "expected an http or https URL".to_owned(),
        });
    }
    Ok(url)
}

#[async_trait]
impl PipResolver for HttpPipResolver {
    async fn lookup(
        &self,
        centroid: Coord<f64>,
        layers: &[Placetype],
    ) -> Result<ResolutionResult, ResolverError> {
        if self.is_closed() {
            return Err(ResolverError::Closed);
        }
        let url = self.build_lookup_url(centroid, layers);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        response
            .json::<ResolutionResult>()
            .await
            .map_err(|err| ResolverError::Parse {
                message: err.to_string(),
            })
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("closed PIP resolver for {}", self.base_url);
        }
    }
}
