//! Error types emitted by the admin lookup CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use admin_lookup_data::{PlaceCodecError, PostalCityTableError, ProviderBuildError};
use admin_lookup_stream::StageBuildError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors emitted by the admin lookup CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The postal city table could not be loaded.
    #[error(transparent)]
    LoadPostalCities(#[from] PostalCityTableError),
    /// Constructing the PIP resolver failed.
    #[error("failed to build PIP resolver for {base_url:?}: {source}")]
    BuildResolver {
        base_url: String,
        #[source]
        source: ProviderBuildError,
    },
    /// The stage configuration was rejected.
    #[error("invalid lookup configuration: {0}")]
    BuildStage(#[from] StageBuildError),
    /// The async runtime could not be started.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Opening the input file failed.
    #[error("failed to open input at {path:?}: {source}")]
    OpenInput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Creating the output file failed.
    #[error("failed to create output at {path:?}: {source}")]
    CreateOutput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reading places from the input failed.
    #[error("failed to read places: {0}")]
    ReadInput(#[source] PlaceCodecError),
    /// Writing enriched places failed.
    #[error("failed to write places: {0}")]
    WriteOutput(#[source] PlaceCodecError),
}
