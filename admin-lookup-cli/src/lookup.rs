//! `lookup` command: stream places through the admin lookup stage.

use std::pin::pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use admin_lookup_core::{DefaultCountry, EnrichmentPolicy, MissingCountry, PipResolver};
use admin_lookup_data::{
    DEFAULT_PIP_TIMEOUT, HttpPipResolver, HttpPipResolverConfig, PlaceCodecError, PlaceWriter,
    load_postal_cities, read_places,
};
use admin_lookup_fs::{create_utf8_file, open_utf8_file};
use admin_lookup_stream::{
    AdminLookupStage, DEFAULT_LOOKUP_TIMEOUT, OutputOrder, StageConfig, StageSummary,
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use futures_util::future;
use futures_util::stream::StreamExt;
use log::{debug, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite, BufReader, BufWriter};

use crate::{
    ARG_DEFAULT_COUNTRY_ABBR, ARG_DEFAULT_COUNTRY_NAME, ARG_DROP_UNMAPPED, ARG_INPUT,
    ARG_LOOKUP_TIMEOUT_SECS, ARG_MAX_CONCURRENT_REQUESTS, ARG_OUTPUT, ARG_PIP_BASE_URL,
    ARG_POSTAL_CITIES_PATH, ARG_PRESERVE_ORDER, ARG_USE_POSTAL_CITIES, CliError,
    ENV_DEFAULT_COUNTRY_NAME, ENV_POSTAL_CITIES_PATH,
};

type PlaceSource = Box<dyn AsyncRead + Send + Unpin>;
type PlaceSink = Box<dyn AsyncWrite + Send + Unpin>;

/// CLI arguments for the `lookup` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Read places as newline-delimited JSON, resolve each centroid \
                 against a point-in-polygon service and write the enriched \
                 places back out. Options can come from CLI flags, \
                 configuration files, or ADMIN_LOOKUP_* environment variables.",
    about = "Enrich places with their admin hierarchy"
)]
#[ortho_config(prefix = "ADMIN_LOOKUP")]
pub(crate) struct LookupArgs {
    /// NDJSON file of places to enrich; standard input when omitted.
    #[arg(long = ARG_INPUT, value_name = "path")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Destination for enriched places; standard output when omitted.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Base URL of the PIP service (e.g. "http://localhost:3102").
    #[arg(long = ARG_PIP_BASE_URL, value_name = "url")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) pip_base_url: Option<String>,
    /// Seconds to wait for a single lookup before dropping the place.
    #[arg(long = ARG_LOOKUP_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) lookup_timeout_secs: Option<u64>,
    /// Upper bound on lookups in flight at once.
    #[arg(long = ARG_MAX_CONCURRENT_REQUESTS, value_name = "n")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) max_concurrent_requests: Option<usize>,
    /// Drop places without a centroid or without any resolved hierarchy.
    #[arg(long = ARG_DROP_UNMAPPED, value_name = "bool", num_args = 0..=1, default_missing_value = "true")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) drop_unmapped: Option<bool>,
    /// Prefer the locality associated with the resolved postal code.
    #[arg(long = ARG_USE_POSTAL_CITIES, value_name = "bool", num_args = 0..=1, default_missing_value = "true")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) use_postal_cities: Option<bool>,
    /// Tab-separated postal city table.
    #[arg(long = ARG_POSTAL_CITIES_PATH, value_name = "path")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) postal_cities_path: Option<Utf8PathBuf>,
    /// Country name to assign when the resolver finds none.
    #[arg(long = ARG_DEFAULT_COUNTRY_NAME, value_name = "name")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) default_country_name: Option<String>,
    /// Abbreviation for the default country.
    #[arg(long = ARG_DEFAULT_COUNTRY_ABBR, value_name = "abbr")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) default_country_abbr: Option<String>,
    /// Emit places in input order instead of completion order.
    #[arg(long = ARG_PRESERVE_ORDER, value_name = "bool", num_args = 0..=1, default_missing_value = "true")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) preserve_order: Option<bool>,
}

impl LookupArgs {
    pub(crate) fn into_config(self) -> Result<LookupConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        LookupConfig::try_from(merged)
    }
}

/// Resolved `lookup` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LookupConfig {
    /// Places to read; `None` reads standard input.
    pub(crate) input: Option<Utf8PathBuf>,
    /// Where to write; `None` writes standard output.
    pub(crate) output: Option<Utf8PathBuf>,
    /// Base URL for the PIP service.
    pub(crate) pip_base_url: String,
    /// Postal city table, present only when postal cities are enabled.
    pub(crate) postal_cities_path: Option<Utf8PathBuf>,
    /// Stage configuration.
    pub(crate) stage: StageConfig,
}

impl LookupConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        if let Some(input) = &self.input {
            Self::require_existing(input, ARG_INPUT)?;
        }
        if let Some(table) = &self.postal_cities_path {
            Self::require_existing(table, ARG_POSTAL_CITIES_PATH)?;
        }
        Ok(())
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match admin_lookup_fs::file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field,
                    path: path.to_path_buf(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl TryFrom<LookupArgs> for LookupConfig {
    type Error = CliError;

    fn try_from(args: LookupArgs) -> Result<Self, Self::Error> {
        let missing_country = match (args.default_country_name, args.default_country_abbr) {
            (Some(name), abbr) => MissingCountry::Substitute(DefaultCountry { name, abbr }),
            (None, Some(_)) => {
                return Err(CliError::MissingArgument {
                    field: ARG_DEFAULT_COUNTRY_NAME,
                    env: ENV_DEFAULT_COUNTRY_NAME,
                });
            }
            (None, None) => MissingCountry::LogOnly,
        };

        let use_postal_cities = args.use_postal_cities.unwrap_or(false);
        let postal_cities_path = if use_postal_cities {
            Some(args.postal_cities_path.ok_or(CliError::MissingArgument {
                field: ARG_POSTAL_CITIES_PATH,
                env: ENV_POSTAL_CITIES_PATH,
            })?)
        } else {
            if args.postal_cities_path.is_some() {
                debug!("ignoring --{ARG_POSTAL_CITIES_PATH} without --{ARG_USE_POSTAL_CITIES}");
            }
            None
        };

        let policy = EnrichmentPolicy {
            drop_unmapped: args.drop_unmapped.unwrap_or(false),
            missing_country,
        };
        let lookup_timeout = args
            .lookup_timeout_secs
            .map_or(DEFAULT_LOOKUP_TIMEOUT, Duration::from_secs);
        let output_order = if args.preserve_order.unwrap_or(false) {
            OutputOrder::Preserved
        } else {
            OutputOrder::Unordered
        };
        let stage = StageConfig::default()
            .with_policy(policy)
            .with_max_concurrent_requests(args.max_concurrent_requests.unwrap_or(1))
            .with_lookup_timeout(Some(lookup_timeout))
            .with_output_order(output_order)
            .with_postal_cities(use_postal_cities);

        let pip_base_url = args
            .pip_base_url
            .unwrap_or_else(|| HttpPipResolverConfig::default().base_url);

        Ok(Self {
            input: args.input,
            output: args.output,
            pip_base_url,
            postal_cities_path,
            stage,
        })
    }
}

/// Builds the resolver for the current lookup invocation.
pub(crate) trait ResolverBuilder {
    fn build(&self, config: &LookupConfig) -> Result<Arc<dyn PipResolver>, CliError>;
}

pub(crate) struct DefaultResolverBuilder;

impl ResolverBuilder for DefaultResolverBuilder {
    fn build(&self, config: &LookupConfig) -> Result<Arc<dyn PipResolver>, CliError> {
        let timeout = config
            .stage
            .lookup_timeout
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(DEFAULT_PIP_TIMEOUT);
        let resolver_config =
            HttpPipResolverConfig::new(config.pip_base_url.clone()).with_timeout(timeout);
        let resolver = HttpPipResolver::with_config(resolver_config).map_err(|source| {
            CliError::BuildResolver {
                base_url: config.pip_base_url.clone(),
                source,
            }
        })?;
        Ok(Arc::new(resolver))
    }
}

pub(crate) fn run_lookup(args: LookupArgs) -> Result<StageSummary, CliError> {
    run_lookup_with(args, &DefaultResolverBuilder)
}

pub(crate) fn run_lookup_with(
    args: LookupArgs,
    builder: &dyn ResolverBuilder,
) -> Result<StageSummary, CliError> {
    let config = resolve_lookup_config(args)?;
    let stage = build_stage(&config, builder)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    runtime.block_on(async {
        let reader = open_input(config.input.as_deref())?;
        let writer = open_output(config.output.as_deref())?;
        enrich_places(stage, reader, writer).await
    })
}

fn resolve_lookup_config(args: LookupArgs) -> Result<LookupConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

pub(crate) fn build_stage(
    config: &LookupConfig,
    builder: &dyn ResolverBuilder,
) -> Result<AdminLookupStage, CliError> {
    let mut stage = AdminLookupStage::builder().config(config.stage.clone());
    if let Some(path) = &config.postal_cities_path {
        stage = stage.postal_cities(load_postal_cities(path)?);
    }
    let resolver = builder.build(config)?;
    Ok(stage.resolver(resolver).build()?)
}

fn open_input(path: Option<&Utf8Path>) -> Result<PlaceSource, CliError> {
    let Some(path) = path else {
        return Ok(Box::new(tokio::io::stdin()));
    };
    let file = open_utf8_file(path).map_err(|source| CliError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(BufReader::new(tokio::fs::File::from_std(
        file.into_std(),
    ))))
}

fn open_output(path: Option<&Utf8Path>) -> Result<PlaceSink, CliError> {
    let Some(path) = path else {
        return Ok(Box::new(BufWriter::new(tokio::io::stdout())));
    };
    let file = create_utf8_file(path).map_err(|source| CliError::CreateOutput {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(BufWriter::new(tokio::fs::File::from_std(
        file.into_std(),
    ))))
}

/// Stream every place from `reader` through `stage` into `writer`.
///
/// Malformed lines are logged and skipped. A read failure stops the input;
/// places already in flight still settle and are written before the error
/// is returned.
pub(crate) async fn enrich_places(
    stage: AdminLookupStage,
    reader: PlaceSource,
    writer: PlaceSink,
) -> Result<StageSummary, CliError> {
    let stats = stage.stats();
    let read_failure: Arc<Mutex<Option<PlaceCodecError>>> = Arc::default();
    let failure_slot = Arc::clone(&read_failure);

    let places = read_places(reader).filter_map(move |item| {
        let place = match item {
            Ok(place) => Some(place),
            Err(err) if err.is_record_error() => {
                warn!("skipping {err}");
                None
            }
            Err(err) => {
                if let Ok(mut slot) = failure_slot.lock() {
                    slot.get_or_insert(err);
                }
                None
            }
        };
        future::ready(place)
    });

    let mut enriched = pin!(stage.enrich(places));
    let mut writer = PlaceWriter::new(writer);
    while let Some(place) = enriched.next().await {
        writer.write(&place).await.map_err(CliError::WriteOutput)?;
    }
    writer.finish().await.map_err(CliError::WriteOutput)?;

    let failure = read_failure.lock().ok().and_then(|mut slot| slot.take());
    if let Some(err) = failure {
        return Err(CliError::ReadInput(err));
    }
    Ok(stats.snapshot())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<LookupConfig, CliError> {
    let merged = LookupArgs::merge_from_layers(layers).map_err(CliError::from)?;
    LookupConfig::try_from(merged)
}
