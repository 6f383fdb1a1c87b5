//! Focused unit tests covering lookup configuration and place streaming.

use super::helpers::{workspace, write_utf8};
use super::*;
use crate::lookup::{LookupConfig, ResolverBuilder, build_stage, config_from_layers_for_test, enrich_places};
use admin_lookup_core::test_support::{StubResolver, block_on};
use admin_lookup_core::{
    Candidate, DefaultCountry, MissingCountry, PipResolver, Placetype, ResolutionResult,
};
use admin_lookup_stream::{DEFAULT_LOOKUP_TIMEOUT, OutputOrder, StageConfig};
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;

struct FixedResolverBuilder(Arc<StubResolver>);

impl ResolverBuilder for FixedResolverBuilder {
    fn build(&self, _config: &LookupConfig) -> Result<Arc<dyn PipResolver>, CliError> {
        Ok(Arc::clone(&self.0) as Arc<dyn PipResolver>)
    }
}

fn country_only() -> ResolutionResult {
    ResolutionResult::new().with(
        Placetype::Country,
        vec![Candidate::new("United States", "85633793").abbr("USA")],
    )
}

fn config_with_stage(stage: StageConfig) -> LookupConfig {
    LookupConfig {
        input: None,
        output: None,
        pip_base_url: "http://localhost:3102".to_owned(),
        postal_cities_path: None,
        stage,
    }
}

fn run_enrich(stage_config: StageConfig, input: &'static [u8]) -> (Result<u64, CliError>, String) {
    let builder = FixedResolverBuilder(Arc::new(StubResolver::with_result(country_only())));
    let stage = build_stage(&config_with_stage(stage_config), &builder).expect("stage builds");
    block_on(async move {
        let (sink, mut drain) = tokio::io::duplex(1 << 16);
        let outcome = enrich_places(stage, Box::new(input), Box::new(sink))
            .await
            .map(|summary| summary.emitted);
        let mut written = String::new();
        drain
            .read_to_string(&mut written)
            .await
            .expect("read enriched output");
        (outcome, written)
    })
}

#[rstest]
fn converting_empty_args_uses_defaults() {
    let config = LookupConfig::try_from(LookupArgs::default()).expect("defaults build");

    assert_eq!(config.input, None);
    assert_eq!(config.output, None);
    assert_eq!(config.pip_base_url, "http://localhost:3102");
    assert_eq!(config.postal_cities_path, None);
    assert_eq!(config.stage.max_concurrent_requests, 1);
    assert_eq!(config.stage.lookup_timeout, Some(DEFAULT_LOOKUP_TIMEOUT));
    assert_eq!(config.stage.output_order, OutputOrder::Unordered);
    assert!(!config.stage.policy.drop_unmapped);
    assert_eq!(config.stage.policy.missing_country, MissingCountry::LogOnly);
    assert!(!config.stage.use_postal_cities);
}

#[rstest]
fn converting_explicit_args_carries_every_option() {
    let args = LookupArgs {
        pip_base_url: Some("http://pip.internal:4000".to_owned()),
        lookup_timeout_secs: Some(5),
        max_concurrent_requests: Some(16),
        drop_unmapped: Some(true),
        default_country_name: Some("United States".to_owned()),
        default_country_abbr: Some("USA".to_owned()),
        preserve_order: Some(true),
        ..LookupArgs::default()
    };

    let config = LookupConfig::try_from(args).expect("config builds");
    assert_eq!(config.pip_base_url, "http://pip.internal:4000");
    assert_eq!(config.stage.lookup_timeout, Some(Duration::from_secs(5)));
    assert_eq!(config.stage.max_concurrent_requests, 16);
    assert_eq!(config.stage.output_order, OutputOrder::Preserved);
    assert!(config.stage.policy.drop_unmapped);
    assert_eq!(
        config.stage.policy.missing_country,
        MissingCountry::Substitute(DefaultCountry {
            name: "United States".to_owned(),
            abbr: Some("USA".to_owned()),
        })
    );
}

#[rstest]
fn converting_abbreviation_without_country_name_errors() {
    let args = LookupArgs {
        default_country_abbr: Some("USA".to_owned()),
        ..LookupArgs::default()
    };

    let err = LookupConfig::try_from(args).expect_err("abbr alone should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_DEFAULT_COUNTRY_NAME);
            assert_eq!(env, ENV_DEFAULT_COUNTRY_NAME);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn converting_postal_cities_without_table_errors() {
    let args = LookupArgs {
        use_postal_cities: Some(true),
        ..LookupArgs::default()
    };

    let err = LookupConfig::try_from(args).expect_err("missing table should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_POSTAL_CITIES_PATH);
            assert_eq!(env, ENV_POSTAL_CITIES_PATH);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn postal_cities_table_is_ignored_unless_enabled() {
    let args = LookupArgs {
        postal_cities_path: Some("postal_cities.tsv".into()),
        ..LookupArgs::default()
    };

    let config = LookupConfig::try_from(args).expect("config builds");
    assert_eq!(config.postal_cities_path, None);
    assert!(!config.stage.use_postal_cities);
}

#[rstest]
#[case::missing_input(ARG_INPUT)]
#[case::missing_table(ARG_POSTAL_CITIES_PATH)]
fn validate_sources_reports_missing_files(#[case] expected_field: &'static str) {
    let (_tmp, root) = workspace();
    let input = root.join("places.ndjson");
    let table = root.join("postal_cities.tsv");
    if expected_field != ARG_INPUT {
        write_utf8(&input, b"");
    }
    if expected_field != ARG_POSTAL_CITIES_PATH {
        write_utf8(&table, b"");
    }

    let config = LookupConfig {
        input: Some(input),
        postal_cities_path: Some(table),
        ..config_with_stage(StageConfig::default().with_postal_cities(true))
    };

    let err = config.validate_sources().expect_err("expected failure");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, expected_field),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_not_file() {
    let (_tmp, root) = workspace();
    let input = root.join("places.ndjson");
    std::fs::create_dir(&input).expect("input directory");

    let config = LookupConfig {
        input: Some(input.clone()),
        ..config_with_stage(StageConfig::default())
    };

    let err = config
        .validate_sources()
        .expect_err("expected directory path to fail validation");
    match err {
        CliError::SourcePathNotFile { field, path } => {
            assert_eq!(field, ARG_INPUT);
            assert_eq!(path, input);
        }
        other => panic!("expected SourcePathNotFile, found {other:?}"),
    }
}

#[rstest]
fn build_stage_rejects_zero_concurrency() {
    let builder = FixedResolverBuilder(Arc::new(StubResolver::empty()));
    let config = config_with_stage(StageConfig::default().with_max_concurrent_requests(0));

    let err = build_stage(&config, &builder).expect_err("zero concurrency should error");
    match err {
        CliError::BuildStage(_) => {}
        other => panic!("expected BuildStage, found {other:?}"),
    }
}

#[rstest]
fn build_stage_loads_postal_cities_table() {
    let (_tmp, root) = workspace();
    let table = root.join("postal_cities.tsv");
    write_utf8(&table, b"421205765\t85922583\tSan Francisco\tSF\n");
    let builder = FixedResolverBuilder(Arc::new(StubResolver::empty()));
    let config = LookupConfig {
        postal_cities_path: Some(table),
        ..config_with_stage(StageConfig::default().with_postal_cities(true))
    };

    build_stage(&config, &builder).expect("stage builds with postal cities");
}

#[rstest]
fn enrich_places_skips_malformed_lines() {
    let input: &'static [u8] = concat!(
        r#"{"gid":"osm:venue:1","layer":"venue","centroid":{"lat":37.7,"lon":-122.4},"parent_fields":["country"]}"#,
        "\n",
        "not json\n",
        r#"{"gid":"osm:venue:2","layer":"venue"}"#,
        "\n",
    )
    .as_bytes();

    let (outcome, written) = run_enrich(StageConfig::default(), input);

    assert_eq!(outcome.expect("enrichment succeeds"), 2);
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(written.contains(r#""name":"United States""#));
    assert!(written.contains(r#""gid":"osm:venue:2""#));
}

#[rstest]
fn enrich_places_surfaces_read_failures_after_flushing() {
    let input: &'static [u8] = b"{\"gid\":\"osm:venue:1\",\"layer\":\"venue\"}\n\xff\xfe\n";

    let (outcome, written) = run_enrich(StageConfig::default(), input);

    match outcome {
        Err(CliError::ReadInput(_)) => {}
        other => panic!("expected ReadInput, found {other:?}"),
    }
    assert_eq!(written.lines().count(), 1);
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "max_concurrent_requests": "many" }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "pip_base_url": "http://from-file:3102",
            "max_concurrent_requests": 4,
            "lookup_timeout_secs": 10,
        }),
        None,
    );
    composer.push_environment(json!({
        "max_concurrent_requests": 8,
        "drop_unmapped": true,
    }));
    composer.push_cli(json!({
        "max_concurrent_requests": 2,
    }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.pip_base_url, "http://from-file:3102");
    assert_eq!(config.stage.max_concurrent_requests, 2);
    assert_eq!(config.stage.lookup_timeout, Some(Duration::from_secs(10)));
    assert!(config.stage.policy.drop_unmapped);
}
