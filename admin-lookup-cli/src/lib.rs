//! Command-line interface for enriching place files with admin hierarchies.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod lookup;

pub use error::CliError;
use lookup::LookupArgs;

const ARG_INPUT: &str = "input";
const ARG_OUTPUT: &str = "output";
const ARG_PIP_BASE_URL: &str = "pip-base-url";
const ARG_LOOKUP_TIMEOUT_SECS: &str = "lookup-timeout-secs";
const ARG_MAX_CONCURRENT_REQUESTS: &str = "max-concurrent-requests";
const ARG_DROP_UNMAPPED: &str = "drop-unmapped";
const ARG_USE_POSTAL_CITIES: &str = "use-postal-cities";
const ARG_POSTAL_CITIES_PATH: &str = "postal-cities-path";
const ARG_DEFAULT_COUNTRY_NAME: &str = "default-country-name";
const ARG_DEFAULT_COUNTRY_ABBR: &str = "default-country-abbr";
const ARG_PRESERVE_ORDER: &str = "preserve-order";
const ENV_POSTAL_CITIES_PATH: &str = "ADMIN_LOOKUP_CMDS_LOOKUP_POSTAL_CITIES_PATH";
const ENV_DEFAULT_COUNTRY_NAME: &str = "ADMIN_LOOKUP_CMDS_LOOKUP_DEFAULT_COUNTRY_NAME";

/// Run the CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, when
/// the resolver or stage cannot be built, or when reading or writing places
/// fails. Per-place lookup failures are logged, not returned.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Lookup(args) => lookup::run_lookup(args).map(|_summary| ()),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "admin-lookup",
    about = "Enrich places with their administrative hierarchy",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve the admin hierarchy of every place in an NDJSON stream.
    Lookup(LookupArgs),
}

#[cfg(test)]
mod tests;
