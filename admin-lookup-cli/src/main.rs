//! Entry point for the `admin-lookup` command.
#![forbid(unsafe_code)]

use admin_lookup_cli::CliError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match admin_lookup_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("admin-lookup: {err}");
            std::process::exit(1);
        }
    }
}
