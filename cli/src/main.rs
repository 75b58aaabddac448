#![deny(missing_docs)]

//! # Rescomp CLI
//!
//! Command line front end of the resource model compiler.
//!
//! Compiles an OpenAPI description plus a resource configuration into the
//! resource model, for every configured resource or a single named one.

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod error;
mod generate;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI resource model compiler")]
struct Cli {
    #[clap(flatten)]
    generate: generate::GenerateArgs,

    /// Enables debug logging (overridden by RUST_LOG).
    #[clap(long, short)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match generate::execute(&cli.generate) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_single_resource() {
        let cli = Cli::try_parse_from([
            "rescomp",
            "--spec",
            "api.yml",
            "--config",
            "config.yml",
            "--format",
            "json",
            "-v",
            "thing",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.generate.format, generate::OutputFormat::Json);
        assert_eq!(cli.generate.resource.as_deref(), Some("thing"));
        assert!(cli.generate.output.is_none());
    }
}
