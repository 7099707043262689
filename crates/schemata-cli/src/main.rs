//! # schemata CLI entry point
//!
//! Parses command-line arguments, reads configuration from the environment
//! and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use schemata_cli::config::AppConfig;
use schemata_cli::matching::{run_match, MatchArgs};
use schemata_cli::resolve::{run_resolve, ResolveArgs};
use schemata_cli::schemas::{run_schemas, SchemasArgs};
use schemata_cli::templates::{run_templates, TemplatesArgs};
use schemata_cli::validate::{run_validate, ValidateArgs};
use schemata_cli::Session;

/// Schemata: versioned schema and template registry.
///
/// Locations come from `SCHEMA_LOCATION` and `TEMPLATES_LOCATION` (a local
/// path, a GitHub URL or a raw.githubusercontent.com URL).
#[derive(Parser, Debug)]
#[command(name = "schemata", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a location string to its fetch base path.
    Resolve(ResolveArgs),

    /// List the schema catalog, optionally loading every schema.
    Schemas(SchemasArgs),

    /// Validate a metadata file against a schema or one of its sections.
    Validate(ValidateArgs),

    /// Find every catalogued schema a metadata file satisfies.
    Match(MatchArgs),

    /// List, load or print transformation templates.
    Templates(TemplatesArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "schemata CLI starting");

    let result = run(cli.command).await;

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<u8> {
    let config = AppConfig::from_env()?;

    match command {
        Commands::Resolve(args) => run_resolve(&args, &config),
        Commands::Schemas(args) => run_schemas(&args, &Session::new(config)?).await,
        Commands::Validate(args) => run_validate(&args, &Session::new(config)?).await,
        Commands::Match(args) => run_match(&args, &Session::new(config)?).await,
        Commands::Templates(args) => run_templates(&args, &Session::new(config)?).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_validate_section() {
        let cli = Cli::try_parse_from([
            "schemata",
            "validate",
            "dataset.yaml",
            "--model",
            "hdruk",
            "--schema-version",
            "2.1.2",
            "--section",
            "summary",
        ])
        .unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.model, "hdruk");
        assert_eq!(args.version, "2.1.2");
        assert_eq!(args.section.as_deref(), Some("summary"));
    }

    #[test]
    fn cli_parse_validate_rejects_bare_version_flag() {
        let result = Cli::try_parse_from([
            "schemata", "validate", "dataset.yaml", "--model", "hdruk", "--version", "2.1.2",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_schemas_stats() {
        let cli = Cli::try_parse_from(["schemata", "schemas", "--load", "--stats"]).unwrap();
        if let Commands::Schemas(args) = cli.command {
            assert!(args.load);
            assert!(args.stats);
            assert!(!args.json);
        }
    }
}
