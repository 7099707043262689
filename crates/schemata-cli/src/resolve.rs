//! # Resolve Subcommand
//!
//! Prints the base path and load mode a location string resolves to. With
//! no argument, resolves the configured schema (or template) location.

use anyhow::Result;
use clap::Args;
use schemata_core::resolve_location;
use schemata_registry::{schema, template};

use crate::config::AppConfig;

/// Arguments for the `schemata resolve` subcommand.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Location to resolve. Defaults to the configured location.
    #[arg(value_name = "LOCATION")]
    pub location: Option<String>,

    /// Fallback branch for GitHub URLs without one.
    #[arg(long)]
    pub branch: Option<String>,

    /// Use the template location and branch instead of the schema ones.
    #[arg(long)]
    pub templates: bool,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Execute the resolve subcommand.
pub fn run_resolve(args: &ResolveArgs, config: &AppConfig) -> Result<u8> {
    let (env_name, configured, configured_branch) = if args.templates {
        (
            template::LOCATION_ENV,
            config.templates_location.as_deref(),
            config.templates_branch.as_deref(),
        )
    } else {
        (
            schema::LOCATION_ENV,
            config.schema_location.as_deref(),
            config.schema_branch.as_deref(),
        )
    };

    let value = args.location.as_deref().or(configured);
    let branch = args.branch.as_deref().or(configured_branch);
    let location = resolve_location(value, env_name, branch)?;

    if args.json {
        crate::print_json(&location)?;
    } else {
        let mode = if location.load_from_local_file {
            "local"
        } else {
            "remote"
        };
        println!("{} ({mode})", location.base_path);
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(location: Option<&str>) -> ResolveArgs {
        ResolveArgs {
            location: location.map(str::to_string),
            branch: None,
            templates: false,
            json: false,
        }
    }

    #[test]
    fn explicit_location_resolves() {
        let code = run_resolve(&args(Some("https://github.com/acme/schemas")), &AppConfig::default()).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn missing_location_names_the_family_variable() {
        let err = run_resolve(&args(None), &AppConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "SCHEMA_LOCATION environment variable is required.");

        let templates = ResolveArgs {
            templates: true,
            ..args(None)
        };
        let err = run_resolve(&templates, &AppConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "TEMPLATES_LOCATION environment variable is required.");
    }

    #[test]
    fn configured_location_is_the_default() {
        let config = AppConfig {
            schema_location: Some("./schemata/".into()),
            ..AppConfig::default()
        };
        assert_eq!(run_resolve(&args(None), &config).unwrap(), 0);
    }
}
