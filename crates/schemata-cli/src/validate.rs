//! # Validate Subcommand
//!
//! Loads the schema catalog, then validates a metadata file (JSON or YAML)
//! against one model/version, or a single section of it.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use schemata_registry::{ValidationIssue, ValidationService};

use crate::Session;

/// Arguments for the `schemata validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Metadata file (`.json`, `.yaml` or `.yml`).
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Schema model name.
    #[arg(long)]
    pub model: String,

    /// Schema version.
    #[arg(long = "schema-version", value_name = "VERSION")]
    pub version: String,

    /// Validate only this top-level section.
    #[arg(long)]
    pub section: Option<String>,

    /// Print the coerced document after validation.
    #[arg(long)]
    pub show_coerced: bool,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Execute the validate subcommand.
///
/// Returns 0 when the document is valid and 1 otherwise.
pub async fn run_validate(args: &ValidateArgs, session: &Session) -> Result<u8> {
    let mut metadata = crate::read_document(&args.path)?;

    let registry = session.schemas()?;
    registry.load_schemas().await?;
    let service = ValidationService::new(registry);

    let issues = match &args.section {
        Some(section) => service.validate_section(&mut metadata, &args.model, &args.version, section),
        None => service.validate(&mut metadata, &args.model, &args.version),
    };

    report(args, &issues)?;
    if args.show_coerced {
        crate::print_json(&metadata)?;
    }

    Ok(u8::from(!issues.is_empty()))
}

fn report(args: &ValidateArgs, issues: &[ValidationIssue]) -> Result<()> {
    if args.json {
        return crate::print_json(&issues);
    }

    let target = match &args.section {
        Some(section) => format!("{}:{} section '{section}'", args.model, args.version),
        None => format!("{}:{}", args.model, args.version),
    };
    if issues.is_empty() {
        println!("OK: {} is valid against {target}", args.path.display());
    } else {
        println!("FAIL: {} against {target}", args.path.display());
        for issue in issues {
            println!("  {issue}");
        }
    }
    Ok(())
}
