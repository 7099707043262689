//! # Match Subcommand
//!
//! Lists every catalogued schema a metadata file satisfies.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use schemata_registry::ValidationService;

use crate::Session;

/// Arguments for the `schemata match` subcommand.
#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Metadata file (`.json`, `.yaml` or `.yml`).
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Include the validation issues of every non-matching schema.
    #[arg(long)]
    pub errors: bool,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Execute the match subcommand.
///
/// Returns 0 when at least one schema matches and 1 otherwise.
pub async fn run_match(args: &MatchArgs, session: &Session) -> Result<u8> {
    let metadata = crate::read_document(&args.path)?;

    let registry = session.schemas()?;
    registry.load_schemas().await?;
    let service = ValidationService::new(registry);

    let results = service.find_matching_schemas(&metadata, args.errors).await?;

    if args.json {
        crate::print_json(&results)?;
    } else {
        for result in &results {
            let mark = if result.matches { "MATCH" } else { "-" };
            println!("{mark:>5} {}:{}", result.name, result.version);
            for issue in result.errors.iter().flatten() {
                println!("        {issue}");
            }
        }
    }

    let any = results.iter().any(|r| r.matches);
    Ok(u8::from(!any))
}
