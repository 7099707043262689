//! # Schemas Subcommand
//!
//! Lists the schema catalog. `--load` retrieves and compiles every schema
//! and reports per-schema failures; `--stats` drops expired cache entries
//! and prints cache counters.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use crate::Session;

/// Arguments for the `schemata schemas` subcommand.
#[derive(Args, Debug)]
pub struct SchemasArgs {
    /// Retrieve and compile every catalogued schema.
    #[arg(long)]
    pub load: bool,

    /// Purge expired cache entries and print hit/miss counters.
    #[arg(long)]
    pub stats: bool,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Execute the schemas subcommand.
///
/// Returns 1 when `--load` is given and any schema failed to load.
pub async fn run_schemas(args: &SchemasArgs, session: &Session) -> Result<u8> {
    let registry = session.schemas()?;
    let catalog = registry.available_schemas().await?;

    let mut code = 0;
    if args.json && !args.load {
        crate::print_json(&catalog)?;
    } else if !args.json {
        println!("Schemas at {}:", registry.location().base_path);
        for entry in catalog.entries() {
            println!("  {}: {}", entry.name, entry.versions.join(", "));
        }
    }

    if args.load {
        let report = registry.load_schemas().await?;
        let summary = report.summary();
        if args.json {
            let failures: Vec<_> = report
                .failures()
                .map(|(key, e)| json!({"schema": key.to_string(), "error": e.to_string()}))
                .collect();
            crate::print_json(&json!({"summary": summary, "failures": failures}))?;
        } else {
            println!("Loaded: {}/{}", summary.loaded, summary.attempted);
            for (key, e) in report.failures() {
                println!("  FAIL: {key}: {e}");
            }
        }
        if !report.is_complete() {
            code = 1;
        }
    }

    if args.stats {
        let cache = session.fetcher.cache();
        let purged = cache.purge_expired();
        let stats = cache.stats();
        println!(
            "Cache: {} hits, {} misses, {} expired, {} entries ({} purged)",
            stats.hits(),
            stats.misses(),
            stats.expired(),
            cache.len(),
            purged
        );
    }

    Ok(code)
}
