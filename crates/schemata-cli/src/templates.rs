//! # Templates Subcommand
//!
//! Lists the template catalog, refreshes every template (`--load`) or
//! prints one template.

use anyhow::{bail, Result};
use clap::Args;
use schemata_core::SchemaKey;
use serde_json::Value;

use crate::Session;

/// Arguments for the `schemata templates` subcommand.
#[derive(Args, Debug)]
pub struct TemplatesArgs {
    /// Fetch every catalogued template, bypassing the cache.
    #[arg(long)]
    pub load: bool,

    /// Input model of the template to print.
    #[arg(long, value_name = "MODEL:VERSION", requires = "to")]
    pub from: Option<SchemaKey>,

    /// Output model of the template to print.
    #[arg(long, value_name = "MODEL:VERSION", requires = "from")]
    pub to: Option<SchemaKey>,

    /// Print the form hydration template for an output model.
    #[arg(long, value_name = "MODEL:VERSION", conflicts_with_all = ["from", "to"])]
    pub hydration: Option<SchemaKey>,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Execute the templates subcommand.
///
/// Returns 1 when `--load` is given and any template failed to load.
pub async fn run_templates(args: &TemplatesArgs, session: &Session) -> Result<u8> {
    let registry = session.templates()?;

    match (&args.from, &args.to, &args.hydration) {
        (Some(from), Some(to), None) => {
            let template = registry
                .template(from.name(), from.version(), to.name(), to.version())
                .await?;
            print_template(&template)?;
            return Ok(0);
        }
        (None, None, Some(target)) => {
            let template = registry
                .form_hydration_template(target.name(), target.version())
                .await?;
            print_template(&template)?;
            return Ok(0);
        }
        (None, None, None) => {}
        _ => bail!("--from and --to must be given together, and not with --hydration"),
    }

    if args.load {
        let report = registry.load_templates().await?;
        let summary = report.summary();
        if args.json {
            crate::print_json(&summary)?;
        } else {
            println!("Loaded: {}/{}", summary.loaded, summary.attempted);
            for (descriptor, e) in report.failures() {
                println!("  FAIL: {descriptor}: {e}");
            }
        }
        return Ok(u8::from(!report.is_complete()));
    }

    let descriptors = registry.available_templates().await?;
    if args.json {
        crate::print_json(&descriptors)?;
    } else {
        println!("Templates at {}:", registry.location().base_path);
        for descriptor in &descriptors {
            println!("  {descriptor}");
        }
    }
    Ok(0)
}

fn print_template(template: &Value) -> Result<()> {
    match template {
        Value::String(text) => println!("{text}"),
        other => crate::print_json(other)?,
    }
    Ok(())
}
