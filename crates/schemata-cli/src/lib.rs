//! # schemata-cli
//!
//! The `schemata` command-line interface over the schema and template
//! registries.
//!
//! ## Subcommands
//!
//! - `schemata resolve` prints the base path a location string resolves to.
//! - `schemata schemas` lists the schema catalog, optionally loading every schema.
//! - `schemata validate` validates a metadata file or one of its sections.
//! - `schemata match` lists every catalogued schema a metadata file satisfies.
//! - `schemata templates` lists, loads or prints transformation templates.
//!
//! ```bash
//! SCHEMA_LOCATION=https://github.com/HDRUK/schemata-2 schemata schemas --load
//! schemata validate dataset.yaml --model hdruk --schema-version 2.1.2 --section summary
//! schemata match dataset.json --errors
//! ```
//!
//! Exit codes: 0 on success, 1 on validation failure or no match, 2 on
//! operational error.

pub mod config;
pub mod matching;
pub mod resolve;
pub mod schemas;
pub mod templates;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use schemata_fetch::DocumentFetcher;
use schemata_registry::{RegistryContext, SchemaRegistry, TemplateRegistry};
use serde_json::Value;

use crate::config::AppConfig;

/// Shared handles for one CLI invocation.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: AppConfig,
    pub fetcher: Arc<DocumentFetcher>,
    pub context: RegistryContext,
}

impl Session {
    /// Build the fetcher and registry context from `config`.
    pub fn new(config: AppConfig) -> Result<Self> {
        let fetcher =
            Arc::new(DocumentFetcher::new(&config.fetch).context("failed to build HTTP client")?);
        let context =
            RegistryContext::new(fetcher.clone()).with_fetch_concurrency(config.fetch_concurrency);
        Ok(Self {
            config,
            fetcher,
            context,
        })
    }

    /// The schema registry for the configured location.
    pub fn schemas(&self) -> Result<SchemaRegistry> {
        Ok(SchemaRegistry::resolve(
            self.context.clone(),
            self.config.schema_location.as_deref(),
            self.config.schema_branch.as_deref(),
        )?)
    }

    /// The template registry for the configured location.
    pub fn templates(&self) -> Result<TemplateRegistry> {
        Ok(TemplateRegistry::resolve(
            self.context.clone(),
            self.config.templates_location.as_deref(),
            self.config.templates_branch.as_deref(),
        )?)
    }
}

/// Read a metadata document. `.yaml`/`.yml` files are parsed as YAML,
/// everything else as JSON.
pub fn read_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let value = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML: {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON: {}", path.display()))?
    };

    if !matches!(value, Value::Object(_)) {
        bail!("{} must contain an object", path.display());
    }
    Ok(value)
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_and_json_documents_are_equivalent() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("dataset.yaml");
        let json_file = dir.path().join("dataset.json");
        std::fs::write(&yaml, "summary:\n  title: Cohort\n  year: 2024\n").unwrap();
        std::fs::write(&json_file, r#"{"summary": {"title": "Cohort", "year": 2024}}"#).unwrap();

        let from_yaml = read_document(&yaml).unwrap();
        let from_json = read_document(&json_file).unwrap();
        assert_eq!(from_yaml, from_json);
        assert_eq!(from_yaml, json!({"summary": {"title": "Cohort", "year": 2024}}));
    }

    #[test]
    fn non_object_documents_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("list.json");
        std::fs::write(&file, "[1, 2]").unwrap();
        let err = read_document(&file).unwrap_err();
        assert!(err.to_string().contains("must contain an object"));
    }

    #[test]
    fn missing_location_is_reported_by_name() {
        let session = Session::new(AppConfig::default()).unwrap();
        let err = session.schemas().unwrap_err();
        assert_eq!(err.to_string(), "SCHEMA_LOCATION environment variable is required.");
        let err = session.templates().unwrap_err();
        assert_eq!(err.to_string(), "TEMPLATES_LOCATION environment variable is required.");
    }
}
