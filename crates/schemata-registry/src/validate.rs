//! # Validation and Matching
//!
//! [`ValidationService`] evaluates metadata against the validators the
//! [`SchemaRegistry`] installed. It never fetches schemas; an unknown schema
//! or section is reported as a single synthetic issue.
//!
//! Validation mutates its input (coercion and defaults). Matching must not
//! let one schema's rewrites influence another, so it evaluates a fresh
//! clone of the caller's document for every catalogued schema.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use schemata_core::{SchemaKey, SchemaRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::ValidationIssue;
use crate::error::RegistryError;
use crate::schema::SchemaRegistry;

/// Whether a document satisfies one catalogued schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Model name from the catalog.
    pub name: String,
    /// Model version from the catalog.
    pub version: String,
    /// `true` when validation produced no issues.
    pub matches: bool,
    /// The issues found, present only when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationIssue>>,
}

/// Validates metadata against installed schemas.
#[derive(Debug, Clone)]
pub struct ValidationService {
    registry: SchemaRegistry,
}

impl ValidationService {
    /// Validate against the validators `registry` installs.
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    /// The registry this service reads from.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Validate a whole document in place.
    pub fn validate(&self, metadata: &mut Value, model: &str, version: &str) -> Vec<ValidationIssue> {
        let reference = SchemaRef::whole(SchemaKey::new(model, version));
        match self.registry.context().engine().lookup(&reference) {
            Some(validator) => validator.validate(metadata),
            None => vec![ValidationIssue::synthetic(format!(
                "Schema for model={model} version={version} is not known!"
            ))],
        }
    }

    /// Validate `metadata[section]` in place against `#/properties/<section>`.
    ///
    /// The schema fragment is checked before the metadata, so an unknown
    /// section is reported as unknown even when the metadata lacks it too.
    /// A section that is absent, `null`, `false`, numeric zero or the empty
    /// string counts as missing.
    pub fn validate_section(
        &self,
        metadata: &mut Value,
        model: &str,
        version: &str,
        section: &str,
    ) -> Vec<ValidationIssue> {
        let reference = SchemaRef::section(SchemaKey::new(model, version), section);
        let Some(validator) = self.registry.context().engine().lookup(&reference) else {
            return vec![ValidationIssue::synthetic(format!(
                "Schema for model={model} version={version} subsection={section} is not known!"
            ))];
        };

        match metadata.get_mut(section) {
            Some(value) if !is_blank(value) => validator.validate(value),
            _ => vec![ValidationIssue::synthetic(format!(
                "Subsection {section} not found in provided metadata."
            ))],
        }
    }

    /// Check `metadata` against every catalogued schema, in catalog order.
    ///
    /// Schemas that are catalogued but not installed are skipped. A schema
    /// whose evaluation panics is logged and skipped. `metadata` itself is
    /// never modified.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::CatalogUnavailable`] when the catalog cannot
    /// be read.
    pub async fn find_matching_schemas(
        &self,
        metadata: &Value,
        include_errors: bool,
    ) -> Result<Vec<MatchResult>, RegistryError> {
        let catalog = self.registry.available_schemas().await?;
        let frozen: Arc<Value> = Arc::new(metadata.clone());
        let snapshot = self.registry.context().engine().snapshot();

        let mut results = Vec::with_capacity(catalog.len());
        for key in catalog.keys() {
            let Some(validator) = snapshot.lookup(&SchemaRef::whole(key.clone())) else {
                tracing::debug!(schema = %key, "no validator installed, skipping");
                continue;
            };

            let mut candidate = frozen.as_ref().clone();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| validator.validate(&mut candidate)));
            let issues = match outcome {
                Ok(issues) => issues,
                Err(_) => {
                    tracing::error!(schema = %key, "validator panicked, skipping schema");
                    continue;
                }
            };

            let matches = issues.is_empty();
            results.push(MatchResult {
                name: key.name().to_string(),
                version: key.version().to_string(),
                matches,
                errors: include_errors.then_some(issues),
            });
        }

        tracing::debug!(
            candidates = catalog.len(),
            evaluated = results.len(),
            matched = results.iter().filter(|r| r.matches).count(),
            "matching complete"
        );
        Ok(results)
    }
}

/// Falsy scalars stand in for "not filled in" in form-sourced metadata.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
