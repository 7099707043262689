//! # Catalogs
//!
//! Each document family publishes an `available.json` at its root:
//!
//! - schemas: an object mapping model name to an ordered version list,
//!   e.g. `{"hdruk": ["2.1.2", "3.0.0"], "gwdm": ["1.0"]}`;
//! - templates: a list of `{input_model, input_version, output_model, output_version}`.
//!
//! Schema catalog order is the order the object was written in. Loading and
//! matching iterate in exactly this order.

use std::fmt;
use std::sync::Arc;

use schemata_core::SchemaKey;
use schemata_fetch::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One model and its published versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Model name.
    pub name: String,
    /// Versions in catalog order.
    pub versions: Vec<String>,
}

/// The parsed schema `available.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaCatalog {
    entries: Vec<CatalogEntry>,
}

impl SchemaCatalog {
    /// Parse a catalog document.
    ///
    /// Requires an object whose values are arrays of strings.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let Value::Object(map) = value else {
            return Err(format!("expected an object of name -> versions, got {}", kind(value)));
        };

        let mut entries = Vec::with_capacity(map.len());
        for (name, versions) in map {
            let Value::Array(versions) = versions else {
                return Err(format!("versions for '{name}' must be an array, got {}", kind(versions)));
            };
            let versions = versions
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| format!("version for '{name}' must be a string, got {}", kind(v)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            entries.push(CatalogEntry {
                name: name.clone(),
                versions,
            });
        }
        Ok(Self { entries })
    }

    /// Models in catalog order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Every `(name, version)` pair, outer loop over names, inner over versions.
    pub fn keys(&self) -> impl Iterator<Item = SchemaKey> + '_ {
        self.entries
            .iter()
            .flat_map(|e| e.versions.iter().map(move |v| SchemaKey::new(&e.name, v)))
    }

    /// Number of `(name, version)` pairs.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.versions.len()).sum()
    }

    /// Whether the catalog lists no pairs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One published transformation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    /// Model the template reads.
    pub input_model: String,
    /// Version of the input model.
    pub input_version: String,
    /// Model the template produces.
    pub output_model: String,
    /// Version of the output model.
    pub output_version: String,
}

impl fmt::Display for TemplateDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{}",
            self.input_model, self.input_version, self.output_model, self.output_version
        )
    }
}

/// Parse a document that arrived as text; pass parsed documents through.
pub(crate) fn parse_if_textual(document: Document) -> Result<Document, serde_json::Error> {
    match document.as_ref() {
        Value::String(text) => serde_json::from_str(text).map(Arc::new),
        _ => Ok(document),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_keeps_document_order() {
        let doc: Value =
            serde_json::from_str(r#"{"zeta": ["2.0", "1.0"], "alpha": ["1.0"]}"#).unwrap();
        let catalog = SchemaCatalog::from_value(&doc).unwrap();
        let keys: Vec<String> = catalog.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["zeta:2.0", "zeta:1.0", "alpha:1.0"]);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn catalog_rejects_non_object() {
        let err = SchemaCatalog::from_value(&json!(["Order"])).unwrap_err();
        assert!(err.contains("array"), "{err}");
    }

    #[test]
    fn catalog_rejects_non_string_version() {
        let err = SchemaCatalog::from_value(&json!({"Order": [1]})).unwrap_err();
        assert!(err.contains("Order"), "{err}");
    }

    #[test]
    fn empty_catalog_is_empty() {
        let catalog = SchemaCatalog::from_value(&json!({"Order": []})).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.entries().len(), 1);
    }

    #[test]
    fn template_descriptor_deserializes_snake_case_fields() {
        let list: Vec<TemplateDescriptor> = serde_json::from_value(json!([{
            "input_model": "hdruk",
            "input_version": "2.1.2",
            "output_model": "gwdm",
            "output_version": "1.0"
        }]))
        .unwrap();
        assert_eq!(list[0].to_string(), "hdruk:2.1.2 -> gwdm:1.0");
    }

    #[test]
    fn textual_documents_are_parsed() {
        let doc = Arc::new(Value::String(r#"{"type": "object"}"#.into()));
        assert_eq!(*parse_if_textual(doc).unwrap(), json!({"type": "object"}));

        let parsed = Arc::new(json!({"type": "object"}));
        let same = parse_if_textual(Arc::clone(&parsed)).unwrap();
        assert!(Arc::ptr_eq(&parsed, &same));

        assert!(parse_if_textual(Arc::new(Value::String("not json".into()))).is_err());
    }
}
