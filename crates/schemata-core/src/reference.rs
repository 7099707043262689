//! # Schema References
//!
//! [`SchemaKey`] names one schema document (`<name>:<version>`). It is both
//! the engine key of the compiled validator and the cache key of the raw
//! document. [`SchemaRef`] addresses either the whole schema or a fragment
//! of it via a [`JsonPointer`], e.g. `Order:1.0.0#/properties/header`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Identifies a schema by model name and version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaKey {
    name: String,
    version: String,
}

impl SchemaKey {
    /// Create a key from a model name and version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// The model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The model version.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

impl FromStr for SchemaKey {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => {
                Ok(Self::new(name, version))
            }
            _ => Err(ConfigurationError::InvalidReference(s.to_string())),
        }
    }
}

/// An RFC 6901 JSON Pointer, always rooted (`""` or starting with `/`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JsonPointer(String);

impl JsonPointer {
    /// Build a pointer from unescaped reference tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pointer = String::new();
        for token in tokens {
            pointer.push('/');
            pointer.push_str(&token.as_ref().replace('~', "~0").replace('/', "~1"));
        }
        Self(pointer)
    }

    /// The escaped pointer string, suitable for [`serde_json::Value::pointer`].
    ///
    /// [`serde_json::Value::pointer`]: https://docs.rs/serde_json/latest/serde_json/enum.Value.html#method.pointer
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this pointer addresses the whole document.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reference to a schema or to a fragment inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaRef {
    /// The schema document the reference points into.
    pub root: SchemaKey,
    /// Fragment within the root; `None` for the whole schema.
    pub pointer: Option<JsonPointer>,
}

impl SchemaRef {
    /// Reference the whole schema.
    pub fn whole(root: SchemaKey) -> Self {
        Self {
            root,
            pointer: None,
        }
    }

    /// Reference the `properties/<section>` fragment of a schema.
    pub fn section(root: SchemaKey, section: &str) -> Self {
        Self {
            root,
            pointer: Some(JsonPointer::from_tokens(["properties", section])),
        }
    }

    /// The pointer to resolve, with `None` and the root pointer unified.
    pub fn fragment(&self) -> Option<&JsonPointer> {
        self.pointer.as_ref().filter(|p| !p.is_root())
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fragment() {
            Some(pointer) => write!(f, "{}#{}", self.root, pointer),
            None => write!(f, "{}", self.root),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_key_display_matches_engine_key() {
        assert_eq!(SchemaKey::new("Order", "1.0.0").to_string(), "Order:1.0.0");
    }

    #[test]
    fn section_reference_displays_compound_form() {
        let r = SchemaRef::section(SchemaKey::new("hdruk", "2.1.2"), "summary");
        assert_eq!(r.to_string(), "hdruk:2.1.2#/properties/summary");
    }

    #[test]
    fn pointer_tokens_are_escaped() {
        let p = JsonPointer::from_tokens(["properties", "a/b~c"]);
        assert_eq!(p.as_str(), "/properties/a~1b~0c");
        let doc = serde_json::json!({"properties": {"a/b~c": {"type": "string"}}});
        assert_eq!(doc.pointer(p.as_str()), Some(&serde_json::json!({"type": "string"})));
    }

    #[test]
    fn root_pointer_means_whole_schema() {
        let r = SchemaRef {
            root: SchemaKey::new("Order", "1.0.0"),
            pointer: Some(JsonPointer::from_tokens(Vec::<&str>::new())),
        };
        assert!(r.fragment().is_none());
        assert_eq!(r.to_string(), "Order:1.0.0");
    }

    #[test]
    fn malformed_references_are_rejected() {
        assert!("Order".parse::<SchemaKey>().is_err());
        assert!(":1.0.0".parse::<SchemaKey>().is_err());
        assert_eq!(
            "Order:1.0.0".parse::<SchemaKey>().unwrap(),
            SchemaKey::new("Order", "1.0.0")
        );
    }
}
