//! # Validation Engine
//!
//! Holds the compiled validator for every loaded schema and hands them out
//! by [`SchemaRef`].
//!
//! ## Snapshots
//!
//! The validator set is an immutable [`ValidatorSet`] behind an `Arc`.
//! Readers take a snapshot (an `Arc` clone) and work against it without
//! holding any lock. [`ValidationEngine::install`] builds the next set from
//! the current one plus the newly compiled schemas and swaps it in under a
//! single write lock. A reader therefore sees either the old or the new
//! validator for a key, never a partially replaced one, and keys absent
//! from an install keep their previous validator.
//!
//! ## Fragments
//!
//! Sub-schemas (`Order:1.0.0#/properties/header`) are compiled lazily the
//! first time they are looked up and memoized on the owning schema. They
//! compile as `{"$ref": "<schema uri>#<pointer>"}` with the root document
//! served by an in-memory retriever, so `$ref`s inside the fragment resolve
//! against the whole schema.
//!
//! ## Coercion
//!
//! [`CompiledValidator::validate`] rewrites the instance in place (type
//! coercion, default filling) before evaluating it; see [`crate::coerce`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use schemata_core::{JsonPointer, SchemaKey, SchemaRef};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::coerce::{self, Coercion};
use crate::error::RegistryError;

/// Base URI compiled schemas are registered under.
const ENGINE_URI_BASE: &str = "https://schemata.invalid/models/";

// ---------------------------------------------------------------------------
// Validation issues
// ---------------------------------------------------------------------------

/// A single validation failure with structured context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// JSON Pointer to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer within the schema that triggered the failure.
    pub schema_path: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    /// An issue not tied to any location, e.g. "schema is not known".
    pub fn synthetic(message: impl Into<String>) -> Self {
        Self {
            instance_path: String::new(),
            schema_path: String::new(),
            message: message.into(),
        }
    }
}

impl From<jsonschema::ValidationError<'_>> for ValidationIssue {
    fn from(err: jsonschema::ValidationError<'_>) -> Self {
        Self {
            instance_path: err.instance_path.to_string(),
            schema_path: err.schema_path.to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Engine behavior, fixed for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Convert scalars to the schema's declared type before evaluating.
    pub coerce_types: bool,
    /// Fill absent properties from their schema `default`.
    pub use_defaults: bool,
    /// Treat `format` as an assertion.
    pub validate_formats: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            coerce_types: true,
            use_defaults: true,
            validate_formats: true,
        }
    }
}

impl EngineOptions {
    fn coercion(&self) -> Coercion {
        Coercion {
            coerce_types: self.coerce_types,
            use_defaults: self.use_defaults,
        }
    }
}

// ---------------------------------------------------------------------------
// Retriever for $ref resolution
// ---------------------------------------------------------------------------

/// Serves the one root document a validator was compiled from.
///
/// Any other URI is an error: schemas are evaluated offline and a `$ref`
/// to an unknown document must fail compilation rather than reach the
/// network.
struct RootRetriever {
    uri: String,
    document: Arc<Value>,
}

impl jsonschema::Retrieve for RootRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        if uri_str == self.uri {
            Ok(self.document.as_ref().clone())
        } else {
            Err(format!("external reference not available: {uri_str}").into())
        }
    }
}

// ---------------------------------------------------------------------------
// Compiled validators
// ---------------------------------------------------------------------------

/// A callable validator for a schema or one of its fragments.
pub struct CompiledValidator {
    reference: SchemaRef,
    root: Arc<Value>,
    validator: jsonschema::Validator,
    options: EngineOptions,
}

impl fmt::Debug for CompiledValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledValidator")
            .field("reference", &self.reference.to_string())
            .field("options", &self.options)
            .finish()
    }
}

impl CompiledValidator {
    /// What this validator checks against.
    pub fn reference(&self) -> &SchemaRef {
        &self.reference
    }

    /// Coerce `instance` in place, then evaluate it.
    ///
    /// Returns every violation; an empty list means the instance is valid.
    /// The caller must treat `instance` as modified on return.
    pub fn validate(&self, instance: &mut Value) -> Vec<ValidationIssue> {
        self.prepare(instance);
        self.validator
            .iter_errors(instance)
            .map(ValidationIssue::from)
            .collect()
    }

    /// Coerce `instance` in place, then report only whether it is valid.
    pub fn is_valid(&self, instance: &mut Value) -> bool {
        self.prepare(instance);
        self.validator.is_valid(instance)
    }

    fn prepare(&self, instance: &mut Value) {
        let schema = match self.reference.fragment() {
            Some(pointer) => self.root.pointer(pointer.as_str()),
            None => Some(self.root.as_ref()),
        };
        if let Some(schema) = schema {
            coerce::apply(&self.root, schema, instance, self.options.coercion());
        }
    }
}

/// A loaded schema: its document, root validator and memoized fragments.
pub struct CompiledSchema {
    key: SchemaKey,
    uri: String,
    document: Arc<Value>,
    root: Arc<CompiledValidator>,
    fragments: Mutex<HashMap<JsonPointer, Option<Arc<CompiledValidator>>>>,
    options: EngineOptions,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("key", &self.key.to_string())
            .field("uri", &self.uri)
            .field("fragments", &self.fragments.lock().len())
            .finish()
    }
}

impl CompiledSchema {
    /// The schema key.
    pub fn key(&self) -> &SchemaKey {
        &self.key
    }

    /// The whole-schema validator.
    pub fn root(&self) -> Arc<CompiledValidator> {
        Arc::clone(&self.root)
    }

    /// The validator for a fragment, compiling it on first use.
    ///
    /// Returns `None` when the pointer does not resolve inside the document
    /// or the fragment fails to compile.
    pub fn fragment(&self, pointer: &JsonPointer) -> Option<Arc<CompiledValidator>> {
        if pointer.is_root() {
            return Some(self.root());
        }

        let mut fragments = self.fragments.lock();
        if let Some(cached) = fragments.get(pointer) {
            return cached.clone();
        }

        let compiled = self.compile_fragment(pointer);
        fragments.insert(pointer.clone(), compiled.clone());
        compiled
    }

    fn compile_fragment(&self, pointer: &JsonPointer) -> Option<Arc<CompiledValidator>> {
        self.document.pointer(pointer.as_str())?;

        let wrapper = json!({ "$ref": format!("{}#{}", self.uri, encode_fragment(pointer.as_str())) });
        match build_validator(&wrapper, &self.uri, &self.document, &self.options) {
            Ok(validator) => Some(Arc::new(CompiledValidator {
                reference: SchemaRef {
                    root: self.key.clone(),
                    pointer: Some(pointer.clone()),
                },
                root: Arc::clone(&self.document),
                validator,
                options: self.options,
            })),
            Err(reason) => {
                tracing::warn!(
                    schema = %self.key,
                    pointer = %pointer,
                    %reason,
                    "failed to compile schema fragment"
                );
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Validator sets and the engine
// ---------------------------------------------------------------------------

/// An immutable set of compiled schemas.
#[derive(Debug, Default)]
pub struct ValidatorSet {
    schemas: HashMap<SchemaKey, Arc<CompiledSchema>>,
    generation: u64,
}

impl ValidatorSet {
    /// Find the validator a reference points at.
    pub fn lookup(&self, reference: &SchemaRef) -> Option<Arc<CompiledValidator>> {
        let schema = self.schemas.get(&reference.root)?;
        match reference.fragment() {
            Some(pointer) => schema.fragment(pointer),
            None => Some(schema.root()),
        }
    }

    /// Number of installed schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether no schema is installed.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// How many installs produced this set.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The shared, hot-reloadable validator store.
#[derive(Debug, Default)]
pub struct ValidationEngine {
    current: RwLock<Arc<ValidatorSet>>,
    options: EngineOptions,
}

impl ValidationEngine {
    /// Create an empty engine with default options.
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Create an empty engine.
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            current: RwLock::new(Arc::new(ValidatorSet::default())),
            options,
        }
    }

    /// The options every validator is compiled with.
    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Compile a schema document without installing it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Compile`] when the document is not a valid
    /// schema or references a document other than itself.
    pub fn compile(
        &self,
        key: SchemaKey,
        document: Arc<Value>,
    ) -> Result<CompiledSchema, RegistryError> {
        let uri = schema_uri(&key);
        let validator = build_validator(&document, &uri, &document, &self.options).map_err(
            |reason| RegistryError::Compile {
                key: key.to_string(),
                reason,
            },
        )?;

        let root = Arc::new(CompiledValidator {
            reference: SchemaRef::whole(key.clone()),
            root: Arc::clone(&document),
            validator,
            options: self.options,
        });

        Ok(CompiledSchema {
            key,
            uri,
            document,
            root,
            fragments: Mutex::new(HashMap::new()),
            options: self.options,
        })
    }

    /// Swap in a new set: the current one with `compiled` added or replaced.
    ///
    /// Keys not in `compiled` keep their current validator. Returns the new
    /// snapshot.
    pub fn install<I>(&self, compiled: I) -> Arc<ValidatorSet>
    where
        I: IntoIterator<Item = CompiledSchema>,
    {
        let mut current = self.current.write();
        let mut schemas = current.schemas.clone();
        for schema in compiled {
            schemas.insert(schema.key.clone(), Arc::new(schema));
        }
        let next = Arc::new(ValidatorSet {
            schemas,
            generation: current.generation + 1,
        });
        *current = Arc::clone(&next);
        next
    }

    /// The current validator set.
    pub fn snapshot(&self) -> Arc<ValidatorSet> {
        Arc::clone(&self.current.read())
    }

    /// Find a validator in the current set.
    pub fn lookup(&self, reference: &SchemaRef) -> Option<Arc<CompiledValidator>> {
        self.snapshot().lookup(reference)
    }
}

fn build_validator(
    schema: &Value,
    uri: &str,
    root: &Arc<Value>,
    options: &EngineOptions,
) -> Result<jsonschema::Validator, String> {
    let retriever = RootRetriever {
        uri: uri.to_string(),
        document: Arc::clone(root),
    };
    let mut opts = jsonschema::options();
    opts.should_validate_formats(options.validate_formats);
    opts.with_retriever(retriever);
    opts.build(schema).map_err(|e| e.to_string())
}

fn schema_uri(key: &SchemaKey) -> String {
    format!(
        "{ENGINE_URI_BASE}{}/{}/schema.json",
        encode_component(key.name(), false),
        encode_component(key.version(), false)
    )
}

fn encode_fragment(pointer: &str) -> String {
    encode_component(pointer, true)
}

/// Percent-encode everything outside the URI unreserved set (plus `/` when
/// `keep_slash`).
fn encode_component(raw: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(char::from(byte));
            }
            b'/' if keep_slash => out.push('/'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
