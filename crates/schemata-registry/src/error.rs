//! # Registry Errors
//!
//! Retrieval failures are surfaced to the immediate caller: without the
//! catalog, schema or template there is nothing useful to return. Failed
//! validation is never an error; it is a non-empty issue list.

use schemata_core::ConfigurationError;
use thiserror::Error;

/// Errors returned by the schema and template registries.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// `available.json` could not be fetched or understood.
    #[error("failed to fetch catalog {path}: {reason}")]
    CatalogUnavailable {
        /// Path or URI of the catalog document.
        path: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// A schema document could not be fetched or parsed.
    #[error("schema not found: {path}: {reason}")]
    SchemaNotFound {
        /// Path or URI the schema was expected at.
        path: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// A hydration form schema could not be fetched or parsed.
    #[error("hydration schema not found: {path}: {reason}")]
    HydrationSchemaNotFound {
        /// Path or URI the schema was expected at.
        path: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// A template document could not be fetched.
    #[error("template not found: {path}: {reason}")]
    TemplateNotFound {
        /// Path or URI the template was expected at.
        path: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// A fetched schema could not be compiled into a validator.
    #[error("failed to compile schema {key}: {reason}")]
    Compile {
        /// The schema key, `<name>:<version>`.
        key: String,
        /// Compiler message.
        reason: String,
    },

    /// Invalid location configuration.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
