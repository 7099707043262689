//! # schemata-registry
//!
//! Registries for versioned JSON-Schema documents and transformation
//! templates, plus the validation service built on them.
//!
//! ## Components
//!
//! - [`SchemaRegistry`] reads `available.json`, retrieves each schema and
//!   installs compiled validators in the shared [`ValidationEngine`].
//! - [`ValidationService`] validates whole documents or single sections and
//!   finds every schema a document satisfies.
//! - [`TemplateRegistry`] retrieves and caches transformation templates.
//!
//! All three are built from one [`RegistryContext`], which carries the
//! [`DocumentSource`](schemata_fetch::DocumentSource), the engine and the
//! bulk-load concurrency limit.
//!
//! ## Usage
//!
//! ```ignore
//! let fetcher = Arc::new(DocumentFetcher::new(&FetchConfig::from_env()?)?);
//! let context = RegistryContext::new(fetcher);
//! let schemas = SchemaRegistry::resolve(context, location.as_deref(), branch.as_deref())?;
//! schemas.load_schemas().await?;
//!
//! let service = ValidationService::new(schemas);
//! let issues = service.validate(&mut metadata, "hdruk", "2.1.2");
//! ```

pub mod catalog;
pub(crate) mod coerce;
pub mod context;
pub mod engine;
pub mod error;
pub mod fanout;
pub mod schema;
pub mod template;
pub mod validate;

pub use catalog::{CatalogEntry, SchemaCatalog, TemplateDescriptor};
pub use context::{RegistryContext, DEFAULT_FETCH_CONCURRENCY};
pub use engine::{
    CompiledSchema, CompiledValidator, EngineOptions, ValidationEngine, ValidationIssue,
    ValidatorSet,
};
pub use error::RegistryError;
pub use fanout::{LoadOutcome, LoadReport, LoadSummary};
pub use schema::SchemaRegistry;
pub use template::TemplateRegistry;
pub use validate::{MatchResult, ValidationService};
