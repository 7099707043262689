//! # Schema Registry
//!
//! Reads the schema catalog, retrieves schema documents and installs their
//! compiled validators in the shared [`ValidationEngine`].
//!
//! Layout under the resolved base path:
//!
//! ```text
//! available.json
//! hdr_schemata/models/<name>/<version>/schema.json
//! docs/<model>/<version>.form.json        (hydration form schemas)
//! ```
//!
//! Every retrieval is cache-first. Cache keys are `schemas:available`,
//! `<name>:<version>` and `hydration:<model>:<version>`.
//!
//! [`ValidationEngine`]: crate::engine::ValidationEngine

use std::sync::Arc;

use schemata_core::{resolve_location, Location, SchemaKey, SchemaRef};
use schemata_fetch::{Document, Origin};

use crate::catalog::{parse_if_textual, SchemaCatalog};
use crate::context::RegistryContext;
use crate::engine::{CompiledSchema, CompiledValidator};
use crate::error::RegistryError;
use crate::fanout::{fan_out, LoadOutcome, LoadReport};

/// Cache key of the schema catalog.
pub const CATALOG_KEY: &str = "schemas:available";

/// Environment variable naming the schema location.
pub const LOCATION_ENV: &str = "SCHEMA_LOCATION";

/// Environment variable overriding the fallback branch.
pub const BRANCH_ENV: &str = "SCHEMA_GITHUB_BRANCH";

/// Schema documents and validators for one resolved location.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    context: RegistryContext,
    location: Location,
}

impl SchemaRegistry {
    /// Create a registry over an already resolved location.
    pub fn new(context: RegistryContext, location: Location) -> Self {
        Self { context, location }
    }

    /// Resolve `location` (the value of [`LOCATION_ENV`]) and create a registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Configuration`] when `location` is absent or blank.
    pub fn resolve(
        context: RegistryContext,
        location: Option<&str>,
        branch: Option<&str>,
    ) -> Result<Self, RegistryError> {
        let location = resolve_location(location, LOCATION_ENV, branch)?;
        Ok(Self::new(context, location))
    }

    /// The resolved schema location.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The shared handles this registry was built from.
    pub fn context(&self) -> &RegistryContext {
        &self.context
    }

    /// Where the catalog is read from.
    pub fn catalog_path(&self) -> String {
        self.location.child("available.json")
    }

    /// Where a schema document is read from.
    pub fn schema_path(&self, key: &SchemaKey) -> String {
        self.location.child(&format!(
            "hdr_schemata/models/{}/{}/schema.json",
            key.name(),
            key.version()
        ))
    }

    /// Where a hydration form schema is read from.
    pub fn hydration_schema_path(&self, model: &str, version: &str) -> String {
        self.location
            .child(&format!("docs/{model}/{version}.form.json"))
    }

    fn origin(&self) -> Origin {
        Origin::of(&self.location)
    }

    /// The schema catalog.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::CatalogUnavailable`] when the catalog cannot
    /// be fetched, is not JSON, or is not an object of version lists.
    pub async fn available_schemas(&self) -> Result<SchemaCatalog, RegistryError> {
        let path = self.catalog_path();
        let unavailable = |reason: String| RegistryError::CatalogUnavailable {
            path: path.clone(),
            reason,
        };

        let document = self
            .context
            .source()
            .cache_get_or_fetch(self.origin(), CATALOG_KEY, &path)
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let document = self.reparse(CATALOG_KEY, document).map_err(|e| unavailable(e.to_string()))?;
        let catalog = SchemaCatalog::from_value(&document).map_err(unavailable)?;

        tracing::info!(
            path = %path,
            models = catalog.entries().len(),
            schemas = catalog.len(),
            "schema catalog available"
        );
        Ok(catalog)
    }

    /// The raw document of one schema.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SchemaNotFound`] when the document cannot be
    /// fetched or is not JSON.
    pub async fn retrieve_schema(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Document, RegistryError> {
        let key = SchemaKey::new(name, version);
        let path = self.schema_path(&key);
        self.retrieve(&key.to_string(), &path)
            .await
            .map_err(|reason| RegistryError::SchemaNotFound { path, reason })
    }

    /// The raw document of one hydration form schema.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::HydrationSchemaNotFound`] when the document
    /// cannot be fetched or is not JSON.
    pub async fn retrieve_hydration_schema(
        &self,
        model: &str,
        version: &str,
    ) -> Result<Document, RegistryError> {
        let path = self.hydration_schema_path(model, version);
        self.retrieve(&format!("hydration:{model}:{version}"), &path)
            .await
            .map_err(|reason| RegistryError::HydrationSchemaNotFound { path, reason })
    }

    async fn retrieve(&self, key: &str, path: &str) -> Result<Document, String> {
        let document = self
            .context
            .source()
            .cache_get_or_fetch(self.origin(), key, path)
            .await
            .map_err(|e| e.to_string())?;
        self.reparse(key, document).map_err(|e| e.to_string())
    }

    /// Parse a textual document and replace the cached text with the parsed form.
    fn reparse(&self, key: &str, document: Document) -> Result<Document, serde_json::Error> {
        let was_text = document.is_string();
        let parsed = parse_if_textual(document)?;
        if was_text {
            self.context.source().cache_put(key, Arc::clone(&parsed));
        }
        Ok(parsed)
    }

    /// Retrieve and compile every catalogued schema, then install them.
    ///
    /// Per-schema failures are logged and reported; they do not stop the
    /// others. Schemas that fail keep whatever validator they had before, and
    /// schemas no longer in the catalog stay installed.
    ///
    /// # Errors
    ///
    /// Only a catalog failure is returned as an error.
    pub async fn load_schemas(&self) -> Result<LoadReport<SchemaKey>, RegistryError> {
        let catalog = self.available_schemas().await?;
        let engine = Arc::clone(self.context.engine());

        let results = fan_out(catalog.keys(), self.context.fetch_concurrency(), |key| {
            let engine = Arc::clone(&engine);
            async move {
                let document = self.retrieve_schema(key.name(), key.version()).await?;
                engine.compile(key, document)
            }
        })
        .await;

        let mut compiled: Vec<CompiledSchema> = Vec::new();
        let mut outcomes = Vec::with_capacity(results.len());
        for (key, result) in results {
            let result = match result {
                Ok(schema) => {
                    compiled.push(schema);
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(schema = %key, error = %e, "failed to load schema");
                    Err(e)
                }
            };
            outcomes.push(LoadOutcome { item: key, result });
        }

        let snapshot = engine.install(compiled);
        let report = LoadReport { outcomes };
        let summary = report.summary();
        tracing::info!(
            attempted = summary.attempted,
            loaded = summary.loaded,
            failed = summary.failed,
            installed = snapshot.len(),
            generation = snapshot.generation(),
            "schemas loaded"
        );
        Ok(report)
    }

    /// The installed validator for a schema, if any.
    pub fn lookup(&self, name: &str, version: &str) -> Option<Arc<CompiledValidator>> {
        self.context
            .engine()
            .lookup(&SchemaRef::whole(SchemaKey::new(name, version)))
    }
}
