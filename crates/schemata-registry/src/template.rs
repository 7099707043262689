//! # Template Registry
//!
//! Transformation templates are opaque payloads (JSONata text) stored under:
//!
//! ```text
//! available.json
//! maps/<out_model>/<out_version>/<in_model>/<in_version>/translation.jsonata
//! maps/Hydration/<out_model>/<out_version>/translation.jsonata
//! ```
//!
//! Unlike schemas, a template is cached under its fetch path.

use schemata_core::{resolve_location, Location};
use schemata_fetch::{Document, Origin};

use crate::catalog::{parse_if_textual, TemplateDescriptor};
use crate::context::RegistryContext;
use crate::error::RegistryError;
use crate::fanout::{fan_out, LoadOutcome, LoadReport};

/// Cache key of the template catalog.
pub const CATALOG_KEY: &str = "templates:available";

/// Environment variable naming the template location.
pub const LOCATION_ENV: &str = "TEMPLATES_LOCATION";

/// Environment variable overriding the fallback branch.
pub const BRANCH_ENV: &str = "TEMPLATES_GITHUB_BRANCH";

const TEMPLATE_FILE: &str = "translation.jsonata";
const HYDRATION_MODEL: &str = "Hydration";

/// Template documents for one resolved location.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    context: RegistryContext,
    location: Location,
}

impl TemplateRegistry {
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

    /// The resolved template location.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Where the catalog is read from.
    pub fn catalog_path(&self) -> String {
        self.location.child("available.json")
    }

    /// Where the template for a transformation is read from.
    pub fn template_path(&self, descriptor: &TemplateDescriptor) -> String {
        self.location.child(&format!(
            "maps/{}/{}/{}/{}/{TEMPLATE_FILE}",
            descriptor.output_model,
            descriptor.output_version,
            descriptor.input_model,
            descriptor.input_version
        ))
    }

    /// Where the hydration template for an output model is read from.
    pub fn hydration_template_path(&self, output_model: &str, output_version: &str) -> String {
        self.location.child(&format!(
            "maps/{HYDRATION_MODEL}/{output_model}/{output_version}/{TEMPLATE_FILE}"
        ))
    }

    fn origin(&self) -> Origin {
        Origin::of(&self.location)
    }

    /// The published transformations.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::CatalogUnavailable`] when the catalog cannot
    /// be fetched or is not a list of descriptors.
    pub async fn available_templates(&self) -> Result<Vec<TemplateDescriptor>, RegistryError> {
        let path = self.catalog_path();
        let unavailable = |reason: String| RegistryError::CatalogUnavailable {
            path: path.clone(),
            reason,
        };

        let source = self.context.source();
        let document = source
            .cache_get_or_fetch(self.origin(), CATALOG_KEY, &path)
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let document = parse_if_textual(document).map_err(|e| unavailable(e.to_string()))?;
        let descriptors: Vec<TemplateDescriptor> =
            serde_json::from_value(document.as_ref().clone()).map_err(|e| unavailable(e.to_string()))?;

        tracing::info!(path = %path, templates = descriptors.len(), "template catalog available");
        Ok(descriptors)
    }

    /// The template translating `input` metadata to `output`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::TemplateNotFound`] when it cannot be fetched.
    pub async fn template(
        &self,
        input_model: &str,
        input_version: &str,
        output_model: &str,
        output_version: &str,
    ) -> Result<Document, RegistryError> {
        let descriptor = TemplateDescriptor {
            input_model: input_model.to_string(),
            input_version: input_version.to_string(),
            output_model: output_model.to_string(),
            output_version: output_version.to_string(),
        };
        self.cached(self.template_path(&descriptor)).await
    }

    /// The template hydrating a form for `output`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::TemplateNotFound`] when it cannot be fetched.
    pub async fn form_hydration_template(
        &self,
        output_model: &str,
        output_version: &str,
    ) -> Result<Document, RegistryError> {
        self.cached(self.hydration_template_path(output_model, output_version))
            .await
    }

    async fn cached(&self, path: String) -> Result<Document, RegistryError> {
        self.context
            .source()
            .cache_get_or_fetch(self.origin(), &path, &path)
            .await
            .map_err(|e| RegistryError::TemplateNotFound {
                path: path.clone(),
                reason: e.to_string(),
            })
    }

    /// Fetch a template bypassing the cache, then overwrite its cache entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::TemplateNotFound`] when it cannot be fetched;
    /// the cache is left untouched.
    pub async fn retrieve_template(
        &self,
        descriptor: &TemplateDescriptor,
    ) -> Result<Document, RegistryError> {
        let path = self.template_path(descriptor);
        let source = self.context.source();
        let document = source
            .fetch(self.origin(), &path)
            .await
            .map_err(|e| RegistryError::TemplateNotFound {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        source.cache_put(&path, Document::clone(&document));
        Ok(document)
    }

    /// Refresh every catalogued template.
    ///
    /// # Errors
    ///
    /// Only a catalog failure is returned as an error; per-template failures
    /// are logged and reported.
    pub async fn load_templates(&self) -> Result<LoadReport<TemplateDescriptor>, RegistryError> {
        let descriptors = self.available_templates().await?;

        let results = fan_out(descriptors, self.context.fetch_concurrency(), |descriptor| async move {
            self.retrieve_template(&descriptor).await.map(drop)
        })
        .await;

        let outcomes: Vec<LoadOutcome<TemplateDescriptor>> = results
            .into_iter()
            .map(|(item, result)| {
                if let Err(e) = &result {
                    tracing::warn!(template = %item, error = %e, "failed to load template");
                }
                LoadOutcome { item, result }
            })
            .collect();

        let report = LoadReport { outcomes };
        let summary = report.summary();
        tracing::info!(
            attempted = summary.attempted,
            loaded = summary.loaded,
            failed = summary.failed,
            "templates loaded"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use schemata_fetch::{DocumentCache, DocumentFetcher, DocumentSource, FetchConfig};
    use serde_json::{json, Value};

    fn descriptor() -> TemplateDescriptor {
        TemplateDescriptor {
            input_model: "hdruk".into(),
            input_version: "2.1.2".into(),
            output_model: "gwdm".into(),
            output_version: "1.0".into(),
        }
    }

    fn registry(base: &std::path::Path) -> (TemplateRegistry, Arc<DocumentFetcher>) {
        let fetcher =
            Arc::new(DocumentFetcher::with_cache(&FetchConfig::default(), DocumentCache::new()).unwrap());
        let context = RegistryContext::new(fetcher.clone());
        let location = Location {
            base_path: base.to_str().unwrap().to_string(),
            load_from_local_file: true,
        };
        (TemplateRegistry::new(context, location), fetcher)
    }

    fn write(base: &std::path::Path, relative: &str, body: &str) {
        let file = base.join(relative);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, body).unwrap();
    }

    #[test]
    fn paths_put_output_before_input() {
        let location = Location {
            base_path: "https://raw.githubusercontent.com/acme/maps/master".into(),
            load_from_local_file: false,
        };
        let fetcher = Arc::new(DocumentFetcher::new(&FetchConfig::default()).unwrap());
        let reg = TemplateRegistry::new(RegistryContext::new(fetcher), location);
        assert_eq!(
            reg.template_path(&descriptor()),
            "https://raw.githubusercontent.com/acme/maps/master/maps/gwdm/1.0/hdruk/2.1.2/translation.jsonata"
        );
        assert_eq!(
            reg.hydration_template_path("gwdm", "1.0"),
            "https://raw.githubusercontent.com/acme/maps/master/maps/Hydration/gwdm/1.0/translation.jsonata"
        );
    }

    #[tokio::test]
    async fn template_is_cached_under_its_path() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "maps/gwdm/1.0/hdruk/2.1.2/translation.jsonata", "{ 'title': summary.title }");
        let (reg, fetcher) = registry(dir.path());

        let doc = reg.template("hdruk", "2.1.2", "gwdm", "1.0").await.unwrap();
        assert_eq!(*doc, Value::String("{ 'title': summary.title }".into()));
        let path = reg.template_path(&descriptor());
        assert!(fetcher.cache_get(&path).is_some());
    }

    #[tokio::test]
    async fn retrieve_template_refreshes_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let relative = "maps/gwdm/1.0/hdruk/2.1.2/translation.jsonata";
        write(dir.path(), relative, "old");
        let (reg, _) = registry(dir.path());

        reg.template("hdruk", "2.1.2", "gwdm", "1.0").await.unwrap();
        write(dir.path(), relative, "new");
        let cached = reg.template("hdruk", "2.1.2", "gwdm", "1.0").await.unwrap();
        assert_eq!(*cached, json!("old"));

        let fresh = reg.retrieve_template(&descriptor()).await.unwrap();
        assert_eq!(*fresh, json!("new"));
        let cached = reg.template("hdruk", "2.1.2", "gwdm", "1.0").await.unwrap();
        assert_eq!(*cached, json!("new"));
    }

    #[tokio::test]
    async fn missing_hydration_template_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (reg, _) = registry(dir.path());
        let err = reg.form_hydration_template("gwdm", "1.0").await.unwrap_err();
        match err {
            RegistryError::TemplateNotFound { path, .. } => {
                assert!(path.ends_with("maps/Hydration/gwdm/1.0/translation.jsonata"))
            }
            other => panic!("expected TemplateNotFound, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn load_templates_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "available.json",
            r#"[
                {"input_model": "hdruk", "input_version": "2.1.2", "output_model": "gwdm", "output_version": "1.0"},
                {"input_model": "gwdm", "input_version": "1.0", "output_model": "hdruk", "output_version": "2.1.2"}
            ]"#,
        );
        write(dir.path(), "maps/gwdm/1.0/hdruk/2.1.2/translation.jsonata", "$");
        let (reg, _) = registry(dir.path());

        let report = reg.load_templates().await.unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report.succeeded().collect::<Vec<_>>(), [&descriptor()]);
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn malformed_catalog_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "available.json", r#"{"hdruk": ["2.1.2"]}"#);
        let (reg, _) = registry(dir.path());
        assert!(matches!(
            reg.available_templates().await.unwrap_err(),
            RegistryError::CatalogUnavailable { .. }
        ));
    }
}
