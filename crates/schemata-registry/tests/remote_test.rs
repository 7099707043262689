//! Registries against a mock HTTP host, plus a counting source to pin
//! down cache behavior.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use schemata_core::Location;
use schemata_fetch::{Document, DocumentFetcher, DocumentSource, FetchConfig, FetchError};
use schemata_registry::{RegistryContext, SchemaRegistry, TemplateRegistry, ValidationService};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn remote(base: String) -> Location {
    Location {
        base_path: base,
        load_from_local_file: false,
    }
}

#[tokio::test]
async fn schemas_load_from_remote_host_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/acme/schemas/master/available.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Order": ["1.0.0"]})))
        .expect(1)
        .mount(&mock_server)
        .await;
    // Raw hosts serve JSON as text/plain.
    Mock::given(method("GET"))
        .and(path("/acme/schemas/master/hdr_schemata/models/Order/1.0.0/schema.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain; charset=utf-8")
                .set_body_string(r#"{"type": "object", "required": ["id"]}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = DocumentFetcher::new(&FetchConfig::default()).unwrap();
    let registry = SchemaRegistry::new(
        RegistryContext::new(Arc::new(fetcher)),
        remote(format!("{}/acme/schemas/master", mock_server.uri())),
    );

    registry.load_schemas().await.unwrap();
    registry.load_schemas().await.unwrap();

    let service = ValidationService::new(registry);
    assert!(service.validate(&mut json!({"id": 1}), "Order", "1.0.0").is_empty());
    let results = service.find_matching_schemas(&json!({}), false).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results[0].matches);
}

#[tokio::test]
async fn remote_template_is_fetched_as_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/Hydration/gwdm/1.0/translation.jsonata"))
        .respond_with(ResponseTemplate::new(200).set_body_string("$merge([$, {'form': true}])"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = DocumentFetcher::new(&FetchConfig::default()).unwrap();
    let templates = TemplateRegistry::new(
        RegistryContext::new(Arc::new(fetcher)),
        remote(mock_server.uri()),
    );

    let first = templates.form_hydration_template("gwdm", "1.0").await.unwrap();
    let second = templates.form_hydration_template("gwdm", "1.0").await.unwrap();
    assert_eq!(*first, Value::String("$merge([$, {'form': true}])".into()));
    assert!(Arc::ptr_eq(&first, &second));
}

// ── Counting source ──────────────────────────────────────────────────

/// Serves a fixed catalog and schema set from memory, counting fetches.
#[derive(Default)]
struct CountingSource {
    cache: Mutex<std::collections::HashMap<String, Document>>,
    fetches: AtomicUsize,
}

#[async_trait]
impl DocumentSource for CountingSource {
    fn cache_get(&self, key: &str) -> Option<Document> {
        self.cache.lock().get(key).cloned()
    }

    fn cache_put(&self, key: &str, document: Document) {
        self.cache.lock().insert(key.to_string(), document);
    }

    async fn fetch_remote(&self, uri: &str) -> Result<Document, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let body = match uri {
            "https://host/available.json" => json!({"A": ["1", "2"], "B": ["1"]}),
            u if u.ends_with("/schema.json") => json!({"type": "object"}),
            _ => return Err(FetchError::Status { uri: uri.into(), status: 404 }),
        };
        Ok(Arc::new(body))
    }

    async fn fetch_local(&self, path: &str) -> Result<Document, FetchError> {
        Err(FetchError::Io {
            path: path.into(),
            source: std::io::Error::from(std::io::ErrorKind::Unsupported),
        })
    }
}

#[tokio::test]
async fn cached_documents_are_not_refetched() {
    let source = Arc::new(CountingSource::default());
    let registry = SchemaRegistry::new(
        RegistryContext::new(Arc::clone(&source) as Arc<dyn DocumentSource>).with_fetch_concurrency(1),
        remote("https://host".into()),
    );

    let report = registry.load_schemas().await.unwrap();
    assert_eq!(report.len(), 3);
    assert!(report.is_complete());
    // Catalog plus three schemas.
    assert_eq!(source.fetches.load(Ordering::SeqCst), 4);

    registry.load_schemas().await.unwrap();
    assert_eq!(source.fetches.load(Ordering::SeqCst), 4);

    registry.retrieve_schema("A", "1").await.unwrap();
    assert_eq!(source.fetches.load(Ordering::SeqCst), 4);
}
