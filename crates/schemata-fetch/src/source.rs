//! The retrieval contract the registries consume.

use std::sync::Arc;

use async_trait::async_trait;
use schemata_core::Location;
use serde_json::Value;

use crate::error::FetchError;

/// A fetched document. Shared because the cache and every reader hold it.
pub type Document = Arc<Value>;

/// Where a document family is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Filesystem paths.
    LocalFile,
    /// HTTP(S) URIs.
    Remote,
}

impl Origin {
    /// The origin a resolved location implies.
    pub fn of(location: &Location) -> Self {
        if location.load_from_local_file {
            Self::LocalFile
        } else {
            Self::Remote
        }
    }
}

/// Cache-aware document retrieval.
///
/// Implementors supply the four primitives; the memoizing variants are
/// provided in terms of them.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Look up a cached document.
    fn cache_get(&self, key: &str) -> Option<Document>;

    /// Store a document under `key`, replacing any previous entry.
    fn cache_put(&self, key: &str, document: Document);

    /// Fetch a document over HTTP without touching the cache.
    async fn fetch_remote(&self, uri: &str) -> Result<Document, FetchError>;

    /// Read a document from disk without touching the cache.
    async fn fetch_local(&self, path: &str) -> Result<Document, FetchError>;

    /// Return the cached document for `key`, else fetch `uri` and cache it.
    async fn cache_get_or_fetch_remote(&self, key: &str, uri: &str) -> Result<Document, FetchError> {
        if let Some(document) = self.cache_get(key) {
            return Ok(document);
        }
        let document = self.fetch_remote(uri).await?;
        self.cache_put(key, Arc::clone(&document));
        Ok(document)
    }

    /// Return the cached document for `key`, else read `path` and cache it.
    async fn cache_get_or_fetch_local(&self, key: &str, path: &str) -> Result<Document, FetchError> {
        if let Some(document) = self.cache_get(key) {
            return Ok(document);
        }
        let document = self.fetch_local(path).await?;
        self.cache_put(key, Arc::clone(&document));
        Ok(document)
    }

    /// Fetch from `origin` without touching the cache.
    async fn fetch(&self, origin: Origin, path: &str) -> Result<Document, FetchError> {
        match origin {
            Origin::LocalFile => self.fetch_local(path).await,
            Origin::Remote => self.fetch_remote(path).await,
        }
    }

    /// Memoizing fetch from `origin`.
    async fn cache_get_or_fetch(
        &self,
        origin: Origin,
        key: &str,
        path: &str,
    ) -> Result<Document, FetchError> {
        match origin {
            Origin::LocalFile => self.cache_get_or_fetch_local(key, path).await,
            Origin::Remote => self.cache_get_or_fetch_remote(key, path).await,
        }
    }
}

/// Interpret a fetched body: JSON when it parses, raw text otherwise.
pub(crate) fn decode_body(body: String) -> Value {
    match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) => Value::String(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_bodies_are_parsed() {
        assert_eq!(decode_body(r#"{"Order": ["1.0.0"]}"#.into()), json!({"Order": ["1.0.0"]}));
    }

    #[test]
    fn non_json_bodies_stay_textual() {
        let body = "$merge([summary, {'title': name}])".to_string();
        assert_eq!(decode_body(body.clone()), Value::String(body));
    }

    #[test]
    fn origin_follows_location_mode() {
        let local = Location {
            base_path: "./schemata".into(),
            load_from_local_file: true,
        };
        let remote = Location {
            base_path: "https://example.org".into(),
            load_from_local_file: false,
        };
        assert_eq!(Origin::of(&local), Origin::LocalFile);
        assert_eq!(Origin::of(&remote), Origin::Remote);
    }
}
