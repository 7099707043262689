//! Production [`DocumentSource`]: HTTP via `reqwest`, disk via `tokio::fs`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::DocumentCache;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::retry::{get_with_retry, RetryPolicy};
use crate::source::{decode_body, Document, DocumentSource};

/// Fetches documents and memoizes them in a shared [`DocumentCache`].
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    http: reqwest::Client,
    cache: DocumentCache,
    retry: RetryPolicy,
}

impl DocumentFetcher {
    /// Create a fetcher with a fresh cache built from `config`.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Self::with_cache(config, DocumentCache::with_ttl(config.cache_ttl))
    }

    /// Create a fetcher over an existing cache.
    pub fn with_cache(config: &FetchConfig, cache: DocumentCache) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Http {
                uri: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            cache,
            retry: config.retry,
        })
    }

    /// The cache this fetcher writes to.
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }
}

#[async_trait]
impl DocumentSource for DocumentFetcher {
    fn cache_get(&self, key: &str) -> Option<Document> {
        self.cache.get(key)
    }

    fn cache_put(&self, key: &str, document: Document) {
        self.cache.put(key, document);
    }

    async fn fetch_remote(&self, uri: &str) -> Result<Document, FetchError> {
        tracing::debug!(%uri, "fetching remote document");

        let resp = get_with_retry(&self.http, uri, self.retry).await?;
        let body = resp.text().await.map_err(|e| FetchError::Http {
            uri: uri.into(),
            source: e,
        })?;
        Ok(Arc::new(decode_body(body)))
    }

    async fn fetch_local(&self, path: &str) -> Result<Document, FetchError> {
        tracing::debug!(%path, "reading local document");

        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FetchError::Io {
                path: path.into(),
                source: e,
            })?;
        Ok(Arc::new(decode_body(body)))
    }
}
