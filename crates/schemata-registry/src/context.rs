//! Shared handles every registry is built on.

use std::fmt;
use std::sync::Arc;

use schemata_fetch::DocumentSource;

use crate::engine::ValidationEngine;

/// Default number of documents fetched concurrently by bulk loads.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// The document source, validation engine and fan-out limit shared by the
/// schema and template registries.
///
/// Cheap to clone; clones share the same cache and validator set.
#[derive(Clone)]
pub struct RegistryContext {
    source: Arc<dyn DocumentSource>,
    engine: Arc<ValidationEngine>,
    fetch_concurrency: usize,
}

impl fmt::Debug for RegistryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryContext")
            .field("engine", &self.engine)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .finish_non_exhaustive()
    }
}

impl RegistryContext {
    /// Create a context with a fresh engine.
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self::with_engine(source, Arc::new(ValidationEngine::new()))
    }

    /// Create a context over an existing engine.
    pub fn with_engine(source: Arc<dyn DocumentSource>, engine: Arc<ValidationEngine>) -> Self {
        Self {
            source,
            engine,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    /// Set the bulk-load fan-out limit. Zero is treated as one.
    pub fn with_fetch_concurrency(mut self, fetch_concurrency: usize) -> Self {
        self.fetch_concurrency = fetch_concurrency.max(1);
        self
    }

    /// The document source every registry fetches through.
    pub fn source(&self) -> &Arc<dyn DocumentSource> {
        &self.source
    }

    /// The shared validation engine.
    pub fn engine(&self) -> &Arc<ValidationEngine> {
        &self.engine
    }

    /// How many documents bulk loads fetch at once.
    pub fn fetch_concurrency(&self) -> usize {
        self.fetch_concurrency
    }
}
