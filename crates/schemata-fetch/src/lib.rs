//! # schemata-fetch -- Document retrieval for Schemata
//!
//! Every schema, template and catalog document reaches the registries
//! through the [`DocumentSource`] trait:
//!
//! - `cache_get` / `cache_put` against a shared [`DocumentCache`];
//! - `fetch_remote` / `fetch_local` that bypass the cache;
//! - `cache_get_or_fetch_*` that memoize a fetch under a caller-chosen key.
//!
//! [`DocumentFetcher`] is the production implementation: a `reqwest`
//! client that retries transport errors, `429` and `5xx` per a
//! [`RetryPolicy`], plus `tokio::fs` reads.
//!
//! ## Cache Keys
//!
//! The cache is shared by every registry. Keys are namespaced by caller
//! convention (`schemas:available`, `<name>:<version>`,
//! `hydration:<model>:<version>`, template paths); this crate never
//! interprets them.
//!
//! ## Documents
//!
//! Bodies that parse as JSON are returned as parsed values. Anything else
//! (JSONata templates, malformed JSON) is returned as `Value::String` and
//! left for the caller to interpret.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod retry;
pub mod source;

pub use cache::{CacheStats, DocumentCache};
pub use config::{ConfigError, FetchConfig};
pub use error::FetchError;
pub use fetcher::DocumentFetcher;
pub use retry::RetryPolicy;
pub use source::{Document, DocumentSource, Origin};
