#![deny(missing_docs)]
//! # schemata-core -- Foundational Types for Schemata
//!
//! Pure, I/O-free building blocks shared by every other crate in the
//! workspace.
//!
//! ## Key Design Principles
//!
//! 1. **Locations are resolved once.** [`Location`] is computed from a raw
//!    configuration string at startup and is immutable afterwards. Local
//!    trees and GitHub web/raw URLs normalize to a single base path shape.
//!
//! 2. **References are values, not strings.** [`SchemaKey`] identifies a
//!    `(name, version)` pair; [`SchemaRef`] pairs a key with an optional
//!    [`JsonPointer`] into that schema. No ad-hoc `format!("{key}#{ptr}")`
//!    at call sites.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `schemata-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod location;
pub mod reference;

pub use error::ConfigurationError;
pub use location::{resolve_location, Location, DEFAULT_BRANCH};
pub use reference::{JsonPointer, SchemaKey, SchemaRef};
