//! # Error Types
//!
//! Configuration errors raised while resolving resource locations. These
//! are fatal at startup and never retried.

use thiserror::Error;

/// Invalid or missing location configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The location value was absent or blank after trimming.
    #[error("{env_name} environment variable is required.")]
    MissingLocation {
        /// Name of the environment variable that should carry the location.
        env_name: String,
    },

    /// A schema key string could not be split into name and version.
    #[error("invalid schema reference '{0}': expected '<name>:<version>'")]
    InvalidReference(String),
}
