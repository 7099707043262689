//! Process configuration read from the environment.

use schemata_fetch::config::env_u64;
use schemata_fetch::{ConfigError, FetchConfig};
use schemata_registry::{schema, template, DEFAULT_FETCH_CONCURRENCY};

/// Everything the CLI reads from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `SCHEMA_LOCATION`, unresolved.
    pub schema_location: Option<String>,
    /// `SCHEMA_GITHUB_BRANCH`.
    pub schema_branch: Option<String>,
    /// `TEMPLATES_LOCATION`, unresolved.
    pub templates_location: Option<String>,
    /// `TEMPLATES_GITHUB_BRANCH`.
    pub templates_branch: Option<String>,
    pub fetch: FetchConfig,
    /// `REGISTRY_FETCH_CONCURRENCY`.
    pub fetch_concurrency: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_location: None,
            schema_branch: None,
            templates_location: None,
            templates_branch: None,
            fetch: FetchConfig::default(),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Locations are kept as raw strings; a missing location is only an
    /// error for the commands that need it.
    pub fn from_env() -> Result<Self, ConfigError> {
        let fetch_concurrency = env_u64("REGISTRY_FETCH_CONCURRENCY")?
            .filter(|n| *n > 0)
            .map_or(DEFAULT_FETCH_CONCURRENCY, |n| {
                usize::try_from(n).unwrap_or(usize::MAX)
            });

        Ok(Self {
            schema_location: env_string(schema::LOCATION_ENV),
            schema_branch: env_string(schema::BRANCH_ENV),
            templates_location: env_string(template::LOCATION_ENV),
            templates_branch: env_string(template::BRANCH_ENV),
            fetch: FetchConfig::from_env()?,
            fetch_concurrency,
        })
    }
}

fn env_string(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}
