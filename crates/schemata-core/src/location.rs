//! # Resource Location Resolution
//!
//! Normalizes a configured location string into the base path every schema
//! or template document is fetched relative to, plus the load mode.
//!
//! Accepted shapes:
//!
//! - a local filesystem tree (`./schemata`, `/srv/hdr/`): loaded from disk;
//! - a GitHub web URL (`https://github.com/<owner>/<repo>[/tree|blob/<branch>][/<path>]`);
//! - a raw-content URL (`https://raw.githubusercontent.com/<owner>/<repo>/<branch>[/<path>]`);
//! - any other HTTP(S) URL, used verbatim.
//!
//! GitHub URLs are rewritten to
//! `https://raw.githubusercontent.com/<owner>/<repo>/<branch>[/<path>]`.
//!
//! The two GitHub hosts disagree on what a bare path segment after the
//! repository means. On `github.com` without a `tree`/`blob` specifier the
//! whole remainder is a sub-path under the fallback branch; on the raw host
//! the first remaining segment is the branch. Both behaviors are kept as
//! observed.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigurationError;

/// Branch used when neither the URL nor the override names one.
pub const DEFAULT_BRANCH: &str = "master";

const GITHUB_WEB_HOST: &str = "github.com";
const GITHUB_RAW_HOST: &str = "raw.githubusercontent.com";

/// A resolved resource location for one document family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Base path without a trailing slash.
    pub base_path: String,
    /// `true` when `base_path` is a filesystem path rather than a URL.
    pub load_from_local_file: bool,
}

impl Location {
    /// Join a relative path onto the base path.
    pub fn child(&self, relative: &str) -> String {
        format!("{}/{}", self.base_path, relative.trim_start_matches('/'))
    }
}

/// Resolve a configured location string.
///
/// `env_name` only appears in the error message. `branch_override` replaces
/// [`DEFAULT_BRANCH`] as the fallback branch when it is non-blank.
///
/// # Errors
///
/// Returns [`ConfigurationError::MissingLocation`] when `value` is absent or
/// blank after trimming.
pub fn resolve_location(
    value: Option<&str>,
    env_name: &str,
    branch_override: Option<&str>,
) -> Result<Location, ConfigurationError> {
    let sanitised = value.and_then(sanitise).ok_or_else(|| {
        ConfigurationError::MissingLocation {
            env_name: env_name.to_string(),
        }
    })?;

    if !sanitised.starts_with("http") {
        return Ok(Location {
            base_path: sanitised.to_string(),
            load_from_local_file: true,
        });
    }

    let fallback_branch = branch_override
        .and_then(sanitise)
        .unwrap_or(DEFAULT_BRANCH);

    // Unparseable URLs pass through; the first fetch surfaces the problem.
    let base_path = match Url::parse(sanitised) {
        Ok(url) => match url.host_str() {
            Some(GITHUB_WEB_HOST) => {
                normalise_github(&url, fallback_branch, BareSegment::SubPath)
            }
            Some(GITHUB_RAW_HOST) => {
                normalise_github(&url, fallback_branch, BareSegment::Branch)
            }
            _ => sanitised.to_string(),
        },
        Err(_) => sanitised.to_string(),
    };

    Ok(Location {
        base_path,
        load_from_local_file: false,
    })
}

/// Trim whitespace and trailing slashes; `None` when nothing is left.
fn sanitise(value: &str) -> Option<&str> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// How a path segment after `<owner>/<repo>` is read when there is no
/// `tree`/`blob` specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BareSegment {
    /// Everything is a sub-path under the fallback branch (`github.com`).
    SubPath,
    /// The first segment is the branch (`raw.githubusercontent.com`).
    Branch,
}

fn normalise_github(url: &Url, fallback_branch: &str, bare: BareSegment) -> String {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let [owner, repo, rest @ ..] = segments.as_slice() else {
        return url.as_str().trim_end_matches('/').to_string();
    };

    match rest {
        [] => raw_github_url(owner, repo, fallback_branch, &[]),
        ["tree" | "blob", remaining @ ..] => match remaining {
            [branch, path @ ..] => raw_github_url(owner, repo, branch, path),
            [] => raw_github_url(owner, repo, fallback_branch, &[]),
        },
        [first, path @ ..] => match bare {
            BareSegment::SubPath => raw_github_url(owner, repo, fallback_branch, rest),
            BareSegment::Branch => raw_github_url(owner, repo, first, path),
        },
    }
}

fn raw_github_url(owner: &str, repo: &str, branch: &str, path: &[&str]) -> String {
    let base = format!("https://{GITHUB_RAW_HOST}/{owner}/{repo}/{branch}");
    if path.is_empty() {
        base
    } else {
        format!("{base}/{}", path.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn resolve(value: &str, branch: Option<&str>) -> Location {
        resolve_location(Some(value), "SCHEMA_LOCATION", branch).unwrap()
    }

    #[test]
    fn local_path_is_loaded_from_disk() {
        let loc = resolve("  ./schemata///  ", None);
        assert_eq!(loc.base_path, "./schemata");
        assert!(loc.load_from_local_file);
    }

    #[test]
    fn missing_value_is_a_configuration_error() {
        let err = resolve_location(None, "SCHEMA_LOCATION", None).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingLocation {
                env_name: "SCHEMA_LOCATION".into()
            }
        );
        assert_eq!(err.to_string(), "SCHEMA_LOCATION environment variable is required.");
    }

    #[test]
    fn blank_and_slash_only_values_are_rejected() {
        assert!(resolve_location(Some("   "), "X", None).is_err());
        assert!(resolve_location(Some("///"), "X", None).is_err());
    }

    #[test]
    fn web_url_with_tree_specifier() {
        let loc = resolve("https://github.com/acme/schemas/tree/dev/hdr_schemata", None);
        assert_eq!(
            loc.base_path,
            "https://raw.githubusercontent.com/acme/schemas/dev/hdr_schemata"
        );
        assert!(!loc.load_from_local_file);
    }

    #[test]
    fn web_url_with_blob_specifier_and_no_branch_uses_fallback() {
        let loc = resolve("https://github.com/acme/schemas/blob/", Some("main"));
        assert_eq!(loc.base_path, "https://raw.githubusercontent.com/acme/schemas/main");
    }

    #[test]
    fn web_url_repo_root_uses_branch_override() {
        let loc = resolve("https://github.com/acme/schemas", Some("release"));
        assert_eq!(loc.base_path, "https://raw.githubusercontent.com/acme/schemas/release");
    }

    #[test]
    fn web_url_repo_root_without_override_uses_default_branch() {
        let loc = resolve("https://github.com/acme/schemas/", Some("  "));
        assert_eq!(loc.base_path, "https://raw.githubusercontent.com/acme/schemas/master");
    }

    #[test]
    fn web_url_bare_path_is_sub_path_of_fallback_branch() {
        let loc = resolve("https://github.com/acme/schemas/dev/hdr_schemata", None);
        assert_eq!(
            loc.base_path,
            "https://raw.githubusercontent.com/acme/schemas/master/dev/hdr_schemata"
        );
    }

    #[test]
    fn raw_url_bare_path_starts_with_branch() {
        let loc = resolve(
            "https://raw.githubusercontent.com/acme/schemas/dev/hdr_schemata/",
            Some("release"),
        );
        assert_eq!(
            loc.base_path,
            "https://raw.githubusercontent.com/acme/schemas/dev/hdr_schemata"
        );
    }

    #[test]
    fn raw_url_with_tree_specifier() {
        let loc = resolve("https://raw.githubusercontent.com/acme/schemas/tree/v2/docs", None);
        assert_eq!(loc.base_path, "https://raw.githubusercontent.com/acme/schemas/v2/docs");
    }

    #[test]
    fn raw_url_repo_root_uses_fallback_branch() {
        let loc = resolve("https://raw.githubusercontent.com/acme/schemas", None);
        assert_eq!(loc.base_path, "https://raw.githubusercontent.com/acme/schemas/master");
    }

    #[test]
    fn github_url_with_owner_only_is_returned_verbatim() {
        let loc = resolve("https://github.com/acme", None);
        assert_eq!(loc.base_path, "https://github.com/acme");
        assert!(!loc.load_from_local_file);
    }

    #[test]
    fn other_hosts_are_returned_unchanged() {
        let loc = resolve("https://schemas.example.org/hdr/", None);
        assert_eq!(loc.base_path, "https://schemas.example.org/hdr");
        assert!(!loc.load_from_local_file);
    }

    #[test]
    fn unparseable_url_falls_back_to_raw_string() {
        let loc = resolve("http://[::1", None);
        assert_eq!(loc.base_path, "http://[::1");
        assert!(!loc.load_from_local_file);
    }

    #[test]
    fn child_joins_without_double_slash() {
        let loc = resolve("/srv/schemata", None);
        assert_eq!(loc.child("available.json"), "/srv/schemata/available.json");
        assert_eq!(loc.child("/available.json"), "/srv/schemata/available.json");
    }

    proptest! {
        #[test]
        fn local_paths_never_keep_trailing_slashes(
            path in "[a-z][a-z0-9_./-]{0,30}",
            slashes in 0usize..5,
        ) {
            prop_assume!(!path.starts_with("http"));
            prop_assume!(!path.trim_end_matches('/').is_empty());
            let raw = format!("{path}{}", "/".repeat(slashes));
            let loc = resolve_location(Some(&raw), "SCHEMA_LOCATION", None).unwrap();
            prop_assert!(loc.load_from_local_file);
            prop_assert!(!loc.base_path.ends_with('/'));
        }

        #[test]
        fn github_urls_always_resolve_to_raw_host(
            owner in "[a-z]{1,10}",
            repo in "[a-z]{1,10}",
            branch in "[a-z]{1,8}",
        ) {
            let raw = format!("https://github.com/{owner}/{repo}/tree/{branch}");
            let loc = resolve_location(Some(&raw), "SCHEMA_LOCATION", None).unwrap();
            prop_assert_eq!(
                loc.base_path,
                format!("https://raw.githubusercontent.com/{owner}/{repo}/{branch}")
            );
        }
    }
}
