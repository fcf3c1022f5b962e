//! # Repository List Configuration
//!
//! This module defines [`RepositorySpec`], the record describing one declared
//! repository, and the loading and writing of `Gitfile`-style YAML files.
//!
//! A configuration file is an ordered YAML sequence of records:
//!
//! ```yaml
//! - url: git@github.com:acme/service.git
//!   path: services
//!   altname: service-main
//!   ref: main
//!   symlinks:
//!     - links/service
//! ```
//!
//! Only `url` is required. Multiple configuration files are concatenated in
//! argument order; a missing configuration file is fatal. Ignore files share
//! the same record shape (only `url` matters) and are tolerated when missing.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One declared repository, as read from a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySpec {
    /// Remote clone URL (ssh or https form).
    pub url: String,
    /// Destination directory relative to the working directory; empty means
    /// the working directory itself.
    #[serde(rename = "path", default, skip_serializing_if = "String::is_empty")]
    pub local_path: String,
    /// Overrides the repository name derived from `url`.
    #[serde(rename = "altname", default, skip_serializing_if = "String::is_empty")]
    pub alt_name: String,
    /// Branch or tag to track; empty means the configured trunk branch.
    #[serde(rename = "ref", default, skip_serializing_if = "String::is_empty")]
    pub r#ref: String,
    /// Symlink locations that should point at the repository's full path.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symlinks: Vec<String>,
}

impl RepositorySpec {
    /// Creates a spec with only a URL set.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Parses the content of one configuration file.
///
/// Empty documents are an empty list.
pub fn parse(yaml_content: &str, origin: &Path) -> Result<Vec<RepositorySpec>> {
    if yaml_content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(yaml_content).map_err(|e| Error::ConfigParse {
        path: origin.display().to_string(),
        message: e.to_string(),
    })
}

/// Loads and concatenates configuration files in order.
///
/// Every file must exist.
pub fn load_repositories(paths: &[PathBuf]) -> Result<Vec<RepositorySpec>> {
    let mut repositories = Vec::new();
    for path in paths {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        let mut parsed = parse(&content, path)?;
        debug!("{}: {} repositories declared", path.display(), parsed.len());
        repositories.append(&mut parsed);
    }
    Ok(repositories)
}

/// Loads and concatenates ignore files in order.
///
/// Missing files are skipped with a warning.
pub fn load_ignore_entries(paths: &[PathBuf]) -> Result<Vec<RepositorySpec>> {
    let mut entries = Vec::new();
    for path in paths {
        if !path.exists() {
            warn!("Ignore file {} not found, ignoring nothing from it", path.display());
            continue;
        }
        let content = fs::read_to_string(path)?;
        let mut parsed = parse(&content, path)?;
        debug!("{}: {} repositories ignored", path.display(), parsed.len());
        entries.append(&mut parsed);
    }
    Ok(entries)
}

/// Serializes repositories into configuration file YAML.
pub fn to_yaml(repositories: &[RepositorySpec]) -> Result<String> {
    Ok(serde_yaml::to_string(repositories)?)
}

/// Writes repositories to `path`, replacing any existing file.
pub fn write_repositories(path: &Path, repositories: &[RepositorySpec]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, to_yaml(repositories)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FULL_RECORD: &str = r#"
- url: git@github.com:acme/service.git
  path: services
  altname: service-main
  ref: main
  symlinks:
    - links/service
    - other/service
- url: https://gitlab.com/acme/tools.git
"#;

    #[test]
    fn test_parse_all_fields() {
        let repos = parse(FULL_RECORD, Path::new("Gitfile")).unwrap();
        assert_eq!(repos.len(), 2);

        let first = &repos[0];
        assert_eq!(first.url, "git@github.com:acme/service.git");
        assert_eq!(first.local_path, "services");
        assert_eq!(first.alt_name, "service-main");
        assert_eq!(first.r#ref, "main");
        assert_eq!(first.symlinks, vec!["links/service", "other/service"]);

        let second = &repos[1];
        assert_eq!(second.url, "https://gitlab.com/acme/tools.git");
        assert!(second.local_path.is_empty());
        assert!(second.r#ref.is_empty());
        assert!(second.symlinks.is_empty());
    }

    #[test]
    fn test_parse_requires_url() {
        let err = parse("- path: services\n", Path::new("Gitfile")).unwrap_err();
        match err {
            Error::ConfigParse { path, message } => {
                assert_eq!(path, "Gitfile");
                assert!(message.contains("url"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse("", Path::new("Gitfile")).unwrap().is_empty());
        assert!(parse("\n  \n", Path::new("Gitfile")).unwrap().is_empty());
        assert!(parse("[]", Path::new("Gitfile")).unwrap().is_empty());
    }

    #[test]
    fn test_load_repositories_concatenates_in_order() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("Gitfile");
        let second = temp.path().join("Gitfile.extra");
        fs::write(&first, "- url: git@host:a/one.git\n- url: git@host:a/two.git\n").unwrap();
        fs::write(&second, "- url: git@host:b/three.git\n").unwrap();

        let repos = load_repositories(&[first, second]).unwrap();
        let urls: Vec<&str> = repos.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["git@host:a/one.git", "git@host:a/two.git", "git@host:b/three.git"]
        );
    }

    #[test]
    fn test_load_repositories_missing_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("Gitfile");
        let err = load_repositories(&[missing]).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_ignore_entries_tolerates_missing_file() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("Gitfile.ignore");
        fs::write(&present, "- url: git@host:a/one.git\n").unwrap();
        let missing = temp.path().join("missing.ignore");

        let entries = load_ignore_entries(&[missing, present]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "git@host:a/one.git");
    }

    #[test]
    fn test_to_yaml_omits_empty_fields() {
        let mut spec = RepositorySpec::new("git@host:a/one.git");
        spec.r#ref = "main".to_string();
        let yaml = to_yaml(&[spec]).unwrap();
        assert!(yaml.contains("url: git@host:a/one.git"));
        assert!(yaml.contains("ref: main"));
        assert!(!yaml.contains("path"));
        assert!(!yaml.contains("altname"));
        assert!(!yaml.contains("symlinks"));
    }

    #[test]
    fn test_write_repositories_round_trips_through_loader() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("generated").join("Gitfile");
        let mut spec = RepositorySpec::new("git@host:a/one.git");
        spec.local_path = "clones/a".to_string();

        write_repositories(&path, std::slice::from_ref(&spec)).unwrap();
        let loaded = load_repositories(&[path]).unwrap();
        assert_eq!(loaded, vec![spec]);
    }
}
