//! # Config Generation
//!
//! Builds a repository list from everything an owner (user, organisation,
//! workspace or GitLab group) has on a provider, in the same record shape the
//! `get` and `mirror` commands read.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::{debug, info, warn};

use crate::config::{self, RepositorySpec};
use crate::error::Result;
use crate::ignore::IgnoreSet;
use crate::provider::{MirrorProvider, OwnerFilters, RemoteRepository};

/// Which clone URL of an enumerated repository goes into the config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CloneScheme {
    #[default]
    Ssh,
    Https,
}

impl fmt::Display for CloneScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloneScheme::Ssh => f.write_str("ssh"),
            CloneScheme::Https => f.write_str("https"),
        }
    }
}

impl FromStr for CloneScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ssh" => Ok(CloneScheme::Ssh),
            "https" => Ok(CloneScheme::Https),
            other => Err(format!("unknown clone scheme '{}'", other)),
        }
    }
}

impl CloneScheme {
    fn pick<'a>(&self, repository: &'a RemoteRepository) -> &'a str {
        match self {
            CloneScheme::Ssh => &repository.ssh_url,
            CloneScheme::Https => &repository.https_url,
        }
    }
}

/// Directories of `path_hint` between `owner` and the repository name.
///
/// `("acme/kube", "acme/kube/infra/tool")` gives `"infra"`. When the hint
/// does not start with the owner, its first segment is treated as the owner.
pub fn hint_directories(owner: &str, path_hint: &str) -> String {
    let owner = owner.trim_matches('/');
    let below_owner = match path_hint.get(..owner.len()) {
        Some(prefix)
            if !owner.is_empty()
                && prefix.eq_ignore_ascii_case(owner)
                && path_hint[owner.len()..].starts_with('/') =>
        {
            &path_hint[owner.len() + 1..]
        }
        _ => path_hint.split_once('/').map(|(_, rest)| rest).unwrap_or(""),
    };
    match below_owner.rfind('/') {
        Some(idx) => below_owner[..idx].to_string(),
        None => String::new(),
    }
}

fn join_path(target_clone_path: &str, directories: &str) -> String {
    match (target_clone_path.is_empty(), directories.is_empty()) {
        (true, _) => directories.to_string(),
        (false, true) => target_clone_path.to_string(),
        (false, false) => format!("{}/{}", target_clone_path.trim_end_matches('/'), directories),
    }
}

/// Enumerates `owner` on the provider and maps every repository that is not
/// ignored (by either clone URL) to a spec. The result is sorted by URL.
pub fn generate(
    provider: &dyn MirrorProvider,
    owner: &str,
    filters: &OwnerFilters,
    scheme: CloneScheme,
    target_clone_path: &str,
    ignore: &IgnoreSet,
) -> Result<Vec<RepositorySpec>> {
    let remote = provider.fetch_owner_repos(owner, filters)?;
    info!(
        "Fetched {} repositories of '{}' from {}",
        remote.len(),
        owner,
        provider.kind()
    );

    let mut specs: Vec<RepositorySpec> = remote
        .iter()
        .filter(|repository| {
            let ignored = ignore.should_ignore(&repository.ssh_url)
                || ignore.should_ignore(&repository.https_url);
            if ignored {
                debug!("Ignoring '{}'", repository.path_hint);
            }
            !ignored
        })
        .map(|repository| RepositorySpec {
            url: scheme.pick(repository).to_string(),
            local_path: join_path(
                target_clone_path,
                &hint_directories(owner, &repository.path_hint),
            ),
            r#ref: repository.default_branch.clone(),
            ..RepositorySpec::default()
        })
        .collect();

    specs.sort_by(|a, b| a.url.cmp(&b.url));
    Ok(specs)
}

/// Writes generated specs to `path`. Nothing is written for an empty list.
///
/// Returns whether a file was written.
pub fn write_config(path: &Path, specs: &[RepositorySpec]) -> Result<bool> {
    if specs.is_empty() {
        warn!(
            "No repositories found, not writing configuration file {}",
            path.display()
        );
        return Ok(false);
    }
    config::write_repositories(path, specs)?;
    info!("Wrote {} repositories to {}", specs.len(), path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderKind, RemoteLocation, Visibility};
    use tempfile::TempDir;

    struct ListingProvider {
        repositories: Vec<RemoteRepository>,
    }

    impl MirrorProvider for ListingProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::GitLab
        }

        fn repository_exists(&self, _location: &RemoteLocation, _fp: &str) -> bool {
            false
        }

        fn create_repository(
            &self,
            _location: &RemoteLocation,
            _visibility: Visibility,
            _description: &str,
            _fp: &str,
        ) -> Result<()> {
            Ok(())
        }

        fn fetch_owner_repos(
            &self,
            _owner: &str,
            _filters: &OwnerFilters,
        ) -> Result<Vec<RemoteRepository>> {
            Ok(self.repositories.clone())
        }
    }

    fn remote(path: &str, branch: &str) -> RemoteRepository {
        RemoteRepository {
            ssh_url: format!("git@gitlab.com:{}.git", path),
            https_url: format!("https://gitlab.com/{}.git", path),
            default_branch: branch.to_string(),
            path_hint: path.to_string(),
        }
    }

    fn provider() -> ListingProvider {
        ListingProvider {
            repositories: vec![
                remote("acme/kube/zeta", "main"),
                remote("acme/kube/infra/tool", "develop"),
                remote("acme/kube/alpha", "master"),
            ],
        }
    }

    #[test]
    fn test_hint_directories() {
        assert_eq!(hint_directories("acme", "acme/service"), "");
        assert_eq!(hint_directories("acme/kube", "acme/kube/infra/tool"), "infra");
        assert_eq!(hint_directories("acme", "acme/a/b/c"), "a/b");
        assert_eq!(hint_directories("Acme", "acme/a/c"), "a");
        assert_eq!(hint_directories("other", "acme/a/c"), "a");
        assert_eq!(hint_directories("acme", "acme-two/x"), "");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", ""), "");
        assert_eq!(join_path("misc", ""), "misc");
        assert_eq!(join_path("", "infra"), "infra");
        assert_eq!(join_path("misc/", "infra"), "misc/infra");
    }

    #[test]
    fn test_generate_maps_and_sorts() {
        let specs = generate(
            &provider(),
            "acme/kube",
            &OwnerFilters::default(),
            CloneScheme::Ssh,
            "misc",
            &IgnoreSet::default(),
        )
        .unwrap();

        let urls: Vec<&str> = specs.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "git@gitlab.com:acme/kube/alpha.git",
                "git@gitlab.com:acme/kube/infra/tool.git",
                "git@gitlab.com:acme/kube/zeta.git",
            ]
        );
        assert_eq!(specs[1].local_path, "misc/infra");
        assert_eq!(specs[1].r#ref, "develop");
        assert_eq!(specs[0].local_path, "misc");
    }

    #[test]
    fn test_generate_https_scheme_and_ignore_by_either_url() {
        let ignore = IgnoreSet::from_urls([
            "git@gitlab.com:acme/kube/zeta.git",
            "https://gitlab.com/acme/kube/alpha.git",
        ]);
        let specs = generate(
            &provider(),
            "acme/kube",
            &OwnerFilters::default(),
            CloneScheme::Https,
            "",
            &ignore,
        )
        .unwrap();

        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].url, "https://gitlab.com/acme/kube/infra/tool.git");
        assert_eq!(specs[0].local_path, "infra");
    }

    #[test]
    fn test_write_config_skips_empty_result() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Gitfile");
        assert!(!write_config(&path, &[]).unwrap());
        assert!(!path.exists());

        let specs = vec![RepositorySpec::new("git@host:a/b.git")];
        assert!(write_config(&path, &specs).unwrap());
        assert_eq!(config::load_repositories(&[path]).unwrap(), specs);
    }

    #[test]
    fn test_clone_scheme_from_str() {
        assert_eq!("https".parse::<CloneScheme>().unwrap(), CloneScheme::Https);
        assert!("ftp".parse::<CloneScheme>().is_err());
    }
}
