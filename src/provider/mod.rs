//! # Provider Abstraction
//!
//! `git-get` talks to three hosting providers: GitLab, GitHub and Bitbucket.
//! All of them are reached through the [`MirrorProvider`] capability, which
//! covers the three things the rest of the crate needs from a provider:
//!
//! - checking whether a destination repository exists,
//! - creating a destination repository for a mirror,
//! - enumerating an owner's repositories for config generation.
//!
//! The concrete adapter is chosen once, at startup, from the provider tag and
//! the host of the relevant URL ([`Provider::from_env`]). Credentials are read
//! from the environment at that moment, so a missing token fails the run
//! before any job is dispatched and before any network call.

pub mod bitbucket;
pub mod github;
pub mod gitlab;
mod http;

use std::fmt;
use std::str::FromStr;

use log::{debug, info};

use crate::error::{Error, Result};

pub use bitbucket::BitbucketClient;
pub use github::GitHubClient;
pub use gitlab::GitLabClient;

/// Supported hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    GitLab,
    GitHub,
    Bitbucket,
}

impl ProviderKind {
    pub fn all() -> &'static [ProviderKind] {
        &[ProviderKind::GitLab, ProviderKind::GitHub, ProviderKind::Bitbucket]
    }

    /// The tag used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::GitLab => "gitlab",
            ProviderKind::GitHub => "github",
            ProviderKind::Bitbucket => "bitbucket",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ProviderKind::all()
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::UnknownProvider(s.to_string()))
    }
}

/// Visibility of a newly created mirror destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Private,
    Internal,
    Public,
}

impl Visibility {
    pub fn name(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Internal => "internal",
            Visibility::Public => "public",
        }
    }

    /// GitHub and Bitbucket only know public and private repositories.
    pub fn is_private(&self) -> bool {
        !matches!(self, Visibility::Public)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "private" => Ok(Visibility::Private),
            "internal" => Ok(Visibility::Internal),
            "public" => Ok(Visibility::Public),
            other => Err(Error::InvalidVisibility(other.to_string())),
        }
    }
}

/// A repository URL split into the pieces provider APIs are addressed with.
///
/// `git@gitlab.com:acme/infra/tool.git` becomes host `gitlab.com`, full path
/// `acme/infra/tool` and short name `tool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocation {
    pub host: String,
    pub full_path: String,
    pub short_name: String,
}

impl RemoteLocation {
    /// Splits the full path into its first segment (user, organisation or
    /// workspace) and the remainder.
    pub fn owner_and_name(&self) -> Result<(&str, &str)> {
        self.full_path
            .split_once('/')
            .filter(|(owner, name)| !owner.is_empty() && !name.is_empty())
            .ok_or_else(|| Error::InvalidUrl {
                url: format!("{}/{}", self.host, self.full_path),
                message: "expected '<owner>/<repository>'".to_string(),
            })
    }

    /// Full path without the last segment.
    pub fn namespace(&self) -> &str {
        match self.full_path.rfind('/') {
            Some(idx) => &self.full_path[..idx],
            None => "",
        }
    }
}

/// Decomposes an ssh or https git URL.
///
/// A trailing `.git` and a leading `https://` or `git@` are removed and `:`
/// becomes `/`. A URL without any path separator after that has no owner and
/// is rejected.
pub fn decompose_git_url(url: &str) -> Result<RemoteLocation> {
    let trimmed = url.strip_suffix(".git").unwrap_or(url);
    let trimmed = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("git@"))
        .unwrap_or(trimmed);
    let normalized = trimmed.replace(':', "/");

    let (host, full_path) = normalized
        .split_once('/')
        .filter(|(host, path)| !host.is_empty() && !path.is_empty())
        .ok_or_else(|| Error::InvalidUrl {
            url: url.to_string(),
            message: "no owner or repository path".to_string(),
        })?;
    let full_path = full_path.trim_end_matches('/');
    let short_name = full_path.rsplit('/').next().unwrap_or(full_path);

    Ok(RemoteLocation {
        host: host.to_string(),
        full_path: full_path.to_string(),
        short_name: short_name.to_string(),
    })
}

/// A repository reported by a provider's enumeration API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepository {
    pub ssh_url: String,
    pub https_url: String,
    pub default_branch: String,
    /// Provider-side path including the owner, e.g. `acme/infra/tool`.
    pub path_hint: String,
}

/// Provider-specific filters for owner enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerFilters {
    /// GitLab: only projects owned by the authenticated user.
    pub gitlab_owned: bool,
    /// GitLab: `public`, `internal` or `private`; empty means any.
    pub gitlab_visibility: String,
    /// GitLab: `unspecified`, `min`, `guest`, `reporter`, `developer`,
    /// `maintainer` or `owner`.
    pub gitlab_min_access_level: String,
    /// GitHub: `all`, `public` or `private`.
    pub github_visibility: String,
    /// GitHub: comma-separated `owner`, `collaborator`, `organization_member`.
    pub github_affiliation: String,
    /// Bitbucket: `owner`, `admin`, `contributor` or `member`.
    pub bitbucket_role: String,
}

impl Default for OwnerFilters {
    fn default() -> Self {
        Self {
            gitlab_owned: false,
            gitlab_visibility: String::new(),
            gitlab_min_access_level: "unspecified".to_string(),
            github_visibility: "all".to_string(),
            github_affiliation: "owner,collaborator,organization_member".to_string(),
            bitbucket_role: "member".to_string(),
        }
    }
}

/// Description set on every mirror destination created by `git-get`.
pub fn mirror_description(source_url: &str) -> String {
    format!("Mirror of the '{}'", source_url)
}

/// Uniform access to a hosting provider.
///
/// `fp` is the fingerprint of the repository job on whose behalf a call is
/// made; adapters use it to prefix their log lines.
pub trait MirrorProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// True only when the lookup succeeded. Any lookup failure, including
    /// "not found", counts as absent.
    fn repository_exists(&self, location: &RemoteLocation, fp: &str) -> bool;

    /// Creates the destination repository. Failures are fatal for the run.
    fn create_repository(
        &self,
        location: &RemoteLocation,
        visibility: Visibility,
        description: &str,
        fp: &str,
    ) -> Result<()>;

    /// Lists the repositories of `owner` (a user, organisation, workspace or
    /// GitLab group path).
    fn fetch_owner_repos(&self, owner: &str, filters: &OwnerFilters)
        -> Result<Vec<RemoteRepository>>;

    /// Creates the mirror destination unless it already exists.
    fn ensure_mirror_exists(
        &self,
        mirror_url: &str,
        source_url: &str,
        visibility: Visibility,
        fp: &str,
    ) -> Result<()> {
        let location = decompose_git_url(mirror_url)?;
        debug!(
            "{}: For Check: host: {} full path: {} short name: {}",
            fp, location.host, location.full_path, location.short_name
        );
        if self.repository_exists(&location, fp) {
            debug!("{}: {} repository '{}' exists", fp, self.kind(), mirror_url);
            return Ok(());
        }

        info!("{}: Creating new {} repository '{}'", fp, self.kind(), mirror_url);
        self.create_repository(&location, visibility, &mirror_description(source_url), fp)
    }
}

/// The adapter selected for a run.
#[derive(Debug)]
pub enum Provider {
    GitLab(GitLabClient),
    GitHub(GitHubClient),
    Bitbucket(BitbucketClient),
}

impl Provider {
    /// Builds the adapter for `kind` against `host`, reading its credentials
    /// from the environment.
    ///
    /// `bitbucket_project` is the optional project name new Bitbucket mirrors
    /// are attached to.
    pub fn from_env(
        kind: ProviderKind,
        host: &str,
        bitbucket_project: Option<String>,
    ) -> Result<Self> {
        let provider = match kind {
            ProviderKind::GitLab => Provider::GitLab(GitLabClient::from_env(host)?),
            ProviderKind::GitHub => Provider::GitHub(GitHubClient::from_env(host)?),
            ProviderKind::Bitbucket => {
                Provider::Bitbucket(BitbucketClient::from_env()?.with_project(bitbucket_project))
            }
        };
        debug!("Using {} provider for host '{}'", kind, host);
        Ok(provider)
    }

    fn inner(&self) -> &dyn MirrorProvider {
        match self {
            Provider::GitLab(client) => client,
            Provider::GitHub(client) => client,
            Provider::Bitbucket(client) => client,
        }
    }
}

impl MirrorProvider for Provider {
    fn kind(&self) -> ProviderKind {
        self.inner().kind()
    }

    fn repository_exists(&self, location: &RemoteLocation, fp: &str) -> bool {
        self.inner().repository_exists(location, fp)
    }

    fn create_repository(
        &self,
        location: &RemoteLocation,
        visibility: Visibility,
        description: &str,
        fp: &str,
    ) -> Result<()> {
        self.inner()
            .create_repository(location, visibility, description, fp)
    }

    fn fetch_owner_repos(
        &self,
        owner: &str,
        filters: &OwnerFilters,
    ) -> Result<Vec<RemoteRepository>> {
        self.inner().fetch_owner_repos(owner, filters)
    }
}

pub(crate) fn read_credential(provider: ProviderKind, variable: &'static str) -> Result<String> {
    std::env::var(variable).map_err(|_| Error::MissingCredential {
        provider: provider.name(),
        variable,
    })
}
