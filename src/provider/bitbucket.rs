//! Bitbucket Cloud adapter (REST API 2.0).
//!
//! Repositories live in workspaces and may optionally be attached to a
//! project, addressed by a key derived from the project name.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::debug;
use serde::{Deserialize, Serialize};

use super::http::ApiClient;
use super::{
    read_credential, MirrorProvider, OwnerFilters, ProviderKind, RemoteLocation,
    RemoteRepository, Visibility,
};
use crate::error::Result;

const USERNAME_VARIABLE: &str = "BITBUCKET_USERNAME";
const TOKEN_VARIABLE: &str = "BITBUCKET_TOKEN";
const API_BASE: &str = "https://api.bitbucket.org/2.0";
const PAGE_LEN: &str = "100";

#[derive(Debug, Serialize)]
struct ProjectRef {
    key: String,
}

#[derive(Debug, Serialize)]
struct CreateRepository<'a> {
    scm: &'a str,
    is_private: bool,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<ProjectRef>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    values: Vec<Repository>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    full_name: String,
    #[serde(default)]
    mainbranch: Option<Branch>,
    links: Links,
}

#[derive(Debug, Deserialize)]
struct Branch {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Links {
    #[serde(default)]
    clone: Vec<CloneLink>,
}

#[derive(Debug, Deserialize)]
struct CloneLink {
    name: String,
    href: String,
}

impl Repository {
    fn clone_url(&self, scheme: &str) -> String {
        self.links
            .clone
            .iter()
            .find(|link| link.name == scheme)
            .map(|link| link.href.clone())
            .unwrap_or_default()
    }
}

/// Derives a project key from a project name: every character outside
/// `[A-Za-z0-9_]` is dropped and the rest upper-cased.
pub fn project_key(project_name: &str) -> String {
    project_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_uppercase()
}

#[derive(Debug, Clone)]
pub struct BitbucketClient {
    api: ApiClient,
    project: Option<String>,
}

impl BitbucketClient {
    pub fn new(username: &str, token: &str) -> Self {
        let credentials = STANDARD.encode(format!("{}:{}", username, token));
        Self {
            api: ApiClient::new(
                "bitbucket",
                API_BASE,
                "Authorization",
                format!("Basic {}", credentials),
            ),
            project: None,
        }
    }

    /// Reads `BITBUCKET_USERNAME` and `BITBUCKET_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let username = read_credential(ProviderKind::Bitbucket, USERNAME_VARIABLE)?;
        let token = read_credential(ProviderKind::Bitbucket, TOKEN_VARIABLE)?;
        Ok(Self::new(&username, &token))
    }

    /// Project name new repositories are attached to, when it exists.
    pub fn with_project(mut self, project: Option<String>) -> Self {
        self.project = project.filter(|name| !name.is_empty());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api = self.api.with_api_base(api_base);
        self
    }

    pub fn api_base(&self) -> &str {
        self.api.api_base()
    }

    fn project_exists(&self, workspace: &str, key: &str, fp: &str) -> bool {
        match self
            .api
            .probe(&format!("/workspaces/{}/projects/{}", workspace, key))
        {
            Ok(()) => true,
            Err(e) => {
                debug!(
                    "{}: Error fetching project '{}' in workspace '{}': {}",
                    fp, key, workspace, e
                );
                false
            }
        }
    }
}

impl MirrorProvider for BitbucketClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bitbucket
    }

    fn repository_exists(&self, location: &RemoteLocation, fp: &str) -> bool {
        let (workspace, slug) = match location.owner_and_name() {
            Ok(parts) => parts,
            Err(e) => {
                debug!("{}: {}", fp, e);
                return false;
            }
        };
        match self
            .api
            .probe(&format!("/repositories/{}/{}", workspace, slug))
        {
            Ok(()) => true,
            Err(e) => {
                debug!(
                    "{}: Error fetching repository '{}/{}': {}",
                    fp, workspace, slug, e
                );
                false
            }
        }
    }

    fn create_repository(
        &self,
        location: &RemoteLocation,
        visibility: Visibility,
        description: &str,
        fp: &str,
    ) -> Result<()> {
        let (workspace, slug) = location.owner_and_name()?;
        let project = self
            .project
            .as_deref()
            .map(project_key)
            .filter(|key| self.project_exists(workspace, key, fp))
            .map(|key| ProjectRef { key });

        let payload = CreateRepository {
            scm: "git",
            is_private: visibility.is_private(),
            description,
            project,
        };
        debug!("{}: Creating repository with parameters: '{:?}'", fp, payload);
        self.api
            .post_json(&format!("/repositories/{}/{}", workspace, slug), &payload)
    }

    fn fetch_owner_repos(
        &self,
        owner: &str,
        filters: &OwnerFilters,
    ) -> Result<Vec<RemoteRepository>> {
        let mut page: Page = self.api.get_json(
            &format!("/repositories/{}", owner),
            &[
                ("role", filters.bitbucket_role.as_str()),
                ("pagelen", PAGE_LEN),
            ],
        )?;
        let mut repositories = std::mem::take(&mut page.values);
        while let Some(next) = page.next.take() {
            page = self.api.get_json_url(&next)?;
            repositories.append(&mut page.values);
        }
        debug!("Bitbucket '{}': {} repositories", owner, repositories.len());

        Ok(repositories
            .into_iter()
            .map(|repository| RemoteRepository {
                ssh_url: repository.clone_url("ssh"),
                https_url: repository.clone_url("https"),
                default_branch: repository
                    .mainbranch
                    .as_ref()
                    .map(|branch| branch.name.clone())
                    .unwrap_or_default(),
                path_hint: repository.full_name,
            })
            .collect())
    }
}
