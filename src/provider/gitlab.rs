//! GitLab adapter (REST API v4).
//!
//! In GitLab a project is both a repository and, through its namespace, a
//! directory in a group hierarchy. A mirror destination is created inside the
//! namespace named by all but the last segment of its path; that namespace
//! must already exist.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::http::ApiClient;
use super::{
    read_credential, MirrorProvider, OwnerFilters, ProviderKind, RemoteLocation,
    RemoteRepository, Visibility,
};
use crate::error::{Error, Result};

const TOKEN_VARIABLE: &str = "GITLAB_TOKEN";
const PER_PAGE: &str = "100";

#[derive(Debug, Deserialize)]
struct Namespace {
    id: u64,
    kind: String,
    full_path: String,
}

#[derive(Debug, Serialize)]
struct CreateProject<'a> {
    name: &'a str,
    description: &'a str,
    merge_requests_enabled: bool,
    visibility: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Project {
    ssh_url_to_repo: String,
    http_url_to_repo: String,
    #[serde(default)]
    default_branch: Option<String>,
    path_with_namespace: String,
}

/// Percent-encodes a project or namespace path for use as an API id.
fn encode_path(path: &str) -> String {
    url::form_urlencoded::byte_serialize(path.as_bytes()).collect()
}

/// Maps a named access level to GitLab's numeric value.
fn access_level(name: &str) -> Option<&'static str> {
    match name {
        "min" => Some("5"),
        "guest" => Some("10"),
        "reporter" => Some("20"),
        "developer" => Some("30"),
        "maintainer" => Some("40"),
        "owner" => Some("50"),
        "unspecified" | "" => None,
        other => {
            warn!("Unknown GitLab access level '{}', not filtering on it", other);
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitLabClient {
    api: ApiClient,
}

impl GitLabClient {
    pub fn new(host: &str, token: String) -> Self {
        Self {
            api: ApiClient::new(
                "gitlab",
                format!("https://{}/api/v4", host),
                "PRIVATE-TOKEN",
                token,
            ),
        }
    }

    /// Reads `GITLAB_TOKEN` and targets `https://{host}/api/v4`.
    pub fn from_env(host: &str) -> Result<Self> {
        let token = read_credential(ProviderKind::GitLab, TOKEN_VARIABLE)?;
        Ok(Self::new(host, token))
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api = self.api.with_api_base(api_base);
        self
    }

    pub fn api_base(&self) -> &str {
        self.api.api_base()
    }

    fn namespace(&self, path: &str, fp: &str) -> Option<Namespace> {
        if path.is_empty() {
            return None;
        }
        match self
            .api
            .get_json::<Namespace>(&format!("/namespaces/{}", encode_path(path)), &[])
        {
            Ok(namespace) => {
                debug!("{}: Getting namespace '{}': {:?}", fp, path, namespace);
                Some(namespace)
            }
            Err(e) => {
                debug!("{}: Getting namespace '{}' failed: {}", fp, path, e);
                None
            }
        }
    }

    fn fetch_pages(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<Project>> {
        let mut projects = Vec::new();
        for page in 1.. {
            let page = page.to_string();
            let mut page_query = query.to_vec();
            page_query.push(("page", page.as_str()));
            page_query.push(("per_page", PER_PAGE));

            let batch: Vec<Project> = self.api.get_json(path, &page_query)?;
            debug!("GitLab page {} of '{}': {} projects", page, path, batch.len());
            if batch.is_empty() {
                break;
            }
            projects.extend(batch);
        }
        Ok(projects)
    }
}

impl MirrorProvider for GitLabClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitLab
    }

    fn repository_exists(&self, location: &RemoteLocation, fp: &str) -> bool {
        debug!(
            "{}: Checking repository '{}' '{}' existence",
            fp, location.host, location.full_path
        );
        match self
            .api
            .probe(&format!("/projects/{}", encode_path(&location.full_path)))
        {
            Ok(()) => true,
            Err(e) => {
                debug!("{}: project '{}' lookup: {}", fp, location.full_path, e);
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
        let namespace_path = location.namespace();
        let namespace =
            self.namespace(namespace_path, fp)
                .ok_or_else(|| Error::NamespaceNotFound {
                    namespace: namespace_path.to_string(),
                })?;

        // Projects of a user namespace are created without a namespace id
        let namespace_id = if namespace.kind == "user" {
            debug!(
                "{}: Creating new gitlab project '{}' for user '{}'",
                fp, location.short_name, namespace.full_path
            );
            None
        } else {
            debug!(
                "{}: Creating new gitlab project '{}' in namespace '{}'",
                fp, location.short_name, namespace.full_path
            );
            Some(namespace.id)
        };

        self.api.post_json(
            "/projects",
            &CreateProject {
                name: &location.short_name,
                description,
                merge_requests_enabled: true,
                visibility: visibility.name(),
                namespace_id,
            },
        )
    }

    fn fetch_owner_repos(
        &self,
        owner: &str,
        filters: &OwnerFilters,
    ) -> Result<Vec<RemoteRepository>> {
        let encoded = encode_path(owner);
        let mut query: Vec<(&str, &str)> = Vec::new();
        if filters.gitlab_owned {
            query.push(("owned", "true"));
        }
        if !filters.gitlab_visibility.is_empty() {
            query.push(("visibility", filters.gitlab_visibility.as_str()));
        }

        let projects = if self.api.probe(&format!("/groups/{}", encoded)).is_ok() {
            query.push(("include_subgroups", "true"));
            if let Some(level) = access_level(&filters.gitlab_min_access_level) {
                query.push(("min_access_level", level));
            }
            self.fetch_pages(&format!("/groups/{}/projects", encoded), &query)?
        } else {
            debug!("'{}' is not a GitLab group, listing user projects", owner);
            self.fetch_pages(&format!("/users/{}/projects", encoded), &query)?
        };

        Ok(projects
            .into_iter()
            .map(|project| RemoteRepository {
                ssh_url: project.ssh_url_to_repo,
                https_url: project.http_url_to_repo,
                default_branch: project.default_branch.unwrap_or_default(),
                path_hint: project.path_with_namespace,
            })
            .collect())
    }
}
