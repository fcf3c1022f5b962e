//! GitHub adapter (REST API v3).

use log::debug;
use serde::{Deserialize, Serialize};

use super::http::ApiClient;
use super::{
    read_credential, MirrorProvider, OwnerFilters, ProviderKind, RemoteLocation,
    RemoteRepository, Visibility,
};
use crate::error::Result;

const TOKEN_VARIABLE: &str = "GITHUB_TOKEN";
const PUBLIC_HOST: &str = "github.com";
const PUBLIC_API_BASE: &str = "https://api.github.com";
const PER_PAGE: usize = 100;

#[derive(Debug, Serialize)]
struct CreateRepository<'a> {
    name: &'a str,
    private: bool,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Repository {
    ssh_url: String,
    clone_url: String,
    #[serde(default)]
    default_branch: Option<String>,
    full_name: String,
    owner: Owner,
}

/// API base for a GitHub host: the public API for github.com, the Enterprise
/// path otherwise.
pub fn api_base_for_host(host: &str) -> String {
    if host == PUBLIC_HOST {
        PUBLIC_API_BASE.to_string()
    } else {
        format!("https://{}/api/v3", host)
    }
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    api: ApiClient,
}

impl GitHubClient {
    pub fn new(host: &str, token: String) -> Self {
        Self {
            api: ApiClient::new(
                "github",
                api_base_for_host(host),
                "Authorization",
                format!("Bearer {}", token),
            ),
        }
    }

    /// Reads `GITHUB_TOKEN`.
    pub fn from_env(host: &str) -> Result<Self> {
        let token = read_credential(ProviderKind::GitHub, TOKEN_VARIABLE)?;
        Ok(Self::new(host, token))
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api = self.api.with_api_base(api_base);
        self
    }

    pub fn api_base(&self) -> &str {
        self.api.api_base()
    }

    fn is_organization(&self, owner: &str) -> bool {
        self.api.probe(&format!("/orgs/{}", owner)).is_ok()
    }

    fn fetch_pages(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<Repository>> {
        let per_page = PER_PAGE.to_string();
        let mut repositories = Vec::new();
        for page in 1.. {
            let page = page.to_string();
            let mut page_query = query.to_vec();
            page_query.push(("page", page.as_str()));
            page_query.push(("per_page", per_page.as_str()));

            let batch: Vec<Repository> = self.api.get_json(path, &page_query)?;
            debug!("GitHub page {} of '{}': {} repositories", page, path, batch.len());
            let last = batch.len() < PER_PAGE;
            repositories.extend(batch);
            if last {
                break;
            }
        }
        Ok(repositories)
    }
}

impl MirrorProvider for GitHubClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    fn repository_exists(&self, location: &RemoteLocation, fp: &str) -> bool {
        let (owner, name) = match location.owner_and_name() {
            Ok(parts) => parts,
            Err(e) => {
                debug!("{}: {}", fp, e);
                return false;
            }
        };
        match self.api.probe(&format!("/repos/{}/{}", owner, name)) {
            Ok(()) => true,
            Err(e) => {
                debug!("{}: repository '{}/{}' lookup: {}", fp, owner, name, e);
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
        let (owner, name) = location.owner_and_name()?;
        let path = if self.is_organization(owner) {
            debug!("{}: Creating repository '{}' in organisation '{}'", fp, name, owner);
            format!("/orgs/{}/repos", owner)
        } else {
            debug!("{}: Creating repository '{}' for the authenticated user", fp, name);
            "/user/repos".to_string()
        };

        self.api.post_json(
            &path,
            &CreateRepository {
                name,
                private: visibility.is_private(),
                description,
            },
        )
    }

    fn fetch_owner_repos(
        &self,
        owner: &str,
        filters: &OwnerFilters,
    ) -> Result<Vec<RemoteRepository>> {
        let repositories = if self.is_organization(owner) {
            self.fetch_pages(
                &format!("/orgs/{}/repos", owner),
                &[("type", filters.github_visibility.as_str())],
            )?
        } else {
            debug!("'{}' is not a GitHub organisation, listing user repositories", owner);
            self.fetch_pages(
                "/user/repos",
                &[
                    ("visibility", filters.github_visibility.as_str()),
                    ("affiliation", filters.github_affiliation.as_str()),
                ],
            )?
            .into_iter()
            .filter(|repository| repository.owner.login == owner)
            .collect()
        };

        Ok(repositories
            .into_iter()
            .map(|repository| RemoteRepository {
                ssh_url: repository.ssh_url,
                https_url: repository.clone_url,
                default_branch: repository.default_branch.unwrap_or_default(),
                path_hint: repository.full_name,
            })
            .collect())
    }
}
