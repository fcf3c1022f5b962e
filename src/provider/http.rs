//! Blocking JSON-over-HTTP plumbing shared by the provider adapters.

use std::fmt;
use std::time::Duration;

use log::trace;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("git-get/", env!("CARGO_PKG_VERSION"));
const TIMEOUT: Duration = Duration::from_secs(30);

/// An authenticated client bound to one provider API base URL.
#[derive(Clone)]
pub(crate) struct ApiClient {
    provider: &'static str,
    agent: ureq::Agent,
    api_base: String,
    /// Name and value of the authentication header.
    auth: (&'static str, String),
}

// Keeps credentials out of debug output
impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("provider", &self.provider)
            .field("api_base", &self.api_base)
            .field("auth_header", &self.auth.0)
            .finish()
    }
}

impl ApiClient {
    pub(crate) fn new(
        provider: &'static str,
        api_base: impl Into<String>,
        auth_header: &'static str,
        auth_value: String,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build();
        Self {
            provider,
            agent,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            auth: (auth_header, auth_value),
        }
    }

    pub(crate) fn api_base(&self) -> &str {
        &self.api_base
    }

    pub(crate) fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set(self.auth.0, &self.auth.1)
            .set("Accept", "application/json")
    }

    fn map_error(&self, url: &str, err: ureq::Error) -> Error {
        match err {
            ureq::Error::Status(status, response) => Error::Api {
                provider: self.provider,
                status,
                url: url.to_string(),
                message: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => Error::Network {
                url: url.to_string(),
                message: transport.to_string(),
            },
        }
    }

    /// GET `path` with query pairs, returning the raw response.
    pub(crate) fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ureq::Response> {
        let url = self.url(path);
        trace!("GET {} {:?}", url, query);
        let mut request = self.request("GET", &url);
        for (name, value) in query {
            request = request.query(name, value);
        }
        request.call().map_err(|e| self.map_error(&url, e))
    }

    /// GET `path` and decode the JSON body.
    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.get(path, query)?;
        Ok(serde_json::from_reader(response.into_reader())?)
    }

    /// GET an absolute URL (pagination links) and decode the JSON body.
    pub(crate) fn get_json_url<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        trace!("GET {}", url);
        let response = self
            .request("GET", url)
            .call()
            .map_err(|e| self.map_error(url, e))?;
        Ok(serde_json::from_reader(response.into_reader())?)
    }

    /// GET `path`, keeping only whether it succeeded.
    pub(crate) fn probe(&self, path: &str) -> Result<()> {
        self.get(path, &[]).map(|_| ())
    }

    /// POST a JSON body to `path`, discarding the response body.
    pub(crate) fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        trace!("POST {}", url);
        self.request("POST", &url)
            .send_json(body)
            .map_err(|e| self.map_error(&url, e))?;
        Ok(())
    }
}
