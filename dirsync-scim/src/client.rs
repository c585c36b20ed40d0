//! SCIM 2.0 HTTP client (ureq-based, blocking).
//!
//! Every method issues exactly one request except [`ScimClient::list_groups`],
//! which follows `startIndex` pagination until `totalResults` is reached.

use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use dirsync_core::DirectoryError;

use crate::model::{escape_filter_value, ListResponse, PatchRequest, ScimGroup, ScimUser};

const SCIM_CONTENT_TYPE: &str = "application/scim+json";
const DEFAULT_PAGE_SIZE: u64 = 100;

/// SCIM 2.0 client bound to one endpoint and bearer token.
#[derive(Clone)]
pub struct ScimClient {
    /// Base URL without trailing slash (e.g. `https://scim.example.com/scim/v2`).
    base_url: String,
    token: String,
    agent: ureq::Agent,
    page_size: u64,
}

impl std::fmt::Debug for ScimClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScimClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl ScimClient {
    /// Create a client. `timeout` applies to each request.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(DirectoryError::InvalidConfig(format!(
                "SCIM endpoint must be an http(s) URL, got '{base_url}'"
            )));
        }
        let token = token.into();
        if token.trim().is_empty() {
            return Err(DirectoryError::InvalidConfig(
                "SCIM access token is empty".to_owned(),
            ));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("dirsync/", env!("CARGO_PKG_VERSION")))
            .build();

        Ok(Self {
            base_url,
            token,
            agent,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Override the `count` used when paging through `/Groups`.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Users ─────────────────────────────────────────────────────────

    /// Find a user by exact `userName` (GET /Users?filter=userName eq "…").
    pub fn find_user_by_user_name(
        &self,
        user_name: &str,
    ) -> Result<Option<ScimUser>, DirectoryError> {
        let filter = format!("userName eq \"{}\"", escape_filter_value(user_name));
        let list: ListResponse<ScimUser> =
            self.get(&self.url("Users"), &[("filter", filter.as_str())])?;
        Ok(list.resources.into_iter().next())
    }

    /// POST /Users.
    pub fn create_user(&self, user: &ScimUser) -> Result<ScimUser, DirectoryError> {
        self.send_json("POST", &self.url("Users"), user)
    }

    /// DELETE /Users/:id.
    pub fn delete_user(&self, id: &str) -> Result<(), DirectoryError> {
        self.delete(&self.url(&format!("Users/{id}")))
    }

    // ── Groups ────────────────────────────────────────────────────────

    /// Every group on the target, following pagination.
    pub fn list_groups(&self) -> Result<Vec<ScimGroup>, DirectoryError> {
        let url = self.url("Groups");
        let count = self.page_size.to_string();
        let mut groups = Vec::new();
        let mut start_index: u64 = 1;

        loop {
            let start = start_index.to_string();
            let page: ListResponse<ScimGroup> = self.get(
                &url,
                &[("startIndex", start.as_str()), ("count", count.as_str())],
            )?;
            let received = page.resources.len() as u64;
            groups.extend(page.resources);

            let exhausted = match page.total_results {
                Some(total) => groups.len() as u64 >= total,
                None => received < self.page_size,
            };
            if received == 0 || exhausted {
                break;
            }
            start_index += received;
        }

        debug!(count = groups.len(), "listed SCIM groups");
        Ok(groups)
    }

    /// POST /Groups.
    pub fn create_group(&self, group: &ScimGroup) -> Result<ScimGroup, DirectoryError> {
        self.send_json("POST", &self.url("Groups"), group)
    }

    /// DELETE /Groups/:id.
    pub fn delete_group(&self, id: &str) -> Result<(), DirectoryError> {
        self.delete(&self.url(&format!("Groups/{id}")))
    }

    /// Whether `user_id` is a member of `group_id`
    /// (GET /Groups?filter=id eq "…" and members eq "…").
    pub fn is_member(&self, group_id: &str, user_id: &str) -> Result<bool, DirectoryError> {
        let filter = format!(
            "id eq \"{}\" and members eq \"{}\"",
            escape_filter_value(group_id),
            escape_filter_value(user_id)
        );
        let list: ListResponse<ScimGroup> =
            self.get(&self.url("Groups"), &[("filter", filter.as_str())])?;
        Ok(list.total_results.unwrap_or(0) > 0 || !list.resources.is_empty())
    }

    /// PATCH /Groups/:id.
    pub fn patch_group(&self, id: &str, patch: &PatchRequest) -> Result<(), DirectoryError> {
        let url = self.url(&format!("Groups/{id}"));
        debug!(%url, "SCIM PATCH");
        self.authorized(self.agent.request("PATCH", &url))
            .set("Content-Type", SCIM_CONTENT_TYPE)
            .send_json(patch)
            .map_err(map_ureq_error)?;
        Ok(())
    }

    // ── Internal HTTP methods ─────────────────────────────────────────

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    fn authorized(&self, request: ureq::Request) -> ureq::Request {
        request
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", SCIM_CONTENT_TYPE)
    }

    fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, DirectoryError> {
        debug!(%url, ?query, "SCIM GET");
        let mut request = self.authorized(self.agent.get(url));
        for (key, value) in query {
            request = request.query(key, value);
        }
        let response = request.call().map_err(map_ureq_error)?;
        decode(response)
    }

    fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &str,
        url: &str,
        body: &B,
    ) -> Result<T, DirectoryError> {
        debug!(%url, method, "SCIM request");
        let response = self
            .authorized(self.agent.request(method, url))
            .set("Content-Type", SCIM_CONTENT_TYPE)
            .send_json(body)
            .map_err(map_ureq_error)?;
        decode(response)
    }

    fn delete(&self, url: &str) -> Result<(), DirectoryError> {
        debug!(%url, "SCIM DELETE");
        self.authorized(self.agent.delete(url))
            .call()
            .map_err(map_ureq_error)?;
        Ok(())
    }
}

// ── Response handling ─────────────────────────────────────────────────

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, DirectoryError> {
    response
        .into_json::<T>()
        .map_err(|e| DirectoryError::Decode(e.to_string()))
}

fn map_ureq_error(err: ureq::Error) -> DirectoryError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response
                .into_string()
                .unwrap_or_else(|_| "<no body>".to_owned());
            match status {
                404 => DirectoryError::NotFound(body),
                401 | 403 => DirectoryError::Unauthorized(format!("HTTP {status}: {body}")),
                _ => DirectoryError::Http {
                    status,
                    detail: if body.is_empty() {
                        format!("HTTP {status}")
                    } else {
                        body
                    },
                },
            }
        }
        ureq::Error::Transport(transport) => DirectoryError::Transport(transport.to_string()),
    }
}
