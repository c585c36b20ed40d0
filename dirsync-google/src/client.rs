//! Admin SDK Directory API client (ureq-based, blocking).

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use dirsync_core::{DirectoryError, SourceDirectory, SourceGroup, SourceMember, SourceUser};

use crate::auth::{ServiceAccountKey, TokenSource, DIRECTORY_SCOPES};
use crate::model::{GroupsPage, MembersPage, Page, UsersPage};

const DEFAULT_BASE_URL: &str = "https://admin.googleapis.com/admin/directory/v1";
/// Alias for the account the credentials belong to.
const MY_CUSTOMER: &str = "my_customer";
const MAX_RESULTS: &str = "200";

/// Source directory backed by Google Workspace.
#[derive(Debug)]
pub struct GoogleDirectory {
    base_url: String,
    agent: ureq::Agent,
    tokens: TokenSource,
}

impl GoogleDirectory {
    /// Build a client from service-account key JSON, impersonating `admin`.
    pub fn new(credentials: &[u8], admin: &str, timeout: Duration) -> Result<Self, DirectoryError> {
        if admin.trim().is_empty() {
            return Err(DirectoryError::InvalidConfig(
                "Google admin email is empty".to_owned(),
            ));
        }
        let key = ServiceAccountKey::from_json(credentials)?;
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("dirsync/", env!("CARGO_PKG_VERSION")))
            .build();
        let tokens = TokenSource::new(key, admin, DIRECTORY_SCOPES, agent.clone())?;
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            agent,
            tokens,
        })
    }

    /// Point the client at another Directory API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn list_users(&self, show_deleted: bool) -> Result<Vec<SourceUser>, DirectoryError> {
        let mut query = vec![("customer", MY_CUSTOMER), ("maxResults", MAX_RESULTS)];
        if show_deleted {
            query.push(("showDeleted", "true"));
        }
        let users = self.collect_pages::<UsersPage>(&format!("{}/users", self.base_url), &query)?;
        Ok(users.into_iter().map(SourceUser::from).collect())
    }

    pub fn list_groups(&self) -> Result<Vec<SourceGroup>, DirectoryError> {
        let groups = self.collect_pages::<GroupsPage>(
            &format!("{}/groups", self.base_url),
            &[("customer", MY_CUSTOMER), ("maxResults", MAX_RESULTS)],
        )?;
        Ok(groups.into_iter().map(SourceGroup::from).collect())
    }

    /// Members of the group with id (or email) `group_key`.
    pub fn list_members(&self, group_key: &str) -> Result<Vec<SourceMember>, DirectoryError> {
        let members = self.collect_pages::<MembersPage>(
            &format!("{}/groups/{}/members", self.base_url, group_key),
            &[("maxResults", MAX_RESULTS)],
        )?;
        Ok(members
            .into_iter()
            .filter_map(|m| m.into_source_member())
            .collect())
    }

    // ── Internal HTTP ─────────────────────────────────────────────────

    fn collect_pages<P>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<P::Item>, DirectoryError>
    where
        P: Page + DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page: P = self.get(url, query, page_token.as_deref())?;
            let (batch, next) = page.into_parts();
            items.extend(batch);
            match next {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!(%url, count = items.len(), "listed directory resources");
        Ok(items)
    }

    fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        page_token: Option<&str>,
    ) -> Result<T, DirectoryError> {
        let token = self.tokens.access_token()?;
        let mut request = self
            .agent
            .get(url)
            .set("Authorization", &format!("Bearer {token}"));
        for (key, value) in query {
            request = request.query(key, value);
        }
        if let Some(page_token) = page_token {
            request = request.query("pageToken", page_token);
        }
        debug!(%url, ?page_token, "Directory GET");

        let response = request.call().map_err(|err| self.map_error(err))?;
        response
            .into_json::<T>()
            .map_err(|e| DirectoryError::Decode(e.to_string()))
    }

    fn map_error(&self, err: ureq::Error) -> DirectoryError {
        match err {
            ureq::Error::Status(status, response) => {
                let body = response
                    .into_string()
                    .unwrap_or_else(|_| "<no body>".to_owned());
                match status {
                    404 => DirectoryError::NotFound(body),
                    401 | 403 => {
                        self.tokens.invalidate();
                        DirectoryError::Unauthorized(format!("HTTP {status}: {body}"))
                    }
                    _ => DirectoryError::Http {
                        status,
                        detail: body,
                    },
                }
            }
            ureq::Error::Transport(transport) => DirectoryError::Transport(transport.to_string()),
        }
    }
}

impl SourceDirectory for GoogleDirectory {
    fn deleted_users(&self) -> Result<Vec<SourceUser>, DirectoryError> {
        self.list_users(true)
    }

    fn users(&self) -> Result<Vec<SourceUser>, DirectoryError> {
        self.list_users(false)
    }

    fn groups(&self) -> Result<Vec<SourceGroup>, DirectoryError> {
        self.list_groups()
    }

    fn group_members(&self, group: &SourceGroup) -> Result<Vec<SourceMember>, DirectoryError> {
        self.list_members(&group.id)
    }
}
