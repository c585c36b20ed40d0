//! Admin SDK Directory API payloads (the fields dirsync reads).

use serde::Deserialize;

use dirsync_core::{Email, GroupName, SourceGroup, SourceMember, SourceUser};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersPage {
    #[serde(default)]
    pub users: Vec<ApiUser>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
    pub primary_email: String,
    #[serde(default)]
    pub name: Option<ApiUserName>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUserName {
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupsPage {
    #[serde(default)]
    pub groups: Vec<ApiGroup>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiGroup {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembersPage {
    #[serde(default)]
    pub members: Vec<ApiMember>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// A group member. Members of type `CUSTOMER` carry no email.
#[derive(Debug, Deserialize)]
pub struct ApiMember {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Pages that carry a continuation token.
pub trait Page {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

impl Page for UsersPage {
    type Item = ApiUser;

    fn into_parts(self) -> (Vec<ApiUser>, Option<String>) {
        (self.users, self.next_page_token)
    }
}

impl Page for GroupsPage {
    type Item = ApiGroup;

    fn into_parts(self) -> (Vec<ApiGroup>, Option<String>) {
        (self.groups, self.next_page_token)
    }
}

impl Page for MembersPage {
    type Item = ApiMember;

    fn into_parts(self) -> (Vec<ApiMember>, Option<String>) {
        (self.members, self.next_page_token)
    }
}

impl From<ApiUser> for SourceUser {
    fn from(user: ApiUser) -> Self {
        let name = user.name.unwrap_or_default();
        SourceUser {
            primary_email: Email(user.primary_email),
            given_name: name.given_name,
            family_name: name.family_name,
        }
    }
}

impl From<ApiGroup> for SourceGroup {
    fn from(group: ApiGroup) -> Self {
        SourceGroup {
            id: group.id,
            name: GroupName(group.name),
        }
    }
}

impl ApiMember {
    /// `None` for members the target cannot correlate (no email).
    pub fn into_source_member(self) -> Option<SourceMember> {
        match self.email {
            Some(email) => Some(SourceMember {
                email: Email(email),
            }),
            None => {
                tracing::debug!(
                    kind = self.kind.as_deref().unwrap_or("unknown"),
                    "skipping group member without email"
                );
                None
            }
        }
    }
}
