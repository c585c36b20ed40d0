//! SCIM 2.0 resource and message payloads (RFC 7643 / RFC 7644 subset).

use serde::{Deserialize, Serialize};

use dirsync_core::{DirectoryError, GroupName, NewUser, TargetGroup, TargetUser, UserName};

pub const USER_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const GROUP_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";
pub const PATCH_OP_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

/// `User` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimUser {
    #[serde(default)]
    pub schemas: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<ScimName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<ScimEmail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimName {
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScimEmail {
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

/// `Group` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimGroup {
    #[serde(default)]
    pub schemas: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub members: Vec<ScimMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScimMember {
    pub value: String,
}

/// `ListResponse` message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    /// Absent on some servers; pagination then relies on short pages.
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(rename = "Resources", default = "Vec::new")]
    pub resources: Vec<T>,
}

/// `PatchOp` message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchRequest {
    pub schemas: Vec<String>,
    #[serde(rename = "Operations")]
    pub operations: Vec<PatchOperation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOperation {
    pub op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl PatchRequest {
    /// Add a single member to a group.
    pub fn add_member(user_id: &str) -> Self {
        Self::single(PatchOperation {
            op: "add".to_owned(),
            path: Some("members".to_owned()),
            value: Some(serde_json::json!([{ "value": user_id }])),
        })
    }

    /// Remove a single member from a group.
    pub fn remove_member(user_id: &str) -> Self {
        Self::single(PatchOperation {
            op: "remove".to_owned(),
            path: Some(format!(
                "members[value eq \"{}\"]",
                escape_filter_value(user_id)
            )),
            value: None,
        })
    }

    fn single(op: PatchOperation) -> Self {
        Self {
            schemas: vec![PATCH_OP_SCHEMA.to_owned()],
            operations: vec![op],
        }
    }
}

// ---------------------------------------------------------------------------
// Mapping to / from directory types
// ---------------------------------------------------------------------------

impl From<&NewUser> for ScimUser {
    fn from(user: &NewUser) -> Self {
        Self {
            schemas: vec![USER_SCHEMA.to_owned()],
            id: None,
            user_name: user.primary_email.0.clone(),
            display_name: Some(user.display_name()),
            name: Some(ScimName {
                given_name: user.given_name.clone(),
                family_name: user.family_name.clone(),
            }),
            emails: vec![ScimEmail {
                value: user.primary_email.0.clone(),
                kind: Some("work".to_owned()),
                primary: Some(true),
            }],
            active: Some(true),
        }
    }
}

impl ScimGroup {
    /// Payload for `POST /Groups`.
    pub fn new(name: &GroupName) -> Self {
        Self {
            schemas: vec![GROUP_SCHEMA.to_owned()],
            id: None,
            display_name: name.0.clone(),
            members: Vec::new(),
        }
    }
}

impl TryFrom<ScimUser> for TargetUser {
    type Error = DirectoryError;

    fn try_from(user: ScimUser) -> Result<Self, Self::Error> {
        let id = user.id.ok_or_else(|| {
            DirectoryError::Decode(format!("user '{}' has no id", user.user_name))
        })?;
        Ok(TargetUser {
            id,
            user_name: UserName(user.user_name),
            display_name: user.display_name,
        })
    }
}

impl TryFrom<ScimGroup> for TargetGroup {
    type Error = DirectoryError;

    fn try_from(group: ScimGroup) -> Result<Self, Self::Error> {
        let id = group.id.ok_or_else(|| {
            DirectoryError::Decode(format!("group '{}' has no id", group.display_name))
        })?;
        Ok(TargetGroup {
            id,
            display_name: GroupName(group.display_name),
        })
    }
}

/// Escape a value for use inside a double-quoted SCIM filter literal
/// (RFC 7644 §3.4.2.2).
pub fn escape_filter_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
