//! Directory entities for the source and target sides.
//!
//! The two directories share no identifier space. Users correlate by primary
//! email (source) against username (target); groups correlate by display name.
//! All comparisons are case-sensitive, exactly as each system returns them.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A primary email address as reported by the source directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(pub String);

impl Email {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Email {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Email {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A target directory username. Users created by dirsync carry their primary
/// email as username, so an [`Email`] converts directly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserName(pub String);

impl UserName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for UserName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<&Email> for UserName {
    fn from(email: &Email) -> Self {
        Self(email.0.clone())
    }
}

/// A group display name; the group correlation key on both sides.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupName(pub String);

impl GroupName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for GroupName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GroupName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Source side
// ---------------------------------------------------------------------------

/// A user (principal) from the source directory, active or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUser {
    pub primary_email: Email,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
}

/// A group in the source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceGroup {
    /// Opaque source identifier used to list members.
    pub id: String,
    pub name: GroupName,
}

/// A member entry of a source group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMember {
    pub email: Email,
}

// ---------------------------------------------------------------------------
// Target side
// ---------------------------------------------------------------------------

/// Attributes needed to create a target user from a source user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub given_name: String,
    pub family_name: String,
    pub primary_email: Email,
}

impl NewUser {
    /// `"<given> <family>"`, trimmed so a missing part leaves no stray space.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
            .trim()
            .to_owned()
    }
}

impl From<&SourceUser> for NewUser {
    fn from(u: &SourceUser) -> Self {
        Self {
            given_name: u.given_name.clone(),
            family_name: u.family_name.clone(),
            primary_email: u.primary_email.clone(),
        }
    }
}

/// A user as it exists in the target directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetUser {
    /// Target-assigned identifier.
    pub id: String,
    pub user_name: UserName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A group as it exists in the target directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGroup {
    /// Target-assigned identifier.
    pub id: String,
    pub display_name: GroupName,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
