//! Run report: every mutation a run applied (or, in dry-run, would apply).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use dirsync_core::{Email, GroupName, UserName};

/// One mutating decision, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Change {
    UserCreated { email: Email },
    UserDeleted { email: Email },
    GroupCreated { group: GroupName },
    GroupDeleted { group: GroupName },
    MemberAdded { group: GroupName, user: UserName },
    MemberRemoved { group: GroupName, user: UserName },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::UserCreated { email } => write!(f, "create user {email}"),
            Change::UserDeleted { email } => write!(f, "delete user {email}"),
            Change::GroupCreated { group } => write!(f, "create group '{group}'"),
            Change::GroupDeleted { group } => write!(f, "delete group '{group}'"),
            Change::MemberAdded { group, user } => write!(f, "add {user} to '{group}'"),
            Change::MemberRemoved { group, user } => write!(f, "remove {user} from '{group}'"),
        }
    }
}

/// A target lookup that failed and was handled as "not found".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupFailure {
    pub email: Email,
    pub error: String,
}

/// Outcome of a sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// When set, `changes` were planned but not applied.
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub changes: Vec<Change>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lookup_failures: Vec<LookupFailure>,
    /// Size of the correlation table after principal reconciliation.
    pub correlated_users: usize,
    /// Source groups correlated with a target group.
    pub correlated_groups: usize,
}

impl SyncReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
            changes: Vec::new(),
            lookup_failures: Vec::new(),
            correlated_users: 0,
            correlated_groups: 0,
        }
    }

    pub(crate) fn record(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// True when the target already matched the source.
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for change in &self.changes {
            match change {
                Change::UserCreated { .. } => summary.users_created += 1,
                Change::UserDeleted { .. } => summary.users_deleted += 1,
                Change::GroupCreated { .. } => summary.groups_created += 1,
                Change::GroupDeleted { .. } => summary.groups_deleted += 1,
                Change::MemberAdded { .. } => summary.members_added += 1,
                Change::MemberRemoved { .. } => summary.members_removed += 1,
            }
        }
        summary
    }
}

/// Per-kind change counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub users_created: usize,
    pub users_deleted: usize,
    pub groups_created: usize,
    pub groups_deleted: usize,
    pub members_added: usize,
    pub members_removed: usize,
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "users +{}/-{}, groups +{}/-{}, members +{}/-{}",
            self.users_created,
            self.users_deleted,
            self.groups_created,
            self.groups_deleted,
            self.members_added,
            self.members_removed
        )
    }
}
