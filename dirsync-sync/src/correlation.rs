//! Per-run correlation table: target username → target user.
//!
//! Built during principal reconciliation and read-only afterwards. It holds
//! exactly the target users that correlate to an active source user; target
//! users without an active source counterpart never enter it.

use std::collections::{BTreeMap, BTreeSet};

use dirsync_core::{Email, TargetUser, UserName};

/// Target users known to correspond to active source users, keyed by username.
///
/// Iteration is in username order.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    users: BTreeMap<UserName, TargetUser>,
    /// Dry-run entries for users that would have been created.
    planned: BTreeSet<UserName>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user that exists in the target.
    pub fn insert(&mut self, user: TargetUser) {
        self.planned.remove(&user.user_name);
        self.users.insert(user.user_name.clone(), user);
    }

    /// Record a user that a dry run would have created.
    pub fn insert_planned(&mut self, user: TargetUser) {
        self.planned.insert(user.user_name.clone());
        self.users.insert(user.user_name.clone(), user);
    }

    pub fn get(&self, user_name: &UserName) -> Option<&TargetUser> {
        self.users.get(user_name)
    }

    /// Whether a source email correlates to a target user.
    ///
    /// Target usernames are primary emails, so the lookup is by the email text.
    pub fn contains_email(&self, email: &Email) -> bool {
        self.users.contains_key(&UserName::from(email))
    }

    /// Whether `user_name` is a dry-run placeholder with no target counterpart.
    pub fn is_planned(&self, user_name: &UserName) -> bool {
        self.planned.contains(user_name)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn users(&self) -> impl Iterator<Item = &TargetUser> {
        self.users.values()
    }

    pub fn user_names(&self) -> impl Iterator<Item = &UserName> {
        self.users.keys()
    }
}
