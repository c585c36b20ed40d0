//! Port traits for the two directories.
//!
//! Implementations are blocking: every call completes before the reconciler
//! issues the next one. Methods take `&self`; clients that keep mutable state
//! (token caches) use interior mutability.

use std::collections::BTreeMap;

use crate::error::DirectoryError;
use crate::types::{
    Email, GroupName, NewUser, SourceGroup, SourceMember, SourceUser, TargetGroup, TargetUser,
};

/// Result of a target-side lookup.
///
/// `NotFound` is a normal outcome. `Failed` is kept distinct so the caller
/// decides whether a failed lookup counts as absence or aborts the run.
#[derive(Debug)]
pub enum LookupOutcome<T> {
    Found(T),
    NotFound,
    Failed(DirectoryError),
}

impl<T> From<Result<Option<T>, DirectoryError>> for LookupOutcome<T> {
    fn from(result: Result<Option<T>, DirectoryError>) -> Self {
        match result {
            Ok(Some(found)) => LookupOutcome::Found(found),
            Ok(None) | Err(DirectoryError::NotFound(_)) => LookupOutcome::NotFound,
            Err(err) => LookupOutcome::Failed(err),
        }
    }
}

/// Read-only operations against the source-of-truth directory.
pub trait SourceDirectory {
    /// Users the source reports as deleted.
    fn deleted_users(&self) -> Result<Vec<SourceUser>, DirectoryError>;

    /// Currently active users.
    fn users(&self) -> Result<Vec<SourceUser>, DirectoryError>;

    /// All groups, in the source's listing order.
    fn groups(&self) -> Result<Vec<SourceGroup>, DirectoryError>;

    /// Members of `group`.
    fn group_members(&self, group: &SourceGroup) -> Result<Vec<SourceMember>, DirectoryError>;
}

/// Read/write operations against the target access-control directory.
pub trait TargetDirectory {
    fn find_user_by_email(&self, email: &Email) -> LookupOutcome<TargetUser>;

    /// Create a user; the returned value carries the target-assigned id and username.
    fn create_user(&self, user: &NewUser) -> Result<TargetUser, DirectoryError>;

    fn delete_user(&self, user: &TargetUser) -> Result<(), DirectoryError>;

    /// Every target group keyed by display name.
    fn groups(&self) -> Result<BTreeMap<GroupName, TargetGroup>, DirectoryError>;

    fn create_group(&self, name: &GroupName) -> Result<TargetGroup, DirectoryError>;

    fn delete_group(&self, group: &TargetGroup) -> Result<(), DirectoryError>;

    fn is_member(&self, user: &TargetUser, group: &TargetGroup) -> Result<bool, DirectoryError>;

    fn add_member(&self, user: &TargetUser, group: &TargetGroup) -> Result<(), DirectoryError>;

    fn remove_member(&self, user: &TargetUser, group: &TargetGroup)
        -> Result<(), DirectoryError>;
}
