//! The reconciler: principal pass, then group and membership pass.
//!
//! ## `sync_principals`
//!
//! 1. Delete the target counterpart of every user the source reports deleted.
//! 2. For every active source user, correlate by email or create it; record
//!    the target user in the correlation table.
//!
//! ## `sync_groups`
//!
//! 1. Fetch target groups once, then source groups.
//! 2. Per source group: correlate by display name or create, then converge
//!    membership of every correlated user against the source member list.
//! 3. Delete every target group no source group correlated with.
//!
//! Every directory error ends the run. Nothing applied earlier is rolled back;
//! the next run picks up from whatever state the target was left in.

use std::collections::{BTreeMap, BTreeSet};

use dirsync_core::{
    Email, GroupName, LookupErrorPolicy, LookupOutcome, NewUser, SourceDirectory, SourceGroup,
    TargetDirectory, TargetGroup, TargetUser, UserName,
};

use crate::cancel::CancelToken;
use crate::correlation::CorrelationTable;
use crate::error::SyncError;
use crate::report::{Change, LookupFailure, SyncReport};

/// Knobs for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Read both directories and plan changes without applying any.
    pub dry_run: bool,
    pub lookup_errors: LookupErrorPolicy,
}

/// A target group a source group resolved to during this run.
#[derive(Debug, Clone)]
struct CorrelatedGroup {
    group: TargetGroup,
    /// Dry-run only: the group would have been created and has no target id.
    planned: bool,
}

/// Drives one sync run over a source and a target directory.
///
/// The correlation table lives exactly as long as the reconciler.
pub struct Reconciler<'a, S: ?Sized, T: ?Sized> {
    source: &'a S,
    target: &'a T,
    options: SyncOptions,
    cancel: CancelToken,
    users: CorrelationTable,
    report: SyncReport,
}

impl<'a, S, T> Reconciler<'a, S, T>
where
    S: SourceDirectory + ?Sized,
    T: TargetDirectory + ?Sized,
{
    pub fn new(source: &'a S, target: &'a T, options: SyncOptions, cancel: CancelToken) -> Self {
        Self {
            source,
            target,
            options,
            cancel,
            users: CorrelationTable::new(),
            report: SyncReport::new(options.dry_run),
        }
    }

    pub fn correlation(&self) -> &CorrelationTable {
        &self.users
    }

    pub fn report(&self) -> &SyncReport {
        &self.report
    }

    /// Consume the reconciler, stamping the finish time on its report.
    pub fn into_report(mut self) -> SyncReport {
        self.report.finish();
        self.report
    }

    // -----------------------------------------------------------------------
    // Principals
    // -----------------------------------------------------------------------

    /// Delete users the source reports deleted, then correlate or create
    /// every active source user.
    pub fn sync_principals(&mut self) -> Result<(), SyncError> {
        self.cancel.check()?;
        tracing::debug!("get deleted users");
        let deleted = self.source.deleted_users()?;
        // Dry-run only: target users the delete pass would already have removed.
        let mut planned_deletions: BTreeSet<UserName> = BTreeSet::new();

        for user in &deleted {
            self.cancel.check()?;
            let Some(existing) = self.lookup(&user.primary_email)? else {
                continue;
            };

            if self.options.dry_run {
                tracing::info!("[dry-run] would delete user {}", user.primary_email);
                planned_deletions.insert(existing.user_name.clone());
            } else {
                tracing::info!("deleting user {}", user.primary_email);
                self.target.delete_user(&existing)?;
            }
            self.report.record(Change::UserDeleted {
                email: user.primary_email.clone(),
            });
        }

        self.cancel.check()?;
        tracing::debug!("get active users");
        let active = self.source.users()?;

        for user in &active {
            self.cancel.check()?;
            tracing::debug!("finding user {}", user.primary_email);
            let found = self
                .lookup(&user.primary_email)?
                .filter(|existing| !planned_deletions.contains(&existing.user_name));
            if let Some(existing) = found {
                self.users.insert(existing);
                continue;
            }

            let new_user = NewUser::from(user);
            if self.options.dry_run {
                tracing::info!("[dry-run] would create user {}", user.primary_email);
                self.users.insert_planned(TargetUser {
                    id: String::new(),
                    user_name: UserName::from(&new_user.primary_email),
                    display_name: Some(new_user.display_name()),
                });
            } else {
                tracing::info!("creating user {}", user.primary_email);
                let created = self.target.create_user(&new_user)?;
                self.users.insert(created);
            }
            self.report.record(Change::UserCreated {
                email: user.primary_email.clone(),
            });
        }

        self.report.correlated_users = self.users.len();
        Ok(())
    }

    /// Look up a target user by email, applying the lookup-error policy.
    fn lookup(&mut self, email: &Email) -> Result<Option<TargetUser>, SyncError> {
        match self.target.find_user_by_email(email) {
            LookupOutcome::Found(user) => Ok(Some(user)),
            LookupOutcome::NotFound => Ok(None),
            LookupOutcome::Failed(source) => match self.options.lookup_errors {
                LookupErrorPolicy::Abort => Err(SyncError::Lookup {
                    email: email.clone(),
                    source,
                }),
                LookupErrorPolicy::TreatAsNotFound => {
                    tracing::warn!("lookup of {email} failed, treating as not found: {source}");
                    self.report.lookup_failures.push(LookupFailure {
                        email: email.clone(),
                        error: source.to_string(),
                    });
                    Ok(None)
                }
            },
        }
    }

    // -----------------------------------------------------------------------
    // Groups and memberships
    // -----------------------------------------------------------------------

    /// Correlate or create every source group, converge its membership, then
    /// delete target groups left uncorrelated.
    ///
    /// Must run after [`sync_principals`](Self::sync_principals): membership
    /// is only managed for users in the correlation table.
    pub fn sync_groups(&mut self) -> Result<(), SyncError> {
        self.cancel.check()?;
        tracing::debug!("get target groups");
        let target_groups = self.target.groups()?;

        self.cancel.check()?;
        tracing::debug!("get source groups");
        let source_groups = self.source.groups()?;

        let mut correlated: BTreeMap<GroupName, CorrelatedGroup> = BTreeMap::new();

        for source_group in &source_groups {
            self.cancel.check()?;
            tracing::debug!("check group '{}'", source_group.name);
            let group = self.correlate_group(source_group, &target_groups, &mut correlated)?;
            let wanted = self.source_members(source_group)?;
            self.sync_members(&group, &wanted)?;
        }

        tracing::debug!("clean up target groups");
        for (name, group) in &target_groups {
            if correlated.contains_key(name) {
                continue;
            }
            self.cancel.check()?;
            if self.options.dry_run {
                tracing::info!("[dry-run] would delete group '{name}'");
            } else {
                tracing::info!("deleting group '{name}'");
                self.target.delete_group(group)?;
            }
            self.report.record(Change::GroupDeleted {
                group: name.clone(),
            });
        }

        self.report.correlated_groups = correlated.len();
        Ok(())
    }

    /// Resolve a source group to a target group, creating it if absent.
    fn correlate_group(
        &mut self,
        source_group: &SourceGroup,
        target_groups: &BTreeMap<GroupName, TargetGroup>,
        correlated: &mut BTreeMap<GroupName, CorrelatedGroup>,
    ) -> Result<CorrelatedGroup, SyncError> {
        let name = &source_group.name;

        // A repeated source name reuses the group resolved the first time.
        if let Some(existing) = correlated.get(name) {
            return Ok(existing.clone());
        }

        let resolved = if let Some(existing) = target_groups.get(name) {
            tracing::debug!("found group '{name}'");
            CorrelatedGroup {
                group: existing.clone(),
                planned: false,
            }
        } else if self.options.dry_run {
            tracing::info!("[dry-run] would create group '{name}'");
            self.report.record(Change::GroupCreated {
                group: name.clone(),
            });
            CorrelatedGroup {
                group: TargetGroup {
                    id: String::new(),
                    display_name: name.clone(),
                },
                planned: true,
            }
        } else {
            tracing::info!("creating group '{name}'");
            let created = self.target.create_group(name)?;
            self.report.record(Change::GroupCreated {
                group: name.clone(),
            });
            CorrelatedGroup {
                group: created,
                planned: false,
            }
        };

        correlated.insert(name.clone(), resolved.clone());
        Ok(resolved)
    }

    /// Source members of `group` that are present in the correlation table.
    fn source_members(&self, group: &SourceGroup) -> Result<BTreeSet<UserName>, SyncError> {
        self.cancel.check()?;
        let members = self.source.group_members(group)?;
        Ok(members
            .iter()
            .filter(|m| self.users.contains_email(&m.email))
            .map(|m| UserName::from(&m.email))
            .collect())
    }

    /// Converge target membership of `group` to `wanted`.
    ///
    /// Checks every correlated user against every group: one membership call
    /// per (user, group) pair, traded for not having to list target members.
    fn sync_members(
        &mut self,
        group: &CorrelatedGroup,
        wanted: &BTreeSet<UserName>,
    ) -> Result<(), SyncError> {
        let name = &group.group.display_name;
        tracing::info!("sync members of '{name}'");

        for user in self.users.users() {
            self.cancel.check()?;
            let should_be_member = wanted.contains(&user.user_name);

            tracing::debug!("check {} in '{name}'", user.user_name);
            let is_member = if group.planned || self.users.is_planned(&user.user_name) {
                false
            } else {
                self.target.is_member(user, &group.group)?
            };

            match (should_be_member, is_member) {
                (true, false) => {
                    if self.options.dry_run {
                        tracing::info!("[dry-run] would add {} to '{name}'", user.user_name);
                    } else {
                        tracing::info!("adding {} to '{name}'", user.user_name);
                        self.target.add_member(user, &group.group)?;
                    }
                    self.report.record(Change::MemberAdded {
                        group: name.clone(),
                        user: user.user_name.clone(),
                    });
                }
                (false, true) => {
                    if self.options.dry_run {
                        tracing::info!("[dry-run] would remove {} from '{name}'", user.user_name);
                    } else {
                        tracing::info!("removing {} from '{name}'", user.user_name);
                        self.target.remove_member(user, &group.group)?;
                    }
                    self.report.record(Change::MemberRemoved {
                        group: name.clone(),
                        user: user.user_name.clone(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}
