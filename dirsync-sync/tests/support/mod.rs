//! In-memory source and target directories for reconciler tests.
//!
//! The target records every call so tests can assert on ordering and on the
//! absence of mutations, and can inject failures per operation.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use dirsync_core::{
    DirectoryError, Email, GroupName, LookupOutcome, NewUser, SourceDirectory, SourceGroup,
    SourceMember, SourceUser, TargetDirectory, TargetGroup, TargetUser, UserName,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemorySource {
    pub users: Vec<SourceUser>,
    pub deleted: Vec<SourceUser>,
    pub groups: Vec<(SourceGroup, Vec<Email>)>,
    pub fail_deleted_users: bool,
    pub fail_group_members: bool,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, email: &str, given: &str, family: &str) -> Self {
        self.users.push(SourceUser {
            primary_email: Email::from(email),
            given_name: given.into(),
            family_name: family.into(),
        });
        self
    }

    pub fn deleted_user(mut self, email: &str) -> Self {
        self.deleted.push(SourceUser {
            primary_email: Email::from(email),
            given_name: String::new(),
            family_name: String::new(),
        });
        self
    }

    pub fn group(mut self, name: &str, members: &[&str]) -> Self {
        let id = format!("src-{}", self.groups.len() + 1);
        self.groups.push((
            SourceGroup {
                id,
                name: GroupName::from(name),
            },
            members.iter().map(|m| Email::from(*m)).collect(),
        ));
        self
    }
}

impl SourceDirectory for MemorySource {
    fn deleted_users(&self) -> Result<Vec<SourceUser>, DirectoryError> {
        if self.fail_deleted_users {
            return Err(DirectoryError::Http {
                status: 503,
                detail: "source unavailable".into(),
            });
        }
        Ok(self.deleted.clone())
    }

    fn users(&self) -> Result<Vec<SourceUser>, DirectoryError> {
        Ok(self.users.clone())
    }

    fn groups(&self) -> Result<Vec<SourceGroup>, DirectoryError> {
        Ok(self.groups.iter().map(|(g, _)| g.clone()).collect())
    }

    fn group_members(&self, group: &SourceGroup) -> Result<Vec<SourceMember>, DirectoryError> {
        if self.fail_group_members {
            return Err(DirectoryError::Transport("connection reset".into()));
        }
        Ok(self
            .groups
            .iter()
            .find(|(g, _)| g.id == group.id)
            .map(|(_, members)| {
                members
                    .iter()
                    .map(|email| SourceMember {
                        email: email.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// A recorded target call. Mutations carry names, not ids, for readable asserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FindUser(String),
    CreateUser(String),
    DeleteUser(String),
    ListGroups,
    CreateGroup(String),
    DeleteGroup(String),
    IsMember(String, String),
    AddMember(String, String),
    RemoveMember(String, String),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Call::FindUser(_) | Call::ListGroups | Call::IsMember(..))
    }
}

#[derive(Debug, Default)]
struct TargetState {
    /// id → user
    users: BTreeMap<String, TargetUser>,
    /// id → display name attributes kept for assertions
    user_names: BTreeMap<String, (String, String)>,
    /// id → group
    groups: BTreeMap<String, TargetGroup>,
    /// (group id, user id)
    members: BTreeSet<(String, String)>,
    next_id: u64,
}

#[derive(Debug, Default)]
pub struct Failures {
    pub lookup: BTreeSet<String>,
    pub create_user: bool,
    pub is_member: bool,
    pub list_groups: bool,
}

#[derive(Debug, Default)]
pub struct MemoryTarget {
    state: RefCell<TargetState>,
    calls: RefCell<Vec<Call>>,
    pub failures: RefCell<Failures>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(state: &mut TargetState, prefix: &str) -> String {
        state.next_id += 1;
        format!("{prefix}-{}", state.next_id)
    }

    /// Seed a user whose username is `email`.
    pub fn with_user(&self, email: &str) -> TargetUser {
        let mut state = self.state.borrow_mut();
        let id = Self::next_id(&mut state, "u");
        let user = TargetUser {
            id: id.clone(),
            user_name: UserName::from(email),
            display_name: None,
        };
        state.users.insert(id, user.clone());
        user
    }

    pub fn with_group(&self, name: &str) -> TargetGroup {
        let mut state = self.state.borrow_mut();
        let id = Self::next_id(&mut state, "g");
        let group = TargetGroup {
            id: id.clone(),
            display_name: GroupName::from(name),
        };
        state.groups.insert(id, group.clone());
        group
    }

    pub fn with_member(&self, user: &TargetUser, group: &TargetGroup) {
        self.state
            .borrow_mut()
            .members
            .insert((group.id.clone(), user.id.clone()));
    }

    pub fn fail_lookup(&self, email: &str) {
        self.failures.borrow_mut().lookup.insert(email.to_owned());
    }

    // ── Inspection ────────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn user_names(&self) -> Vec<String> {
        let state = self.state.borrow();
        let mut names: Vec<_> = state.users.values().map(|u| u.user_name.0.clone()).collect();
        names.sort();
        names
    }

    /// (given, family) recorded at creation for `email`.
    pub fn created_name(&self, email: &str) -> Option<(String, String)> {
        let state = self.state.borrow();
        state
            .users
            .values()
            .find(|u| u.user_name.0 == email)
            .and_then(|u| state.user_names.get(&u.id).cloned())
    }

    pub fn group_names(&self) -> Vec<String> {
        let state = self.state.borrow();
        let mut names: Vec<_> = state
            .groups
            .values()
            .map(|g| g.display_name.0.clone())
            .collect();
        names.sort();
        names
    }

    /// Usernames that are members of the group called `name`.
    pub fn members_of(&self, name: &str) -> Vec<String> {
        let state = self.state.borrow();
        let Some(group) = state.groups.values().find(|g| g.display_name.0 == name) else {
            return Vec::new();
        };
        let mut names: Vec<_> = state
            .members
            .iter()
            .filter(|(gid, _)| *gid == group.id)
            .filter_map(|(_, uid)| state.users.get(uid))
            .map(|u| u.user_name.0.clone())
            .collect();
        names.sort();
        names
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn group_name(&self, group: &TargetGroup) -> String {
        group.display_name.0.clone()
    }
}

impl TargetDirectory for MemoryTarget {
    fn find_user_by_email(&self, email: &Email) -> LookupOutcome<TargetUser> {
        self.record(Call::FindUser(email.0.clone()));
        if self.failures.borrow().lookup.contains(&email.0) {
            return LookupOutcome::Failed(DirectoryError::Transport("timed out".into()));
        }
        let state = self.state.borrow();
        match state.users.values().find(|u| u.user_name.0 == email.0) {
            Some(user) => LookupOutcome::Found(user.clone()),
            None => LookupOutcome::NotFound,
        }
    }

    fn create_user(&self, user: &NewUser) -> Result<TargetUser, DirectoryError> {
        self.record(Call::CreateUser(user.primary_email.0.clone()));
        if self.failures.borrow().create_user {
            return Err(DirectoryError::Http {
                status: 409,
                detail: "duplicate userName".into(),
            });
        }
        let mut state = self.state.borrow_mut();
        let id = Self::next_id(&mut state, "u");
        let created = TargetUser {
            id: id.clone(),
            user_name: UserName::from(&user.primary_email),
            display_name: Some(user.display_name()),
        };
        state.users.insert(id.clone(), created.clone());
        state
            .user_names
            .insert(id, (user.given_name.clone(), user.family_name.clone()));
        Ok(created)
    }

    fn delete_user(&self, user: &TargetUser) -> Result<(), DirectoryError> {
        self.record(Call::DeleteUser(user.user_name.0.clone()));
        let mut state = self.state.borrow_mut();
        state
            .users
            .remove(&user.id)
            .ok_or_else(|| DirectoryError::NotFound(user.id.clone()))?;
        state.members.retain(|(_, uid)| *uid != user.id);
        Ok(())
    }

    fn groups(&self) -> Result<BTreeMap<GroupName, TargetGroup>, DirectoryError> {
        self.record(Call::ListGroups);
        if self.failures.borrow().list_groups {
            return Err(DirectoryError::Http {
                status: 500,
                detail: "internal".into(),
            });
        }
        Ok(self
            .state
            .borrow()
            .groups
            .values()
            .map(|g| (g.display_name.clone(), g.clone()))
            .collect())
    }

    fn create_group(&self, name: &GroupName) -> Result<TargetGroup, DirectoryError> {
        self.record(Call::CreateGroup(name.0.clone()));
        let mut state = self.state.borrow_mut();
        let id = Self::next_id(&mut state, "g");
        let group = TargetGroup {
            id: id.clone(),
            display_name: name.clone(),
        };
        state.groups.insert(id, group.clone());
        Ok(group)
    }

    fn delete_group(&self, group: &TargetGroup) -> Result<(), DirectoryError> {
        self.record(Call::DeleteGroup(self.group_name(group)));
        let mut state = self.state.borrow_mut();
        state
            .groups
            .remove(&group.id)
            .ok_or_else(|| DirectoryError::NotFound(group.id.clone()))?;
        state.members.retain(|(gid, _)| *gid != group.id);
        Ok(())
    }

    fn is_member(&self, user: &TargetUser, group: &TargetGroup) -> Result<bool, DirectoryError> {
        self.record(Call::IsMember(self.group_name(group), user.user_name.0.clone()));
        if self.failures.borrow().is_member {
            return Err(DirectoryError::Http {
                status: 500,
                detail: "membership check failed".into(),
            });
        }
        Ok(self
            .state
            .borrow()
            .members
            .contains(&(group.id.clone(), user.id.clone())))
    }

    fn add_member(&self, user: &TargetUser, group: &TargetGroup) -> Result<(), DirectoryError> {
        self.record(Call::AddMember(self.group_name(group), user.user_name.0.clone()));
        self.state
            .borrow_mut()
            .members
            .insert((group.id.clone(), user.id.clone()));
        Ok(())
    }

    fn remove_member(&self, user: &TargetUser, group: &TargetGroup) -> Result<(), DirectoryError> {
        self.record(Call::RemoveMember(self.group_name(group), user.user_name.0.clone()));
        self.state
            .borrow_mut()
            .members
            .remove(&(group.id.clone(), user.id.clone()));
        Ok(())
    }
}
