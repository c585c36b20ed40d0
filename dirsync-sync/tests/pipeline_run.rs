//! End-to-end runs through `pipeline::run`: ordering, dry-run and cancellation.

mod support;

use std::collections::BTreeMap;

use dirsync_core::{
    DirectoryError, Email, GroupName, LookupOutcome, NewUser, TargetDirectory, TargetGroup,
    TargetUser,
};
use dirsync_sync::pipeline;
use dirsync_sync::{CancelToken, Change, SyncError, SyncOptions};
use rstest::{fixture, rstest};
use support::{init_logging, Call, MemorySource, MemoryTarget};

/// alice and carol active, bob deleted; Engineers holds alice plus an
/// address the target has never heard of.
fn scenario() -> MemorySource {
    init_logging();
    MemorySource::new()
        .user("alice@x.com", "Alice", "Liddell")
        .user("carol@x.com", "Carol", "Danvers")
        .deleted_user("bob@x.com")
        .group("Engineers", &["alice@x.com", "nobody@elsewhere.com"])
        .group("Ops", &["carol@x.com"])
}

#[fixture]
fn source() -> MemorySource {
    scenario()
}

/// Target with bob, a stray Temp group and carol wrongly in Engineers.
#[fixture]
fn target() -> MemoryTarget {
    let target = MemoryTarget::new();
    target.with_user("bob@x.com");
    let carol = target.with_user("carol@x.com");
    let engineers = target.with_group("Engineers");
    target.with_group("Temp");
    target.with_member(&carol, &engineers);
    target
}

fn dry_run() -> SyncOptions {
    SyncOptions {
        dry_run: true,
        ..SyncOptions::default()
    }
}

#[rstest]
fn full_run_converges_target(source: MemorySource, target: MemoryTarget) {
    let report = pipeline::run(&source, &target, SyncOptions::default(), &CancelToken::new())
        .expect("run");

    assert_eq!(target.user_names(), vec!["alice@x.com", "carol@x.com"]);
    assert_eq!(target.group_names(), vec!["Engineers", "Ops"]);
    assert_eq!(target.members_of("Engineers"), vec!["alice@x.com"]);
    assert_eq!(target.members_of("Ops"), vec!["carol@x.com"]);

    assert!(!report.dry_run);
    assert!(report.finished_at.is_some());
    assert_eq!(report.correlated_users, 2);
    assert_eq!(report.correlated_groups, 2);
    let summary = report.summary();
    assert_eq!(summary.users_created, 1);
    assert_eq!(summary.users_deleted, 1);
    assert_eq!(summary.groups_created, 1);
    assert_eq!(summary.groups_deleted, 1);
    assert_eq!(summary.members_added, 2);
    assert_eq!(summary.members_removed, 1);
}

#[rstest]
fn principals_are_settled_before_any_group_call(source: MemorySource, target: MemoryTarget) {
    pipeline::run(&source, &target, SyncOptions::default(), &CancelToken::new()).expect("run");

    let calls = target.calls();
    let first_group_call = calls
        .iter()
        .position(|c| *c == Call::ListGroups)
        .expect("groups listed");
    assert!(calls[..first_group_call]
        .iter()
        .all(|c| matches!(c, Call::FindUser(_) | Call::CreateUser(_) | Call::DeleteUser(_))));
    assert!(calls[first_group_call..]
        .iter()
        .all(|c| !matches!(c, Call::FindUser(_) | Call::CreateUser(_) | Call::DeleteUser(_))));
}

#[rstest]
fn principal_failure_never_reaches_groups(target: MemoryTarget) {
    let source = MemorySource {
        fail_deleted_users: true,
        ..scenario()
    };

    let err = pipeline::run(&source, &target, SyncOptions::default(), &CancelToken::new())
        .unwrap_err();

    assert!(matches!(err, SyncError::Directory(_)));
    assert!(target.calls().is_empty());
    assert_eq!(target.group_names(), vec!["Engineers", "Temp"]);
}

#[rstest]
fn dry_run_plans_the_same_changes_without_applying_them(
    source: MemorySource,
    target: MemoryTarget,
) {
    let planned = pipeline::run(&source, &target, dry_run(), &CancelToken::new()).expect("plan");
    assert!(planned.dry_run);
    assert!(target.mutations().is_empty());
    assert_eq!(target.user_names(), vec!["bob@x.com", "carol@x.com"]);

    let applied = pipeline::run(&source, &target, SyncOptions::default(), &CancelToken::new())
        .expect("apply");

    assert_eq!(planned.changes, applied.changes);
}

#[rstest]
fn dry_run_skips_membership_checks_for_planned_entities(
    source: MemorySource,
    target: MemoryTarget,
) {
    let report = pipeline::run(&source, &target, dry_run(), &CancelToken::new()).expect("plan");

    // alice and Ops would be created: nothing to ask the target about them.
    let checks: Vec<Call> = target
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::IsMember(..)))
        .collect();
    assert_eq!(
        checks,
        vec![Call::IsMember("Engineers".into(), "carol@x.com".into())]
    );
    assert!(report.changes.contains(&Change::MemberAdded {
        group: "Ops".into(),
        user: "carol@x.com".into(),
    }));
}

#[rstest]
fn cancelled_before_start_touches_nothing(source: MemorySource, target: MemoryTarget) {
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = pipeline::run(&source, &target, SyncOptions::default(), &cancel).unwrap_err();

    assert!(matches!(err, SyncError::Cancelled));
    assert!(target.calls().is_empty());
}

#[rstest]
fn cancellation_from_another_handle_stops_the_run(source: MemorySource) {
    /// Target that cancels the run on the first group listing.
    struct CancellingTarget {
        inner: MemoryTarget,
        cancel: CancelToken,
    }

    impl TargetDirectory for CancellingTarget {
        fn find_user_by_email(&self, email: &Email) -> LookupOutcome<TargetUser> {
            self.inner.find_user_by_email(email)
        }
        fn create_user(&self, user: &NewUser) -> Result<TargetUser, DirectoryError> {
            self.inner.create_user(user)
        }
        fn delete_user(&self, user: &TargetUser) -> Result<(), DirectoryError> {
            self.inner.delete_user(user)
        }
        fn groups(&self) -> Result<BTreeMap<GroupName, TargetGroup>, DirectoryError> {
            self.cancel.cancel();
            self.inner.groups()
        }
        fn create_group(&self, name: &GroupName) -> Result<TargetGroup, DirectoryError> {
            self.inner.create_group(name)
        }
        fn delete_group(&self, group: &TargetGroup) -> Result<(), DirectoryError> {
            self.inner.delete_group(group)
        }
        fn is_member(
            &self,
            user: &TargetUser,
            group: &TargetGroup,
        ) -> Result<bool, DirectoryError> {
            self.inner.is_member(user, group)
        }
        fn add_member(&self, user: &TargetUser, group: &TargetGroup) -> Result<(), DirectoryError> {
            self.inner.add_member(user, group)
        }
        fn remove_member(
            &self,
            user: &TargetUser,
            group: &TargetGroup,
        ) -> Result<(), DirectoryError> {
            self.inner.remove_member(user, group)
        }
    }

    let cancel = CancelToken::new();
    let target = CancellingTarget {
        inner: MemoryTarget::new(),
        cancel: cancel.clone(),
    };

    let err = pipeline::run(&source, &target, SyncOptions::default(), &cancel).unwrap_err();

    assert!(matches!(err, SyncError::Cancelled));
    // Principals were applied; no group was created afterwards.
    assert_eq!(target.inner.user_names(), vec!["alice@x.com", "carol@x.com"]);
    assert!(target.inner.group_names().is_empty());
}

#[test]
fn dry_run_matches_real_run_for_a_recreated_user() {
    init_logging();
    // Google still lists the old account as deleted after the address is
    // reused by a new active user.
    let source = MemorySource::new()
        .user("alice@x.com", "Alice", "Liddell")
        .deleted_user("alice@x.com")
        .group("Engineers", &["alice@x.com"]);
    let target = MemoryTarget::new();
    let alice = target.with_user("alice@x.com");
    let engineers = target.with_group("Engineers");
    target.with_member(&alice, &engineers);

    let planned = pipeline::run(&source, &target, dry_run(), &CancelToken::new()).expect("plan");
    assert!(target.mutations().is_empty());
    assert!(
        !target.calls().iter().any(|c| matches!(c, Call::IsMember(..))),
        "the account planned for deletion is never checked for membership"
    );

    let applied = pipeline::run(&source, &target, SyncOptions::default(), &CancelToken::new())
        .expect("apply");

    assert_eq!(planned.changes, applied.changes);
    assert_eq!(
        applied.changes,
        vec![
            Change::UserDeleted {
                email: Email::from("alice@x.com"),
            },
            Change::UserCreated {
                email: Email::from("alice@x.com"),
            },
            Change::MemberAdded {
                group: GroupName::from("Engineers"),
                user: "alice@x.com".into(),
            },
        ]
    );
    assert_eq!(target.members_of("Engineers"), vec!["alice@x.com"]);
}
