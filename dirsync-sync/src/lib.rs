//! # dirsync-sync
//!
//! One-way reconciliation of users, groups and memberships from a source
//! directory into a target directory.
//!
//! Call [`pipeline::run_with_config`] to build both directory clients from a
//! [`dirsync_core::SyncConfig`] and run a full sync, or [`pipeline::run`] to
//! drive any pair of port implementations.

pub mod cancel;
pub mod correlation;
pub mod error;
pub mod pipeline;
pub mod reconciler;
pub mod report;

pub use cancel::CancelToken;
pub use correlation::CorrelationTable;
pub use error::SyncError;
pub use reconciler::{Reconciler, SyncOptions};
pub use report::{Change, LookupFailure, SyncReport};
