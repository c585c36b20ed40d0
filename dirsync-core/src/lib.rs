//! dirsync core library: directory domain types, port traits, errors, config.
//!
//! Public API surface:
//! - [`types`]: newtypes and directory entities for both sides
//! - [`port`]: [`SourceDirectory`] / [`TargetDirectory`] traits
//! - [`error`]: [`DirectoryError`], [`ConfigError`]
//! - [`config`]: YAML config load / validate / credential loading

pub mod config;
pub mod error;
pub mod port;
pub mod types;

pub use config::{LogFormat, LookupErrorPolicy, SyncConfig};
pub use error::{ConfigError, DirectoryError};
pub use port::{LookupOutcome, SourceDirectory, TargetDirectory};
pub use types::{
    Email, GroupName, NewUser, SourceGroup, SourceMember, SourceUser, TargetGroup, TargetUser,
    UserName,
};
