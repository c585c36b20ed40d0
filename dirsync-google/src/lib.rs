//! # dirsync-google
//!
//! Blocking Google Workspace Admin Directory client for the source directory.
//!
//! [`GoogleDirectory`] authenticates as a service account impersonating a
//! workspace admin and implements [`dirsync_core::SourceDirectory`].

pub mod auth;
pub mod client;
pub mod model;

pub use auth::{ServiceAccountKey, TokenSource, DIRECTORY_SCOPES};
pub use client::GoogleDirectory;
