//! # dirsync-scim
//!
//! Blocking SCIM 2.0 client (RFC 7644) for the target directory.
//!
//! [`ScimClient`] speaks the subset of the protocol the reconciler needs and
//! implements [`dirsync_core::TargetDirectory`] on top of it.

pub mod client;
pub mod model;
mod target;

pub use client::ScimClient;
