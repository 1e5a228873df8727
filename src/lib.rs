//! marksmith: safe offline editing of Firefox and LibreWolf bookmarks.
//!
//! Edits go to a private staging copy of `places.sqlite`; the browser's file
//! is only replaced by the commit protocol, after a liveness check and a
//! backup, with an atomic swap.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod database;
pub mod managers;
pub mod platform;
pub mod services;
pub mod types;

pub use managers::bookmark_tree::BookmarkTree;
pub use managers::edit_session::EditSession;
pub use managers::staging_store::{StagingState, StagingStore};
pub use services::commit_protocol::{CommitProtocol, CommitReport, FileOps, StdFileOps};
pub use services::liveness_guard::{FixedGuard, LivenessGuard, ProcessScanGuard};
