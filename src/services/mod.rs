// marksmith services
// Services provide the commit protocol, liveness checks, settings, profile discovery, dedup, export, and link auditing.

pub mod commit_protocol;
pub mod deduplicator;
pub mod exporter;
#[cfg(feature = "audit")]
pub mod link_auditor;
pub mod liveness_guard;
pub mod profile_discovery;
pub mod settings_engine;
