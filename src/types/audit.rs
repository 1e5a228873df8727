use serde::{Deserialize, Serialize};

use super::bookmark::NodeId;

/// Outcome of probing one bookmark URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkStatus {
    Alive,
    Dead,
    TimedOut,
}

/// A bookmark URL handed to the auditor. Owned, so the auditor never
/// borrows the live tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTarget {
    pub node: NodeId,
    pub title: String,
    pub url: String,
}

/// Per-bookmark audit result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResult {
    pub node: NodeId,
    pub url: String,
    pub status: LinkStatus,
    pub status_code: Option<u16>,
}
