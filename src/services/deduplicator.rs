//! Finds bookmarks that point at the same URL.

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, warn};

use crate::database::queries;
use crate::types::bookmark::{BookmarkNode, NodeId};
use crate::types::errors::DatabaseError;

/// Bookmarks sharing one URL, in id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub url: String,
    pub bookmarks: Vec<BookmarkNode>,
}

/// Groups every bookmark whose URL is also used by another bookmark.
///
/// Groups are sorted by URL. URLs are compared exactly, so two places that
/// differ only in a trailing slash are not duplicates.
pub fn find_duplicates(conn: &Connection) -> Result<Vec<DuplicateGroup>, DatabaseError> {
    let rows = queries::fetch_duplicate_rows(conn)
        .map_err(|e| DatabaseError::Query(e.to_string()))?;

    let mut groups: Vec<DuplicateGroup> = Vec::new();
    for row in rows {
        let node = match BookmarkNode::try_from(row) {
            Ok(node) => node,
            Err(reason) => {
                warn!(%reason, "skipping bookmark row");
                continue;
            }
        };
        let url = node.url().unwrap_or_default().to_string();
        match groups.last_mut() {
            Some(group) if group.url == url => group.bookmarks.push(node),
            _ => groups.push(DuplicateGroup {
                url,
                bookmarks: vec![node],
            }),
        }
    }
    groups.retain(|g| g.bookmarks.len() > 1);

    debug!(groups = groups.len(), "duplicate scan finished");
    Ok(groups)
}

/// Ids of every bookmark in `groups` except the lowest id of each group.
pub fn redundant_ids(groups: &[DuplicateGroup]) -> Vec<NodeId> {
    groups
        .iter()
        .flat_map(|g| g.bookmarks.iter().skip(1).map(|b| b.id))
        .collect()
}
