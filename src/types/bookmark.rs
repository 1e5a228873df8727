use serde::{Deserialize, Serialize};
use std::fmt;

/// `moz_bookmarks.type` code for a bookmark row.
pub const TYPE_BOOKMARK: i64 = 1;
/// `moz_bookmarks.type` code for a folder row.
pub const TYPE_FOLDER: i64 = 2;
/// `moz_bookmarks.type` code for a separator row.
pub const TYPE_SEPARATOR: i64 = 3;

/// Row id of a `moz_bookmarks` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

/// Row id of a `moz_places` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The URL record a bookmark points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub url: String,
    pub visit_count: i64,
}

/// What a node is. Only bookmarks carry a place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookmarkKind {
    Bookmark(Place),
    Folder,
    Separator,
}

impl BookmarkKind {
    /// The persisted `type` code.
    pub fn code(&self) -> i64 {
        match self {
            BookmarkKind::Bookmark(_) => TYPE_BOOKMARK,
            BookmarkKind::Folder => TYPE_FOLDER,
            BookmarkKind::Separator => TYPE_SEPARATOR,
        }
    }
}

/// A `moz_bookmarks` row joined with its place, as read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkRow {
    pub id: i64,
    pub kind_code: i64,
    pub fk: Option<i64>,
    pub parent: Option<i64>,
    pub position: i64,
    pub title: Option<String>,
    pub date_added: i64,
    pub last_modified: i64,
    pub guid: String,
    pub url: Option<String>,
    pub visit_count: i64,
}

/// A node in the in-memory bookmark tree.
///
/// Children are held as ids and resolved through the owning
/// [`BookmarkTree`](crate::managers::bookmark_tree::BookmarkTree).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkNode {
    pub id: NodeId,
    pub kind: BookmarkKind,
    pub parent: Option<NodeId>,
    pub position: i64,
    pub title: String,
    /// Microseconds since the Unix epoch.
    pub date_added: i64,
    /// Microseconds since the Unix epoch.
    pub last_modified: i64,
    pub guid: String,
    pub(crate) children: Vec<NodeId>,
}

impl BookmarkNode {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, BookmarkKind::Folder)
    }

    pub fn is_bookmark(&self) -> bool {
        matches!(self.kind, BookmarkKind::Bookmark(_))
    }

    pub fn place(&self) -> Option<&Place> {
        match &self.kind {
            BookmarkKind::Bookmark(place) => Some(place),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.place().map(|p| p.url.as_str())
    }

    /// Child ids in display order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

impl TryFrom<BookmarkRow> for BookmarkNode {
    type Error = String;

    fn try_from(row: BookmarkRow) -> Result<Self, Self::Error> {
        let kind = match (row.kind_code, row.fk) {
            (TYPE_BOOKMARK, Some(fk)) => BookmarkKind::Bookmark(Place {
                id: PlaceId(fk),
                url: row.url.unwrap_or_default(),
                visit_count: row.visit_count,
            }),
            (TYPE_BOOKMARK, None) => {
                return Err(format!("bookmark row {} has no place reference", row.id))
            }
            (TYPE_FOLDER, _) => BookmarkKind::Folder,
            (TYPE_SEPARATOR, _) => BookmarkKind::Separator,
            (code, _) => return Err(format!("row {} has unknown type code {}", row.id, code)),
        };

        Ok(BookmarkNode {
            id: NodeId(row.id),
            kind,
            parent: row.parent.filter(|p| *p != 0).map(NodeId),
            position: row.position,
            title: row.title.unwrap_or_default(),
            date_added: row.date_added,
            last_modified: row.last_modified,
            guid: row.guid,
            children: Vec::new(),
        })
    }
}
