//! SQLite connection management for marksmith.
//!
//! Provides the [`Database`] struct that wraps a `rusqlite::Connection`
//! opened read-only against a source `places.sqlite`.

use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

use super::{queries, schema};
use crate::managers::bookmark_tree::BookmarkTree;
use crate::types::errors::DatabaseError;

/// Read-only view of a bookmark database.
///
/// The source is opened with `immutable=1`, so SQLite takes no locks and
/// never writes to it even while the browser holds it open. Changes still
/// sitting in the browser's write-ahead log are not visible.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Opens the database at `path` for reading only.
    ///
    /// # Errors
    /// Returns `DatabaseError::Open` if the file does not exist or is not a
    /// SQLite database.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let open_err = |message: String| DatabaseError::Open {
            path: path.display().to_string(),
            message,
        };

        if !path.is_file() {
            return Err(open_err("no such file".to_string()));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(immutable_uri(path), flags)
            .map_err(|e| open_err(e.to_string()))?;

        // Forces SQLite to read the header so a non-database fails here.
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(|e| open_err(e.to_string()))?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens an in-memory database with the bookmark schema and root folders.
    ///
    /// Useful for testing; the database is discarded when the `Database` is dropped.
    ///
    /// # Errors
    /// Returns `DatabaseError::Open` if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let open_err = |e: rusqlite::Error| DatabaseError::Open {
            path: ":memory:".to_string(),
            message: e.to_string(),
        };
        let conn = Connection::open_in_memory().map_err(open_err)?;
        schema::create_places_schema(&conn).map_err(open_err)?;
        Ok(Self { conn, path: None })
    }

    /// Returns a reference to the underlying `rusqlite::Connection`.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// The file this database was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Builds the bookmark tree from the current contents.
    pub fn load_tree(&self) -> Result<BookmarkTree, DatabaseError> {
        load_tree(&self.conn)
    }
}

/// Builds a [`BookmarkTree`] from any connection to a places database.
pub fn load_tree(conn: &Connection) -> Result<BookmarkTree, DatabaseError> {
    let rows = queries::fetch_all_rows(conn).map_err(|e| DatabaseError::Query(e.to_string()))?;
    Ok(BookmarkTree::from_rows(rows)?)
}

/// Builds a `file:` URI with `immutable=1`, escaping the characters SQLite
/// treats specially inside URI paths.
fn immutable_uri(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '?' => escaped.push_str("%3f"),
            '#' => escaped.push_str("%23"),
            _ => escaped.push(c),
        }
    }
    format!("file:{}?immutable=1", escaped)
}
