//! Staging Store for marksmith.
//!
//! Owns a private, writable copy of a source `places.sqlite`. Every mutation
//! runs against the copy; the source is read once at creation and only
//! written again by the commit protocol.

use std::collections::HashSet;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, info_span, warn, Span};

use crate::database::connection::load_tree;
use crate::database::queries;
use crate::database::schema::{MENU_GUID, TOOLBAR_GUID, TOOLBAR_TITLES};
use crate::managers::bookmark_tree::BookmarkTree;
use crate::services::commit_protocol::{hex_encode, CommitProtocol, CommitReport};
use crate::services::liveness_guard::LivenessGuard;
use crate::types::bookmark::{BookmarkNode, NodeId, PlaceId, TYPE_BOOKMARK, TYPE_FOLDER};
use crate::types::errors::{CommitError, StagingError};

/// Lifecycle of a staging copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingState {
    /// Copy materialised, no mutation applied yet.
    Created,
    /// At least one mutation changed the copy.
    Dirty,
    Committed,
    RolledBack,
    Closed,
}

impl StagingState {
    pub fn is_open(self) -> bool {
        matches!(self, StagingState::Created | StagingState::Dirty)
    }
}

impl fmt::Display for StagingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StagingState::Created => "created",
            StagingState::Dirty => "dirty",
            StagingState::Committed => "committed",
            StagingState::RolledBack => "rolled back",
            StagingState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Canonical source paths with an open staging copy in this process.
fn open_sources() -> &'static Mutex<HashSet<PathBuf>> {
    static OPEN: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();
    OPEN.get_or_init(|| Mutex::new(HashSet::new()))
}

fn claim(source: &Path) -> bool {
    open_sources()
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(source.to_path_buf())
}

fn unclaim(source: &Path) {
    open_sources()
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .remove(source);
}

/// Deterministic working-copy path for `source` in this process.
pub fn staging_path_for(source: &Path) -> PathBuf {
    let path_digest = digest::digest(&digest::SHA256, source.to_string_lossy().as_bytes());
    let hex = hex_encode(path_digest.as_ref());
    env::temp_dir().join(format!(
        "marksmith-staging-{}-{}.sqlite",
        process::id(),
        &hex[..16]
    ))
}

/// The database file plus the side files SQLite may leave next to it.
pub(crate) fn with_sidecars(path: &Path) -> [PathBuf; 3] {
    let mut wal = path.as_os_str().to_owned();
    wal.push("-wal");
    let mut shm = path.as_os_str().to_owned();
    shm.push("-shm");
    [path.to_path_buf(), PathBuf::from(wal), PathBuf::from(shm)]
}

/// Reads a write-ahead log. `None` when it is missing or empty.
fn read_wal(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(None),
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex_encode(digest::digest(&digest::SHA256, bytes).as_ref())
}

/// Hex SHA-256 of the write-ahead log next to `database`, `None` if it has none.
pub(crate) fn wal_fingerprint(database: &Path) -> std::io::Result<Option<String>> {
    let [_, wal, _] = with_sidecars(database);
    Ok(read_wal(&wal)?.map(|bytes| sha256_hex(&bytes)))
}

/// Current time in microseconds since the Unix epoch.
pub fn now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as i64
}

/// A fresh 12-character places GUID.
fn new_guid() -> Result<String, StagingError> {
    let mut bytes = [0u8; 9];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| StagingError::MutationFailed("failed to generate GUID".to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// `moz_places.rev_host`: the lowercased host reversed, with a trailing dot.
fn reversed_host(url: &str) -> String {
    let rest = match url.find("://") {
        Some(i) => &url[i + 3..],
        None => return String::new(),
    };
    let authority = rest.split(&['/', '?', '#'][..]).next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    let host = if host_port.starts_with('[') {
        host_port
    } else {
        host_port.split(':').next().unwrap_or_default()
    };
    let mut reversed: String = host.to_lowercase().chars().rev().collect();
    reversed.push('.');
    reversed
}

fn sql_err(e: rusqlite::Error) -> StagingError {
    StagingError::MutationFailed(e.to_string())
}

fn io_err(context: &str, e: impl fmt::Display) -> StagingError {
    StagingError::IoFailure(format!("{}: {}", context, e))
}

/// Private writable copy of a source bookmark database.
pub struct StagingStore {
    source: PathBuf,
    staging_path: PathBuf,
    conn: Option<Connection>,
    state: StagingState,
    /// SHA-256 of the source's write-ahead log when the copy was taken.
    source_wal: Option<String>,
    span: Span,
}

impl StagingStore {
    /// Copies `source` into a private working copy and opens it.
    ///
    /// Logging for the store is recorded under a span parented to the
    /// caller's current span.
    pub fn create<P: AsRef<Path>>(source: P) -> Result<Self, StagingError> {
        Self::create_in(source, &Span::current())
    }

    /// Like [`create`](Self::create), parenting the store's span to `parent`.
    ///
    /// # Errors
    /// `AlreadyOpen` if this process already stages `source`; `IoFailure` if
    /// the source cannot be read or the copy cannot be written or opened. The
    /// partial copy is removed on failure.
    pub fn create_in<P: AsRef<Path>>(source: P, parent: &Span) -> Result<Self, StagingError> {
        let source = fs::canonicalize(source.as_ref())
            .map_err(|e| io_err(&format!("cannot resolve {}", source.as_ref().display()), e))?;
        if !claim(&source) {
            return Err(StagingError::AlreadyOpen(source));
        }

        let staging_path = staging_path_for(&source);
        let span = info_span!(parent: parent, "staging", source = %source.display());

        match materialize(&source, &staging_path) {
            Ok((conn, source_wal)) => {
                info!(
                    parent: &span,
                    staging = %staging_path.display(),
                    with_wal = source_wal.is_some(),
                    "staging copy created"
                );
                Ok(Self {
                    source,
                    staging_path,
                    conn: Some(conn),
                    state: StagingState::Created,
                    source_wal,
                    span,
                })
            }
            Err(e) => {
                for path in with_sidecars(&staging_path) {
                    let _ = fs::remove_file(path);
                }
                unclaim(&source);
                warn!(parent: &span, error = %e, "failed to create staging copy");
                Err(e)
            }
        }
    }

    pub fn state(&self) -> StagingState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == StagingState::Dirty
    }

    /// The canonical path of the source file.
    pub fn source_path(&self) -> &Path {
        &self.source
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    fn conn(&self) -> Result<&Connection, StagingError> {
        if !self.state.is_open() {
            return Err(StagingError::Closed(self.state.to_string()));
        }
        self.conn
            .as_ref()
            .ok_or_else(|| StagingError::Closed("released".to_string()))
    }

    fn conn_mut(&mut self) -> Result<&mut Connection, StagingError> {
        if !self.state.is_open() {
            return Err(StagingError::Closed(self.state.to_string()));
        }
        self.conn
            .as_mut()
            .ok_or_else(|| StagingError::Closed("released".to_string()))
    }

    fn mark_dirty(&mut self) {
        if self.state == StagingState::Created {
            self.state = StagingState::Dirty;
        }
    }

    /// Sets a node's title. Returns the new `lastModified`, or `None` when the
    /// title was already `title` and nothing was written.
    pub fn update_title(&mut self, id: NodeId, title: &str) -> Result<Option<i64>, StagingError> {
        let conn = self.conn()?;
        let current: Option<String> = conn
            .query_row(
                "SELECT title FROM moz_bookmarks WHERE id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)?
            .ok_or_else(|| StagingError::NotFound(format!("bookmark {}", id)))?;

        if current.as_deref().unwrap_or_default() == title {
            debug!(parent: &self.span, %id, "title unchanged, skipping");
            return Ok(None);
        }

        let now = now_micros();
        conn.execute(
            "UPDATE moz_bookmarks SET title = ?1, lastModified = ?2 WHERE id = ?3",
            params![title, now, id.0],
        )
        .map_err(sql_err)?;

        debug!(parent: &self.span, %id, "title staged");
        self.mark_dirty();
        Ok(Some(now))
    }

    /// Sets the URL of a place record. Bookmark rows are not touched.
    /// Returns `false` when the URL was already `url`.
    pub fn update_url(&mut self, place: PlaceId, url: &str) -> Result<bool, StagingError> {
        let conn = self.conn()?;
        let current: Option<String> = conn
            .query_row(
                "SELECT url FROM moz_places WHERE id = ?1",
                params![place.0],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)?
            .ok_or_else(|| StagingError::NotFound(format!("place {}", place)))?;

        if current.as_deref() == Some(url) {
            debug!(parent: &self.span, %place, "url unchanged, skipping");
            return Ok(false);
        }

        conn.execute(
            "UPDATE moz_places SET url = ?1, rev_host = ?2 WHERE id = ?3",
            params![url, reversed_host(url), place.0],
        )
        .map_err(sql_err)?;

        debug!(parent: &self.span, %place, "url staged");
        self.mark_dirty();
        Ok(true)
    }

    /// Deletes a bookmark or separator row. Folders are refused; the place
    /// record stays since other bookmarks may reference it.
    pub fn delete(&mut self, id: NodeId) -> Result<(), StagingError> {
        let conn = self.conn()?;
        let kind: i64 = conn
            .query_row(
                "SELECT type FROM moz_bookmarks WHERE id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)?
            .ok_or_else(|| StagingError::NotFound(format!("bookmark {}", id)))?;

        if kind == TYPE_FOLDER {
            return Err(StagingError::MutationFailed(format!(
                "{} is a folder; folder deletion is not supported",
                id
            )));
        }

        conn.execute("DELETE FROM moz_bookmarks WHERE id = ?1", params![id.0])
            .map_err(sql_err)?;

        debug!(parent: &self.span, %id, "delete staged");
        self.mark_dirty();
        Ok(())
    }

    /// Reparents and repositions a node in one transaction.
    ///
    /// Siblings in the new parent at or after `position` move up by one.
    /// Returns the node's new `lastModified`.
    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        position: i64,
    ) -> Result<i64, StagingError> {
        if position < 0 {
            return Err(StagingError::MutationFailed(format!(
                "invalid position {}",
                position
            )));
        }

        let conn = self.conn_mut()?;
        let tx = conn.transaction().map_err(sql_err)?;

        let parent: Option<i64> = tx
            .query_row(
                "SELECT parent FROM moz_bookmarks WHERE id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)?
            .ok_or_else(|| StagingError::NotFound(format!("bookmark {}", id)))?;
        if parent.unwrap_or(0) == 0 {
            return Err(StagingError::MutationFailed("cannot move the root".to_string()));
        }

        require_folder(&tx, new_parent)?;

        // Walk up from the destination; meeting `id` means a cycle.
        let mut cursor = Some(new_parent.0);
        while let Some(current) = cursor {
            if current == id.0 {
                return Err(StagingError::MutationFailed(format!(
                    "cannot move {} into its own subtree",
                    id
                )));
            }
            cursor = tx
                .query_row(
                    "SELECT parent FROM moz_bookmarks WHERE id = ?1",
                    params![current],
                    |row| row.get::<_, Option<i64>>(0),
                )
                .optional()
                .map_err(sql_err)?
                .flatten()
                .filter(|p| *p != 0);
        }

        let now = now_micros();
        tx.execute(
            "UPDATE moz_bookmarks SET position = position + 1 \
             WHERE parent = ?1 AND position >= ?2 AND id != ?3",
            params![new_parent.0, position, id.0],
        )
        .map_err(sql_err)?;
        tx.execute(
            "UPDATE moz_bookmarks SET parent = ?1, position = ?2, lastModified = ?3 WHERE id = ?4",
            params![new_parent.0, position, now, id.0],
        )
        .map_err(sql_err)?;
        tx.commit().map_err(sql_err)?;

        debug!(parent: &self.span, %id, %new_parent, position, "move staged");
        self.mark_dirty();
        Ok(now)
    }

    /// Adds a bookmark at the end of `parent`, reusing the place with the
    /// exact same URL if one exists. Both inserts happen in one transaction.
    pub fn add(&mut self, parent: NodeId, title: &str, url: &str) -> Result<NodeId, StagingError> {
        if url.is_empty() {
            return Err(StagingError::MutationFailed("URL must not be empty".to_string()));
        }
        let bookmark_guid = new_guid()?;
        let place_guid = new_guid()?;

        let conn = self.conn_mut()?;
        let tx = conn.transaction().map_err(sql_err)?;

        require_folder(&tx, parent)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM moz_places WHERE url = ?1 ORDER BY id LIMIT 1",
                params![url],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)?;
        let place_id = match existing {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO moz_places (url, title, rev_host, hidden, typed, frecency, guid) \
                     VALUES (?1, ?2, ?3, 0, 0, -1, ?4)",
                    params![url, title, reversed_host(url), place_guid],
                )
                .map_err(sql_err)?;
                tx.last_insert_rowid()
            }
        };

        let position = next_position(&tx, parent)?;
        let now = now_micros();
        tx.execute(
            "INSERT INTO moz_bookmarks (type, fk, parent, position, title, dateAdded, lastModified, guid) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![TYPE_BOOKMARK, place_id, parent.0, position, title, now, now, bookmark_guid],
        )
        .map_err(sql_err)?;
        let id = NodeId(tx.last_insert_rowid());
        tx.commit().map_err(sql_err)?;

        debug!(parent: &self.span, %id, %parent, position, "add staged");
        self.mark_dirty();
        Ok(id)
    }

    /// Finds the folder titled `title` directly under the bookmarks menu
    /// (or the toolbar when there is no menu), creating it at the end if
    /// absent. Returns the folder id and whether it was created.
    pub fn find_or_create_scratch_folder(&mut self, title: &str) -> Result<(NodeId, bool), StagingError> {
        let folder_guid = new_guid()?;
        let conn = self.conn_mut()?;
        let tx = conn.transaction().map_err(sql_err)?;

        let container = find_container(&tx)?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM moz_bookmarks WHERE type = ?1 AND title = ?2 AND parent = ?3 \
                 ORDER BY id LIMIT 1",
                params![TYPE_FOLDER, title, container],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)?;
        if let Some(id) = existing {
            return Ok((NodeId(id), false));
        }

        let position = next_position(&tx, NodeId(container))?;
        let now = now_micros();
        tx.execute(
            "INSERT INTO moz_bookmarks (type, fk, parent, position, title, dateAdded, lastModified, guid) \
             VALUES (?1, NULL, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![TYPE_FOLDER, container, position, title, now, now, folder_guid],
        )
        .map_err(sql_err)?;
        let id = NodeId(tx.last_insert_rowid());
        tx.commit().map_err(sql_err)?;

        info!(parent: &self.span, %id, title, "scratch folder created");
        self.mark_dirty();
        Ok((id, true))
    }

    /// Reads one node back from the working copy.
    pub fn load_row(&self, id: NodeId) -> Result<BookmarkNode, StagingError> {
        let row = queries::fetch_row(self.conn()?, id.0)
            .map_err(sql_err)?
            .ok_or_else(|| StagingError::NotFound(format!("bookmark {}", id)))?;
        BookmarkNode::try_from(row).map_err(StagingError::MutationFailed)
    }

    /// Rebuilds the full tree from the working copy.
    pub fn load_tree(&self) -> Result<BookmarkTree, StagingError> {
        Ok(load_tree(self.conn()?)?)
    }

    /// Runs the commit protocol with the standard file operations.
    pub fn commit(&mut self, guard: &dyn LivenessGuard) -> Result<CommitReport, CommitError> {
        CommitProtocol::new(guard).commit(self)
    }

    /// Discards the working copy. The source file is not touched.
    pub fn rollback(&mut self) -> Result<(), StagingError> {
        if !self.state.is_open() {
            return Err(StagingError::Closed(self.state.to_string()));
        }
        self.discard(StagingState::RolledBack)
    }

    /// Discards the working copy; a no-op on a store that is already finished.
    pub fn close(&mut self) -> Result<(), StagingError> {
        if !self.state.is_open() {
            return Ok(());
        }
        self.discard(StagingState::Closed)
    }

    fn discard(&mut self, next: StagingState) -> Result<(), StagingError> {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                warn!(parent: &self.span, error = %e, "closing staging connection failed");
            }
        }

        let mut failure = None;
        for path in with_sidecars(&self.staging_path) {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => failure = Some(io_err(&format!("cannot remove {}", path.display()), e)),
            }
        }

        self.finish(next);
        info!(parent: &self.span, state = %next, "staging copy discarded");
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // --- hooks for the commit protocol ---

    /// Fingerprint of the source's write-ahead log taken at creation.
    pub(crate) fn source_wal(&self) -> Option<&str> {
        self.source_wal.as_deref()
    }

    pub(crate) fn ensure_open(&self) -> Result<(), CommitError> {
        if self.state.is_open() && self.conn.is_some() {
            Ok(())
        } else {
            Err(CommitError::Closed(self.state.to_string()))
        }
    }

    /// Checkpoints the write-ahead log into the main file and closes the
    /// connection so no handle stays open on the copy.
    pub(crate) fn release(&mut self) -> Result<(), CommitError> {
        let conn = self
            .conn
            .take()
            .ok_or_else(|| CommitError::Closed("released".to_string()))?;

        if let Err(e) = conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(())) {
            self.conn = Some(conn);
            return Err(CommitError::IoFailure(format!("checkpoint failed: {}", e)));
        }
        match conn.close() {
            Ok(()) => Ok(()),
            Err((conn, e)) => {
                self.conn = Some(conn);
                Err(CommitError::IoFailure(format!(
                    "failed to close staging connection: {}",
                    e
                )))
            }
        }
    }

    /// Reopens the working copy after an aborted commit.
    pub(crate) fn reopen(&mut self) -> Result<(), CommitError> {
        let conn = open_working_copy(&self.staging_path)
            .map_err(|e| CommitError::IoFailure(e.to_string()))?;
        self.conn = Some(conn);
        Ok(())
    }

    /// Moves to a terminal state and releases this process's claim on the source.
    pub(crate) fn finish(&mut self, next: StagingState) {
        self.conn = None;
        self.state = next;
        unclaim(&self.source);
    }
}

impl Drop for StagingStore {
    fn drop(&mut self) {
        if self.state.is_open() {
            if let Err(e) = self.discard(StagingState::Closed) {
                warn!(parent: &self.span, error = %e, "failed to clean up staging copy");
            }
        }
    }
}

/// Copies the source and, if present, its write-ahead log. Frames left in
/// the log by an unclean browser exit are part of the database and are
/// replayed when the copy is opened.
fn materialize(
    source: &Path,
    staging_path: &Path,
) -> Result<(Connection, Option<String>), StagingError> {
    let [_, source_wal, _] = with_sidecars(source);
    let [_, staging_wal, staging_shm] = with_sidecars(staging_path);
    for stale in [&staging_wal, &staging_shm] {
        match fs::remove_file(stale) {
            Ok(()) => debug!(path = %stale.display(), "removed stale staging side file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(&format!("cannot remove {}", stale.display()), e)),
        }
    }

    fs::copy(source, staging_path).map_err(|e| io_err("cannot copy source", e))?;
    fs::File::open(staging_path)
        .and_then(|f| f.sync_all())
        .map_err(|e| io_err("cannot sync staging copy", e))?;

    let wal = read_wal(&source_wal).map_err(|e| io_err("cannot read source WAL", e))?;
    let fingerprint = match wal {
        Some(bytes) => {
            fs::write(&staging_wal, &bytes)
                .and_then(|()| fs::File::open(&staging_wal)?.sync_all())
                .map_err(|e| io_err("cannot copy source WAL", e))?;
            Some(sha256_hex(&bytes))
        }
        None => None,
    };

    Ok((open_working_copy(staging_path)?, fingerprint))
}

fn open_working_copy(path: &Path) -> Result<Connection, StagingError> {
    let conn = Connection::open(path).map_err(|e| io_err("cannot open staging copy", e))?;
    let mode: String = conn
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
        .map_err(|e| io_err("cannot enable WAL", e))?;
    if !mode.eq_ignore_ascii_case("wal") {
        return Err(StagingError::IoFailure(format!(
            "journal_mode is {} instead of wal",
            mode
        )));
    }
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(|e| io_err("cannot set synchronous mode", e))?;
    // Fails fast on a file that is not a database.
    conn.query_row("SELECT COUNT(*) FROM moz_bookmarks", [], |row| row.get::<_, i64>(0))
        .map_err(|e| io_err("not a bookmark database", e))?;
    Ok(conn)
}

fn require_folder(conn: &Connection, id: NodeId) -> Result<(), StagingError> {
    let kind: i64 = conn
        .query_row(
            "SELECT type FROM moz_bookmarks WHERE id = ?1",
            params![id.0],
            |row| row.get(0),
        )
        .optional()
        .map_err(sql_err)?
        .ok_or_else(|| StagingError::NotFound(format!("folder {}", id)))?;
    if kind != TYPE_FOLDER {
        return Err(StagingError::MutationFailed(format!("{} is not a folder", id)));
    }
    Ok(())
}

fn next_position(conn: &Connection, parent: NodeId) -> Result<i64, StagingError> {
    conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1 FROM moz_bookmarks WHERE parent = ?1",
        params![parent.0],
        |row| row.get(0),
    )
    .map_err(sql_err)
}

/// The folder scratch folders live in: menu, toolbar, then a toolbar by title.
fn find_container(conn: &Connection) -> Result<i64, StagingError> {
    for guid in [MENU_GUID, TOOLBAR_GUID] {
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM moz_bookmarks WHERE guid = ?1 AND type = ?2",
                params![guid, TYPE_FOLDER],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)?;
        if let Some(id) = found {
            return Ok(id);
        }
    }
    conn.query_row(
        "SELECT id FROM moz_bookmarks WHERE type = ?1 AND title IN (?2, ?3, ?4) ORDER BY id LIMIT 1",
        params![TYPE_FOLDER, TOOLBAR_TITLES[0], TOOLBAR_TITLES[1], TOOLBAR_TITLES[2]],
        |row| row.get(0),
    )
    .optional()
    .map_err(sql_err)?
    .ok_or_else(|| StagingError::NotFound("bookmarks menu or toolbar folder".to_string()))
}
