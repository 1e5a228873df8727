use std::path::PathBuf;

use thiserror::Error;

// === DatabaseError ===

/// Errors raised while reading a bookmark database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The database file could not be opened.
    #[error("Failed to open database {path}: {message}")]
    Open { path: String, message: String },
    /// A query against the database failed.
    #[error("Database query failed: {0}")]
    Query(String),
    /// The rows read from disk do not form a valid tree.
    #[error("Invalid bookmark tree: {0}")]
    Tree(#[from] TreeError),
}

// === TreeError ===

/// Errors related to the in-memory bookmark tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// No row without a parent was found.
    #[error("No root bookmark found")]
    NoRoot,
    /// More than one row without a parent was found.
    #[error("Multiple root bookmarks found: {0} and {1}")]
    MultipleRoots(i64, i64),
    /// The node is not part of the tree.
    #[error("Bookmark node not found: {0}")]
    NotFound(i64),
    /// The node exists but is not a folder.
    #[error("Bookmark node is not a folder: {0}")]
    NotAFolder(i64),
    /// A node with this id is already in the tree.
    #[error("Bookmark node already exists: {0}")]
    Duplicate(i64),
    /// The requested change would detach or loop part of the tree.
    #[error("Invalid tree operation: {0}")]
    InvalidOperation(String),
}

// === StagingError ===

/// Errors related to the private working copy.
#[derive(Debug, Error)]
pub enum StagingError {
    /// Copying, opening or syncing a file failed.
    #[error("Staging I/O failure: {0}")]
    IoFailure(String),
    /// A SQL operation against the working copy failed; the copy is unchanged.
    #[error("Staged mutation failed: {0}")]
    MutationFailed(String),
    /// The referenced row does not exist in the working copy.
    #[error("Staged row not found: {0}")]
    NotFound(String),
    /// A working copy for this source is already open in this process.
    #[error("A staging copy is already open for {0}")]
    AlreadyOpen(PathBuf),
    /// The working copy was already committed, rolled back or closed.
    #[error("Staging copy is no longer open (state: {0})")]
    Closed(String),
    /// Reading the working copy back failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// === CommitError ===

/// Errors raised by the commit protocol.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The browser appears to be running; nothing was written.
    #[error("Cannot commit: {0} is still running (close it first)")]
    SourceLocked(String),
    /// The source's write-ahead log differs from the one copied at staging
    /// time, so something wrote to the source since; nothing was written.
    #[error("Cannot commit: {0} changed since the staging copy was made (roll back and edit again)")]
    SourceChanged(String),
    /// Releasing the working copy failed; nothing was written.
    #[error("Commit I/O failure: {0}")]
    IoFailure(String),
    /// Backing up the original failed; nothing was written.
    #[error("Failed to create backup: {0}")]
    BackupFailed(String),
    /// Replacing the original failed and it was restored from the backup.
    #[error("Failed to swap databases (original restored from backup): {0}")]
    SwapFailed(String),
    /// Replacing the original failed and so did restoring it.
    #[error(
        "Commit failed and the original could not be restored; inspect the original, the backup at {} and the staged copy at {} by hand. Swap error: {swap}. Restore error: {restore}",
        backup.display(),
        staging.display()
    )]
    Unrecoverable {
        swap: String,
        restore: String,
        backup: PathBuf,
        staging: PathBuf,
    },
    /// The working copy was already committed, rolled back or closed.
    #[error("Staging copy is no longer open (state: {0})")]
    Closed(String),
}

impl CommitError {
    /// Whether the session may keep editing and retry the commit.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CommitError::Unrecoverable { .. } | CommitError::Closed(_))
    }
}

// === SessionError ===

/// Errors surfaced by an edit session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error(transparent)]
    Commit(#[from] CommitError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// The operation needs a bookmark but the node is something else.
    #[error("Bookmark node {0} has no URL")]
    NotABookmark(i64),
}

// === ProfileError ===

/// Errors related to browser profile discovery.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Neither a Firefox nor a LibreWolf profile directory exists.
    #[error("Firefox/LibreWolf profile directory not found")]
    NoBrowserDir,
    /// The profile directory has no `profiles.ini`.
    #[error("profiles.ini not found at {0}")]
    MissingProfilesIni(String),
    /// No listed profile contains a `places.sqlite`.
    #[error("No profiles with places.sqlite found")]
    NoProfiles,
    /// Reading profile metadata failed.
    #[error("Profile I/O error: {0}")]
    Io(String),
}

// === ExportError ===

/// Errors related to exporting the tree.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export I/O error: {0}")]
    Io(String),
    #[error("Export serialization error: {0}")]
    Serialization(String),
}

// === AuditError ===

/// Errors related to link auditing.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
