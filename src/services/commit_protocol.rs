//! Commit Protocol for marksmith.
//!
//! Turns a staging copy back into the source file:
//! liveness check, source-log check, release, backup, atomic swap, cleanup.
//! Every step that fails before the swap leaves the original untouched and
//! the staging copy usable; a failed swap is undone from the backup.
//!
//! The staging copy already holds any frames from the source's write-ahead
//! log, so the source's `-wal` and `-shm` files are moved out of the way
//! before the swap. Left in place, SQLite would replay the old log over the
//! new file.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use ring::digest;
use tracing::{debug, error, info, warn};

use crate::managers::staging_store::{wal_fingerprint, with_sidecars, StagingState, StagingStore};
use crate::services::liveness_guard::LivenessGuard;
use crate::types::errors::CommitError;

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    /// Hex SHA-256 of the bytes now at the original path.
    pub digest: String,
    pub bytes: u64,
    /// Non-fatal problems, such as a backup that could not be deleted.
    pub warnings: Vec<String>,
}

/// File-system operations used by the protocol.
pub trait FileOps {
    /// Copies `from` to `to` and syncs `to`. Returns the byte count.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;
    /// Atomically replaces `to` with the contents of `from`. Returns the hex
    /// SHA-256 and length of the bytes written.
    fn replace(&self, from: &Path, to: &Path) -> io::Result<(String, u64)>;
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// [`FileOps`] backed by `std::fs` and `tempfile`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileOps;

impl FileOps for StdFileOps {
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        let bytes = fs::copy(from, to)?;
        File::open(to)?.sync_all()?;
        Ok(bytes)
    }

    /// Writes into a temp file beside `to`, then renames it over `to`, so a
    /// reader of `to` sees either the old or the new file and nothing between.
    fn replace(&self, from: &Path, to: &Path) -> io::Result<(String, u64)> {
        let dir = to
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut incoming = tempfile::Builder::new()
            .prefix(".marksmith-incoming-")
            .tempfile_in(dir)?;

        let mut src = File::open(from)?;
        let mut ctx = digest::Context::new(&digest::SHA256);
        let mut buf = vec![0u8; 64 * 1024];
        let mut bytes = 0u64;
        loop {
            let n = src.read(&mut buf)?;
            if n == 0 {
                break;
            }
            ctx.update(&buf[..n]);
            incoming.write_all(&buf[..n])?;
            bytes += n as u64;
        }
        incoming.as_file().sync_all()?;

        if let Ok(meta) = fs::metadata(to) {
            note_soft_failure(
                "copying permissions",
                to,
                fs::set_permissions(incoming.path(), meta.permissions()),
            );
        }
        incoming.persist(to).map_err(|e| e.error)?;

        #[cfg(unix)]
        note_soft_failure("syncing directory", dir, File::open(dir).and_then(|d| d.sync_all()));

        Ok((hex_encode(ctx.finish().as_ref()), bytes))
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Logs a step whose failure does not affect the data written.
fn note_soft_failure(step: &str, path: &Path, result: io::Result<()>) {
    if let Err(e) = result {
        warn!(step, path = %path.display(), error = %e, "file operation failed, continuing");
    }
}

fn remove_if_present(files: &dyn FileOps, path: &Path) -> io::Result<()> {
    match files.remove(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// `<original>.backup`, next to the original.
pub fn backup_path_for(original: &Path) -> PathBuf {
    let mut name = OsString::from(original.as_os_str());
    name.push(".backup");
    PathBuf::from(name)
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Drives one commit of a [`StagingStore`].
pub struct CommitProtocol<'a> {
    guard: &'a dyn LivenessGuard,
    files: &'a dyn FileOps,
}

impl<'a> CommitProtocol<'a> {
    pub fn new(guard: &'a dyn LivenessGuard) -> Self {
        Self {
            guard,
            files: &StdFileOps,
        }
    }

    pub fn with_file_ops(guard: &'a dyn LivenessGuard, files: &'a dyn FileOps) -> Self {
        Self { guard, files }
    }

    /// Makes the staging copy the new source file.
    ///
    /// The liveness guard is consulted once, at the start. A browser that
    /// starts between that check and the swap is not detected; nothing here
    /// holds a lock on the original.
    ///
    /// # Errors
    /// - `SourceLocked`, `SourceChanged`, `IoFailure`, `BackupFailed`: nothing
    ///   was written and the store is still open.
    /// - `SwapFailed`: the original and its write-ahead log were restored
    ///   from the backup and the store is still open.
    /// - `Unrecoverable`: the original may be damaged; the backup and the
    ///   staging copy are both left on disk and the store is closed.
    pub fn commit(&self, store: &mut StagingStore) -> Result<CommitReport, CommitError> {
        store.ensure_open()?;
        let span = store.span().clone();
        let _entered = span.enter();

        if let Some(process) = self.guard.owner_running() {
            warn!(%process, "commit refused: browser is running");
            return Err(CommitError::SourceLocked(process));
        }

        let original = store.source_path().to_path_buf();
        let [_, original_wal, original_shm] = with_sidecars(&original);
        let current_wal = wal_fingerprint(&original)
            .map_err(|e| CommitError::IoFailure(format!("cannot read source WAL: {}", e)))?;
        if current_wal.as_deref() != store.source_wal() {
            warn!(wal = %original_wal.display(), "commit refused: source WAL changed");
            return Err(CommitError::SourceChanged(original_wal.display().to_string()));
        }

        store.release()?;

        let staging = store.staging_path().to_path_buf();
        let backup = backup_path_for(&original);
        let [_, backup_wal, _] = with_sidecars(&backup);
        let has_wal = current_wal.is_some();
        let backups: Vec<&Path> = if has_wal {
            vec![backup.as_path(), backup_wal.as_path()]
        } else {
            vec![backup.as_path()]
        };

        let backed_up = self.files.copy(&original, &backup).and_then(|_| {
            if has_wal {
                self.files.copy(&original_wal, &backup_wal).map(|_| ())
            } else {
                Ok(())
            }
        });
        if let Err(e) = backed_up {
            self.discard_backups(&backups);
            warn!(error = %e, "backup failed, commit aborted");
            return Err(self.abort(store, CommitError::BackupFailed(e.to_string())));
        }

        // The shared-memory index is rebuilt by SQLite, so it goes first.
        let cleared = remove_if_present(self.files, &original_shm)
            .and_then(|()| remove_if_present(self.files, &original_wal));
        if let Err(e) = cleared {
            self.discard_backups(&backups);
            warn!(error = %e, "could not clear source side files, commit aborted");
            return Err(self.abort(
                store,
                CommitError::IoFailure(format!("cannot remove {}: {}", original_wal.display(), e)),
            ));
        }

        let (digest, bytes) = match self.files.replace(&staging, &original) {
            Ok(done) => done,
            Err(swap) => {
                warn!(error = %swap, "swap failed, restoring original from backup");
                let restored = self.files.replace(&backup, &original).and_then(|_| {
                    if has_wal {
                        self.files.replace(&backup_wal, &original_wal).map(|_| ())
                    } else {
                        Ok(())
                    }
                });
                return match restored {
                    Ok(()) => {
                        self.discard_backups(&backups);
                        Err(self.abort(store, CommitError::SwapFailed(swap.to_string())))
                    }
                    Err(restore) => {
                        error!(
                            backup = %backup.display(),
                            staging = %staging.display(),
                            "restore from backup failed; manual inspection required"
                        );
                        store.finish(StagingState::Closed);
                        Err(CommitError::Unrecoverable {
                            swap: swap.to_string(),
                            restore: restore.to_string(),
                            backup: backup.clone(),
                            staging,
                        })
                    }
                };
            }
        };

        let mut warnings = Vec::new();
        for path in with_sidecars(&staging) {
            if let Err(e) = remove_if_present(self.files, &path) {
                warnings.push(format!("could not remove {}: {}", path.display(), e));
            }
        }
        for path in &backups {
            if let Err(e) = self.files.remove(path) {
                warnings.push(format!("could not remove backup {}: {}", path.display(), e));
            }
        }
        for w in &warnings {
            warn!("{}", w);
        }

        store.finish(StagingState::Committed);
        info!(%digest, bytes, "commit complete");
        Ok(CommitReport {
            digest,
            bytes,
            warnings,
        })
    }

    /// Best-effort removal of backups that will not be needed.
    fn discard_backups(&self, backups: &[&Path]) {
        for path in backups {
            if let Err(e) = remove_if_present(self.files, path) {
                debug!(path = %path.display(), error = %e, "could not remove unused backup");
            }
        }
    }

    /// Puts the store back in a usable state after a non-destructive failure.
    fn abort(&self, store: &mut StagingStore, err: CommitError) -> CommitError {
        match store.reopen() {
            Ok(()) => err,
            Err(reopen) => CommitError::IoFailure(format!(
                "{}; reopening the staging copy also failed: {}",
                err, reopen
            )),
        }
    }
}
