//! Edit session: the in-memory tree plus the staging copy behind it.
//!
//! The tree is loaded read-only from the source. The first mutation creates
//! a [`StagingStore`] and rebuilds the tree from it. Every mutation is
//! applied to the staging copy first and then mirrored into the tree, so the
//! tree always shows the staged state.

use std::path::{Path, PathBuf};

use tracing::{info, info_span, warn, Span};

use crate::database::Database;
use crate::managers::bookmark_tree::BookmarkTree;
use crate::managers::staging_store::StagingStore;
use crate::services::commit_protocol::{CommitProtocol, CommitReport};
use crate::services::liveness_guard::LivenessGuard;
use crate::types::bookmark::NodeId;
use crate::types::errors::{SessionError, StagingError, TreeError};
use crate::types::settings::AppSettings;

pub struct EditSession {
    source: PathBuf,
    tree: BookmarkTree,
    store: Option<StagingStore>,
    scratch_title: String,
    span: Span,
}

impl EditSession {
    /// Loads the tree from `source` without writing to it.
    pub fn open<P: AsRef<Path>>(source: P, settings: &AppSettings) -> Result<Self, SessionError> {
        Self::open_in(source, settings, &Span::current())
    }

    /// Like [`open`](Self::open), recording under a span parented to `parent`.
    pub fn open_in<P: AsRef<Path>>(
        source: P,
        settings: &AppSettings,
        parent: &Span,
    ) -> Result<Self, SessionError> {
        let source = source.as_ref().to_path_buf();
        let span = info_span!(parent: parent, "session", source = %source.display());
        let tree = Database::open_read_only(&source)?.load_tree()?;
        info!(parent: &span, nodes = tree.len(), "bookmarks loaded");

        Ok(Self {
            source,
            tree,
            store: None,
            scratch_title: settings.general.scratch_folder_title.clone(),
            span,
        })
    }

    pub fn tree(&self) -> &BookmarkTree {
        &self.tree
    }

    pub fn source_path(&self) -> &Path {
        &self.source
    }

    /// The staging copy, if a mutation has created one.
    pub fn staging(&self) -> Option<&StagingStore> {
        self.store.as_ref()
    }

    pub fn has_pending_changes(&self) -> bool {
        self.store.as_ref().map_or(false, StagingStore::is_dirty)
    }

    fn store_mut(&mut self) -> Result<&mut StagingStore, SessionError> {
        if self.store.is_none() {
            let store = StagingStore::create_in(&self.source, &self.span)?;
            // The source may have moved on since `open`; the copy is what gets edited.
            let tree = store.load_tree()?;
            if tree != self.tree {
                info!(parent: &self.span, "source changed since open, tree reloaded from staging copy");
            }
            self.tree = tree;
            self.store = Some(store);
        }
        self.store
            .as_mut()
            .ok_or_else(|| StagingError::Closed("not staged".to_string()).into())
    }

    /// Applies `step` to the tree; on failure rebuilds the tree from the
    /// staging copy, which already holds the change.
    fn mirror<F>(&mut self, what: &str, step: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut BookmarkTree) -> Result<(), TreeError>,
    {
        if let Err(e) = step(&mut self.tree) {
            warn!(parent: &self.span, operation = what, error = %e, "tree mirror failed, reloading from staging copy");
            let store = self
                .store
                .as_ref()
                .ok_or_else(|| StagingError::Closed("not staged".to_string()))?;
            self.tree = store.load_tree()?;
        }
        Ok(())
    }

    /// Renames a node. Returns `false` if the title was already `title`.
    pub fn update_title(&mut self, id: NodeId, title: &str) -> Result<bool, SessionError> {
        match self.store_mut()?.update_title(id, title)? {
            Some(modified) => {
                self.mirror("set_title", |tree| tree.set_title(id, title, modified))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Changes the URL of the place behind bookmark `id`. Every bookmark
    /// sharing that place sees the new URL.
    pub fn update_url(&mut self, id: NodeId, url: &str) -> Result<bool, SessionError> {
        let place = self
            .tree
            .get(id)
            .ok_or(TreeError::NotFound(id.0))?
            .place()
            .map(|p| p.id)
            .ok_or(SessionError::NotABookmark(id.0))?;

        let changed = self.store_mut()?.update_url(place, url)?;
        if changed {
            self.mirror("set_place_url", |tree| {
                tree.set_place_url(place, url);
                Ok(())
            })?;
        }
        Ok(changed)
    }

    pub fn delete(&mut self, id: NodeId) -> Result<(), SessionError> {
        self.store_mut()?.delete(id)?;
        self.mirror("remove", |tree| tree.remove(id).map(|_| ()))
    }

    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        position: i64,
    ) -> Result<(), SessionError> {
        let modified = self.store_mut()?.move_node(id, new_parent, position)?;
        self.mirror("move_node", |tree| {
            tree.move_node(id, new_parent, position, modified)
        })
    }

    /// Adds a bookmark at the end of `parent`.
    pub fn add(&mut self, parent: NodeId, title: &str, url: &str) -> Result<NodeId, SessionError> {
        let store = self.store_mut()?;
        let id = store.add(parent, title, url)?;
        let node = store.load_row(id)?;
        self.mirror("insert", |tree| tree.insert(node))?;
        Ok(id)
    }

    /// The configured scratch folder, created if missing.
    pub fn find_or_create_scratch(&mut self) -> Result<NodeId, SessionError> {
        let title = self.scratch_title.clone();
        let store = self.store_mut()?;
        let (folder, created) = store.find_or_create_scratch_folder(&title)?;
        if created {
            let node = store.load_row(folder)?;
            self.mirror("insert", |tree| tree.insert(node))?;
        }
        Ok(folder)
    }

    /// Adds a bookmark to the scratch folder.
    pub fn scratch_add(&mut self, title: &str, url: &str) -> Result<NodeId, SessionError> {
        let folder = self.find_or_create_scratch()?;
        self.add(folder, title, url)
    }

    /// Commits staged changes with the standard file operations.
    ///
    /// Returns `None` when nothing was staged.
    pub fn commit(&mut self, guard: &dyn LivenessGuard) -> Result<Option<CommitReport>, SessionError> {
        self.commit_with(&CommitProtocol::new(guard))
    }

    /// Commits through a caller-built protocol.
    ///
    /// On success the staging copy is gone and the tree matches the new
    /// source. A recoverable failure leaves the session editable; after an
    /// unrecoverable one every further mutation fails with `Closed`.
    pub fn commit_with(
        &mut self,
        protocol: &CommitProtocol<'_>,
    ) -> Result<Option<CommitReport>, SessionError> {
        let Some(store) = self.store.as_mut() else {
            return Ok(None);
        };
        if !store.is_dirty() {
            store.close()?;
            self.store = None;
            return Ok(None);
        }

        let report = protocol.commit(store)?;
        self.store = None;
        Ok(Some(report))
    }

    /// Drops staged changes and reloads the tree from the source.
    pub fn rollback(&mut self) -> Result<(), SessionError> {
        if let Some(mut store) = self.store.take() {
            store.close()?;
        }
        self.tree = Database::open_read_only(&self.source)?.load_tree()?;
        info!(parent: &self.span, "session rolled back");
        Ok(())
    }
}
