//! In-memory bookmark tree.
//!
//! An arena of [`BookmarkNode`]s keyed by [`NodeId`]. Parent and child links
//! are ids resolved through the arena, so the tree can be mirrored and
//! reloaded without any shared pointers into the staging layer.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::warn;

use crate::database::schema::{MENU_GUID, TOOLBAR_GUID, TOOLBAR_TITLES};
use crate::types::bookmark::{BookmarkKind, BookmarkNode, BookmarkRow, NodeId, PlaceId};
use crate::types::errors::TreeError;

/// Single-rooted tree of bookmark nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkTree {
    nodes: HashMap<NodeId, BookmarkNode>,
    root: NodeId,
}

impl BookmarkTree {
    /// Builds a tree from persisted rows.
    ///
    /// Rows that cannot be represented (unknown type, bookmark without a
    /// place) and rows not reachable from the root (missing or non-folder
    /// parent, cycles) are dropped with a warning.
    ///
    /// # Errors
    /// `TreeError::NoRoot` or `TreeError::MultipleRoots` when the rows do not
    /// contain exactly one parentless node.
    pub fn from_rows(rows: Vec<BookmarkRow>) -> Result<Self, TreeError> {
        let mut nodes = HashMap::with_capacity(rows.len());
        for row in rows {
            match BookmarkNode::try_from(row) {
                Ok(node) => {
                    nodes.insert(node.id, node);
                }
                Err(reason) => warn!(%reason, "skipping bookmark row"),
            }
        }

        let mut roots: Vec<NodeId> = nodes
            .values()
            .filter(|n| n.parent.is_none())
            .map(|n| n.id)
            .collect();
        roots.sort();
        let root = match roots.as_slice() {
            [] => return Err(TreeError::NoRoot),
            [only] => *only,
            [first, second, ..] => return Err(TreeError::MultipleRoots(first.0, second.0)),
        };

        let links: Vec<(NodeId, NodeId)> = nodes
            .values()
            .filter_map(|n| n.parent.map(|p| (p, n.id)))
            .collect();
        for (parent, child) in links {
            match nodes.get_mut(&parent) {
                Some(p) if p.is_folder() => p.children.push(child),
                _ => {}
            }
        }

        // Anything not reachable from the root is an orphan or part of a cycle.
        let mut reachable = HashSet::with_capacity(nodes.len());
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            if !reachable.insert(id) {
                continue;
            }
            if let Some(node) = nodes.get(&id) {
                queue.extend(node.children.iter().copied());
            }
        }
        if reachable.len() != nodes.len() {
            let mut dropped: Vec<i64> = nodes
                .keys()
                .filter(|id| !reachable.contains(id))
                .map(|id| id.0)
                .collect();
            dropped.sort_unstable();
            warn!(?dropped, "dropping bookmark rows unreachable from the root");
            nodes.retain(|id, _| reachable.contains(id));
        }

        let mut tree = Self { nodes, root };
        let ids: Vec<NodeId> = tree.nodes.keys().copied().collect();
        for id in ids {
            tree.sort_children(id);
        }
        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&BookmarkNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Children of `id` in display order; empty for unknown ids and leaves.
    pub fn children(&self, id: NodeId) -> Vec<&BookmarkNode> {
        self.nodes
            .get(&id)
            .map(|n| n.children.iter().filter_map(|c| self.nodes.get(c)).collect())
            .unwrap_or_default()
    }

    /// All nodes in depth-first display order, starting at the root.
    pub fn walk(&self) -> Vec<&BookmarkNode> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push(node);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn folders(&self) -> Vec<&BookmarkNode> {
        self.walk().into_iter().filter(|n| n.is_folder()).collect()
    }

    /// Direct bookmark children of a folder.
    pub fn bookmarks_in(&self, folder: NodeId) -> Vec<&BookmarkNode> {
        self.children(folder).into_iter().filter(|n| n.is_bookmark()).collect()
    }

    pub fn find_by_guid(&self, guid: &str) -> Option<&BookmarkNode> {
        self.nodes.values().find(|n| n.guid == guid)
    }

    /// The bookmarks toolbar: by GUID, else the first folder with a toolbar title.
    pub fn toolbar(&self) -> Option<&BookmarkNode> {
        self.find_by_guid(TOOLBAR_GUID).or_else(|| {
            self.folders()
                .into_iter()
                .find(|n| TOOLBAR_TITLES.contains(&n.title.as_str()))
        })
    }

    pub fn menu(&self) -> Option<&BookmarkNode> {
        self.find_by_guid(MENU_GUID)
    }

    /// Number of edges between the root and `id`.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        let mut depth = 0;
        let mut current = self.nodes.get(&id)?;
        while let Some(parent) = current.parent {
            current = self.nodes.get(&parent)?;
            depth += 1;
        }
        Some(depth)
    }

    /// True if `ancestor` is `id` or lies on the path from `id` to the root.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.nodes.get(&cur).and_then(|n| n.parent);
        }
        false
    }

    // --- mirroring ---

    /// Sets a node's title and last-modified timestamp.
    pub fn set_title(&mut self, id: NodeId, title: &str, modified: i64) -> Result<(), TreeError> {
        let node = self.nodes.get_mut(&id).ok_or(TreeError::NotFound(id.0))?;
        node.title = title.to_string();
        node.last_modified = modified;
        Ok(())
    }

    /// Rewrites the URL on every bookmark referencing `place`. Returns how many changed.
    pub fn set_place_url(&mut self, place: PlaceId, url: &str) -> usize {
        let mut changed = 0;
        for node in self.nodes.values_mut() {
            if let BookmarkKind::Bookmark(p) = &mut node.kind {
                if p.id == place {
                    p.url = url.to_string();
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Inserts a new leaf or empty folder under its recorded parent.
    pub fn insert(&mut self, node: BookmarkNode) -> Result<(), TreeError> {
        if self.nodes.contains_key(&node.id) {
            return Err(TreeError::Duplicate(node.id.0));
        }
        let parent = node
            .parent
            .ok_or_else(|| TreeError::InvalidOperation("cannot insert a second root".to_string()))?;
        self.require_folder(parent)?;

        let id = node.id;
        let mut node = node;
        node.children.clear();
        self.nodes.insert(id, node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        self.sort_children(parent);
        Ok(())
    }

    /// Removes a node that has no children.
    pub fn remove(&mut self, id: NodeId) -> Result<BookmarkNode, TreeError> {
        let node = self.nodes.get(&id).ok_or(TreeError::NotFound(id.0))?;
        if id == self.root {
            return Err(TreeError::InvalidOperation("cannot remove the root".to_string()));
        }
        if !node.children.is_empty() {
            return Err(TreeError::InvalidOperation(format!(
                "node {} still has {} children",
                id,
                node.children.len()
            )));
        }

        let node = self.nodes.remove(&id).ok_or(TreeError::NotFound(id.0))?;
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
        Ok(node)
    }

    /// Reparents `id` under `new_parent` at `position`.
    ///
    /// Siblings in the new parent at or after `position` shift up by one so
    /// positions stay unique; the old parent keeps a gap.
    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        position: i64,
        modified: i64,
    ) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::InvalidOperation("cannot move the root".to_string()));
        }
        let old_parent = self
            .nodes
            .get(&id)
            .ok_or(TreeError::NotFound(id.0))?
            .parent;
        self.require_folder(new_parent)?;
        if self.is_ancestor(id, new_parent) {
            return Err(TreeError::InvalidOperation(format!(
                "cannot move {} into its own subtree",
                id
            )));
        }

        if let Some(old) = old_parent.and_then(|p| self.nodes.get_mut(&p)) {
            old.children.retain(|c| *c != id);
        }

        let siblings: Vec<NodeId> = self
            .nodes
            .get(&new_parent)
            .map(|p| p.children.clone())
            .unwrap_or_default();
        for sibling in siblings {
            if let Some(s) = self.nodes.get_mut(&sibling) {
                if s.position >= position {
                    s.position += 1;
                }
            }
        }

        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(new_parent);
            node.position = position;
            node.last_modified = modified;
        }
        if let Some(p) = self.nodes.get_mut(&new_parent) {
            p.children.push(id);
        }
        self.sort_children(new_parent);
        Ok(())
    }

    /// Checks the structural invariants: single root, parents are folders,
    /// only folders have children, bookmark iff place, unique sibling positions.
    pub fn validate(&self) -> Result<(), TreeError> {
        for node in self.nodes.values() {
            match node.parent {
                None if node.id != self.root => {
                    return Err(TreeError::MultipleRoots(self.root.0, node.id.0))
                }
                Some(p) => {
                    let parent = self.nodes.get(&p).ok_or(TreeError::NotFound(p.0))?;
                    if !parent.is_folder() {
                        return Err(TreeError::NotAFolder(p.0));
                    }
                    if !parent.children.contains(&node.id) {
                        return Err(TreeError::InvalidOperation(format!(
                            "node {} missing from parent {}",
                            node.id, p
                        )));
                    }
                }
                None => {}
            }

            if !node.is_folder() && !node.children.is_empty() {
                return Err(TreeError::NotAFolder(node.id.0));
            }

            let mut seen = HashSet::new();
            for child in self.children(node.id) {
                if !seen.insert(child.position) {
                    return Err(TreeError::InvalidOperation(format!(
                        "duplicate position {} under {}",
                        child.position, node.id
                    )));
                }
            }
        }
        if self.walk().len() != self.nodes.len() {
            return Err(TreeError::InvalidOperation("unreachable nodes present".to_string()));
        }
        Ok(())
    }

    fn require_folder(&self, id: NodeId) -> Result<(), TreeError> {
        match self.nodes.get(&id) {
            None => Err(TreeError::NotFound(id.0)),
            Some(n) if !n.is_folder() => Err(TreeError::NotAFolder(id.0)),
            Some(_) => Ok(()),
        }
    }

    fn sort_children(&mut self, id: NodeId) {
        let Some(children) = self.nodes.get(&id).map(|n| n.children.clone()) else {
            return;
        };
        let mut keyed: Vec<(i64, NodeId)> = children
            .into_iter()
            .map(|c| (self.nodes.get(&c).map(|n| n.position).unwrap_or(i64::MAX), c))
            .collect();
        keyed.sort();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children = keyed.into_iter().map(|(_, c)| c).collect();
        }
    }
}
