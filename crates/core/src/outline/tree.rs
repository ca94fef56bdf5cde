use crate::error::{DefscopeError, Result};
use crate::path;
use crate::project::{ProjectWalker, TreeEntry};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    Unopened,
    /// Children keyed by entry name.
    Open(BTreeMap<String, FileTreeNode>),
}

/// Lazily expanded view of the project tree.
///
/// Children are listed from the walker when a node opens and dropped when it
/// closes; nothing is cached across a close/open cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTreeNode {
    pub path: String,
    pub is_dir: bool,
    pub state: NodeState,
}

impl FileTreeNode {
    pub fn root() -> Self {
        Self::new(path::ROOT, true)
    }

    pub fn new(path: impl Into<String>, is_dir: bool) -> Self {
        Self {
            path: path.into(),
            is_dir,
            state: NodeState::Unopened,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, NodeState::Open(_))
    }

    pub fn children(&self) -> impl Iterator<Item = &FileTreeNode> {
        let children = match &self.state {
            NodeState::Open(children) => Some(children.values()),
            NodeState::Unopened => None,
        };
        children.into_iter().flatten()
    }

    /// Materializes children. No-op for files and already-open nodes.
    pub fn open(&mut self, walker: &ProjectWalker) -> Result<()> {
        if !self.is_dir || self.is_open() {
            return Ok(());
        }
        let children = walker
            .list_dir(&self.path)?
            .into_iter()
            .map(|TreeEntry { rel_path, is_dir }| {
                let name = path::segments(&rel_path)
                    .last()
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                (name, FileTreeNode::new(rel_path, is_dir))
            })
            .collect();
        self.state = NodeState::Open(children);
        Ok(())
    }

    pub fn close(&mut self) {
        self.state = NodeState::Unopened;
    }

    /// Descends to `rel`, opening every ancestor on the way.
    pub fn find_mut(&mut self, rel: &str, walker: &ProjectWalker) -> Result<&mut FileTreeNode> {
        let target = path::normalize(rel);
        let mut node = self;
        for seg in path::segments(&target) {
            node.open(walker)?;
            let NodeState::Open(children) = &mut node.state else {
                return Err(DefscopeError::PathNotFound(target.clone()));
            };
            node = children
                .get_mut(seg)
                .ok_or_else(|| DefscopeError::PathNotFound(target.clone()))?;
        }
        Ok(node)
    }

    /// Unopened nodes in depth-first path order.
    pub fn leaves(&self) -> Vec<&FileTreeNode> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FileTreeNode>) {
        match &self.state {
            NodeState::Unopened => out.push(self),
            NodeState::Open(children) => {
                for child in children.values() {
                    child.collect_leaves(out);
                }
            }
        }
    }
}
