//! Tree arena and selected-node cache.

use std::collections::HashMap;

use crate::error::PickerError;
use crate::picker::SelectedSet;
use crate::record::SelectionRecord;
use crate::widgets::selection::SelectionMode;

/// Stable handle of a node inside one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(super) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub title: String,
    pub value: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub selectable: bool,
    pub expanded: bool,
    pub selected: bool,
}

impl TreeNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn record(&self) -> SelectionRecord {
        SelectionRecord::new(self.title.clone(), self.value.clone())
    }
}

/// A node in the flattened, currently visible part of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleNode {
    pub id: NodeId,
    pub depth: u16,
    pub title: String,
    pub value: String,
    pub has_children: bool,
    pub expanded: bool,
    pub selected: bool,
}

/// Internal state for the Tree picker.
#[derive(Debug, Default)]
pub(super) struct TreeInner {
    /// Node arena. Removed nodes leave a tombstone so ids stay stable.
    pub nodes: Vec<Option<TreeNode>>,
    /// Top-level nodes in display order.
    pub roots: Vec<NodeId>,
    /// Value -> node lookup.
    pub by_value: HashMap<String, NodeId>,
    /// Nodes whose own selected flag is set.
    pub selected: SelectedSet<NodeId>,
    /// Selection mode.
    pub mode: SelectionMode,
    /// Cursor node for keyboard navigation.
    pub cursor: Option<NodeId>,
    /// Whether the host currently shows the tree.
    pub shown: bool,
}

impl TreeInner {
    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn insert(
        &mut self,
        parent: Option<NodeId>,
        title: String,
        value: String,
    ) -> Result<NodeId, PickerError> {
        if self.by_value.contains_key(&value) {
            return Err(PickerError::DuplicateValue(value));
        }
        if let Some(parent) = parent
            && self.node(parent).is_none()
        {
            return Err(PickerError::UnknownNode(parent.0));
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(TreeNode {
            title,
            value: value.clone(),
            parent,
            children: Vec::new(),
            selectable: true,
            expanded: false,
            selected: false,
        }));
        self.by_value.insert(value, id);

        match parent.and_then(|p| self.node_mut(p)) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    /// The single place a node's selected flag changes; keeps the cache in
    /// step. Returns true if the flag flipped.
    pub fn set_node_selected(&mut self, id: NodeId, selected: bool) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        if node.selected == selected {
            return false;
        }
        node.selected = selected;
        if selected {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }
        true
    }

    /// `id` and all nodes below it, parents before children.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.node(current) {
                out.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Remove a subtree from the arena. Selected nodes must already be
    /// deselected by the caller.
    pub fn detach(&mut self, id: NodeId) -> Vec<TreeNode> {
        let subtree = self.subtree(id);
        let parent = self.node(id).and_then(|node| node.parent);

        match parent.and_then(|p| self.node_mut(p)) {
            Some(parent) => parent.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }

        let mut removed = Vec::with_capacity(subtree.len());
        for node_id in subtree {
            self.selected.remove(&node_id);
            if let Some(node) = self.nodes.get_mut(node_id.0).and_then(Option::take) {
                self.by_value.remove(&node.value);
                removed.push(node);
            }
        }

        if let Some(cursor) = self.cursor
            && self.node(cursor).is_none()
        {
            self.cursor = parent.or_else(|| self.roots.first().copied());
        }
        removed
    }

    /// Flatten the expanded part of the tree in display order.
    pub fn visible(&self) -> Vec<VisibleNode> {
        let mut out = Vec::new();
        let mut stack: Vec<(NodeId, u16)> = self.roots.iter().rev().map(|id| (*id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            out.push(VisibleNode {
                id,
                depth,
                title: node.title.clone(),
                value: node.value.clone(),
                has_children: node.has_children(),
                expanded: node.expanded,
                selected: node.selected,
            });
            if node.expanded {
                stack.extend(node.children.iter().rev().map(|child| (*child, depth + 1)));
            }
        }
        out
    }

    pub fn selected_records(&self) -> Vec<SelectionRecord> {
        self.selected
            .iter()
            .filter_map(|id| self.node(*id))
            .map(TreeNode::record)
            .collect()
    }
}
