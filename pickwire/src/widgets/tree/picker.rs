//! Tree picker: public API and the picker contract.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::PickerError;
use crate::event::{Key, KeyResult, Modifiers};
use crate::picker::{ItemChange, ListenerId, Picker, PickerEvents, PickerListener};
use crate::record::SelectionRecord;
use crate::widgets::selection::SelectionMode;

use super::state::{NodeId, TreeInner, TreeNode, VisibleNode};

/// Unique identifier for a Tree picker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(usize);

impl TreeId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Display for TreeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "__tree_{}", self.0)
    }
}

/// A hierarchical list whose nodes can be selected, usable on its own or as
/// a selector's picker.
///
/// `TreePicker` manages:
/// - A node arena with expand/collapse state
/// - A selected-node cache updated on every flag change, so
///   [`Picker::selections`] never walks the tree
/// - Single or multi selection
/// - Cursor navigation while shown
#[derive(Debug)]
pub struct TreePicker {
    /// Unique identifier.
    id: TreeId,
    /// Internal state.
    pub(super) inner: RwLock<TreeInner>,
    /// Selection listeners.
    pub(super) events: PickerEvents,
    /// Dirty flag for re-render.
    pub(super) dirty: AtomicBool,
}

impl Default for TreePicker {
    fn default() -> Self {
        Self::new()
    }
}

impl TreePicker {
    /// Create an empty multi-selection tree.
    pub fn new() -> Self {
        Self::with_selection_mode(SelectionMode::Multi)
    }

    pub fn with_selection_mode(mode: SelectionMode) -> Self {
        Self {
            id: TreeId::new(),
            inner: RwLock::new(TreeInner {
                mode,
                ..Default::default()
            }),
            events: PickerEvents::new(),
            dirty: AtomicBool::new(false),
        }
    }

    pub fn tree_id(&self) -> TreeId {
        self.id
    }

    pub(super) fn read(&self) -> RwLockReadGuard<'_, TreeInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn write(&self) -> RwLockWriteGuard<'_, TreeInner> {
        self.dirty.store(true, Ordering::SeqCst);
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check if the tree changed since the last render.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    pub fn add_root(
        &self,
        title: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<NodeId, PickerError> {
        self.write().insert(None, title.into(), value.into())
    }

    pub fn add_child(
        &self,
        parent: NodeId,
        title: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<NodeId, PickerError> {
        self.write().insert(Some(parent), title.into(), value.into())
    }

    /// Remove a node and everything below it. Selected nodes in the subtree
    /// are reported as deselected so attached selectors drop them too.
    pub fn remove_node(&self, id: NodeId) -> Result<(), PickerError> {
        let deselected: Vec<ItemChange> = {
            let mut inner = self.write();
            if inner.node(id).is_none() {
                return Err(PickerError::UnknownNode(id.index()));
            }
            let subtree = inner.subtree(id);
            let mut changes = Vec::new();
            for node_id in subtree {
                if inner.set_node_selected(node_id, false)
                    && let Some(node) = inner.node(node_id)
                {
                    changes.push(ItemChange::new(node.title.clone(), node.value.clone(), false));
                }
            }
            let removed = inner.detach(id);
            log::debug!("[tree] {} removed node {} ({} nodes)", self.id, id, removed.len());
            changes
        };

        if !deselected.is_empty() {
            for change in &deselected {
                self.events.fire_changed(change);
            }
            self.events.fire_complete();
        }
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<TreeNode> {
        self.read().node(id).cloned()
    }

    pub fn node_by_value(&self, value: &str) -> Option<NodeId> {
        self.read().by_value.get(value).copied()
    }

    pub fn roots(&self) -> Vec<NodeId> {
        self.read().roots.clone()
    }

    pub fn len(&self) -> usize {
        self.read().by_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nodes that are not selectable still show and expand but can never be
    /// selected.
    pub fn set_selectable(&self, id: NodeId, selectable: bool) -> Result<(), PickerError> {
        let mut inner = self.write();
        let node = inner.node_mut(id).ok_or(PickerError::UnknownNode(id.index()))?;
        node.selectable = selectable;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Expand / collapse
    // -------------------------------------------------------------------------

    pub fn expand(&self, id: NodeId) -> bool {
        self.set_expanded(id, true)
    }

    pub fn collapse(&self, id: NodeId) -> bool {
        self.set_expanded(id, false)
    }

    pub fn toggle_expanded(&self, id: NodeId) -> bool {
        let expanded = self.read().node(id).map(|node| node.expanded);
        match expanded {
            Some(expanded) => self.set_expanded(id, !expanded),
            None => false,
        }
    }

    /// Returns true if the expanded state changed.
    fn set_expanded(&self, id: NodeId, expanded: bool) -> bool {
        let mut inner = self.write();
        let Some(node) = inner.node_mut(id) else {
            return false;
        };
        if node.expanded == expanded || !node.has_children() {
            return false;
        }
        node.expanded = expanded;

        // A collapsed subtree cannot hold the cursor.
        if !expanded
            && let Some(cursor) = inner.cursor
            && cursor != id
            && inner.subtree(id).contains(&cursor)
        {
            inner.cursor = Some(id);
        }
        true
    }

    pub fn visible_nodes(&self) -> Vec<VisibleNode> {
        self.read().visible()
    }

    pub fn cursor(&self) -> Option<NodeId> {
        self.read().cursor
    }

    pub fn set_cursor(&self, id: NodeId) -> bool {
        let mut inner = self.write();
        if inner.node(id).is_none() {
            return false;
        }
        inner.cursor = Some(id);
        true
    }

    pub fn is_shown(&self) -> bool {
        self.read().shown
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub fn selection_mode(&self) -> SelectionMode {
        self.read().mode
    }

    /// Switch mode. Going to single mode keeps only the first selection.
    pub fn set_selection_mode(&self, mode: SelectionMode) -> bool {
        let extra: Vec<ItemChange> = {
            let mut inner = self.write();
            inner.mode = mode;
            if !mode.is_single() {
                return true;
            }
            inner
                .selected
                .iter()
                .skip(1)
                .filter_map(|id| inner.node(*id))
                .map(|node| ItemChange::new(node.title.clone(), node.value.clone(), false))
                .collect()
        };
        self.events.fire_burst(&extra, |change| self.apply(change))
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.read().node(id).is_some_and(|node| node.selected)
    }

    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.read().selected.iter().copied().collect()
    }

    /// Select or deselect a node through the full event path.
    ///
    /// Returns false if the node is unknown, not selectable, or a listener
    /// vetoed the change.
    pub fn select_node(&self, id: NodeId, selected: bool) -> bool {
        let changes = {
            let inner = self.read();
            let Some(node) = inner.node(id) else {
                return false;
            };
            if !node.selectable {
                log::debug!("[tree] {} node {} is not selectable", self.id, id);
                return false;
            }
            if node.selected == selected {
                return true;
            }

            let mut changes = Vec::new();
            if selected && inner.mode.is_single() {
                changes.extend(
                    inner
                        .selected
                        .iter()
                        .filter_map(|prev| inner.node(*prev))
                        .map(|prev| ItemChange::new(prev.title.clone(), prev.value.clone(), false)),
                );
            }
            changes.push(ItemChange::new(node.title.clone(), node.value.clone(), selected));
            changes
        };

        self.events.fire_burst(&changes, |change| self.apply(change))
    }

    pub fn toggle_node(&self, id: NodeId) -> bool {
        let selected = self.is_selected(id);
        self.select_node(id, !selected)
    }

    /// Select every selectable node (multi mode only).
    pub fn select_all(&self) -> bool {
        let changes: Vec<ItemChange> = {
            let inner = self.read();
            if inner.mode.is_single() {
                return false;
            }
            inner
                .nodes
                .iter()
                .flatten()
                .filter(|node| node.selectable && !node.selected)
                .map(|node| ItemChange::new(node.title.clone(), node.value.clone(), true))
                .collect()
        };
        self.events.fire_burst(&changes, |change| self.apply(change))
    }

    pub fn deselect_all(&self) -> bool {
        let changes: Vec<ItemChange> = {
            let inner = self.read();
            inner
                .selected
                .iter()
                .filter_map(|id| inner.node(*id))
                .map(|node| ItemChange::new(node.title.clone(), node.value.clone(), false))
                .collect()
        };
        self.events.fire_burst(&changes, |change| self.apply(change))
    }

    /// Apply one burst step. The lock is released before listeners run.
    fn apply(&self, change: &ItemChange) {
        let mut inner = self.write();
        if let Some(id) = inner.by_value.get(&change.value).copied() {
            inner.set_node_selected(id, change.selected);
            log::trace!("[tree] {} node {} selected={}", self.id, id, change.selected);
        }
    }
}

impl Picker for TreePicker {
    fn id(&self) -> String {
        self.id.to_string()
    }

    fn selections(&self) -> Vec<SelectionRecord> {
        self.read().selected_records()
    }

    fn set_selections(&self, items: &[SelectionRecord]) -> Result<(), PickerError> {
        let mut inner = self.write();
        let previous: Vec<NodeId> = inner.selected.iter().copied().collect();
        for id in previous {
            inner.set_node_selected(id, false);
        }
        let limit = if inner.mode.is_single() { 1 } else { usize::MAX };
        let mut applied = 0;
        for item in items {
            if inner.selected.len() >= limit {
                break;
            }
            let Some(id) = inner.by_value.get(&item.value).copied() else {
                continue;
            };
            if inner.node(id).is_some_and(|node| node.selectable) && inner.set_node_selected(id, true) {
                applied += 1;
            }
        }
        log::debug!("[tree] {} pre-applied {} of {} selections", self.id, applied, items.len());
        Ok(())
    }

    fn update_item_selection(&self, value: &str, selected: bool) -> Result<bool, PickerError> {
        match self.node_by_value(value) {
            Some(id) => Ok(self.select_node(id, selected)),
            None => {
                log::debug!("[tree] {} does not know value '{}'", self.id, value);
                Ok(false)
            }
        }
    }

    fn subscribe(&self, listener: Arc<dyn PickerListener>) -> ListenerId {
        self.events.subscribe(listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    fn on_show(&self) {
        let mut inner = self.write();
        inner.shown = true;
        if inner.cursor.is_none() {
            inner.cursor = inner.selected.single().copied().or_else(|| inner.roots.first().copied());
        }
    }

    fn on_hide(&self) {
        self.write().shown = false;
    }

    fn handle_key(&self, key: Key, modifiers: Modifiers) -> KeyResult {
        self.navigate(key, modifiers)
    }
}
