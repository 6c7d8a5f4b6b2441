//! List picker state and the picker contract.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::PickerError;
use crate::event::{Key, KeyResult, Modifiers};
use crate::picker::{
    ItemChange, ListenerId, Picker, PickerEvents, PickerListener, SelectedSet, fuzzy_filter,
};
use crate::record::SelectionRecord;
use crate::widgets::selection::SelectionMode;

/// Unique identifier for a List picker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListId(usize);

impl ListId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Display for ListId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "__list_{}", self.0)
    }
}

/// One selectable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub title: String,
    pub value: String,
}

impl ListEntry {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
        }
    }
}

/// Internal state for the List picker.
#[derive(Debug, Default)]
pub(super) struct ListInner {
    /// Entries in display order.
    pub entries: Vec<ListEntry>,
    /// Value -> entry index.
    pub by_value: HashMap<String, usize>,
    /// Selected values.
    pub selected: SelectedSet<String>,
    /// Selection mode.
    pub mode: SelectionMode,
    /// Current filter query.
    pub filter: String,
    /// Entry indices matching the filter, best match first.
    pub filtered: Vec<usize>,
    /// Cursor (index into `filtered`).
    pub cursor: Option<usize>,
    /// Whether the host currently shows the list.
    pub shown: bool,
}

impl ListInner {
    fn rebuild_index(&mut self) {
        self.by_value = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.value.clone(), index))
            .collect();
    }

    pub fn refilter(&mut self) {
        let titles: Vec<&str> = self.entries.iter().map(|e| e.title.as_str()).collect();
        self.filtered = fuzzy_filter(&self.filter, &titles)
            .into_iter()
            .map(|m| m.index)
            .collect();
        self.cursor = if self.filtered.is_empty() {
            None
        } else {
            Some(self.cursor.unwrap_or(0).min(self.filtered.len() - 1))
        };
    }

    fn entry(&self, value: &str) -> Option<&ListEntry> {
        self.by_value.get(value).and_then(|i| self.entries.get(*i))
    }

    fn change(&self, value: &str, selected: bool) -> Option<ItemChange> {
        self.entry(value)
            .map(|entry| ItemChange::new(entry.title.clone(), entry.value.clone(), selected))
    }
}

/// A flat, filterable list usable as a selector's picker.
#[derive(Debug)]
pub struct ListPicker {
    id: ListId,
    pub(super) inner: RwLock<ListInner>,
    pub(super) events: PickerEvents,
    pub(super) dirty: AtomicBool,
}

impl Default for ListPicker {
    fn default() -> Self {
        Self::new(SelectionMode::Multi)
    }
}

impl ListPicker {
    pub fn new(mode: SelectionMode) -> Self {
        Self::with_entries(Vec::new(), mode)
    }

    /// Create a list with initial entries. Later entries with an already
    /// used value are dropped.
    pub fn with_entries(entries: Vec<ListEntry>, mode: SelectionMode) -> Self {
        let mut inner = ListInner {
            mode,
            ..Default::default()
        };
        for entry in entries {
            if !inner.entries.iter().any(|e| e.value == entry.value) {
                inner.entries.push(entry);
            }
        }
        inner.rebuild_index();
        inner.refilter();
        Self {
            id: ListId::new(),
            inner: RwLock::new(inner),
            events: PickerEvents::new(),
            dirty: AtomicBool::new(false),
        }
    }

    pub(super) fn read(&self) -> RwLockReadGuard<'_, ListInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn write(&self) -> RwLockWriteGuard<'_, ListInner> {
        self.dirty.store(true, Ordering::SeqCst);
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }

    // -------------------------------------------------------------------------
    // Entries
    // -------------------------------------------------------------------------

    pub fn push(&self, title: impl Into<String>, value: impl Into<String>) -> Result<(), PickerError> {
        let entry = ListEntry::new(title, value);
        let mut inner = self.write();
        if inner.by_value.contains_key(&entry.value) {
            return Err(PickerError::DuplicateValue(entry.value));
        }
        let index = inner.entries.len();
        inner.by_value.insert(entry.value.clone(), index);
        inner.entries.push(entry);
        inner.refilter();
        Ok(())
    }

    /// Remove an entry. A selected entry is reported as deselected first.
    pub fn remove(&self, value: &str) -> bool {
        let change = {
            let mut inner = self.write();
            let Some(index) = inner.by_value.get(value).copied() else {
                return false;
            };
            let was_selected = inner.selected.remove(&value.to_string());
            let entry = inner.entries.remove(index);
            inner.rebuild_index();
            inner.refilter();
            was_selected.then(|| ItemChange::new(entry.title, entry.value, false))
        };

        if let Some(change) = change {
            self.events.fire_changed(&change);
            self.events.fire_complete();
        }
        true
    }

    pub fn entries(&self) -> Vec<ListEntry> {
        self.read().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -------------------------------------------------------------------------
    // Filter and cursor
    // -------------------------------------------------------------------------

    pub fn set_filter(&self, query: &str) {
        let mut inner = self.write();
        if inner.filter == query {
            return;
        }
        inner.filter = query.to_string();
        inner.cursor = None;
        inner.refilter();
        log::trace!("[list] {} filter '{}' -> {} entries", self.id, query, inner.filtered.len());
    }

    pub fn filter(&self) -> String {
        self.read().filter.clone()
    }

    /// Entries matching the filter, best match first.
    pub fn filtered_entries(&self) -> Vec<ListEntry> {
        let inner = self.read();
        inner
            .filtered
            .iter()
            .filter_map(|i| inner.entries.get(*i).cloned())
            .collect()
    }

    /// Value of the entry under the cursor.
    pub fn cursor_value(&self) -> Option<String> {
        let inner = self.read();
        inner
            .cursor
            .and_then(|c| inner.filtered.get(c))
            .and_then(|i| inner.entries.get(*i))
            .map(|entry| entry.value.clone())
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

    pub fn is_selected(&self, value: &str) -> bool {
        self.read().selected.contains(&value.to_string())
    }

    /// Select or deselect through the full event path.
    pub fn select(&self, value: &str, selected: bool) -> bool {
        let changes = {
            let inner = self.read();
            let Some(target) = inner.change(value, selected) else {
                return false;
            };
            if inner.selected.contains(&target.value) == selected {
                return true;
            }
            let mut changes: Vec<ItemChange> = Vec::new();
            if selected && inner.mode.is_single() {
                changes.extend(
                    inner
                        .selected
                        .iter()
                        .filter_map(|prev| inner.change(prev, false)),
                );
            }
            changes.push(target);
            changes
        };

        self.events.fire_burst(&changes, |change| {
            let mut inner = self.write();
            if change.selected {
                inner.selected.insert(change.value.clone());
            } else {
                inner.selected.remove(&change.value);
            }
        })
    }

    pub fn toggle(&self, value: &str) -> bool {
        let selected = self.is_selected(value);
        self.select(value, !selected)
    }
}

impl Picker for ListPicker {
    fn id(&self) -> String {
        self.id.to_string()
    }

    fn selections(&self) -> Vec<SelectionRecord> {
        let inner = self.read();
        inner
            .selected
            .iter()
            .filter_map(|value| inner.entry(value))
            .map(|entry| SelectionRecord::new(entry.title.clone(), entry.value.clone()))
            .collect()
    }

    fn set_selections(&self, items: &[SelectionRecord]) -> Result<(), PickerError> {
        let mut inner = self.write();
        inner.selected.clear();
        let limit = if inner.mode.is_single() { 1 } else { usize::MAX };
        for item in items {
            if inner.selected.len() >= limit {
                break;
            }
            if inner.by_value.contains_key(&item.value) {
                inner.selected.insert(item.value.clone());
            }
        }
        Ok(())
    }

    fn update_item_selection(&self, value: &str, selected: bool) -> Result<bool, PickerError> {
        Ok(self.select(value, selected))
    }

    fn subscribe(&self, listener: Arc<dyn PickerListener>) -> ListenerId {
        self.events.subscribe(listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    fn on_show(&self) {
        self.write().shown = true;
    }

    fn on_hide(&self) {
        let mut inner = self.write();
        inner.shown = false;
        inner.filter.clear();
        inner.refilter();
    }

    fn handle_key(&self, key: Key, modifiers: Modifiers) -> KeyResult {
        self.navigate(key, modifiers)
    }

    fn on_input_changed(&self, text: &str) {
        self.set_filter(text);
    }
}
