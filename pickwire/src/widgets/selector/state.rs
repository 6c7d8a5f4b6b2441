//! Selector state and the guarded mutation paths.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{
    Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
};

use crate::config::SelectorConfig;
use crate::coordinator::{Surface, SurfaceCoordinator};
use crate::error::SelectorError;
use crate::picker::{ListenerId, Picker};
use crate::record::SelectionRecord;
use crate::sync::{NotifyLatch, SyncLatch, SyncState};
use crate::value::{decode_value, encode_value};

use super::chips::{SelectionList, Slot};
use super::drag::DragState;
use super::tab_order::{self, LayoutWatch};

/// Unique identifier for a Selector instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectorId(usize);

impl SelectorId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Display for SelectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "__selector_{}", self.0)
    }
}

/// Handle returned by [`Selector::on_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(usize);

impl CallbackId {
    fn next() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

pub(super) type ChangeCallback = Arc<dyn Fn(&Selector) + Send + Sync>;

pub(super) struct AttachedPicker {
    pub picker: Arc<dyn Picker>,
    pub listener: ListenerId,
}

/// Internal state for the Selector.
pub(super) struct SelectorInner {
    /// Configuration (mode, geometry).
    pub config: SelectorConfig,
    /// Chosen entries in display order.
    pub chips: SelectionList,
    /// Focused input slot; new chips are inserted here.
    pub focus: Slot,
    /// Text in the focused input slot.
    pub input: String,
    /// Whether the picker surface is open.
    pub open: bool,
    /// Attached picker and our subscription to it.
    pub picker: Option<AttachedPicker>,
    /// Whether the primary input is reachable with Tab.
    pub primary_in_flow: bool,
    /// Chip geometry is out of date (changed while hidden).
    pub layout_stale: bool,
    /// Debounced width reports.
    pub watch: LayoutWatch,
    /// Drag in progress.
    pub drag: Option<DragState>,
    /// Serialized value considered unmodified.
    pub clean_value: String,
}

impl SelectorInner {
    fn new(config: SelectorConfig) -> Self {
        Self {
            watch: LayoutWatch::new(config.layout_debounce),
            layout_stale: !config.visible,
            config,
            chips: SelectionList::new(),
            focus: Slot::Primary,
            input: String::new(),
            open: false,
            picker: None,
            primary_in_flow: true,
            drag: None,
            clean_value: String::new(),
        }
    }

    /// Recompute geometry and tab flow from chip `from` on.
    pub fn relayout(&mut self, from: usize) {
        if !self.config.visible {
            self.layout_stale = true;
            return;
        }
        let from = if self.layout_stale { 0 } else { from };
        self.primary_in_flow = tab_order::optimize(self.chips.as_mut_slice(), from, &self.config);
        self.layout_stale = false;

        // An overflowing single chip pins focus to its leading slot.
        if self.config.mode.is_single()
            && !self.primary_in_flow
            && let Some(first) = self.chips.at(0)
            && !matches!(self.focus, Slot::Leading(_))
        {
            self.focus = Slot::Leading(first.record.value.clone());
        }
    }

    pub fn slot_in_flow(&self, slot: &Slot) -> bool {
        match slot {
            Slot::Leading(value) => self.chips.get(value).is_some_and(|c| c.leading_in_flow),
            Slot::Trailing(value) => self.chips.get(value).is_some_and(|c| c.trailing_in_flow),
            Slot::Primary => self.primary_in_flow,
        }
    }

    /// Caret position of a slot: the number of chips before it.
    pub fn caret(&self, slot: &Slot) -> usize {
        match slot {
            Slot::Leading(value) => self.chips.position(value).unwrap_or(self.chips.len()),
            Slot::Trailing(value) => self
                .chips
                .position(value)
                .map_or(self.chips.len(), |p| p + 1),
            Slot::Primary => self.chips.len(),
        }
    }

    pub fn slot_at_caret(&self, caret: usize) -> Slot {
        match self.chips.at(caret) {
            Some(chip) => Slot::Leading(chip.record.value.clone()),
            None => Slot::Primary,
        }
    }

    pub fn picker(&self) -> Option<Arc<dyn Picker>> {
        self.picker.as_ref().map(|attached| Arc::clone(&attached.picker))
    }
}

pub(super) struct Shared {
    pub id: SelectorId,
    pub inner: RwLock<SelectorInner>,
    /// Host/picker reentrancy latch.
    pub sync: SyncLatch,
    /// Public change notification suppression.
    pub notify: NotifyLatch,
    pub callbacks: RwLock<Vec<(CallbackId, ChangeCallback)>>,
    /// Values dropped host-side while applying a picker change in single
    /// mode; deselected in the picker once the latch is free.
    pub evicted: Mutex<Vec<String>>,
    pub coordinator: Option<Arc<SurfaceCoordinator>>,
    /// Dirty flag for re-render.
    pub dirty: AtomicBool,
}

impl Shared {
    pub fn read(&self) -> RwLockReadGuard<'_, SelectorInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, SelectorInner> {
        self.dirty.store(true, Ordering::SeqCst);
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Close the surface. Returns false if it was not open.
    pub fn close(&self) -> bool {
        let picker = {
            let mut inner = self.write();
            if !inner.open {
                return false;
            }
            inner.open = false;
            inner.picker()
        };
        if let Some(coordinator) = &self.coordinator {
            coordinator.release(&self.id.to_string());
        }
        if let Some(picker) = picker {
            picker.on_hide();
        }
        log::debug!("[selector] {} closed", self.id);
        true
    }
}

impl Surface for Shared {
    fn close_surface(&self) {
        self.close();
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(attached) = inner.picker.take() {
            attached.picker.unsubscribe(attached.listener);
        }
        if let Some(coordinator) = &self.coordinator {
            coordinator.release(&self.id.to_string());
        }
    }
}

/// The multi-entry selector.
///
/// Shows chosen entries as chips, each with an input slot on either side,
/// and keeps them in sync with an optional attached [`Picker`]. Cloning is
/// cheap and yields another handle to the same control.
///
/// # Example
///
/// ```ignore
/// let selector = Selector::new(SelectorConfig::default());
/// selector.on_change(|s| println!("value: {}", s.value()));
/// selector.add_selection("Denmark", "DK")?;
/// selector.add_selection("Germany", "DE")?;
/// assert_eq!(selector.value(), "Denmark=DK;Germany=DE");
/// ```
#[derive(Clone)]
pub struct Selector {
    pub(super) shared: Arc<Shared>,
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("id", &self.shared.id)
            .field("value", &self.value())
            .field("sync", &self.shared.sync.state())
            .finish()
    }
}

impl Selector {
    /// Create a selector.
    pub fn new(config: SelectorConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a selector whose surface is coordinated with others sharing
    /// `coordinator`: opening one closes the rest.
    pub fn with_coordinator(config: SelectorConfig, coordinator: Arc<SurfaceCoordinator>) -> Self {
        Self::build(config, Some(coordinator))
    }

    fn build(config: SelectorConfig, coordinator: Option<Arc<SurfaceCoordinator>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: SelectorId::new(),
                inner: RwLock::new(SelectorInner::new(config)),
                sync: SyncLatch::new(),
                notify: NotifyLatch::new(),
                callbacks: RwLock::new(Vec::new()),
                evicted: Mutex::new(Vec::new()),
                coordinator,
                dirty: AtomicBool::new(false),
            }),
        }
    }

    pub(super) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    pub(super) fn downgrade(&self) -> Weak<Shared> {
        Arc::downgrade(&self.shared)
    }

    pub(super) fn read(&self) -> RwLockReadGuard<'_, SelectorInner> {
        self.shared.read()
    }

    pub(super) fn write(&self) -> RwLockWriteGuard<'_, SelectorInner> {
        self.shared.write()
    }

    pub fn id(&self) -> SelectorId {
        self.shared.id
    }

    /// Current state of the host/picker latch.
    pub fn sync_state(&self) -> SyncState {
        self.shared.sync.state()
    }

    /// Check if the selector changed since the last render.
    pub fn needs_redraw(&self) -> bool {
        self.shared.dirty.load(Ordering::SeqCst)
    }

    pub fn clear_redraw(&self) {
        self.shared.dirty.store(false, Ordering::SeqCst);
    }

    pub fn config(&self) -> SelectorConfig {
        self.read().config.clone()
    }

    // -------------------------------------------------------------------------
    // Change notification
    // -------------------------------------------------------------------------

    /// Register a callback fired once after every net change of the
    /// selection (add, remove, clear, reorder), after tab order is updated.
    pub fn on_change(&self, f: impl Fn(&Selector) + Send + Sync + 'static) -> CallbackId {
        let id = CallbackId::next();
        self.shared
            .callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(f)));
        id
    }

    pub fn remove_on_change(&self, id: CallbackId) -> bool {
        let mut callbacks = self
            .shared
            .callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    fn fire_callbacks(&self) {
        let callbacks: Vec<ChangeCallback> = self
            .shared
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, f)| Arc::clone(f))
            .collect();
        log::debug!("[selector] {} changed: '{}'", self.shared.id, self.value());
        for callback in callbacks {
            callback(self);
        }
    }

    /// Notify now, or once the current suppression ends.
    pub(super) fn emit_change(&self) {
        if self.shared.notify.request() {
            self.fire_callbacks();
        }
    }

    /// Fire the deferred notification if the selection really changed.
    pub(super) fn flush(&self) {
        if let Some(before) = self.shared.notify.take_ready()
            && before != self.selections()
        {
            self.fire_callbacks();
        }
    }

    /// Run `f` with notifications coalesced into at most one.
    pub(super) fn batch<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        let guard = self.shared.notify.suppress(|| self.selections());
        let result = f(self);
        drop(guard);
        self.flush();
        result
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Selected records in display order.
    pub fn selections(&self) -> Vec<SelectionRecord> {
        self.read().chips.records()
    }

    pub fn len(&self) -> usize {
        self.read().chips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, value: &str) -> bool {
        self.read().chips.contains(value)
    }

    // -------------------------------------------------------------------------
    // Mutation API
    // -------------------------------------------------------------------------

    /// Add a valid selection. Returns `Ok(false)` when nothing changed
    /// (duplicate value, limit reached, or vetoed by the picker).
    pub fn add_selection(
        &self,
        title: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<bool, SelectorError> {
        self.add_selection_with_validity(title, value, true)
    }

    /// Add a selection. Invalid records are kept host-side only.
    pub fn add_selection_with_validity(
        &self,
        title: impl Into<String>,
        value: impl Into<String>,
        valid: bool,
    ) -> Result<bool, SelectorError> {
        let (title, value) = (title.into(), value.into());
        self.batch(|s| s.add_guarded(title, value, valid))
    }

    /// Remove a selection. Returns `Ok(false)` for an unknown value or a veto.
    pub fn remove_selection(&self, value: &str) -> Result<bool, SelectorError> {
        self.batch(|s| s.remove_guarded(value))
    }

    /// Remove every selection. Returns how many were removed.
    pub fn clear_selections(&self) -> Result<usize, SelectorError> {
        self.clear_selections_except(|_| false)
    }

    /// Remove every selection for which `keep` returns false. Entries the
    /// picker refuses to deselect stay.
    pub fn clear_selections_except(
        &self,
        keep: impl Fn(&SelectionRecord) -> bool,
    ) -> Result<usize, SelectorError> {
        self.batch(|s| s.clear_guarded(&keep))
    }

    pub(super) fn clear_guarded(
        &self,
        keep: impl Fn(&SelectionRecord) -> bool,
    ) -> Result<usize, SelectorError> {
        let mut removed = 0;
        for record in self.selections() {
            if keep(&record) {
                continue;
            }
            if self.remove_guarded(&record.value)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// The picker to forward to, if forwarding is allowed right now.
    fn forwarding_target(&self, valid: bool) -> Option<Arc<dyn Picker>> {
        if !valid || !self.shared.sync.forwarding_allowed() {
            return None;
        }
        self.read().picker()
    }

    /// Ask the picker to toggle `value` while holding the latch from the
    /// host side. The latch is released on every exit path.
    pub(super) fn forward(
        &self,
        picker: &Arc<dyn Picker>,
        value: &str,
        selected: bool,
    ) -> Result<bool, SelectorError> {
        let _guard = self.shared.sync.acquire_from_host(Some(value))?;
        log::debug!(
            "[selector] {} forwarding {}='{}' to {}",
            self.shared.id,
            if selected { "select" } else { "deselect" },
            value,
            picker.id()
        );
        let accepted = picker.update_item_selection(value, selected)?;
        if !accepted {
            log::debug!("[selector] {} picker refused '{}'", self.shared.id, value);
        }
        Ok(accepted)
    }

    pub(super) fn add_guarded(
        &self,
        title: String,
        value: String,
        valid: bool,
    ) -> Result<bool, SelectorError> {
        let single = {
            let inner = self.read();
            if inner.chips.contains(&value) {
                log::trace!("[selector] {} already has '{}'", self.shared.id, value);
                return Ok(false);
            }
            if !inner.config.mode.is_single()
                && let Some(max) = inner.config.max_selections
                && inner.chips.len() >= max
            {
                log::debug!("[selector] {} is full ({} selections)", self.shared.id, max);
                return Ok(false);
            }
            inner.config.mode.is_single()
        };

        // Single mode: clear first, then select.
        let mut cleared = Vec::new();
        if single {
            let from_picker = self.shared.sync.state() == SyncState::ApplyingFromPicker;
            for record in self.selections() {
                let position = self.read().chips.position(&record.value).unwrap_or(0);
                match self.remove_guarded(&record.value) {
                    Ok(true) => {}
                    Ok(false) => {
                        log::debug!("[selector] {} could not clear '{}'", self.shared.id, record.value);
                        self.restore(cleared);
                        return Ok(false);
                    }
                    Err(err) => {
                        self.restore(cleared);
                        return Err(err);
                    }
                }
                if from_picker && record.valid {
                    self.shared
                        .evicted
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(record.value.clone());
                }
                cleared.push((position, record));
            }
        }

        if let Some(picker) = self.forwarding_target(valid) {
            match self.forward(&picker, &value, true) {
                Ok(true) => {}
                Ok(false) => {
                    self.restore(cleared);
                    return Ok(false);
                }
                Err(err) => {
                    self.restore(cleared);
                    return Err(err);
                }
            }
        }

        self.place_chip(None, SelectionRecord { title, value, valid }, true);
        Ok(true)
    }

    pub(super) fn remove_guarded(&self, value: &str) -> Result<bool, SelectorError> {
        let Some(record) = self.read().chips.get(value).map(|chip| chip.record.clone()) else {
            log::trace!("[selector] {} has no '{}' to remove", self.shared.id, value);
            return Ok(false);
        };

        if let Some(picker) = self.forwarding_target(record.valid)
            && !self.forward(&picker, value, false)?
        {
            return Ok(false);
        }

        self.remove_chip(value);
        Ok(true)
    }

    /// Mark valid entries missing from `held` as invalid.
    pub(super) fn invalidate_missing(&self, held: &HashSet<String>) {
        let invalidated: Vec<String> = {
            let mut inner = self.write();
            let missing: Vec<String> = inner
                .chips
                .iter()
                .filter(|chip| chip.record.valid && !held.contains(chip.value()))
                .map(|chip| chip.value().to_string())
                .collect();
            for value in &missing {
                inner.chips.set_valid(value, false);
            }
            missing
        };
        if invalidated.is_empty() {
            return;
        }
        log::debug!(
            "[selector] {} picker does not hold {:?}, marked invalid",
            self.shared.id,
            invalidated
        );
        self.emit_change();
    }

    /// Realign the valid entries with the picker's selection after a
    /// picker change could not be applied. Host-side only.
    pub(super) fn resync_from_picker(&self) {
        let Some(picker) = self.read().picker() else {
            return;
        };
        let held = picker.selections();
        let held_values: HashSet<&str> = held.iter().map(|record| record.value.as_str()).collect();

        for record in self.selections() {
            if record.valid && !held_values.contains(record.value.as_str()) {
                self.remove_chip(&record.value);
            }
        }

        for record in held {
            let (present, room) = {
                let inner = self.read();
                let capacity = if inner.config.mode.is_single() {
                    1
                } else {
                    inner.config.max_selections.unwrap_or(usize::MAX)
                };
                let valid = inner.chips.iter().filter(|chip| chip.record.valid).count();
                (inner.chips.contains(&record.value), valid < capacity)
            };
            if present {
                if self.write().chips.set_valid(&record.value, true) {
                    self.emit_change();
                }
                continue;
            }
            if !room {
                log::warn!(
                    "[selector] {} has no room for '{}' held by {}",
                    self.shared.id,
                    record.value,
                    picker.id()
                );
                continue;
            }
            let at = self.len();
            self.place_chip(Some(at), SelectionRecord { valid: true, ..record }, false);
        }
        log::debug!("[selector] {} resynced with {}", self.shared.id, picker.id());
    }

    /// Undo a single-mode clear whose follow-up selection was refused.
    fn restore(&self, cleared: Vec<(usize, SelectionRecord)>) {
        for (position, record) in cleared.into_iter().rev() {
            let picker = self.forwarding_target(record.valid);
            let value = record.value.clone();
            self.place_chip(Some(position), record, false);
            if let Some(picker) = picker {
                match self.forward(&picker, &value, true) {
                    Ok(true) => {}
                    Ok(false) => log::warn!(
                        "[selector] {} picker refused to restore '{}'",
                        self.shared.id,
                        value
                    ),
                    Err(err) => log::warn!(
                        "[selector] {} restoring '{}' failed: {}",
                        self.shared.id,
                        value,
                        err
                    ),
                }
            }
        }
    }

    /// Insert a chip at `at`, or at the focused slot when None.
    fn place_chip(&self, at: Option<usize>, record: SelectionRecord, from_input: bool) {
        let (value, cleared_input, picker) = {
            let mut guard = self.write();
            let inner = &mut *guard;
            let at = at.unwrap_or_else(|| inner.caret(&inner.focus));
            let value = record.value.clone();
            let Some(at) = inner.chips.insert(at, record) else {
                return;
            };
            inner.relayout(at);

            let cleared_input = from_input && !inner.input.is_empty();
            if from_input {
                inner.input.clear();
                // Keep the caret right after the new chip.
                if inner.focus != Slot::Primary {
                    let trailing = Slot::Trailing(value.clone());
                    inner.focus = if inner.slot_in_flow(&trailing) {
                        trailing
                    } else {
                        inner.slot_at_caret(at + 1)
                    };
                }
                if inner.config.mode.is_single() && !inner.primary_in_flow {
                    inner.focus = Slot::Leading(value.clone());
                }
            }
            (value, cleared_input, inner.picker())
        };

        log::debug!("[selector] {} added '{}'", self.shared.id, value);
        if cleared_input && let Some(picker) = picker {
            picker.on_input_changed("");
        }
        self.emit_change();
    }

    fn remove_chip(&self, value: &str) {
        {
            let mut guard = self.write();
            let inner = &mut *guard;
            let Some((at, _chip)) = inner.chips.remove(value) else {
                return;
            };
            let focus_gone = matches!(
                &inner.focus,
                Slot::Leading(v) | Slot::Trailing(v) if v == value
            );
            if focus_gone {
                inner.focus = inner.slot_at_caret(at);
            }
            if inner.drag.as_ref().is_some_and(|drag| drag.value == value) {
                inner.drag = None;
            }
            inner.relayout(at);
        }

        log::debug!("[selector] {} removed '{}'", self.shared.id, value);
        self.emit_change();
    }

    // -------------------------------------------------------------------------
    // Serialized value
    // -------------------------------------------------------------------------

    /// The valid selections serialized as `title=value;...`.
    pub fn value(&self) -> String {
        encode_value(self.read().chips.iter().map(|chip| &chip.record))
    }

    /// Replace the selection with a serialized value.
    ///
    /// Each entry is offered to the picker as a regular add. An entry the
    /// picker refuses is kept as an invalid record so the persisted value
    /// is not silently lost. Fires at most one change notification.
    pub fn set_value(&self, serialized: &str) -> Result<(), SelectorError> {
        let records = decode_value(serialized);
        log::debug!(
            "[selector] {} set_value with {} entries",
            self.shared.id,
            records.len()
        );
        self.batch(|s| -> Result<(), SelectorError> {
            s.write().focus = Slot::Primary;
            s.clear_guarded(|_| false)?;
            for record in records {
                let SelectionRecord { title, value, .. } = record;
                if !s.add_guarded(title.clone(), value.clone(), true)? && !s.contains(&value) {
                    log::debug!("[selector] {} keeping '{}' as invalid", s.shared.id, value);
                    s.add_guarded(title, value, false)?;
                }
            }
            Ok(())
        })
    }

    // -------------------------------------------------------------------------
    // Dirty tracking
    // -------------------------------------------------------------------------

    /// Whether the serialized value differs from the last clean state.
    pub fn is_dirty(&self) -> bool {
        let clean = self.read().clean_value.clone();
        self.value() != clean
    }

    /// Make the current value the clean state.
    pub fn mark_clean(&self) {
        let value = self.value();
        self.write().clean_value = value;
    }
}
