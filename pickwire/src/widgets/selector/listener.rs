//! Picker attachment and the selector's side of the picker event stream.

use std::collections::HashSet;
use std::sync::{Arc, MutexGuard, PoisonError, Weak};

use crate::coordinator::Surface;
use crate::error::SelectorError;
use crate::picker::{ItemChange, Picker, PickerListener};
use crate::record::SelectionRecord;
use crate::sync::SyncState;

use super::state::{AttachedPicker, Selector, Shared};

/// Subscribed to the attached picker on the selector's behalf.
///
/// Holds the selector weakly so a picker outliving its host does not keep
/// it alive.
struct HostListener {
    shared: Weak<Shared>,
}

impl HostListener {
    fn selector(&self) -> Option<Selector> {
        self.shared.upgrade().map(Selector::from_shared)
    }
}

impl PickerListener for HostListener {
    fn on_item_selection_changing(&self, change: &ItemChange) -> bool {
        self.selector()
            .is_none_or(|selector| selector.accepts_picker_change(change))
    }

    fn on_item_selection_changed(&self, change: &ItemChange) {
        let Some(selector) = self.selector() else {
            return;
        };
        if let Err(err) = selector.picker_changed(change) {
            log::warn!(
                "[selector] {} could not apply picker change to '{}': {}",
                selector.id(),
                change.value,
                err
            );
            selector.resync_from_picker();
        }
    }

    fn on_item_selection_complete(&self) {
        if let Some(selector) = self.selector() {
            selector.picker_complete();
        }
    }
}

impl Selector {
    // -------------------------------------------------------------------------
    // Picker attachment
    // -------------------------------------------------------------------------

    /// Attach a picker, replacing the current one, or detach with None.
    ///
    /// The new picker's selection is replaced with the valid host
    /// selections. Host entries the picker did not take are marked invalid,
    /// so afterwards the valid host values equal the picker's selection.
    pub fn set_picker(&self, picker: Option<Arc<dyn Picker>>) -> Result<(), SelectorError> {
        let (previous, open) = {
            let mut inner = self.write();
            (inner.picker.take(), inner.open)
        };
        if let Some(previous) = previous {
            previous.picker.unsubscribe(previous.listener);
            if open {
                previous.picker.on_hide();
            }
            log::debug!("[selector] {} detached {}", self.id(), previous.picker.id());
        }

        let Some(picker) = picker else {
            return Ok(());
        };

        let listener = picker.subscribe(Arc::new(HostListener {
            shared: self.downgrade(),
        }));
        self.write().picker = Some(AttachedPicker {
            picker: Arc::clone(&picker),
            listener,
        });
        log::debug!("[selector] {} attached {}", self.id(), picker.id());

        let valid: Vec<SelectionRecord> = self
            .selections()
            .into_iter()
            .filter(|record| record.valid)
            .collect();
        self.batch(|s| -> Result<(), SelectorError> {
            {
                let _guard = s.shared.sync.acquire_from_host(None)?;
                picker.set_selections(&valid)?;
            }
            let held: HashSet<String> =
                picker.selections().into_iter().map(|record| record.value).collect();
            s.invalidate_missing(&held);
            Ok(())
        })?;

        if open {
            picker.on_show();
        }
        Ok(())
    }

    pub fn picker(&self) -> Option<Arc<dyn Picker>> {
        self.read().picker()
    }

    // -------------------------------------------------------------------------
    // Surface
    // -------------------------------------------------------------------------

    pub fn is_open(&self) -> bool {
        self.read().open
    }

    /// Open the picker surface. Returns false if already open.
    pub fn open(&self) -> bool {
        let picker = {
            let mut inner = self.write();
            if inner.open {
                return false;
            }
            inner.open = true;
            inner.picker()
        };
        if let Some(coordinator) = &self.shared.coordinator {
            let weak: Weak<Shared> = self.downgrade();
            let surface: Weak<dyn Surface> = weak;
            coordinator.claim(&self.id().to_string(), surface);
        }
        if let Some(picker) = picker {
            picker.on_show();
        }
        log::debug!("[selector] {} opened", self.id());
        true
    }

    /// Close the picker surface. Returns false if it was not open.
    pub fn close(&self) -> bool {
        self.shared.close()
    }

    // -------------------------------------------------------------------------
    // Picker events
    // -------------------------------------------------------------------------

    /// Refuse a picker-side select the selector could not hold.
    fn accepts_picker_change(&self, change: &ItemChange) -> bool {
        // `selected` is the state before the toggle.
        if change.selected || self.shared.sync.state() != SyncState::Idle {
            return true;
        }
        let inner = self.read();
        let full = !inner.config.mode.is_single()
            && !inner.chips.contains(&change.value)
            && inner
                .config
                .max_selections
                .is_some_and(|max| inner.chips.len() >= max);
        if full {
            log::debug!("[selector] {} is full, vetoing '{}'", self.id(), change.value);
        }
        !full
    }

    fn picker_changed(&self, change: &ItemChange) -> Result<(), SelectorError> {
        match self.shared.sync.state() {
            SyncState::ApplyingFromHost if self.shared.sync.is_in_flight(&change.value) => {
                log::trace!("[selector] {} echo of '{}' skipped", self.id(), change.value);
                Ok(())
            }
            SyncState::Idle => {
                // First change of a picker burst: hold notifications until
                // the picker reports completion.
                self.shared.notify.begin_burst(|| self.selections());
                self.shared
                    .sync
                    .acquire_from_picker()
                    .and_then(|_guard| self.apply_change(change))?;
                self.reconcile_evicted()
            }
            // Side effects of a forwarded change, or a nested picker event:
            // applied here, never forwarded back.
            _ => self.apply_change(change).map(|_| ()),
        }
    }

    fn apply_change(&self, change: &ItemChange) -> Result<bool, SelectorError> {
        log::debug!(
            "[selector] {} picker {} '{}'",
            self.id(),
            if change.selected { "selected" } else { "deselected" },
            change.value
        );
        if change.selected {
            if self.revalidate(&change.value) {
                return Ok(true);
            }
            self.add_guarded(change.title.clone(), change.value.clone(), true)
        } else {
            self.remove_guarded(&change.value)
        }
    }

    /// The picker selected an entry the host keeps as invalid.
    fn revalidate(&self, value: &str) -> bool {
        if !self.write().chips.set_valid(value, true) {
            return false;
        }
        log::debug!("[selector] {} '{}' is valid again", self.id(), value);
        self.emit_change();
        true
    }

    /// Deselect in the picker what a picker-driven single-mode change
    /// dropped host-side. A value the picker fails on stays queued for the
    /// next picker change.
    fn reconcile_evicted(&self) -> Result<(), SelectorError> {
        let Some(picker) = self.picker() else {
            self.evicted_queue().clear();
            return Ok(());
        };
        let pending = std::mem::take(&mut *self.evicted_queue());
        for (at, value) in pending.iter().enumerate() {
            if self.contains(value) {
                continue;
            }
            if let Err(err) = self.forward(&picker, value, false) {
                self.evicted_queue().extend(pending[at..].iter().cloned());
                return Err(err);
            }
        }
        Ok(())
    }

    fn evicted_queue(&self) -> MutexGuard<'_, Vec<String>> {
        self.shared
            .evicted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn picker_complete(&self) {
        if self.shared.sync.state() != SyncState::Idle {
            return;
        }
        if self.shared.notify.in_burst() {
            log::trace!("[selector] {} picker burst complete", self.id());
        }
        self.shared.notify.end_burst();
        self.flush();
    }
}
