//! Focus, input slots and chip geometry.

use std::time::Instant;

use crate::error::SelectorError;
use crate::widgets::selection::SelectionMode;

use super::chips::{Chip, Slot};
use super::state::Selector;
use super::tab_order;

impl Selector {
    /// Chips in display order, with their current geometry.
    pub fn chips(&self) -> Vec<Chip> {
        self.read().chips.iter().cloned().collect()
    }

    /// Chip under a point in chip-area coordinates.
    pub fn chip_at(&self, x: u16, y: u16) -> Option<Chip> {
        let inner = self.read();
        if inner.layout_stale {
            return None;
        }
        inner.chips.iter().find(|chip| chip.rect.contains(x, y)).cloned()
    }

    pub fn focused_slot(&self) -> Slot {
        self.read().focus.clone()
    }

    /// Move focus to `slot`. Slots out of tab flow can still be focused
    /// directly (by mouse); unknown chips cannot.
    pub fn focus_slot(&self, slot: Slot) -> bool {
        let picker = {
            let mut inner = self.write();
            let known = match &slot {
                Slot::Leading(value) | Slot::Trailing(value) => inner.chips.contains(value),
                Slot::Primary => true,
            };
            if !known {
                return false;
            }
            if inner.focus == slot {
                return true;
            }
            inner.focus = slot;
            if inner.input.is_empty() {
                None
            } else {
                inner.input.clear();
                inner.picker()
            }
        };
        if let Some(picker) = picker {
            picker.on_input_changed("");
        }
        true
    }

    pub fn input_text(&self) -> String {
        self.read().input.clone()
    }

    /// Replace the text of the focused slot and pass it on to the picker.
    pub fn set_input_text(&self, text: impl Into<String>) {
        let text = text.into();
        let (picker, open_on_input) = {
            let mut inner = self.write();
            if inner.input == text {
                return;
            }
            inner.input = text.clone();
            (inner.picker(), inner.config.open_on_input)
        };
        if let Some(picker) = picker {
            picker.on_input_changed(&text);
        }
        if open_on_input && !text.is_empty() {
            self.open();
        }
    }

    /// Slots reachable with Tab, in order.
    pub fn tab_stops(&self) -> Vec<Slot> {
        let inner = self.read();
        tab_order::tab_stops(inner.chips.as_slice(), inner.primary_in_flow)
    }

    pub fn slot_in_tab_flow(&self, slot: &Slot) -> bool {
        self.read().slot_in_flow(slot)
    }

    pub fn is_visible(&self) -> bool {
        self.read().config.visible
    }

    /// Show or hide the control. Tab order deferred while hidden is
    /// computed when it becomes visible again.
    pub fn set_visible(&self, visible: bool) {
        let mut inner = self.write();
        if inner.config.visible == visible {
            return;
        }
        inner.config.visible = visible;
        if visible {
            inner.relayout(0);
        }
    }

    /// Apply a new chip-area width right away.
    pub fn set_width(&self, width: u16) {
        let mut inner = self.write();
        if inner.config.width == width {
            return;
        }
        log::debug!("[selector] {} width {} -> {}", self.id(), inner.config.width, width);
        inner.config.width = width;
        inner.relayout(0);
    }

    /// Report a width from a resize event. Applied by [`Selector::tick`]
    /// once reports settle.
    pub fn observe_width(&self, width: u16, now: Instant) {
        self.write().watch.observe(width, now);
    }

    /// Apply a settled width report. Returns true if the layout changed.
    pub fn tick(&self, now: Instant) -> bool {
        if !self.read().watch.is_pending() {
            return false;
        }
        let settled = self.write().watch.poll(now);
        match settled {
            Some(width) if width != self.read().config.width => {
                self.set_width(width);
                true
            }
            _ => false,
        }
    }

    /// Switch between single and multi selection. Clears the selection.
    ///
    /// Returns `Ok(false)` and keeps the current mode when the picker
    /// refuses to deselect an entry.
    pub fn set_mode(&self, mode: SelectionMode) -> Result<bool, SelectorError> {
        if self.read().config.mode == mode {
            return Ok(true);
        }
        self.batch(|s| -> Result<bool, SelectorError> {
            s.clear_guarded(|_| false)?;
            let mut inner = s.write();
            if !inner.chips.is_empty() {
                log::debug!(
                    "[selector] {} keeps mode {:?}, {} entries could not be cleared",
                    s.id(),
                    inner.config.mode,
                    inner.chips.len()
                );
                return Ok(false);
            }
            inner.config.mode = mode;
            inner.focus = Slot::Primary;
            inner.relayout(0);
            Ok(true)
        })
    }
}
