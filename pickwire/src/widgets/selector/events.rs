//! Keyboard and mouse handling for the selector.

use crate::error::SelectorError;
use crate::event::{Key, KeyResult, Modifiers, MouseButton, WidgetResult};

use super::chips::Slot;
use super::state::Selector;
use super::tab_order;

impl Selector {
    /// Handle a key. The open picker sees it first and may suppress it.
    pub fn handle_key(&self, key: Key, modifiers: Modifiers) -> Result<WidgetResult, SelectorError> {
        let (open, picker) = {
            let inner = self.read();
            (inner.open, inner.picker())
        };
        if open
            && let Some(picker) = picker
            && picker.handle_key(key, modifiers) == KeyResult::Suppress
        {
            log::trace!("[selector] {} key {:?} taken by {}", self.id(), key, picker.id());
            return Ok(WidgetResult::Handled);
        }

        let input_empty = self.read().input.is_empty();
        let result = match key {
            Key::Char(c) if !modifiers.ctrl && !modifiers.alt => {
                let mut text = self.input_text();
                text.push(c);
                self.set_input_text(text);
                WidgetResult::Handled
            }
            Key::Backspace if !input_empty => {
                let mut text = self.input_text();
                text.pop();
                self.set_input_text(text);
                WidgetResult::Handled
            }
            Key::Backspace => self.remove_beside_caret(-1)?,
            Key::Delete if input_empty => self.remove_beside_caret(0)?,
            Key::Left if input_empty => self.move_caret(-1),
            Key::Right if input_empty => self.move_caret(1),
            Key::Tab if modifiers.shift => self.tab(false),
            Key::Tab => self.tab(true),
            Key::BackTab => self.tab(false),
            Key::Down if !open => {
                self.open();
                WidgetResult::Opened
            }
            Key::Enter if open => {
                self.close();
                WidgetResult::Closed
            }
            Key::Enter => {
                self.open();
                WidgetResult::Opened
            }
            Key::Escape if open => {
                self.close();
                WidgetResult::Closed
            }
            _ => WidgetResult::Ignored,
        };
        Ok(result)
    }

    /// Remove the chip just before (`-1`) or just after (`0`) the caret.
    fn remove_beside_caret(&self, offset: isize) -> Result<WidgetResult, SelectorError> {
        let value = {
            let inner = self.read();
            let caret = inner.caret(&inner.focus);
            caret
                .checked_add_signed(offset)
                .and_then(|index| inner.chips.at(index))
                .map(|chip| chip.record.value.clone())
        };
        let Some(value) = value else {
            return Ok(WidgetResult::Handled);
        };
        Ok(if self.remove_selection(&value)? {
            WidgetResult::Changed
        } else {
            WidgetResult::Handled
        })
    }

    fn move_caret(&self, step: isize) -> WidgetResult {
        let target = {
            let inner = self.read();
            let caret = inner.caret(&inner.focus);
            let Some(next) = caret.checked_add_signed(step) else {
                return WidgetResult::Handled;
            };
            if next > inner.chips.len() {
                return WidgetResult::Handled;
            }
            let slot = inner.slot_at_caret(next);
            if !inner.slot_in_flow(&slot) {
                return WidgetResult::Handled;
            }
            slot
        };
        self.focus_slot(target);
        WidgetResult::Handled
    }

    /// Step through tab stops. Stepping past either end leaves the control.
    fn tab(&self, forward: bool) -> WidgetResult {
        let target = {
            let inner = self.read();
            let stops = tab_order::tab_stops(inner.chips.as_slice(), inner.primary_in_flow);
            let next = match stops.iter().position(|stop| *stop == inner.focus) {
                Some(index) if forward => stops.get(index + 1),
                Some(index) => index.checked_sub(1).and_then(|i| stops.get(i)),
                // Focus sits on a slot that dropped out of flow: continue
                // from its caret position.
                None => {
                    let caret = inner.caret(&inner.focus);
                    if forward {
                        stops.iter().find(|stop| inner.caret(stop) >= caret)
                    } else {
                        stops.iter().rev().find(|stop| inner.caret(stop) < caret)
                    }
                }
            };
            match next {
                Some(slot) => slot.clone(),
                None => return WidgetResult::Ignored,
            }
        };
        self.focus_slot(target);
        WidgetResult::Handled
    }

    /// Mouse press in chip-area coordinates. Pressing a chip starts a drag;
    /// pressing elsewhere focuses the primary input.
    pub fn press(&self, x: u16, y: u16, button: MouseButton) -> WidgetResult {
        if button != MouseButton::Left {
            return WidgetResult::Ignored;
        }
        match self.chip_at(x, y) {
            Some(chip) => {
                self.begin_drag(chip.value());
                WidgetResult::Handled
            }
            None => {
                self.focus_slot(Slot::Primary);
                WidgetResult::Handled
            }
        }
    }

    /// Mouse release. Ends a drag, dropping onto the chip under the pointer.
    pub fn release(&self, x: u16, y: u16, button: MouseButton) -> WidgetResult {
        if button != MouseButton::Left || self.dragging().is_none() {
            return WidgetResult::Ignored;
        }
        if self.drop_at(x, y) {
            WidgetResult::Changed
        } else {
            WidgetResult::Handled
        }
    }
}
