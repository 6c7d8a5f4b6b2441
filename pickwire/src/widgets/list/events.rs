//! Keyboard handling for the List picker.

use crate::event::{Key, KeyResult, Modifiers};

use super::picker::ListPicker;

impl ListPicker {
    /// Up/Down/Home/End move the cursor over the filtered entries; Enter
    /// toggles the entry under it. Space is left to the host because it is
    /// part of the filter text.
    pub(super) fn navigate(&self, key: Key, modifiers: Modifiers) -> KeyResult {
        if !modifiers.none() && !modifiers.shift {
            return KeyResult::Continue;
        }

        match key {
            Key::Up | Key::Down | Key::Home | Key::End => {
                let mut inner = self.write();
                if !inner.shown || inner.filtered.is_empty() {
                    return KeyResult::Continue;
                }
                let last = inner.filtered.len() - 1;
                inner.cursor = Some(match (key, inner.cursor) {
                    (Key::Up, Some(c)) => c.saturating_sub(1),
                    (Key::Up, None) | (Key::End, _) => last,
                    (Key::Down, Some(c)) => (c + 1).min(last),
                    _ => 0,
                });
                KeyResult::Suppress
            }
            Key::Enter => {
                if !self.is_shown() {
                    return KeyResult::Continue;
                }
                match self.cursor_value() {
                    Some(value) => {
                        self.toggle(&value);
                        KeyResult::Suppress
                    }
                    None => KeyResult::Continue,
                }
            }
            _ => KeyResult::Continue,
        }
    }
}
