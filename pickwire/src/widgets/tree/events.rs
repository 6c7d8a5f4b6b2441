//! Keyboard handling for the Tree picker.

use crate::event::{Key, KeyResult, Modifiers};

use super::picker::TreePicker;
use super::state::NodeId;

impl TreePicker {
    /// Arrow-key navigation over the visible nodes.
    ///
    /// Up/Down/Home/End/PageUp/PageDown move the cursor, Right expands (or
    /// steps into the first child), Left collapses (or steps out to the
    /// parent), Space/Enter toggle the cursor node. Keys are only taken while
    /// the tree is shown.
    pub(super) fn navigate(&self, key: Key, modifiers: Modifiers) -> KeyResult {
        if !self.is_shown() || modifiers.ctrl || modifiers.alt {
            return KeyResult::Continue;
        }

        let visible = self.visible_nodes();
        if visible.is_empty() {
            return KeyResult::Continue;
        }
        let position = self
            .cursor()
            .and_then(|cursor| visible.iter().position(|node| node.id == cursor));
        let last = visible.len() - 1;

        let move_to = |index: usize| -> KeyResult {
            self.set_cursor(visible[index].id);
            KeyResult::Suppress
        };

        match key {
            Key::Up => match position {
                Some(0) => KeyResult::Suppress,
                Some(i) => move_to(i - 1),
                None => move_to(last),
            },
            Key::Down => match position {
                Some(i) if i >= last => KeyResult::Suppress,
                Some(i) => move_to(i + 1),
                None => move_to(0),
            },
            Key::Home => move_to(0),
            Key::End => move_to(last),
            Key::PageUp => move_to(position.unwrap_or(0).saturating_sub(10)),
            Key::PageDown => move_to((position.unwrap_or(0) + 10).min(last)),
            Key::Right => {
                let Some(i) = position else {
                    return KeyResult::Continue;
                };
                let node = &visible[i];
                if node.has_children && !node.expanded {
                    self.expand(node.id);
                } else if node.has_children && i < last {
                    return move_to(i + 1);
                }
                KeyResult::Suppress
            }
            Key::Left => {
                let Some(i) = position else {
                    return KeyResult::Continue;
                };
                let node = &visible[i];
                if node.expanded {
                    self.collapse(node.id);
                } else if let Some(parent) = self.parent_of(node.id) {
                    self.set_cursor(parent);
                }
                KeyResult::Suppress
            }
            Key::Char(' ') | Key::Enter => {
                if let Some(i) = position {
                    self.toggle_node(visible[i].id);
                    KeyResult::Suppress
                } else {
                    KeyResult::Continue
                }
            }
            _ => KeyResult::Continue,
        }
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.read().node(id).and_then(|node| node.parent)
    }
}
