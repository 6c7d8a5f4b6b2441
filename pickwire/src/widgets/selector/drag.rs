//! Drag reordering of chips.

use crate::geometry::DropHalf;

use super::chips::{SelectionList, Slot};
use super::state::Selector;

/// A drag in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragState {
    /// Value of the chip being dragged.
    pub value: String,
}

/// Where `dragged` ends up when dropped on `half` of `target`.
///
/// Returns the destination index (in the list with the dragged chip taken
/// out), or None when the drop would not change the order: dropping on
/// itself, on the right half of its immediate predecessor, or on the left
/// half of its immediate successor.
pub fn plan_move(
    list: &SelectionList,
    dragged: &str,
    target: &str,
    half: DropHalf,
) -> Option<usize> {
    let from = list.position(dragged)?;
    let onto = list.position(target)?;
    if from == onto {
        return None;
    }

    match half {
        DropHalf::Right if from == onto + 1 => return None,
        DropHalf::Left if from + 1 == onto => return None,
        _ => {}
    }

    let onto_after_removal = if from < onto { onto - 1 } else { onto };
    Some(match half {
        DropHalf::Left => onto_after_removal,
        DropHalf::Right => onto_after_removal + 1,
    })
}

impl Selector {
    /// Start dragging the chip with `value`.
    pub fn begin_drag(&self, value: &str) -> bool {
        let mut inner = self.write();
        if !inner.chips.contains(value) {
            return false;
        }
        log::trace!("[drag] {} picked up '{}'", self.id(), value);
        inner.drag = Some(DragState {
            value: value.to_string(),
        });
        true
    }

    /// Value of the chip being dragged.
    pub fn dragging(&self) -> Option<String> {
        self.read().drag.as_ref().map(|drag| drag.value.clone())
    }

    pub fn cancel_drag(&self) {
        self.write().drag = None;
    }

    /// Drop the dragged chip at a point in chip-area coordinates. A point
    /// off every chip cancels the drag.
    pub fn drop_at(&self, x: u16, y: u16) -> bool {
        match self.chip_at(x, y) {
            Some(target) => self.drop_on(target.value(), DropHalf::at(&target.rect, x)),
            None => {
                self.cancel_drag();
                false
            }
        }
    }

    /// Drop the dragged chip onto `half` of `target`. Returns true if the
    /// order changed. The drag ends either way.
    pub fn drop_on(&self, target: &str, half: DropHalf) -> bool {
        {
            let mut guard = self.write();
            let inner = &mut *guard;
            let Some(drag) = inner.drag.take() else {
                return false;
            };
            let Some(to) = plan_move(&inner.chips, &drag.value, target, half) else {
                log::trace!("[drag] {} drop of '{}' changes nothing", self.id(), drag.value);
                return false;
            };
            let Some(from) = inner.chips.position(&drag.value) else {
                return false;
            };

            // Slot values stay valid across a move, but the caret would jump.
            inner.focus = Slot::Primary;
            inner.chips.move_to(from, to);
            inner.relayout(from.min(to));
            log::debug!("[drag] {} moved '{}' {} -> {}", self.id(), drag.value, from, to);
        }
        self.emit_change();
        true
    }
}
