//! The contract between a selector and a pluggable picker.
//!
//! A picker decides what is selectable. The selector asks it to toggle
//! entries through [`Picker::update_item_selection`]; the picker reports
//! every change it makes, whoever asked for it, through the three
//! [`PickerListener`] events:
//!
//! ```text
//! changing (vetoable) -> changed -> ... -> complete (once per burst)
//! ```
//!
//! All calls are synchronous. A picker must not hold its own locks while
//! listeners run, since a listener may call straight back into it.

mod cache;
mod events;
mod filter;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub use cache::SelectedSet;
pub use events::{FnListener, PickerEvents};
pub use filter::{FilterMatch, fuzzy_filter};

use crate::error::PickerError;
use crate::event::{Key, KeyResult, Modifiers};
use crate::record::SelectionRecord;

/// Handle returned by [`Picker::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

impl ListenerId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

/// One entry's selection transition.
///
/// For *changing* `selected` is the state before the toggle; for *changed*
/// it is the state after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemChange {
    pub title: String,
    pub value: String,
    pub selected: bool,
}

impl ItemChange {
    pub fn new(title: impl Into<String>, value: impl Into<String>, selected: bool) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            selected,
        }
    }

    /// The same entry with the opposite state.
    pub fn flipped(&self) -> Self {
        Self {
            selected: !self.selected,
            ..self.clone()
        }
    }
}

/// Receives a picker's selection events.
pub trait PickerListener: Send + Sync {
    /// Called before a toggle. Returning `false` vetoes it; the picker must
    /// then leave its state untouched and fire no *changed* for it.
    fn on_item_selection_changing(&self, change: &ItemChange) -> bool {
        let _ = change;
        true
    }

    /// Called after the picker flipped an entry. Not cancelable.
    fn on_item_selection_changed(&self, change: &ItemChange);

    /// Called once after a burst of related changes settled.
    fn on_item_selection_complete(&self) {}
}

/// Capability set every pluggable picker implements.
pub trait Picker: Send + Sync {
    /// Identifier used in logs and errors.
    fn id(&self) -> String;

    /// Current selections in the picker's own order.
    fn selections(&self) -> Vec<SelectionRecord>;

    /// Replace the picker's selection with the host's on attach. Entries
    /// the picker does not know are ignored; anything selected before is
    /// dropped. Firing change events is not required.
    fn set_selections(&self, items: &[SelectionRecord]) -> Result<(), PickerError>;

    /// Toggle one entry on the host's behalf.
    ///
    /// Returns `Ok(false)` if the value is unknown or the change was vetoed.
    /// On `Ok(true)` the picker has already fired *changing* and *changed*
    /// for everything it altered.
    fn update_item_selection(&self, value: &str, selected: bool) -> Result<bool, PickerError>;

    fn subscribe(&self, listener: Arc<dyn PickerListener>) -> ListenerId;

    fn unsubscribe(&self, id: ListenerId) -> bool;

    /// The host attached the picker's surface to the viewport.
    fn on_show(&self) {}

    /// The host detached the picker's surface.
    fn on_hide(&self) {}

    /// Offered every key while the surface is open, before the host's own
    /// handling.
    fn handle_key(&self, key: Key, modifiers: Modifiers) -> KeyResult {
        let _ = (key, modifiers);
        KeyResult::Continue
    }

    /// The text in the host's active input slot changed.
    fn on_input_changed(&self, text: &str) {
        let _ = text;
    }
}
