//! Multi-entry selector.
//!
//! Chosen entries are shown as chips. Every chip has an input slot before
//! and after it, so a new entry can be typed at any position; the primary
//! input follows the last chip. Entries usually come from an attached
//! [`Picker`](crate::picker::Picker), and the two sides stay in sync in
//! both directions:
//!
//! - adding or removing here is forwarded to the picker, which may veto it
//! - a change the picker reports is applied here without being forwarded back
//!
//! Each net change fires the `on_change` callbacks exactly once, after the
//! tab order has been updated.
//!
//! # Example
//!
//! ```ignore
//! let tree = Arc::new(TreePicker::new());
//! let europe = tree.add_root("Europe", "EU")?;
//! tree.add_child(europe, "Denmark", "DK")?;
//!
//! let selector = Selector::new(SelectorConfig::default());
//! selector.set_picker(Some(tree.clone()))?;
//! selector.add_selection("Denmark", "DK")?;
//! assert!(tree.node_by_value("DK").is_some_and(|id| tree.is_selected(id)));
//! ```

mod chips;
mod drag;
mod events;
mod layout;
mod listener;
mod state;
mod tab_order;

pub use chips::{Chip, SelectionList, Slot};
pub use drag::{DragState, plan_move};
pub use state::{CallbackId, Selector, SelectorId};
pub use tab_order::{LayoutWatch, chip_width, optimize, tab_stops};
