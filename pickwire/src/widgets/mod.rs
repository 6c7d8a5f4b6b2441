//! Built-in widgets.
//!
//! - [`selector`] - the multi-entry selector that shows chosen entries as chips
//! - [`tree`] - a hierarchical list that can act as the selector's picker
//! - [`list`] - a flat, filterable list that can act as the selector's picker

pub mod list;
pub mod selection;
pub mod selector;
pub mod tree;

pub use list::{ListEntry, ListPicker};
pub use selection::SelectionMode;
pub use selector::{Chip, Selector, SelectorId, Slot};
pub use tree::{NodeId, TreeNode, TreePicker, VisibleNode};
