//! Tree picker - a hierarchical list usable as a selector's picker.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pickwire::prelude::*;
//!
//! let tree = Arc::new(TreePicker::new());
//! let europe = tree.add_root("Europe", "EU")?;
//! tree.add_child(europe, "Denmark", "DK")?;
//! tree.add_child(europe, "Germany", "DE")?;
//! tree.expand(europe);
//!
//! let selector = Selector::new(SelectorConfig::default());
//! selector.set_picker(Some(tree.clone()))?;
//! selector.add_selection("Denmark", "DK")?; // also selects the tree node
//! ```

mod events;
mod picker;
mod state;

pub use picker::{TreeId, TreePicker};
pub use state::{NodeId, TreeNode, VisibleNode};
