//! Shared selection mode for the selector and its pickers.

use serde::{Deserialize, Serialize};

/// How many entries may be selected at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionMode {
    /// At most one entry; selecting another replaces it.
    Single,
    /// Any number of entries.
    #[default]
    Multi,
}

impl SelectionMode {
    pub fn is_single(self) -> bool {
        self == SelectionMode::Single
    }
}
