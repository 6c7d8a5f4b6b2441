//! Error types.
//!
//! Routine rejections (duplicate add, unknown value, veto) are not errors;
//! the selector reports them as `Ok(false)`. The variants here mean a picker
//! broke its contract or the sync protocol was driven from the wrong place.

use thiserror::Error;

use crate::sync::SyncState;

/// Errors raised by picker implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PickerError {
    /// The picker could not carry out a contract call.
    #[error("Picker '{picker}' failed: {message}")]
    Failed {
        /// Identifier of the failing picker.
        picker: String,
        /// What went wrong.
        message: String,
    },

    /// A node handle does not belong to the tree (or was removed).
    #[error("Node {0} does not exist")]
    UnknownNode(usize),

    /// Picker entries are keyed by value; a second entry with the same value was added.
    #[error("Value '{0}' is already used by another entry")]
    DuplicateValue(String),
}

impl PickerError {
    pub fn failed(picker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            picker: picker.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the selector's mutation API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorError {
    /// The attached picker failed while a change was being forwarded to it.
    #[error(transparent)]
    Picker(#[from] PickerError),

    /// A forwarding call was attempted while a sync was already in progress.
    #[error("Selection sync re-entered while {state} was in progress")]
    Reentrant {
        /// The latch state that blocked the call.
        state: SyncState,
    },
}
