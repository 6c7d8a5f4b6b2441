//! List picker - a flat list of entries filtered by the selector's input text.

mod events;
mod picker;

pub use picker::{ListEntry, ListId, ListPicker};
