//! Multi-entry selector with pluggable pickers.
//!
//! A [`Selector`](widgets::Selector) shows chosen entries as chips and
//! keeps them in two-way sync with an attached [`Picker`](picker::Picker),
//! such as the bundled [`TreePicker`](widgets::TreePicker) or
//! [`ListPicker`](widgets::ListPicker). The selection serializes to a
//! compact `title=value;...` string through [`value`].

pub mod config;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod geometry;
pub mod picker;
pub mod record;
pub mod sync;
pub mod value;
pub mod widgets;

pub use config::SelectorConfig;
pub use error::{PickerError, SelectorError};
pub use record::SelectionRecord;
pub use widgets::Selector;

pub mod prelude {
    pub use crate::config::SelectorConfig;
    pub use crate::coordinator::SurfaceCoordinator;
    pub use crate::error::{PickerError, SelectorError};
    pub use crate::event::{Key, KeyResult, Modifiers, MouseButton, WidgetResult};
    pub use crate::geometry::{DropHalf, Rect};
    pub use crate::picker::{FnListener, ItemChange, ListenerId, Picker, PickerListener};
    pub use crate::record::SelectionRecord;
    pub use crate::sync::SyncState;
    pub use crate::value::{decode_value, encode_value};
    pub use crate::widgets::{
        Chip, ListEntry, ListPicker, NodeId, SelectionMode, Selector, SelectorId, Slot,
        TreePicker,
    };
}
