//! Selector configuration.

use std::time::Duration;

use crate::widgets::selection::SelectionMode;

/// Per-selector configuration.
///
/// Geometry is measured in terminal cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Single or multi selection.
    pub mode: SelectionMode,

    /// Inner width of the chip area.
    pub width: u16,

    /// Whether the control is currently laid out on screen. Tab order cannot
    /// be computed while hidden.
    pub visible: bool,

    /// Cells a trailing input slot needs on its row to stay in tab flow.
    pub min_slot_width: u16,

    /// Cells a chip adds around its title (border and delete affordance).
    pub chip_chrome: u16,

    /// Quiet period before a reported width change is applied.
    pub layout_debounce: Duration,

    /// Upper bound on the number of chips (None = unlimited).
    pub max_selections: Option<usize>,

    /// Open the picker surface when the user starts typing.
    pub open_on_input: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::Multi,
            width: 40,
            visible: true,
            min_slot_width: 2,
            chip_chrome: 4,
            layout_debounce: Duration::from_millis(100),
            max_selections: None,
            open_on_input: true,
        }
    }
}

impl SelectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-selection config.
    pub fn single() -> Self {
        Self::default().mode(SelectionMode::Single)
    }

    pub fn mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    /// Start hidden; tab order is computed once the control becomes visible.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn min_slot_width(mut self, cells: u16) -> Self {
        self.min_slot_width = cells;
        self
    }

    pub fn chip_chrome(mut self, cells: u16) -> Self {
        self.chip_chrome = cells;
        self
    }

    pub fn layout_debounce(mut self, debounce: Duration) -> Self {
        self.layout_debounce = debounce;
        self
    }

    pub fn max_selections(mut self, max: usize) -> Self {
        self.max_selections = Some(max);
        self
    }

    pub fn open_on_input(mut self, open: bool) -> Self {
        self.open_on_input = open;
        self
    }
}
