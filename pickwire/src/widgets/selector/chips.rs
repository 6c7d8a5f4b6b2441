//! The selector's ordered chip list.

use std::collections::HashMap;

use crate::geometry::Rect;
use crate::record::SelectionRecord;

/// An input slot of the selector, identified by the chip it sits beside.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Slot {
    /// The slot immediately before the chip.
    Leading(String),
    /// The slot immediately after the chip.
    Trailing(String),
    /// The main input after the last chip.
    #[default]
    Primary,
}

/// One selection record plus the state derived from its layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    pub record: SelectionRecord,
    /// Whether the leading slot is reachable with Tab.
    pub leading_in_flow: bool,
    /// Whether the trailing slot is reachable with Tab.
    pub trailing_in_flow: bool,
    /// Position in the chip area, valid after the last tab-order pass.
    pub rect: Rect,
}

impl Chip {
    pub fn new(record: SelectionRecord) -> Self {
        Self {
            record,
            leading_in_flow: true,
            trailing_in_flow: true,
            rect: Rect::default(),
        }
    }

    pub fn value(&self) -> &str {
        &self.record.value
    }
}

/// Ordered chips with a value -> position index.
///
/// Values are unique; `insert` refuses a value already present.
#[derive(Debug, Clone, Default)]
pub struct SelectionList {
    chips: Vec<Chip>,
    index: HashMap<String, usize>,
}

impl SelectionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.index.contains_key(value)
    }

    pub fn position(&self, value: &str) -> Option<usize> {
        self.index.get(value).copied()
    }

    pub fn get(&self, value: &str) -> Option<&Chip> {
        self.position(value).and_then(|i| self.chips.get(i))
    }

    pub fn at(&self, index: usize) -> Option<&Chip> {
        self.chips.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chip> {
        self.chips.iter()
    }

    pub fn as_slice(&self) -> &[Chip] {
        &self.chips
    }

    pub fn as_mut_slice(&mut self) -> &mut [Chip] {
        &mut self.chips
    }

    pub fn records(&self) -> Vec<SelectionRecord> {
        self.chips.iter().map(|chip| chip.record.clone()).collect()
    }

    pub fn values(&self) -> Vec<String> {
        self.chips.iter().map(|chip| chip.record.value.clone()).collect()
    }

    /// Set a chip's validity. Returns true if it changed.
    pub fn set_valid(&mut self, value: &str, valid: bool) -> bool {
        let Some(at) = self.position(value) else {
            return false;
        };
        let record = &mut self.chips[at].record;
        let changed = record.valid != valid;
        record.valid = valid;
        changed
    }

    /// Insert at `at` (clamped to the end). Returns the position used, or
    /// None if the value is already present.
    pub fn insert(&mut self, at: usize, record: SelectionRecord) -> Option<usize> {
        if self.contains(&record.value) {
            return None;
        }
        let at = at.min(self.chips.len());
        self.chips.insert(at, Chip::new(record));
        self.reindex_from(at);
        Some(at)
    }

    pub fn remove(&mut self, value: &str) -> Option<(usize, Chip)> {
        let at = self.index.remove(value)?;
        let chip = self.chips.remove(at);
        self.reindex_from(at);
        Some((at, chip))
    }

    /// Move the chip at `from` so it ends up at `to`.
    pub fn move_to(&mut self, from: usize, to: usize) {
        if from >= self.chips.len() || from == to {
            return;
        }
        let chip = self.chips.remove(from);
        let to = to.min(self.chips.len());
        self.chips.insert(to, chip);
        self.reindex_from(from.min(to));
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, chip) in self.chips.iter().enumerate().skip(start) {
            self.index.insert(chip.record.value.clone(), i);
        }
    }
}
