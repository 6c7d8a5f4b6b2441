//! Tab-order optimizer.
//!
//! Every chip has an input slot on each side so the user can type a new
//! entry right before or after it. Once chips wrap, a trailing slot pressed
//! against the right edge is unreachable on screen and is taken out of Tab
//! navigation; the next chip's leading slot (or the primary input) is the
//! next stop instead.

use std::time::{Duration, Instant};

use unicode_width::UnicodeWidthStr;

use crate::config::SelectorConfig;
use crate::geometry::Rect;

use super::chips::{Chip, Slot};

/// Rendered width of a chip with `title`.
pub fn chip_width(title: &str, chrome: u16) -> u16 {
    let text = u16::try_from(title.width()).unwrap_or(u16::MAX);
    text.saturating_add(chrome)
}

/// Lay chips out from `from` onwards, continuing from where chip `from - 1`
/// ends, and recompute their slot flags. Appending a chip therefore costs one
/// step. Returns whether the primary input stays in tab flow.
pub fn optimize(chips: &mut [Chip], from: usize, config: &SelectorConfig) -> bool {
    if config.mode.is_single() {
        return optimize_single(chips, config);
    }

    let inner = config.width;
    let (mut x, mut y) = match from.checked_sub(1).and_then(|prev| chips.get(prev)) {
        Some(prev) => (prev.rect.right(), prev.rect.y),
        None => (0, 0),
    };

    for chip in chips.iter_mut().skip(from) {
        let width = chip_width(&chip.record.title, config.chip_chrome);
        if x > 0 && x.saturating_add(width) > inner {
            x = 0;
            y = y.saturating_add(1);
        }
        chip.rect = Rect::new(x, y, width, 1);
        let end = x.saturating_add(width);
        chip.leading_in_flow = true;
        chip.trailing_in_flow = end.saturating_add(config.min_slot_width) <= inner;
        x = end;
    }

    log::trace!(
        "[tab_order] laid out {} chips from {} ({} rows)",
        chips.len().saturating_sub(from),
        from,
        chips.last().map(|c| c.rect.y + 1).unwrap_or(0)
    );
    true
}

/// Single mode: if the sole chip leaves no room for a slot after it, only
/// its leading slot stays reachable.
fn optimize_single(chips: &mut [Chip], config: &SelectorConfig) -> bool {
    let Some(chip) = chips.first_mut() else {
        return true;
    };
    let width = chip_width(&chip.record.title, config.chip_chrome);
    chip.rect = Rect::new(0, 0, width, 1);
    let fits = width.saturating_add(config.min_slot_width) <= config.width;
    chip.leading_in_flow = true;
    chip.trailing_in_flow = fits;
    if !fits {
        log::debug!("[tab_order] '{}' overflows, pinning to leading slot", chip.record.value);
    }
    fits
}

/// Slots reachable with Tab, in order.
pub fn tab_stops(chips: &[Chip], primary_in_flow: bool) -> Vec<Slot> {
    let mut stops = Vec::with_capacity(chips.len() * 2 + 1);
    for chip in chips {
        if chip.leading_in_flow {
            stops.push(Slot::Leading(chip.record.value.clone()));
        }
        if chip.trailing_in_flow {
            stops.push(Slot::Trailing(chip.record.value.clone()));
        }
    }
    if primary_in_flow {
        stops.push(Slot::Primary);
    }
    stops
}

/// Debounced watch over the container width.
///
/// Rapid reports restart the quiet period, so a burst of resize events
/// produces one relayout.
#[derive(Debug, Clone)]
pub struct LayoutWatch {
    debounce: Duration,
    pending: Option<(u16, Instant)>,
}

impl LayoutWatch {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: None,
        }
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    pub fn observe(&mut self, width: u16, now: Instant) {
        self.pending = Some((width, now));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The settled width, once the quiet period has passed.
    pub fn poll(&mut self, now: Instant) -> Option<u16> {
        match self.pending {
            Some((width, at)) if now.saturating_duration_since(at) >= self.debounce => {
                self.pending = None;
                Some(width)
            }
            _ => None,
        }
    }
}
