/// A cell-based rectangle inside the selector's chip area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Horizontal midpoint, rounded down.
    pub const fn center_x(&self) -> u16 {
        self.x + self.width / 2
    }
}

/// Which half of a chip a pointer is over during a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropHalf {
    Left,
    Right,
}

impl DropHalf {
    /// Resolve the half of `rect` that column `x` falls in.
    pub fn at(rect: &Rect, x: u16) -> Self {
        if x < rect.center_x() {
            DropHalf::Left
        } else {
            DropHalf::Right
        }
    }
}
