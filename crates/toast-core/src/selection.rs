//! Selection bridge
//!
//! The content model never reads a rendering surface's selection directly.
//! A surface implements [`SelectionBridge`] to report where the caret is and
//! where it sits on screen.

use crate::content::CaretPosition;

/// On-screen box around the caret, in surface units (cells, pixels, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnchorRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl AnchorRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Row just below the box, where a popup should start
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

/// Caret access for a rendering surface
pub trait SelectionBridge {
    /// Current caret, if the surface has one
    fn caret(&self) -> Option<CaretPosition>;

    /// Move the caret
    fn set_caret(&mut self, caret: CaretPosition);

    /// Screen box of the current caret, if it has been laid out
    fn anchor_rect(&self) -> Option<AnchorRect>;
}

/// Selection held in memory, for headless use and tests
#[derive(Debug, Clone, Default)]
pub struct TrackedSelection {
    caret: Option<CaretPosition>,
    anchor: Option<AnchorRect>,
}

impl TrackedSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a fixed anchor rectangle for every caret
    pub fn with_anchor(mut self, anchor: AnchorRect) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn set_anchor(&mut self, anchor: Option<AnchorRect>) {
        self.anchor = anchor;
    }
}

impl SelectionBridge for TrackedSelection {
    fn caret(&self) -> Option<CaretPosition> {
        self.caret
    }

    fn set_caret(&mut self, caret: CaretPosition) {
        self.caret = Some(caret);
    }

    fn anchor_rect(&self) -> Option<AnchorRect> {
        self.anchor
    }
}
