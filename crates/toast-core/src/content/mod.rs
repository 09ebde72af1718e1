//! Content model
//!
//! The document body as an ordered tree of blocks (paragraphs, images,
//! tables, citations, lists) with caret-aware mutations. Order in the
//! block vector is the only ordering signal.

pub mod block;
pub mod legacy;
pub mod render;
pub mod tree;

use thiserror::Error;

pub use block::{
    Block, BlockId, CitationBlock, CitationFormat, ImageBlock, InlineRun, ListBlock, Paragraph,
    RunFormat, TableBlock,
};
pub use render::PLACEHOLDER_TEXT;
pub use tree::{CaretPosition, ContentTree, Direction};

use crate::storage::{Slot, SlotValue};

/// Errors from content operations. The tree is unchanged when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("No block with id {0}")]
    UnknownBlock(BlockId),

    #[error("Caret offset {offset} is outside block {block}")]
    InvalidCaret { block: BlockId, offset: usize },

    #[error("Block {0} is not a {1}")]
    WrongKind(BlockId, &'static str),

    #[error("Cell ({row}, {col}) is outside the table")]
    CellOutOfRange { row: usize, col: usize },

    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

impl ContentTree {
    /// Visible text; the placeholder renders as empty
    pub fn plain_text(&self) -> String {
        if self.is_placeholder() {
            return String::new();
        }
        render::plain_text(self.blocks())
    }

    /// HTML fragment for the whole tree
    pub fn to_html(&self) -> String {
        if self.is_placeholder() {
            return render::to_html(&[]);
        }
        render::to_html(self.blocks())
    }
}

impl SlotValue for ContentTree {
    const SLOT: Slot = Slot::Content;

    fn decode(raw: &str) -> Option<Self> {
        ContentTree::parse(raw)
    }

    fn encode(&self) -> String {
        self.serialize()
    }
}
