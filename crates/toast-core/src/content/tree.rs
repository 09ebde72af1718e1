//! The ordered block tree and its caret-aware mutations
//!
//! Every mutation either succeeds and returns the caret to use next, or
//! returns a [`ContentError`] having left the tree untouched. The tree is
//! never empty: removing the last block restores a placeholder paragraph.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::block::{Block, BlockId, InlineRun, Paragraph, RunFormat};
use super::{legacy, ContentError};

/// An insertion point: a block and a character offset inside it.
///
/// For non-text blocks offset 0 sits before the block and 1 after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaretPosition {
    pub block: BlockId,
    pub offset: usize,
}

impl CaretPosition {
    pub fn new(block: BlockId, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// Direction for [`ContentTree::move_block`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Current serialization format version
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct StoredTreeRef<'a> {
    version: u32,
    blocks: &'a [Block],
}

#[derive(Deserialize)]
struct StoredTree {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    blocks: Vec<Block>,
}

/// The document's ordered sequence of blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTree {
    blocks: Vec<Block>,
}

impl Default for ContentTree {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl ContentTree {
    /// A tree holding only an empty placeholder paragraph
    pub fn placeholder() -> Self {
        Self {
            blocks: vec![Block::Paragraph(Paragraph::new())],
        }
    }

    /// Build a tree from blocks; an empty list yields the placeholder
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            Self::placeholder()
        } else {
            Self { blocks }
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false; kept for symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// True when the tree is just the empty placeholder paragraph
    pub fn is_placeholder(&self) -> bool {
        matches!(self.blocks.as_slice(), [Block::Paragraph(p)] if p.is_empty())
    }

    pub fn index_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id() == id)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    /// Find the unique block whose id starts with `prefix`
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&Block> {
        let mut matches = self.blocks.iter().filter(|b| b.id().matches_prefix(prefix));
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// Text of a paragraph block
    pub fn paragraph_text(&self, id: BlockId) -> Option<String> {
        self.get(id)?.as_paragraph().map(Paragraph::text)
    }

    /// Caret at the very start of the document
    pub fn start_caret(&self) -> CaretPosition {
        CaretPosition::new(self.blocks[0].id(), 0)
    }

    /// Caret at the very end of the document
    pub fn end_caret(&self) -> CaretPosition {
        let last = &self.blocks[self.blocks.len() - 1];
        CaretPosition::new(last.id(), last.caret_len())
    }

    /// Resolve a caret to its block index, rejecting stale or out-of-range carets
    pub fn validate(&self, caret: CaretPosition) -> Result<usize, ContentError> {
        let index = self
            .index_of(caret.block)
            .ok_or(ContentError::UnknownBlock(caret.block))?;
        if caret.offset > self.blocks[index].caret_len() {
            return Err(ContentError::InvalidCaret {
                block: caret.block,
                offset: caret.offset,
            });
        }
        Ok(index)
    }

    /// Clamp a possibly stale caret onto the tree
    pub fn clamp(&self, caret: CaretPosition) -> CaretPosition {
        match self.get(caret.block) {
            Some(block) => CaretPosition::new(caret.block, caret.offset.min(block.caret_len())),
            None => self.end_caret(),
        }
    }

    /// Insert a run at the caret. Returns the caret after the inserted text.
    ///
    /// A caret beside a non-text block gets a fresh paragraph on that side.
    pub fn insert_inline(
        &mut self,
        run: InlineRun,
        caret: CaretPosition,
    ) -> Result<CaretPosition, ContentError> {
        let index = self.validate(caret)?;
        let inserted = run.text.chars().count();

        let (index, offset) = if matches!(self.blocks[index], Block::Paragraph(_)) {
            (index, caret.offset)
        } else {
            let at = if caret.offset == 0 { index } else { index + 1 };
            self.blocks.insert(at, Block::Paragraph(Paragraph::new()));
            (at, 0)
        };

        let paragraph = self.blocks[index]
            .as_paragraph_mut()
            .ok_or(ContentError::WrongKind(caret.block, "paragraph"))?;
        if run.format == RunFormat::default() {
            paragraph.insert_text(offset, &run.text);
        } else {
            paragraph.insert_run(offset, run);
        }
        Ok(CaretPosition::new(paragraph.id, offset + inserted))
    }

    /// Insert plain text at the caret, inheriting the surrounding format
    pub fn insert_text(
        &mut self,
        text: &str,
        caret: CaretPosition,
    ) -> Result<CaretPosition, ContentError> {
        self.insert_inline(InlineRun::plain(text), caret)
    }

    /// Insert a block at the caret, splitting a paragraph when the caret is mid-text
    pub fn insert_block(
        &mut self,
        block: Block,
        caret: CaretPosition,
    ) -> Result<CaretPosition, ContentError> {
        self.insert_blocks(vec![block], caret)
    }

    /// Insert several blocks, in order, at the caret
    ///
    /// - offset 0: blocks go before the caret's block, caret unchanged
    /// - end of block: blocks go after it, caret moves to the next paragraph
    /// - mid-paragraph: the paragraph splits around the blocks
    pub fn insert_blocks(
        &mut self,
        blocks: Vec<Block>,
        caret: CaretPosition,
    ) -> Result<CaretPosition, ContentError> {
        let index = self.validate(caret)?;
        if blocks.is_empty() {
            return Ok(caret);
        }
        let count = blocks.len();
        let block_len = self.blocks[index].caret_len();

        if caret.offset == 0 {
            self.blocks.splice(index..index, blocks);
            return Ok(caret);
        }

        if caret.offset < block_len {
            if let Block::Paragraph(p) = &mut self.blocks[index] {
                let tail = p.split_off(caret.offset);
                let tail_id = tail.id;
                let at = index + 1;
                self.blocks.splice(at..at, blocks);
                self.blocks.insert(at + count, Block::Paragraph(tail));
                return Ok(CaretPosition::new(tail_id, 0));
            }
        }

        let at = index + 1;
        self.blocks.splice(at..at, blocks);
        let after = at + count;
        if let Some(Block::Paragraph(p)) = self.blocks.get(after) {
            return Ok(CaretPosition::new(p.id, 0));
        }
        let paragraph = Paragraph::new();
        let id = paragraph.id;
        self.blocks.insert(after, Block::Paragraph(paragraph));
        Ok(CaretPosition::new(id, 0))
    }

    /// Split the caret's paragraph in two (Enter). Returns the caret at the
    /// start of the second half.
    pub fn split_paragraph(&mut self, caret: CaretPosition) -> Result<CaretPosition, ContentError> {
        let index = self.validate(caret)?;
        let (at, paragraph) = match &mut self.blocks[index] {
            Block::Paragraph(p) => (index + 1, p.split_off(caret.offset)),
            _ if caret.offset == 0 => (index, Paragraph::new()),
            _ => (index + 1, Paragraph::new()),
        };
        let id = paragraph.id;
        self.blocks.insert(at, Block::Paragraph(paragraph));
        Ok(CaretPosition::new(id, 0))
    }

    /// Delete the character before the caret (Backspace)
    ///
    /// At the start of a paragraph, merges into a preceding paragraph or
    /// removes a preceding non-text block. Returns `None` when there is
    /// nothing before the caret to delete; the tree is then unchanged.
    pub fn delete_backward(
        &mut self,
        caret: CaretPosition,
    ) -> Result<Option<CaretPosition>, ContentError> {
        let index = self.validate(caret)?;

        if !matches!(self.blocks[index], Block::Paragraph(_)) {
            if caret.offset == 1 {
                return self.delete_block(caret.block).map(Some);
            }
            return Ok(None);
        }

        if caret.offset > 0 {
            if let Block::Paragraph(p) = &mut self.blocks[index] {
                p.delete_range(caret.offset - 1, caret.offset);
            }
            return Ok(Some(CaretPosition::new(caret.block, caret.offset - 1)));
        }

        if index == 0 {
            return Ok(None);
        }

        if !matches!(self.blocks[index - 1], Block::Paragraph(_)) {
            self.blocks.remove(index - 1);
            return Ok(Some(caret));
        }

        let Block::Paragraph(current) = self.blocks.remove(index) else {
            return Ok(Some(caret));
        };
        let previous = self.blocks[index - 1]
            .as_paragraph_mut()
            .ok_or(ContentError::WrongKind(caret.block, "paragraph"))?;
        let join_at = previous.len();
        previous.append(current);
        Ok(Some(CaretPosition::new(previous.id, join_at)))
    }

    /// Delete characters `start..end` of a paragraph; caret lands on `start`
    pub fn delete_range(
        &mut self,
        block: BlockId,
        start: usize,
        end: usize,
    ) -> Result<CaretPosition, ContentError> {
        let index = self.validate(CaretPosition::new(block, end))?;
        if start > end {
            return Err(ContentError::InvalidCaret {
                block,
                offset: start,
            });
        }
        let paragraph = self.blocks[index]
            .as_paragraph_mut()
            .ok_or(ContentError::WrongKind(block, "paragraph"))?;
        paragraph.delete_range(start, end);
        Ok(CaretPosition::new(block, start))
    }

    /// Swap a block with its neighbour. Returns false (no-op) at the boundary.
    pub fn move_block(&mut self, id: BlockId, direction: Direction) -> Result<bool, ContentError> {
        let index = self.index_of(id).ok_or(ContentError::UnknownBlock(id))?;
        let neighbour = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < self.blocks.len() => index + 1,
            _ => return Ok(false),
        };
        self.blocks.swap(index, neighbour);
        Ok(true)
    }

    /// Remove a block. Returns a caret where the block used to be.
    pub fn delete_block(&mut self, id: BlockId) -> Result<CaretPosition, ContentError> {
        let index = self.index_of(id).ok_or(ContentError::UnknownBlock(id))?;
        self.blocks.remove(index);

        if self.blocks.is_empty() {
            self.blocks.push(Block::Paragraph(Paragraph::new()));
        }

        Ok(match self.blocks.get(index) {
            Some(next) => CaretPosition::new(next.id(), 0),
            None => self.end_caret(),
        })
    }

    /// Replace a table cell's text
    pub fn set_cell(
        &mut self,
        id: BlockId,
        row: usize,
        col: usize,
        text: &str,
    ) -> Result<(), ContentError> {
        let index = self.index_of(id).ok_or(ContentError::UnknownBlock(id))?;
        match &mut self.blocks[index] {
            Block::Table(table) => table.set_cell(row, col, text),
            _ => Err(ContentError::WrongKind(id, "table")),
        }
    }

    /// Serialize to the persisted representation
    pub fn serialize(&self) -> String {
        let stored = StoredTreeRef {
            version: FORMAT_VERSION,
            blocks: &self.blocks,
        };
        // Blocks hold only strings, bools, bytes and enums, all of which JSON accepts
        serde_json::to_string(&stored).unwrap_or_else(|_| String::from("{}"))
    }

    /// Parse the persisted representation; `None` when malformed
    ///
    /// Anything that is not a JSON object is markup saved by the browser
    /// version and is imported block by block.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Some(Self::placeholder());
        }
        if !trimmed.starts_with('{') {
            let tree = Self::from_blocks(legacy::import_html(raw));
            info!("Imported {} block(s) from stored HTML", tree.len());
            return Some(tree);
        }
        let stored: StoredTree = serde_json::from_str(raw).ok()?;
        if stored.version > FORMAT_VERSION {
            warn!(
                "Content written by format version {}, reading as {}",
                stored.version, FORMAT_VERSION
            );
        }
        Some(Self::from_blocks(stored.blocks))
    }

    /// Parse the persisted representation, falling back to the placeholder
    pub fn deserialize(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) => Self::parse(raw).unwrap_or_else(|| {
                warn!("Stored content is malformed, starting from an empty document");
                Self::placeholder()
            }),
            None => Self::placeholder(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::block::{CitationBlock, CitationFormat, ImageBlock, TableBlock};

    fn tree_with(texts: &[&str]) -> ContentTree {
        ContentTree::from_blocks(
            texts
                .iter()
                .map(|t| Block::Paragraph(Paragraph::with_text(*t)))
                .collect(),
        )
    }

    fn texts(tree: &ContentTree) -> Vec<String> {
        tree.blocks()
            .iter()
            .map(|b| match b {
                Block::Paragraph(p) => p.text(),
                other => format!("<{}>", other.kind()),
            })
            .collect()
    }

    #[test]
    fn test_placeholder_invariant() {
        let tree = ContentTree::from_blocks(Vec::new());
        assert_eq!(tree.len(), 1);
        assert!(tree.is_placeholder());
        assert!(!tree.is_empty());
    }

    #[test]
    fn test_insert_text_at_caret() {
        let mut tree = tree_with(&["Hello world"]);
        let id = tree.blocks()[0].id();

        let caret = tree.insert_text(",", CaretPosition::new(id, 5)).unwrap();
        assert_eq!(caret, CaretPosition::new(id, 6));
        assert_eq!(texts(&tree), vec!["Hello, world"]);
    }

    #[test]
    fn test_insert_with_stale_caret_is_noop() {
        let mut tree = tree_with(&["abc"]);
        let before = tree.clone();

        let stale = CaretPosition::new(BlockId::new(), 0);
        assert!(matches!(
            tree.insert_text("x", stale),
            Err(ContentError::UnknownBlock(_))
        ));

        let id = tree.blocks()[0].id();
        assert!(matches!(
            tree.insert_text("x", CaretPosition::new(id, 4)),
            Err(ContentError::InvalidCaret { offset: 4, .. })
        ));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_insert_block_mid_paragraph_splits() {
        let mut tree = tree_with(&["before after"]);
        let id = tree.blocks()[0].id();

        let caret = tree
            .insert_block(
                TableBlock::new(2, 2).into(),
                CaretPosition::new(id, 7),
            )
            .unwrap();

        assert_eq!(texts(&tree), vec!["before ", "<table>", "after"]);
        assert_eq!(caret.block, tree.blocks()[2].id());
        assert_eq!(caret.offset, 0);
    }

    #[test]
    fn test_insert_block_at_start_goes_before() {
        let mut tree = tree_with(&["text"]);
        let id = tree.blocks()[0].id();
        let caret = CaretPosition::new(id, 0);

        let next = tree
            .insert_block(CitationBlock::from_template(CitationFormat::Mla).into(), caret)
            .unwrap();

        assert_eq!(texts(&tree), vec!["<citation>", "text"]);
        assert_eq!(next, caret);
    }

    #[test]
    fn test_insert_block_at_end_adds_trailing_paragraph() {
        let mut tree = tree_with(&["text"]);
        let id = tree.blocks()[0].id();

        let caret = tree
            .insert_block(
                ImageBlock::new("image/png", vec![1]).into(),
                CaretPosition::new(id, 4),
            )
            .unwrap();

        assert_eq!(texts(&tree), vec!["text", "<image>", ""]);
        assert_eq!(caret, CaretPosition::new(tree.blocks()[2].id(), 0));
    }

    #[test]
    fn test_insert_block_at_end_reuses_next_paragraph() {
        let mut tree = tree_with(&["one", "two"]);
        let id = tree.blocks()[0].id();

        let caret = tree
            .insert_block(TableBlock::new(1, 1).into(), CaretPosition::new(id, 3))
            .unwrap();

        assert_eq!(texts(&tree), vec!["one", "<table>", "two"]);
        assert_eq!(caret, CaretPosition::new(tree.blocks()[2].id(), 0));
    }

    #[test]
    fn test_insert_inline_beside_image_creates_paragraph() {
        let image = ImageBlock::new("image/png", vec![1]);
        let image_id = image.id;
        let mut tree = ContentTree::from_blocks(vec![image.into()]);

        let caret = tree
            .insert_text("caption", CaretPosition::new(image_id, 1))
            .unwrap();

        assert_eq!(texts(&tree), vec!["<image>", "caption"]);
        assert_eq!(caret.offset, 7);
    }

    #[test]
    fn test_move_block() {
        let mut tree = tree_with(&["a", "b", "c"]);
        let first = tree.blocks()[0].id();
        let last = tree.blocks()[2].id();

        assert!(!tree.move_block(first, Direction::Up).unwrap());
        assert!(!tree.move_block(last, Direction::Down).unwrap());
        assert_eq!(texts(&tree), vec!["a", "b", "c"]);

        assert!(tree.move_block(first, Direction::Down).unwrap());
        assert_eq!(texts(&tree), vec!["b", "a", "c"]);

        assert!(tree.move_block(last, Direction::Up).unwrap());
        assert_eq!(texts(&tree), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_delete_last_block_restores_placeholder() {
        let mut tree = tree_with(&["only"]);
        let id = tree.blocks()[0].id();

        let caret = tree.delete_block(id).unwrap();
        assert!(tree.is_placeholder());
        assert_eq!(caret, tree.start_caret());
        assert!(tree.validate(caret).is_ok());
    }

    #[test]
    fn test_delete_block_caret_moves_to_neighbour() {
        let mut tree = tree_with(&["a", "b", "c"]);
        let middle = tree.blocks()[1].id();
        let last = tree.blocks()[2].id();

        let caret = tree.delete_block(middle).unwrap();
        assert_eq!(caret, CaretPosition::new(last, 0));

        let caret = tree.delete_block(last).unwrap();
        assert_eq!(caret, CaretPosition::new(tree.blocks()[0].id(), 1));
    }

    #[test]
    fn test_split_paragraph() {
        let mut tree = tree_with(&["headtail"]);
        let id = tree.blocks()[0].id();

        let caret = tree.split_paragraph(CaretPosition::new(id, 4)).unwrap();
        assert_eq!(texts(&tree), vec!["head", "tail"]);
        assert_eq!(caret, CaretPosition::new(tree.blocks()[1].id(), 0));
    }

    #[test]
    fn test_delete_backward_merges_paragraphs() {
        let mut tree = tree_with(&["ab", "cd"]);
        let first = tree.blocks()[0].id();
        let second = tree.blocks()[1].id();

        let caret = tree
            .delete_backward(CaretPosition::new(second, 0))
            .unwrap()
            .unwrap();
        assert_eq!(texts(&tree), vec!["abcd"]);
        assert_eq!(caret, CaretPosition::new(first, 2));

        let caret = tree.delete_backward(caret).unwrap().unwrap();
        assert_eq!(texts(&tree), vec!["acd"]);
        assert_eq!(caret.offset, 1);
    }

    #[test]
    fn test_delete_backward_removes_preceding_image() {
        let paragraph = Paragraph::with_text("after");
        let id = paragraph.id;
        let mut tree = ContentTree::from_blocks(vec![
            ImageBlock::new("image/gif", vec![0]).into(),
            paragraph.into(),
        ]);

        let caret = tree
            .delete_backward(CaretPosition::new(id, 0))
            .unwrap()
            .unwrap();
        assert_eq!(texts(&tree), vec!["after"]);
        assert_eq!(caret, CaretPosition::new(id, 0));

        // At the very start nothing happens
        let before = tree.clone();
        assert_eq!(tree.delete_backward(caret).unwrap(), None);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_delete_range() {
        let mut tree = tree_with(&["the examp"]);
        let id = tree.blocks()[0].id();

        let caret = tree.delete_range(id, 4, 9).unwrap();
        assert_eq!(texts(&tree), vec!["the "]);
        assert_eq!(caret, CaretPosition::new(id, 4));

        assert!(tree.delete_range(id, 2, 10).is_err());
    }

    #[test]
    fn test_set_cell() {
        let table = TableBlock::new(1, 2);
        let id = table.id;
        let mut tree = ContentTree::from_blocks(vec![table.into()]);

        tree.set_cell(id, 0, 1, "value").unwrap();
        match &tree.blocks()[0] {
            Block::Table(t) => assert_eq!(t.cell(0, 1), Some("value")),
            _ => panic!("expected table"),
        }

        let mut paragraph_tree = tree_with(&["x"]);
        let pid = paragraph_tree.blocks()[0].id();
        assert!(matches!(
            paragraph_tree.set_cell(pid, 0, 0, "y"),
            Err(ContentError::WrongKind(_, "table"))
        ));
    }

    #[test]
    fn test_round_trip() {
        let mut tree = tree_with(&["Intro", "Body text"]);
        let id = tree.blocks()[1].id();
        let caret = tree
            .insert_block(
                ImageBlock::new("image/png", vec![0x89, 0x50, 0x4e, 0x47]).into(),
                CaretPosition::new(id, 4),
            )
            .unwrap();
        let caret = tree
            .insert_block(CitationBlock::from_template(CitationFormat::Harvard).into(), caret)
            .unwrap();
        tree.insert_block(TableBlock::new(2, 3).into(), caret).unwrap();

        let raw = tree.serialize();
        assert_eq!(ContentTree::parse(&raw), Some(tree.clone()));
        assert_eq!(ContentTree::deserialize(Some(&raw)), tree);
    }

    #[test]
    fn test_deserialize_empty_or_malformed() {
        assert!(ContentTree::deserialize(None).is_placeholder());
        assert!(ContentTree::deserialize(Some("")).is_placeholder());
        assert!(ContentTree::deserialize(Some(r#"{"version":1,"blocks":[]}"#)).is_placeholder());
        assert!(ContentTree::parse("{not json").is_none());
    }

    #[test]
    fn test_stored_html_is_imported() {
        let raw = "<p>Toast is bread</p><p><strong>Sources:</strong></p><ol><li>A</li></ol>";
        let tree = ContentTree::parse(raw).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.plain_text(), "Toast is bread\nSources:\n1. A");

        let placeholder = "<p class=\"placeholder\">Start writing your essay…</p>";
        assert!(ContentTree::deserialize(Some(placeholder)).is_placeholder());
    }

    #[test]
    fn test_find_by_prefix() {
        let tree = tree_with(&["a", "b"]);
        let id = tree.blocks()[1].id();
        let full = id.to_string();

        assert_eq!(tree.find_by_prefix(&full).map(Block::id), Some(id));
        // The empty prefix matches both blocks, so it is ambiguous
        assert!(tree.find_by_prefix("").is_none());
    }
}
