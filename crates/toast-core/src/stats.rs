//! Document statistics
//!
//! Reading time is `ceil(words / 200)` minutes with a floor of one minute.

use serde::Serialize;

use crate::content::ContentTree;

/// Reading speed used for the time estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// Word/character counts and reading-time estimate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub words: usize,
    pub characters: usize,
    pub reading_minutes: usize,
}

impl Statistics {
    /// Compute from rendered plain text
    pub fn from_text(text: &str) -> Self {
        let words = text.split_whitespace().count();
        Self {
            words,
            characters: text.chars().count(),
            reading_minutes: reading_minutes(words),
        }
    }

    pub fn for_tree(tree: &ContentTree) -> Self {
        Self::from_text(&tree.plain_text())
    }
}

/// Whole minutes needed to read `words`, never less than one
pub fn reading_minutes(words: usize) -> usize {
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Block, Paragraph};

    #[test]
    fn test_counts() {
        let stats = Statistics::from_text("one two three");
        assert_eq!(stats.words, 3);
        assert_eq!(stats.characters, 13);
        assert_eq!(stats.reading_minutes, 1);
    }

    #[test]
    fn test_whitespace_runs_and_nbsp() {
        let stats = Statistics::from_text("  a\t\tb \n c\u{a0}\u{a0}d  ");
        assert_eq!(stats.words, 4);
    }

    #[test]
    fn test_reading_time_policy() {
        assert_eq!(reading_minutes(0), 1);
        assert_eq!(reading_minutes(1), 1);
        assert_eq!(reading_minutes(200), 1);
        assert_eq!(reading_minutes(201), 2);
        assert_eq!(reading_minutes(1000), 5);
    }

    #[test]
    fn test_placeholder_tree_is_empty() {
        let stats = Statistics::for_tree(&ContentTree::placeholder());
        assert_eq!(stats.words, 0);
        assert_eq!(stats.characters, 0);
    }

    #[test]
    fn test_multi_block_tree() {
        let tree = ContentTree::from_blocks(vec![
            Block::Paragraph(Paragraph::with_text("first para")),
            Block::Paragraph(Paragraph::with_text("second")),
        ]);
        let stats = Statistics::for_tree(&tree);
        assert_eq!(stats.words, 3);
        assert_eq!(stats.characters, "first para\nsecond".chars().count());
    }
}
