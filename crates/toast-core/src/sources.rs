//! Citation sources and bibliography
//!
//! Sources are freeform strings kept in insertion order. Duplicates are
//! allowed; numbering in the bibliography follows list order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::content::{Block, InlineRun, ListBlock, Paragraph, RunFormat};
use crate::storage::{Slot, SlotValue};

/// Heading placed above the bibliography list
pub const BIBLIOGRAPHY_HEADING: &str = "Sources:";

/// Ordered list of sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceList(Vec<String>);

impl SourceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source. Blank text is ignored and returns false.
    pub fn add(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring blank source");
            return false;
        }
        self.0.push(text.to_string());
        true
    }

    /// Remove by position; later sources shift down
    pub fn remove(&mut self, index: usize) -> Option<String> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Heading paragraph and numbered list, or `None` when there are no sources
    pub fn bibliography_blocks(&self) -> Option<Vec<Block>> {
        if self.is_empty() {
            return None;
        }
        let heading = Paragraph::with_runs(vec![InlineRun::formatted(
            BIBLIOGRAPHY_HEADING,
            RunFormat::bold(),
        )]);
        let list = ListBlock::ordered(self.0.clone());
        Some(vec![heading.into(), list.into()])
    }
}

impl FromIterator<String> for SourceList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut list = SourceList::new();
        for source in iter {
            list.add(&source);
        }
        list
    }
}

impl SlotValue for SourceList {
    const SLOT: Slot = Slot::Sources;

    fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("[]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::render;

    #[test]
    fn test_add_trims_and_rejects_blank() {
        let mut sources = SourceList::new();
        assert!(sources.add("  Orwell, 1984  "));
        assert!(!sources.add("   "));
        assert_eq!(sources.len(), 1);
        assert_eq!(sources.get(0), Some("Orwell, 1984"));
    }

    #[test]
    fn test_duplicates_allowed() {
        let mut sources = SourceList::new();
        sources.add("A");
        sources.add("A");
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn test_remove_shifts_down() {
        let mut sources: SourceList = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        assert_eq!(sources.remove(0).as_deref(), Some("A"));
        assert_eq!(sources.get(0), Some("B"));
        assert_eq!(sources.remove(5), None);
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn test_bibliography_in_order() {
        let sources: SourceList = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let blocks = sources.bibliography_blocks().unwrap();
        assert_eq!(blocks.len(), 2);

        let heading = blocks[0].as_paragraph().unwrap();
        assert_eq!(heading.text(), "Sources:");
        assert!(heading.runs[0].format.bold);

        let Block::List(list) = &blocks[1] else {
            panic!("expected list, got {}", blocks[1].kind());
        };
        assert_eq!(render::list_lines(list), vec!["1. A", "2. B", "3. C"]);
    }

    #[test]
    fn test_empty_bibliography() {
        assert!(SourceList::new().bibliography_blocks().is_none());
    }

    #[test]
    fn test_slot_codec() {
        let raw = r#"["https://example.com", "Smith 2020"]"#;
        let sources = SourceList::decode(raw).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources.encode(), r#"["https://example.com","Smith 2020"]"#);
        assert!(SourceList::decode(r#"{"a": 1}"#).is_none());
    }
}
