//! Document title and body

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::ContentTree;
use crate::storage::{Slot, SlotValue};

/// Title used whenever the stored title is empty
pub const DEFAULT_TITLE: &str = "Untitled Essay";

/// Longest filename base derived from a title, in characters
pub const FILENAME_MAX_CHARS: usize = 30;

/// Document title; never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Title(String);

impl Title {
    /// Blank input yields the default title
    pub fn new(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            Self(DEFAULT_TITLE.to_string())
        } else {
            Self(text.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_TITLE
    }

    /// First 30 characters, used to name exported files
    pub fn filename_base(&self) -> String {
        self.0.chars().take(FILENAME_MAX_CHARS).collect()
    }
}

impl Default for Title {
    fn default() -> Self {
        Self(DEFAULT_TITLE.to_string())
    }
}

impl From<String> for Title {
    fn from(s: String) -> Self {
        Title::new(&s)
    }
}

impl From<Title> for String {
    fn from(title: Title) -> Self {
        title.0
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl SlotValue for Title {
    const SLOT: Slot = Slot::Title;

    fn decode(raw: &str) -> Option<Self> {
        Some(Title::new(raw))
    }

    fn encode(&self) -> String {
        self.0.clone()
    }
}

/// Title plus content tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub title: Title,
    pub content: ContentTree,
}

impl Document {
    pub fn new(title: Title, content: ContentTree) -> Self {
        Self { title, content }
    }
}
