//! Completion word lists
//!
//! The matcher never hard-codes words: a [`Dictionary`] is injected into the
//! autocomplete engine, either the built-in list or one loaded from a file.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// Common words offered when no custom list is configured
const BUILTIN_WORDS: &[&str] = &[
    "the", "that", "this", "there", "their", "these", "those", "then", "than", "they",
    "through", "therefore", "thus", "though", "thought", "throughout", "theory", "thesis",
    "about", "above", "according", "across", "actually", "addition", "additionally",
    "affect", "after", "again", "against", "although", "always", "among", "analysis",
    "analyze", "another", "answer", "approach", "argue", "argument", "around", "article",
    "aspect", "assume", "author", "available", "because", "become", "before", "begin",
    "behavior", "being", "believe", "benefit", "between", "beyond", "both", "brief",
    "business", "cannot", "cause", "central", "certain", "challenge", "change", "chapter",
    "claim", "clear", "clearly", "community", "compare", "comparison", "complete",
    "complex", "concept", "conclusion", "conclude", "condition", "consequently",
    "consider", "considerable", "consistent", "context", "continue", "contrast",
    "contribute", "could", "country", "create", "critical", "culture", "current", "data",
    "debate", "decision", "define", "definition", "demonstrate", "describe", "design",
    "despite", "develop", "development", "difference", "different", "difficult",
    "directly", "discuss", "discussion", "during", "each", "early", "economic",
    "education", "effect", "effective", "either", "element", "emphasize", "environment",
    "especially", "essay", "essential", "establish", "evaluate", "even", "evidence",
    "example", "examine", "except", "experience", "explain", "explanation", "factor",
    "finally", "first", "following", "furthermore", "general", "generally", "government",
    "great", "group", "however", "history", "human", "idea", "identify", "illustrate",
    "important", "importance", "include", "including", "increase", "indeed", "individual",
    "influence", "information", "instance", "instead", "interest", "interpret",
    "introduction", "issue", "itself", "knowledge", "language", "large", "later", "least",
    "likely", "literature", "little", "local", "major", "majority", "many", "meaning",
    "method", "might", "moreover", "most", "much", "must", "national", "nature",
    "necessary", "nevertheless", "noted", "nothing", "number", "observe", "obvious",
    "often", "order", "original", "other", "otherwise", "overall", "paragraph", "particular",
    "particularly", "people", "perhaps", "perspective", "point", "policy", "political",
    "position", "possible", "potential", "present", "previous", "primary", "probably",
    "problem", "process", "produce", "provide", "public", "purpose", "question", "rather",
    "reason", "recent", "regarding", "relationship", "relevant", "research", "response",
    "result", "role", "science", "second", "section", "several", "should", "significant",
    "similar", "similarly", "since", "social", "society", "source", "specific", "statement",
    "still", "strong", "structure", "study", "subject", "suggest", "summary", "support",
    "system", "theme", "today", "together", "toward", "understand", "understanding",
    "unless", "until", "usually", "value", "various", "view", "what", "when", "where",
    "whether", "which", "while", "within", "without", "would", "write", "writing",
];

/// Ordered, de-duplicated list of lower-case words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    words: Vec<String>,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Dictionary {
    /// The built-in list of common words
    pub fn builtin() -> Self {
        Self::from_words(BUILTIN_WORDS.iter().copied())
    }

    /// Build from any words. Entries are trimmed and lower-cased; blanks and
    /// repeats are dropped, keeping the first occurrence's position.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .filter(|w| seen.insert(w.clone()))
            .collect();
        Self { words }
    }

    /// Load a newline-separated word list
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary: {:?}", path))?;
        let dictionary = Self::from_words(content.lines());
        info!("Loaded {} words from {:?}", dictionary.len(), path);
        Ok(dictionary)
    }

    /// Load from `path` when given, otherwise the built-in list
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words starting with `prefix` (case-insensitive), excluding the prefix
    /// itself, in list order, at most `limit` of them
    pub fn complete(&self, prefix: &str, limit: usize) -> Vec<&str> {
        let prefix = prefix.to_lowercase();
        self.words
            .iter()
            .filter(|w| w.starts_with(&prefix) && **w != prefix)
            .take(limit)
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_complete_keeps_list_order() {
        let dict = Dictionary::from_words(["example", "exam", "examine", "other"]);
        assert_eq!(dict.complete("examp", 5), vec!["example"]);
        assert_eq!(dict.complete("exa", 5), vec!["example", "exam", "examine"]);
    }

    #[test]
    fn test_complete_excludes_exact_match() {
        let dict = Dictionary::from_words(["examp", "example", "examine"]);
        assert_eq!(dict.complete("examp", 5), vec!["example"]);
        assert!(dict.complete("example", 5).is_empty());
    }

    #[test]
    fn test_complete_is_case_insensitive_and_limited() {
        let dict = Dictionary::from_words(["Thesis", "the", "then", "their", "there", "these", "they"]);
        assert_eq!(dict.complete("THE", 5), vec!["thesis", "then", "their", "there", "these"]);
    }

    #[test]
    fn test_from_words_normalises() {
        let dict = Dictionary::from_words(["  Alpha ", "", "alpha", "beta"]);
        assert_eq!(dict.words(), &["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn test_builtin_has_no_duplicates() {
        let dict = Dictionary::builtin();
        assert_eq!(dict.len(), BUILTIN_WORDS.len());
        assert!(dict.complete("examp", 5).contains(&"example"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "zebra\nzenith\n\nzero").unwrap();

        let dict = Dictionary::load(file.path()).unwrap();
        assert_eq!(dict.complete("ze", 5), vec!["zebra", "zenith", "zero"]);

        assert!(Dictionary::load(Path::new("/nonexistent/words.txt")).is_err());
    }
}
