//! Word completion at the caret
//!
//! After each content-changing keystroke the engine looks at the run of
//! word characters (`[A-Za-z0-9_]`) ending at the caret. A run of two or
//! more characters is matched against the [`Dictionary`]; up to five
//! matches are offered in dictionary order. Committing replaces the typed
//! run with the full word and leaves the caret after it.

use tracing::debug;

use crate::content::{BlockId, CaretPosition, ContentTree};
use crate::dictionary::Dictionary;
use crate::selection::AnchorRect;

/// Most suggestions shown at once
pub const MAX_SUGGESTIONS: usize = 5;

/// Shortest token that triggers suggestions
pub const MIN_TOKEN_LEN: usize = 2;

/// A run of word characters ending at the caret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub block: BlockId,
    /// Character offset of the first token character
    pub start: usize,
    /// Character offset just past the token (the caret)
    pub end: usize,
    pub text: String,
}

impl Token {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Find the token touching the caret from the left, if any
pub fn token_at(tree: &ContentTree, caret: CaretPosition) -> Option<Token> {
    tree.validate(caret).ok()?;
    let text = tree.paragraph_text(caret.block)?;
    let before: Vec<char> = text.chars().take(caret.offset).collect();

    let run = before
        .iter()
        .rev()
        .take_while(|c| is_word_char(**c))
        .count();
    if run == 0 {
        return None;
    }

    let start = caret.offset - run;
    Some(Token {
        block: caret.block,
        start,
        end: caret.offset,
        text: before[start..].iter().collect(),
    })
}

/// One offered completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub word: String,
    typed_len: usize,
}

impl Suggestion {
    fn new(word: &str, typed_len: usize) -> Self {
        Self {
            word: word.to_string(),
            typed_len,
        }
    }

    /// The part of the word the user already typed
    pub fn typed(&self) -> &str {
        &self.word[..self.typed_len]
    }

    /// The part the completion would add
    pub fn remainder(&self) -> &str {
        &self.word[self.typed_len..]
    }
}

/// A visible suggestion popup
#[derive(Debug, Clone, PartialEq)]
pub struct AutocompleteState {
    pub token: Token,
    pub suggestions: Vec<Suggestion>,
    /// Highlighted suggestion
    pub selected: usize,
    /// Where to draw the popup
    pub anchor: Option<AnchorRect>,
}

impl AutocompleteState {
    pub fn current_token(&self) -> &str {
        &self.token.text
    }

    pub fn selected_suggestion(&self) -> Option<&Suggestion> {
        self.suggestions.get(self.selected)
    }
}

/// Proposes and commits completions
#[derive(Debug, Clone)]
pub struct AutocompleteEngine {
    dictionary: Dictionary,
    state: Option<AutocompleteState>,
}

impl AutocompleteEngine {
    pub fn new(dictionary: Dictionary) -> Self {
        Self {
            dictionary,
            state: None,
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Swap the word list; any open popup is closed
    pub fn set_dictionary(&mut self, dictionary: Dictionary) {
        self.dictionary = dictionary;
        self.state = None;
    }

    pub fn state(&self) -> Option<&AutocompleteState> {
        self.state.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.state.is_some()
    }

    /// Suggestions for a token, without touching popup state
    pub fn suggest(&self, token: &str) -> Vec<Suggestion> {
        if token.chars().count() < MIN_TOKEN_LEN || !token.chars().all(is_word_char) {
            return Vec::new();
        }
        self.dictionary
            .complete(token, MAX_SUGGESTIONS)
            .into_iter()
            .map(|word| Suggestion::new(word, token.len()))
            .collect()
    }

    /// Recompute suggestions for the caret after a keystroke
    pub fn refresh(
        &mut self,
        tree: &ContentTree,
        caret: CaretPosition,
        anchor: Option<AnchorRect>,
    ) -> Option<&AutocompleteState> {
        let Some(token) = token_at(tree, caret) else {
            self.dismiss();
            return None;
        };

        let suggestions = self.suggest(&token.text);
        if suggestions.is_empty() {
            self.dismiss();
            return None;
        }

        let selected = match &self.state {
            Some(previous) if previous.token == token => {
                previous.selected.min(suggestions.len() - 1)
            }
            _ => 0,
        };

        debug!(
            "Autocomplete for '{}': {} suggestion(s)",
            token.text,
            suggestions.len()
        );
        self.state = Some(AutocompleteState {
            token,
            suggestions,
            selected,
            anchor,
        });
        self.state.as_ref()
    }

    /// Close the popup when the caret leaves the token it was opened for
    pub fn caret_moved(&mut self, tree: &ContentTree, caret: CaretPosition) {
        let Some(state) = &self.state else {
            return;
        };
        if token_at(tree, caret).as_ref() != Some(&state.token) {
            self.dismiss();
        }
    }

    /// Follow the caret's box after the surface re-laid it out
    pub fn move_anchor(&mut self, anchor: Option<AnchorRect>) {
        if let Some(state) = &mut self.state {
            state.anchor = anchor;
        }
    }

    /// Hide the popup
    pub fn dismiss(&mut self) {
        self.state = None;
    }

    /// Highlight the next suggestion (wrapping)
    pub fn select_next(&mut self) {
        if let Some(state) = &mut self.state {
            state.selected = (state.selected + 1) % state.suggestions.len();
        }
    }

    /// Highlight the previous suggestion (wrapping)
    pub fn select_previous(&mut self) {
        if let Some(state) = &mut self.state {
            let len = state.suggestions.len();
            state.selected = (state.selected + len - 1) % len;
        }
    }

    /// Replace the token with a suggestion (the highlighted one when `index`
    /// is `None`). Returns the caret after the inserted word, or `None` when
    /// nothing was committed. The popup is closed either way.
    pub fn commit(&mut self, tree: &mut ContentTree, index: Option<usize>) -> Option<CaretPosition> {
        let state = self.state.take()?;
        let suggestion = state.suggestions.get(index.unwrap_or(state.selected))?;
        let token = &state.token;

        // The token must still be exactly where it was detected
        let current = token_at(tree, CaretPosition::new(token.block, token.end))?;
        if current != *token {
            debug!("Token '{}' changed before commit, ignoring", token.text);
            return None;
        }

        let mut scratch = tree.clone();
        let caret = scratch.delete_range(token.block, token.start, token.end).ok()?;
        let caret = scratch.insert_text(&suggestion.word, caret).ok()?;
        *tree = scratch;

        debug!("Committed '{}' over '{}'", suggestion.word, token.text);
        Some(caret)
    }
}

impl Default for AutocompleteEngine {
    fn default() -> Self {
        Self::new(Dictionary::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Block, Paragraph};

    fn tree_with(text: &str) -> (ContentTree, BlockId) {
        let paragraph = Paragraph::with_text(text);
        let id = paragraph.id;
        (ContentTree::from_blocks(vec![Block::Paragraph(paragraph)]), id)
    }

    fn engine(words: &[&str]) -> AutocompleteEngine {
        AutocompleteEngine::new(Dictionary::from_words(words.iter().copied()))
    }

    #[test]
    fn test_token_at_caret() {
        let (tree, id) = tree_with("see the examp");
        let token = token_at(&tree, CaretPosition::new(id, 13)).unwrap();
        assert_eq!(token.text, "examp");
        assert_eq!((token.start, token.end), (8, 13));

        // Caret mid-word: only the part before the caret counts
        let token = token_at(&tree, CaretPosition::new(id, 10)).unwrap();
        assert_eq!(token.text, "ex");

        // Caret after a space
        assert!(token_at(&tree, CaretPosition::new(id, 8)).is_none());
    }

    #[test]
    fn test_token_stops_at_non_word_chars() {
        let (tree, id) = tree_with("co-author_2");
        let token = token_at(&tree, CaretPosition::new(id, 11)).unwrap();
        assert_eq!(token.text, "author_2");
    }

    #[test]
    fn test_token_after_multibyte_text() {
        let (tree, id) = tree_with("café th");
        let token = token_at(&tree, CaretPosition::new(id, 7)).unwrap();
        assert_eq!(token.text, "th");
        assert_eq!(token.start, 5);
    }

    #[test]
    fn test_suggestions_in_dictionary_order() {
        let mut engine = engine(&["examp", "example", "examine", "exit"]);
        let (tree, id) = tree_with("examp");

        let state = engine
            .refresh(&tree, CaretPosition::new(id, 5), None)
            .unwrap();
        let words: Vec<_> = state.suggestions.iter().map(|s| s.word.as_str()).collect();
        assert_eq!(words, vec!["example"]);

        let (tree, id) = tree_with("exam");
        let state = engine
            .refresh(&tree, CaretPosition::new(id, 4), None)
            .unwrap();
        let words: Vec<_> = state.suggestions.iter().map(|s| s.word.as_str()).collect();
        assert_eq!(words, vec!["examp", "example", "examine"]);
    }

    #[test]
    fn test_shared_prefix_yields_both_words() {
        let mut engine = engine(&["example", "examine"]);
        let (tree, id) = tree_with("exam");
        let state = engine
            .refresh(&tree, CaretPosition::new(id, 4), None)
            .unwrap();
        let words: Vec<_> = state.suggestions.iter().map(|s| s.word.as_str()).collect();
        assert_eq!(words, vec!["example", "examine"]);
    }

    #[test]
    fn test_short_token_suppresses_popup() {
        let mut engine = engine(&["essay"]);
        let (tree, id) = tree_with("e");
        assert!(engine.refresh(&tree, CaretPosition::new(id, 1), None).is_none());
        assert!(!engine.is_visible());
    }

    #[test]
    fn test_no_match_dismisses() {
        let mut engine = engine(&["essay", "essential"]);
        let (tree, id) = tree_with("ess");
        assert!(engine.refresh(&tree, CaretPosition::new(id, 3), None).is_some());

        let (tree, id) = tree_with("essx");
        assert!(engine.refresh(&tree, CaretPosition::new(id, 4), None).is_none());
        assert!(engine.state().is_none());
    }

    #[test]
    fn test_at_most_five_suggestions() {
        let mut engine = engine(&["ab1", "ab2", "ab3", "ab4", "ab5", "ab6"]);
        let (tree, id) = tree_with("ab");
        let state = engine
            .refresh(&tree, CaretPosition::new(id, 2), None)
            .unwrap();
        assert_eq!(state.suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(state.suggestions[4].word, "ab5");
    }

    #[test]
    fn test_suggestion_split() {
        let engine = engine(&["example"]);
        let suggestions = engine.suggest("Exa");
        assert_eq!(suggestions[0].typed(), "exa");
        assert_eq!(suggestions[0].remainder(), "mple");
    }

    #[test]
    fn test_anchor_is_recorded() {
        let mut engine = engine(&["example"]);
        let (tree, id) = tree_with("ex");
        let anchor = AnchorRect::new(10, 4, 1, 1);
        let state = engine
            .refresh(&tree, CaretPosition::new(id, 2), Some(anchor))
            .unwrap();
        assert_eq!(state.anchor, Some(anchor));
    }

    #[test]
    fn test_commit_replaces_token() {
        let mut engine = engine(&["example", "examine"]);
        let (mut tree, id) = tree_with("an Exam here");
        engine.refresh(&tree, CaretPosition::new(id, 7), None).unwrap();
        engine.select_next();

        let caret = engine.commit(&mut tree, None).unwrap();
        assert_eq!(tree.paragraph_text(id).unwrap(), "an examine here");
        assert_eq!(caret, CaretPosition::new(id, 10));
        assert!(!engine.is_visible());
    }

    #[test]
    fn test_commit_by_index() {
        let mut engine = engine(&["example", "examine"]);
        let (mut tree, id) = tree_with("exa");
        engine.refresh(&tree, CaretPosition::new(id, 3), None).unwrap();

        let caret = engine.commit(&mut tree, Some(0)).unwrap();
        assert_eq!(tree.paragraph_text(id).unwrap(), "example");
        assert_eq!(caret.offset, 7);
    }

    #[test]
    fn test_commit_with_stale_token_is_noop() {
        let mut engine = engine(&["example"]);
        let (mut tree, id) = tree_with("exa");
        engine.refresh(&tree, CaretPosition::new(id, 3), None).unwrap();

        tree.insert_text("Z", CaretPosition::new(id, 0)).unwrap();
        let before = tree.clone();

        assert!(engine.commit(&mut tree, None).is_none());
        assert_eq!(tree, before);
        assert!(!engine.is_visible());
    }

    #[test]
    fn test_selection_wraps() {
        let mut engine = engine(&["ab1", "ab2", "ab3"]);
        let (tree, id) = tree_with("ab");
        engine.refresh(&tree, CaretPosition::new(id, 2), None).unwrap();

        engine.select_previous();
        assert_eq!(engine.state().unwrap().selected, 2);
        engine.select_next();
        assert_eq!(engine.state().unwrap().selected, 0);
    }

    #[test]
    fn test_caret_move_out_of_token_dismisses() {
        let mut engine = engine(&["example"]);
        let (tree, id) = tree_with("ex and");
        engine.refresh(&tree, CaretPosition::new(id, 2), None).unwrap();

        engine.caret_moved(&tree, CaretPosition::new(id, 2));
        assert!(engine.is_visible());

        engine.caret_moved(&tree, CaretPosition::new(id, 6));
        assert!(!engine.is_visible());
    }
}
