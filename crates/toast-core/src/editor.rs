//! Document controller
//!
//! `EditorState` owns the document, settings, theme and sources in memory and
//! mirrors each of them into its own store slot. Construction loads every
//! slot; [`EditorState::flush`] writes them all back.
//!
//! Input arrives as a [`Command`] (or a raw [`Key`] routed to one) and goes
//! through [`EditorState::dispatch`], the single mutation entry point. Every
//! change is written to its slot before `dispatch` returns.
//!
//! ## Usage
//!
//! ```ignore
//! let store = SqliteSlotStore::open(&config)?;
//! let mut editor = EditorState::open(store, TrackedSelection::new(), Dictionary::builtin());
//!
//! editor.dispatch(Command::InsertText("Hello".into()));
//! let outcome = editor.handle_key(Key::Enter);
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::autocomplete::{AutocompleteEngine, AutocompleteState, Suggestion};
use crate::content::{
    BlockId, CaretPosition, CitationBlock, CitationFormat, ContentError, ContentTree, Direction,
    ImageBlock, TableBlock,
};
use crate::dictionary::Dictionary;
use crate::document::{Document, Title};
use crate::export::{DocumentRenderer, ExportConfig, PrintCopy};
use crate::notify::Notifier;
use crate::selection::SelectionBridge;
use crate::settings::{Settings, TextAlign};
use crate::sources::SourceList;
use crate::stats::Statistics;
use crate::storage::{SlotStore, SlotValue, Slots, StorageResult};
use crate::theme::{Theme, ThemeChange, ThemeManager};

/// Four non-breaking spaces inserted by Tab
pub const INDENT: &str = "\u{a0}\u{a0}\u{a0}\u{a0}";

/// Warning shown when a bibliography is requested without sources
pub const EMPTY_BIBLIOGRAPHY_WARNING: &str = "No sources to insert. Add sources first.";

/// Raw keys a surface forwards to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Tab,
    Enter,
    Escape,
    Backspace,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// Caret movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// Everything the editor can be asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    InsertText(String),
    Backspace,
    SplitParagraph,
    Indent,
    MoveCaret(Motion),
    SetCaret(CaretPosition),

    AcceptSuggestion(Option<usize>),
    NextSuggestion,
    PreviousSuggestion,
    DismissSuggestions,

    SetTitle(String),
    InsertImage(ImageBlock),
    InsertTable { rows: usize, cols: usize },
    SetCell {
        block: BlockId,
        row: usize,
        col: usize,
        text: String,
    },
    InsertCitation(CitationFormat),
    InsertBibliography,
    MoveBlock(BlockId, Direction),
    DeleteBlock(BlockId),

    AddSource(String),
    RemoveSource(usize),

    SetTheme(Theme),
    SetFontSize(u32),
    SetFontFamily(String),
    SetLineSpacing(f32),
    SetTextAlign(TextAlign),
    ApplySettings(Settings),
}

/// Result of a dispatched command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// In-memory state changed (and was persisted)
    pub changed: bool,
    /// The surface must not apply its own handling for the key
    pub suppress_default: bool,
    /// User-visible warning
    pub warning: Option<String>,
}

impl Outcome {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn changed() -> Self {
        Self {
            changed: true,
            ..Self::default()
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            warning: Some(message.into()),
            ..Self::default()
        }
    }

    fn suppressing(mut self, suppress: bool) -> Self {
        self.suppress_default = suppress;
        self
    }
}

/// The editor session
pub struct EditorState<S: SlotStore, B: SelectionBridge> {
    slots: Slots<S>,
    selection: B,
    document: Document,
    settings: Settings,
    sources: SourceList,
    themes: ThemeManager,
    notifier: Notifier,
    autocomplete: AutocompleteEngine,
    stats: Statistics,
}

impl<S: SlotStore, B: SelectionBridge> EditorState<S, B> {
    /// Load every slot and start a session
    ///
    /// Absent or malformed slots fall back to defaults. The saved theme is
    /// applied without a notification.
    pub fn open(store: S, selection: B, dictionary: Dictionary) -> Self {
        let slots = Slots::new(store);

        let theme: Theme = slots.load();
        let settings: Settings = slots.load();
        let title: Title = slots.load();
        let content: ContentTree = slots.load();
        let sources: SourceList = slots.load();

        let stats = Statistics::for_tree(&content);
        info!(
            "Opened '{}' ({} blocks, {} sources, theme {})",
            title,
            content.len(),
            sources.len(),
            theme
        );

        let mut editor = Self {
            slots,
            selection,
            document: Document::new(title, content),
            settings,
            sources,
            themes: ThemeManager::restore(theme),
            notifier: Notifier::new(),
            autocomplete: AutocompleteEngine::new(dictionary),
            stats,
        };
        let caret = editor.caret();
        editor.selection.set_caret(caret);
        editor
    }

    /// Write every slot. Stops at the first failing write.
    pub fn flush(&mut self) -> StorageResult<()> {
        self.slots.save(&self.themes.current())?;
        self.slots.save(&self.settings)?;
        self.slots.save(&self.document.title)?;
        self.slots.save(&self.document.content)?;
        self.slots.save(&self.sources)?;
        debug!("Flushed all slots");
        Ok(())
    }

    /// Remove every slot and return to defaults
    pub fn reset(&mut self) -> StorageResult<()> {
        self.slots.clear()?;
        self.document = Document::default();
        self.settings = Settings::default();
        self.sources = SourceList::default();
        self.themes = ThemeManager::restore(Theme::default());
        self.notifier.clear();
        self.autocomplete.dismiss();
        self.stats = Statistics::for_tree(&self.document.content);
        let caret = self.document.content.end_caret();
        self.selection.set_caret(caret);
        info!("Reset all slots to defaults");
        Ok(())
    }

    /// Map a key to a command given the popup state
    pub fn route_key(&self, key: Key) -> Option<Command> {
        if self.autocomplete.is_visible() {
            match key {
                Key::Tab | Key::Enter => return Some(Command::AcceptSuggestion(None)),
                Key::Escape => return Some(Command::DismissSuggestions),
                Key::Up => return Some(Command::PreviousSuggestion),
                Key::Down => return Some(Command::NextSuggestion),
                _ => {}
            }
        }

        match key {
            Key::Char(c) => Some(Command::InsertText(c.to_string())),
            Key::Tab => Some(Command::Indent),
            Key::Enter => Some(Command::SplitParagraph),
            Key::Backspace => Some(Command::Backspace),
            Key::Left => Some(Command::MoveCaret(Motion::Left)),
            Key::Right => Some(Command::MoveCaret(Motion::Right)),
            Key::Up => Some(Command::MoveCaret(Motion::Up)),
            Key::Down => Some(Command::MoveCaret(Motion::Down)),
            Key::Home => Some(Command::MoveCaret(Motion::Home)),
            Key::End => Some(Command::MoveCaret(Motion::End)),
            Key::Escape => None,
        }
    }

    /// Route and dispatch a key
    pub fn handle_key(&mut self, key: Key) -> Outcome {
        match self.route_key(key) {
            Some(command) => self.dispatch(command),
            None => Outcome::unchanged(),
        }
    }

    /// Apply a command
    pub fn dispatch(&mut self, command: Command) -> Outcome {
        debug!("Dispatch {:?}", command);
        match command {
            Command::InsertText(text) => {
                let caret = self.edit_caret();
                let result = self.document.content.insert_text(&text, caret);
                self.after_typing(result)
            }
            Command::Backspace => {
                let caret = self.edit_caret();
                match self.document.content.delete_backward(caret).transpose() {
                    Some(result) => self.after_typing(result),
                    None => {
                        debug!("Nothing before the caret to delete");
                        Outcome::unchanged()
                    }
                }
            }
            Command::Indent => {
                let caret = self.edit_caret();
                let result = self.document.content.insert_text(INDENT, caret);
                self.after_typing(result)
            }
            Command::SplitParagraph => {
                let caret = self.edit_caret();
                let result = self.document.content.split_paragraph(caret);
                self.after_content_edit(result)
            }
            Command::MoveCaret(motion) => {
                let caret = self.moved_caret(motion);
                self.place_caret(caret)
            }
            Command::SetCaret(caret) => {
                let caret = self.document.content.clamp(caret);
                self.place_caret(caret)
            }

            Command::AcceptSuggestion(index) => self.accept_suggestion(index),
            Command::NextSuggestion => {
                let visible = self.autocomplete.is_visible();
                self.autocomplete.select_next();
                Outcome::unchanged().suppressing(visible)
            }
            Command::PreviousSuggestion => {
                let visible = self.autocomplete.is_visible();
                self.autocomplete.select_previous();
                Outcome::unchanged().suppressing(visible)
            }
            Command::DismissSuggestions => {
                let visible = self.autocomplete.is_visible();
                self.autocomplete.dismiss();
                Outcome::unchanged().suppressing(visible)
            }

            Command::SetTitle(text) => {
                let title = Title::new(&text);
                if title == self.document.title {
                    return Outcome::unchanged();
                }
                self.document.title = title;
                persist(&mut self.slots, &self.document.title);
                Outcome::changed()
            }
            Command::InsertImage(image) => self.insert_block(image.into()),
            Command::InsertTable { rows, cols } => {
                if rows == 0 || cols == 0 {
                    return Outcome::warning("Tables need at least one row and one column");
                }
                self.insert_block(TableBlock::new(rows, cols).into())
            }
            Command::SetCell {
                block,
                row,
                col,
                text,
            } => {
                let result = self
                    .document
                    .content
                    .set_cell(block, row, col, &text)
                    .map(|()| self.caret());
                self.after_content_edit(result)
            }
            Command::InsertCitation(format) => {
                self.insert_block(CitationBlock::from_template(format).into())
            }
            Command::InsertBibliography => {
                let Some(blocks) = self.sources.bibliography_blocks() else {
                    return Outcome::warning(EMPTY_BIBLIOGRAPHY_WARNING);
                };
                let caret = self.edit_caret();
                let result = self.document.content.insert_blocks(blocks, caret);
                self.after_content_edit(result)
            }
            Command::MoveBlock(id, direction) => {
                match self.document.content.move_block(id, direction) {
                    Ok(true) => {
                        self.content_changed();
                        Outcome::changed()
                    }
                    Ok(false) => Outcome::unchanged(),
                    Err(e) => {
                        debug!("Move ignored: {}", e);
                        Outcome::unchanged()
                    }
                }
            }
            Command::DeleteBlock(id) => {
                let caret = self.caret();
                let result = self.document.content.delete_block(id).map(|fallback| {
                    if caret.block == id {
                        fallback
                    } else {
                        self.document.content.clamp(caret)
                    }
                });
                self.after_content_edit(result)
            }

            Command::AddSource(text) => {
                if !self.sources.add(&text) {
                    return Outcome::unchanged();
                }
                persist(&mut self.slots, &self.sources);
                Outcome::changed()
            }
            Command::RemoveSource(index) => {
                if self.sources.remove(index).is_none() {
                    debug!("No source at index {}", index);
                    return Outcome::unchanged();
                }
                persist(&mut self.slots, &self.sources);
                Outcome::changed()
            }

            Command::SetTheme(theme) => self.set_theme(theme, Utc::now()),
            Command::SetFontSize(px) => self.update_settings(|s| s.set_font_size(px)),
            Command::SetFontFamily(family) => self.update_settings(|s| s.set_font_family(&family)),
            Command::SetLineSpacing(spacing) => {
                self.update_settings(|s| s.set_line_spacing(spacing))
            }
            Command::SetTextAlign(align) => self.update_settings(|s| s.text_align = align),
            Command::ApplySettings(settings) => self.update_settings(|s| *s = settings),
        }
    }

    /// Switch theme at a given time (notification deadline is relative to `now`)
    pub fn set_theme(&mut self, theme: Theme, now: DateTime<Utc>) -> Outcome {
        match self.themes.set_theme(theme) {
            ThemeChange::Unchanged => Outcome::unchanged(),
            ThemeChange::Switched { notification } => {
                persist(&mut self.slots, &theme);
                match notification {
                    Some(message) => self.notifier.show(message, now),
                    None => self.notifier.clear(),
                }
                Outcome::changed()
            }
        }
    }

    /// Current caret, repaired if the selection points somewhere stale
    pub fn caret(&self) -> CaretPosition {
        match self.selection.caret() {
            Some(caret) => self.document.content.clamp(caret),
            None => self.document.content.end_caret(),
        }
    }

    /// Re-read the popup anchor from the selection
    ///
    /// Surfaces call this once the caret has a fresh screen position, so the
    /// popup follows layout changes such as wrapping or scrolling.
    pub fn refresh_anchor(&mut self) {
        let anchor = self.selection.anchor_rect();
        self.autocomplete.move_anchor(anchor);
    }

    /// Caret for an edit, exactly as the selection reports it
    ///
    /// A stale caret is passed through so the edit fails validation and
    /// leaves the tree alone. With no caret at all, edits go to the end.
    fn edit_caret(&self) -> CaretPosition {
        self.selection
            .caret()
            .unwrap_or_else(|| self.document.content.end_caret())
    }

    /// Completions for an arbitrary token, as the popup would show them
    pub fn suggest(&self, token: &str) -> Vec<Suggestion> {
        self.autocomplete.suggest(token)
    }

    pub fn set_dictionary(&mut self, dictionary: Dictionary) {
        self.autocomplete.set_dictionary(dictionary);
        self.autocomplete.dismiss();
    }

    /// Options for exporting the current document
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig::for_title(&self.document.title)
    }

    /// Detached copy for a renderer, without the placeholder
    pub fn print_copy(&self) -> PrintCopy {
        let blocks = if self.document.content.is_placeholder() {
            Vec::new()
        } else {
            self.document.content.blocks().to_vec()
        };
        PrintCopy {
            title: self.document.title.clone(),
            blocks,
            settings: self.settings.clone(),
        }
    }

    pub fn print<R: DocumentRenderer>(&self, renderer: &R, out: &mut dyn Write) -> Result<()> {
        renderer.print(&self.print_copy(), out)
    }

    pub fn export<R: DocumentRenderer>(&self, renderer: &R, dir: &Path) -> Result<PathBuf> {
        renderer.export_to_file(&self.print_copy(), &self.export_config(), dir)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn title(&self) -> &Title {
        &self.document.title
    }

    pub fn content(&self) -> &ContentTree {
        &self.document.content
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sources(&self) -> &SourceList {
        &self.sources
    }

    pub fn theme(&self) -> Theme {
        self.themes.current()
    }

    pub fn stats(&self) -> Statistics {
        self.stats
    }

    pub fn autocomplete(&self) -> Option<&AutocompleteState> {
        self.autocomplete.state()
    }

    /// Notification visible now
    pub fn notification(&self) -> Option<&str> {
        self.notifier.visible(Utc::now())
    }

    pub fn notification_at(&self, now: DateTime<Utc>) -> Option<&str> {
        self.notifier.visible(now)
    }

    pub fn selection(&self) -> &B {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut B {
        &mut self.selection
    }

    pub fn store(&self) -> &S {
        self.slots.store()
    }

    pub fn into_store(self) -> S {
        self.slots.into_inner()
    }

    /// After a text keystroke: persist, then look for a token at the new caret
    fn after_typing(&mut self, result: Result<CaretPosition, ContentError>) -> Outcome {
        let outcome = self.after_content_edit(result);
        if outcome.changed {
            let caret = self.caret();
            let anchor = self.selection.anchor_rect();
            self.autocomplete
                .refresh(&self.document.content, caret, anchor);
        }
        outcome
    }

    /// After a structural edit: persist and close the popup
    fn after_content_edit(&mut self, result: Result<CaretPosition, ContentError>) -> Outcome {
        match result {
            Ok(caret) => {
                self.selection.set_caret(caret);
                self.autocomplete.dismiss();
                self.content_changed();
                Outcome::changed()
            }
            Err(e) => {
                debug!("Edit ignored: {}", e);
                Outcome::unchanged()
            }
        }
    }

    fn insert_block(&mut self, block: crate::content::Block) -> Outcome {
        let caret = self.edit_caret();
        let result = self.document.content.insert_block(block, caret);
        self.after_content_edit(result)
    }

    fn accept_suggestion(&mut self, index: Option<usize>) -> Outcome {
        let visible = self.autocomplete.is_visible();
        match self.autocomplete.commit(&mut self.document.content, index) {
            Some(caret) => {
                self.selection.set_caret(caret);
                self.content_changed();
                Outcome::changed().suppressing(true)
            }
            None => Outcome::unchanged().suppressing(visible),
        }
    }

    fn place_caret(&mut self, caret: CaretPosition) -> Outcome {
        self.selection.set_caret(caret);
        self.autocomplete
            .caret_moved(&self.document.content, caret);
        Outcome::unchanged()
    }

    fn moved_caret(&self, motion: Motion) -> CaretPosition {
        let tree = &self.document.content;
        let caret = self.caret();
        let Some(index) = tree.index_of(caret.block) else {
            return tree.end_caret();
        };
        let blocks = tree.blocks();
        let previous = index.checked_sub(1).and_then(|i| blocks.get(i));
        let next = blocks.get(index + 1);
        let len = blocks[index].caret_len();

        match motion {
            Motion::Left if caret.offset > 0 => CaretPosition::new(caret.block, caret.offset - 1),
            Motion::Left => previous.map_or(caret, |b| CaretPosition::new(b.id(), b.caret_len())),
            Motion::Right if caret.offset < len => {
                CaretPosition::new(caret.block, caret.offset + 1)
            }
            Motion::Right => next.map_or(caret, |b| CaretPosition::new(b.id(), 0)),
            Motion::Up => previous.map_or(caret, |b| {
                CaretPosition::new(b.id(), caret.offset.min(b.caret_len()))
            }),
            Motion::Down => next.map_or(caret, |b| {
                CaretPosition::new(b.id(), caret.offset.min(b.caret_len()))
            }),
            Motion::Home => CaretPosition::new(caret.block, 0),
            Motion::End => CaretPosition::new(caret.block, len),
        }
    }

    fn content_changed(&mut self) {
        persist(&mut self.slots, &self.document.content);
        self.stats = Statistics::for_tree(&self.document.content);
    }

    fn update_settings(&mut self, apply: impl FnOnce(&mut Settings)) -> Outcome {
        let mut settings = self.settings.clone();
        apply(&mut settings);
        if settings == self.settings {
            return Outcome::unchanged();
        }
        self.settings = settings;
        persist(&mut self.slots, &self.settings);
        Outcome::changed()
    }
}

/// Write one slot; a failure is logged and the in-memory value stays current
fn persist<S: SlotStore, T: SlotValue>(slots: &mut Slots<S>, value: &T) {
    if let Err(e) = slots.save(value) {
        warn!("Failed to save slot {}: {}", T::SLOT, e);
    }
}
