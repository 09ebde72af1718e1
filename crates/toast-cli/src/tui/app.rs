//! Application state and logic

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use toast_core::content::ImageBlock;
use toast_core::notify::Notifier;
use toast_core::{
    AnchorRect, CaretPosition, Command, Direction, EditorState, HtmlRenderer, Key, Outcome,
    SelectionBridge, SqliteSlotStore, Theme,
};

use super::ui::ScreenMap;
use crate::output::describe_error;

/// Caret plus the screen geometry of the last layout
#[derive(Debug, Clone, Default)]
pub struct TerminalSelection {
    caret: Option<CaretPosition>,
    screen: Option<ScreenMap>,
}

impl TerminalSelection {
    /// Record where the document was laid out
    pub fn set_screen(&mut self, screen: ScreenMap) {
        self.screen = Some(screen);
    }
}

impl SelectionBridge for TerminalSelection {
    fn caret(&self) -> Option<CaretPosition> {
        self.caret
    }

    fn set_caret(&mut self, caret: CaretPosition) {
        self.caret = Some(caret);
    }

    fn anchor_rect(&self) -> Option<AnchorRect> {
        let (x, y) = self.screen.as_ref()?.cell(self.caret?)?;
        Some(AnchorRect::new(i32::from(x), i32::from(y), 1, 1))
    }
}

pub type TerminalEditor = EditorState<SqliteSlotStore, TerminalSelection>;

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Typing into the document
    Editing,
    /// Command line (Ctrl+P)
    Command,
}

/// Application state
pub struct App {
    pub editor: TerminalEditor,
    /// Whether the app should exit
    pub should_quit: bool,
    pub input_mode: InputMode,
    /// Command input buffer
    pub command_input: String,
    /// Cursor position in command input, in characters
    pub command_cursor: usize,
    /// Transient status line messages
    pub status: Notifier,
    /// Whether help overlay is visible
    pub show_help: bool,
    /// Where `export` writes
    pub export_dir: PathBuf,
}

impl App {
    pub fn new(editor: TerminalEditor, export_dir: PathBuf) -> Self {
        Self {
            editor,
            should_quit: false,
            input_mode: InputMode::Editing,
            command_input: String::new(),
            command_cursor: 0,
            status: Notifier::new(),
            show_help: false,
            export_dir,
        }
    }

    /// Set a status message (auto-dismissed after 3 seconds)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status.show(message, Utc::now());
    }

    /// Message for the status line: theme notification first, then our own
    pub fn status_message(&self) -> Option<&str> {
        let now = Utc::now();
        self.editor
            .notification_at(now)
            .or_else(|| self.status.visible(now))
    }

    /// Send a key to the editor
    pub fn key(&mut self, key: Key) {
        let outcome = self.editor.handle_key(key);
        self.report(outcome);
    }

    pub fn dispatch(&mut self, command: Command) -> Outcome {
        let outcome = self.editor.dispatch(command);
        self.report(outcome.clone());
        outcome
    }

    fn report(&mut self, outcome: Outcome) {
        if let Some(warning) = outcome.warning {
            self.set_status(warning);
        }
    }

    pub fn move_current_block(&mut self, direction: Direction) {
        let id = self.editor.caret().block;
        if !self.dispatch(Command::MoveBlock(id, direction)).changed {
            self.set_status("Block is already at the edge");
        }
    }

    pub fn delete_current_block(&mut self) {
        let id = self.editor.caret().block;
        self.dispatch(Command::DeleteBlock(id));
        self.set_status("Block deleted");
    }

    /// Switch to the next theme in the list
    pub fn cycle_theme(&mut self) {
        let current = self.editor.theme();
        let index = Theme::ALL.iter().position(|t| *t == current).unwrap_or(0);
        let next = Theme::ALL[(index + 1) % Theme::ALL.len()];
        self.dispatch(Command::SetTheme(next));
    }

    pub fn export(&mut self) {
        match self.editor.export(&HtmlRenderer, &self.export_dir) {
            Ok(path) => self.set_status(format!("Exported to {}", path.display())),
            Err(e) => self.set_status(format!("Export failed: {}", describe_error(&e))),
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn enter_command_mode(&mut self) {
        self.input_mode = InputMode::Command;
        self.command_input.clear();
        self.command_cursor = 0;
    }

    pub fn exit_input_mode(&mut self) {
        self.input_mode = InputMode::Editing;
        self.command_input.clear();
        self.command_cursor = 0;
    }

    /// Insert character at cursor position
    pub fn insert_char(&mut self, c: char) {
        let at = byte_index(&self.command_input, self.command_cursor);
        self.command_input.insert(at, c);
        self.command_cursor += 1;
    }

    /// Delete character before cursor
    pub fn delete_char(&mut self) {
        if self.command_cursor > 0 {
            self.command_cursor -= 1;
            let at = byte_index(&self.command_input, self.command_cursor);
            self.command_input.remove(at);
        }
    }

    pub fn cursor_left(&mut self) {
        self.command_cursor = self.command_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.command_cursor < self.command_input.chars().count() {
            self.command_cursor += 1;
        }
    }

    /// Parse and execute the command line, leaving command mode
    pub fn execute_command(&mut self) {
        let input = self.command_input.trim().to_string();
        self.exit_input_mode();
        if let Err(e) = self.run_command(&input) {
            self.set_status(format!("{:#}", e));
        }
    }

    fn run_command(&mut self, input: &str) -> Result<()> {
        let (name, rest) = input.split_once(' ').unwrap_or((input, ""));
        let rest = rest.trim();

        match name {
            "" => {}
            "q" | "quit" => self.should_quit = true,
            "title" => {
                self.dispatch(Command::SetTitle(rest.to_string()));
                let title = self.editor.title().to_string();
                self.set_status(format!("Title: {}", title));
            }
            "theme" if rest.is_empty() => self.cycle_theme(),
            "theme" => {
                let theme: Theme = rest.parse().map_err(|e: String| anyhow!(e))?;
                self.dispatch(Command::SetTheme(theme));
            }
            "cite" => {
                let format = rest.parse().map_err(|e: String| anyhow!(e))?;
                self.dispatch(Command::InsertCitation(format));
            }
            "bib" => {
                self.dispatch(Command::InsertBibliography);
            }
            "source" => {
                if self.dispatch(Command::AddSource(rest.to_string())).changed {
                    let count = self.editor.sources().len();
                    self.set_status(format!("Added source #{}", count));
                } else {
                    bail!("Usage: source <text>");
                }
            }
            "unsource" => {
                let number: usize = rest.parse().map_err(|_| anyhow!("Usage: unsource <n>"))?;
                let index = number.checked_sub(1).ok_or_else(|| anyhow!("Sources start at 1"))?;
                if !self.dispatch(Command::RemoveSource(index)).changed {
                    bail!("No source #{}", number);
                }
                self.set_status(format!("Removed source #{}", number));
            }
            "table" => {
                let dims: Vec<usize> = rest
                    .split_whitespace()
                    .map(str::parse)
                    .collect::<Result<_, _>>()
                    .map_err(|_| anyhow!("Usage: table <rows> <cols>"))?;
                let [rows, cols] = dims[..] else {
                    bail!("Usage: table <rows> <cols>");
                };
                self.dispatch(Command::InsertTable { rows, cols });
            }
            "cell" => {
                let mut parts = rest.splitn(3, ' ');
                let row = parts.next().and_then(|s| s.parse().ok());
                let col = parts.next().and_then(|s| s.parse().ok());
                let (Some(row), Some(col)) = (row, col) else {
                    bail!("Usage: cell <row> <col> <text>");
                };
                let text = parts.next().unwrap_or("").to_string();
                let block = self.editor.caret().block;
                if !self.dispatch(Command::SetCell { block, row, col, text }).changed {
                    bail!("Put the caret on a table first (rows and columns count from 0)");
                }
            }
            "image" => {
                let path = PathBuf::from(rest);
                let data = std::fs::read(&path)
                    .map_err(|e| anyhow!("Cannot read {}: {}", path.display(), e))?;
                let image = ImageBlock::from_file_bytes(&path, data)?;
                self.dispatch(Command::InsertImage(image));
            }
            "size" | "font" | "spacing" | "align" => {
                let key = match name {
                    "size" => "font_size",
                    "font" => "font_family",
                    "spacing" => "line_spacing",
                    _ => "text_align",
                };
                let mut settings = self.editor.settings().clone();
                settings.set(key, rest)?;
                self.dispatch(Command::ApplySettings(settings));
            }
            "up" => self.move_current_block(Direction::Up),
            "down" => self.move_current_block(Direction::Down),
            "delete" => self.delete_current_block(),
            "export" => self.export(),
            _ => bail!("Unknown command: {}", name),
        }
        Ok(())
    }
}

/// Byte offset of the `chars`-th character
fn byte_index(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::ui::layout_document;
    use ratatui::layout::Rect;
    use toast_core::content::Paragraph;
    use toast_core::{ContentTree, Dictionary, MemorySlotStore, Settings};

    #[test]
    fn test_byte_index() {
        assert_eq!(byte_index("abc", 1), 1);
        assert_eq!(byte_index("éa", 1), 2);
        assert_eq!(byte_index("ab", 5), 2);
    }

    #[test]
    fn test_selection_bridge_anchor() {
        let tree = ContentTree::from_blocks(vec![Paragraph::with_text("abc").into()]);
        let layout = layout_document(&tree, &Settings::default(), 20);
        let mut selection = TerminalSelection::default();
        selection.set_caret(tree.end_caret());
        assert!(selection.anchor_rect().is_none());

        selection.set_screen(ScreenMap {
            map: layout.map,
            area: Rect::new(1, 2, 20, 5),
            scroll: 0,
        });
        assert_eq!(selection.anchor_rect(), Some(AnchorRect::new(4, 2, 1, 1)));
        assert_eq!(selection.anchor_rect().unwrap().bottom(), 3);
    }

    #[test]
    fn test_popup_anchor_tracks_typing() {
        let mut editor = EditorState::open(
            MemorySlotStore::new(),
            TerminalSelection::default(),
            Dictionary::builtin(),
        );
        editor.handle_key(Key::Char('e'));
        editor.handle_key(Key::Char('x'));

        let layout = layout_document(editor.content(), editor.settings(), 30);
        editor.selection_mut().set_screen(ScreenMap {
            map: layout.map,
            area: Rect::new(1, 1, 30, 10),
            scroll: 0,
        });

        // Typing again before the next frame still anchors at the new caret
        editor.handle_key(Key::Char('a'));
        let anchor = editor.autocomplete().unwrap().anchor.unwrap();
        assert_eq!((anchor.x, anchor.y), (4, 1));
    }

    #[test]
    fn test_failed_export_shows_recovery_suggestion() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = toast_core::Config {
            data_dir: dir.path().to_path_buf(),
            log_file: None,
            dictionary_path: None,
            export_dir: None,
        };
        let editor = crate::commands::open_editor(&config, TerminalSelection::default()).unwrap();

        // A regular file where the export directory should be
        let blocker = dir.path().join("exports");
        std::fs::write(&blocker, "not a directory").unwrap();
        let mut app = App::new(editor, blocker.join("nested"));

        app.export();
        let status = app.status_message().unwrap();
        assert!(status.starts_with("Export failed: "));
        assert!(status.contains("writable directory"));
    }
}
