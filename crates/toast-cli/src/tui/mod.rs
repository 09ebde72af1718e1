//! Toast Write TUI
//!
//! Full-screen terminal editor for the essay.
//!
//! ## Layout
//!
//! - Top: title bar with the current theme
//! - Middle: the document, wrapped to the window, with the completion popup
//!   under the caret
//! - Bottom: status messages and live statistics
//!
//! ## Keys
//!
//! - Typing edits the document; Enter splits, Tab indents
//! - While suggestions show: Tab/Enter accept, ↑/↓ choose, Esc dismisses
//! - Ctrl+↑/↓: Move block, Ctrl+D: Delete block
//! - Ctrl+B: Bibliography, Ctrl+T: Next theme, Ctrl+E: Export
//! - Ctrl+P: Command mode, F1: Help, Ctrl+Q: Quit

mod app;
mod ui;

use std::fs::File;
use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use toast_core::{Config, Direction, Key};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use app::{App, InputMode, TerminalSelection};

use crate::commands;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run the TUI application
pub fn run(config: Config) -> Result<()> {
    init_tui_logging(&config);

    let editor = commands::open_editor(&config, TerminalSelection::default())?;
    let mut app = App::new(editor, config.export_path());
    info!("TUI started");

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    // Every edit is already saved; this catches slots never written yet
    if let Err(e) = app.editor.flush() {
        warn!(error = %e, "Final save failed");
        eprintln!("Warning: could not save everything: {}", e);
    }

    result
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while !app.should_quit {
        // Lay out first so the selection reports where the caret is now
        let size = terminal.size()?;
        let view = ui::document_view(app, Rect::new(0, 0, size.width, size.height));
        app.editor.selection_mut().set_screen(view.screen.clone());
        app.editor.refresh_anchor();
        terminal.draw(|frame| ui::draw(frame, app, &view))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // Any key closes help
        if app.show_help {
            app.show_help = false;
            continue;
        }

        match app.input_mode {
            InputMode::Editing => handle_editing_key(app, key),
            InputMode::Command => handle_command_key(app, key),
        }
    }
    Ok(())
}

fn handle_editing_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('p') => app.enter_command_mode(),
            KeyCode::Char('t') => app.cycle_theme(),
            KeyCode::Char('b') => {
                app.dispatch(toast_core::Command::InsertBibliography);
            }
            KeyCode::Char('d') => app.delete_current_block(),
            KeyCode::Char('e') => app.export(),
            KeyCode::Up => app.move_current_block(Direction::Up),
            KeyCode::Down => app.move_current_block(Direction::Down),
            _ => {}
        }
        return;
    }

    if key.code == KeyCode::F(1) {
        app.toggle_help();
        return;
    }

    if let Some(key) = editor_key(key.code) {
        app.key(key);
    }
}

fn handle_command_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_input_mode(),
        KeyCode::Enter => app.execute_command(),
        KeyCode::Backspace => app.delete_char(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

/// Map a terminal key to an editor key
fn editor_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Tab => Key::Tab,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => return None,
    })
}

/// Initialize file-based logging for TUI mode
///
/// Only enabled when TOAST_LOG is set; the terminal belongs to the editor.
fn init_tui_logging(config: &Config) {
    let Ok(log_level) = std::env::var("TOAST_LOG") else {
        return;
    };

    let log_path = config.log_path();
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!("toast_core={},toast_cli={}", log_level, log_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_key_mapping() {
        assert_eq!(editor_key(KeyCode::Char('a')), Some(Key::Char('a')));
        assert_eq!(editor_key(KeyCode::Tab), Some(Key::Tab));
        assert_eq!(editor_key(KeyCode::Esc), Some(Key::Escape));
        assert_eq!(editor_key(KeyCode::F(5)), None);
    }
}
