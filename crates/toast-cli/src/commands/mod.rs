//! Command handlers

pub mod blocks;
pub mod config;
pub mod document;
pub mod export;
pub mod settings;
pub mod sources;
pub mod status;

use anyhow::{anyhow, Context, Result};

use toast_core::{
    BlockId, Config, Dictionary, EditorState, SelectionBridge, SqliteSlotStore, TrackedSelection,
};

/// Editor session used by one-shot commands. With no caret set, edits land
/// at the end of the document.
pub type Session = EditorState<SqliteSlotStore, TrackedSelection>;

/// Open the slot database and dictionary named by the config
pub fn open_editor<B: SelectionBridge>(
    config: &Config,
    selection: B,
) -> Result<EditorState<SqliteSlotStore, B>> {
    let store = SqliteSlotStore::open(config).context("Failed to open the slot database")?;
    let dictionary = Dictionary::load_or_builtin(config.dictionary_path.as_deref())
        .context("Failed to load dictionary")?;
    Ok(EditorState::open(store, selection, dictionary))
}

pub fn open_session(config: &Config) -> Result<Session> {
    open_editor(config, TrackedSelection::new())
}

/// Resolve a full id or unique prefix to a block id
pub fn resolve_block(session: &Session, id: &str) -> Result<BlockId> {
    session
        .content()
        .find_by_prefix(id)
        .map(|block| block.id())
        .ok_or_else(|| anyhow!("No single block matches '{}'. See: toast blocks", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use toast_core::{Command, HtmlRenderer};

    fn temp_config(dir: &TempDir) -> Config {
        Config {
            data_dir: dir.path().to_path_buf(),
            log_file: None,
            dictionary_path: None,
            export_dir: Some(dir.path().join("exports")),
        }
    }

    #[test]
    fn test_session_persists_between_commands() {
        let dir = TempDir::new().unwrap();
        let config = temp_config(&dir);

        let mut session = open_session(&config).unwrap();
        session.dispatch(Command::SetTitle("Field Notes".into()));
        session.dispatch(Command::InsertText("Plain words".into()));
        drop(session);

        let session = open_session(&config).unwrap();
        assert_eq!(session.title().as_str(), "Field Notes");
        assert_eq!(session.content().plain_text(), "Plain words");
    }

    #[test]
    fn test_resolve_block_by_prefix() {
        let dir = TempDir::new().unwrap();
        let session = open_session(&temp_config(&dir)).unwrap();
        let id = session.content().blocks()[0].id();
        let prefix: String = id.to_string().chars().take(8).collect();

        assert_eq!(resolve_block(&session, &prefix).unwrap(), id);
        assert!(resolve_block(&session, "zzzz").is_err());
    }

    #[test]
    fn test_export_lands_in_export_dir() {
        let dir = TempDir::new().unwrap();
        let config = temp_config(&dir);
        let mut session = open_session(&config).unwrap();
        session.dispatch(Command::SetTitle("Report".into()));

        let path = session.export(&HtmlRenderer, &config.export_path()).unwrap();
        assert!(path.starts_with(dir.path().join("exports")));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("Report"));
    }
}
