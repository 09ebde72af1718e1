//! Toast Write Core Library
//!
//! This crate provides the document engine behind Toast Write, a local
//! essay writer: a block-structured content tree with caret-aware edits,
//! word completion at the caret, and per-slot persistence of the document,
//! title, settings, sources and theme.
//!
//! # Architecture
//!
//! - **Content model**: pure data plus mutations that return a new caret
//! - **Slots**: one independent store entry per entity, no cross-slot transactions
//! - **EditorState**: the only mutator; every change is persisted immediately
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let store = SqliteSlotStore::open(&config)?;
//! let mut editor = EditorState::open(store, TrackedSelection::new(), Dictionary::builtin());
//!
//! editor.dispatch(Command::InsertText("Toast is bread".into()));
//! editor.dispatch(Command::AddSource("Smith, 2020".into()));
//! editor.dispatch(Command::InsertBibliography);
//! ```
//!
//! # Modules
//!
//! - `editor`: Document controller and command table (main entry point)
//! - `content`: Blocks, content tree and rendering
//! - `autocomplete`: Token detection and completion popup state
//! - `dictionary`: Replaceable completion word list
//! - `storage`: Slot stores (SQLite, in-memory) and typed slot access
//! - `settings`, `theme`, `sources`, `stats`, `notify`: Supporting managers
//! - `export`: Renderer collaborator interface and HTML renderer
//! - `config`: Application configuration

pub mod autocomplete;
pub mod config;
pub mod content;
pub mod dictionary;
pub mod document;
pub mod editor;
pub mod export;
pub mod notify;
pub mod selection;
pub mod settings;
pub mod sources;
pub mod stats;
pub mod storage;
pub mod theme;

pub use autocomplete::{AutocompleteEngine, AutocompleteState, Suggestion, Token};
pub use config::Config;
pub use content::{
    Block, BlockId, CaretPosition, CitationFormat, ContentError, ContentTree, Direction,
};
pub use dictionary::Dictionary;
pub use document::{Document, Title};
pub use editor::{Command, EditorState, Key, Motion, Outcome};
pub use export::{DocumentRenderer, ExportConfig, HtmlRenderer, PrintCopy};
pub use selection::{AnchorRect, SelectionBridge, TrackedSelection};
pub use settings::{Settings, SettingsError, TextAlign};
pub use sources::SourceList;
pub use stats::Statistics;
pub use storage::{MemorySlotStore, SlotStore, SqliteSlotStore, StorageError};
pub use theme::Theme;
