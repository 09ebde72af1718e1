//! Storage layer
//!
//! Handles slot persistence.
//!
//! ## Architecture
//!
//! - **Slots**: one independently keyed text value per logical entity
//! - **SQLite**: durable backend for slots
//! - **Codecs**: typed encode/decode per slot, falling back to defaults
//!
//! A slot that is missing or fails to decode yields the default for its
//! type. Nothing here ever rolls back a sibling slot.

pub mod atomic;
pub mod error;
pub mod schema;
pub mod slot_store;
pub mod slots;

pub use atomic::atomic_write;
pub use error::{StorageError, StorageResult};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use slot_store::{MemorySlotStore, SlotStore, SqliteSlotStore};
pub use slots::{Slot, SlotValue, Slots};
