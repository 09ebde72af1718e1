//! Typed access to slots
//!
//! Each persisted entity implements [`SlotValue`] to name its key and its
//! text encoding. [`Slots`] wraps any [`SlotStore`] and turns absent,
//! unreadable or malformed slots into the entity's default.

use std::fmt;

use tracing::{debug, warn};

use crate::storage::error::StorageResult;
use crate::storage::slot_store::SlotStore;

/// The independently keyed entries of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Content,
    Title,
    Settings,
    Sources,
    Theme,
}

impl Slot {
    /// Every slot, in load order
    pub const ALL: [Slot; 5] = [
        Slot::Theme,
        Slot::Settings,
        Slot::Title,
        Slot::Content,
        Slot::Sources,
    ];

    /// Storage key for this slot
    pub fn key(self) -> &'static str {
        match self {
            Slot::Content => "toast-write-content",
            Slot::Title => "toast-write-title",
            Slot::Settings => "toast-write-settings",
            Slot::Sources => "toast-write-sources",
            Slot::Theme => "toast-write-theme",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A value that lives in exactly one slot
pub trait SlotValue: Default {
    /// The slot this value is stored under
    const SLOT: Slot;

    /// Parse the stored text; `None` means malformed
    fn decode(raw: &str) -> Option<Self>;

    /// Render the value for storage
    fn encode(&self) -> String;
}

/// Typed wrapper around a slot store
pub struct Slots<S> {
    store: S,
}

impl<S: SlotStore> Slots<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load a value, falling back to its default when absent or malformed
    pub fn load<T: SlotValue>(&self) -> T {
        let slot = T::SLOT;
        match self.store.load(slot.key()) {
            Ok(Some(raw)) => T::decode(&raw).unwrap_or_else(|| {
                warn!(
                    "Slot {} is malformed, using default ({} bytes discarded on next save)",
                    slot,
                    raw.len()
                );
                T::default()
            }),
            Ok(None) => {
                debug!("Slot {} is empty, using default", slot);
                T::default()
            }
            Err(e) => {
                warn!("Failed to read slot {}: {}", slot, e);
                T::default()
            }
        }
    }

    /// Write a value to its slot
    pub fn save<T: SlotValue>(&mut self, value: &T) -> StorageResult<()> {
        self.store.save(T::SLOT.key(), &value.encode())
    }

    /// Remove every slot; the next load of each yields defaults
    pub fn clear(&mut self) -> StorageResult<()> {
        for slot in Slot::ALL {
            self.store.remove(slot.key())?;
        }
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::slot_store::MemorySlotStore;

    #[derive(Debug, PartialEq)]
    struct Counter(u32);

    impl Default for Counter {
        fn default() -> Self {
            Counter(7)
        }
    }

    impl SlotValue for Counter {
        const SLOT: Slot = Slot::Title;

        fn decode(raw: &str) -> Option<Self> {
            raw.parse().ok().map(Counter)
        }

        fn encode(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_absent_slot_yields_default() {
        let slots = Slots::new(MemorySlotStore::new());
        assert_eq!(slots.load::<Counter>(), Counter(7));
    }

    #[test]
    fn test_malformed_slot_yields_default() {
        let mut store = MemorySlotStore::new();
        store.save(Slot::Title.key(), "not a number").unwrap();

        let slots = Slots::new(store);
        assert_eq!(slots.load::<Counter>(), Counter(7));
    }

    #[test]
    fn test_save_then_load() {
        let mut slots = Slots::new(MemorySlotStore::new());
        slots.save(&Counter(42)).unwrap();
        assert_eq!(slots.load::<Counter>(), Counter(42));
        assert_eq!(
            slots.store().load("toast-write-title").unwrap().as_deref(),
            Some("42")
        );
    }

    #[test]
    fn test_clear_removes_all_slots() {
        let mut store = MemorySlotStore::new();
        for slot in Slot::ALL {
            store.save(slot.key(), "x").unwrap();
        }
        store.save("unrelated", "kept").unwrap();

        let mut slots = Slots::new(store);
        slots.clear().unwrap();
        assert_eq!(slots.store().len(), 1);
    }

    #[test]
    fn test_keys_are_distinct() {
        let mut keys: Vec<_> = Slot::ALL.iter().map(|s| s.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), Slot::ALL.len());
    }
}
