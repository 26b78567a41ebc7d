//! In-memory storage for the session passphrase.
//!
//! The passphrase is held only for the lifetime of the keystore and is never persisted.

use crate::{Error, Result};
use parking_lot::RwLock;
use zeroize::Zeroizing;

/// Session passphrase slot
#[derive(Default)]
pub struct PassphraseStore {
    slot: RwLock<Option<Zeroizing<String>>>,
}

impl PassphraseStore {
    /// Empty (locked) store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the passphrase in memory.
    pub fn set(&self, passphrase: &str) {
        *self.slot.write() = Some(Zeroizing::new(passphrase.to_string()));
    }

    /// Clear the in-memory passphrase.
    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    /// Check whether a passphrase is loaded.
    pub fn is_set(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Get a copy of the passphrase.
    pub fn get(&self) -> Result<Zeroizing<String>> {
        self.slot
            .read()
            .as_ref()
            .map(|p| Zeroizing::new(p.to_string()))
            .ok_or(Error::Locked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_cycle() {
        let store = PassphraseStore::new();
        assert!(!store.is_set());
        assert!(matches!(store.get(), Err(Error::Locked)));

        store.set("hunter2");
        assert!(store.is_set());
        assert_eq!(store.get().unwrap().as_str(), "hunter2");

        store.clear();
        assert!(!store.is_set());
        assert!(store.get().is_err());
    }
}
