//! Local key index and sealed seed storage
//!
//! Storage is an external collaborator: the keystore only needs the two
//! narrow traits below. [`MemoryStore`] is the ephemeral backend used for
//! test runs and throwaway sessions; the durable backend lives in
//! `keyward-storage-sqlite`.

use crate::records::{KeyRecord, KeyRole};
use crate::seal::SealedSeed;
use crate::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Per-role ordered list of derived key records
pub trait KeyIndexStore: Send + Sync {
    /// Load the key index for `role`; an unknown role yields an empty list
    fn load_keys(&self, role: KeyRole) -> Result<Vec<KeyRecord>>;

    /// Replace the key index for `role`. Must be atomic: either every
    /// record is written or the previous index is left untouched.
    fn save_keys(&self, role: KeyRole, records: &[KeyRecord]) -> Result<()>;
}

/// Storage slot for the vault's single sealed seed
pub trait SealedSeedStore: Send + Sync {
    /// Load the sealed seed, if any
    fn load_sealed(&self) -> Result<Option<SealedSeed>>;

    /// Store the sealed seed, replacing any previous one
    fn save_sealed(&self, sealed: &SealedSeed) -> Result<()>;

    /// Remove the sealed seed
    fn clear_sealed(&self) -> Result<()>;
}

/// A backend providing both key index and sealed seed storage
pub trait StorageBackend: KeyIndexStore + SealedSeedStore {}

impl<T: KeyIndexStore + SealedSeedStore> StorageBackend for T {}

/// Ephemeral in-process storage
#[derive(Default)]
pub struct MemoryStore {
    keys: RwLock<HashMap<KeyRole, Vec<KeyRecord>>>,
    sealed: RwLock<Option<SealedSeed>>,
}

impl MemoryStore {
    /// Create empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyIndexStore for MemoryStore {
    fn load_keys(&self, role: KeyRole) -> Result<Vec<KeyRecord>> {
        Ok(self.keys.read().get(&role).cloned().unwrap_or_default())
    }

    fn save_keys(&self, role: KeyRole, records: &[KeyRecord]) -> Result<()> {
        self.keys.write().insert(role, records.to_vec());
        Ok(())
    }
}

impl SealedSeedStore for MemoryStore {
    fn load_sealed(&self) -> Result<Option<SealedSeed>> {
        Ok(self.sealed.read().clone())
    }

    fn save_sealed(&self, sealed: &SealedSeed) -> Result<()> {
        *self.sealed.write() = Some(sealed.clone());
        Ok(())
    }

    fn clear_sealed(&self) -> Result<()> {
        *self.sealed.write() = None;
        Ok(())
    }
}
