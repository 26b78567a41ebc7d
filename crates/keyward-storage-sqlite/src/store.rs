//! SQLite-backed keystore storage

use crate::{Database, Repository};
use keyward_core::{KeyIndexStore, KeyRecord, KeyRole, SealedSeed, SealedSeedStore};
use parking_lot::Mutex;
use std::path::Path;

/// Durable [`KeyIndexStore`] and [`SealedSeedStore`]
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    /// Open the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        Ok(Self::from_database(Database::open(path)?))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> crate::Result<Self> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    /// Wrap an opened database
    pub fn from_database(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }
}

impl KeyIndexStore for SqliteStore {
    fn load_keys(&self, role: KeyRole) -> keyward_core::Result<Vec<KeyRecord>> {
        let db = self.db.lock();
        Ok(Repository::new(db.conn()).load_keys(role)?)
    }

    fn save_keys(&self, role: KeyRole, records: &[KeyRecord]) -> keyward_core::Result<()> {
        let mut db = self.db.lock();
        let tx = db.conn_mut().transaction().map_err(crate::Error::from)?;
        Repository::new(&tx).replace_keys(role, records)?;
        tx.commit().map_err(crate::Error::from)?;
        tracing::debug!("Stored {} {} key records", records.len(), role);
        Ok(())
    }
}

impl SealedSeedStore for SqliteStore {
    fn load_sealed(&self) -> keyward_core::Result<Option<SealedSeed>> {
        let db = self.db.lock();
        Ok(Repository::new(db.conn()).load_sealed()?)
    }

    fn save_sealed(&self, sealed: &SealedSeed) -> keyward_core::Result<()> {
        let db = self.db.lock();
        Ok(Repository::new(db.conn()).save_sealed(sealed)?)
    }

    fn clear_sealed(&self) -> keyward_core::Result<()> {
        let db = self.db.lock();
        Ok(Repository::new(db.conn()).clear_sealed()?)
    }
}
