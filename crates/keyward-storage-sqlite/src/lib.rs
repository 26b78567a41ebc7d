//! SQLite storage for Keyward
//!
//! Persists per-role key indices and the sealed seed in a single SQLite
//! file (WAL mode, versioned migrations). Seed entropy arrives here
//! already sealed; nothing in this crate sees plaintext secrets.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod database;
pub mod error;
pub mod migrations;
pub mod repository;
pub mod store;

pub use database::Database;
pub use error::{Error, Result};
pub use repository::Repository;
pub use store::SqliteStore;

use keyward_core::{MemoryStore, StorageBackend, StorageConfig};
use std::sync::Arc;

/// Open the storage backend selected by `config`
pub fn open_backend(config: &StorageConfig) -> keyward_core::Result<Arc<dyn StorageBackend>> {
    match config {
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage; nothing will be persisted");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageConfig::Sqlite { path } => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Ok(Arc::new(SqliteStore::open(path)?))
        }
    }
}
