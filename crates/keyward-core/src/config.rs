//! Keystore configuration
//!
//! Loaded once at process start from a JSON file; every field has a
//! default so a partial file is enough.

use crate::seal::KdfParams;
use crate::{Error, Result};
use keyward_params::NetworkType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Keystore configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystoreConfig {
    /// Target network for address encoding and ledger queries
    pub network: NetworkType,
    /// Storage backend
    pub storage: StorageConfig,
    /// Argon2id parameters for newly sealed seeds
    pub kdf: KdfParams,
    /// Ledger indexer
    pub indexer: IndexerConfig,
    /// Issuance policy
    pub issuance: IssuanceConfig,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            network: NetworkType::Mainnet,
            storage: StorageConfig::default(),
            kdf: KdfParams::default(),
            indexer: IndexerConfig::default(),
            issuance: IssuanceConfig::default(),
        }
    }
}

impl KeystoreConfig {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("Cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Write as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.indexer.timeout_secs == 0 {
            return Err(Error::Config("indexer.timeout_secs must be positive".to_string()));
        }
        if !self.indexer.base_url.starts_with("http://")
            && !self.indexer.base_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "indexer.base_url must be http(s): {}",
                self.indexer.base_url
            )));
        }
        if self.kdf.t_cost == 0 || self.kdf.p_cost == 0 {
            return Err(Error::Config("kdf costs must be positive".to_string()));
        }
        if let StorageConfig::Sqlite { path } = &self.storage {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("storage.path must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Storage backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Ephemeral in-process storage
    Memory,
    /// SQLite database file
    Sqlite {
        /// Database path
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: PathBuf::from("keyward.db"),
        }
    }
}

/// Ledger indexer endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Base URL; the network name and resource path are appended
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Issuance policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuanceConfig {
    /// Start an empty key index at path index 1 instead of 0, matching
    /// wallets issued before discovery existed
    pub legacy_first_index: bool,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            legacy_first_index: true,
        }
    }
}
