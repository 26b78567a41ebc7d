//! Keyward HD keystore core
//!
//! This crate implements seed custody, deterministic key derivation,
//! ledger-driven address discovery, and address issuance for the two
//! Keyward key roles (platform accounts and asset transfers).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod config;
pub mod discovery;
pub mod error;
pub mod issuance;
pub mod keystore;
pub mod paths;
pub mod probe;
pub mod records;
pub mod seal;
pub mod session;
pub mod state;
pub mod store;
pub mod vault;

pub use address::{decode_address, display_name, encode_address, fingerprint, WalletAddress};
pub use config::{IndexerConfig, IssuanceConfig, KeystoreConfig, StorageConfig};
pub use discovery::{discover, scan, DiscoveryScan};
pub use error::{Error, ErrorCategory, Result};
pub use issuance::{issue_next, next_index};
pub use keystore::{Keystore, RestoredWallet};
pub use paths::{path_for, ASSET_PATH_PREFIX, MAX_PATH_INDEX, PLATFORM_PATH_PREFIX, SCAN_RANGE};
pub use probe::{has_activity, AccountState, LedgerProbe, UnspentOutput};
pub use records::{KeyFingerprint, KeyRecord, KeyRole};
pub use seal::{KdfParams, SealedSeed};
pub use session::PassphraseStore;
pub use state::{reduce, WalletCommand, WalletState};
pub use store::{KeyIndexStore, MemoryStore, SealedSeedStore, StorageBackend};
pub use vault::{LocalVault, PublicKeyBytes, SeedHash, SeedVault, DEFAULT_WORD_COUNT};

#[cfg(any(test, feature = "test-helpers"))]
pub use probe::MemoryLedger;

pub use keyward_params::{Network, NetworkType};
