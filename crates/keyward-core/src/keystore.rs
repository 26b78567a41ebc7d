//! Keystore facade
//!
//! Ties the vault, key index store, and ledger probe together for one
//! network. The vault handle is created lazily on first use and shared by
//! every later caller.

use crate::address::WalletAddress;
use crate::config::KeystoreConfig;
use crate::discovery;
use crate::issuance;
use crate::probe::LedgerProbe;
use crate::records::{KeyRecord, KeyRole};
use crate::seal::SealedSeed;
use crate::session::PassphraseStore;
use crate::store::{KeyIndexStore, SealedSeedStore, StorageBackend};
use crate::vault::{LocalVault, SeedHash, SeedVault};
use crate::{Error, Result};
use keyward_params::Network;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;
use zeroize::Zeroizing;

/// Result of restoring a wallet from its mnemonic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoredWallet {
    /// Hash of the imported seed
    pub seed_hash: SeedHash,
    /// Discovered platform addresses
    pub platform: Vec<WalletAddress>,
    /// Discovered asset addresses
    pub asset: Vec<WalletAddress>,
}

/// HD keystore for a single network
pub struct Keystore {
    config: KeystoreConfig,
    network: Network,
    storage: Arc<dyn StorageBackend>,
    probe: Arc<dyn LedgerProbe>,
    session: PassphraseStore,
    vault: OnceCell<Arc<dyn SeedVault>>,
}

impl Keystore {
    /// Create keystore; the vault opens over `storage` on first use
    pub fn new(
        config: KeystoreConfig,
        storage: Arc<dyn StorageBackend>,
        probe: Arc<dyn LedgerProbe>,
    ) -> Self {
        let network = Network::from_type(config.network);
        Self {
            config,
            network,
            storage,
            probe,
            session: PassphraseStore::new(),
            vault: OnceCell::new(),
        }
    }

    /// Create keystore around an already opened vault
    pub fn with_vault(
        config: KeystoreConfig,
        storage: Arc<dyn StorageBackend>,
        probe: Arc<dyn LedgerProbe>,
        vault: Arc<dyn SeedVault>,
    ) -> Self {
        Self {
            vault: OnceCell::new_with(Some(vault)),
            ..Self::new(config, storage, probe)
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &KeystoreConfig {
        &self.config
    }

    /// Target network
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Shared vault handle, opened on first call
    pub async fn vault(&self) -> Result<Arc<dyn SeedVault>> {
        let vault = self
            .vault
            .get_or_try_init(|| async {
                // Fail early if the seed slot is unreachable
                self.storage
                    .load_sealed()
                    .map_err(|e| Error::VaultUnavailable(e.to_string()))?;
                tracing::debug!("Opened seed vault");
                let vault: Arc<dyn SeedVault> =
                    Arc::new(LocalVault::new(self.storage.clone(), self.config.kdf));
                Ok::<_, Error>(vault)
            })
            .await?;
        Ok(vault.clone())
    }

    async fn active_seed(&self, vault: &dyn SeedVault) -> Result<SeedHash> {
        vault
            .seed_hashes()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoActiveSeed("Vault is empty".to_string()))
    }

    /// Generate a new seed
    pub async fn create_wallet(&self, passphrase: &str, word_count: usize) -> Result<SeedHash> {
        self.vault().await?.create_seed(passphrase, word_count).await
    }

    /// Export the active seed's mnemonic
    pub async fn export_mnemonic(&self, passphrase: &str) -> Result<Zeroizing<String>> {
        let vault = self.vault().await?;
        let seed_hash = self.active_seed(vault.as_ref()).await?;
        vault.export_mnemonic(&seed_hash, passphrase).await
    }

    /// Import `phrase` and discover both roles
    ///
    /// Both roles are scanned before anything is persisted. If either scan
    /// or the final write fails, the previous seed and key indices are put
    /// back.
    pub async fn restore_wallet(&self, phrase: &str, passphrase: &str) -> Result<RestoredWallet> {
        let vault = self.vault().await?;
        let snapshot = Snapshot::take(self.storage.as_ref())?;

        let seed_hash = vault.import_mnemonic(phrase, passphrase).await?;
        match self.scan_and_persist(vault.as_ref(), &seed_hash, passphrase).await {
            Ok((platform, asset)) => Ok(RestoredWallet {
                seed_hash,
                platform,
                asset,
            }),
            Err(e) => {
                tracing::warn!("Restore of {} failed, rolling back: {}", seed_hash.short(), e);
                if let Err(rollback) = snapshot.restore(self.storage.as_ref(), &seed_hash) {
                    tracing::error!("Rollback after failed restore also failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    async fn scan_and_persist(
        &self,
        vault: &dyn SeedVault,
        seed_hash: &SeedHash,
        passphrase: &str,
    ) -> Result<(Vec<WalletAddress>, Vec<WalletAddress>)> {
        let (platform_records, platform) = discovery::scan(
            vault,
            self.probe.as_ref(),
            seed_hash,
            KeyRole::Platform,
            &self.network,
            passphrase,
        )
        .await?;
        let (asset_records, asset) = discovery::scan(
            vault,
            self.probe.as_ref(),
            seed_hash,
            KeyRole::Asset,
            &self.network,
            passphrase,
        )
        .await?;

        self.storage.save_keys(KeyRole::Platform, &platform_records)?;
        self.storage.save_keys(KeyRole::Asset, &asset_records)?;
        tracing::info!(
            "Restored seed {}: {} platform, {} asset addresses",
            seed_hash.short(),
            platform.len(),
            asset.len()
        );
        Ok((platform, asset))
    }

    /// Rebuild the used addresses of `role`
    pub async fn discover(&self, role: KeyRole, passphrase: &str) -> Result<Vec<WalletAddress>> {
        let vault = self.vault().await?;
        let seed_hash = self.active_seed(vault.as_ref()).await?;
        discovery::discover(
            vault.as_ref(),
            self.storage.as_ref(),
            self.probe.as_ref(),
            &seed_hash,
            role,
            &self.network,
            passphrase,
        )
        .await
    }

    /// Issue the next address of `role`
    pub async fn issue_next(&self, role: KeyRole, passphrase: &str) -> Result<WalletAddress> {
        let vault = self.vault().await?;
        let seed_hash = self.active_seed(vault.as_ref()).await?;
        issuance::issue_next(
            vault.as_ref(),
            self.storage.as_ref(),
            &seed_hash,
            role,
            &self.network,
            passphrase,
            &self.config.issuance,
        )
        .await
    }

    /// Addresses of `role` from the stored key index
    pub fn addresses(&self, role: KeyRole) -> Result<Vec<WalletAddress>> {
        self.storage
            .load_keys(role)?
            .iter()
            .map(|record| WalletAddress::from_record(record, &self.network))
            .collect()
    }

    /// Remove the seed and both key indices
    pub async fn clear(&self) -> Result<()> {
        // Indices first so no record outlives its seed
        for role in KeyRole::ALL {
            self.storage.save_keys(role, &[])?;
        }
        self.vault().await?.clear().await?;
        self.session.clear();
        Ok(())
    }

    /// Hold `passphrase` for the `*_unlocked` operations
    pub fn unlock(&self, passphrase: &str) {
        self.session.set(passphrase);
    }

    /// Drop the session passphrase
    pub fn lock(&self) {
        self.session.clear();
    }

    /// Whether a session passphrase is held
    pub fn is_unlocked(&self) -> bool {
        self.session.is_set()
    }

    /// [`Keystore::discover`] with the session passphrase
    pub async fn discover_unlocked(&self, role: KeyRole) -> Result<Vec<WalletAddress>> {
        let passphrase = self.session.get()?;
        self.discover(role, &passphrase).await
    }

    /// [`Keystore::issue_next`] with the session passphrase
    pub async fn issue_next_unlocked(&self, role: KeyRole) -> Result<WalletAddress> {
        let passphrase = self.session.get()?;
        self.issue_next(role, &passphrase).await
    }
}

/// Seed slot and key indices captured before a restore
struct Snapshot {
    sealed: Option<SealedSeed>,
    platform: Vec<KeyRecord>,
    asset: Vec<KeyRecord>,
}

impl Snapshot {
    fn take(storage: &dyn StorageBackend) -> Result<Self> {
        Ok(Self {
            sealed: storage.load_sealed()?,
            platform: storage.load_keys(KeyRole::Platform)?,
            asset: storage.load_keys(KeyRole::Asset)?,
        })
    }

    /// Put the captured state back after `imported` failed to restore
    fn restore(self, storage: &dyn StorageBackend, imported: &SeedHash) -> Result<()> {
        let slot_holds_import = storage
            .load_sealed()?
            .is_some_and(|sealed| &sealed.seed_hash == imported);

        if !slot_holds_import {
            // The vault keeps its seed elsewhere; the old records cannot
            // stay next to the imported seed
            storage.save_keys(KeyRole::Platform, &[])?;
            storage.save_keys(KeyRole::Asset, &[])?;
            return Ok(());
        }

        // Every step is attempted; the first failure is reported
        let seed = match &self.sealed {
            Some(sealed) => storage.save_sealed(sealed),
            None => storage.clear_sealed(),
        };
        let platform = storage.save_keys(KeyRole::Platform, &self.platform);
        let asset = storage.save_keys(KeyRole::Asset, &self.asset);
        seed.and(platform).and(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::probe::MemoryLedger;
    use crate::seal::KdfParams;
    use crate::store::MemoryStore;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn config() -> KeystoreConfig {
        KeystoreConfig {
            storage: StorageConfig::Memory,
            kdf: KdfParams::fast(),
            ..KeystoreConfig::default()
        }
    }

    fn keystore() -> (Keystore, Arc<MemoryStore>, Arc<MemoryLedger>) {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(MemoryLedger::new());
        let keystore = Keystore::new(config(), store.clone(), ledger.clone());
        (keystore, store, ledger)
    }

    #[tokio::test]
    async fn test_vault_is_created_once() {
        let (keystore, _, _) = keystore();
        let (a, b) = tokio::join!(keystore.vault(), keystore.vault());
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        let c = keystore.vault().await.unwrap();
        let d = keystore.vault().await.unwrap();
        assert!(Arc::ptr_eq(&c, &d));
    }

    #[tokio::test]
    async fn test_with_vault_uses_given_handle() {
        let store = Arc::new(MemoryStore::new());
        let vault: Arc<dyn SeedVault> =
            Arc::new(LocalVault::new(store.clone(), KdfParams::fast()));
        let keystore = Keystore::with_vault(
            config(),
            store,
            Arc::new(MemoryLedger::new()),
            vault.clone(),
        );
        assert!(Arc::ptr_eq(&keystore.vault().await.unwrap(), &vault));
    }

    #[tokio::test]
    async fn test_failed_restore_with_external_vault_drops_stale_records() {
        let vault_store = Arc::new(MemoryStore::new());
        let vault: Arc<dyn SeedVault> =
            Arc::new(LocalVault::new(vault_store, KdfParams::fast()));
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(MemoryLedger::new());
        let keystore = Keystore::with_vault(config(), store.clone(), ledger.clone(), vault);

        keystore.restore_wallet(PHRASE, "pw").await.unwrap();
        keystore.issue_next(KeyRole::Platform, "pw").await.unwrap();

        // The second restore aborts at platform index 0
        let other = "legal winner thank year wave sausage worth useful legal winner thank yellow";
        let scratch = LocalVault::new(Arc::new(MemoryStore::new()), KdfParams::fast());
        let hash = scratch.import_mnemonic(other, "x").await.unwrap();
        let key = scratch
            .derive_public_key(&hash, &crate::paths::path_for(KeyRole::Platform, 0), "x")
            .await
            .unwrap();
        let address = crate::address::encode_address(
            &crate::address::fingerprint(&key),
            KeyRole::Platform,
            keystore.network(),
        )
        .unwrap();
        ledger.fail_on(address);

        assert!(keystore.restore_wallet(other, "pw").await.is_err());
        assert!(store.load_keys(KeyRole::Platform).unwrap().is_empty());
        assert!(store.load_keys(KeyRole::Asset).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_operations_without_seed() {
        let (keystore, _, _) = keystore();
        assert!(matches!(
            keystore.discover(KeyRole::Platform, "pw").await,
            Err(Error::NoActiveSeed(_))
        ));
        assert!(matches!(
            keystore.issue_next(KeyRole::Asset, "pw").await,
            Err(Error::NoActiveSeed(_))
        ));
        assert!(matches!(
            keystore.export_mnemonic("pw").await,
            Err(Error::NoActiveSeed(_))
        ));
    }

    #[tokio::test]
    async fn test_create_then_export() {
        let (keystore, _, _) = keystore();
        keystore.create_wallet("pw", 12).await.unwrap();
        let phrase = keystore.export_mnemonic("pw").await.unwrap();
        assert_eq!(phrase.split_whitespace().count(), 12);
        assert!(matches!(
            keystore.create_wallet("pw", 12).await,
            Err(Error::SeedAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_issue_and_list() {
        let (keystore, _, _) = keystore();
        keystore.restore_wallet(PHRASE, "pw").await.unwrap();

        let first = keystore.issue_next(KeyRole::Platform, "pw").await.unwrap();
        assert_eq!(first.path_index, 1);
        let second = keystore.issue_next(KeyRole::Platform, "pw").await.unwrap();
        assert_eq!(second.path_index, 2);

        let listed = keystore.addresses(KeyRole::Platform).unwrap();
        assert_eq!(listed, vec![first, second]);
        assert!(keystore.addresses(KeyRole::Asset).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unlocked_operations() {
        let (keystore, _, _) = keystore();
        keystore.restore_wallet(PHRASE, "pw").await.unwrap();

        assert!(!keystore.is_unlocked());
        assert!(matches!(
            keystore.issue_next_unlocked(KeyRole::Asset).await,
            Err(Error::Locked)
        ));

        keystore.unlock("pw");
        assert!(keystore.is_unlocked());
        keystore.issue_next_unlocked(KeyRole::Asset).await.unwrap();
        assert!(keystore.discover_unlocked(KeyRole::Asset).await.unwrap().is_empty());

        keystore.lock();
        assert!(matches!(
            keystore.discover_unlocked(KeyRole::Asset).await,
            Err(Error::Locked)
        ));
    }

    #[tokio::test]
    async fn test_clear_removes_seed_and_indices() {
        let (keystore, store, _) = keystore();
        keystore.restore_wallet(PHRASE, "pw").await.unwrap();
        keystore.issue_next(KeyRole::Platform, "pw").await.unwrap();
        keystore.unlock("pw");

        keystore.clear().await.unwrap();
        assert!(!keystore.vault().await.unwrap().exists().await.unwrap());
        assert!(store.load_keys(KeyRole::Platform).unwrap().is_empty());
        assert!(!keystore.is_unlocked());
    }
}
