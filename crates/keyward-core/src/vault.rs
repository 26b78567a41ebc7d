//! Secure key vault
//!
//! Implements BIP-39 mnemonic handling and BIP-32 public key derivation
//! for the keystore. The vault holds at most one seed; its mnemonic
//! entropy is kept sealed under the vault passphrase and is only unsealed
//! for the duration of a single call.

use crate::seal::{KdfParams, SealedSeed};
use crate::store::SealedSeedStore;
use crate::{Error, Result};
use async_trait::async_trait;
use bip32::{DerivationPath, XPrv};
use bip39::{Language, Mnemonic};
use blake2b_simd::Params as Blake2bParams;
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

const SEED_HASH_PERSONALIZATION: &[u8; 16] = b"keyward_seedhash";

/// Compressed secp256k1 public key
pub type PublicKeyBytes = [u8; 33];

/// Default mnemonic length for new seeds
pub const DEFAULT_WORD_COUNT: usize = 24;

/// Content-derived identifier of a seed (hex BLAKE2b-256 of the BIP-39 seed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeedHash(String);

impl SeedHash {
    /// Hash raw BIP-39 seed bytes
    pub fn from_seed(seed: &[u8]) -> Self {
        let hash = Blake2bParams::new()
            .hash_length(32)
            .personal(SEED_HASH_PERSONALIZATION)
            .hash(seed);
        Self(hex::encode(hash.as_bytes()))
    }

    /// Parse a previously rendered seed hash
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let normalized = encoded.trim().to_ascii_lowercase();
        let bytes = hex::decode(&normalized)
            .map_err(|e| Error::NoActiveSeed(format!("Malformed seed hash: {e}")))?;
        if bytes.len() != 32 {
            return Err(Error::NoActiveSeed(
                "Seed hash must be 32 bytes".to_string(),
            ));
        }
        Ok(Self(normalized))
    }

    /// Hex string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex characters, for logs
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for SeedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SeedHash {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        SeedHash::from_hex(&value)
    }
}

impl From<SeedHash> for String {
    fn from(value: SeedHash) -> Self {
        value.0
    }
}

/// Seed vault capability
///
/// Every operation that touches secret material takes the vault
/// passphrase explicitly.
#[async_trait]
pub trait SeedVault: Send + Sync {
    /// Generate and seal a fresh seed with a `word_count` word mnemonic
    async fn create_seed(&self, passphrase: &str, word_count: usize) -> Result<SeedHash>;

    /// Hashes of the seeds held (zero or one)
    async fn seed_hashes(&self) -> Result<Vec<SeedHash>>;

    /// Export the mnemonic backup phrase
    async fn export_mnemonic(
        &self,
        seed_hash: &SeedHash,
        passphrase: &str,
    ) -> Result<Zeroizing<String>>;

    /// Import a mnemonic, replacing any active seed
    async fn import_mnemonic(&self, phrase: &str, passphrase: &str) -> Result<SeedHash>;

    /// Derive the compressed public key at `path`
    async fn derive_public_key(
        &self,
        seed_hash: &SeedHash,
        path: &str,
        passphrase: &str,
    ) -> Result<PublicKeyBytes>;

    /// Whether a seed is present
    async fn exists(&self) -> Result<bool>;

    /// Remove the seed
    async fn clear(&self) -> Result<()>;
}

/// Entropy length in bytes for a BIP-39 word count
fn entropy_len(word_count: usize) -> Result<usize> {
    match word_count {
        12 | 15 | 18 | 21 | 24 => Ok(word_count / 3 * 4),
        other => Err(Error::InvalidMnemonic(format!(
            "Unsupported word count {other}; expected 12, 15, 18, 21, or 24"
        ))),
    }
}

fn seed_hash_of(mnemonic: &Mnemonic) -> SeedHash {
    let seed = Zeroizing::new(mnemonic.to_seed(""));
    SeedHash::from_seed(&seed[..])
}

/// Vault backed by a [`SealedSeedStore`]
pub struct LocalVault<S: SealedSeedStore + ?Sized> {
    store: Arc<S>,
    kdf: KdfParams,
    // Serialises check-then-write sequences on the seed slot
    write_lock: Mutex<()>,
}

impl<S: SealedSeedStore + ?Sized> LocalVault<S> {
    /// Create vault over `store`, sealing new seeds with `kdf`
    pub fn new(store: Arc<S>, kdf: KdfParams) -> Self {
        Self {
            store,
            kdf,
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Option<SealedSeed>> {
        self.store
            .load_sealed()
            .map_err(|e| Error::VaultUnavailable(e.to_string()))
    }

    fn sealed_for(&self, seed_hash: &SeedHash) -> Result<SealedSeed> {
        match self.load()? {
            Some(sealed) if &sealed.seed_hash == seed_hash => Ok(sealed),
            Some(_) => Err(Error::NoActiveSeed(format!(
                "Seed {} is not held by this vault",
                seed_hash.short()
            ))),
            None => Err(Error::NoActiveSeed("Vault is empty".to_string())),
        }
    }

    fn unseal_mnemonic(&self, seed_hash: &SeedHash, passphrase: &str) -> Result<Mnemonic> {
        let sealed = self.sealed_for(seed_hash)?;
        let entropy = sealed.unseal(passphrase)?;
        Mnemonic::from_entropy(&entropy[..])
            .map_err(|e| Error::Encryption(format!("Sealed entropy is corrupt: {e}")))
    }

    fn seal_and_store(&self, mnemonic: &Mnemonic, passphrase: &str) -> Result<SeedHash> {
        let seed_hash = seed_hash_of(mnemonic);
        let entropy = Zeroizing::new(mnemonic.to_entropy());
        let sealed = SealedSeed::seal(seed_hash.clone(), &entropy[..], passphrase, self.kdf)?;
        self.store.save_sealed(&sealed)?;
        Ok(seed_hash)
    }
}

#[async_trait]
impl<S: SealedSeedStore + ?Sized> SeedVault for LocalVault<S> {
    async fn create_seed(&self, passphrase: &str, word_count: usize) -> Result<SeedHash> {
        let mut entropy = Zeroizing::new(vec![0u8; entropy_len(word_count)?]);
        OsRng.fill_bytes(&mut entropy[..]);
        let mnemonic = Mnemonic::from_entropy(&entropy[..])
            .map_err(|e| Error::InvalidMnemonic(e.to_string()))?;

        let _guard = self.write_lock.lock();
        if let Some(existing) = self.load()? {
            return Err(Error::SeedAlreadyExists(existing.seed_hash.short().to_string()));
        }
        let seed_hash = self.seal_and_store(&mnemonic, passphrase)?;
        tracing::info!("Created {}-word seed {}", word_count, seed_hash.short());
        Ok(seed_hash)
    }

    async fn seed_hashes(&self) -> Result<Vec<SeedHash>> {
        Ok(self.load()?.map(|s| s.seed_hash).into_iter().collect())
    }

    async fn export_mnemonic(
        &self,
        seed_hash: &SeedHash,
        passphrase: &str,
    ) -> Result<Zeroizing<String>> {
        let mnemonic = self.unseal_mnemonic(seed_hash, passphrase)?;
        Ok(Zeroizing::new(mnemonic.to_string()))
    }

    async fn import_mnemonic(&self, phrase: &str, passphrase: &str) -> Result<SeedHash> {
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
            .map_err(|e| Error::InvalidMnemonic(e.to_string()))?;

        let _guard = self.write_lock.lock();
        let seed_hash = self.seal_and_store(&mnemonic, passphrase)?;
        tracing::info!("Imported seed {}", seed_hash.short());
        Ok(seed_hash)
    }

    async fn derive_public_key(
        &self,
        seed_hash: &SeedHash,
        path: &str,
        passphrase: &str,
    ) -> Result<PublicKeyBytes> {
        let path: DerivationPath = path
            .parse()
            .map_err(|e| Error::InvalidPath(format!("{path}: {e}")))?;
        let mnemonic = self.unseal_mnemonic(seed_hash, passphrase)?;
        let seed = Zeroizing::new(mnemonic.to_seed(""));
        let xprv = XPrv::derive_from_path(&seed[..], &path)
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;
        Ok(xprv.public_key().to_bytes())
    }

    async fn exists(&self) -> Result<bool> {
        Ok(self.load()?.is_some())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.store.clear_sealed()?;
        tracing::info!("Cleared seed vault");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::path_for;
    use crate::records::KeyRole;
    use crate::store::MemoryStore;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn vault() -> LocalVault<MemoryStore> {
        LocalVault::new(Arc::new(MemoryStore::new()), KdfParams::fast())
    }

    #[tokio::test]
    async fn test_create_seed() {
        let vault = vault();
        assert!(!vault.exists().await.unwrap());

        let hash = vault.create_seed("pw", 24).await.unwrap();
        assert!(vault.exists().await.unwrap());
        assert_eq!(vault.seed_hashes().await.unwrap(), vec![hash.clone()]);

        let phrase = vault.export_mnemonic(&hash, "pw").await.unwrap();
        assert_eq!(phrase.split_whitespace().count(), 24);
    }

    #[tokio::test]
    async fn test_create_seed_twice_fails() {
        let vault = vault();
        vault.create_seed("pw", 12).await.unwrap();
        let err = vault.create_seed("pw", 12).await.unwrap_err();
        assert!(matches!(err, Error::SeedAlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_invalid_word_count() {
        let err = vault().create_seed("pw", 13).await.unwrap_err();
        assert!(matches!(err, Error::InvalidMnemonic(_)));
    }

    #[tokio::test]
    async fn test_import_is_deterministic() {
        let a = vault();
        let b = vault();
        let hash_a = a.import_mnemonic(PHRASE, "one").await.unwrap();
        let hash_b = b.import_mnemonic(PHRASE, "two").await.unwrap();
        assert_eq!(hash_a, hash_b);

        let path = path_for(KeyRole::Platform, 0);
        let key_a = a.derive_public_key(&hash_a, &path, "one").await.unwrap();
        let key_b = b.derive_public_key(&hash_b, &path, "two").await.unwrap();
        assert_eq!(key_a, key_b);
        assert!(key_a[0] == 0x02 || key_a[0] == 0x03);
    }

    #[tokio::test]
    async fn test_export_import_roundtrip() {
        let original = vault();
        let hash = original.create_seed("pw", 12).await.unwrap();
        let phrase = original.export_mnemonic(&hash, "pw").await.unwrap();

        let restored = vault();
        let restored_hash = restored.import_mnemonic(&phrase, "pw").await.unwrap();
        assert_eq!(restored_hash, hash);

        let path = path_for(KeyRole::Asset, 7);
        assert_eq!(
            original.derive_public_key(&hash, &path, "pw").await.unwrap(),
            restored.derive_public_key(&restored_hash, &path, "pw").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_import_replaces_active_seed() {
        let vault = vault();
        let first = vault.create_seed("pw", 12).await.unwrap();
        let second = vault.import_mnemonic(PHRASE, "pw").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(vault.seed_hashes().await.unwrap(), vec![second]);
    }

    #[tokio::test]
    async fn test_invalid_mnemonic() {
        let err = vault()
            .import_mnemonic("abandon abandon abandon", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMnemonic(_)));
    }

    #[tokio::test]
    async fn test_wrong_passphrase() {
        let vault = vault();
        let hash = vault.import_mnemonic(PHRASE, "right").await.unwrap();
        let err = vault
            .derive_public_key(&hash, &path_for(KeyRole::Asset, 0), "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPassphrase));
        assert!(matches!(
            vault.export_mnemonic(&hash, "wrong").await,
            Err(Error::InvalidPassphrase)
        ));
    }

    #[tokio::test]
    async fn test_unknown_seed_hash() {
        let vault = vault();
        vault.import_mnemonic(PHRASE, "pw").await.unwrap();
        let other = SeedHash::from_seed(b"some other seed");
        let err = vault
            .derive_public_key(&other, &path_for(KeyRole::Asset, 0), "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoActiveSeed(_)));
    }

    #[tokio::test]
    async fn test_invalid_path() {
        let vault = vault();
        let hash = vault.import_mnemonic(PHRASE, "pw").await.unwrap();
        let err = vault
            .derive_public_key(&hash, "m/44'/not-a-number", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));

        // One past the last non-hardened index
        let err = vault
            .derive_public_key(&hash, &format!("{}/2147483648", crate::paths::ASSET_PATH_PREFIX), "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_distinct_paths_distinct_keys() {
        let vault = vault();
        let hash = vault.import_mnemonic(PHRASE, "pw").await.unwrap();
        let k0 = vault
            .derive_public_key(&hash, &path_for(KeyRole::Platform, 0), "pw")
            .await
            .unwrap();
        let k1 = vault
            .derive_public_key(&hash, &path_for(KeyRole::Platform, 1), "pw")
            .await
            .unwrap();
        let a0 = vault
            .derive_public_key(&hash, &path_for(KeyRole::Asset, 0), "pw")
            .await
            .unwrap();
        assert_ne!(k0, k1);
        assert_ne!(k0, a0);
    }

    #[tokio::test]
    async fn test_clear() {
        let vault = vault();
        vault.create_seed("pw", 12).await.unwrap();
        vault.clear().await.unwrap();
        assert!(!vault.exists().await.unwrap());
        assert!(vault.seed_hashes().await.unwrap().is_empty());
    }

    #[test]
    fn test_seed_hash_parse() {
        let hash = SeedHash::from_seed(b"seed");
        assert_eq!(hash.as_str().len(), 64);
        assert_eq!(SeedHash::from_hex(&hash.as_str().to_uppercase()).unwrap(), hash);
        assert!(SeedHash::from_hex("abcd").is_err());
        assert_eq!(hash.short().len(), 8);
    }
}
