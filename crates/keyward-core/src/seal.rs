//! Seed sealing primitives
//!
//! Mnemonic entropy is stored sealed with ChaCha20-Poly1305 under a key
//! derived from the vault passphrase with Argon2id. The seed hash is bound
//! as associated data so a sealed blob cannot be swapped between seeds.

use crate::vault::SeedHash;
use crate::{Error, Result};
use argon2::{Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Salt length for passphrase KDF
pub const SALT_LEN: usize = 16;

const SEAL_VERSION: u8 = 1;
const SEAL_ALGORITHM_CHACHA20: u8 = 1;
const NONCE_LEN: usize = 12;
const HEADER_LEN: usize = 2 + NONCE_LEN;

/// Argon2id cost parameters, stored with every sealed seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub m_cost_kib: u32,
    /// Iterations
    pub t_cost: u32,
    /// Lanes
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost_kib: 19 * 1024,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

impl KdfParams {
    /// Minimal parameters so tests do not spend seconds per unseal
    #[cfg(any(test, feature = "test-helpers"))]
    pub const fn fast() -> Self {
        Self {
            m_cost_kib: 8,
            t_cost: 1,
            p_cost: 1,
        }
    }
}

/// Symmetric key derived from a passphrase
pub struct SealingKey {
    key: Zeroizing<[u8; 32]>,
}

impl SealingKey {
    /// Derive from passphrase and salt using Argon2id
    pub fn derive(passphrase: &str, salt: &[u8], params: &KdfParams) -> Result<Self> {
        if salt.len() < SALT_LEN {
            return Err(Error::Encryption("Salt too short".to_string()));
        }

        let params = Params::new(params.m_cost_kib, params.t_cost, params.p_cost, Some(32))
            .map_err(|e| Error::Encryption(format!("Invalid KDF parameters: {e}")))?;
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; 32]);
        argon2
            .hash_password_into(passphrase.as_bytes(), salt, &mut *key)
            .map_err(|e| Error::Encryption(e.to_string()))?;

        Ok(Self { key })
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.key[..]))
    }

    /// Seal plaintext, binding `aad`
    pub fn seal(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|e| Error::Encryption(e.to_string()))?;

        // Format: [version(1)][algorithm(1)][nonce(12)][ciphertext(variable)]
        let mut result = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        result.push(SEAL_VERSION);
        result.push(SEAL_ALGORITHM_CHACHA20);
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    /// Open a sealed blob. Authentication failure means the passphrase was wrong.
    pub fn open(&self, data: &[u8], aad: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if data.len() < HEADER_LEN {
            return Err(Error::Encryption("Invalid ciphertext length".to_string()));
        }
        if data[0] != SEAL_VERSION {
            return Err(Error::Encryption(format!(
                "Unsupported seal version: {}",
                data[0]
            )));
        }
        if data[1] != SEAL_ALGORITHM_CHACHA20 {
            return Err(Error::Encryption(format!(
                "Unsupported seal algorithm: {}",
                data[1]
            )));
        }

        let nonce = Nonce::from_slice(&data[2..HEADER_LEN]);
        let plaintext = self
            .cipher()
            .decrypt(
                nonce,
                Payload {
                    msg: &data[HEADER_LEN..],
                    aad,
                },
            )
            .map_err(|_| Error::InvalidPassphrase)?;
        Ok(Zeroizing::new(plaintext))
    }
}

/// Generate secure random salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Sealed mnemonic entropy as persisted by a [`crate::store::SealedSeedStore`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSeed {
    /// Content hash of the BIP-39 seed
    pub seed_hash: SeedHash,
    /// KDF salt
    pub salt: Vec<u8>,
    /// KDF parameters used when sealing
    pub kdf: KdfParams,
    /// Versioned ChaCha20-Poly1305 blob of the mnemonic entropy
    pub sealed_entropy: Vec<u8>,
    /// Unix timestamp (seconds) when the seed was sealed
    pub created_at: i64,
}

impl SealedSeed {
    /// Seal `entropy` under `passphrase`
    pub fn seal(
        seed_hash: SeedHash,
        entropy: &[u8],
        passphrase: &str,
        kdf: KdfParams,
    ) -> Result<Self> {
        let salt = generate_salt();
        let key = SealingKey::derive(passphrase, &salt, &kdf)?;
        let sealed_entropy = key.seal(entropy, seed_hash.as_str().as_bytes())?;
        Ok(Self {
            seed_hash,
            salt: salt.to_vec(),
            kdf,
            sealed_entropy,
            created_at: chrono::Utc::now().timestamp(),
        })
    }

    /// Recover the entropy with `passphrase`
    pub fn unseal(&self, passphrase: &str) -> Result<Zeroizing<Vec<u8>>> {
        let key = SealingKey::derive(passphrase, &self.salt, &self.kdf)?;
        key.open(&self.sealed_entropy, self.seed_hash.as_str().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash() -> SeedHash {
        SeedHash::from_hex(&"ab".repeat(32)).unwrap()
    }

    #[test]
    fn test_kdf_determinism() {
        let salt = [7u8; SALT_LEN];
        let k1 = SealingKey::derive("passphrase", &salt, &KdfParams::fast()).unwrap();
        let k2 = SealingKey::derive("passphrase", &salt, &KdfParams::fast()).unwrap();
        assert_eq!(*k1.key, *k2.key);
        assert!(k1.key.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_kdf_rejects_short_salt() {
        assert!(SealingKey::derive("p", &[0u8; 8], &KdfParams::fast()).is_err());
    }

    #[test]
    fn test_seal_open() {
        let key = SealingKey::derive("pw", &generate_salt(), &KdfParams::fast()).unwrap();
        let blob = key.seal(b"entropy bytes", b"aad").unwrap();
        assert_eq!(blob[0], SEAL_VERSION);
        assert_eq!(&key.open(&blob, b"aad").unwrap()[..], b"entropy bytes");
    }

    #[test]
    fn test_open_with_wrong_aad_fails() {
        let key = SealingKey::derive("pw", &generate_salt(), &KdfParams::fast()).unwrap();
        let blob = key.seal(b"entropy", b"seed-a").unwrap();
        assert!(matches!(key.open(&blob, b"seed-b"), Err(Error::InvalidPassphrase)));
    }

    #[test]
    fn test_open_rejects_unknown_version() {
        let key = SealingKey::derive("pw", &generate_salt(), &KdfParams::fast()).unwrap();
        let mut blob = key.seal(b"entropy", b"").unwrap();
        blob[0] = 9;
        assert!(matches!(key.open(&blob, b""), Err(Error::Encryption(_))));
        assert!(matches!(key.open(&[1, 1], b""), Err(Error::Encryption(_))));
    }

    #[test]
    fn test_sealed_seed_wrong_passphrase() {
        let sealed = SealedSeed::seal(hash(), &[42u8; 16], "right", KdfParams::fast()).unwrap();
        assert_eq!(&sealed.unseal("right").unwrap()[..], &[42u8; 16]);
        assert!(matches!(sealed.unseal("wrong"), Err(Error::InvalidPassphrase)));
    }

    #[test]
    fn test_sealed_seed_keeps_its_kdf_params() {
        let sealed = SealedSeed::seal(hash(), &[1u8; 32], "pw", KdfParams::fast()).unwrap();
        let json = serde_json::to_string(&sealed).unwrap();
        let restored: SealedSeed = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.kdf, KdfParams::fast());
        assert_eq!(&restored.unseal("pw").unwrap()[..], &[1u8; 32]);
    }
}
