//! Derived key records
//!
//! A [`KeyRecord`] is the only thing the keystore persists per derived key:
//! the role, the derivation index, and a 20-byte fingerprint of the public
//! key. Addresses are always re-derived from the fingerprint.

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Logical key role; each role has its own derivation path template and key index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    /// Platform account keys (account-model addresses)
    Platform,
    /// Asset transfer keys (UTXO-model addresses)
    Asset,
}

impl KeyRole {
    /// Both roles, platform first.
    pub const ALL: [KeyRole; 2] = [KeyRole::Platform, KeyRole::Asset];

    /// Prefix used in display names and storage keys
    pub const fn prefix(&self) -> &'static str {
        match self {
            KeyRole::Platform => "platform",
            KeyRole::Asset => "asset",
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for KeyRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "platform" => Ok(KeyRole::Platform),
            "asset" => Ok(KeyRole::Asset),
            other => Err(Error::Config(format!("Unknown key role: {other}"))),
        }
    }
}

/// Length of a key fingerprint in bytes
pub const FINGERPRINT_LEN: usize = 20;

/// HASH160 of a derived public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyFingerprint([u8; FINGERPRINT_LEN]);

impl KeyFingerprint {
    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking its length
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; FINGERPRINT_LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidAddress(format!(
                "Fingerprint must be {} bytes, got {}",
                FINGERPRINT_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Lowercase hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let bytes = hex::decode(encoded)
            .map_err(|e| Error::InvalidAddress(format!("Invalid fingerprint hex: {e}")))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyFingerprint({})", self.to_hex())
    }
}

impl fmt::Display for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for KeyFingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for KeyFingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        KeyFingerprint::from_hex(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Derived key record, owned by the key index store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Role the key was derived for
    pub role: KeyRole,
    /// Trailing derivation path index
    pub path_index: u32,
    /// HASH160 of the derived public key
    pub fingerprint: KeyFingerprint,
}

impl KeyRecord {
    /// Create new record
    pub fn new(role: KeyRole, path_index: u32, fingerprint: KeyFingerprint) -> Self {
        Self {
            role,
            path_index,
            fingerprint,
        }
    }
}
