//! Wallet address encoding
//!
//! Addresses are never stored. They are re-derived from a [`KeyRecord`]
//! fingerprint and the target network:
//!
//! - platform: bech32m, `platform_hrp`, payload `[platform_type_tag] ++ fingerprint`
//! - asset: base58check, payload `[asset_version] ++ fingerprint`

use crate::records::{KeyFingerprint, KeyRecord, KeyRole, FINGERPRINT_LEN};
use crate::vault::PublicKeyBytes;
use crate::{Error, Result};
use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32m, Hrp};
use keyward_params::Network;
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// HASH160 (RIPEMD-160 of SHA-256) of a compressed public key
pub fn fingerprint(public_key: &PublicKeyBytes) -> KeyFingerprint {
    let sha = Sha256::digest(public_key);
    let hash = Ripemd160::digest(sha);
    let mut bytes = [0u8; FINGERPRINT_LEN];
    bytes.copy_from_slice(&hash);
    KeyFingerprint::from_bytes(bytes)
}

/// Encode a fingerprint as a `role` address on `network`
pub fn encode_address(fp: &KeyFingerprint, role: KeyRole, network: &Network) -> Result<String> {
    match role {
        KeyRole::Platform => {
            let hrp = Hrp::parse(network.platform_hrp)
                .map_err(|e| Error::InvalidAddress(format!("Bad HRP: {e}")))?;
            let mut payload = Vec::with_capacity(1 + FINGERPRINT_LEN);
            payload.push(network.platform_type_tag);
            payload.extend_from_slice(fp.as_bytes());
            bech32::encode::<Bech32m>(hrp, &payload)
                .map_err(|e| Error::InvalidAddress(e.to_string()))
        }
        KeyRole::Asset => {
            let mut payload = Vec::with_capacity(1 + FINGERPRINT_LEN);
            payload.push(network.asset_version);
            payload.extend_from_slice(fp.as_bytes());
            Ok(bs58::encode(payload).with_check().into_string())
        }
    }
}

/// Decode and validate a `role` address for `network`
pub fn decode_address(address: &str, role: KeyRole, network: &Network) -> Result<KeyFingerprint> {
    match role {
        KeyRole::Platform => {
            let checked = CheckedHrpstring::new::<Bech32m>(address)
                .map_err(|e| Error::InvalidAddress(e.to_string()))?;
            if !checked.hrp().as_str().eq_ignore_ascii_case(network.platform_hrp) {
                return Err(Error::InvalidAddress(format!(
                    "Expected {} address prefix, got {}",
                    network.platform_hrp,
                    checked.hrp()
                )));
            }
            let payload: Vec<u8> = checked.byte_iter().collect();
            match payload.split_first() {
                Some((&tag, fp)) if tag == network.platform_type_tag => {
                    KeyFingerprint::from_slice(fp)
                }
                Some((&tag, _)) => Err(Error::InvalidAddress(format!(
                    "Unexpected platform type tag 0x{tag:02x}"
                ))),
                None => Err(Error::InvalidAddress("Empty address payload".to_string())),
            }
        }
        KeyRole::Asset => {
            let payload = bs58::decode(address)
                .with_check(Some(network.asset_version))
                .into_vec()
                .map_err(|e| Error::InvalidAddress(e.to_string()))?;
            KeyFingerprint::from_slice(payload.get(1..).unwrap_or_default())
        }
    }
}

/// Generated display name, e.g. `platform-address 3`
pub fn display_name(role: KeyRole, index: u32) -> String {
    format!("{}-address {}", role.prefix(), index)
}

/// User-facing address, always re-derivable from its key record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAddress {
    /// Generated label
    pub display_name: String,
    /// Encoded address string
    pub address: String,
    /// Role the address belongs to
    pub role: KeyRole,
    /// Derivation index of the underlying key
    pub path_index: u32,
}

impl WalletAddress {
    /// Build the address for a stored record
    pub fn from_record(record: &KeyRecord, network: &Network) -> Result<Self> {
        Ok(Self {
            display_name: display_name(record.role, record.path_index),
            address: encode_address(&record.fingerprint, record.role, network)?,
            role: record.role,
            path_index: record.path_index,
        })
    }
}
