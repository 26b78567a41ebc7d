//! Address issuance
//!
//! Allocates one address past the highest stored index without consulting
//! the ledger.

use crate::address::{fingerprint, WalletAddress};
use crate::config::IssuanceConfig;
use crate::paths::{path_for, MAX_PATH_INDEX};
use crate::records::{KeyRecord, KeyRole};
use crate::store::KeyIndexStore;
use crate::vault::{SeedHash, SeedVault};
use crate::{Error, Result};
use keyward_params::Network;

/// Index the next issued key will use, given the stored index
pub fn next_index(records: &[KeyRecord], config: &IssuanceConfig) -> Result<u32> {
    let next = match records.iter().map(|r| r.path_index).max() {
        Some(last) => last.checked_add(1),
        None if config.legacy_first_index => Some(1),
        None => Some(0),
    };
    next.filter(|i| *i <= MAX_PATH_INDEX).ok_or_else(|| {
        Error::KeyDerivation("Address index space exhausted".to_string())
    })
}

/// Derive and store the next address of `role`
///
/// The new record is appended to the stored index; if the write fails the
/// error is returned and no address is handed out.
pub async fn issue_next<V, S>(
    vault: &V,
    store: &S,
    seed_hash: &SeedHash,
    role: KeyRole,
    network: &Network,
    passphrase: &str,
    config: &IssuanceConfig,
) -> Result<WalletAddress>
where
    V: SeedVault + ?Sized,
    S: KeyIndexStore + ?Sized,
{
    let mut records = store.load_keys(role)?;
    let index = next_index(&records, config)?;

    let public_key = vault
        .derive_public_key(seed_hash, &path_for(role, index), passphrase)
        .await?;
    let record = KeyRecord::new(role, index, fingerprint(&public_key));
    let address = WalletAddress::from_record(&record, network)?;

    records.push(record);
    store.save_keys(role, &records)?;

    tracing::info!("Issued {} address at index {}", role, index);
    Ok(address)
}
