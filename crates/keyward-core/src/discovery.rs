//! Address discovery
//!
//! Rebuilds the used part of a role's address space from the seed alone.
//! Every index in [`scan_indices`] is derived and probed in order; the
//! result is truncated just after the last index with ledger activity.
//! Unused indices below that point stay in the result, so gaps survive a
//! restore.

use crate::address::{fingerprint, WalletAddress};
use crate::paths::{path_for, scan_indices};
use crate::probe::{has_activity, LedgerProbe};
use crate::records::{KeyRecord, KeyRole};
use crate::store::KeyIndexStore;
use crate::vault::{SeedHash, SeedVault};
use crate::{Error, Result};
use keyward_params::Network;

/// Accumulates candidates during one discovery run
#[derive(Debug, Default)]
pub struct DiscoveryScan {
    records: Vec<KeyRecord>,
    addresses: Vec<WalletAddress>,
    last_used: Option<u32>,
}

impl DiscoveryScan {
    /// Empty scan
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a candidate; `used` marks ledger activity at its index
    pub fn record(&mut self, record: KeyRecord, address: WalletAddress, used: bool) {
        if used {
            self.last_used = Some(record.path_index);
        }
        self.records.push(record);
        self.addresses.push(address);
    }

    /// Highest index with activity so far
    pub fn last_used(&self) -> Option<u32> {
        self.last_used
    }

    /// Truncate to `[0, last_used]`; empty when nothing was used
    pub fn finish(self) -> (Vec<KeyRecord>, Vec<WalletAddress>) {
        let Some(last) = self.last_used else {
            return (Vec::new(), Vec::new());
        };
        let keep = self
            .records
            .iter()
            .position(|r| r.path_index == last)
            .map_or(0, |pos| pos + 1);

        let mut records = self.records;
        let mut addresses = self.addresses;
        records.truncate(keep);
        addresses.truncate(keep);
        (records, addresses)
    }
}

/// Scan the address space of `role` without touching the key index
///
/// Returns the records to persist and their addresses. A probe failure at
/// any index aborts the scan with [`Error::ProbeFailure`].
pub async fn scan<V, P>(
    vault: &V,
    probe: &P,
    seed_hash: &SeedHash,
    role: KeyRole,
    network: &Network,
    passphrase: &str,
) -> Result<(Vec<KeyRecord>, Vec<WalletAddress>)>
where
    V: SeedVault + ?Sized,
    P: LedgerProbe + ?Sized,
{
    tracing::info!("Discovering {} addresses on {}", role, network.name);
    let mut scan = DiscoveryScan::new();

    for index in scan_indices() {
        let public_key = vault
            .derive_public_key(seed_hash, &path_for(role, index), passphrase)
            .await?;
        let record = KeyRecord::new(role, index, fingerprint(&public_key));
        let address = WalletAddress::from_record(&record, network)?;

        let used = match has_activity(probe, role, &address.address, network).await {
            Ok(used) => used,
            Err(e) => {
                tracing::warn!("Probe failed for {} index {}: {}", role, index, e);
                return Err(Error::ProbeFailure {
                    role,
                    index,
                    reason: e.to_string(),
                });
            }
        };
        tracing::debug!("{} index {} used={}", role, index, used);
        scan.record(record, address, used);
    }

    match scan.last_used() {
        Some(last) => tracing::info!("Last used {} index is {}", role, last),
        None => tracing::info!("No {} address activity found", role),
    }
    Ok(scan.finish())
}

/// Discover the used addresses of `role` and overwrite its key index
///
/// The key index is only written after the whole scan succeeds; on any
/// failure it is left untouched.
pub async fn discover<V, S, P>(
    vault: &V,
    store: &S,
    probe: &P,
    seed_hash: &SeedHash,
    role: KeyRole,
    network: &Network,
    passphrase: &str,
) -> Result<Vec<WalletAddress>>
where
    V: SeedVault + ?Sized,
    S: KeyIndexStore + ?Sized,
    P: LedgerProbe + ?Sized,
{
    let (records, addresses) = scan(vault, probe, seed_hash, role, network, passphrase).await?;
    store.save_keys(role, &records)?;
    tracing::info!("Restored {} {} addresses", addresses.len(), role);
    Ok(addresses)
}
