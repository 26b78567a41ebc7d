//! Ledger probe capability
//!
//! Read-only usage queries against a remote ledger, injected into
//! discovery. A platform address counts as used once its account nonce is
//! non-zero; an asset address counts as used while it owns any unspent
//! output.

use crate::records::KeyRole;
use crate::Result;
use async_trait::async_trait;
use keyward_params::Network;
use serde::{Deserialize, Serialize};

/// Account-model state of a platform address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Number of transactions sent from the account
    pub nonce: u64,
}

/// Unspent transaction output held by an asset address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    /// Transaction id (hex)
    pub txid: String,
    /// Output position within the transaction
    pub vout: u32,
    /// Amount in base units
    pub value: u64,
}

/// Remote ledger queries used for address discovery
#[async_trait]
pub trait LedgerProbe: Send + Sync {
    /// Account state of a platform address
    async fn account_state(&self, address: &str, network: &Network) -> Result<AccountState>;

    /// Unspent outputs of an asset address
    async fn unspent_outputs(&self, address: &str, network: &Network)
        -> Result<Vec<UnspentOutput>>;
}

/// Whether `address` shows usage evidence for `role`
pub async fn has_activity<P: LedgerProbe + ?Sized>(
    probe: &P,
    role: KeyRole,
    address: &str,
    network: &Network,
) -> Result<bool> {
    match role {
        KeyRole::Platform => Ok(probe.account_state(address, network).await?.nonce != 0),
        KeyRole::Asset => Ok(!probe.unspent_outputs(address, network).await?.is_empty()),
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use memory::MemoryLedger;

#[cfg(any(test, feature = "test-helpers"))]
mod memory {
    use super::*;
    use crate::Error;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};

    /// Scripted in-memory ledger
    #[derive(Default)]
    pub struct MemoryLedger {
        nonces: Mutex<HashMap<String, u64>>,
        outputs: Mutex<HashMap<String, Vec<UnspentOutput>>>,
        failing: Mutex<HashSet<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl MemoryLedger {
        /// Empty ledger; every address is unused
        pub fn new() -> Self {
            Self::default()
        }

        /// Give a platform address a nonce
        pub fn set_nonce(&self, address: impl Into<String>, nonce: u64) {
            self.nonces.lock().insert(address.into(), nonce);
        }

        /// Give an asset address one unspent output of `value`
        pub fn add_output(&self, address: impl Into<String>, value: u64) {
            let address = address.into();
            let mut outputs = self.outputs.lock();
            let entry = outputs.entry(address).or_default();
            let n = entry.len();
            entry.push(UnspentOutput {
                txid: format!("{:064x}", n + 1),
                vout: n as u32,
                value,
            });
        }

        /// Make every query for `address` fail
        pub fn fail_on(&self, address: impl Into<String>) {
            self.failing.lock().insert(address.into());
        }

        /// Addresses queried so far, in order
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn record(&self, address: &str) -> Result<()> {
            self.calls.lock().push(address.to_string());
            if self.failing.lock().contains(address) {
                return Err(Error::Probe(format!("scripted failure for {address}")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl LedgerProbe for MemoryLedger {
        async fn account_state(&self, address: &str, _network: &Network) -> Result<AccountState> {
            self.record(address)?;
            let nonce = self.nonces.lock().get(address).copied().unwrap_or(0);
            Ok(AccountState { nonce })
        }

        async fn unspent_outputs(
            &self,
            address: &str,
            _network: &Network,
        ) -> Result<Vec<UnspentOutput>> {
            self.record(address)?;
            Ok(self.outputs.lock().get(address).cloned().unwrap_or_default())
        }
    }
}
