//! Wallet view state
//!
//! Front ends dispatch [`WalletCommand`]s and render the [`WalletState`]
//! returned by [`reduce`]. The reducer is pure; the keystore never touches
//! this state.

use crate::address::WalletAddress;
use crate::records::KeyRole;
use serde::{Deserialize, Serialize};

/// Commands emitted by keystore operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WalletCommand {
    /// A restore run began
    RestoreStarted,
    /// Discovery finished for one role
    AddressesRestored {
        /// Role discovered
        role: KeyRole,
        /// Discovered addresses, replacing any previous ones for the role
        addresses: Vec<WalletAddress>,
    },
    /// A new address was issued
    AddressIssued(WalletAddress),
    /// A restore run failed
    RestoreFailed(String),
    /// Wallet was cleared
    Cleared,
}

/// Renderable wallet state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletState {
    /// Platform addresses in path order
    pub platform: Vec<WalletAddress>,
    /// Asset addresses in path order
    pub asset: Vec<WalletAddress>,
    /// A restore is in progress
    pub restoring: bool,
    /// Roles a running restore has not reported yet
    pub pending_roles: Vec<KeyRole>,
    /// Last restore error
    pub error: Option<String>,
}

impl WalletState {
    /// Addresses held for `role`
    pub fn addresses(&self, role: KeyRole) -> &[WalletAddress] {
        match role {
            KeyRole::Platform => &self.platform,
            KeyRole::Asset => &self.asset,
        }
    }

    fn addresses_mut(&mut self, role: KeyRole) -> &mut Vec<WalletAddress> {
        match role {
            KeyRole::Platform => &mut self.platform,
            KeyRole::Asset => &mut self.asset,
        }
    }
}

/// Apply `command` to `state`
pub fn reduce(state: &WalletState, command: WalletCommand) -> WalletState {
    let mut next = state.clone();
    match command {
        WalletCommand::RestoreStarted => {
            next.restoring = true;
            next.pending_roles = KeyRole::ALL.to_vec();
            next.error = None;
        }
        WalletCommand::AddressesRestored { role, addresses } => {
            *next.addresses_mut(role) = addresses;
            next.pending_roles.retain(|r| *r != role);
            if next.pending_roles.is_empty() {
                next.restoring = false;
            }
        }
        WalletCommand::AddressIssued(address) => {
            let list = next.addresses_mut(address.role);
            // Keep path order; ignore a duplicate of an index already shown
            match list.binary_search_by_key(&address.path_index, |a| a.path_index) {
                Ok(_) => {}
                Err(pos) => list.insert(pos, address),
            }
        }
        WalletCommand::RestoreFailed(message) => {
            next.restoring = false;
            next.pending_roles.clear();
            next.error = Some(message);
        }
        WalletCommand::Cleared => return WalletState::default(),
    }
    next
}
