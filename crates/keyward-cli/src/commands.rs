//! Command implementations, each returning the JSON printed by `main`

use keyward_core::{reduce, KeyRole, Keystore, WalletCommand, WalletState};
use serde_json::{json, Value};

pub async fn create(keystore: &Keystore, passphrase: &str, words: usize) -> anyhow::Result<Value> {
    let seed_hash = keystore.create_wallet(passphrase, words).await?;
    Ok(json!({ "seed_hash": seed_hash }))
}

pub async fn export_mnemonic(keystore: &Keystore, passphrase: &str) -> anyhow::Result<Value> {
    let phrase = keystore.export_mnemonic(passphrase).await?;
    Ok(json!({ "mnemonic": phrase.as_str() }))
}

pub async fn restore(keystore: &Keystore, phrase: &str, passphrase: &str) -> anyhow::Result<Value> {
    let state = reduce(&WalletState::default(), WalletCommand::RestoreStarted);
    match keystore.restore_wallet(phrase.trim(), passphrase).await {
        Ok(restored) => {
            let state = reduce(
                &state,
                WalletCommand::AddressesRestored {
                    role: KeyRole::Platform,
                    addresses: restored.platform,
                },
            );
            let state = reduce(
                &state,
                WalletCommand::AddressesRestored {
                    role: KeyRole::Asset,
                    addresses: restored.asset,
                },
            );
            Ok(json!({ "seed_hash": restored.seed_hash, "wallet": state }))
        }
        Err(e) => {
            let state = reduce(&state, WalletCommand::RestoreFailed(e.user_message()));
            tracing::warn!("Restore failed ({}): {}", e.category(), e);
            Err(anyhow::Error::new(e).context(state.error.unwrap_or_default()))
        }
    }
}

pub async fn discover(keystore: &Keystore, role: KeyRole, passphrase: &str) -> anyhow::Result<Value> {
    let addresses = keystore.discover(role, passphrase).await?;
    Ok(serde_json::to_value(addresses)?)
}

pub async fn issue(keystore: &Keystore, role: KeyRole, passphrase: &str) -> anyhow::Result<Value> {
    let address = keystore.issue_next(role, passphrase).await?;
    Ok(serde_json::to_value(address)?)
}

pub fn list(keystore: &Keystore, role: Option<KeyRole>) -> anyhow::Result<Value> {
    if let Some(role) = role {
        return Ok(serde_json::to_value(keystore.addresses(role)?)?);
    }
    let mut state = WalletState::default();
    for role in KeyRole::ALL {
        state = reduce(
            &state,
            WalletCommand::AddressesRestored {
                role,
                addresses: keystore.addresses(role)?,
            },
        );
    }
    Ok(serde_json::to_value(state)?)
}

pub async fn clear(keystore: &Keystore) -> anyhow::Result<Value> {
    keystore.clear().await?;
    Ok(json!({ "cleared": true }))
}
