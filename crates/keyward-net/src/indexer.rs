//! HTTP indexer client implementing [`LedgerProbe`]
//!
//! Endpoints, relative to the configured base URL:
//!
//! ```text
//! GET {base}/{network}/accounts/{address}        -> {"nonce": u64}
//! GET {base}/{network}/addresses/{address}/utxos -> [{"txid", "vout", "value"}]
//! ```
//!
//! A 404 means the indexer has never seen the address.

use crate::{Error, Result};
use async_trait::async_trait;
use keyward_core::{AccountState, IndexerConfig, LedgerProbe, Network, UnspentOutput};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Ledger probe backed by an HTTP indexer
pub struct HttpLedgerProbe {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLedgerProbe {
    /// Create client from indexer configuration
    pub fn new(config: &IndexerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// URL of the account resource for `address`
    pub fn account_url(&self, address: &str, network: &Network) -> String {
        format!("{}/{}/accounts/{}", self.base_url, network.name, address)
    }

    /// URL of the unspent output list for `address`
    pub fn utxos_url(&self, address: &str, network: &Network) -> String {
        format!("{}/{}/addresses/{}/utxos", self.base_url, network.name, address)
    }

    /// GET `url` as JSON; `None` when the indexer answers 404
    async fn get_json<R: DeserializeOwned>(&self, url: &str) -> Result<Option<R>> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        let value = serde_json::from_slice(&body)
            .map_err(|e| Error::Decode(format!("{url}: {e}")))?;
        Ok(Some(value))
    }
}

#[async_trait]
impl LedgerProbe for HttpLedgerProbe {
    async fn account_state(
        &self,
        address: &str,
        network: &Network,
    ) -> keyward_core::Result<AccountState> {
        let url = self.account_url(address, network);
        Ok(self.get_json(&url).await?.unwrap_or_default())
    }

    async fn unspent_outputs(
        &self,
        address: &str,
        network: &Network,
    ) -> keyward_core::Result<Vec<UnspentOutput>> {
        let url = self.utxos_url(address, network);
        Ok(self.get_json(&url).await?.unwrap_or_default())
    }
}
