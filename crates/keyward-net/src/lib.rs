//! Network access for Keyward
//!
//! HTTP client for the ledger indexer that discovery probes for address
//! usage.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod indexer;

pub use error::{Error, Result};
pub use indexer::HttpLedgerProbe;
