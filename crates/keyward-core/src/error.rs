//! Error types for Keyward Core
//!
//! Error taxonomy for seed vault, derivation, discovery, and issuance
//! operations. Discovery and issuance are all-or-nothing: any error below
//! aborts the call before anything is persisted.

use crate::records::KeyRole;
use std::fmt;

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Keyward Core errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Vault could not be initialised or its backing store is unreachable
    #[error("Vault unavailable: {0}")]
    VaultUnavailable(String),

    /// No seed is present in the vault (or the requested seed hash is unknown)
    #[error("No active seed: {0}")]
    NoActiveSeed(String),

    /// A seed already exists and creating another was requested
    #[error("Seed already exists: {0}")]
    SeedAlreadyExists(String),

    /// Passphrase did not unseal the stored seed
    #[error("Invalid passphrase")]
    InvalidPassphrase,

    /// Invalid mnemonic phrase or word count
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Malformed or out-of-range derivation path
    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    /// Key derivation error
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Sealing or unsealing error other than a wrong passphrase
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Invalid address format
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Raw ledger probe error (reported by a probe implementation)
    #[error("Ledger probe error: {0}")]
    Probe(String),

    /// Ledger probe failed while discovery was scanning an index
    #[error("Ledger probe failed for {role} index {index}: {reason}")]
    ProbeFailure {
        /// Role being discovered
        role: KeyRole,
        /// Derivation index being probed
        index: u32,
        /// Underlying probe error
        reason: String,
    },

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// No passphrase loaded in the session
    #[error("Keystore is locked")]
    Locked,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<keyward_params::Error> for Error {
    fn from(e: keyward_params::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl Error {
    /// Check if error is a user-facing error (vs internal error)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::NoActiveSeed(_)
                | Error::SeedAlreadyExists(_)
                | Error::InvalidPassphrase
                | Error::InvalidMnemonic(_)
                | Error::InvalidAddress(_)
                | Error::ProbeFailure { .. }
                | Error::Locked
        )
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Error::NoActiveSeed(_) => {
                "No wallet seed is stored yet. Create or restore a wallet first.".to_string()
            }
            Error::SeedAlreadyExists(_) => {
                "A wallet seed already exists. Clear it before creating a new one.".to_string()
            }
            Error::InvalidPassphrase => {
                "The passphrase is incorrect. Please check and try again.".to_string()
            }
            Error::InvalidMnemonic(_) => {
                "The recovery phrase is invalid. Please check and try again.".to_string()
            }
            Error::InvalidAddress(_) => {
                "The address is invalid. Please check and try again.".to_string()
            }
            Error::ProbeFailure { .. } => {
                "Unable to reach the ledger to check address usage. Please check your connection and try again.".to_string()
            }
            Error::Locked => "The wallet is locked. Enter your passphrase to continue.".to_string(),
            _ => self.to_string(),
        }
    }

    /// Get error category for logging/metrics
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::VaultUnavailable(_)
            | Error::NoActiveSeed(_)
            | Error::SeedAlreadyExists(_)
            | Error::InvalidMnemonic(_) => ErrorCategory::Vault,
            Error::InvalidPassphrase | Error::Encryption(_) | Error::Locked => {
                ErrorCategory::Security
            }
            Error::InvalidPath(_) | Error::KeyDerivation(_) => ErrorCategory::Keys,
            Error::InvalidAddress(_) => ErrorCategory::Address,
            Error::Probe(_) | Error::ProbeFailure { .. } => ErrorCategory::Network,
            Error::Storage(_) => ErrorCategory::Storage,
            Error::Config(_) => ErrorCategory::Config,
            Error::Io(_) | Error::Serialization(_) => ErrorCategory::Internal,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Seed vault errors
    Vault,
    /// Passphrase and sealing errors
    Security,
    /// Key derivation errors
    Keys,
    /// Address-related errors
    Address,
    /// Ledger probe errors
    Network,
    /// Storage-related errors
    Storage,
    /// Configuration errors
    Config,
    /// Internal/system errors
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Vault => write!(f, "Vault"),
            ErrorCategory::Security => write!(f, "Security"),
            ErrorCategory::Keys => write!(f, "Keys"),
            ErrorCategory::Address => write!(f, "Address"),
            ErrorCategory::Network => write!(f, "Network"),
            ErrorCategory::Storage => write!(f, "Storage"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_detection() {
        assert!(Error::InvalidPassphrase.is_user_error());
        assert!(Error::InvalidMnemonic("test".to_string()).is_user_error());
        assert!(!Error::Storage("test".to_string()).is_user_error());
        assert!(!Error::VaultUnavailable("test".to_string()).is_user_error());
    }

    #[test]
    fn test_user_messages() {
        let msg = Error::InvalidMnemonic("details".to_string()).user_message();
        assert!(msg.contains("recovery phrase is invalid"));

        let msg = Error::ProbeFailure {
            role: KeyRole::Asset,
            index: 3,
            reason: "timeout".to_string(),
        }
        .user_message();
        assert!(msg.contains("Unable to reach the ledger"));

        // Internal errors fall back to Display
        let msg = Error::Storage("disk full".to_string()).user_message();
        assert_eq!(msg, "Storage error: disk full");
    }

    #[test]
    fn test_probe_failure_display() {
        let err = Error::ProbeFailure {
            role: KeyRole::Platform,
            index: 7,
            reason: "connection reset".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Ledger probe failed for platform index 7: connection reset"
        );
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(Error::NoActiveSeed("x".to_string()).category(), ErrorCategory::Vault);
        assert_eq!(Error::InvalidPassphrase.category(), ErrorCategory::Security);
        assert_eq!(Error::Probe("x".to_string()).category(), ErrorCategory::Network);
        assert_eq!(Error::Storage("x".to_string()).category(), ErrorCategory::Storage);
        assert_eq!(Error::InvalidPath("x".to_string()).category(), ErrorCategory::Keys);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Vault.to_string(), "Vault");
        assert_eq!(ErrorCategory::Network.to_string(), "Network");
    }
}
