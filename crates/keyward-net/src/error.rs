//! Error types

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection error (DNS, connect, timeout)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Indexer answered with an unexpected HTTP status
    #[error("HTTP {status} from {url}")]
    Status {
        /// Status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Client could not be configured
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for keyward_core::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Config(msg) => keyward_core::Error::Config(msg),
            other => keyward_core::Error::Probe(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Decode(e.to_string())
        } else {
            Error::Connection(e.to_string())
        }
    }
}
