//! Error types for the Storefront core library.

use storefront_crypto::CryptoError;
use thiserror::Error;

use crate::db::DatabaseError;

/// Result type alias using the Storefront `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Storefront operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller's access rule denied the operation.
    #[error("Access denied: {operation} on {collection}")]
    AccessDenied {
        collection: &'static str,
        operation: &'static str,
    },

    /// Input rejected before reaching storage.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A download token failed verification. Carries no detail on purpose.
    #[error("Invalid or expired download token")]
    InvalidDownloadToken,

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
