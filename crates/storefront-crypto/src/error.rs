//! Crypto error types.

/// Errors from issuing tokens.
///
/// Verification never produces one of these: a token that fails to verify
/// is reported as `None` without a cause.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Signing secret must not be empty")]
    EmptySecret,

    #[error("Invalid file id: {0}")]
    InvalidFileId(String),

    #[error("Token TTL must be positive")]
    InvalidTtl,

    #[error("Token expiry overflows the millisecond clock")]
    ExpiryOverflow,

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}
