//! `Storefront` Crypto Library
//!
//! Capability tokens and identifiers for the commerce back office.
//!
//! ## Primitives
//!
//! - **Download tokens**: `base64url(file_id:expires_at_ms:hex(HMAC-SHA256))`,
//!   verified statelessly with a constant-time signature comparison
//! - **Identifiers**: OS-RNG base36 strings for license keys and order numbers

pub mod download_token;
pub mod error;
pub mod keys;

pub use download_token::{
    DownloadGrant, DownloadTokenSigner, now_millis, sign_download_token, verify_download_token,
};
pub use error::CryptoError;
pub use keys::{generate_license_key, is_license_key, random_base36};
