//! Signed, time-limited download tokens.
//!
//! A token is `base64url(file_id ":" expires_at_ms ":" hex(hmac))` where the
//! HMAC-SHA256 covers `file_id ":" expires_at_ms`. Tokens carry everything
//! needed to check them, so nothing is stored server-side.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: char = ':';

/// URL-safe alphabet, unpadded on encode, padding optional on decode.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The claims carried by a valid download token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadGrant {
    /// Identifier of the digital file the bearer may fetch.
    pub file_id: String,
    /// Expiry as Unix milliseconds. The token is valid up to and including this instant.
    pub expires_at: i64,
}

impl DownloadGrant {
    pub const fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }
}

/// Issues and verifies download tokens with a server-held secret.
pub struct DownloadTokenSigner {
    secret: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for DownloadTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadTokenSigner")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl DownloadTokenSigner {
    /// Create a signer. The secret must not be empty.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, CryptoError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(CryptoError::EmptySecret);
        }
        Ok(Self {
            secret: Zeroizing::new(secret.to_vec()),
        })
    }

    /// Issue a token for `file_id` that expires `ttl` from now.
    pub fn issue(&self, file_id: &str, ttl: Duration) -> Result<String, CryptoError> {
        self.issue_at(file_id, ttl, now_millis())
    }

    /// Issue a token as if the current time were `now_ms`.
    pub fn issue_at(&self, file_id: &str, ttl: Duration, now_ms: i64) -> Result<String, CryptoError> {
        validate_file_id(file_id)?;
        if ttl.is_zero() {
            return Err(CryptoError::InvalidTtl);
        }
        let expires_at = i64::try_from(ttl.as_millis())
            .ok()
            .and_then(|ttl_ms| now_ms.checked_add(ttl_ms))
            .ok_or(CryptoError::ExpiryOverflow)?;

        let payload = format!("{file_id}{SEPARATOR}{expires_at}");
        let signature = self.sign(&payload)?;
        Ok(TOKEN_ENGINE.encode(format!("{payload}{SEPARATOR}{signature}")))
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Option<DownloadGrant> {
        self.verify_at(token, now_millis())
    }

    /// Verify a token as if the current time were `now_ms`.
    ///
    /// Returns `None` for every kind of failure: bad encoding, wrong shape,
    /// signature mismatch, non-numeric expiry, or expiry in the past.
    pub fn verify_at(&self, token: &str, now_ms: i64) -> Option<DownloadGrant> {
        let decoded = TOKEN_ENGINE.decode(token.as_bytes()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;

        let mut parts = decoded.split(SEPARATOR);
        let file_id = parts.next()?;
        let expires_at_raw = parts.next()?;
        let signature = parts.next()?;
        if parts.next().is_some()
            || file_id.is_empty()
            || expires_at_raw.is_empty()
            || signature.is_empty()
        {
            return None;
        }

        let expected = self
            .sign(&format!("{file_id}{SEPARATOR}{expires_at_raw}"))
            .ok()?;
        if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            return None;
        }

        let expires_at: i64 = expires_at_raw.parse().ok()?;
        let grant = DownloadGrant {
            file_id: file_id.to_string(),
            expires_at,
        };
        if grant.is_expired_at(now_ms) {
            return None;
        }
        Some(grant)
    }

    /// Lowercase hex HMAC-SHA256 of `payload`.
    fn sign(&self, payload: &str) -> Result<String, CryptoError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Issue a token for `file_id` valid for `ttl_secs` seconds.
pub fn sign_download_token(file_id: &str, secret: &str, ttl_secs: u64) -> Result<String, CryptoError> {
    DownloadTokenSigner::new(secret)?.issue(file_id, Duration::from_secs(ttl_secs))
}

/// Verify a token issued with `secret`. `None` means invalid.
pub fn verify_download_token(token: &str, secret: &str) -> Option<DownloadGrant> {
    DownloadTokenSigner::new(secret).ok()?.verify(token)
}

fn validate_file_id(file_id: &str) -> Result<(), CryptoError> {
    if file_id.is_empty() {
        return Err(CryptoError::InvalidFileId("file id is empty".to_string()));
    }
    if file_id.contains(SEPARATOR) {
        return Err(CryptoError::InvalidFileId(format!(
            "'{file_id}' contains the '{SEPARATOR}' separator"
        )));
    }
    Ok(())
}

/// Current wall-clock time as Unix milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}
