//! Random identifiers for license keys and record numbers.

use rand::Rng;
use rand::rngs::OsRng;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random part of a license key.
pub const LICENSE_KEY_LEN: usize = 8;

/// `len` lowercase base36 characters drawn from the OS RNG.
pub fn random_base36(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect()
}

/// A fresh license key of the form `LIC-XXXXXXXX` (uppercase base36).
pub fn generate_license_key() -> String {
    format!("LIC-{}", random_base36(LICENSE_KEY_LEN).to_ascii_uppercase())
}

/// Check the `LIC-XXXXXXXX` shape without consulting any store.
pub fn is_license_key(candidate: &str) -> bool {
    candidate.strip_prefix("LIC-").is_some_and(|rest| {
        rest.len() == LICENSE_KEY_LEN
            && rest
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
    })
}
