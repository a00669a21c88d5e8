//! Envelope authentication with HMAC-SHA256.
//!
//! The MAC is computed over the base64 *text* of the IV and ciphertext, not
//! over the raw bytes, and is carried as lowercase hex.
//!
//! Verification never compares the claimed MAC with the recomputed one
//! directly. Both are first re-keyed under a fresh random salt and the two
//! raw digests are compared in constant time. Stored envelopes depend on the
//! first half of this scheme; the second half only affects the comparison.

use hmac::{digest::InvalidLength, Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use common::Envelope;

/// HMAC-SHA256, as used for both the envelope MAC and the verification salt.
pub type HmacSha256 = Hmac<Sha256>;

/// Byte length of the per-verification salt.
pub const SALT_LEN: usize = 16;

/// Compute `hex(HMAC-SHA256(key, iv_b64 || value_b64))`.
///
/// # Errors
///
/// Returns [`InvalidLength`] if HMAC rejects the key. HMAC accepts keys of
/// any length, so this only surfaces a broken primitive.
pub fn compute(key: &[u8], iv_b64: &str, value_b64: &str) -> Result<String, InvalidLength> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)?;
    mac.update(iv_b64.as_bytes());
    mac.update(value_b64.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check the MAC carried by `envelope` against `key`.
///
/// `salt` must be freshly generated for this call and never stored.
pub fn verify(key: &[u8], envelope: &Envelope, salt: &[u8; SALT_LEN]) -> bool {
    let Ok(inner) = compute(key, &envelope.iv, &envelope.value) else {
        return false;
    };
    let (Ok(candidate), Ok(expected)) = (
        salted(salt, envelope.mac.as_bytes()),
        salted(salt, inner.as_bytes()),
    ) else {
        return false;
    };
    candidate.as_slice().ct_eq(expected.as_slice()).into()
}

fn salted(salt: &[u8], message: &[u8]) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(salt)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}
