//! Error types shared across crates.

use thiserror::Error;

/// Top-level error type for every encrypter operation.
///
/// Variants fall into three groups:
/// - [`EncrypterError::UnsupportedConfiguration`]: the key/cipher pair is invalid.
/// - [`EncrypterError::EncryptionFailure`] / [`EncrypterError::EncodingFailure`]: the
///   encrypt path failed.
/// - [`EncrypterError::Decrypt`]: the envelope cannot be decrypted, for any reason.
#[derive(Debug, Error)]
pub enum EncrypterError {
    /// The key length does not match the cipher, or the cipher is unknown.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// The cipher or the entropy source failed while encrypting.
    #[error("could not encrypt the data: {0}")]
    EncryptionFailure(String),

    /// The value or the envelope could not be serialised.
    #[error("could not encode the payload: {0}")]
    EncodingFailure(String),

    /// The envelope was rejected.
    #[error(transparent)]
    Decrypt(#[from] DecryptError),
}

impl EncrypterError {
    /// Returns `true` for every variant of the "cannot decrypt" category.
    pub fn is_decrypt(&self) -> bool {
        matches!(self, EncrypterError::Decrypt(_))
    }

    /// Returns the inner [`DecryptError`] when this is a decrypt-path failure.
    pub fn as_decrypt(&self) -> Option<&DecryptError> {
        match self {
            EncrypterError::Decrypt(e) => Some(e),
            _ => None,
        }
    }
}

/// Reasons an envelope is rejected by `decrypt`.
///
/// Messages are safe to log; none of them carries key or plaintext material.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecryptError {
    /// Not base64, not JSON, or missing `iv` / `value` / `mac`.
    #[error("the payload is invalid")]
    InvalidPayload,

    /// The MAC does not authenticate the IV and ciphertext.
    #[error("the MAC is invalid")]
    InvalidMac,

    /// The cipher rejected the IV or ciphertext (bad encoding, length, or padding).
    #[error("could not decrypt the data")]
    DecryptionFailure,

    /// The plaintext is not a valid serialised value of the requested type.
    #[error("could not deserialise the decrypted data: {0}")]
    DeserializationFailure(String),
}
