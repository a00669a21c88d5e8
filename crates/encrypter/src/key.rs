//! [`EncryptionKey`]: owned secret key bytes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::{Zeroize, ZeroizeOnDrop};

use common::EncrypterError;

/// Prefix marking a configured key as base64 text rather than raw bytes.
pub const BASE64_PREFIX: &str = "base64:";

/// Raw secret key material.
///
/// The bytes are overwritten with zeroes when the key is dropped and are
/// never printed, not even by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey(Vec<u8>);

impl EncryptionKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse a key as it appears in configuration.
    ///
    /// `base64:<text>` is base64-decoded; anything else is taken as the raw
    /// UTF-8 bytes of the string.
    ///
    /// # Errors
    ///
    /// Returns [`EncrypterError::UnsupportedConfiguration`] if the text after
    /// the prefix is not valid base64.
    pub fn parse(text: &str) -> Result<Self, EncrypterError> {
        match text.strip_prefix(BASE64_PREFIX) {
            Some(encoded) => STANDARD.decode(encoded).map(Self).map_err(|_| {
                EncrypterError::UnsupportedConfiguration(
                    "key has a base64: prefix but is not valid base64".into(),
                )
            }),
            None => Ok(Self::new(text.as_bytes())),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for EncryptionKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for EncryptionKey {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl<const N: usize> From<[u8; N]> for EncryptionKey {
    fn from(bytes: [u8; N]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("EncryptionKey([REDACTED])")
    }
}
