//! [`Encrypter`]: authenticated AES-CBC envelopes.
//!
//! # Envelope format
//!
//! ```text
//! base64( {"iv":"<base64 iv>","value":"<base64 ciphertext>","mac":"<hex hmac>"} )
//! ```
//!
//! `mac` is HMAC-SHA256 keyed with the encryption key over the concatenated
//! base64 text of `iv` and `value`. Decryption checks the MAC before the
//! ciphertext is touched.

use std::{fmt, sync::Arc};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use common::{CipherId, DecryptError, EncrypterError, Envelope};

use crate::crypto::{cipher, mac, EntropySource, OsEntropy, IV_LEN};
use crate::key::EncryptionKey;

/// Encrypts values into self-describing, tamper-evident envelopes and back.
///
/// Cheap to clone and safe to share between threads: all operations take
/// `&self` and the only state is the validated key/cipher pair.
#[derive(Clone)]
pub struct Encrypter {
    key: EncryptionKey,
    cipher: CipherId,
    entropy: Arc<dyn EntropySource>,
}

impl Encrypter {
    /// Build an encrypter for `cipher`.
    ///
    /// # Errors
    ///
    /// Returns [`EncrypterError::UnsupportedConfiguration`] if the key length
    /// is not the one `cipher` requires.
    pub fn new(key: impl Into<EncryptionKey>, cipher: CipherId) -> Result<Self, EncrypterError> {
        let key = key.into();
        ensure_supported(&key, cipher)?;
        Ok(Self {
            key,
            cipher,
            entropy: Arc::new(OsEntropy),
        })
    }

    /// Build an encrypter for a cipher given by name, e.g. `"AES-128-CBC"`.
    ///
    /// # Errors
    ///
    /// Returns [`EncrypterError::UnsupportedConfiguration`] for an unknown
    /// cipher name or a key of the wrong length.
    pub fn with_cipher_name(
        key: impl Into<EncryptionKey>,
        cipher: &str,
    ) -> Result<Self, EncrypterError> {
        Self::new(key, cipher.parse()?)
    }

    /// Replace the randomness used for IVs and MAC salts.
    pub fn with_entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = entropy;
        self
    }

    /// Whether `key` has the exact length `cipher` requires.
    pub fn supported(key: &[u8], cipher: CipherId) -> bool {
        key.len() == cipher.key_len()
    }

    pub fn key(&self) -> &EncryptionKey {
        &self.key
    }

    pub fn cipher(&self) -> CipherId {
        self.cipher
    }

    /// Replace the key, keeping the current cipher.
    ///
    /// # Errors
    ///
    /// Returns [`EncrypterError::UnsupportedConfiguration`] and leaves the
    /// encrypter unchanged if the key does not fit the current cipher.
    pub fn set_key(&mut self, key: impl Into<EncryptionKey>) -> Result<(), EncrypterError> {
        let key = key.into();
        ensure_supported(&key, self.cipher)?;
        self.key = key;
        Ok(())
    }

    /// Replace the cipher, keeping the current key.
    ///
    /// # Errors
    ///
    /// Returns [`EncrypterError::UnsupportedConfiguration`] and leaves the
    /// encrypter unchanged if the current key does not fit `cipher`.
    pub fn set_cipher(&mut self, cipher: CipherId) -> Result<(), EncrypterError> {
        ensure_supported(&self.key, cipher)?;
        self.cipher = cipher;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Encryption
    // -----------------------------------------------------------------------

    /// Serialise `value` as JSON and encrypt it.
    ///
    /// # Errors
    ///
    /// Returns [`EncrypterError::EncodingFailure`] if `value` cannot be
    /// serialised, and [`EncrypterError::EncryptionFailure`] if no IV can be
    /// generated or the cipher fails.
    pub fn encrypt<T>(&self, value: &T) -> Result<String, EncrypterError>
    where
        T: Serialize + ?Sized,
    {
        let serialized = serde_json::to_vec(value)
            .map(Zeroizing::new)
            .map_err(|e| EncrypterError::EncodingFailure(e.to_string()))?;
        self.encrypt_bytes(&serialized)
    }

    /// Encrypt text as-is, without serialisation.
    pub fn encrypt_string(&self, value: &str) -> Result<String, EncrypterError> {
        self.encrypt_bytes(value.as_bytes())
    }

    /// Encrypt raw bytes as-is, without serialisation.
    ///
    /// Every call draws a fresh IV.
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<String, EncrypterError> {
        let mut iv = [0u8; IV_LEN];
        self.entropy
            .fill(&mut iv)
            .map_err(|e| EncrypterError::EncryptionFailure(format!("could not generate IV: {e}")))?;

        let ciphertext = cipher::encrypt_cbc(self.cipher, self.key.as_bytes(), &iv, plaintext)
            .map_err(|e| EncrypterError::EncryptionFailure(e.to_string()))?;

        let iv = STANDARD.encode(iv);
        let value = STANDARD.encode(ciphertext);
        let mac = mac::compute(self.key.as_bytes(), &iv, &value)
            .map_err(|e| EncrypterError::EncryptionFailure(format!("could not compute MAC: {e}")))?;

        let json = serde_json::to_vec(&Envelope { iv, value, mac })
            .map_err(|e| EncrypterError::EncodingFailure(e.to_string()))?;

        debug!(cipher = %self.cipher, bytes = plaintext.len(), "payload encrypted");
        Ok(STANDARD.encode(json))
    }

    // -----------------------------------------------------------------------
    // Decryption
    // -----------------------------------------------------------------------

    /// Decrypt an envelope and deserialise the JSON plaintext into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`EncrypterError::Decrypt`] if the envelope is malformed, fails
    /// authentication, cannot be decrypted, or does not hold a `T`.
    pub fn decrypt<T: DeserializeOwned>(&self, payload: &str) -> Result<T, EncrypterError> {
        let plaintext = Zeroizing::new(self.decrypt_bytes(payload)?);
        serde_json::from_slice(&plaintext)
            .map_err(|e| self.reject(DecryptError::DeserializationFailure(e.to_string())))
    }

    /// Decrypt an envelope holding text, without deserialisation.
    ///
    /// # Errors
    ///
    /// As [`Encrypter::decrypt_bytes`], plus
    /// [`DecryptError::DeserializationFailure`] if the plaintext is not UTF-8.
    pub fn decrypt_string(&self, payload: &str) -> Result<String, EncrypterError> {
        let plaintext = self.decrypt_bytes(payload)?;
        String::from_utf8(plaintext).map_err(|_| {
            self.reject(DecryptError::DeserializationFailure(
                "decrypted data is not valid UTF-8".into(),
            ))
        })
    }

    /// Decrypt an envelope and return the raw plaintext bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EncrypterError::Decrypt`] wrapping:
    /// - [`DecryptError::InvalidPayload`] if the envelope is not base64 JSON
    ///   with string `iv`, `value` and `mac` fields;
    /// - [`DecryptError::InvalidMac`] if authentication fails;
    /// - [`DecryptError::DecryptionFailure`] if the cipher rejects the data.
    pub fn decrypt_bytes(&self, payload: &str) -> Result<Vec<u8>, EncrypterError> {
        let plaintext = self.open(payload).map_err(|e| self.reject(e))?;
        debug!(cipher = %self.cipher, bytes = plaintext.len(), "payload decrypted");
        Ok(plaintext)
    }

    fn open(&self, payload: &str) -> Result<Vec<u8>, DecryptError> {
        let envelope = parse_envelope(payload).ok_or(DecryptError::InvalidPayload)?;

        let mut salt = [0u8; mac::SALT_LEN];
        if self.entropy.fill(&mut salt).is_err() {
            return Err(DecryptError::InvalidMac);
        }
        if !mac::verify(self.key.as_bytes(), &envelope, &salt) {
            return Err(DecryptError::InvalidMac);
        }

        let iv = STANDARD
            .decode(&envelope.iv)
            .map_err(|_| DecryptError::DecryptionFailure)?;
        let ciphertext = STANDARD
            .decode(&envelope.value)
            .map_err(|_| DecryptError::DecryptionFailure)?;

        cipher::decrypt_cbc(self.cipher, self.key.as_bytes(), &iv, &ciphertext)
            .map_err(|_| DecryptError::DecryptionFailure)
    }

    fn reject(&self, err: DecryptError) -> EncrypterError {
        warn!(cipher = %self.cipher, error = %err, "envelope rejected");
        err.into()
    }
}

impl fmt::Debug for Encrypter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encrypter")
            .field("key", &self.key)
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}

/// Decode the outer base64 and JSON layers of an envelope.
fn parse_envelope(payload: &str) -> Option<Envelope> {
    let json = STANDARD.decode(payload).ok()?;
    serde_json::from_slice(&json).ok()
}

fn ensure_supported(key: &EncryptionKey, cipher: CipherId) -> Result<(), EncrypterError> {
    if Encrypter::supported(key.as_bytes(), cipher) {
        return Ok(());
    }
    Err(EncrypterError::UnsupportedConfiguration(format!(
        "{cipher} requires a {}-byte key, got {} bytes; the only supported ciphers are AES-128-CBC and AES-256-CBC",
        cipher.key_len(),
        key.len()
    )))
}
