//! AES-CBC encryption and decryption of whole in-memory buffers.
//!
//! Both supported modes share the 16-byte AES block and PKCS#7 padding, which
//! is what OpenSSL applies by default. Key and IV lengths are checked here
//! again even though the encrypter validates them at construction.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use common::CipherId;
use thiserror::Error;

/// Byte length of a CBC initialisation vector (one AES block).
pub const IV_LEN: usize = 16;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// Key or IV length does not fit the selected mode.
    #[error("invalid key or IV length for {0}")]
    InvalidLength(CipherId),

    /// The ciphertext is not block-aligned or its padding is malformed.
    #[error("invalid ciphertext padding")]
    Padding,
}

/// Encrypt `plaintext` under `key` and `iv`, returning the padded ciphertext.
///
/// # Errors
///
/// Returns [`CipherError::InvalidLength`] if `key` or `iv` has the wrong size.
pub fn encrypt_cbc(
    cipher: CipherId,
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let invalid = |_| CipherError::InvalidLength(cipher);
    let ciphertext = match cipher {
        CipherId::Aes128Cbc => Aes128CbcEnc::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        CipherId::Aes256Cbc => Aes256CbcEnc::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    };
    Ok(ciphertext)
}

/// Decrypt `ciphertext` under `key` and `iv` and strip the padding.
///
/// # Errors
///
/// Returns [`CipherError::InvalidLength`] if `key` or `iv` has the wrong size.
/// Returns [`CipherError::Padding`] if the ciphertext is not a whole number of
/// blocks or does not end in valid PKCS#7 padding.
pub fn decrypt_cbc(
    cipher: CipherId,
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let invalid = |_| CipherError::InvalidLength(cipher);
    let plaintext = match cipher {
        CipherId::Aes128Cbc => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        CipherId::Aes256Cbc => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
    };
    plaintext.map_err(|_| CipherError::Padding)
}
