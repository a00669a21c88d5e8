//! Authenticated envelope encryption: AES-CBC for confidentiality,
//! HMAC-SHA256 for integrity, base64(JSON) on the wire.
//!
//! ```no_run
//! use encrypter::{CipherId, Encrypter};
//!
//! let enc = Encrypter::new([0u8; 32], CipherId::Aes256Cbc)?;
//! let envelope = enc.encrypt_string("hello")?;
//! assert_eq!(enc.decrypt_string(&envelope)?, "hello");
//! # Ok::<(), encrypter::EncrypterError>(())
//! ```
//!
//! # Telemetry invariants
//!
//! - No key material or plaintext appears in any log field. Rejected envelopes
//!   are logged at `warn` with the rejection reason only.

pub mod config;
pub mod crypto;
pub mod encrypter;
pub mod key;

pub use common::{CipherId, DecryptError, EncrypterError, Envelope};
pub use self::config::EncrypterConfig;
pub use crypto::{EntropySource, OsEntropy};
pub use encrypter::Encrypter;
pub use key::EncryptionKey;
