//! AES-CBC + HMAC-SHA256 primitives used by the [`Encrypter`](crate::Encrypter).
//!
//! This module is free of envelope encoding concerns; it only transforms
//! bytes and checks MACs.

pub mod cipher;
pub mod entropy;
pub mod mac;

pub use cipher::IV_LEN;
pub use entropy::{EntropySource, OsEntropy};
