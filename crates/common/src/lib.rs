//! Common types, wire definitions, and errors shared across the envelope crates.

pub mod error;
pub mod protocol;

pub use error::{DecryptError, EncrypterError};
pub use protocol::{CipherId, Envelope};
