//! Source of cryptographically secure random bytes for IVs and MAC salts.

use rand::{rngs::OsRng, RngCore};

/// Fills buffers with unpredictable bytes.
///
/// Implementations must be non-blocking and safe to share across threads.
#[cfg_attr(test, mockall::automock)]
pub trait EntropySource: Send + Sync {
    /// Fill `dest` entirely, or fail without partially trusting its contents.
    fn fill(&self, dest: &mut [u8]) -> Result<(), rand::Error>;
}

/// The operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), rand::Error> {
        OsRng.try_fill_bytes(dest)
    }
}
