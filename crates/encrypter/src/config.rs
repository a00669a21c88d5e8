//! Configuration loading and validation for building an [`Encrypter`].
//!
//! Values are read from environment variables:
//!
//! | Variable     | Default       | Meaning |
//! |--------------|---------------|---------|
//! | `APP_KEY`    | (required)    | Raw key text, or `base64:<text>` |
//! | `APP_CIPHER` | `AES-256-CBC` | `AES-128-CBC` or `AES-256-CBC` |
//! | `LOG_LEVEL`  | `info`        | Tracing filter for binaries |

use std::fmt;

use anyhow::{Context, Result};
use config::builder::DefaultState;
use serde::Deserialize;

use common::{CipherId, EncrypterError};

use crate::encrypter::Encrypter;
use crate::key::EncryptionKey;

/// Validated encrypter configuration.
#[derive(Clone, Deserialize)]
pub struct EncrypterConfig {
    /// Encryption key as configured. **Required.**
    pub app_key: String,

    /// Cipher identifier.
    #[serde(default = "default_app_cipher")]
    pub app_cipher: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_app_cipher() -> String {
    CipherId::default().as_str().into()
}
fn default_log_level() -> String {
    "info".into()
}

impl EncrypterConfig {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `APP_KEY` is absent or empty, or `APP_CIPHER` is
    /// not a supported cipher.
    pub fn from_env() -> Result<Self> {
        Self::load(config::Config::builder().add_source(config::Environment::default()))
    }

    fn load(builder: config::ConfigBuilder<DefaultState>) -> Result<Self> {
        let cfg = builder
            .build()
            .context("failed to build encrypter configuration")?;

        let c: EncrypterConfig = cfg
            .try_deserialize()
            .context("failed to deserialise encrypter configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.app_key.trim().is_empty() {
            anyhow::bail!("APP_KEY is required and must not be empty");
        }
        self.cipher().context("APP_CIPHER is invalid")?;
        Ok(())
    }

    /// The configured cipher.
    ///
    /// # Errors
    ///
    /// Returns [`EncrypterError::UnsupportedConfiguration`] for an unknown name.
    pub fn cipher(&self) -> Result<CipherId, EncrypterError> {
        self.app_cipher.parse()
    }

    /// Decode the key and construct an [`Encrypter`].
    ///
    /// # Errors
    ///
    /// Returns [`EncrypterError::UnsupportedConfiguration`] if the key cannot
    /// be decoded or does not fit the cipher.
    pub fn build(&self) -> Result<Encrypter, EncrypterError> {
        let key = EncryptionKey::parse(&self.app_key)?;
        Encrypter::new(key, self.cipher()?)
    }
}

impl fmt::Debug for EncrypterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncrypterConfig")
            .field("app_key", &"[REDACTED]")
            .field("app_cipher", &self.app_cipher)
            .field("log_level", &self.log_level)
            .finish()
    }
}
