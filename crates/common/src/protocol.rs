//! Wire types for the encrypted envelope.
//!
//! An envelope is `base64(JSON{"iv", "value", "mac"})`. This module holds the
//! JSON layer and the cipher identifiers; the base64 layer lives with the
//! encrypter.

use std::{fmt, str::FromStr};

use serde::{
    de::{self, IgnoredAny, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};

use crate::error::EncrypterError;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The JSON object carried inside every envelope.
///
/// Field order is `iv`, `value`, `mac` on output so that freshly produced
/// envelopes look like the ones already in storage. On input only a JSON
/// object is accepted; unknown keys are ignored and a repeated key keeps its
/// last value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    /// Base64 of the 16-byte IV.
    pub iv: String,
    /// Base64 of the ciphertext.
    pub value: String,
    /// Lowercase hex HMAC-SHA256 over `iv || value`.
    pub mac: String,
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Only `visit_map` is implemented: a positional `[iv, value, mac]`
        // array is not an envelope.
        deserializer.deserialize_map(EnvelopeVisitor)
    }
}

struct EnvelopeVisitor;

impl<'de> Visitor<'de> for EnvelopeVisitor {
    type Value = Envelope;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object with string iv, value and mac fields")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Envelope, A::Error> {
        let (mut iv, mut value, mut mac) = (None, None, None);
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "iv" => iv = Some(map.next_value::<String>()?),
                "value" => value = Some(map.next_value::<String>()?),
                "mac" => mac = Some(map.next_value::<String>()?),
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(Envelope {
            iv: iv.ok_or_else(|| <A::Error as de::Error>::missing_field("iv"))?,
            value: value.ok_or_else(|| <A::Error as de::Error>::missing_field("value"))?,
            mac: mac.ok_or_else(|| <A::Error as de::Error>::missing_field("mac"))?,
        })
    }
}

// ---------------------------------------------------------------------------
// Cipher identifiers
// ---------------------------------------------------------------------------

/// Block-cipher modes an encrypter can be built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CipherId {
    /// AES with a 128-bit key in CBC mode.
    #[serde(rename = "AES-128-CBC")]
    Aes128Cbc,
    /// AES with a 256-bit key in CBC mode.
    #[default]
    #[serde(rename = "AES-256-CBC")]
    Aes256Cbc,
}

impl CipherId {
    /// Every supported cipher, in ascending key size.
    pub const ALL: [CipherId; 2] = [CipherId::Aes128Cbc, CipherId::Aes256Cbc];

    /// The identifier used in configuration, e.g. `"AES-256-CBC"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CipherId::Aes128Cbc => "AES-128-CBC",
            CipherId::Aes256Cbc => "AES-256-CBC",
        }
    }

    /// Required key length in bytes.
    pub fn key_len(&self) -> usize {
        match self {
            CipherId::Aes128Cbc => 16,
            CipherId::Aes256Cbc => 32,
        }
    }
}

impl fmt::Display for CipherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherId {
    type Err = EncrypterError;

    /// Identifiers are matched exactly; `"aes-256-cbc"` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CipherId::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                EncrypterError::UnsupportedConfiguration(format!(
                    "unknown cipher {s:?}; the only supported ciphers are AES-128-CBC and AES-256-CBC"
                ))
            })
    }
}
