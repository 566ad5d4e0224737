//! Secure application message wire format.
//!
//! Layout on the wire:
//! `<hex tag>|<base64 iv>|<base64 ciphertext>`
//!
//! The tag authenticates the plaintext, not the ciphertext, so a
//! [`SecureMessage`] can be structurally valid while still failing integrity
//! checks after decryption. This type only guarantees the structure.

use std::{fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{
    FIELD_SEPARATOR,
    errors::{ProtocolError, Result},
};

/// Size of the CBC initialization vector (one AES block)
pub const IV_SIZE: usize = 16;

/// Size of the HMAC-SHA256 tag
pub const TAG_SIZE: usize = 32;

/// One encrypted-and-authenticated application payload.
///
/// Constructed by encryption, consumed by decryption, never mutated in
/// between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureMessage {
    /// HMAC-SHA256 over the plaintext
    pub tag: [u8; TAG_SIZE],
    /// Random IV used for this encryption only
    pub iv: [u8; IV_SIZE],
    /// AES-CBC ciphertext with PKCS#7 padding
    pub ciphertext: Vec<u8>,
}

impl SecureMessage {
    /// Assemble a message from its three fields.
    pub fn new(tag: [u8; TAG_SIZE], iv: [u8; IV_SIZE], ciphertext: Vec<u8>) -> Self {
        Self { tag, iv, ciphertext }
    }

    /// Render the message as a wire line (without the trailing newline).
    pub fn encode(&self) -> String {
        format!(
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
            hex::encode(self.tag),
            STANDARD.encode(self.iv),
            STANDARD.encode(&self.ciphertext)
        )
    }

    /// Parse a wire line. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// - `MissingSeparator` if the line has fewer than three fields
    /// - `InvalidHex` / `InvalidBase64` if a field does not decode
    /// - `InvalidLength` if the tag or IV has the wrong size
    pub fn decode(line: &str) -> Result<Self> {
        let line = line.trim();

        let (tag_field, rest) = line
            .split_once(FIELD_SEPARATOR)
            .ok_or(ProtocolError::MissingSeparator { field: "tag" })?;
        let (iv_field, cipher_field) = rest
            .split_once(FIELD_SEPARATOR)
            .ok_or(ProtocolError::MissingSeparator { field: "iv" })?;

        let tag = decode_tag(tag_field, "tag")?;

        let iv_bytes = decode_base64(iv_field, "iv")?;
        let iv: [u8; IV_SIZE] = iv_bytes.as_slice().try_into().map_err(|_| {
            ProtocolError::InvalidLength { field: "iv", expected: IV_SIZE, actual: iv_bytes.len() }
        })?;

        let ciphertext = decode_base64(cipher_field, "ciphertext")?;

        Ok(Self { tag, iv, ciphertext })
    }
}

impl fmt::Display for SecureMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for SecureMessage {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

/// Decode a hex tag field into a fixed-size array.
pub(crate) fn decode_tag(field: &str, name: &'static str) -> Result<[u8; TAG_SIZE]> {
    let bytes = hex::decode(field)
        .map_err(|e| ProtocolError::InvalidHex { field: name, reason: e.to_string() })?;

    bytes.as_slice().try_into().map_err(|_| ProtocolError::InvalidLength {
        field: name,
        expected: TAG_SIZE,
        actual: bytes.len(),
    })
}

fn decode_base64(field: &str, name: &'static str) -> Result<Vec<u8>> {
    STANDARD
        .decode(field)
        .map_err(|e| ProtocolError::InvalidBase64 { field: name, reason: e.to_string() })
}
