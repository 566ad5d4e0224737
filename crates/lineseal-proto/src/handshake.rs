//! Handshake line formats.
//!
//! The handshake exchanges four lines: an identity, a server nonce, a client
//! proof (`<mac>|<nonce>`) and a server proof (`<mac>`). Nonces are opaque
//! tokens, so the only structural rules are the ones that keep the line
//! format unambiguous.

use std::fmt;

use crate::{
    FIELD_SEPARATOR,
    errors::{ProtocolError, Result},
    message::{TAG_SIZE, decode_tag},
};

/// Line sent instead of a server nonce when the identity is unknown.
pub const UNKNOWN_IDENTITY_NOTICE: &str = "Sorry user not found!";

/// Random bytes consumed per generated nonce. Only the low 130 bits are used.
pub const NONCE_RANDOM_SIZE: usize = 17;

/// Digits of the radix-32 nonce rendering.
const RADIX32_DIGITS: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Number of random bits carried by a generated nonce.
const NONCE_BITS: usize = 130;

/// Identity announced by a connecting client (typically a user name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Parse an identity line. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// - `InvalidIdentity` if the identity is empty or contains `|`
    pub fn parse(line: &str) -> Result<Self> {
        let identity = line.trim();

        if identity.is_empty() {
            return Err(ProtocolError::InvalidIdentity { reason: "empty" });
        }
        if identity.contains(FIELD_SEPARATOR) {
            return Err(ProtocolError::InvalidIdentity { reason: "contains '|'" });
        }

        Ok(Self(identity.to_string()))
    }

    /// The identity as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Single-use challenge token.
///
/// # Invariants
///
/// - Non-empty
/// - Contains no `|` and no whitespace, so it survives line framing and the
///   client proof split unchanged
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nonce(String);

impl Nonce {
    /// Render 130 bits of caller-provided randomness as a radix-32 token.
    ///
    /// The top six bits of `random` are discarded. The rendering has no
    /// leading zeros, so tokens are between 1 and 26 characters long.
    ///
    /// Caller MUST provide cryptographically secure random bytes in
    /// production.
    pub fn from_random(random: [u8; NONCE_RANDOM_SIZE]) -> Self {
        let bit = |position: usize| -> u8 {
            let byte = random[NONCE_RANDOM_SIZE - 1 - position / 8];
            (byte >> (position % 8)) & 1
        };

        let mut token = String::with_capacity(NONCE_BITS / 5);
        for group in 0..NONCE_BITS / 5 {
            let top = NONCE_BITS - 1 - group * 5;
            let mut digit = 0u8;
            for offset in 0..5 {
                digit = (digit << 1) | bit(top - offset);
            }
            if token.is_empty() && digit == 0 {
                continue;
            }
            token.push(char::from(RADIX32_DIGITS[usize::from(digit)]));
        }

        if token.is_empty() {
            token.push('0');
        }

        Self(token)
    }

    /// Parse a nonce received from the peer. Surrounding whitespace is
    /// ignored.
    ///
    /// # Errors
    ///
    /// - `InvalidNonce` if the token is empty, contains `|` or contains
    ///   inner whitespace
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();

        if token.is_empty() {
            return Err(ProtocolError::InvalidNonce { reason: "empty" });
        }
        if token.contains(FIELD_SEPARATOR) {
            return Err(ProtocolError::InvalidNonce { reason: "contains '|'" });
        }
        if token.chars().any(char::is_whitespace) {
            return Err(ProtocolError::InvalidNonce { reason: "contains whitespace" });
        }

        Ok(Self(token.to_string()))
    }

    /// The token as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client's answer to the server nonce: `<hex-mac(serverNonce)>|<clientNonce>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientProof {
    /// MAC of the server nonce under the client's derived key
    pub server_nonce_tag: [u8; TAG_SIZE],
    /// Fresh nonce the server must answer
    pub client_nonce: Nonce,
}

impl ClientProof {
    /// Render as a wire line (without the trailing newline).
    pub fn encode(&self) -> String {
        format!("{}{FIELD_SEPARATOR}{}", hex::encode(self.server_nonce_tag), self.client_nonce)
    }

    /// Parse a client proof line.
    ///
    /// The MAC is everything before the first `|`; the nonce is everything
    /// after it. Nonces never contain `|`, so a line with a second `|` is
    /// rejected rather than split again.
    ///
    /// # Errors
    ///
    /// - `MissingSeparator` if there is no `|`
    /// - `InvalidHex` / `InvalidLength` if the MAC is not a 32-byte hex value
    /// - `InvalidNonce` if the remainder is not a valid nonce, including one
    ///   that contains another `|`
    pub fn decode(line: &str) -> Result<Self> {
        let line = line.trim();

        let (tag_field, nonce_field) = line
            .split_once(FIELD_SEPARATOR)
            .ok_or(ProtocolError::MissingSeparator { field: "server nonce mac" })?;

        let server_nonce_tag = decode_tag(tag_field, "server nonce mac")?;
        let client_nonce = Nonce::parse(nonce_field)?;

        Ok(Self { server_nonce_tag, client_nonce })
    }
}

/// Server's answer to the client nonce: `<hex-mac(clientNonce)>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerProof {
    /// MAC of the client nonce under the server's derived key
    pub client_nonce_tag: [u8; TAG_SIZE],
}

impl ServerProof {
    /// Render as a wire line (without the trailing newline).
    pub fn encode(&self) -> String {
        hex::encode(self.client_nonce_tag)
    }

    /// Parse a server proof line.
    ///
    /// # Errors
    ///
    /// - `InvalidHex` / `InvalidLength` if the line is not a 32-byte hex value
    pub fn decode(line: &str) -> Result<Self> {
        let client_nonce_tag = decode_tag(line.trim(), "client nonce mac")?;
        Ok(Self { client_nonce_tag })
    }
}
