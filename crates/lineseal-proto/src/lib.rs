//! Lineseal wire formats.
//!
//! Every protocol unit is a single UTF-8 line terminated by `\n`. This crate
//! parses and renders those lines and nothing else: it performs no I/O and no
//! cryptography. Higher layers decide what a parsed line means.
//!
//! # Lines
//!
//! ```text
//! client -> server   <identity>
//! server -> client   <serverNonce>            (or the rejection notice)
//! client -> server   <hex-mac(serverNonce)>|<clientNonce>
//! server -> client   <hex-mac(clientNonce)>
//! either direction   <hex-tag>|<base64-iv>|<base64-ciphertext>
//! ```
//!
//! Fields are separated by `|`. Parsing always splits at the first separator,
//! so the trailing field of a line is taken verbatim.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod handshake;
pub mod message;

pub use errors::{ProtocolError, Result};
pub use handshake::{
    ClientProof, Identity, NONCE_RANDOM_SIZE, Nonce, ServerProof, UNKNOWN_IDENTITY_NOTICE,
};
pub use message::{IV_SIZE, SecureMessage, TAG_SIZE};

/// Separator between fields of a multi-field line.
pub const FIELD_SEPARATOR: char = '|';

/// Longest line either side will buffer before giving up on the peer.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;
