//! Error types for the Lineseal protocol core.
//!
//! Strongly-typed errors per layer: transport errors (line I/O), handshake
//! errors (authentication and state transitions) and session errors
//! (per-message integrity). Wire parsing and crypto errors are wrapped, not
//! flattened, so callers can still tell a malformed line from a forged one.

use std::{fmt, io, time::Duration};

use lineseal_crypto::CryptoError;
use lineseal_proto::{ProtocolError, UNKNOWN_IDENTITY_NOTICE};
use thiserror::Error;

use crate::handshake::HandshakeState;

/// Errors from reading or writing protocol lines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Underlying I/O failure
    #[error("i/o error: {0}")]
    Io(String),

    /// Peer sent a line that is not UTF-8
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    /// Peer sent a line longer than the configured limit
    #[error("line exceeds {max} bytes")]
    LineTooLong {
        /// Maximum accepted line length
        max: usize,
    },

    /// No complete line arrived within the read timeout
    #[error("read timed out after {elapsed:?}")]
    Timeout {
        /// How long we waited
        elapsed: Duration,
    },
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Which proof failed to verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStep {
    /// Server checking the client's MAC of the server nonce
    ServerNonce,
    /// Client checking the server's MAC of the client nonce
    ClientNonce,
}

impl fmt::Display for VerificationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerNonce => f.write_str("server nonce proof"),
            Self::ClientNonce => f.write_str("client nonce proof"),
        }
    }
}

/// Errors that abort an authentication handshake.
///
/// No handshake error is retried on the same connection. The caller may start
/// over on a new one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// Handshake line could not be parsed
    #[error("malformed handshake line: {0}")]
    Malformed(#[from] ProtocolError),

    /// Server has no password for the announced identity
    #[error("unknown identity: {identity}")]
    UnknownIdentity {
        /// Identity the client announced
        identity: String,
    },

    /// A peer's MAC did not match (wrong password or active attacker)
    #[error("handshake verification failed: {step}")]
    Verification {
        /// Which proof failed
        step: VerificationStep,
    },

    /// Server answered the identity with something other than a nonce
    #[error("server rejected the identity: {notice}")]
    Rejected {
        /// Line the server sent instead of a nonce
        notice: String,
    },

    /// Peer closed the connection before the handshake finished
    #[error("connection closed during handshake")]
    ConnectionClosed,

    /// Invalid state transition attempted
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when error occurred
        state: HandshakeState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Key derivation failed or could not be scheduled
    #[error("key derivation failed: {0}")]
    Crypto(#[from] CryptoError),

    /// Underlying transport error
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Runtime failure unrelated to the peer
    #[error("internal error: {0}")]
    Internal(String),
}

impl HandshakeError {
    /// Line to send the peer before closing, if the protocol defines one.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::UnknownIdentity { .. } => Some(UNKNOWN_IDENTITY_NOTICE),
            _ => None,
        }
    }

    /// Returns true if the same credentials may succeed on a new connection.
    ///
    /// Transport failures and early hang-ups are transient. Failed proofs,
    /// rejections and malformed lines mean the credentials or the peer are
    /// wrong, and retrying will not help.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::Transport(_))
    }
}

/// Errors from sending or receiving an application message.
///
/// Every session error is terminal: the owner of the transport should close
/// the connection rather than keep reading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Line is not a well-formed secure message
    #[error("malformed message: {0}")]
    Malformed(#[from] ProtocolError),

    /// Message failed decryption or tag verification
    #[error("message integrity failure: {0}")]
    Integrity(#[from] CryptoError),

    /// Underlying transport error
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
