//! Client error types.

use std::fmt;

use lineseal_core::{HandshakeError, SessionError};
use lineseal_crypto::CryptoError;
use lineseal_proto::ProtocolError;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Invalid settings (key parameters, identity, no RNG).
    Config(String),

    /// Could not reach the server.
    Connect(String),

    /// Server could not be authenticated, or rejected us.
    Handshake(HandshakeError),

    /// Server sent a malformed or forged message, or the connection broke.
    Session(SessionError),

    /// Local terminal I/O failed.
    Io(String),

    /// User abandoned a prompt.
    Cancelled,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Connect(msg) => write!(f, "cannot connect: {msg}"),
            Self::Handshake(err) => write!(f, "authentication failed: {err}"),
            Self::Session(err) => write!(f, "session error: {err}"),
            Self::Io(msg) => write!(f, "i/o error: {msg}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Handshake(err) => Some(err),
            Self::Session(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HandshakeError> for ClientError {
    fn from(err: HandshakeError) -> Self {
        Self::Handshake(err)
    }
}

impl From<SessionError> for ClientError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl From<CryptoError> for ClientError {
    fn from(err: CryptoError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
