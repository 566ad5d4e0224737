//! Server error types.

use std::fmt;

use lineseal_core::{HandshakeError, SessionError};
use lineseal_crypto::CryptoError;

use crate::config::ConfigError;

/// Errors that can occur in the server.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration error (bad users file, invalid key parameters, no RNG).
    ///
    /// These are fatal errors that prevent server startup. Fix configuration
    /// and restart.
    Config(String),

    /// Transport/network error (bind failure, accept failure, I/O error).
    Transport(String),

    /// Client failed to authenticate.
    ///
    /// Fatal for that connection, but the server keeps serving other clients.
    Handshake(HandshakeError),

    /// Authenticated client sent a malformed or forged message, or the
    /// connection broke mid-session.
    Session(SessionError),
}

impl ServerError {
    /// Returns true if the error is a fault of this server rather than of
    /// one client, such as a key derivation setup the process cannot run.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) | Self::Handshake(HandshakeError::Internal(_)) => true,
            Self::Handshake(HandshakeError::Crypto(err)) => err.is_startup_error(),
            _ => false,
        }
    }

    /// Returns true if the client simply went away (hang-up, timeout, broken
    /// pipe) instead of failing authentication or sending bad data.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Handshake(err) => err.is_transient(),
            Self::Session(SessionError::Transport(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Handshake(err) => write!(f, "handshake failed: {err}"),
            Self::Session(err) => write!(f, "session error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Handshake(err) => Some(err),
            Self::Session(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HandshakeError> for ServerError {
    fn from(err: HandshakeError) -> Self {
        Self::Handshake(err)
    }
}

impl From<SessionError> for ServerError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl From<ConfigError> for ServerError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<CryptoError> for ServerError {
    fn from(err: CryptoError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
