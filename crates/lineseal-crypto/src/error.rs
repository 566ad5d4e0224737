//! Error types for key derivation and message protection

use thiserror::Error;

/// Errors from cryptographic operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Key derivation parameters are unusable
    #[error("invalid key derivation parameters: {reason}")]
    InvalidParameters {
        /// What was wrong with the parameters
        reason: String,
    },

    /// Key material has a length no cipher accepts
    #[error("invalid key length: {actual} bytes")]
    InvalidKeyLength {
        /// Length actually supplied
        actual: usize,
    },

    /// Decrypted message failed verification (corruption or tampering)
    #[error("integrity check failed: {reason}")]
    Integrity {
        /// Which check rejected the message
        reason: &'static str,
    },

    /// The operating system could not supply secure randomness
    #[error("secure randomness unavailable: {reason}")]
    RandomnessUnavailable {
        /// OS error message
        reason: String,
    },
}

impl CryptoError {
    /// Returns true if this error means the process cannot operate at all.
    ///
    /// Startup errors are configuration or platform failures and should abort
    /// the process. Anything else is scoped to a single message or
    /// connection.
    pub fn is_startup_error(&self) -> bool {
        match self {
            Self::InvalidParameters { .. } | Self::RandomnessUnavailable { .. } => true,
            Self::InvalidKeyLength { .. } | Self::Integrity { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_errors_abort_startup() {
        let err = CryptoError::InvalidParameters { reason: "zero iterations".to_string() };
        assert!(err.is_startup_error());

        let err = CryptoError::RandomnessUnavailable { reason: "no entropy".to_string() };
        assert!(err.is_startup_error());
    }

    #[test]
    fn integrity_errors_are_per_message() {
        let err = CryptoError::Integrity { reason: "tag mismatch" };
        assert!(!err.is_startup_error());
    }

    #[test]
    fn error_display() {
        let err = CryptoError::Integrity { reason: "tag mismatch" };
        assert_eq!(err.to_string(), "integrity check failed: tag mismatch");
    }
}
