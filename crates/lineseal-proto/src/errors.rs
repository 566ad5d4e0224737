//! Parse errors for wire lines.

use thiserror::Error;

/// Result alias for wire parsing.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// A line did not match the expected wire format.
///
/// Every variant is a malformed-message condition: the peer sent something
/// that cannot be interpreted, so the connection is not salvageable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A `|` separator was expected after the named field
    #[error("missing '|' separator after {field}")]
    MissingSeparator {
        /// Field that should have been followed by a separator
        field: &'static str,
    },

    /// A hex field could not be decoded
    #[error("invalid hex in {field}: {reason}")]
    InvalidHex {
        /// Field that failed to decode
        field: &'static str,
        /// Decoder message
        reason: String,
    },

    /// A base64 field could not be decoded
    #[error("invalid base64 in {field}: {reason}")]
    InvalidBase64 {
        /// Field that failed to decode
        field: &'static str,
        /// Decoder message
        reason: String,
    },

    /// A decoded field had the wrong number of bytes
    #[error("invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Field with the wrong length
        field: &'static str,
        /// Required length in bytes
        expected: usize,
        /// Length actually received
        actual: usize,
    },

    /// A nonce token was empty or contained reserved characters
    #[error("invalid nonce: {reason}")]
    InvalidNonce {
        /// What was wrong with the token
        reason: &'static str,
    },

    /// An identity announcement was empty or contained reserved characters
    #[error("invalid identity: {reason}")]
    InvalidIdentity {
        /// What was wrong with the identity
        reason: &'static str,
    },

    /// A line exceeded [`crate::MAX_LINE_LENGTH`]
    #[error("line too long: {len} bytes exceeds limit of {max}")]
    LineTooLong {
        /// Observed length
        len: usize,
        /// Configured limit
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::InvalidLength { field: "iv", expected: 16, actual: 3 };
        assert_eq!(err.to_string(), "invalid iv length: expected 16 bytes, got 3");

        let err = ProtocolError::MissingSeparator { field: "tag" };
        assert_eq!(err.to_string(), "missing '|' separator after tag");
    }
}
