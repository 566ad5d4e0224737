//! Lineseal Cryptographic Primitives
//!
//! Cryptographic building blocks for lineseal. Pure functions with
//! deterministic outputs. Callers provide random bytes (IVs) so encryption
//! can be tested deterministically.
//!
//! # Key Lifecycle
//!
//! One key is derived per session from the shared password. Both peers run
//! the same derivation independently, so the password and the key never
//! cross the wire.
//!
//! ```text
//! password
//!     │
//!     ▼ SHA-256("password|iterations|keyBits")
//! salt
//!     │
//!     ▼ PBKDF2-HMAC-SHA1(password, salt, iterations)
//! master key (keyBits)
//!     │
//!     ├── KeyMode::Shared ──> AES-CBC key == HMAC key
//!     └── KeyMode::Split  ──> HKDF-SHA256 ──> AES-CBC key, HMAC key
//! ```
//!
//! # Security
//!
//! Confidentiality:
//! - AES-CBC with PKCS#7 padding and a fresh random IV per message
//!
//! Integrity:
//! - HMAC-SHA256 over the plaintext (encrypt-and-authenticate)
//! - Padding and UTF-8 failures surface before the tag check; every one of
//!   them is reported as an integrity failure
//! - Tags are compared in constant time
//!
//! Known weaknesses kept for wire compatibility:
//! - The salt is derived from the password, so equal passwords yield equal
//!   keys across users and deployments
//! - In [`KeyMode::Shared`] the same key feeds AES and HMAC

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod channel;
pub mod derivation;
pub mod error;

pub use channel::{decrypt, encrypt, mac, mac_hex, verify_mac};
pub use derivation::{
    DEFAULT_ITERATIONS, DEFAULT_KEY_BITS, DerivedKey, KdfParams, KeyMode, derive_key, derive_salt,
};
pub use error::CryptoError;
pub use lineseal_proto::{IV_SIZE, SecureMessage, TAG_SIZE};
