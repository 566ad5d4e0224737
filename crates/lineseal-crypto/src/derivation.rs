//! Password-based key derivation

use std::fmt;

use hkdf::Hkdf;
use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

use crate::error::CryptoError;

/// Default PBKDF2 iteration count
pub const DEFAULT_ITERATIONS: u32 = 65536;

/// Default derived key length in bits (AES-192)
pub const DEFAULT_KEY_BITS: u32 = 192;

/// Label for the encryption sub-key in [`KeyMode::Split`]
const ENCRYPTION_LABEL: &[u8] = b"lineseal enc v1";

/// Label for the MAC sub-key in [`KeyMode::Split`]
const MAC_LABEL: &[u8] = b"lineseal mac v1";

/// Length of the MAC sub-key in [`KeyMode::Split`]
const SPLIT_MAC_KEY_LEN: usize = 32;

/// How the derived key material is assigned to AES and HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    /// One key feeds both AES and HMAC. Compatible with existing peers.
    #[default]
    Shared,
    /// Independent AES and HMAC sub-keys expanded with HKDF-SHA256.
    ///
    /// The wire format is unchanged, but both peers must agree on the mode.
    Split,
}

/// Parameters of the password-based key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// PBKDF2 iteration count
    pub iterations: u32,
    /// Derived key length in bits (128, 192 or 256)
    pub key_bits: u32,
    /// Key assignment
    pub mode: KeyMode,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self { iterations: DEFAULT_ITERATIONS, key_bits: DEFAULT_KEY_BITS, mode: KeyMode::Shared }
    }
}

impl KdfParams {
    /// Parameters with the given cost and key length in [`KeyMode::Shared`].
    pub fn new(iterations: u32, key_bits: u32) -> Self {
        Self { iterations, key_bits, mode: KeyMode::Shared }
    }

    /// Same parameters with a different key mode.
    #[must_use]
    pub fn with_mode(self, mode: KeyMode) -> Self {
        Self { mode, ..self }
    }

    /// Check that a key can be derived with these parameters.
    ///
    /// # Errors
    ///
    /// - `InvalidParameters` if `iterations` is zero or `key_bits` is not an
    ///   AES key size
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.iterations == 0 {
            return Err(CryptoError::InvalidParameters {
                reason: "iteration count must be positive".to_string(),
            });
        }

        if !matches!(self.key_bits, 128 | 192 | 256) {
            return Err(CryptoError::InvalidParameters {
                reason: format!("key length must be 128, 192 or 256 bits, got {}", self.key_bits),
            });
        }

        Ok(())
    }

    /// Derived key length in bytes.
    pub fn key_len(&self) -> usize {
        (self.key_bits / 8) as usize
    }
}

/// Key material derived from a password for one session.
///
/// Immutable once derived. Zeroized on drop; `Debug` never prints key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey {
    encryption_key: Vec<u8>,
    mac_key: Vec<u8>,
    mode: KeyMode,
}

impl DerivedKey {
    /// Key for AES-CBC (16, 24 or 32 bytes).
    pub fn encryption_key(&self) -> &[u8] {
        &self.encryption_key
    }

    /// Key for HMAC-SHA256.
    pub fn mac_key(&self) -> &[u8] {
        &self.mac_key
    }

    /// Size of the encryption key in bits.
    pub fn key_bits(&self) -> u32 {
        (self.encryption_key.len() * 8) as u32
    }

    /// How the key material was assigned.
    pub fn mode(&self) -> KeyMode {
        self.mode
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key_bits", &self.key_bits())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.encryption_key.zeroize();
        self.mac_key.zeroize();
    }
}

/// Compute the PBKDF2 salt for a password.
///
/// The salt is SHA-256 of the UTF-8 string `password|iterations|keyBits`. It
/// depends only on the inputs, which is what lets both peers derive the same
/// key without exchanging anything.
pub fn derive_salt(password: &str, params: &KdfParams) -> [u8; 32] {
    let input = Zeroizing::new(format!("{password}|{}|{}", params.iterations, params.key_bits));
    Sha256::digest(input.as_bytes()).into()
}

/// Derive a session key from a password.
///
/// Deterministic: identical inputs always produce identical keys. An empty
/// password is accepted as a (weak) secret.
///
/// # Errors
///
/// - `InvalidParameters` if [`KdfParams::validate`] rejects `params`
pub fn derive_key(password: &str, params: &KdfParams) -> Result<DerivedKey, CryptoError> {
    params.validate()?;

    let salt = derive_salt(password, params);
    let mut master = Zeroizing::new(vec![0u8; params.key_len()]);
    pbkdf2_hmac::<Sha1>(password.as_bytes(), &salt, params.iterations, &mut master);

    let key = match params.mode {
        KeyMode::Shared => DerivedKey {
            encryption_key: master.to_vec(),
            mac_key: master.to_vec(),
            mode: KeyMode::Shared,
        },
        KeyMode::Split => {
            let hkdf = Hkdf::<Sha256>::new(None, &master);

            let mut encryption_key = vec![0u8; params.key_len()];
            let Ok(()) = hkdf.expand(ENCRYPTION_LABEL, &mut encryption_key) else {
                unreachable!("AES key sizes are valid HKDF-SHA256 output lengths");
            };

            let mut mac_key = vec![0u8; SPLIT_MAC_KEY_LEN];
            let Ok(()) = hkdf.expand(MAC_LABEL, &mut mac_key) else {
                unreachable!("32 bytes is a valid HKDF-SHA256 output length");
            };

            DerivedKey { encryption_key, mac_key, mode: KeyMode::Split }
        },
    };

    Ok(key)
}
