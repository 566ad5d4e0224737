//! Environment abstraction for deterministic testing.
//!
//! Decouples protocol logic from the system randomness source. Tests plug in
//! seeded or counting environments; production uses [`SystemEnv`].

use lineseal_crypto::{CryptoError, IV_SIZE};
use lineseal_proto::{NONCE_RANDOM_SIZE, Nonce};

/// Abstract environment providing randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion, incorrect simulation setup)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a fresh CBC initialization vector.
    fn random_iv(&self) -> [u8; IV_SIZE] {
        let mut iv = [0u8; IV_SIZE];
        self.random_bytes(&mut iv);
        iv
    }

    /// Generates a fresh handshake nonce (130 random bits).
    fn random_nonce(&self) -> Nonce {
        let mut bytes = [0u8; NONCE_RANDOM_SIZE];
        self.random_bytes(&mut bytes);
        Nonce::from_random(bytes)
    }
}

/// Production environment backed by the OS RNG (getrandom).
///
/// # Panics
///
/// `random_bytes` panics if the OS RNG fails mid-run. Call
/// [`SystemEnv::probe`] at startup so an unusable RNG aborts the process
/// before any connection is served.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Create a system environment after checking the OS RNG works.
    ///
    /// # Errors
    ///
    /// - `CryptoError::RandomnessUnavailable` if the OS refuses to supply
    ///   random bytes
    pub fn probe() -> Result<Self, CryptoError> {
        let mut buffer = [0u8; IV_SIZE];
        getrandom::fill(&mut buffer)
            .map_err(|e| CryptoError::RandomnessUnavailable { reason: e.to_string() })?;
        Ok(Self)
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - nonces and IVs would repeat");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_succeeds_on_supported_platforms() {
        assert!(SystemEnv::probe().is_ok());
    }

    #[test]
    fn system_env_random_bytes_are_random() {
        let env = SystemEnv::new();

        let mut bytes1 = [0u8; 32];
        let mut bytes2 = [0u8; 32];

        env.random_bytes(&mut bytes1);
        env.random_bytes(&mut bytes2);

        // Extremely unlikely to be equal if random
        assert_ne!(bytes1, bytes2, "Random bytes should differ");
    }

    #[test]
    fn ivs_and_nonces_are_fresh() {
        let env = SystemEnv::new();

        assert_ne!(env.random_iv(), env.random_iv());
        assert_ne!(env.random_nonce(), env.random_nonce());
    }
}
