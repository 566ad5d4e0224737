//! Fuzz target for the decrypt path
//!
//! Decrypts attacker-controlled tags, IVs and ciphertexts under a fixed key.
//!
//! # Invariants
//!
//! - Never panics on bad padding, odd ciphertext lengths or invalid UTF-8
//! - Every failure is reported as `CryptoError::Integrity`
//! - Forging a valid tag is infeasible, so nothing random decrypts

#![no_main]

use std::sync::OnceLock;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lineseal_crypto::{
    CryptoError, DerivedKey, IV_SIZE, KdfParams, SecureMessage, TAG_SIZE, decrypt, derive_key,
};

#[derive(Debug, Arbitrary)]
struct Input {
    tag: [u8; TAG_SIZE],
    iv: [u8; IV_SIZE],
    ciphertext: Vec<u8>,
}

fn key() -> &'static DerivedKey {
    static KEY: OnceLock<DerivedKey> = OnceLock::new();
    KEY.get_or_init(|| match derive_key("fuzz", &KdfParams::new(1, 192)) {
        Ok(key) => key,
        Err(e) => panic!("fixed parameters are valid: {e}"),
    })
}

fuzz_target!(|input: Input| {
    let message = SecureMessage::new(input.tag, input.iv, input.ciphertext);

    match decrypt(key(), &message) {
        Ok(plaintext) => panic!("forged message decrypted to {plaintext:?}"),
        Err(CryptoError::Integrity { .. }) => {},
        Err(other) => panic!("unexpected error kind: {other}"),
    }
});
