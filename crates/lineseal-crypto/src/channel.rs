//! Message protection using AES-CBC and HMAC-SHA256
//!
//! All functions are pure - IV bytes must be provided by the caller.
//! This enables deterministic testing and keeps randomness behind the
//! caller's environment.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{
    IV_SIZE, SecureMessage, TAG_SIZE,
    derivation::DerivedKey,
    error::CryptoError,
};

type HmacSha256 = Hmac<Sha256>;

/// Compute the keyed authentication code of `text`.
///
/// This is the single MAC primitive of the protocol: the handshake proofs and
/// message tags are both produced here.
pub fn mac(key: &DerivedKey, text: &str) -> [u8; TAG_SIZE] {
    let Ok(mut hmac) = HmacSha256::new_from_slice(key.mac_key()) else {
        unreachable!("HMAC accepts keys of any length");
    };
    hmac.update(text.as_bytes());
    hmac.finalize().into_bytes().into()
}

/// [`mac`] rendered as lowercase hex, the form used on the wire.
pub fn mac_hex(key: &DerivedKey, text: &str) -> String {
    hex::encode(mac(key, text))
}

/// Check `expected` against the MAC of `text` in constant time.
///
/// A length mismatch is a non-match.
pub fn verify_mac(key: &DerivedKey, text: &str, expected: &[u8]) -> bool {
    mac(key, text)[..].ct_eq(expected).into()
}

/// Encrypt `plaintext` under `key` with the given IV.
///
/// The tag is computed over the plaintext, independently of the ciphertext.
///
/// # Security
///
/// - Caller MUST provide a fresh, cryptographically random IV per message
/// - Reusing an IV with the same key leaks equality of plaintext prefixes
pub fn encrypt(key: &DerivedKey, plaintext: &str, iv: [u8; IV_SIZE]) -> SecureMessage {
    let Ok(ciphertext) = cbc_encrypt(key.encryption_key(), &iv, plaintext.as_bytes()) else {
        unreachable!("derived keys always have an AES key length");
    };

    SecureMessage::new(mac(key, plaintext), iv, ciphertext)
}

/// Decrypt and verify a message.
///
/// Returns the plaintext only if the recomputed tag matches.
///
/// # Errors
///
/// Checked in this order:
/// - `Integrity` if the padding is invalid (wrong key, corrupted ciphertext)
/// - `Integrity` if the plaintext is not UTF-8
/// - `Integrity` if the tag does not match the plaintext
pub fn decrypt(key: &DerivedKey, message: &SecureMessage) -> Result<String, CryptoError> {
    let plaintext = cbc_decrypt(key.encryption_key(), &message.iv, &message.ciphertext)?;

    let plaintext = String::from_utf8(plaintext)
        .map_err(|_| CryptoError::Integrity { reason: "plaintext is not valid UTF-8" })?;

    if !verify_mac(key, &plaintext, &message.tag) {
        return Err(CryptoError::Integrity { reason: "tag mismatch" });
    }

    Ok(plaintext)
}

fn cbc_encrypt(key: &[u8], iv: &[u8; IV_SIZE], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let ciphertext = match key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .map(|cipher| cipher.encrypt_padded_vec_mut::<Pkcs7>(data)),
        24 => cbc::Encryptor::<Aes192>::new_from_slices(key, iv)
            .map(|cipher| cipher.encrypt_padded_vec_mut::<Pkcs7>(data)),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map(|cipher| cipher.encrypt_padded_vec_mut::<Pkcs7>(data)),
        actual => return Err(CryptoError::InvalidKeyLength { actual }),
    };

    ciphertext.map_err(|_| CryptoError::InvalidKeyLength { actual: key.len() })
}

fn cbc_decrypt(key: &[u8], iv: &[u8; IV_SIZE], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let plaintext = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map(|cipher| cipher.decrypt_padded_vec_mut::<Pkcs7>(data)),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map(|cipher| cipher.decrypt_padded_vec_mut::<Pkcs7>(data)),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map(|cipher| cipher.decrypt_padded_vec_mut::<Pkcs7>(data)),
        actual => return Err(CryptoError::InvalidKeyLength { actual }),
    };

    plaintext
        .map_err(|_| CryptoError::InvalidKeyLength { actual: key.len() })?
        .map_err(|_| CryptoError::Integrity { reason: "invalid padding" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::{KdfParams, KeyMode, derive_key};

    fn reference_key() -> DerivedKey {
        derive_key("pass123", &KdfParams::default()).unwrap()
    }

    fn test_key(key_bits: u32) -> DerivedKey {
        derive_key("pass123", &KdfParams::new(1000, key_bits)).unwrap()
    }

    fn counting_iv() -> [u8; IV_SIZE] {
        let mut iv = [0u8; IV_SIZE];
        for (i, byte) in iv.iter_mut().enumerate() {
            *byte = i as u8;
        }
        iv
    }

    #[test]
    fn mac_matches_reference_vector() {
        let key = reference_key();
        assert_eq!(
            mac_hex(&key, "abc"),
            "2a802e529d50acea0376fc8adc933f6bfa0a6ca526b51be862600945743391eb"
        );
    }

    #[test]
    fn mac_is_stable() {
        let key = test_key(192);
        assert_eq!(mac_hex(&key, "abc"), mac_hex(&key, "abc"));
        assert_ne!(mac_hex(&key, "abc"), mac_hex(&key, "abd"));
    }

    #[test]
    fn mac_hex_is_lowercase() {
        let hex = mac_hex(&test_key(128), "nonce");
        assert_eq!(hex.len(), TAG_SIZE * 2);
        assert!(hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn encrypt_matches_reference_vector() {
        let message = encrypt(&reference_key(), "hello", counting_iv());

        assert_eq!(hex::encode(&message.ciphertext), "76c7554bd0aae56587b42765a035a802");
        assert_eq!(
            hex::encode(message.tag),
            "b71245a9ad72b03190cddbd3580697245456427c6bd6312e0fe366c77159b6e3"
        );
        assert_eq!(message.iv, counting_iv());
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        for bits in [128, 192, 256] {
            let key = test_key(bits);
            let message = encrypt(&key, "Hello, World!", [0xAB; IV_SIZE]);
            assert_eq!(decrypt(&key, &message).unwrap(), "Hello, World!");
        }
    }

    #[test]
    fn encrypt_decrypt_empty_message() {
        let key = test_key(192);
        let message = encrypt(&key, "", [0x00; IV_SIZE]);

        // PKCS#7 always adds a full block for block-aligned input
        assert_eq!(message.ciphertext.len(), 16);
        assert_eq!(decrypt(&key, &message).unwrap(), "");
    }

    #[test]
    fn encrypt_decrypt_multibyte_text() {
        let key = test_key(256);
        let text = "héllo wörld ✓ 日本語";
        let message = encrypt(&key, text, [0x11; IV_SIZE]);
        assert_eq!(decrypt(&key, &message).unwrap(), text);
    }

    #[test]
    fn different_iv_produces_different_ciphertext() {
        let key = test_key(192);

        let message1 = encrypt(&key, "hello", [0x00; IV_SIZE]);
        let message2 = encrypt(&key, "hello", [0xFF; IV_SIZE]);

        assert_ne!(message1.ciphertext, message2.ciphertext);
        // Tag covers the plaintext only, so it does not change with the IV
        assert_eq!(message1.tag, message2.tag);
    }

    #[test]
    fn wrong_key_fails_decryption() {
        let message = encrypt(&test_key(192), "secret message", [0x00; IV_SIZE]);
        let wrong_key = derive_key("not-pass123", &KdfParams::new(1000, 192)).unwrap();

        let result = decrypt(&wrong_key, &message);
        assert!(matches!(result, Err(CryptoError::Integrity { .. })));
    }

    #[test]
    fn tampered_tag_fails_decryption() {
        let key = test_key(192);
        let mut message = encrypt(&key, "original message", [0x00; IV_SIZE]);
        message.tag[0] ^= 0x01;

        assert_eq!(decrypt(&key, &message), Err(CryptoError::Integrity { reason: "tag mismatch" }));
    }

    #[test]
    fn tampered_iv_fails_decryption() {
        let key = test_key(192);
        let mut message = encrypt(&key, "original message", [0x00; IV_SIZE]);
        message.iv[3] ^= 0x80;

        assert!(matches!(decrypt(&key, &message), Err(CryptoError::Integrity { .. })));
    }

    #[test]
    fn tampered_ciphertext_fails_decryption() {
        let key = test_key(192);
        let mut message = encrypt(&key, "a somewhat longer original message", [0x00; IV_SIZE]);
        message.ciphertext[0] ^= 0xFF;

        assert!(matches!(decrypt(&key, &message), Err(CryptoError::Integrity { .. })));
    }

    #[test]
    fn truncated_ciphertext_fails_decryption() {
        let key = test_key(192);
        let mut message = encrypt(&key, "original message", [0x00; IV_SIZE]);
        message.ciphertext.truncate(5);

        assert_eq!(
            decrypt(&key, &message),
            Err(CryptoError::Integrity { reason: "invalid padding" })
        );
    }

    #[test]
    fn split_keys_roundtrip_and_differ_from_shared() {
        let shared = test_key(192);
        let split = derive_key("pass123", &KdfParams::new(1000, 192).with_mode(KeyMode::Split))
            .unwrap();

        let message = encrypt(&split, "hello", [0x42; IV_SIZE]);
        assert_eq!(decrypt(&split, &message).unwrap(), "hello");
        assert!(decrypt(&shared, &message).is_err());
    }

    #[test]
    fn verify_mac_rejects_wrong_length() {
        let key = test_key(128);
        let tag = mac(&key, "abc");

        assert!(verify_mac(&key, "abc", &tag));
        assert!(!verify_mac(&key, "abc", &tag[..16]));
        assert!(!verify_mac(&key, "abc", &[]));
    }
}
