//! Property-based tests for message protection
//!
//! These tests verify the fundamental invariants of the secure channel:
//!
//! 1. **Round-trip**: decrypt(encrypt(m)) == m for all messages
//! 2. **Tamper detection**: flipping any bit of tag, IV or ciphertext is
//!    rejected as an integrity failure
//! 3. **Determinism**: same password and parameters give the same key and MAC

use lineseal_crypto::{
    CryptoError, DerivedKey, IV_SIZE, KdfParams, KeyMode, decrypt, derive_key, encrypt, mac_hex,
};
use proptest::prelude::*;

fn test_key(mode: KeyMode) -> DerivedKey {
    derive_key("pass123", &KdfParams::new(1000, 192).with_mode(mode)).unwrap()
}

fn arb_mode() -> impl Strategy<Value = KeyMode> {
    prop_oneof![Just(KeyMode::Shared), Just(KeyMode::Split)]
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Tag,
    Iv,
    Ciphertext,
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_encrypt_decrypt_roundtrip(
        plaintext in ".{0,300}",
        iv in prop::array::uniform16(any::<u8>()),
        mode in arb_mode(),
    ) {
        let key = test_key(mode);

        let message = encrypt(&key, &plaintext, iv);
        let decrypted = decrypt(&key, &message).unwrap();

        prop_assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn prop_bit_flip_is_detected(
        plaintext in ".{1,200}",
        iv in prop::array::uniform16(any::<u8>()),
        field in prop_oneof![Just(Field::Tag), Just(Field::Iv), Just(Field::Ciphertext)],
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let key = test_key(KeyMode::Shared);
        let mut message = encrypt(&key, &plaintext, iv);

        let bytes: &mut [u8] = match field {
            Field::Tag => &mut message.tag,
            Field::Iv => &mut message.iv,
            Field::Ciphertext => &mut message.ciphertext,
        };
        let index = position.index(bytes.len());
        bytes[index] ^= 1 << bit;

        let result = decrypt(&key, &message);
        prop_assert!(
            matches!(result, Err(CryptoError::Integrity { .. })),
            "tampered {:?} byte {} accepted: {:?}", field, index, result
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn prop_derivation_deterministic(
        password in ".{0,32}",
        key_bits in prop_oneof![Just(128u32), Just(192u32), Just(256u32)],
    ) {
        let params = KdfParams::new(500, key_bits);
        let key1 = derive_key(&password, &params).unwrap();
        let key2 = derive_key(&password, &params).unwrap();

        prop_assert_eq!(key1.encryption_key(), key2.encryption_key());
        prop_assert_eq!(mac_hex(&key1, "abc"), mac_hex(&key2, "abc"));
    }
}

#[test]
fn fresh_ivs_give_distinct_messages_that_both_decrypt() {
    let key = derive_key("pass123", &KdfParams::default()).unwrap();

    let first = encrypt(&key, "hello", [0x01; IV_SIZE]);
    let second = encrypt(&key, "hello", [0x02; IV_SIZE]);

    assert_ne!(first.iv, second.iv);
    assert_ne!(first.ciphertext, second.ciphertext);
    assert_eq!(decrypt(&key, &first).unwrap(), "hello");
    assert_eq!(decrypt(&key, &second).unwrap(), "hello");
}
