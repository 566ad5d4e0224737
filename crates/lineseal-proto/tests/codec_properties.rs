//! Property-based tests for the wire codec.
//!
//! 1. Parsers never panic on arbitrary input
//! 2. Rendered lines never contain a newline (framing safety)
//! 3. Generated nonces always satisfy the nonce invariants

use lineseal_proto::{ClientProof, IV_SIZE, Nonce, SecureMessage, TAG_SIZE};
use proptest::prelude::*;

fn arb_message() -> impl Strategy<Value = SecureMessage> {
    (
        prop::array::uniform32(any::<u8>()),
        prop::array::uniform16(any::<u8>()),
        prop::collection::vec(any::<u8>(), 0..512),
    )
        .prop_map(|(tag, iv, ciphertext)| SecureMessage::new(tag, iv, ciphertext))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_decode_never_panics(line in ".*") {
        let _ = SecureMessage::decode(&line);
        let _ = ClientProof::decode(&line);
        let _ = Nonce::parse(&line);
    }

    #[test]
    fn prop_encoded_message_is_single_line(message in arb_message()) {
        let line = message.encode();

        prop_assert!(!line.contains('\n'));
        prop_assert_eq!(line.matches('|').count(), 2);
        prop_assert_eq!(SecureMessage::decode(&line).unwrap(), message);
    }

    #[test]
    fn prop_generated_nonce_is_valid(random in prop::array::uniform17(any::<u8>())) {
        let nonce = Nonce::from_random(random);

        prop_assert!(!nonce.as_str().is_empty());
        prop_assert!(nonce.as_str().len() <= 26);
        prop_assert!(nonce.as_str().bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'v').contains(&b)));
        prop_assert_eq!(Nonce::parse(nonce.as_str()).unwrap(), nonce);
    }

    #[test]
    fn prop_distinct_randomness_gives_distinct_nonces(
        a in prop::array::uniform17(any::<u8>()),
        b in prop::array::uniform17(any::<u8>()),
    ) {
        // Only the low 130 bits matter
        let mut a_masked = a;
        let mut b_masked = b;
        a_masked[0] &= 0x03;
        b_masked[0] &= 0x03;
        prop_assume!(a_masked != b_masked);

        prop_assert_ne!(Nonce::from_random(a), Nonce::from_random(b));
    }
}

#[test]
fn tampered_tag_length_is_rejected() {
    let message = SecureMessage::new([1; TAG_SIZE], [2; IV_SIZE], vec![3; 16]);
    let line = message.encode();
    let truncated = &line[2..];

    assert!(SecureMessage::decode(truncated).is_err());
}
