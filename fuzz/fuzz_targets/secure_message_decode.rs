//! Fuzz target for SecureMessage::decode
//!
//! Feeds arbitrary text to the application message parser to find:
//! - Panics on missing or extra separators
//! - Hex/base64 fields that slip past length validation
//! - Lines that decode but do not re-encode to an equivalent message
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lineseal_proto::SecureMessage;

fuzz_target!(|line: &str| {
    if let Ok(message) = SecureMessage::decode(line) {
        // Anything accepted must survive a round trip through the encoder
        let reencoded = message.encode();
        assert_eq!(SecureMessage::decode(&reencoded), Ok(message));
    }
});
