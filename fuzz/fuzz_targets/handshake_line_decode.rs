//! Fuzz target for handshake line parsers
//!
//! Every handshake line the server or client reads passes through one of
//! these parsers before any MAC is computed. None of them may panic, and a
//! parsed client proof must re-encode to a line that parses identically.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lineseal_proto::{ClientProof, Identity, Nonce, ServerProof};

fuzz_target!(|line: &str| {
    let _ = Identity::parse(line);
    let _ = Nonce::parse(line);
    let _ = ServerProof::decode(line);

    if let Ok(proof) = ClientProof::decode(line) {
        assert_eq!(ClientProof::decode(&proof.encode()), Ok(proof));
    }
});
