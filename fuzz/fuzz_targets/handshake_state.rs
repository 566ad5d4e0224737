//! Fuzz target for the server handshake state machine
//!
//! Drives `ServerHandshake` with an arbitrary identity line and client
//! proof line.
//!
//! # Invariants
//!
//! - Never panics on any input
//! - Unknown or malformed identities never reach `AwaitingClientProof`
//! - A client that does not know the password never authenticates
//! - Every failure leaves the machine in `Failed`

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lineseal_core::{HandshakeState, ServerHandshake, SystemEnv, UserTable};
use lineseal_crypto::{KdfParams, derive_key};

#[derive(Debug, Arbitrary)]
struct Input {
    identity_line: String,
    proof_line: String,
}

fuzz_target!(|input: Input| {
    let users = UserTable::new().with_user("alice", "pass123");
    let mut server = ServerHandshake::new();

    let Ok(credential) = server.accept_identity(&input.identity_line, &users) else {
        assert_eq!(server.state(), HandshakeState::Failed);
        return;
    };
    assert_eq!(credential.identity.as_str(), "alice");

    let Ok(key) = derive_key(&credential.password, &KdfParams::new(1, 128)) else {
        return;
    };
    let Ok(_) = server.issue_nonce(key, &SystemEnv::new()) else {
        panic!("nonce issued from AwaitingServerNonce");
    };

    // The nonce is fresh, so a proof chosen before seeing it cannot match
    assert!(server.handle_client_proof(&input.proof_line).is_err());
    assert_eq!(server.state(), HandshakeState::Failed);
});
