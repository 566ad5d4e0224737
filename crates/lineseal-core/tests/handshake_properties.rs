//! Property-based tests for the handshake state machines
//!
//! Drives both machines line by line with no transport:
//!
//! 1. **Agreement**: matching passwords always authenticate both sides with
//!    the same key
//! 2. **Rejection**: differing passwords never authenticate the server

use lineseal_core::{
    ClientHandshake, HandshakeAction, HandshakeError, HandshakeState, ServerHandshake, SystemEnv,
    UserTable,
};
use lineseal_crypto::{DerivedKey, KdfParams, derive_key};
use lineseal_proto::Identity;
use proptest::prelude::*;

fn key(password: &str) -> DerivedKey {
    derive_key(password, &KdfParams::new(200, 128)).unwrap()
}

fn line(actions: &[HandshakeAction]) -> String {
    match actions.first() {
        Some(HandshakeAction::Send(line)) => line.clone(),
        other => panic!("expected Send, got {other:?}"),
    }
}

/// Runs the exchange up to the server's verdict on the client proof.
fn exchange(
    identity: &str,
    server_password: &str,
    client_password: &str,
) -> (ClientHandshake, ServerHandshake, Result<Vec<HandshakeAction>, HandshakeError>) {
    let env = SystemEnv::new();
    let users = UserTable::new().with_user(identity, server_password);
    let mut client = ClientHandshake::new(Identity::parse(identity).unwrap());
    let mut server = ServerHandshake::new();

    let announced = line(&client.start().unwrap());
    let credential = server.accept_identity(&announced, &users).unwrap();
    let nonce = line(&server.issue_nonce(key(&credential.password), &env).unwrap());
    let proof = line(&client.handle_server_nonce(&nonce, key(client_password), &env).unwrap());
    let verdict = server.handle_client_proof(&proof);

    (client, server, verdict)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_matching_passwords_agree(
        identity in "[a-z][a-z0-9_]{0,15}",
        password in ".{0,24}",
    ) {
        let (mut client, server, verdict) = exchange(&identity, &password, &password);

        let actions = verdict.unwrap();
        prop_assert_eq!(server.state(), HandshakeState::Authenticated);

        client.handle_server_proof(&line(&actions)).unwrap();
        prop_assert_eq!(client.state(), HandshakeState::Authenticated);

        let (_, client_key) = client.finish().unwrap();
        let (server_identity, server_key) = server.finish().unwrap();
        prop_assert_eq!(server_identity.as_str(), identity.as_str());
        prop_assert_eq!(client_key, server_key);
    }

    #[test]
    fn prop_different_passwords_are_rejected(
        identity in "[a-z][a-z0-9_]{0,15}",
        server_password in ".{0,24}",
        client_password in ".{0,24}",
    ) {
        prop_assume!(server_password != client_password);

        let (_, server, verdict) = exchange(&identity, &server_password, &client_password);

        let is_verification_failure = matches!(verdict, Err(HandshakeError::Verification { .. }));
        prop_assert!(is_verification_failure);
        prop_assert_eq!(server.state(), HandshakeState::Failed);
    }
}
