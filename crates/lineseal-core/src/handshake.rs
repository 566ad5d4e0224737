//! Mutual authentication handshake.
//!
//! Both sides prove knowledge of the shared password by returning the MAC of
//! a fresh nonce chosen by the other side. The password never crosses the
//! wire. Uses the action pattern: methods consume received lines and return
//! actions for the driver to execute, so the state machines do no I/O and
//! can be tested line by line.
//!
//! # Message Flow
//!
//! ```text
//! Client                                   Server
//!   │ identity                               │
//!   │───────────────────────────────────────>│ lookup password, derive key
//!   │                            serverNonce │
//!   │<───────────────────────────────────────│
//!   │ mac(serverNonce)|clientNonce           │
//!   │───────────────────────────────────────>│ verify
//!   │                        mac(clientNonce)│
//!   │<───────────────────────────────────────│
//! verify                                     │
//! ```
//!
//! # State Machine
//!
//! ```text
//! ┌───────┐         ┌─────────────────────┐
//! │ Start │────────>│ AwaitingServerNonce │
//! └───────┘         └─────────────────────┘
//!                     │ client         │ server
//!                     ↓                ↓
//!    ┌────────────────────────┐  ┌─────────────────────┐
//!    │ AwaitingServerNonceAck │  │ AwaitingClientProof │
//!    └────────────────────────┘  └─────────────────────┘
//!                     │                │
//!                     ↓                ↓
//!                   ┌───────────────────┐
//!                   │   Authenticated   │
//!                   └───────────────────┘
//! ```
//!
//! Any error moves the machine to `Failed`, which is terminal.

use lineseal_crypto::{DerivedKey, mac, verify_mac};
use lineseal_proto::{ClientProof, Identity, Nonce, ServerProof};
use zeroize::Zeroizing;

use crate::{
    env::Environment,
    error::{HandshakeError, VerificationStep},
    identity::IdentityLookup,
};

/// Actions returned by the handshake state machines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Send this line to the peer
    Send(String),

    /// Peer is authenticated; the session key may be taken
    Complete,
}

/// Handshake state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing sent or received yet
    Start,
    /// Identity exchanged, server nonce not yet delivered
    AwaitingServerNonce,
    /// Client proof sent, waiting for the server's proof (client only)
    AwaitingServerNonceAck,
    /// Server nonce sent, waiting for the client's proof (server only)
    AwaitingClientProof,
    /// Both proofs verified
    Authenticated,
    /// Handshake aborted
    Failed,
}

/// Identity accepted by the server, with the password to derive its key from.
#[derive(Debug)]
pub struct Credential {
    /// Identity the client announced
    pub identity: Identity,
    /// Shared password for that identity
    pub password: Zeroizing<String>,
}

/// Server side of the handshake.
#[derive(Debug)]
pub struct ServerHandshake {
    state: HandshakeState,
    identity: Option<Identity>,
    key: Option<DerivedKey>,
    server_nonce: Option<Nonce>,
}

impl Default for ServerHandshake {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerHandshake {
    /// Create a handshake in [`HandshakeState::Start`].
    pub fn new() -> Self {
        Self { state: HandshakeState::Start, identity: None, key: None, server_nonce: None }
    }

    /// Current state
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Process the client's identity line.
    ///
    /// Transitions to `AwaitingServerNonce` and returns the password the
    /// session key must be derived from. No nonce is generated here, so an
    /// unknown identity never costs the server any randomness.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if not in `Start`
    /// - `UnknownIdentity` if the line is not a valid identity or `lookup`
    ///   has no password for it; the caller should send
    ///   [`HandshakeError::notice`] before closing
    pub fn accept_identity<L: IdentityLookup + ?Sized>(
        &mut self,
        line: &str,
        lookup: &L,
    ) -> Result<Credential, HandshakeError> {
        self.expect_state(HandshakeState::Start, "accept_identity")?;

        // A name that cannot be parsed is just another name we don't know
        let Ok(identity) = Identity::parse(line) else {
            let identity = line.trim().to_string();
            return Err(self.fail(HandshakeError::UnknownIdentity { identity }));
        };
        let Some(password) = lookup.password_for(identity.as_str()) else {
            return Err(
                self.fail(HandshakeError::UnknownIdentity { identity: identity.to_string() })
            );
        };

        self.identity = Some(identity.clone());
        self.state = HandshakeState::AwaitingServerNonce;

        Ok(Credential { identity, password })
    }

    /// Install the derived key and issue the server nonce.
    ///
    /// Transitions to `AwaitingClientProof` and returns `Send(serverNonce)`.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if not in `AwaitingServerNonce`
    pub fn issue_nonce<E: Environment>(
        &mut self,
        key: DerivedKey,
        env: &E,
    ) -> Result<Vec<HandshakeAction>, HandshakeError> {
        self.expect_state(HandshakeState::AwaitingServerNonce, "issue_nonce")?;

        let nonce = env.random_nonce();
        let line = nonce.to_string();

        self.key = Some(key);
        self.server_nonce = Some(nonce);
        self.state = HandshakeState::AwaitingClientProof;

        Ok(vec![HandshakeAction::Send(line)])
    }

    /// Verify the client's proof and answer its nonce.
    ///
    /// Transitions to `Authenticated` and returns `Send(mac(clientNonce))`
    /// followed by `Complete`. On a mismatch nothing is sent.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if not in `AwaitingClientProof`
    /// - `Malformed` if the line is not `<hex-mac>|<nonce>`
    /// - `Verification` if the MAC of the server nonce does not match
    pub fn handle_client_proof(
        &mut self,
        line: &str,
    ) -> Result<Vec<HandshakeAction>, HandshakeError> {
        self.expect_state(HandshakeState::AwaitingClientProof, "handle_client_proof")?;

        let (Some(key), Some(server_nonce)) = (&self.key, &self.server_nonce) else {
            unreachable!("key and nonce are installed on entering AwaitingClientProof");
        };

        let proof = match ClientProof::decode(line) {
            Ok(proof) => proof,
            Err(e) => return Err(self.fail(e.into())),
        };

        if !verify_mac(key, server_nonce.as_str(), &proof.server_nonce_tag) {
            return Err(self.fail(HandshakeError::Verification {
                step: VerificationStep::ServerNonce,
            }));
        }

        let reply = ServerProof { client_nonce_tag: mac(key, proof.client_nonce.as_str()) };
        self.state = HandshakeState::Authenticated;

        Ok(vec![HandshakeAction::Send(reply.encode()), HandshakeAction::Complete])
    }

    /// Consume an authenticated handshake, yielding the peer and session key.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if not in `Authenticated`
    pub fn finish(mut self) -> Result<(Identity, DerivedKey), HandshakeError> {
        self.expect_state(HandshakeState::Authenticated, "finish")?;

        match (self.identity.take(), self.key.take()) {
            (Some(identity), Some(key)) => Ok((identity, key)),
            _ => unreachable!("identity and key are installed before Authenticated"),
        }
    }

    fn expect_state(
        &self,
        expected: HandshakeState,
        operation: &'static str,
    ) -> Result<(), HandshakeError> {
        if self.state != expected {
            return Err(HandshakeError::InvalidState { state: self.state, operation });
        }
        Ok(())
    }

    fn fail(&mut self, err: HandshakeError) -> HandshakeError {
        self.state = HandshakeState::Failed;
        self.key = None;
        err
    }
}

/// Client side of the handshake.
#[derive(Debug)]
pub struct ClientHandshake {
    state: HandshakeState,
    identity: Identity,
    key: Option<DerivedKey>,
    client_nonce: Option<Nonce>,
}

impl ClientHandshake {
    /// Create a handshake for `identity` in [`HandshakeState::Start`].
    pub fn new(identity: Identity) -> Self {
        Self { state: HandshakeState::Start, identity, key: None, client_nonce: None }
    }

    /// Current state
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Announce the identity.
    ///
    /// Transitions to `AwaitingServerNonce` and returns `Send(identity)`.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if not in `Start`
    pub fn start(&mut self) -> Result<Vec<HandshakeAction>, HandshakeError> {
        if self.state != HandshakeState::Start {
            return Err(HandshakeError::InvalidState { state: self.state, operation: "start" });
        }

        self.state = HandshakeState::AwaitingServerNonce;
        Ok(vec![HandshakeAction::Send(self.identity.to_string())])
    }

    /// Answer the server nonce with a proof and a fresh client nonce.
    ///
    /// `key` is the key derived from the client's password. Transitions to
    /// `AwaitingServerNonceAck` and returns `Send(mac(serverNonce)|clientNonce)`.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if not in `AwaitingServerNonce`
    /// - `Rejected` if the line is not a nonce (e.g. the unknown-identity
    ///   notice)
    pub fn handle_server_nonce<E: Environment>(
        &mut self,
        line: &str,
        key: DerivedKey,
        env: &E,
    ) -> Result<Vec<HandshakeAction>, HandshakeError> {
        if self.state != HandshakeState::AwaitingServerNonce {
            return Err(HandshakeError::InvalidState {
                state: self.state,
                operation: "handle_server_nonce",
            });
        }

        let Ok(server_nonce) = Nonce::parse(line.trim()) else {
            self.state = HandshakeState::Failed;
            return Err(HandshakeError::Rejected { notice: line.trim().to_string() });
        };

        let client_nonce = env.random_nonce();
        let proof =
            ClientProof { server_nonce_tag: mac(&key, server_nonce.as_str()), client_nonce };
        let line = proof.encode();

        self.key = Some(key);
        self.client_nonce = Some(proof.client_nonce);
        self.state = HandshakeState::AwaitingServerNonceAck;

        Ok(vec![HandshakeAction::Send(line)])
    }

    /// Verify the server's proof of the client nonce.
    ///
    /// Transitions to `Authenticated` and returns `Complete`.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if not in `AwaitingServerNonceAck`
    /// - `Malformed` if the line is not a hex MAC
    /// - `Verification` if the MAC of the client nonce does not match
    pub fn handle_server_proof(
        &mut self,
        line: &str,
    ) -> Result<Vec<HandshakeAction>, HandshakeError> {
        if self.state != HandshakeState::AwaitingServerNonceAck {
            return Err(HandshakeError::InvalidState {
                state: self.state,
                operation: "handle_server_proof",
            });
        }

        let (Some(key), Some(client_nonce)) = (&self.key, &self.client_nonce) else {
            unreachable!("key and nonce are installed on entering AwaitingServerNonceAck");
        };

        let verified = ServerProof::decode(line)
            .map(|proof| verify_mac(key, client_nonce.as_str(), &proof.client_nonce_tag));

        match verified {
            Ok(true) => {
                self.state = HandshakeState::Authenticated;
                Ok(vec![HandshakeAction::Complete])
            },
            Ok(false) => {
                self.state = HandshakeState::Failed;
                self.key = None;
                Err(HandshakeError::Verification { step: VerificationStep::ClientNonce })
            },
            Err(e) => {
                self.state = HandshakeState::Failed;
                self.key = None;
                Err(e.into())
            },
        }
    }

    /// Consume an authenticated handshake, yielding the session key.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if not in `Authenticated`
    pub fn finish(self) -> Result<(Identity, DerivedKey), HandshakeError> {
        match (self.state, self.key) {
            (HandshakeState::Authenticated, Some(key)) => Ok((self.identity, key)),
            (state, _) => Err(HandshakeError::InvalidState { state, operation: "finish" }),
        }
    }
}
