//! Authenticated sessions.
//!
//! A [`Session`] only exists after a successful handshake. It owns the
//! derived key and protects every application line with it.

use lineseal_crypto::{CryptoError, DerivedKey, SecureMessage, decrypt, encrypt, mac_hex};
use lineseal_proto::Identity;

use crate::{env::Environment, error::SessionError, transport::LineTransport};

/// Which end of the connection a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Accepted the connection
    Server,
    /// Initiated the connection
    Client,
}

/// Derived key bound to a randomness source.
///
/// Every [`SecureChannel::encrypt`] draws a fresh IV from the environment.
#[derive(Debug, Clone)]
pub struct SecureChannel<E> {
    key: DerivedKey,
    env: E,
}

impl<E: Environment> SecureChannel<E> {
    /// Bind `key` to `env`.
    pub fn new(key: DerivedKey, env: E) -> Self {
        Self { key, env }
    }

    /// Encrypt and tag `plaintext` under a fresh IV.
    pub fn encrypt(&self, plaintext: &str) -> SecureMessage {
        encrypt(&self.key, plaintext, self.env.random_iv())
    }

    /// Decrypt `message` and verify its tag.
    ///
    /// # Errors
    ///
    /// - `CryptoError::Integrity` if the message was corrupted, forged or
    ///   protected under another key
    pub fn decrypt(&self, message: &SecureMessage) -> Result<String, CryptoError> {
        decrypt(&self.key, message)
    }

    /// Hex MAC of `text` under the channel key.
    pub fn mac(&self, text: &str) -> String {
        mac_hex(&self.key, text)
    }
}

/// Authenticated, encrypted conversation with one peer.
#[derive(Debug)]
pub struct Session<E> {
    identity: Identity,
    role: Role,
    channel: SecureChannel<E>,
}

impl<E: Environment> Session<E> {
    pub(crate) fn new(identity: Identity, role: Role, key: DerivedKey, env: E) -> Self {
        Self { identity, role, channel: SecureChannel::new(key, env) }
    }

    /// Identity that authenticated (the peer's for servers, our own for
    /// clients).
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Our end of the connection.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Channel protecting this session.
    pub fn channel(&self) -> &SecureChannel<E> {
        &self.channel
    }

    /// Encrypt `plaintext` and write it as one line.
    ///
    /// # Errors
    ///
    /// - `Transport` if the line could not be written
    pub async fn send<T>(&self, transport: &mut T, plaintext: &str) -> Result<(), SessionError>
    where
        T: LineTransport + ?Sized,
    {
        let line = self.channel.encrypt(plaintext).encode();
        tracing::trace!(identity = %self.identity, bytes = line.len(), "sending message");
        transport.write_line(&line).await?;
        Ok(())
    }

    /// Read one line and return its verified plaintext.
    ///
    /// Returns `Ok(None)` when the peer has closed the connection.
    ///
    /// # Errors
    ///
    /// - `Transport` if the line could not be read
    /// - `Malformed` if the line is not `<hex-tag>|<base64-iv>|<base64-ciphertext>`
    /// - `Integrity` if the message fails decryption or verification
    pub async fn receive<T>(&self, transport: &mut T) -> Result<Option<String>, SessionError>
    where
        T: LineTransport + ?Sized,
    {
        let Some(line) = transport.read_line().await? else {
            return Ok(None);
        };

        tracing::trace!(identity = %self.identity, bytes = line.len(), "received message");
        let message = SecureMessage::decode(&line)?;
        let plaintext = self.channel.decrypt(&message)?;
        Ok(Some(plaintext))
    }
}

#[cfg(test)]
mod tests {
    use lineseal_crypto::{KdfParams, derive_key};
    use tokio::io::duplex;

    use super::*;
    use crate::{env::SystemEnv, transport::LineStream};

    fn session(role: Role) -> Session<SystemEnv> {
        let key = derive_key("pass123", &KdfParams::new(1000, 192)).unwrap();
        Session::new(Identity::parse("alice").unwrap(), role, key, SystemEnv::new())
    }

    #[test]
    fn channel_uses_fresh_ivs() {
        let session = session(Role::Client);
        let first = session.channel().encrypt("hello");
        let second = session.channel().encrypt("hello");

        assert_ne!(first.iv, second.iv);
        assert_eq!(session.channel().decrypt(&first).unwrap(), "hello");
        assert_eq!(session.channel().decrypt(&second).unwrap(), "hello");
    }

    #[test]
    fn channel_mac_matches_handshake_mac() {
        let key = derive_key("pass123", &KdfParams::new(1000, 192)).unwrap();
        let expected = lineseal_crypto::mac_hex(&key, "abc");
        let channel = SecureChannel::new(key, SystemEnv::new());

        assert_eq!(channel.mac("abc"), expected);
        assert_eq!(channel.mac("abc"), channel.mac("abc"));
        assert_ne!(channel.mac("abc"), channel.mac("abd"));
    }

    #[tokio::test]
    async fn send_then_receive() {
        let (a, b) = duplex(4096);
        let mut client_side = LineStream::new(a);
        let mut server_side = LineStream::new(b);
        let client = session(Role::Client);
        let server = session(Role::Server);

        client.send(&mut client_side, "hello world").await.unwrap();
        client.send(&mut client_side, "").await.unwrap();

        assert_eq!(server.receive(&mut server_side).await.unwrap().as_deref(), Some("hello world"));
        assert_eq!(server.receive(&mut server_side).await.unwrap().as_deref(), Some(""));

        drop(client_side);
        assert_eq!(server.receive(&mut server_side).await.unwrap(), None);
    }

    #[tokio::test]
    async fn garbage_line_is_malformed() {
        let (a, b) = duplex(4096);
        let mut raw = LineStream::new(a);
        let mut server_side = LineStream::new(b);
        let server = session(Role::Server);

        raw.write_line("not a message").await.unwrap();

        let err = server.receive(&mut server_side).await.unwrap_err();
        assert!(matches!(err, SessionError::Malformed(_)));
    }

    #[tokio::test]
    async fn message_under_other_key_fails_integrity() {
        let (a, b) = duplex(4096);
        let mut raw = LineStream::new(a);
        let mut server_side = LineStream::new(b);
        let server = session(Role::Server);

        let other = derive_key("other", &KdfParams::new(1000, 192)).unwrap();
        let forged = lineseal_crypto::encrypt(&other, "hi", [7; 16]);
        raw.write_line(&forged.encode()).await.unwrap();

        let err = server.receive(&mut server_side).await.unwrap_err();
        assert!(matches!(err, SessionError::Integrity(CryptoError::Integrity { .. })));
    }
}
