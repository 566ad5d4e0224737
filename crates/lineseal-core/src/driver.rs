//! Handshake drivers.
//!
//! Run the [`ServerHandshake`] / [`ClientHandshake`] state machines against a
//! [`LineTransport`], executing their actions. PBKDF2 runs on tokio's
//! blocking pool.

use lineseal_crypto::{DerivedKey, KdfParams, derive_key};
use lineseal_proto::Identity;
use zeroize::Zeroizing;

use crate::{
    env::Environment,
    error::{HandshakeError, TransportError},
    handshake::{ClientHandshake, HandshakeAction, ServerHandshake},
    identity::IdentityLookup,
    session::{Role, Session},
    transport::LineTransport,
};

/// Authenticate a connecting client.
///
/// On success both sides hold the same key and the returned session is bound
/// to the client's identity.
///
/// # Errors
///
/// - `UnknownIdentity` after sending the rejection notice
/// - `Verification` if the client's proof is wrong; nothing further is sent
/// - `Malformed` if a handshake line cannot be parsed
/// - `ConnectionClosed` if the client hangs up early
/// - `Transport` / `Crypto` on I/O or key derivation failure
pub async fn run_handshake_as_server<T, L, E>(
    transport: &mut T,
    lookup: &L,
    env: E,
    params: &KdfParams,
) -> Result<Session<E>, HandshakeError>
where
    T: LineTransport + ?Sized,
    L: IdentityLookup + ?Sized,
    E: Environment,
{
    let mut handshake = ServerHandshake::new();

    let line = read_handshake_line(transport).await?;
    let credential = match handshake.accept_identity(&line, lookup) {
        Ok(credential) => credential,
        Err(err) => {
            if let Some(notice) = err.notice() {
                if let Err(e) = transport.write_line(notice).await {
                    tracing::debug!(error = %e, "failed to deliver rejection notice");
                }
            }
            return Err(err);
        },
    };
    tracing::debug!(identity = %credential.identity, "identity accepted, deriving key");

    let key = derive_key_blocking(credential.password, *params).await?;

    let actions = handshake.issue_nonce(key, &env)?;
    execute(transport, actions).await?;

    let line = read_handshake_line(transport).await?;
    let actions = handshake.handle_client_proof(&line)?;
    execute(transport, actions).await?;

    let (identity, key) = handshake.finish()?;
    tracing::info!(%identity, "client authenticated");

    Ok(Session::new(identity, Role::Server, key, env))
}

/// Authenticate to a server as `identity` with `password`.
///
/// # Errors
///
/// - `Rejected` if the server does not know `identity`
/// - `Verification` if the server's proof is wrong (it does not know the
///   password)
/// - `Malformed` if a handshake line cannot be parsed
/// - `ConnectionClosed` if the server hangs up early, which is also how a
///   server reports a wrong password
/// - `Transport` / `Crypto` on I/O or key derivation failure
pub async fn run_handshake_as_client<T, E>(
    transport: &mut T,
    identity: Identity,
    password: &str,
    env: E,
    params: &KdfParams,
) -> Result<Session<E>, HandshakeError>
where
    T: LineTransport + ?Sized,
    E: Environment,
{
    let mut handshake = ClientHandshake::new(identity);

    let actions = handshake.start()?;
    execute(transport, actions).await?;

    // Derive while the server looks up the identity and does the same
    let key = derive_key_blocking(Zeroizing::new(password.to_string()), *params).await?;

    let line = read_handshake_line(transport).await?;
    let actions = handshake.handle_server_nonce(&line, key, &env)?;
    execute(transport, actions).await?;

    let line = read_handshake_line(transport).await?;
    let actions = handshake.handle_server_proof(&line)?;
    execute(transport, actions).await?;

    let (identity, key) = handshake.finish()?;
    tracing::info!(%identity, "server authenticated");

    Ok(Session::new(identity, Role::Client, key, env))
}

async fn read_handshake_line<T>(transport: &mut T) -> Result<String, HandshakeError>
where
    T: LineTransport + ?Sized,
{
    transport.read_line().await?.ok_or(HandshakeError::ConnectionClosed)
}

async fn execute<T>(transport: &mut T, actions: Vec<HandshakeAction>) -> Result<(), TransportError>
where
    T: LineTransport + ?Sized,
{
    for action in actions {
        match action {
            HandshakeAction::Send(line) => transport.write_line(&line).await?,
            HandshakeAction::Complete => {},
        }
    }
    Ok(())
}

async fn derive_key_blocking(
    password: Zeroizing<String>,
    params: KdfParams,
) -> Result<DerivedKey, HandshakeError> {
    let key = tokio::task::spawn_blocking(move || derive_key(&password, &params))
        .await
        .map_err(|e| HandshakeError::Internal(format!("key derivation task failed: {e}")))??;
    Ok(key)
}
