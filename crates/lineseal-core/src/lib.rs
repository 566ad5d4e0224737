//! Lineseal protocol core.
//!
//! Mutual password authentication and the secure session that follows it.
//!
//! # Layers
//!
//! - [`handshake`]: pure state machines for both sides of the handshake
//! - [`driver`]: runs those machines over a [`LineTransport`]
//! - [`session`]: encrypts and verifies application lines once authenticated
//! - [`transport`]: line framing over any tokio byte stream
//! - [`env`]: randomness, injectable for deterministic tests
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use lineseal_core::{KdfParams, LineStream, SystemEnv, run_handshake_as_client};
//! use lineseal_proto::Identity;
//!
//! let socket = tokio::net::TcpStream::connect("localhost:9999").await?;
//! let mut transport = LineStream::new(socket);
//! let identity = Identity::parse("alice")?;
//!
//! let session = run_handshake_as_client(
//!     &mut transport,
//!     identity,
//!     "pass123",
//!     SystemEnv::probe()?,
//!     &KdfParams::default(),
//! )
//! .await?;
//!
//! session.send(&mut transport, "hello world").await?;
//! let reply = session.receive(&mut transport).await?;
//! # let _ = reply;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod driver;
pub mod env;
pub mod error;
pub mod handshake;
pub mod identity;
pub mod session;
pub mod transport;

pub use driver::{run_handshake_as_client, run_handshake_as_server};
pub use env::{Environment, SystemEnv};
pub use error::{HandshakeError, SessionError, TransportError, VerificationStep};
pub use handshake::{
    ClientHandshake, Credential, HandshakeAction, HandshakeState, ServerHandshake,
};
pub use identity::{IdentityLookup, UserTable};
pub use lineseal_crypto::{KdfParams, KeyMode};
pub use session::{Role, SecureChannel, Session};
pub use transport::{LineStream, LineTransport, TransportConfig};
