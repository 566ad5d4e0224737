//! Lineseal word count server.
//!
//! Production glue around [`lineseal_core`]: a Tokio TCP listener that runs
//! the server side of the handshake on every accepted connection, then
//! answers each encrypted message through a [`Service`].
//!
//! # Architecture
//!
//! One task per connection. Tasks share only the read-only identity table
//! and the service, both behind `Arc`. A failed connection is logged and
//! closed; the accept loop keeps running.
//!
//! # Components
//!
//! - [`Server`]: listener and accept loop
//! - [`Service`] / [`WordCountService`]: what an authenticated client talks to
//! - [`config`]: bind address, key parameters, users file

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod error;
mod service;

use std::{net::SocketAddr, sync::Arc};

pub use config::{ConfigError, ServerConfig, load_users, parse_users};
pub use error::ServerError;
use lineseal_core::{
    KdfParams, LineStream, SystemEnv, TransportConfig, UserTable, run_handshake_as_server,
};
pub use service::{Service, WordCountService, count};
use tokio::net::{TcpListener, TcpStream};

/// Production Lineseal server.
pub struct Server<S = WordCountService> {
    listener: TcpListener,
    users: Arc<UserTable>,
    service: Arc<S>,
    kdf: KdfParams,
    transport: TransportConfig,
    env: SystemEnv,
}

impl Server<WordCountService> {
    /// Create and bind a word count server.
    ///
    /// # Errors
    ///
    /// - `Config` if the key parameters are invalid or the OS RNG is unusable
    /// - `Transport` if the address cannot be bound
    pub async fn bind(config: ServerConfig, users: UserTable) -> Result<Self, ServerError> {
        Self::with_service(config, users, WordCountService).await
    }
}

impl<S: Service> Server<S> {
    /// Create and bind a server running `service` for authenticated clients.
    ///
    /// # Errors
    ///
    /// - `Config` if the key parameters are invalid or the OS RNG is unusable
    /// - `Transport` if the address cannot be bound
    pub async fn with_service(
        config: ServerConfig,
        users: UserTable,
        service: S,
    ) -> Result<Self, ServerError> {
        config.kdf.validate()?;
        let env = SystemEnv::probe()?;

        let listener = TcpListener::bind(&config.bind_address).await?;

        Ok(Self {
            listener,
            users: Arc::new(users),
            service: Arc::new(service),
            kdf: config.kdf,
            transport: config.transport,
            env,
        })
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the server, accepting connections until the task is cancelled.
    ///
    /// # Errors
    ///
    /// Never returns on its own; per-connection and accept failures are
    /// logged and skipped.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Server listening on {}", self.local_addr()?);

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    tracing::info!(%peer, "connection accepted");

                    let connection = Connection {
                        users: Arc::clone(&self.users),
                        service: Arc::clone(&self.service),
                        kdf: self.kdf,
                        transport: self.transport,
                        env: self.env,
                    };

                    tokio::spawn(async move {
                        match connection.handle(stream).await {
                            Ok(()) => tracing::info!(%peer, "disconnected"),
                            Err(e) if e.is_fatal() => {
                                tracing::error!(%peer, error = %e, "connection failed");
                            },
                            Err(e) if e.is_disconnect() => {
                                tracing::info!(%peer, error = %e, "client went away");
                            },
                            Err(e) => tracing::warn!(%peer, error = %e, "connection closed"),
                        }
                    });
                },
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                },
            }
        }
    }
}

/// Everything one connection task needs.
struct Connection<S> {
    users: Arc<UserTable>,
    service: Arc<S>,
    kdf: KdfParams,
    transport: TransportConfig,
    env: SystemEnv,
}

impl<S: Service> Connection<S> {
    async fn handle(self, stream: TcpStream) -> Result<(), ServerError> {
        let mut transport = LineStream::with_config(stream, self.transport);

        let session =
            run_handshake_as_server(&mut transport, self.users.as_ref(), self.env, &self.kdf)
                .await?;
        let identity = session.identity().clone();

        session.send(&mut transport, &self.service.greeting(&identity)).await?;

        while let Some(request) = session.receive(&mut transport).await? {
            tracing::debug!(%identity, len = request.len(), "request received");
            let reply = self.service.respond(&identity, &request);
            session.send(&mut transport, &reply).await?;
        }

        Ok(())
    }
}
