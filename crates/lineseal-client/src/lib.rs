//! Lineseal word count client.
//!
//! Connects over TCP, authenticates with the shared password, then relays
//! sentences typed by the user and prints the server's encrypted replies.
//! The prompt loop is generic over its input and output so it runs the same
//! against a terminal or an in-memory buffer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod password;

pub use error::ClientError;
use lineseal_core::{
    KdfParams, LineStream, Session, SystemEnv, TransportConfig, run_handshake_as_client,
};
use lineseal_proto::Identity;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
};

/// Default server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default server port.
pub const DEFAULT_PORT: u16 = 9999;

/// Typing this (any case) ends the session.
pub const QUIT_COMMAND: &str = "quit";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server host name or address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Key derivation parameters; must match the server's
    pub kdf: KdfParams,
    /// Line limits and read timeout
    pub transport: TransportConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            kdf: KdfParams::default(),
            transport: TransportConfig::default(),
        }
    }
}

/// Authenticated connection to a server.
#[derive(Debug)]
pub struct Connection {
    transport: LineStream<TcpStream>,
    session: Session<SystemEnv>,
}

impl Connection {
    /// Connect to the server and run the client side of the handshake.
    ///
    /// # Errors
    ///
    /// - `Config` if the key parameters are invalid or the OS RNG is unusable
    /// - `Connect` if the server cannot be reached
    /// - `Handshake` if authentication fails in either direction
    pub async fn open(
        config: &ClientConfig,
        identity: Identity,
        password: &str,
    ) -> Result<Self, ClientError> {
        config.kdf.validate()?;
        let env = SystemEnv::probe()?;

        tracing::info!("Connecting to {} on port {}", config.host, config.port);
        let stream = TcpStream::connect((config.host.as_str(), config.port))
            .await
            .map_err(|e| ClientError::Connect(format!("{}:{}: {e}", config.host, config.port)))?;

        let mut transport = LineStream::with_config(stream, config.transport);
        let session =
            run_handshake_as_client(&mut transport, identity, password, env, &config.kdf).await?;

        Ok(Self { transport, session })
    }

    /// Encrypt and send one message.
    ///
    /// # Errors
    ///
    /// - `Session` if the connection broke
    pub async fn send(&mut self, plaintext: &str) -> Result<(), ClientError> {
        self.session.send(&mut self.transport, plaintext).await?;
        Ok(())
    }

    /// Receive and verify one message. `None` means the server hung up.
    ///
    /// # Errors
    ///
    /// - `Session` if the message is malformed or forged, or the connection
    ///   broke
    pub async fn receive(&mut self) -> Result<Option<String>, ClientError> {
        Ok(self.session.receive(&mut self.transport).await?)
    }

    /// Run the prompt loop until the user quits or the server hangs up.
    ///
    /// Each server message is printed, then one line is read from `input`
    /// and sent. A `quit` line or end of input ends the loop.
    ///
    /// # Errors
    ///
    /// - `Session` on a malformed or forged server message
    /// - `Io` if `input` or `output` fails
    pub async fn run_interactive<R, W>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<(), ClientError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        write_out(output, &format!("Type '{QUIT_COMMAND}' or Ctrl+C to exit\n")).await?;

        while let Some(message) = self.receive().await? {
            write_out(output, &format!("Server > {message}\n")).await?;
            write_out(output, "Client > sentence: ").await?;

            let Some(sentence) = read_input_line(input).await? else {
                return Ok(());
            };
            if sentence.trim().eq_ignore_ascii_case(QUIT_COMMAND) {
                write_out(output, "Bye :D\n").await?;
                return Ok(());
            }

            self.send(&sentence).await?;
        }

        tracing::info!("Server closed the connection");
        Ok(())
    }
}

/// Read one line from `input` without its terminator. `None` at end of input.
///
/// # Errors
///
/// Returns `Io` if reading fails or the line is not UTF-8.
pub async fn read_input_line<R>(input: &mut R) -> Result<Option<String>, ClientError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Ok(None);
    }

    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

/// Write `text` to `output` and flush.
///
/// # Errors
///
/// Returns `Io` if writing fails.
pub async fn write_out<W>(output: &mut W, text: &str) -> Result<(), ClientError>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn input_lines_lose_their_terminator() {
        let mut input: &[u8] = b"hello world\r\nsecond\nlast";

        assert_eq!(read_input_line(&mut input).await.unwrap().as_deref(), Some("hello world"));
        assert_eq!(read_input_line(&mut input).await.unwrap().as_deref(), Some("second"));
        assert_eq!(read_input_line(&mut input).await.unwrap().as_deref(), Some("last"));
        assert_eq!(read_input_line(&mut input).await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_out_appends_verbatim() {
        let mut output = Vec::new();
        write_out(&mut output, "Server > hi\n").await.unwrap();
        write_out(&mut output, "Client > ").await.unwrap();

        assert_eq!(output, b"Server > hi\nClient > ");
    }

    #[test]
    fn default_targets_local_server() {
        let config = ClientConfig::default();
        assert_eq!((config.host.as_str(), config.port), ("localhost", 9999));
        assert_eq!(config.kdf, KdfParams::default());
    }
}
