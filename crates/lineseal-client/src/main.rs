//! Lineseal client binary.
//!
//! # Usage
//!
//! ```bash
//! # Connect to localhost:9999, prompting for name and password
//! lineseal-client
//!
//! # Connect elsewhere as alice
//! lineseal-client --host wordcount.example --port 7000 --user alice
//! ```

use std::io::IsTerminal;

use clap::Parser;
use lineseal_client::{
    ClientConfig, ClientError, Connection, DEFAULT_HOST, DEFAULT_PORT, password::read_password,
    read_input_line, write_out,
};
use lineseal_core::{KdfParams, KeyMode, TransportConfig};
use lineseal_crypto::{DEFAULT_ITERATIONS, DEFAULT_KEY_BITS};
use lineseal_proto::Identity;
use tokio::io::{BufReader, stdin, stdout};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

/// Lineseal protocol client
#[derive(Parser, Debug)]
#[command(name = "lineseal-client")]
#[command(about = "Interactive client for the Lineseal word count server")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Identity to authenticate as (prompted if omitted)
    #[arg(short, long)]
    user: Option<String>,

    /// PBKDF2 iteration count (must match the server)
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: u32,

    /// Derived key length in bits: 128, 192 or 256 (must match the server)
    #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
    key_bits: u32,

    /// Derive separate encryption and MAC keys (must match the server)
    #[arg(long)]
    split_keys: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // Logs go to stderr so they never interleave with the prompt
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut input = BufReader::new(stdin());
    let mut output = stdout();

    let user = match args.user {
        Some(user) => user,
        None => {
            write_out(&mut output, "Please enter your name: ").await?;
            read_input_line(&mut input).await?.unwrap_or_default()
        },
    };
    let identity = Identity::parse(&user).map_err(ClientError::from)?;

    write_out(&mut output, "Please enter your password: ").await?;
    let password = if std::io::stdin().is_terminal() {
        let password = tokio::task::spawn_blocking(read_password)
            .await
            .map_err(|e| ClientError::Io(e.to_string()))??;
        write_out(&mut output, "\n").await?;
        password
    } else {
        Zeroizing::new(read_input_line(&mut input).await?.unwrap_or_default())
    };

    let mode = if args.split_keys { KeyMode::Split } else { KeyMode::Shared };
    let config = ClientConfig {
        host: args.host,
        port: args.port,
        kdf: KdfParams::new(args.iterations, args.key_bits).with_mode(mode),
        transport: TransportConfig::default(),
    };

    let mut connection = match Connection::open(&config, identity, &password).await {
        Ok(connection) => connection,
        Err(e) => {
            write_out(&mut output, "Connection terminated!\n").await?;
            return Err(e.into());
        },
    };

    connection.run_interactive(&mut input, &mut output).await?;

    Ok(())
}
