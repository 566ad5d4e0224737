//! Lineseal server binary.
//!
//! # Usage
//!
//! ```bash
//! # Serve the identities in users.toml on the default port
//! lineseal-server --users users.toml
//!
//! # Independent encryption and MAC keys, 30 second read timeout
//! lineseal-server --users users.toml --split-keys --read-timeout-secs 30
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use lineseal_core::{KdfParams, KeyMode, TransportConfig};
use lineseal_crypto::{DEFAULT_ITERATIONS, DEFAULT_KEY_BITS};
use lineseal_proto::MAX_LINE_LENGTH;
use lineseal_server::{Server, ServerConfig, config::DEFAULT_BIND_ADDRESS, load_users};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Lineseal protocol server
#[derive(Parser, Debug)]
#[command(name = "lineseal-server")]
#[command(about = "Password-authenticated word count server")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = DEFAULT_BIND_ADDRESS)]
    bind: String,

    /// Path to the users file (TOML `[users]` table of name = "password")
    #[arg(short, long)]
    users: PathBuf,

    /// Close connections that send nothing for this many seconds
    #[arg(long)]
    read_timeout_secs: Option<u64>,

    /// PBKDF2 iteration count (must match clients)
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: u32,

    /// Derived key length in bits: 128, 192 or 256 (must match clients)
    #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
    key_bits: u32,

    /// Derive separate encryption and MAC keys (must match clients)
    #[arg(long)]
    split_keys: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Lineseal server starting");
    tracing::info!("Binding to {}", args.bind);

    tracing::warn!("Connections are not wrapped in TLS - identities and nonces travel in the clear");

    let users = load_users(&args.users)?;
    if users.is_empty() {
        tracing::warn!("No users configured in {} - every client will be rejected", args.users.display());
    }
    tracing::info!("Loaded {} users", users.len());

    let mode = if args.split_keys { KeyMode::Split } else { KeyMode::Shared };
    let config = ServerConfig {
        bind_address: args.bind,
        kdf: KdfParams::new(args.iterations, args.key_bits).with_mode(mode),
        transport: TransportConfig {
            max_line_length: MAX_LINE_LENGTH,
            read_timeout: args.read_timeout_secs.map(Duration::from_secs),
        },
    };

    let server = Server::bind(config, users).await?;

    server.run().await?;

    Ok(())
}
