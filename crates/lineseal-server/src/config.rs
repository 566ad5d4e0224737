//! Server configuration.
//!
//! Runtime settings come from the command line; the identity table comes
//! from a TOML file:
//!
//! ```toml
//! [users]
//! alice = "pass123"
//! bob = "hunter2"
//! ```

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use lineseal_core::{KdfParams, TransportConfig, UserTable};
use serde::Deserialize;
use thiserror::Error;

/// Default listening address (all interfaces, port 9999).
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:9999";

/// Errors loading the users file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// File is not a valid users table
    #[error("cannot parse {path}: {source}")]
    Parse {
        /// File that was requested
        path: PathBuf,
        /// Underlying TOML error
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UsersFile {
    #[serde(default)]
    users: BTreeMap<String, String>,
}

/// Parse a users table from TOML text.
///
/// # Errors
///
/// Returns the TOML error if `text` is not a `[users]` table of strings.
pub fn parse_users(text: &str) -> Result<UserTable, toml::de::Error> {
    let file: UsersFile = toml::from_str(text)?;
    Ok(file.users.into_iter().collect())
}

/// Load the users table from `path`.
///
/// # Errors
///
/// - `ConfigError::Read` if the file cannot be read
/// - `ConfigError::Parse` if it is not a valid users table
pub fn load_users(path: &Path) -> Result<UserTable, ConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    parse_users(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

/// Server runtime configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (e.g., "0.0.0.0:9999")
    pub bind_address: String,
    /// Key derivation parameters; clients must use the same ones
    pub kdf: KdfParams,
    /// Per-connection line limits and read timeout
    pub transport: TransportConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            kdf: KdfParams::default(),
            transport: TransportConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use lineseal_core::IdentityLookup;

    use super::*;

    #[test]
    fn parses_users_table() {
        let users = parse_users(
            r#"
            [users]
            alice = "pass123"
            "bob smith" = ""
            "#,
        )
        .unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users.password_for("alice").as_deref().map(String::as_str), Some("pass123"));
        assert_eq!(users.password_for("bob smith").as_deref().map(String::as_str), Some(""));
    }

    #[test]
    fn missing_table_is_empty() {
        assert!(parse_users("").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_string_passwords() {
        assert!(parse_users("[users]\nalice = 123\n").is_err());
    }

    #[test]
    fn rejects_unknown_sections() {
        assert!(parse_users("[server]\nport = 9999\n").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[users]\nalice = \"pass123\"").unwrap();

        let users = load_users(file.path()).unwrap();
        assert!(users.password_for("alice").is_some());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_users(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn default_binds_port_9999() {
        assert_eq!(ServerConfig::default().bind_address, "0.0.0.0:9999");
    }
}
