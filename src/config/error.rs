//! Errors from reading and checking `PRODO_*` settings.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// `PRODO_PORT` parsed but is 0.
    #[error("invalid port '{value}': must be between 1 and 65535")]
    InvalidPort { value: String },

    #[error("PRODO_PORT '{value}' is not a number: {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("PRODO_BIND_ADDR '{value}' is not an IP address: {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A numeric setting is out of range, or two settings conflict.
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    /// The model directory is missing.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// A model, data or cache path exists but is a file.
    #[error("expected a directory: {path}")]
    NotADirectory { path: PathBuf },
}
