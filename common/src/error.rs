//! Typed failures shared by every seekr crate.
//!
//! None of these ever reach a discovery listener directly: probe failures
//! collapse to "not alive", and network or store failures resolve to one of the
//! two terminal callbacks.

use std::path::PathBuf;

use thiserror::Error;

/// Why a single liveness probe could not confirm the target.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No connection or response within the probe deadline.
    #[error("probe to {address} timed out")]
    Timeout { address: String },

    /// The host could not be resolved or refused the connection.
    #[error("{address} is unreachable: {reason}")]
    Unreachable { address: String, reason: String },

    /// The connection was made but the exchange failed midway.
    #[error("i/o failure while probing {address}: {reason}")]
    Io { address: String, reason: String },
}

impl ProbeError {
    /// Short label used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Timeout { .. } => "timeout",
            ProbeError::Unreachable { .. } => "unreachable",
            ProbeError::Io { .. } => "io",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// No usable interface carries a private IPv4 address.
    #[error("no local IPv4 network is available")]
    NoLocalNetwork,
}

/// Failures of the persistent key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error accessing store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse store TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize store: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("address is longer than 253 bytes")]
    TooLong,

    #[error("invalid IPv4 address: {0}")]
    InvalidIpv4(String),

    #[error("invalid hostname label '{label}' in {address}")]
    InvalidLabel { address: String, label: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
