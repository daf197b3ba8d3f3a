//! Error types for btlock-core operations.
//!
//! One enum per failure domain. Resolution and monitor-start failures are fatal
//! to a run; lock failures are recovered by the cascade and never escape it.

use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════════
// Address & Configuration
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Hardware address is empty")]
    Empty,

    #[error("Hardware address {input:?} must have 6 octets, found {found}")]
    OctetCount { input: String, found: usize },

    #[error("Hardware address {input:?} has invalid octet {octet:?}")]
    InvalidOctet { input: String, octet: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No device address configured (use --address, BTLOCK_ADDRESS or the config file)")]
    MissingAddress,

    #[error("Invalid device address: {0}")]
    InvalidAddress(#[from] AddressError),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Resolution & Monitoring
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The device lister could not be run or exited unsuccessfully.
    #[error("Device lister {program} failed: {details}")]
    Lister { program: String, details: String },

    /// The lister ran but the address is not in its output.
    #[error("Device {address} not found (is it paired and powered on?)")]
    NotFound { address: String },
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Failed to start signal monitor {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Signal monitor {program} has no stdout pipe")]
    NoStdout { program: String },
}

// ═══════════════════════════════════════════════════════════════════════════════
// Lock Mechanisms
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}", exit_label(.code))]
    Exited { program: String, code: Option<i32> },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}
