//! Error types for route analysis.

use thiserror::Error;

/// Failure of the traceroute collaborator. Propagated to the caller unchanged.
#[derive(Error, Debug)]
pub enum ProbeFailure {
    #[error("Failed to resolve hostname {host}: {reason}")]
    Resolution { host: String, reason: String },

    #[error("No IPv4 address found for {0}")]
    NoUsableAddress(String),

    #[error("Failed to create socket: {0}")]
    SocketCreation(#[source] std::io::Error),

    #[error("Socket I/O failed while probing {host}:{port}: {source}")]
    Io {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("No hop answered while tracing {host}:{port}")]
    Unreachable { host: String, port: u16 },

    #[error("Probe task failed: {0}")]
    Task(String),
}

/// Outcome signals of a `discover` call other than normal completion.
#[derive(Error, Debug)]
pub enum DiscoverError {
    /// Discovery already executed for this target. Not a failure.
    #[error("Route analysis already ran for this target")]
    AlreadyRan,

    #[error(transparent)]
    Probe(#[from] ProbeFailure),

    #[error(transparent)]
    InvalidTarget(#[from] TargetError),
}

impl DiscoverError {
    /// Returns true for the run-once signal, which callers treat as "nothing to do".
    pub fn is_run_once(&self) -> bool {
        matches!(self, Self::AlreadyRan)
    }
}

/// Invalid target input.
#[derive(Error, Debug)]
pub enum TargetError {
    #[error("Invalid URL '{input}': {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("Invalid port: {0}")]
    InvalidPort(u16),
}

/// Invalid or unreadable settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Failed to write settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}
