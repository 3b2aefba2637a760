//! Error types for the gateway client.

use std::io;
use std::time::Duration;

use srpc_protocol::ProtocolError;
use thiserror::Error;

/// Errors surfaced to whoever owns the gateway connection.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway refused the connection or could not be reached.
    #[error("failed to connect to gateway at {addr}: {source}")]
    ConnectFailure {
        /// Address that was dialled.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The gateway did not accept the connection in time.
    #[error("timed out after {timeout:?} connecting to gateway at {addr}")]
    ConnectTimeout {
        /// Address that was dialled.
        addr: String,
        /// How long we waited.
        timeout: Duration,
    },

    /// The link is closed; nothing more can be sent or received.
    #[error("gateway connection closed")]
    StreamClosed,

    /// I/O error on an open link.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A frame could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// No device matches the given name or address.
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// No group matches the given name.
    #[error("unknown group: {0}")]
    UnknownGroup(String),

    /// The configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
