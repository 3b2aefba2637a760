//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when working with the SRPC protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame or field is too short to be valid.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length available.
        actual: usize,
    },

    /// Payload does not fit in a single frame.
    #[error("payload too long: maximum {max} bytes, got {actual}")]
    PayloadTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Length that was requested.
        actual: usize,
    },

    /// Unrecognised command id. The stream cannot be resynchronised after this.
    #[error("unknown command id: 0x{0:02X}")]
    UnknownCommand(u8),

    /// Unrecognised destination address mode.
    #[error("invalid address mode: {0}")]
    InvalidAddrMode(u8),

    /// A name does not fit in its length-prefixed field.
    #[error("name too long: {len} bytes, at most {max} fit")]
    NameTooLong {
        /// Length of the encoded name.
        len: usize,
        /// Room left in the frame.
        max: usize,
    },

    /// Invalid data in frame.
    #[error("invalid frame data: {0}")]
    InvalidData(String),

    /// UTF-8 decoding error.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
