//! ZigBee Gateway SRPC Protocol
//!
//! This crate provides types and utilities for talking to a ZigBee home
//! automation gateway over its SRPC link. SRPC is a small binary request /
//! response protocol carried over a single TCP stream.
//!
//! # Protocol Overview
//!
//! Every message on the link is a frame:
//!
//! ```text
//! +--------+--------+-------------------+
//! | cmd_id |  len   | payload[0..len]   |
//! +--------+--------+-------------------+
//! ```
//!
//! - **Commands** (client → gateway): `cmd_id` in `0x80..=0x95`
//! - **Responses and events** (gateway → client): `cmd_id` in `0x01..=0x0e`
//!
//! Multi-byte fields are little-endian. There is no checksum and no frame
//! delimiter: a reader that loses track of a frame boundary cannot recover.
//!
//! # Example
//!
//! ```rust,ignore
//! use srpc_protocol::{Command, Destination, FrameCodec};
//!
//! // Build a command
//! let cmd = Command::SetDeviceState {
//!     dest: Destination::network(0x1234, 1),
//!     on: true,
//! };
//! let frame = cmd.encode()?;
//!
//! // Parse whatever the gateway sent back
//! let mut codec = FrameCodec::new();
//! codec.push(&received_data);
//! while let Some(response) = codec.decode()? {
//!     println!("{:?}", response);
//! }
//! ```

mod commands;
mod constants;
mod error;
mod frame;
mod responses;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use responses::*;
pub use types::*;
