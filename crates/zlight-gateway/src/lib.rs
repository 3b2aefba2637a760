//! ZigBee lighting gateway client.
//!
//! This crate talks to a home gateway over its SRPC link and keeps a live
//! catalog of the devices, groups and scenes behind it.
//!
//! ## Architecture
//!
//! - [`transport`] dials the gateway (bounded connect, no retry).
//! - [`receiver`] runs one task per connection that reads the stream,
//!   reassembles frames and applies them to the [`Registry`] in order.
//! - [`CommandSender`] encodes and writes commands; it never waits for an
//!   answer.
//! - [`Registry`] is the shared catalog. Readers get snapshots.
//! - [`Notifications`] is a best-effort queue of user-visible events.
//! - [`Gateway`] owns all of the above for one connection.
//!
//! ## Example
//!
//! ```rust,ignore
//! use zlight_gateway::{Gateway, GatewayConfig, Target};
//!
//! let gateway = Gateway::connect(GatewayConfig::new("192.168.1.220")).await?;
//! for device in gateway.registry().switchable() {
//!     gateway.set_state(Target::from(&device), true).await?;
//! }
//! gateway.close().await?;
//! ```

pub mod attributes;
pub mod catalog;
pub mod config;
pub mod device;
pub mod error;
pub mod group;
pub mod notify;
pub mod receiver;
pub mod registry;
pub mod sender;
pub mod session;
pub mod transport;

pub use attributes::{AttributeReport, ResponseStatus};
pub use config::{AttributeWait, GatewayConfig, UnknownFramePolicy};
pub use device::{Capabilities, Device, DeviceAddress, Freshness};
pub use error::{GatewayError, GatewayResult};
pub use group::{EntryStatus, Group, Scene};
pub use notify::{Notification, NotificationSink, Notifications};
pub use receiver::LinkStatus;
pub use registry::{Announce, Registry};
pub use sender::{CommandSender, Target};
pub use session::Gateway;

pub use srpc_protocol;
