//! Receive loop: bytes from the gateway in, registry updates out.
//!
//! Frames are applied one at a time in arrival order. A read may end in the
//! middle of a frame; the tail stays in the codec until the rest arrives.

use std::sync::Arc;

use srpc_protocol::{FrameCodec, ProtocolError, Response};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::config::UnknownFramePolicy;
use crate::notify::Notification;
use crate::registry::Registry;

/// Size of each socket read.
const READ_CHUNK: usize = 1024;

/// Why the receive loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// We closed the link.
    ClosedLocally,
    /// The gateway closed the link.
    ClosedByPeer,
    /// A read failed.
    IoError(String),
    /// The stream can no longer be decoded.
    ProtocolError(ProtocolError),
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkStatus::ClosedLocally => write!(f, "closed"),
            LinkStatus::ClosedByPeer => write!(f, "closed by gateway"),
            LinkStatus::IoError(e) => write!(f, "I/O error: {}", e),
            LinkStatus::ProtocolError(e) => write!(f, "protocol error: {}", e),
        }
    }
}

/// Apply one decoded frame to the registry.
pub fn dispatch(registry: &Registry, response: Response) {
    match response {
        Response::NewDevice(ann) => {
            registry.announce_device(&ann);
        }
        Response::Attribute(value) => {
            registry.record_attribute(&value);
        }
        Response::GroupAdded(group) => {
            registry.confirm_group(group.group_id, &group.name);
        }
        Response::GroupListed(group) => registry.upsert_group(group.group_id, &group.name),
        Response::SceneAdded(scene) => {
            registry.confirm_scene(scene.group_id, scene.scene_id, &scene.name);
        }
        Response::SceneListed(scene) => {
            registry.upsert_scene(scene.group_id, scene.scene_id, &scene.name)
        }
        Response::Unhandled { cmd_id, payload } => {
            trace!("ignoring frame 0x{:02x} ({} bytes)", cmd_id, payload.len());
        }
    }
}

/// Decode everything buffered in `codec`.
///
/// Returns `Err` only when the stream has to be abandoned.
fn drain_codec(
    codec: &mut FrameCodec,
    registry: &Registry,
    policy: UnknownFramePolicy,
) -> Result<(), ProtocolError> {
    loop {
        match codec.decode() {
            Ok(Some(response)) => dispatch(registry, response),
            Ok(None) => return Ok(()),
            Err(ProtocolError::UnknownCommand(id)) => match policy {
                UnknownFramePolicy::Disconnect => {
                    return Err(ProtocolError::UnknownCommand(id));
                }
                UnknownFramePolicy::DiscardBuffer => {
                    let bytes = codec.buffered_len();
                    warn!(
                        "unknown command id 0x{:02x}, discarding {} buffered bytes",
                        id, bytes
                    );
                    codec.clear();
                    registry.notify(Notification::FramesDiscarded { cmd_id: id, bytes });
                    return Ok(());
                }
            },
            Err(e) => {
                // The codec has already stepped over the frame.
                warn!("dropping malformed frame: {}", e);
            }
        }
    }
}

/// Read from `reader` until it closes, fails, or `shutdown` fires.
///
/// On exit the registry is marked closed, which releases every attribute
/// waiter, and the loss is reported unless we closed the link ourselves.
pub async fn run_receive_loop<R>(
    mut reader: R,
    registry: Arc<Registry>,
    policy: UnknownFramePolicy,
    mut shutdown: watch::Receiver<bool>,
) -> LinkStatus
where
    R: AsyncRead + Unpin,
{
    let mut codec = FrameCodec::new();
    let mut buf = [0u8; READ_CHUNK];

    let status = loop {
        let n = tokio::select! {
            _ = shutdown.changed() => break LinkStatus::ClosedLocally,
            result = reader.read(&mut buf) => match result {
                Ok(0) if *shutdown.borrow() => break LinkStatus::ClosedLocally,
                Ok(0) => break LinkStatus::ClosedByPeer,
                Ok(n) => n,
                Err(e) => break LinkStatus::IoError(e.to_string()),
            },
        };

        trace!("read {} bytes", n);
        codec.push(&buf[..n]);

        if let Err(e) = drain_codec(&mut codec, &registry, policy) {
            break LinkStatus::ProtocolError(e);
        }
    };

    debug!("receive loop stopped: {}", status);
    registry.mark_closed();
    if status != LinkStatus::ClosedLocally {
        registry.notify(Notification::ConnectionLost {
            reason: status.to_string(),
        });
    }
    status
}
