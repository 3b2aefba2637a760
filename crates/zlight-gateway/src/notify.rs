//! Best-effort queue of user-visible events.
//!
//! Events are delivered in the order they were raised. Nobody is obliged to
//! listen: if the receiving side has gone away, events are dropped.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::device::DeviceAddress;

/// A transient event worth showing to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A device was added or replaced.
    NewDevice {
        /// Display name of the device.
        name: String,
        /// Its address.
        address: DeviceAddress,
    },
    /// The gateway confirmed or listed a group.
    GroupActive {
        /// Group id.
        id: u16,
        /// Group name.
        name: String,
    },
    /// The gateway confirmed or listed a scene.
    SceneActive {
        /// Owning group.
        group_id: u16,
        /// Scene id.
        scene_id: u8,
        /// Scene name.
        name: String,
    },
    /// Some queried attributes did not arrive in time.
    NotFullyResponding {
        /// Display name of the device.
        name: String,
    },
    /// Bytes were thrown away after a frame with an unknown command id.
    FramesDiscarded {
        /// The unknown id.
        cmd_id: u8,
        /// How many buffered bytes were dropped.
        bytes: usize,
    },
    /// The link to the gateway went away.
    ConnectionLost {
        /// Why, in words.
        reason: String,
    },
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::NewDevice { name, .. } => write!(f, "New Device:\n{}", name),
            Notification::GroupActive { id, name } => write!(f, "Group {} ({})", name, id),
            Notification::SceneActive {
                group_id,
                scene_id,
                name,
            } => write!(f, "Scene {} ({}/{})", name, group_id, scene_id),
            Notification::NotFullyResponding { name } => {
                write!(f, "{} is not fully responding", name)
            }
            Notification::FramesDiscarded { cmd_id, bytes } => write!(
                f,
                "Discarded {} bytes after unknown command 0x{:02x}",
                bytes, cmd_id
            ),
            Notification::ConnectionLost { reason } => write!(f, "Connection lost: {}", reason),
        }
    }
}

/// Sending half of the notification queue.
#[derive(Debug, Clone)]
pub struct NotificationSink {
    tx: Sender<Notification>,
}

impl NotificationSink {
    /// Raise an event. Never blocks, never fails.
    pub fn notify(&self, notification: Notification) {
        tracing::debug!("notification: {:?}", notification);
        let _ = self.tx.send(notification);
    }
}

/// Receiving half of the notification queue.
#[derive(Debug, Clone)]
pub struct Notifications {
    rx: Receiver<Notification>,
}

impl Notifications {
    /// Next pending event, if any.
    pub fn try_next(&self) -> Option<Notification> {
        match self.rx.try_recv() {
            Ok(n) => Some(n),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Everything queued right now, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.rx.try_iter().collect()
    }

    /// Wait up to `timeout` for the next event.
    pub fn next_timeout(&self, timeout: std::time::Duration) -> Option<Notification> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// The underlying channel, for use with `crossbeam_channel::select!`.
    pub fn receiver(&self) -> &Receiver<Notification> {
        &self.rx
    }
}

/// Create a connected sink and receiver.
pub fn channel() -> (NotificationSink, Notifications) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (NotificationSink { tx }, Notifications { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_preserved() {
        let (sink, notes) = channel();
        for i in 0..3 {
            sink.notify(Notification::GroupActive {
                id: i,
                name: format!("g{}", i),
            });
        }
        let ids: Vec<u16> = notes
            .drain()
            .into_iter()
            .map(|n| match n {
                Notification::GroupActive { id, .. } => id,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(notes.try_next(), None);
    }

    #[test]
    fn test_sink_survives_dropped_receiver() {
        let (sink, notes) = channel();
        drop(notes);
        sink.notify(Notification::ConnectionLost {
            reason: "test".to_string(),
        });
    }

    #[test]
    fn test_new_device_text() {
        let n = Notification::NewDevice {
            name: "1: Light".to_string(),
            address: DeviceAddress::new(0x1234, 1),
        };
        assert_eq!(n.to_string(), "New Device:\n1: Light");
    }
}
