//! Outgoing commands.
//!
//! The sender never waits for an answer. Whatever the gateway sends back is
//! applied to the registry by the receive loop.

use std::sync::Arc;

use srpc_protocol::{
    AttributeKind, Command, Destination, IeeeAddress, BROADCAST_ENDPOINT, UNASSIGNED_NWK_ADDR,
};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::device::{Device, DeviceAddress};
use crate::error::{GatewayError, GatewayResult};
use crate::group::Group;

/// Highest saturation the colour cluster accepts.
pub const MAX_SATURATION: u8 = 254;

/// Who a state, level or colour change is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// One device endpoint.
    Device(DeviceAddress),
    /// Every member of a group.
    Group(u16),
}

impl Target {
    /// Wire destination. Groups always use group addressing and the
    /// broadcast endpoint; devices use their network address and endpoint.
    pub fn destination(&self) -> Destination {
        match self {
            Target::Device(addr) => Destination::network(addr.nwk_addr, addr.endpoint),
            Target::Group(id) => Destination::group(*id),
        }
    }
}

impl From<&Device> for Target {
    fn from(device: &Device) -> Self {
        Target::Device(device.address)
    }
}

impl From<&Group> for Target {
    fn from(group: &Group) -> Self {
        Target::Group(group.id)
    }
}

type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Cloneable handle for writing commands to the gateway.
#[derive(Clone)]
pub struct CommandSender {
    writer: Arc<Mutex<Option<Writer>>>,
    transition_time: u16,
}

impl std::fmt::Debug for CommandSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSender")
            .field("transition_time", &self.transition_time)
            .finish_non_exhaustive()
    }
}

impl CommandSender {
    /// Wrap the write side of a link.
    pub fn new<W>(writer: W, transition_time: u16) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        CommandSender {
            writer: Arc::new(Mutex::new(Some(Box::new(writer)))),
            transition_time,
        }
    }

    /// Transition time used for level and colour changes.
    pub fn transition_time(&self) -> u16 {
        self.transition_time
    }

    /// Encode and write one command. Concurrent callers are serialised so
    /// frames never interleave.
    pub async fn send(&self, command: &Command) -> GatewayResult<()> {
        let frame = command.encode()?;
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(GatewayError::StreamClosed)?;
        trace!("send {:?} ({} bytes)", command, frame.len());
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Send close, then shut the write side. Later sends fail with
    /// [`GatewayError::StreamClosed`].
    pub async fn close(&self) -> GatewayResult<()> {
        let mut guard = self.writer.lock().await;
        let Some(mut writer) = guard.take() else {
            return Ok(());
        };
        let frame = Command::Close.encode()?;
        // The peer may already be gone; shutting down matters more.
        let _ = writer.write_all(&frame).await;
        let _ = writer.shutdown().await;
        Ok(())
    }

    /// Drop the write side without sending anything. Later sends fail with
    /// [`GatewayError::StreamClosed`].
    pub(crate) async fn detach(&self) {
        if self.writer.lock().await.take().is_some() {
            debug!("link is down, dropping the write side");
        }
    }

    /// Whether commands can still be written.
    pub async fn is_open(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    // ========================================================================
    // Discovery
    // ========================================================================

    /// Ask for every device endpoint.
    pub async fn get_devices(&self) -> GatewayResult<()> {
        self.send(&Command::GetDevices).await
    }

    /// Ask for every group.
    pub async fn discover_groups(&self) -> GatewayResult<()> {
        self.send(&Command::DiscoverGroups).await
    }

    /// Ask for every scene.
    pub async fn discover_scenes(&self) -> GatewayResult<()> {
        self.send(&Command::DiscoverScenes).await
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Switch on or off.
    pub async fn set_state(&self, target: Target, on: bool) -> GatewayResult<()> {
        self.send(&Command::SetDeviceState {
            dest: target.destination(),
            on,
        })
        .await
    }

    /// Move to a level.
    pub async fn set_level(&self, target: Target, level: u8) -> GatewayResult<()> {
        self.send(&Command::SetDeviceLevel {
            dest: target.destination(),
            level,
            transition_time: self.transition_time,
        })
        .await
    }

    /// Move to a hue and saturation. Saturation is capped at [`MAX_SATURATION`].
    pub async fn set_hue_sat(&self, target: Target, hue: u8, saturation: u8) -> GatewayResult<()> {
        self.send(&Command::SetDeviceColor {
            dest: target.destination(),
            hue,
            saturation: saturation.min(MAX_SATURATION),
            transition_time: self.transition_time,
        })
        .await
    }

    /// Query one attribute of a device.
    pub async fn query(&self, addr: DeviceAddress, kind: AttributeKind) -> GatewayResult<()> {
        let dest = Target::Device(addr).destination();
        let command = match kind {
            AttributeKind::State => Command::GetDeviceState { dest },
            AttributeKind::Level => Command::GetDeviceLevel { dest },
            AttributeKind::Hue => Command::GetDeviceHue { dest },
            AttributeKind::Saturation => Command::GetDeviceSat { dest },
        };
        self.send(&command).await
    }

    /// Query state, level, hue and saturation.
    pub async fn query_all(&self, addr: DeviceAddress) -> GatewayResult<()> {
        for kind in AttributeKind::ALL {
            self.query(addr, kind).await?;
        }
        Ok(())
    }

    /// Make a device identify itself for `seconds`.
    pub async fn identify(&self, addr: DeviceAddress, seconds: u16) -> GatewayResult<()> {
        self.send(&Command::IdentifyDevice {
            dest: Target::Device(addr).destination(),
            identify_time: seconds,
        })
        .await
    }

    // ========================================================================
    // Network management
    // ========================================================================

    /// Bind `src` to `dst` on one cluster.
    pub async fn bind(&self, src: &Device, dst: &Device, cluster_id: u16) -> GatewayResult<()> {
        self.send(&Command::BindDevices {
            src_addr: src.address.nwk_addr,
            src_endpoint: src.address.endpoint,
            src_ieee: src.ieee,
            dst_endpoint: dst.address.endpoint,
            dst_ieee: dst.ieee,
            cluster_id,
        })
        .await
    }

    /// Create a group named `name`, adding `member` to it if given.
    pub async fn add_group(&self, member: Option<DeviceAddress>, name: &str) -> GatewayResult<()> {
        let dest = match member {
            Some(addr) => Target::Device(addr).destination(),
            None => Destination::network(UNASSIGNED_NWK_ADDR, BROADCAST_ENDPOINT),
        };
        self.send(&Command::AddGroup {
            dest,
            name: name.to_string(),
        })
        .await
    }

    /// Store the current state of a group as a scene.
    pub async fn store_scene(&self, group_id: u16, name: &str) -> GatewayResult<()> {
        self.send(&Command::StoreScene {
            group_id,
            name: name.to_string(),
        })
        .await
    }

    /// Recall a scene on a group.
    pub async fn recall_scene(&self, group_id: u16, name: &str) -> GatewayResult<()> {
        self.send(&Command::RecallScene {
            group_id,
            name: name.to_string(),
        })
        .await
    }

    /// Push a new device name to the gateway.
    pub async fn change_name(&self, nwk_addr: u16, name: &str) -> GatewayResult<()> {
        self.send(&Command::ChangeDeviceName {
            nwk_addr,
            name: name.to_string(),
        })
        .await
    }

    /// Remove a node from the network.
    pub async fn remove_device(&self, ieee: IeeeAddress) -> GatewayResult<()> {
        self.send(&Command::RemoveDevice { ieee }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srpc_protocol::*;
    use tokio::io::AsyncReadExt;

    async fn sent_bytes<F, Fut>(f: F) -> Vec<u8>
    where
        F: FnOnce(CommandSender) -> Fut,
        Fut: std::future::Future<Output = GatewayResult<()>>,
    {
        let (client, mut server) = tokio::io::duplex(1024);
        let sender = CommandSender::new(client, DEFAULT_TRANSITION_TIME);
        f(sender.clone()).await.unwrap();
        drop(sender);

        let mut out = Vec::new();
        server.read_to_end(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn test_set_color_to_device_target() {
        let target = Target::Device(DeviceAddress::new(0x1234, 3));
        let bytes = sent_bytes(|s| async move { s.set_hue_sat(target, 128, 200).await }).await;

        assert_eq!(bytes[0], SRPC_SET_DEV_COLOR);
        assert_eq!(bytes[2], ADDR_16BIT);
        assert_eq!(&bytes[3..5], &[0x34, 0x12]);
        assert_eq!(bytes[11], 3);
        assert_eq!(&bytes[14..16], &[128, 200]);
    }

    #[tokio::test]
    async fn test_set_color_to_group_target() {
        let bytes = sent_bytes(|s| async move { s.set_hue_sat(Target::Group(9), 128, 200).await }).await;

        assert_eq!(bytes[2], ADDR_GROUP);
        assert_eq!(&bytes[3..5], &[9, 0]);
        assert_eq!(bytes[11], BROADCAST_ENDPOINT);
    }

    #[tokio::test]
    async fn test_saturation_is_capped() {
        let target = Target::Device(DeviceAddress::new(1, 1));
        let bytes = sent_bytes(|s| async move { s.set_hue_sat(target, 0, 255).await }).await;
        assert_eq!(bytes[15], MAX_SATURATION);
    }

    #[tokio::test]
    async fn test_query_all_sends_four_frames() {
        let addr = DeviceAddress::new(0x0042, 1);
        let bytes = sent_bytes(|s| async move { s.query_all(addr).await }).await;

        let ids: Vec<u8> = bytes.chunks(15).map(|frame| frame[0]).collect();
        assert_eq!(
            ids,
            vec![SRPC_GET_DEV_STATE, SRPC_GET_DEV_LEVEL, SRPC_GET_DEV_HUE, SRPC_GET_DEV_SAT]
        );
    }

    #[tokio::test]
    async fn test_empty_group_uses_unassigned_address() {
        let bytes = sent_bytes(|s| async move { s.add_group(None, "Kitchen").await }).await;

        let (command, _) = Command::decode(&bytes).unwrap().unwrap();
        assert_eq!(
            command,
            Command::AddGroup {
                dest: Destination::network(UNASSIGNED_NWK_ADDR, BROADCAST_ENDPOINT),
                name: "Kitchen".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_send_after_detach_fails() {
        let (client, _server) = tokio::io::duplex(64);
        let sender = CommandSender::new(client, DEFAULT_TRANSITION_TIME);
        assert!(sender.is_open().await);

        sender.clone().detach().await;
        assert!(!sender.is_open().await);
        assert!(matches!(
            sender.set_state(Target::Group(1), true).await,
            Err(GatewayError::StreamClosed)
        ));
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (client, _server) = tokio::io::duplex(64);
        let sender = CommandSender::new(client, DEFAULT_TRANSITION_TIME);
        sender.close().await.unwrap();
        assert!(matches!(
            sender.get_devices().await,
            Err(GatewayError::StreamClosed)
        ));
    }
}
