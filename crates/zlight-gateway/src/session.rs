//! One connection to the gateway.
//!
//! [`Gateway`] owns the link: it dials, spawns the receive loop, and is the
//! place transport and framing failures end up.

use std::sync::Arc;

use srpc_protocol::{
    CLUSTER_COLOR_CONTROL, CLUSTER_GROUPS, CLUSTER_LEVEL_CONTROL, CLUSTER_ON_OFF, CLUSTER_SCENES,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::attributes::{self, AttributeReport};
use crate::config::GatewayConfig;
use crate::device::{Device, DeviceAddress};
use crate::error::{GatewayError, GatewayResult};
use crate::notify::{self, Notifications};
use crate::receiver::{run_receive_loop, LinkStatus};
use crate::registry::Registry;
use crate::sender::{CommandSender, Target};
use crate::transport;

/// Clusters bound by [`Gateway::bind_all`], in the order they are sent.
pub const BIND_ALL_CLUSTERS: [u16; 5] = [
    CLUSTER_ON_OFF,
    CLUSTER_LEVEL_CONTROL,
    CLUSTER_COLOR_CONTROL,
    CLUSTER_SCENES,
    CLUSTER_GROUPS,
];

/// A live session with a gateway.
#[derive(Debug)]
pub struct Gateway {
    config: GatewayConfig,
    registry: Arc<Registry>,
    sender: CommandSender,
    notifications: Notifications,
    shutdown: watch::Sender<bool>,
    status: watch::Receiver<Option<LinkStatus>>,
}

impl Gateway {
    /// Connect to the gateway named in `config` and start receiving.
    ///
    /// Fails if the gateway cannot be reached within the connect timeout.
    /// There is no retry.
    pub async fn connect(config: GatewayConfig) -> GatewayResult<Self> {
        let (reader, writer) =
            transport::connect_split(&config.address(), config.connect_timeout()).await?;
        Self::attach(reader, writer, config).await
    }

    /// Start a session over an already open link.
    pub async fn attach<R, W>(reader: R, writer: W, config: GatewayConfig) -> GatewayResult<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, notifications) = notify::channel();
        let registry = Arc::new(Registry::new(sink));
        let sender = CommandSender::new(writer, config.transition_time);

        let (shutdown, shutdown_rx) = watch::channel(false);
        let (status_tx, status) = watch::channel(None);

        let loop_registry = registry.clone();
        let loop_sender = sender.clone();
        let policy = config.unknown_frame;
        tokio::spawn(async move {
            let result = run_receive_loop(reader, loop_registry, policy, shutdown_rx).await;
            // A dead link takes the write side with it.
            loop_sender.detach().await;
            let _ = status_tx.send(Some(result));
        });

        let gateway = Gateway {
            config,
            registry,
            sender,
            notifications,
            shutdown,
            status,
        };

        if gateway.config.discover_on_connect {
            gateway.discover().await?;
        }
        Ok(gateway)
    }

    /// Settings this session was opened with.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The shared catalog for this connection.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// A handle for sending raw commands.
    pub fn sender(&self) -> &CommandSender {
        &self.sender
    }

    /// User-visible events for this connection.
    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// Ask the gateway for its devices, groups and scenes.
    pub async fn discover(&self) -> GatewayResult<()> {
        debug!("requesting devices, groups and scenes");
        self.sender.get_devices().await?;
        self.sender.discover_groups().await?;
        self.sender.discover_scenes().await
    }

    /// Close the link. Idempotent.
    pub async fn close(&self) -> GatewayResult<()> {
        info!("closing gateway connection");
        // Close goes out before the receive loop lets go of the write side.
        let result = self.sender.close().await;
        let _ = self.shutdown.send(true);
        result
    }

    /// Wait for the receive loop to stop and say why it did.
    pub async fn closed(&self) -> LinkStatus {
        let mut status = self.status.clone();
        loop {
            if let Some(s) = status.borrow_and_update().clone() {
                return s;
            }
            if status.changed().await.is_err() {
                // The loop task went away without reporting; it panicked.
                return LinkStatus::IoError("receive loop aborted".to_string());
            }
        }
    }

    // ========================================================================
    // Lookup helpers
    // ========================================================================

    fn device(&self, addr: DeviceAddress) -> GatewayResult<Device> {
        self.registry
            .device(addr)
            .ok_or_else(|| GatewayError::UnknownDevice(addr.to_string()))
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Switch a device or group on or off.
    pub async fn set_state(&self, target: Target, on: bool) -> GatewayResult<()> {
        self.sender.set_state(target, on).await
    }

    /// Set the level of a device or group.
    pub async fn set_level(&self, target: Target, level: u8) -> GatewayResult<()> {
        self.sender.set_level(target, level).await
    }

    /// Set the hue and saturation of a device or group.
    pub async fn set_hue_sat(&self, target: Target, hue: u8, saturation: u8) -> GatewayResult<()> {
        self.sender.set_hue_sat(target, hue, saturation).await
    }

    /// Make a device identify itself.
    pub async fn identify(&self, addr: DeviceAddress, seconds: u16) -> GatewayResult<()> {
        self.device(addr)?;
        self.sender.identify(addr, seconds).await
    }

    /// Query state, level, hue and saturation and wait for the answers,
    /// bounded by the configured attribute timeout.
    pub async fn wait_for_attributes(&self, addr: DeviceAddress) -> GatewayResult<AttributeReport> {
        attributes::wait_for_attributes(
            &self.registry,
            &self.sender,
            addr,
            self.config.attribute_wait(),
        )
        .await
    }

    // ========================================================================
    // Groups and scenes
    // ========================================================================

    /// Create an empty group.
    ///
    /// Returns false, sending nothing, if a group of that name is already
    /// waiting for confirmation.
    pub async fn create_group(&self, name: &str) -> GatewayResult<bool> {
        if !self.registry.begin_group(name) {
            debug!("group {:?} is already pending", name);
            return Ok(false);
        }
        self.sender.add_group(None, name).await?;
        Ok(true)
    }

    /// Add a device to the named group, creating it on the gateway if needed.
    ///
    /// A group not known locally is recorded as pending so the gateway's
    /// confirmation can activate it.
    pub async fn add_device_to_group(&self, addr: DeviceAddress, group: &str) -> GatewayResult<()> {
        self.device(addr)?;
        if self.registry.group(group).is_none() {
            self.registry.begin_group(group);
        }
        self.sender.add_group(Some(addr), group).await
    }

    /// Store the current state of a group as a scene.
    pub async fn create_scene(&self, name: &str, group_id: u16) -> GatewayResult<()> {
        self.registry.begin_scene(name, group_id);
        self.sender.store_scene(group_id, name).await
    }

    /// Recall a scene on a group.
    pub async fn recall_scene(&self, name: &str, group_id: u16) -> GatewayResult<()> {
        self.sender.recall_scene(group_id, name).await
    }

    // ========================================================================
    // Network management
    // ========================================================================

    /// Rename the most recently added device called `old_name`, locally and
    /// on the gateway.
    pub async fn rename_device(&self, old_name: &str, new_name: &str) -> GatewayResult<DeviceAddress> {
        let addr = self
            .registry
            .rename_device(old_name, new_name)
            .ok_or_else(|| GatewayError::UnknownDevice(old_name.to_string()))?;
        self.sender.change_name(addr.nwk_addr, new_name).await?;
        Ok(addr)
    }

    /// Bind `src` to `dst` on one cluster.
    pub async fn bind_devices(
        &self,
        src: DeviceAddress,
        dst: DeviceAddress,
        cluster_id: u16,
    ) -> GatewayResult<()> {
        let src = self.device(src)?;
        let dst = self.device(dst)?;
        self.sender.bind(&src, &dst, cluster_id).await
    }

    /// Bind `src` to `dst` on every cluster in [`BIND_ALL_CLUSTERS`].
    pub async fn bind_all(&self, src: DeviceAddress, dst: DeviceAddress) -> GatewayResult<()> {
        let src = self.device(src)?;
        let dst = self.device(dst)?;
        for cluster in BIND_ALL_CLUSTERS {
            self.sender.bind(&src, &dst, cluster).await?;
        }
        Ok(())
    }

    /// Ask the gateway to remove a device's node from the network.
    pub async fn remove_device(&self, addr: DeviceAddress) -> GatewayResult<()> {
        let device = self.device(addr)?;
        self.sender.remove_device(device.ieee).await
    }
}
