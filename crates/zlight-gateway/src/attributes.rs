//! Waiting for a full set of attribute answers.
//!
//! The four queries go out together and the answers trickle back through the
//! receive loop. The wait wakes on every attribute update and also rechecks
//! on a short tick, and gives up at a deadline. Whatever arrived by then is
//! reported; a missing answer is never an error.

use srpc_protocol::AttributeKind;
use tokio::time::Instant;
use tracing::debug;

use crate::config::AttributeWait;
use crate::device::{Device, DeviceAddress, Freshness};
use crate::error::{GatewayError, GatewayResult};
use crate::notify::Notification;
use crate::registry::Registry;
use crate::sender::CommandSender;

/// How much of a query came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// Every attribute the device has was confirmed.
    Complete,
    /// Some were confirmed.
    Partial,
    /// None were confirmed.
    Unresponsive,
}

/// Result of [`wait_for_attributes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeReport {
    /// On/off state, if confirmed.
    pub state: Option<u8>,
    /// Level, if confirmed.
    pub level: Option<u8>,
    /// Hue, if confirmed.
    pub hue: Option<u8>,
    /// Saturation, if confirmed.
    pub sat: Option<u8>,
    /// Overall outcome.
    pub status: ResponseStatus,
    device: Device,
}

impl AttributeReport {
    /// Build a report from a device snapshot.
    ///
    /// Attributes the device does not have are reported as `None` and do not
    /// count against completeness.
    pub fn from_device(device: Device) -> Self {
        let confirmed = |kind| {
            (device.supports(kind) && device.freshness().contains(Freshness::of(kind)))
                .then(|| device.attribute(kind))
        };

        let applicable = AttributeKind::ALL
            .iter()
            .filter(|kind| device.supports(**kind))
            .count();
        let arrived = AttributeKind::ALL
            .iter()
            .filter(|kind| confirmed(**kind).is_some())
            .count();

        let status = if arrived == applicable {
            ResponseStatus::Complete
        } else if arrived == 0 {
            ResponseStatus::Unresponsive
        } else {
            ResponseStatus::Partial
        };

        AttributeReport {
            state: confirmed(AttributeKind::State),
            level: confirmed(AttributeKind::Level),
            hue: confirmed(AttributeKind::Hue),
            sat: confirmed(AttributeKind::Saturation),
            status,
            device,
        }
    }

    /// The confirmed value of `kind`, if it arrived.
    pub fn value(&self, kind: AttributeKind) -> Option<u8> {
        match kind {
            AttributeKind::State => self.state,
            AttributeKind::Level => self.level,
            AttributeKind::Hue => self.hue,
            AttributeKind::Saturation => self.sat,
        }
    }

    /// The confirmed value if it arrived, else the last value ever seen
    /// (zero if none).
    pub fn last_known(&self, kind: AttributeKind) -> u8 {
        self.value(kind)
            .unwrap_or_else(|| self.device.attribute(kind))
    }

    /// Snapshot of the device at the end of the wait.
    pub fn device(&self) -> &Device {
        &self.device
    }
}

/// Snapshot a device or fail with [`GatewayError::UnknownDevice`].
fn snapshot(registry: &Registry, addr: DeviceAddress) -> GatewayResult<Device> {
    registry
        .device(addr)
        .ok_or_else(|| GatewayError::UnknownDevice(addr.to_string()))
}

/// Wait for answers already asked for, until all arrive, the link closes or
/// `wait.timeout` passes.
pub async fn await_fresh(
    registry: &Registry,
    addr: DeviceAddress,
    wait: AttributeWait,
) -> GatewayResult<AttributeReport> {
    let deadline = Instant::now() + wait.timeout;

    let device = loop {
        // Register for the wake-up before looking, so an update landing in
        // between is not lost.
        let notified = registry.updates().notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let device = snapshot(registry, addr)?;
        if device.all_fresh() || registry.is_closed() {
            break device;
        }

        let now = Instant::now();
        if now >= deadline {
            break device;
        }
        let tick = wait.poll.min(deadline - now);
        let _ = tokio::time::timeout(tick, notified).await;
    };

    Ok(AttributeReport::from_device(device))
}

/// Query state, level, hue and saturation and wait for the answers.
///
/// Freshness is cleared before the queries go out. If anything is missing at
/// the end a "not fully responding" notification is raised.
pub async fn wait_for_attributes(
    registry: &Registry,
    sender: &CommandSender,
    addr: DeviceAddress,
    wait: AttributeWait,
) -> GatewayResult<AttributeReport> {
    if !registry.clear_fresh(addr, Freshness::all()) {
        return Err(GatewayError::UnknownDevice(addr.to_string()));
    }
    sender.query_all(addr).await?;

    let report = await_fresh(registry, addr, wait).await?;
    debug!("attributes for {}: {:?}", addr, report.status);
    if report.status != ResponseStatus::Complete {
        registry.notify(Notification::NotFullyResponding {
            name: report.device.name.clone(),
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::channel;
    use srpc_protocol::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn colour_light(registry: &Registry) -> DeviceAddress {
        registry.announce_device(&DeviceAnnouncement {
            nwk_addr: 0x2222,
            endpoint: 1,
            profile_id: ZLL_PROFILE_ID,
            device_id: ZLL_DEVICEID_EXTENDED_COLOR_LIGHT,
            version: 0,
            name: String::new(),
            status: 0,
            ieee: IeeeAddress::default(),
        });
        DeviceAddress::new(0x2222, 1)
    }

    fn value(kind: AttributeKind, value: u8) -> AttributeValue {
        AttributeValue {
            kind,
            nwk_addr: 0x2222,
            endpoint: 1,
            value,
        }
    }

    fn short_wait() -> AttributeWait {
        AttributeWait {
            timeout: Duration::from_millis(200),
            poll: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_partial_answers() {
        let (sink, _notes) = channel();
        let registry = Arc::new(Registry::new(sink));
        let addr = colour_light(&registry);
        registry.record_attribute(&value(AttributeKind::Hue, 99));
        registry.clear_fresh(addr, Freshness::all());

        let feeder = {
            let registry = registry.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                registry.record_attribute(&value(AttributeKind::State, 1));
                registry.record_attribute(&value(AttributeKind::Level, 128));
            })
        };

        let report = await_fresh(&registry, addr, short_wait()).await.unwrap();
        feeder.await.unwrap();

        assert_eq!(report.status, ResponseStatus::Partial);
        assert_eq!(report.state, Some(1));
        assert_eq!(report.level, Some(128));
        assert_eq!(report.hue, None);
        assert_eq!(report.sat, None);
        assert_eq!(report.last_known(AttributeKind::Hue), 99);
        assert_eq!(report.last_known(AttributeKind::Saturation), 0);
    }

    #[tokio::test]
    async fn test_complete_returns_before_deadline() {
        let (sink, _notes) = channel();
        let registry = Arc::new(Registry::new(sink));
        let addr = colour_light(&registry);

        let feeder = {
            let registry = registry.clone();
            tokio::spawn(async move {
                for kind in AttributeKind::ALL {
                    registry.record_attribute(&value(kind, 5));
                }
            })
        };

        let wait = AttributeWait {
            timeout: Duration::from_secs(10),
            poll: Duration::from_millis(10),
        };
        let started = std::time::Instant::now();
        let report = await_fresh(&registry, addr, wait).await.unwrap();
        feeder.await.unwrap();

        assert_eq!(report.status, ResponseStatus::Complete);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_nothing_arrives() {
        let (sink, _notes) = channel();
        let registry = Registry::new(sink);
        let addr = colour_light(&registry);

        let report = await_fresh(&registry, addr, short_wait()).await.unwrap();
        assert_eq!(report.status, ResponseStatus::Unresponsive);
        assert_eq!(report.state, None);
    }

    #[tokio::test]
    async fn test_closed_link_releases_waiter() {
        let (sink, _notes) = channel();
        let registry = Arc::new(Registry::new(sink));
        let addr = colour_light(&registry);

        let closer = {
            let registry = registry.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                registry.mark_closed();
            })
        };

        let wait = AttributeWait {
            timeout: Duration::from_secs(30),
            poll: Duration::from_secs(30),
        };
        let report = tokio::time::timeout(Duration::from_secs(5), await_fresh(&registry, addr, wait))
            .await
            .expect("waiter was not released")
            .unwrap();
        closer.await.unwrap();
        assert_eq!(report.status, ResponseStatus::Unresponsive);
    }

    #[tokio::test]
    async fn test_unknown_device() {
        let (sink, _notes) = channel();
        let registry = Registry::new(sink);
        let err = await_fresh(&registry, DeviceAddress::new(1, 1), short_wait())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnknownDevice(_)));
    }
}
