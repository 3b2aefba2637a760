//! Shared catalog of devices, groups and scenes.
//!
//! One registry lives for one connection. The receive loop is the only
//! writer apart from freshness clearing, which the command side does just
//! before it sends a query. Readers always get owned snapshots, so no lock
//! is held while the caller looks at the result.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use srpc_protocol::{AttributeValue, DeviceAnnouncement};
use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::device::{Device, DeviceAddress, Freshness};
use crate::group::{EntryStatus, Group, Scene};
use crate::notify::{Notification, NotificationSink};

/// What [`Registry::announce_device`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announce {
    /// A new device was appended.
    Added,
    /// An existing device changed profile and was rebuilt in place.
    Replaced,
    /// The device was already known with the same profile.
    Unchanged,
}

#[derive(Debug, Default)]
struct Catalog {
    devices: Vec<Device>,
    groups: Vec<Group>,
    scenes: Vec<Scene>,
    /// Creation counter, used only for naming.
    next_index: usize,
}

impl Catalog {
    fn device_mut(&mut self, addr: DeviceAddress) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.address == addr)
    }
}

/// The device/group/scene catalog for one gateway connection.
#[derive(Debug)]
pub struct Registry {
    inner: RwLock<Catalog>,
    sink: NotificationSink,
    updates: Notify,
    closed: AtomicBool,
}

impl Registry {
    /// Create an empty registry that reports events to `sink`.
    pub fn new(sink: NotificationSink) -> Self {
        Registry {
            inner: RwLock::new(Catalog::default()),
            sink,
            updates: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    // ========================================================================
    // Devices
    // ========================================================================

    /// Record a device announcement.
    ///
    /// Re-announcing a known address with the same profile does nothing; with
    /// a different profile the entry is rebuilt in place under a new index.
    pub fn announce_device(&self, ann: &DeviceAnnouncement) -> Announce {
        let addr = DeviceAddress::new(ann.nwk_addr, ann.endpoint);

        let (outcome, name) = {
            let mut catalog = self.inner.write();
            let index = catalog.next_index;

            match catalog.devices.iter().position(|d| d.address == addr) {
                Some(pos) if catalog.devices[pos].profile_id == ann.profile_id => {
                    trace!("duplicate announcement for {}", addr);
                    return Announce::Unchanged;
                }
                Some(pos) => {
                    let device = Device::from_announcement(ann, index);
                    let name = device.name.clone();
                    catalog.devices[pos] = device;
                    catalog.next_index += 1;
                    (Announce::Replaced, name)
                }
                None => {
                    let device = Device::from_announcement(ann, index);
                    let name = device.name.clone();
                    catalog.devices.push(device);
                    catalog.next_index += 1;
                    (Announce::Added, name)
                }
            }
        };

        debug!(
            "device {} {:?}: {} (profile 0x{:04x}, device 0x{:04x})",
            addr, outcome, name, ann.profile_id, ann.device_id
        );
        self.sink.notify(Notification::NewDevice { name, address: addr });
        outcome
    }

    /// Look up a device by address.
    pub fn device(&self, addr: DeviceAddress) -> Option<Device> {
        self.inner.read().devices.iter().find(|d| d.address == addr).cloned()
    }

    /// Look up a device by display name. The most recently added match wins.
    pub fn device_by_name(&self, name: &str) -> Option<Device> {
        self.inner
            .read()
            .devices
            .iter()
            .rev()
            .find(|d| d.name == name)
            .cloned()
    }

    /// All devices in the order they were first announced.
    pub fn devices(&self) -> Vec<Device> {
        self.inner.read().devices.clone()
    }

    /// Devices matching `pred`, in announcement order.
    pub fn filter<F>(&self, pred: F) -> Vec<Device>
    where
        F: Fn(&Device) -> bool,
    {
        self.inner
            .read()
            .devices
            .iter()
            .filter(|d| pred(*d))
            .cloned()
            .collect()
    }

    /// Devices that switch other devices.
    pub fn switchers(&self) -> Vec<Device> {
        self.filter(Device::is_switcher)
    }

    /// Devices that can be lit.
    pub fn switchable(&self) -> Vec<Device> {
        self.filter(Device::is_switchable)
    }

    /// Whether any known device switches others.
    pub fn has_switchers(&self) -> bool {
        self.inner.read().devices.iter().any(Device::is_switcher)
    }

    /// Rename the most recently added device called `old_name`.
    ///
    /// Returns its address so the new name can be pushed to the gateway.
    pub fn rename_device(&self, old_name: &str, new_name: &str) -> Option<DeviceAddress> {
        let mut catalog = self.inner.write();
        let device = catalog.devices.iter_mut().rev().find(|d| d.name == old_name)?;
        device.name = new_name.to_string();
        Some(device.address)
    }

    /// Store an attribute value and mark it fresh.
    ///
    /// Returns false if the device is unknown; the value is dropped.
    pub fn record_attribute(&self, value: &AttributeValue) -> bool {
        let addr = DeviceAddress::new(value.nwk_addr, value.endpoint);
        let found = match self.inner.write().device_mut(addr) {
            Some(device) => {
                device.set_attribute(value.kind, value.value);
                true
            }
            None => false,
        };

        if found {
            trace!("{} {} = {}", addr, value.kind, value.value);
            self.updates.notify_waiters();
        } else {
            trace!("{} for unknown device {}", value.kind, addr);
        }
        found
    }

    /// Clear freshness flags ahead of a query.
    pub fn clear_fresh(&self, addr: DeviceAddress, mask: Freshness) -> bool {
        match self.inner.write().device_mut(addr) {
            Some(device) => {
                device.clear_fresh(mask);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// Add a pending group.
    ///
    /// Returns false, and adds nothing, if a group with this name is already
    /// pending.
    pub fn begin_group(&self, name: &str) -> bool {
        let mut catalog = self.inner.write();
        if catalog
            .groups
            .iter()
            .any(|g| g.name == name && g.status == EntryStatus::Pending)
        {
            return false;
        }
        catalog.groups.push(Group::pending(name));
        true
    }

    /// Apply an add-group confirmation.
    ///
    /// The group is found by name, pending entries first. A confirmation for
    /// a name nobody asked for is dropped.
    pub fn confirm_group(&self, id: u16, name: &str) -> bool {
        let confirmed = {
            let mut catalog = self.inner.write();
            let pos = catalog
                .groups
                .iter()
                .position(|g| g.name == name && g.status == EntryStatus::Pending)
                .or_else(|| catalog.groups.iter().position(|g| g.name == name));
            match pos {
                Some(pos) => {
                    let group = &mut catalog.groups[pos];
                    group.id = id;
                    group.status = EntryStatus::Active;
                    true
                }
                None => false,
            }
        };

        if confirmed {
            self.sink.notify(Notification::GroupActive {
                id,
                name: name.to_string(),
            });
        } else {
            trace!("add-group response for unknown group {:?}", name);
        }
        confirmed
    }

    /// Apply a discovered group: update a match or append a new active entry.
    ///
    /// A known id wins over a name match, so two gateway groups with the same
    /// name stay separate.
    pub fn upsert_group(&self, id: u16, name: &str) {
        let created = {
            let mut catalog = self.inner.write();
            let pos = catalog
                .groups
                .iter()
                .position(|g| g.is_active() && g.id == id)
                .or_else(|| catalog.groups.iter().position(|g| g.name == name && !g.is_active()));
            match pos {
                Some(pos) => {
                    let group = &mut catalog.groups[pos];
                    let changed = !group.is_active() || group.name != name;
                    *group = Group::active(id, name);
                    changed
                }
                None => {
                    catalog.groups.push(Group::active(id, name));
                    true
                }
            }
        };

        if created {
            self.sink.notify(Notification::GroupActive {
                id,
                name: name.to_string(),
            });
        }
    }

    /// Look up a group by name. Active groups win over pending ones.
    pub fn group(&self, name: &str) -> Option<Group> {
        let catalog = self.inner.read();
        catalog
            .groups
            .iter()
            .find(|g| g.name == name && g.is_active())
            .or_else(|| catalog.groups.iter().find(|g| g.name == name))
            .cloned()
    }

    /// All groups in creation order.
    pub fn groups(&self) -> Vec<Group> {
        self.inner.read().groups.clone()
    }

    // ========================================================================
    // Scenes
    // ========================================================================

    /// Add a pending scene unless `(name, group_id)` is already known.
    pub fn begin_scene(&self, name: &str, group_id: u16) -> bool {
        let mut catalog = self.inner.write();
        if catalog.scenes.iter().any(|s| s.matches(name, group_id)) {
            return false;
        }
        catalog.scenes.push(Scene::pending(name, group_id));
        true
    }

    /// Apply an add-scene confirmation, matched on `(name, group_id)`.
    pub fn confirm_scene(&self, group_id: u16, scene_id: u8, name: &str) -> bool {
        let confirmed = {
            let mut catalog = self.inner.write();
            match catalog.scenes.iter_mut().find(|s| s.matches(name, group_id)) {
                Some(scene) => {
                    scene.scene_id = scene_id;
                    scene.status = EntryStatus::Active;
                    true
                }
                None => false,
            }
        };

        if confirmed {
            self.sink.notify(Notification::SceneActive {
                group_id,
                scene_id,
                name: name.to_string(),
            });
        } else {
            trace!("add-scene response for unknown scene {:?}/{}", name, group_id);
        }
        confirmed
    }

    /// Apply a discovered scene: update the `(name, group_id)` match or
    /// append a new active entry.
    pub fn upsert_scene(&self, group_id: u16, scene_id: u8, name: &str) {
        let changed = {
            let mut catalog = self.inner.write();
            match catalog.scenes.iter_mut().find(|s| s.matches(name, group_id)) {
                Some(scene) => {
                    let changed = !scene.is_active() || scene.scene_id != scene_id;
                    *scene = Scene::active(group_id, scene_id, name);
                    changed
                }
                None => {
                    catalog.scenes.push(Scene::active(group_id, scene_id, name));
                    true
                }
            }
        };

        if changed {
            self.sink.notify(Notification::SceneActive {
                group_id,
                scene_id,
                name: name.to_string(),
            });
        }
    }

    /// All scenes in creation order.
    pub fn scenes(&self) -> Vec<Scene> {
        self.inner.read().scenes.clone()
    }

    /// Scenes belonging to one group.
    pub fn scenes_for_group(&self, group_id: u16) -> Vec<Scene> {
        self.inner
            .read()
            .scenes
            .iter()
            .filter(|s| s.group_id == group_id)
            .cloned()
            .collect()
    }

    // ========================================================================
    // Whole catalog
    // ========================================================================

    /// Text listing of every device and what it can do.
    pub fn summary(&self) -> String {
        let catalog = self.inner.read();
        if catalog.devices.is_empty() {
            return "No devices detected.".to_string();
        }

        let mut out = String::new();
        for d in &catalog.devices {
            out.push_str(&format!(
                "{} - 0x{:x}({})\n",
                d.name, d.address.nwk_addr, d.address.endpoint
            ));
            for line in d.capabilities.descriptions() {
                out.push_str(&format!("\t: {}\n", line));
            }
        }
        out
    }

    /// Forget everything and restart the creation counter.
    pub fn reset(&self) {
        *self.inner.write() = Catalog::default();
        self.closed.store(false, Ordering::SeqCst);
    }

    // ========================================================================
    // Link state
    // ========================================================================

    /// Raise an event on this connection's notification queue.
    pub(crate) fn notify(&self, notification: Notification) {
        self.sink.notify(notification);
    }

    /// Signalled after every attribute update and when the link closes.
    pub(crate) fn updates(&self) -> &Notify {
        &self.updates
    }

    /// Whether the receive loop has stopped.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Record that the receive loop has stopped and release every waiter.
    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.updates.notify_waiters();
    }
}
