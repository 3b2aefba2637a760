//! Devices known to the gateway.

use bitflags::bitflags;
use srpc_protocol::{AttributeKind, DeviceAnnouncement, Destination, IeeeAddress};

use crate::catalog;

bitflags! {
    /// What a device can do, or make other devices do.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u16 {
        /// Can be switched on and off.
        const SWITCHABLE = 1 << 0;
        /// Has a level.
        const DIMMABLE = 1 << 1;
        /// Has hue and saturation.
        const COLOURABLE = 1 << 2;
        /// Reports temperature.
        const THERMOMETER = 1 << 3;
        /// Reports power usage.
        const POWER_METER = 1 << 4;
        /// Switches other devices.
        const OUT_SWITCH = 1 << 5;
        /// Controls the level of other devices.
        const OUT_LEVEL = 1 << 6;
        /// Controls the colour of other devices.
        const OUT_COLOR = 1 << 7;
        /// Recalls scenes on other devices.
        const OUT_SCENE = 1 << 8;
        /// Controls groups of other devices.
        const OUT_GROUP = 1 << 9;
    }
}

impl Capabilities {
    /// Anything that can be lit: switchable, dimmable or colourable.
    pub const SWITCHABLE_FAMILY: Capabilities = Capabilities::SWITCHABLE
        .union(Capabilities::DIMMABLE)
        .union(Capabilities::COLOURABLE);

    /// One human-readable line per capability, in a fixed order.
    pub fn descriptions(self) -> Vec<&'static str> {
        const TABLE: [(Capabilities, &str); 10] = [
            (Capabilities::SWITCHABLE, "Switchable"),
            (Capabilities::DIMMABLE, "Dimmable"),
            (Capabilities::COLOURABLE, "Colourable"),
            (Capabilities::THERMOMETER, "Measures Temperature"),
            (Capabilities::POWER_METER, "Measures Power Usage"),
            (Capabilities::OUT_SWITCH, "Switches Others"),
            (Capabilities::OUT_LEVEL, "Controls level of Others"),
            (Capabilities::OUT_COLOR, "Controls color of Others"),
            (Capabilities::OUT_SCENE, "Controls scenes of Others"),
            (Capabilities::OUT_GROUP, "Controls groups of Others"),
        ];
        TABLE
            .iter()
            .filter(|(cap, _)| self.contains(*cap))
            .map(|(_, text)| *text)
            .collect()
    }
}

bitflags! {
    /// Attributes confirmed by the device since they were last queried.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Freshness: u8 {
        /// On/off state.
        const STATE = 0x01;
        /// Level.
        const LEVEL = 0x02;
        /// Hue.
        const HUE = 0x04;
        /// Saturation.
        const SAT = 0x08;
    }
}

impl Freshness {
    /// The flag for one attribute.
    pub fn of(kind: AttributeKind) -> Freshness {
        match kind {
            AttributeKind::State => Freshness::STATE,
            AttributeKind::Level => Freshness::LEVEL,
            AttributeKind::Hue => Freshness::HUE,
            AttributeKind::Saturation => Freshness::SAT,
        }
    }
}

/// Network address and endpoint: the identity of a live device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress {
    /// 16-bit network address.
    pub nwk_addr: u16,
    /// Endpoint on the node.
    pub endpoint: u8,
}

impl DeviceAddress {
    /// Create an address.
    pub fn new(nwk_addr: u16, endpoint: u8) -> Self {
        DeviceAddress { nwk_addr, endpoint }
    }
}

impl std::fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04x}:{}", self.nwk_addr, self.endpoint)
    }
}

/// A device endpoint with its last known attribute values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Network address and endpoint.
    pub address: DeviceAddress,
    /// Stable hardware address.
    pub ieee: IeeeAddress,
    /// Application profile.
    pub profile_id: u16,
    /// Device id within the profile.
    pub device_id: u16,
    /// Type label from the device table.
    pub type_label: &'static str,
    /// Display name. May be changed by the user.
    pub name: String,
    /// Name as announced by the gateway.
    pub announced_name: String,
    /// What the device can do.
    pub capabilities: Capabilities,
    /// Creation index used for naming.
    pub index: usize,
    state: u8,
    level: u8,
    hue: u8,
    saturation: u8,
    fresh: Freshness,
}

impl Device {
    /// Build a device from an announcement, classifying it by profile and
    /// device id. `index` is the creation counter.
    pub fn from_announcement(ann: &DeviceAnnouncement, index: usize) -> Self {
        let kind = catalog::lookup(ann.profile_id, ann.device_id);
        Device {
            address: DeviceAddress::new(ann.nwk_addr, ann.endpoint),
            ieee: ann.ieee,
            profile_id: ann.profile_id,
            device_id: ann.device_id,
            type_label: kind.type_label,
            name: kind.naming.name_for(index, ann.endpoint),
            announced_name: ann.name.clone(),
            capabilities: kind.capabilities,
            index,
            state: 0,
            level: 0,
            hue: 0,
            saturation: 0,
            fresh: Freshness::empty(),
        }
    }

    /// Unicast destination for this endpoint.
    pub fn destination(&self) -> Destination {
        Destination::network(self.address.nwk_addr, self.address.endpoint)
    }

    /// Whether the device has every capability in `caps`.
    pub fn has(&self, caps: Capabilities) -> bool {
        self.capabilities.contains(caps)
    }

    /// Whether the device switches other devices.
    pub fn is_switcher(&self) -> bool {
        self.has(Capabilities::OUT_SWITCH)
    }

    /// Whether the device can be lit.
    pub fn is_switchable(&self) -> bool {
        self.capabilities.intersects(Capabilities::SWITCHABLE_FAMILY)
    }

    /// The capability that gives a device the attribute `kind`.
    fn capability_for(kind: AttributeKind) -> Capabilities {
        match kind {
            AttributeKind::State => Capabilities::SWITCHABLE,
            AttributeKind::Level => Capabilities::DIMMABLE,
            AttributeKind::Hue | AttributeKind::Saturation => Capabilities::COLOURABLE,
        }
    }

    /// Whether the device has the attribute `kind` at all.
    pub fn supports(&self, kind: AttributeKind) -> bool {
        self.has(Self::capability_for(kind))
    }

    /// Whether `kind` has been confirmed since it was last queried.
    ///
    /// An attribute the device does not have is always fresh.
    pub fn is_fresh(&self, kind: AttributeKind) -> bool {
        !self.supports(kind) || self.fresh.contains(Freshness::of(kind))
    }

    /// Whether all four attributes are fresh.
    pub fn all_fresh(&self) -> bool {
        AttributeKind::ALL.iter().all(|kind| self.is_fresh(*kind))
    }

    /// Raw freshness mask.
    pub fn freshness(&self) -> Freshness {
        self.fresh
    }

    /// Last known value of `kind`. Zero if it was never reported.
    pub fn attribute(&self, kind: AttributeKind) -> u8 {
        match kind {
            AttributeKind::State => self.state,
            AttributeKind::Level => self.level,
            AttributeKind::Hue => self.hue,
            AttributeKind::Saturation => self.saturation,
        }
    }

    /// Last known on/off state.
    pub fn is_on(&self) -> bool {
        self.state != 0
    }

    pub(crate) fn set_attribute(&mut self, kind: AttributeKind, value: u8) {
        match kind {
            AttributeKind::State => self.state = value,
            AttributeKind::Level => self.level = value,
            AttributeKind::Hue => self.hue = value,
            AttributeKind::Saturation => self.saturation = value,
        }
        self.fresh.insert(Freshness::of(kind));
    }

    pub(crate) fn clear_fresh(&mut self, mask: Freshness) {
        self.fresh.remove(mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srpc_protocol::*;

    fn announcement(profile_id: u16, device_id: u16) -> DeviceAnnouncement {
        DeviceAnnouncement {
            nwk_addr: 0x1234,
            endpoint: 1,
            profile_id,
            device_id,
            version: 0,
            name: String::new(),
            status: 0,
            ieee: IeeeAddress::default(),
        }
    }

    #[test]
    fn test_plug_hue_is_always_fresh() {
        let mut plug = Device::from_announcement(
            &announcement(ZCL_HA_PROFILE_ID, HA_DEVICEID_MAINS_POWER_OUTLET),
            0,
        );
        assert!(plug.is_fresh(AttributeKind::Hue));
        assert!(plug.is_fresh(AttributeKind::Level));
        assert!(!plug.is_fresh(AttributeKind::State));
        assert!(!plug.all_fresh());

        plug.set_attribute(AttributeKind::State, 1);
        assert!(plug.all_fresh());
        assert!(plug.is_on());
    }

    #[test]
    fn test_clear_fresh_keeps_values() {
        let mut light = Device::from_announcement(
            &announcement(ZLL_PROFILE_ID, ZLL_DEVICEID_COLOR_LIGHT),
            0,
        );
        light.set_attribute(AttributeKind::Hue, 42);
        light.set_attribute(AttributeKind::Saturation, 200);
        assert_eq!(light.freshness(), Freshness::HUE | Freshness::SAT);

        light.clear_fresh(Freshness::all());
        assert!(!light.is_fresh(AttributeKind::Hue));
        assert_eq!(light.attribute(AttributeKind::Hue), 42);
        assert_eq!(light.attribute(AttributeKind::Saturation), 200);
    }

    #[test]
    fn test_capability_descriptions() {
        let caps = Capabilities::SWITCHABLE | Capabilities::DIMMABLE;
        assert_eq!(caps.descriptions(), vec!["Switchable", "Dimmable"]);
        assert!(Capabilities::empty().descriptions().is_empty());
    }

    #[test]
    fn test_device_destination() {
        let light = Device::from_announcement(
            &announcement(ZCL_HA_PROFILE_ID, HA_DEVICEID_DIMMABLE_LIGHT),
            0,
        );
        assert_eq!(light.destination(), Destination::network(0x1234, 1));
        assert_eq!(light.address.to_string(), "0x1234:1");
    }
}
