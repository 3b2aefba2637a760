//! Device classification table.
//!
//! Maps `(profile id, device id)` to a type label, a naming rule and the
//! capabilities a new device starts with. Adding a device type is a new row.

use srpc_protocol::*;

use crate::device::Capabilities;

/// How a new device is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming {
    /// `"{index + 1}: {label}"`.
    Indexed(&'static str),
    /// The text as is.
    Fixed(&'static str),
    /// A multi-button switch, named after the button the endpoint sits on.
    SwitchButton,
}

impl Naming {
    /// The display name for a device created at `index` on `endpoint`.
    pub fn name_for(&self, index: usize, endpoint: u8) -> String {
        match self {
            Naming::Indexed(label) => format!("{}: {}", index + 1, label),
            Naming::Fixed(text) => text.to_string(),
            Naming::SwitchButton => match switch_position(endpoint) {
                Some(position) => format!("Switch EP:{}({})", endpoint, position),
                None => format!("Switch EP:{:x}", endpoint),
            },
        }
    }
}

fn switch_position(endpoint: u8) -> Option<&'static str> {
    match endpoint {
        1 => Some("DOWN"),
        2 => Some("LEFT"),
        3 => Some("UP"),
        4 => Some("RIGHT"),
        5 => Some("CENTER"),
        _ => None,
    }
}

/// One row of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceKind {
    /// Application profile.
    pub profile_id: u16,
    /// Device id within the profile.
    pub device_id: u16,
    /// Human-readable type.
    pub type_label: &'static str,
    /// Naming rule.
    pub naming: Naming,
    /// Initial capabilities.
    pub capabilities: Capabilities,
}

const SWITCHABLE: Capabilities = Capabilities::SWITCHABLE;
const DIMMABLE: Capabilities = SWITCHABLE.union(Capabilities::DIMMABLE);
const COLOURABLE: Capabilities = DIMMABLE.union(Capabilities::COLOURABLE);
const OUT_SWITCH: Capabilities = Capabilities::OUT_SWITCH;
const OUT_LEVEL: Capabilities = OUT_SWITCH.union(Capabilities::OUT_LEVEL);
const OUT_COLOR: Capabilities = OUT_LEVEL.union(Capabilities::OUT_COLOR);
const OUT_SCENES: Capabilities = Capabilities::OUT_SCENE.union(Capabilities::OUT_GROUP);

const fn row(
    profile_id: u16,
    device_id: u16,
    type_label: &'static str,
    naming: Naming,
    capabilities: Capabilities,
) -> DeviceKind {
    DeviceKind {
        profile_id,
        device_id,
        type_label,
        naming,
        capabilities,
    }
}

/// Every known device type.
pub static DEVICE_TABLE: &[DeviceKind] = &[
    // Home Automation
    row(ZCL_HA_PROFILE_ID, HA_DEVICEID_ON_OFF_SWITCH, "Switch", Naming::SwitchButton, OUT_SWITCH),
    row(ZCL_HA_PROFILE_ID, HA_DEVICEID_MAINS_POWER_OUTLET, "Mains Outlet", Naming::Indexed("Smart Plug"), SWITCHABLE),
    row(ZCL_HA_PROFILE_ID, HA_DEVICEID_DIMMABLE_LIGHT, "Dimmable Light", Naming::Indexed("Light"), DIMMABLE),
    row(ZCL_HA_PROFILE_ID, HA_DEVICEID_COLORED_DIMMABLE_LIGHT, "Colour Dimmable Light", Naming::Indexed("ZLight"), COLOURABLE),
    row(ZCL_HA_PROFILE_ID, HA_DEVICEID_COLOR_DIMMER_SWITCH, "Colour Dimmer switch", Naming::Fixed("Colour Dimmer switch"), OUT_COLOR),
    row(ZCL_HA_PROFILE_ID, HA_DEVICEID_OCCUPANCY_SENSOR, "Occupancy Sensor", Naming::Fixed("Occupancy Sensor"), OUT_SWITCH),
    // Some vendors announce ZLL device ids under the HA profile.
    row(ZCL_HA_PROFILE_ID, ZLL_DEVICEID_EXTENDED_COLOR_LIGHT, "ZLL Light", Naming::Indexed("ZLL Light"), COLOURABLE),
    // Light Link
    row(ZLL_PROFILE_ID, ZLL_DEVICEID_ON_OFF_LIGHT, "On/Off Light", Naming::Indexed("On/Off Light"), SWITCHABLE),
    row(ZLL_PROFILE_ID, ZLL_DEVICEID_ON_OFF_PLUG_IN_UNIT, "On/Off Plug", Naming::Indexed("On/Off Plug"), SWITCHABLE),
    row(ZLL_PROFILE_ID, ZLL_DEVICEID_DIMMABLE_LIGHT, "Dimmable Light", Naming::Indexed("Dimmable Light"), DIMMABLE),
    row(ZLL_PROFILE_ID, ZLL_DEVICEID_DIMMABLE_PLUG_IN_UNIT, "Dimmable Plug", Naming::Indexed("Dimmable Plug"), DIMMABLE),
    row(ZLL_PROFILE_ID, ZLL_DEVICEID_COLOR_LIGHT, "Color Light", Naming::Indexed("Color Light"), COLOURABLE),
    row(ZLL_PROFILE_ID, ZLL_DEVICEID_EXTENDED_COLOR_LIGHT, "Extended Color Light", Naming::Indexed("Extended Color Light"), COLOURABLE),
    row(ZLL_PROFILE_ID, ZLL_DEVICEID_COLOR_TEMPERATURE_LIGHT, "Color Temp Light", Naming::Indexed("Color Temp Light"), COLOURABLE),
    row(ZLL_PROFILE_ID, ZLL_DEVICEID_COLOR_CONTROLLER, "Color Controller", Naming::Indexed("Color Controller"), OUT_COLOR),
    row(ZLL_PROFILE_ID, ZLL_DEVICEID_COLOR_SCENE_CONTROLLER, "Color Scene Controller", Naming::Indexed("Color Scene Controller"), OUT_COLOR.union(OUT_SCENES)),
    row(ZLL_PROFILE_ID, ZLL_DEVICEID_NON_COLOR_CONTROLLER, "Dimmable Scene Controller", Naming::Indexed("Dimmable Scene Controller"), OUT_LEVEL.union(OUT_SCENES)),
    row(ZLL_PROFILE_ID, ZLL_DEVICEID_NON_COLOR_SCENE_CONTROLLER, "Dimmable Controller", Naming::Indexed("Dimmable Controller"), OUT_LEVEL),
    row(ZLL_PROFILE_ID, ZLL_DEVICEID_CONTROL_BRIDGE, "Control Bridge", Naming::Indexed("Control Bridge"), OUT_COLOR.union(OUT_SCENES)),
    row(ZLL_PROFILE_ID, ZLL_DEVICEID_ON_OFF_SENSOR, "On/Off Sensor", Naming::Indexed("On/Off Sensor"), OUT_SWITCH),
];

/// Anything not in the table.
pub static UNKNOWN_DEVICE: DeviceKind = DeviceKind {
    profile_id: 0,
    device_id: 0,
    type_label: "Unknown Device",
    naming: Naming::Fixed("Unknown"),
    capabilities: Capabilities::empty(),
};

/// Find the table row for a device, falling back to [`UNKNOWN_DEVICE`].
pub fn lookup(profile_id: u16, device_id: u16) -> &'static DeviceKind {
    DEVICE_TABLE
        .iter()
        .find(|kind| kind.profile_id == profile_id && kind.device_id == device_id)
        .unwrap_or(&UNKNOWN_DEVICE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ha_dimmable_light() {
        let kind = lookup(ZCL_HA_PROFILE_ID, HA_DEVICEID_DIMMABLE_LIGHT);
        assert_eq!(kind.type_label, "Dimmable Light");
        assert_eq!(kind.naming.name_for(0, 1), "1: Light");
        assert_eq!(
            kind.capabilities,
            Capabilities::SWITCHABLE | Capabilities::DIMMABLE
        );
    }

    #[test]
    fn test_switch_is_named_after_its_button() {
        let kind = lookup(ZCL_HA_PROFILE_ID, HA_DEVICEID_ON_OFF_SWITCH);
        assert_eq!(kind.naming.name_for(4, 1), "Switch EP:1(DOWN)");
        assert_eq!(kind.naming.name_for(4, 5), "Switch EP:5(CENTER)");
        assert_eq!(kind.naming.name_for(4, 0x1a), "Switch EP:1a");
        assert!(kind.capabilities.contains(Capabilities::OUT_SWITCH));
    }

    #[test]
    fn test_zll_ids_under_ha_profile_are_colour_lights() {
        let kind = lookup(ZCL_HA_PROFILE_ID, ZLL_DEVICEID_EXTENDED_COLOR_LIGHT);
        assert_eq!(kind.naming.name_for(2, 1), "3: ZLL Light");
        assert!(kind.capabilities.contains(Capabilities::COLOURABLE));
    }

    #[test]
    fn test_scene_controllers_control_groups() {
        let kind = lookup(ZLL_PROFILE_ID, ZLL_DEVICEID_COLOR_SCENE_CONTROLLER);
        assert!(kind
            .capabilities
            .contains(Capabilities::OUT_SCENE | Capabilities::OUT_GROUP | Capabilities::OUT_COLOR));
        assert!(!kind.capabilities.intersects(Capabilities::SWITCHABLE_FAMILY));
    }

    #[test]
    fn test_unknown_device() {
        let kind = lookup(0x1234, 0x5678);
        assert_eq!(kind.type_label, "Unknown Device");
        assert_eq!(kind.naming.name_for(9, 1), "Unknown");
        assert!(kind.capabilities.is_empty());

        // ZLL on/off light shares id 0x0000 with the HA switch, but not the profile.
        assert_eq!(lookup(ZLL_PROFILE_ID, 0x0000).type_label, "On/Off Light");
    }

    #[test]
    fn test_table_has_no_duplicate_keys() {
        for (i, a) in DEVICE_TABLE.iter().enumerate() {
            for b in &DEVICE_TABLE[i + 1..] {
                assert!(
                    (a.profile_id, a.device_id) != (b.profile_id, b.device_id),
                    "duplicate row for {:04x}/{:04x}",
                    a.profile_id,
                    a.device_id
                );
            }
        }
    }
}
