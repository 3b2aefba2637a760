//! Protocol constants
//!
//! These constants define the command ids, address modes and ZigBee
//! identifiers used on the SRPC link.

// ============================================================================
// Frame Layout
// ============================================================================

/// Offset of the command id byte in a frame.
pub const SRPC_CMD_ID_POS: usize = 0;
/// Offset of the payload length byte in a frame.
pub const SRPC_CMD_LEN_POS: usize = 1;
/// Size of the frame header (command id + length).
pub const SRPC_HEADER_LEN: usize = 2;
/// Largest payload a single frame can carry.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;
/// Largest frame on the wire.
pub const MAX_FRAME_SIZE: usize = SRPC_HEADER_LEN + MAX_PAYLOAD_LEN;

/// TCP port the gateway listens on unless told otherwise.
pub const DEFAULT_GATEWAY_PORT: u16 = 11235;

// ============================================================================
// Inbound Frame Ids (gateway → client)
// ============================================================================

/// A device endpoint was discovered or listed.
pub const SRPC_NEW_DEVICE: u8 = 0x01;
/// Raw ZDO device announce.
pub const SRPC_DEV_ANNCE: u8 = 0x02;
/// Simple descriptor for an endpoint.
pub const SRPC_SIMPLE_DESC: u8 = 0x03;
/// Temperature sensor reading.
pub const SRPC_TEMP_READING: u8 = 0x04;
/// Metering reading.
pub const SRPC_POWER_READING: u8 = 0x05;
/// Gateway keep-alive.
pub const SRPC_PING: u8 = 0x06;
/// Answer to a get-device-state query.
pub const SRPC_GET_DEV_STATE_RSP: u8 = 0x07;
/// Answer to a get-device-level query.
pub const SRPC_GET_DEV_LEVEL_RSP: u8 = 0x08;
/// Answer to a get-device-hue query.
pub const SRPC_GET_DEV_HUE_RSP: u8 = 0x09;
/// Answer to a get-device-saturation query.
pub const SRPC_GET_DEV_SAT_RSP: u8 = 0x0a;
/// Confirmation of an add-group request.
pub const SRPC_ADD_GROUP_RSP: u8 = 0x0b;
/// One group listed by a discover-groups request.
pub const SRPC_GET_GROUP_RSP: u8 = 0x0c;
/// Confirmation of a store-scene request.
pub const SRPC_ADD_SCENE_RSP: u8 = 0x0d;
/// One scene listed by a discover-scenes request.
pub const SRPC_GET_SCENE_RSP: u8 = 0x0e;

// ============================================================================
// Outbound Command Ids (client → gateway)
// ============================================================================

/// Close the client session.
pub const SRPC_CLOSE: u8 = 0x80;
/// List every known device endpoint.
pub const SRPC_GET_DEVICES: u8 = 0x81;
/// Switch a device or group on or off.
pub const SRPC_SET_DEV_STATE: u8 = 0x82;
/// Move a device or group to a level.
pub const SRPC_SET_DEV_LEVEL: u8 = 0x83;
/// Move a device or group to a hue and saturation.
pub const SRPC_SET_DEV_COLOR: u8 = 0x84;
/// Read the on/off attribute.
pub const SRPC_GET_DEV_STATE: u8 = 0x85;
/// Read the current level attribute.
pub const SRPC_GET_DEV_LEVEL: u8 = 0x86;
/// Read the current hue attribute.
pub const SRPC_GET_DEV_HUE: u8 = 0x87;
/// Read the current saturation attribute.
pub const SRPC_GET_DEV_SAT: u8 = 0x88;
/// Bind a source endpoint to a destination on a cluster.
pub const SRPC_BIND_DEVICES: u8 = 0x89;
/// Read a thermometer (not served by current gateways).
pub const SRPC_GET_THERM_READING: u8 = 0x8a;
/// Read a power meter (not served by current gateways).
pub const SRPC_GET_POWER_READING: u8 = 0x8b;
/// Open the network for joining (not served by current gateways).
pub const SRPC_DISCOVER_DEVICES: u8 = 0x8c;
/// Raw ZCL passthrough (not served by current gateways).
pub const SRPC_SEND_ZCL: u8 = 0x8d;
/// List every group known to the gateway.
pub const SRPC_GET_GROUPS: u8 = 0x8e;
/// Create a group and optionally add a device to it.
pub const SRPC_ADD_GROUP: u8 = 0x8f;
/// List every scene known to the gateway.
pub const SRPC_GET_SCENES: u8 = 0x90;
/// Store the current state of a group as a scene.
pub const SRPC_STORE_SCENE: u8 = 0x91;
/// Recall a stored scene on a group.
pub const SRPC_RECALL_SCENE: u8 = 0x92;
/// Make a device identify itself.
pub const SRPC_IDENTIFY_DEVICE: u8 = 0x93;
/// Rename a device on the gateway.
pub const SRPC_CHANGE_DEVICE_NAME: u8 = 0x94;
/// Remove a device from the network.
pub const SRPC_REMOVE_DEVICE: u8 = 0x95;

// ============================================================================
// Address Modes
// ============================================================================

/// No address present.
pub const ADDR_NOT_PRESENT: u8 = 0;
/// Group id addressing.
pub const ADDR_GROUP: u8 = 1;
/// 16-bit network address.
pub const ADDR_16BIT: u8 = 2;
/// 64-bit extended (IEEE) address.
pub const ADDR_64BIT: u8 = 3;
/// Broadcast addressing.
pub const ADDR_BROADCAST: u8 = 15;

/// Endpoint used for group and broadcast destinations.
pub const BROADCAST_ENDPOINT: u8 = 0xFF;
/// Network address used when a request should not target any device.
pub const UNASSIGNED_NWK_ADDR: u16 = 0xFFFF;

// ============================================================================
// Field Sizes
// ============================================================================

/// Size of an IEEE (extended) address.
pub const IEEE_ADDR_LEN: usize = 8;
/// Size of the destination descriptor that prefixes most commands.
pub const DESTINATION_LEN: usize = 12;

// ============================================================================
// Profiles and Clusters
// ============================================================================

/// ZigBee Home Automation profile.
pub const ZCL_HA_PROFILE_ID: u16 = 0x0104;
/// ZigBee Light Link profile.
pub const ZLL_PROFILE_ID: u16 = 0xC05E;

/// Groups cluster.
pub const CLUSTER_GROUPS: u16 = 0x0004;
/// Scenes cluster.
pub const CLUSTER_SCENES: u16 = 0x0005;
/// On/off cluster.
pub const CLUSTER_ON_OFF: u16 = 0x0006;
/// Level control cluster.
pub const CLUSTER_LEVEL_CONTROL: u16 = 0x0008;
/// Color control cluster.
pub const CLUSTER_COLOR_CONTROL: u16 = 0x0300;

/// Transition time used when the caller does not pick one (tenths of a second).
pub const DEFAULT_TRANSITION_TIME: u16 = 10;

// ============================================================================
// HA Device Ids
// ============================================================================

/// HA on/off switch.
pub const HA_DEVICEID_ON_OFF_SWITCH: u16 = 0x0000;
/// HA level control switch.
pub const HA_DEVICEID_LEVEL_CONTROL_SWITCH: u16 = 0x0001;
/// HA on/off output.
pub const HA_DEVICEID_ON_OFF_OUTPUT: u16 = 0x0002;
/// HA mains power outlet.
pub const HA_DEVICEID_MAINS_POWER_OUTLET: u16 = 0x0009;
/// HA on/off light.
pub const HA_DEVICEID_ON_OFF_LIGHT: u16 = 0x0100;
/// HA dimmable light.
pub const HA_DEVICEID_DIMMABLE_LIGHT: u16 = 0x0101;
/// HA colored dimmable light.
pub const HA_DEVICEID_COLORED_DIMMABLE_LIGHT: u16 = 0x0102;
/// HA on/off light switch.
pub const HA_DEVICEID_ON_OFF_LIGHT_SWITCH: u16 = 0x0103;
/// HA dimmer switch.
pub const HA_DEVICEID_DIMMER_SWITCH: u16 = 0x0104;
/// HA color dimmer switch.
pub const HA_DEVICEID_COLOR_DIMMER_SWITCH: u16 = 0x0105;
/// HA light sensor.
pub const HA_DEVICEID_LIGHT_SENSOR: u16 = 0x0106;
/// HA occupancy sensor.
pub const HA_DEVICEID_OCCUPANCY_SENSOR: u16 = 0x0107;

// ============================================================================
// ZLL Device Ids
// ============================================================================

/// ZLL on/off light.
pub const ZLL_DEVICEID_ON_OFF_LIGHT: u16 = 0x0000;
/// ZLL on/off plug-in unit.
pub const ZLL_DEVICEID_ON_OFF_PLUG_IN_UNIT: u16 = 0x0010;
/// ZLL dimmable light.
pub const ZLL_DEVICEID_DIMMABLE_LIGHT: u16 = 0x0100;
/// ZLL dimmable plug-in unit.
pub const ZLL_DEVICEID_DIMMABLE_PLUG_IN_UNIT: u16 = 0x0110;
/// ZLL color light.
pub const ZLL_DEVICEID_COLOR_LIGHT: u16 = 0x0200;
/// ZLL extended color light.
pub const ZLL_DEVICEID_EXTENDED_COLOR_LIGHT: u16 = 0x0210;
/// ZLL color temperature light.
pub const ZLL_DEVICEID_COLOR_TEMPERATURE_LIGHT: u16 = 0x0220;
/// ZLL color controller.
pub const ZLL_DEVICEID_COLOR_CONTROLLER: u16 = 0x0800;
/// ZLL color scene controller.
pub const ZLL_DEVICEID_COLOR_SCENE_CONTROLLER: u16 = 0x0810;
/// ZLL non-color controller.
pub const ZLL_DEVICEID_NON_COLOR_CONTROLLER: u16 = 0x0820;
/// ZLL non-color scene controller.
pub const ZLL_DEVICEID_NON_COLOR_SCENE_CONTROLLER: u16 = 0x0830;
/// ZLL control bridge.
pub const ZLL_DEVICEID_CONTROL_BRIDGE: u16 = 0x0840;
/// ZLL on/off sensor.
pub const ZLL_DEVICEID_ON_OFF_SENSOR: u16 = 0x0850;
