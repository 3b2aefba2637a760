//! Commands that can be sent to the gateway.

use bytes::BufMut;

use crate::constants::*;
use crate::error::*;
use crate::frame::{encode_frame, split_frame};
use crate::types::*;

/// Commands that can be sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// End the client session.
    Close,

    /// Ask the gateway to list every device endpoint it knows.
    GetDevices,

    /// Switch a device or group on or off.
    SetDeviceState {
        /// Target.
        dest: Destination,
        /// New on/off state.
        on: bool,
    },

    /// Move a device or group to a level.
    SetDeviceLevel {
        /// Target.
        dest: Destination,
        /// Level (0-255).
        level: u8,
        /// Transition time in tenths of a second.
        transition_time: u16,
    },

    /// Move a device or group to a hue and saturation.
    SetDeviceColor {
        /// Target.
        dest: Destination,
        /// Hue (0-255, wraps).
        hue: u8,
        /// Saturation (0-254).
        saturation: u8,
        /// Transition time in tenths of a second.
        transition_time: u16,
    },

    /// Read the on/off attribute.
    GetDeviceState {
        /// Target.
        dest: Destination,
    },

    /// Read the current level attribute.
    GetDeviceLevel {
        /// Target.
        dest: Destination,
    },

    /// Read the current hue attribute.
    GetDeviceHue {
        /// Target.
        dest: Destination,
    },

    /// Read the current saturation attribute.
    GetDeviceSat {
        /// Target.
        dest: Destination,
    },

    /// Bind a source endpoint to a destination endpoint on one cluster.
    BindDevices {
        /// Network address of the source (controlling) node.
        src_addr: u16,
        /// Source endpoint.
        src_endpoint: u8,
        /// IEEE address of the source node.
        src_ieee: IeeeAddress,
        /// Destination endpoint.
        dst_endpoint: u8,
        /// IEEE address of the destination node.
        dst_ieee: IeeeAddress,
        /// Cluster to bind.
        cluster_id: u16,
    },

    /// Ask the gateway to list every group it knows.
    DiscoverGroups,

    /// Create a group, adding the destination device to it.
    AddGroup {
        /// Device to add. [`UNASSIGNED_NWK_ADDR`] creates an empty group.
        dest: Destination,
        /// Group name.
        name: String,
    },

    /// Ask the gateway to list every scene it knows.
    DiscoverScenes,

    /// Store the current state of a group as a named scene.
    StoreScene {
        /// Group the scene belongs to.
        group_id: u16,
        /// Scene name.
        name: String,
    },

    /// Recall a named scene on a group.
    RecallScene {
        /// Group the scene belongs to.
        group_id: u16,
        /// Scene name.
        name: String,
    },

    /// Make a device identify itself.
    IdentifyDevice {
        /// Target.
        dest: Destination,
        /// How long to identify for, in seconds.
        identify_time: u16,
    },

    /// Rename a device on the gateway.
    ChangeDeviceName {
        /// Network address of the device.
        nwk_addr: u16,
        /// New name.
        name: String,
    },

    /// Remove a device from the network.
    RemoveDevice {
        /// IEEE address of the node.
        ieee: IeeeAddress,
    },
}

impl Command {
    /// Get the command id for this command.
    pub fn code(&self) -> u8 {
        match self {
            Command::Close => SRPC_CLOSE,
            Command::GetDevices => SRPC_GET_DEVICES,
            Command::SetDeviceState { .. } => SRPC_SET_DEV_STATE,
            Command::SetDeviceLevel { .. } => SRPC_SET_DEV_LEVEL,
            Command::SetDeviceColor { .. } => SRPC_SET_DEV_COLOR,
            Command::GetDeviceState { .. } => SRPC_GET_DEV_STATE,
            Command::GetDeviceLevel { .. } => SRPC_GET_DEV_LEVEL,
            Command::GetDeviceHue { .. } => SRPC_GET_DEV_HUE,
            Command::GetDeviceSat { .. } => SRPC_GET_DEV_SAT,
            Command::BindDevices { .. } => SRPC_BIND_DEVICES,
            Command::DiscoverGroups => SRPC_GET_GROUPS,
            Command::AddGroup { .. } => SRPC_ADD_GROUP,
            Command::DiscoverScenes => SRPC_GET_SCENES,
            Command::StoreScene { .. } => SRPC_STORE_SCENE,
            Command::RecallScene { .. } => SRPC_RECALL_SCENE,
            Command::IdentifyDevice { .. } => SRPC_IDENTIFY_DEVICE,
            Command::ChangeDeviceName { .. } => SRPC_CHANGE_DEVICE_NAME,
            Command::RemoveDevice { .. } => SRPC_REMOVE_DEVICE,
        }
    }

    /// The destination descriptor carried by this command, if any.
    pub fn destination(&self) -> Option<Destination> {
        match self {
            Command::SetDeviceState { dest, .. }
            | Command::SetDeviceLevel { dest, .. }
            | Command::SetDeviceColor { dest, .. }
            | Command::GetDeviceState { dest }
            | Command::GetDeviceLevel { dest }
            | Command::GetDeviceHue { dest }
            | Command::GetDeviceSat { dest }
            | Command::AddGroup { dest, .. }
            | Command::IdentifyDevice { dest, .. } => Some(*dest),
            Command::StoreScene { group_id, .. } | Command::RecallScene { group_id, .. } => {
                Some(Destination::group(*group_id))
            }
            _ => None,
        }
    }

    /// Encode the payload (everything after the 2-byte header).
    pub fn encode_payload(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut buf = Vec::with_capacity(MAX_PAYLOAD_LEN);

        match self {
            Command::Close
            | Command::GetDevices
            | Command::DiscoverGroups
            | Command::DiscoverScenes => {}

            Command::SetDeviceState { dest, on } => {
                dest.encode_into(&mut buf);
                buf.put_u8(u8::from(*on));
            }

            Command::SetDeviceLevel {
                dest,
                level,
                transition_time,
            } => {
                dest.encode_into(&mut buf);
                buf.put_u8(*level);
                buf.put_u16_le(*transition_time);
            }

            Command::SetDeviceColor {
                dest,
                hue,
                saturation,
                transition_time,
            } => {
                dest.encode_into(&mut buf);
                buf.put_u8(*hue);
                buf.put_u8(*saturation);
                buf.put_u16_le(*transition_time);
            }

            Command::GetDeviceState { dest }
            | Command::GetDeviceLevel { dest }
            | Command::GetDeviceHue { dest }
            | Command::GetDeviceSat { dest } => {
                dest.encode_into(&mut buf);
            }

            Command::BindDevices {
                src_addr,
                src_endpoint,
                src_ieee,
                dst_endpoint,
                dst_ieee,
                cluster_id,
            } => {
                buf.put_u16_le(*src_addr);
                buf.put_u8(*src_endpoint);
                buf.put_slice(src_ieee.as_bytes());
                buf.put_u8(*dst_endpoint);
                buf.put_slice(dst_ieee.as_bytes());
                buf.put_u16_le(*cluster_id);
            }

            Command::AddGroup { dest, name } => {
                dest.encode_into(&mut buf);
                put_name(&mut buf, name)?;
            }

            Command::StoreScene { group_id, name } | Command::RecallScene { group_id, name } => {
                Destination::group(*group_id).encode_into(&mut buf);
                buf.put_u16_le(*group_id);
                put_name(&mut buf, name)?;
            }

            Command::IdentifyDevice {
                dest,
                identify_time,
            } => {
                dest.encode_into(&mut buf);
                buf.put_u16_le(*identify_time);
            }

            Command::ChangeDeviceName { nwk_addr, name } => {
                buf.put_u16_le(*nwk_addr);
                put_name(&mut buf, name)?;
            }

            Command::RemoveDevice { ieee } => {
                buf.put_slice(ieee.as_bytes());
            }
        }

        Ok(buf)
    }

    /// Encode the command as a complete frame.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        encode_frame(self.code(), &self.encode_payload()?)
    }

    /// Decode a command from the front of `buf`.
    ///
    /// Returns the command and the number of bytes consumed, or `Ok(None)` if
    /// `buf` does not yet hold a whole frame.
    pub fn decode(buf: &[u8]) -> Result<Option<(Self, usize)>, ProtocolError> {
        let Some((code, payload, consumed)) = split_frame(buf) else {
            return Ok(None);
        };
        let command = Self::decode_payload(code, payload)?;
        Ok(Some((command, consumed)))
    }

    /// Decode a command from its id and payload.
    pub fn decode_payload(code: u8, payload: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = PayloadReader::new(payload);

        let command = match code {
            SRPC_CLOSE => Command::Close,
            SRPC_GET_DEVICES => Command::GetDevices,
            SRPC_GET_GROUPS => Command::DiscoverGroups,
            SRPC_GET_SCENES => Command::DiscoverScenes,

            SRPC_SET_DEV_STATE => {
                let dest = Destination::decode_from(&mut r)?;
                Command::SetDeviceState {
                    dest,
                    on: r.u8()? != 0,
                }
            }

            SRPC_SET_DEV_LEVEL => {
                let dest = Destination::decode_from(&mut r)?;
                Command::SetDeviceLevel {
                    dest,
                    level: r.u8()?,
                    transition_time: r.u16()?,
                }
            }

            SRPC_SET_DEV_COLOR => {
                let dest = Destination::decode_from(&mut r)?;
                Command::SetDeviceColor {
                    dest,
                    hue: r.u8()?,
                    saturation: r.u8()?,
                    transition_time: r.u16()?,
                }
            }

            SRPC_GET_DEV_STATE => Command::GetDeviceState {
                dest: Destination::decode_from(&mut r)?,
            },
            SRPC_GET_DEV_LEVEL => Command::GetDeviceLevel {
                dest: Destination::decode_from(&mut r)?,
            },
            SRPC_GET_DEV_HUE => Command::GetDeviceHue {
                dest: Destination::decode_from(&mut r)?,
            },
            SRPC_GET_DEV_SAT => Command::GetDeviceSat {
                dest: Destination::decode_from(&mut r)?,
            },

            SRPC_BIND_DEVICES => Command::BindDevices {
                src_addr: r.u16()?,
                src_endpoint: r.u8()?,
                src_ieee: r.ieee()?,
                dst_endpoint: r.u8()?,
                dst_ieee: r.ieee()?,
                cluster_id: r.u16()?,
            },

            SRPC_ADD_GROUP => {
                let dest = Destination::decode_from(&mut r)?;
                Command::AddGroup {
                    dest,
                    name: r.name()?,
                }
            }

            SRPC_STORE_SCENE | SRPC_RECALL_SCENE => {
                // The descriptor repeats the group id; the explicit field wins.
                let _dest = Destination::decode_from(&mut r)?;
                let group_id = r.u16()?;
                let name = r.name()?;
                if code == SRPC_STORE_SCENE {
                    Command::StoreScene { group_id, name }
                } else {
                    Command::RecallScene { group_id, name }
                }
            }

            SRPC_IDENTIFY_DEVICE => {
                let dest = Destination::decode_from(&mut r)?;
                Command::IdentifyDevice {
                    dest,
                    identify_time: r.u16()?,
                }
            }

            SRPC_CHANGE_DEVICE_NAME => Command::ChangeDeviceName {
                nwk_addr: r.u16()?,
                name: r.name()?,
            },

            SRPC_REMOVE_DEVICE => Command::RemoveDevice { ieee: r.ieee()? },

            other => return Err(ProtocolError::UnknownCommand(other)),
        };

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_state_frame_matches_gateway_layout() {
        let cmd = Command::SetDeviceState {
            dest: Destination::network(0x1234, 1),
            on: true,
        };
        let frame = cmd.encode().unwrap();

        assert_eq!(frame.len(), 15);
        assert_eq!(frame[0], SRPC_SET_DEV_STATE);
        assert_eq!(frame[1], 13);
        assert_eq!(frame[2], ADDR_16BIT);
        assert_eq!(&frame[3..5], &[0x34, 0x12]);
        assert_eq!(frame[11], 1);
        assert_eq!(frame[14], 1);
    }

    #[test]
    fn test_set_color_to_device_and_group() {
        let to_device = Command::SetDeviceColor {
            dest: Destination::network(0xBEEF, 2),
            hue: 128,
            saturation: 200,
            transition_time: DEFAULT_TRANSITION_TIME,
        }
        .encode()
        .unwrap();
        assert_eq!(to_device[1], 16);
        assert_eq!(to_device[2], ADDR_16BIT);
        assert_eq!(&to_device[3..5], &[0xEF, 0xBE]);
        assert_eq!(to_device[11], 2);
        assert_eq!(&to_device[14..18], &[128, 200, 10, 0]);

        let to_group = Command::SetDeviceColor {
            dest: Destination::group(3),
            hue: 128,
            saturation: 200,
            transition_time: DEFAULT_TRANSITION_TIME,
        }
        .encode()
        .unwrap();
        assert_eq!(to_group[2], ADDR_GROUP);
        assert_eq!(&to_group[3..5], &[3, 0]);
        assert_eq!(to_group[11], BROADCAST_ENDPOINT);
    }

    #[test]
    fn test_level_and_identify_lengths() {
        let level = Command::SetDeviceLevel {
            dest: Destination::network(1, 1),
            level: 0x80,
            transition_time: 10,
        };
        assert_eq!(level.encode().unwrap()[1], 15);

        let identify = Command::IdentifyDevice {
            dest: Destination::network(1, 1),
            identify_time: 5,
        };
        assert_eq!(identify.encode().unwrap()[1], 14);
    }

    #[test]
    fn test_bind_devices_layout() {
        let cmd = Command::BindDevices {
            src_addr: 0x0102,
            src_endpoint: 1,
            src_ieee: IeeeAddress::new([0xA0; 8]),
            dst_endpoint: 11,
            dst_ieee: IeeeAddress::new([0xB0; 8]),
            cluster_id: CLUSTER_ON_OFF,
        };
        let frame = cmd.encode().unwrap();

        assert_eq!(frame[1], 22);
        assert_eq!(&frame[2..4], &[0x02, 0x01]);
        assert_eq!(frame[4], 1);
        assert_eq!(&frame[5..13], &[0xA0; 8]);
        assert_eq!(frame[13], 11);
        assert_eq!(&frame[14..22], &[0xB0; 8]);
        assert_eq!(&frame[22..24], &[0x06, 0x00]);
    }

    #[test]
    fn test_store_scene_addresses_the_group() {
        let cmd = Command::StoreScene {
            group_id: 0x0203,
            name: "Evening".to_string(),
        };
        assert_eq!(cmd.destination(), Some(Destination::group(0x0203)));

        let frame = cmd.encode().unwrap();
        assert_eq!(frame[1] as usize, 15 + "Evening".len());
        assert_eq!(frame[2], ADDR_GROUP);
        assert_eq!(frame[11], BROADCAST_ENDPOINT);
        assert_eq!(&frame[14..16], &[0x03, 0x02]);
        assert_eq!(frame[16], 7);
        assert_eq!(&frame[17..], b"Evening");
    }

    #[test]
    fn test_commands_survive_decode() {
        let light = Destination::network(0x1234, 11);
        let commands = vec![
            Command::Close,
            Command::GetDevices,
            Command::DiscoverGroups,
            Command::DiscoverScenes,
            Command::SetDeviceState {
                dest: light,
                on: true,
            },
            Command::SetDeviceState {
                dest: Destination::group(3),
                on: false,
            },
            Command::SetDeviceLevel {
                dest: light,
                level: 200,
                transition_time: 10,
            },
            Command::SetDeviceColor {
                dest: Destination::group(9),
                hue: 128,
                saturation: 200,
                transition_time: 0x0102,
            },
            Command::GetDeviceState { dest: light },
            Command::GetDeviceLevel { dest: light },
            Command::GetDeviceHue { dest: light },
            Command::GetDeviceSat { dest: light },
            Command::BindDevices {
                src_addr: 0x0001,
                src_endpoint: 1,
                src_ieee: IeeeAddress::new([1, 2, 3, 4, 5, 6, 7, 8]),
                dst_endpoint: 11,
                dst_ieee: IeeeAddress::new([8, 7, 6, 5, 4, 3, 2, 1]),
                cluster_id: CLUSTER_LEVEL_CONTROL,
            },
            Command::IdentifyDevice {
                dest: light,
                identify_time: 5,
            },
            Command::StoreScene {
                group_id: 7,
                name: "Evening".to_string(),
            },
            Command::AddGroup {
                dest: Destination::network(UNASSIGNED_NWK_ADDR, BROADCAST_ENDPOINT),
                name: "Kitchen".to_string(),
            },
            Command::RecallScene {
                group_id: 7,
                name: "Movie".to_string(),
            },
            Command::ChangeDeviceName {
                nwk_addr: 0x4321,
                name: "Porch".to_string(),
            },
            Command::RemoveDevice {
                ieee: IeeeAddress::new([9, 8, 7, 6, 5, 4, 3, 2]),
            },
        ];

        for cmd in commands {
            let frame = cmd.encode().unwrap();
            let (decoded, consumed) = Command::decode(&frame).unwrap().unwrap();
            assert_eq!(decoded, cmd);
            assert_eq!(consumed, frame.len());
        }
    }

    #[test]
    fn test_oversized_group_name_is_rejected() {
        let cmd = Command::AddGroup {
            dest: Destination::network(1, 1),
            name: "x".repeat(250),
        };
        assert!(matches!(
            cmd.encode(),
            Err(ProtocolError::NameTooLong { len: 250, .. })
        ));
    }

    #[test]
    fn test_response_id_is_not_a_command() {
        assert_eq!(
            Command::decode_payload(SRPC_NEW_DEVICE, &[]),
            Err(ProtocolError::UnknownCommand(SRPC_NEW_DEVICE))
        );
    }
}
