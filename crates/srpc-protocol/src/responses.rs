//! Responses and events from the gateway.

use bytes::BufMut;

use crate::constants::*;
use crate::error::*;
use crate::frame::encode_frame;
use crate::types::*;

/// A device endpoint reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAnnouncement {
    /// 16-bit network address.
    pub nwk_addr: u16,
    /// Endpoint on the node.
    pub endpoint: u8,
    /// Application profile (HA or ZLL).
    pub profile_id: u16,
    /// Device id within the profile.
    pub device_id: u16,
    /// Device version.
    pub version: u8,
    /// Name stored on the gateway. Usually empty.
    pub name: String,
    /// Gateway-side status byte.
    pub status: u8,
    /// IEEE address of the node.
    pub ieee: IeeeAddress,
}

/// Which attribute an attribute response carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// On/off state.
    State,
    /// Current level.
    Level,
    /// Current hue.
    Hue,
    /// Current saturation.
    Saturation,
}

impl AttributeKind {
    /// All attributes, in query order.
    pub const ALL: [AttributeKind; 4] = [
        AttributeKind::State,
        AttributeKind::Level,
        AttributeKind::Hue,
        AttributeKind::Saturation,
    ];

    /// Id of the response frame that carries this attribute.
    pub fn response_code(self) -> u8 {
        match self {
            AttributeKind::State => SRPC_GET_DEV_STATE_RSP,
            AttributeKind::Level => SRPC_GET_DEV_LEVEL_RSP,
            AttributeKind::Hue => SRPC_GET_DEV_HUE_RSP,
            AttributeKind::Saturation => SRPC_GET_DEV_SAT_RSP,
        }
    }

    fn from_response_code(code: u8) -> Option<Self> {
        match code {
            SRPC_GET_DEV_STATE_RSP => Some(AttributeKind::State),
            SRPC_GET_DEV_LEVEL_RSP => Some(AttributeKind::Level),
            SRPC_GET_DEV_HUE_RSP => Some(AttributeKind::Hue),
            SRPC_GET_DEV_SAT_RSP => Some(AttributeKind::Saturation),
            _ => None,
        }
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AttributeKind::State => "state",
            AttributeKind::Level => "level",
            AttributeKind::Hue => "hue",
            AttributeKind::Saturation => "saturation",
        };
        f.pad(name)
    }
}

/// One attribute value read from a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeValue {
    /// Which attribute.
    pub kind: AttributeKind,
    /// Network address of the reporting node.
    pub nwk_addr: u16,
    /// Reporting endpoint.
    pub endpoint: u8,
    /// Attribute value.
    pub value: u8,
}

/// A group as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    /// Group id.
    pub group_id: u16,
    /// Group name.
    pub name: String,
}

/// A scene as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneInfo {
    /// Group the scene belongs to.
    pub group_id: u16,
    /// Scene id within the group.
    pub scene_id: u8,
    /// Scene name.
    pub name: String,
}

/// Frames received from the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A device endpoint was discovered or listed.
    NewDevice(DeviceAnnouncement),

    /// Answer to an attribute query.
    Attribute(AttributeValue),

    /// A group was created.
    GroupAdded(GroupInfo),

    /// A group listed by discover-groups.
    GroupListed(GroupInfo),

    /// A scene was stored.
    SceneAdded(SceneInfo),

    /// A scene listed by discover-scenes.
    SceneListed(SceneInfo),

    /// A recognised frame the client does not act on (announce, simple
    /// descriptor, sensor readings, ping).
    Unhandled {
        /// Command id.
        cmd_id: u8,
        /// Raw payload.
        payload: Vec<u8>,
    },
}

impl Response {
    /// Whether `code` is an inbound frame id this client understands.
    pub fn is_known(code: u8) -> bool {
        (SRPC_NEW_DEVICE..=SRPC_GET_SCENE_RSP).contains(&code)
    }

    /// Get the command id for this response.
    pub fn code(&self) -> u8 {
        match self {
            Response::NewDevice(_) => SRPC_NEW_DEVICE,
            Response::Attribute(attr) => attr.kind.response_code(),
            Response::GroupAdded(_) => SRPC_ADD_GROUP_RSP,
            Response::GroupListed(_) => SRPC_GET_GROUP_RSP,
            Response::SceneAdded(_) => SRPC_ADD_SCENE_RSP,
            Response::SceneListed(_) => SRPC_GET_SCENE_RSP,
            Response::Unhandled { cmd_id, .. } => *cmd_id,
        }
    }

    /// Decode a response from its id and payload.
    pub fn decode_payload(code: u8, payload: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = PayloadReader::new(payload);

        let response = match code {
            SRPC_NEW_DEVICE => Response::NewDevice(DeviceAnnouncement {
                nwk_addr: r.u16()?,
                endpoint: r.u8()?,
                profile_id: r.u16()?,
                device_id: r.u16()?,
                version: r.u8()?,
                name: r.name()?,
                status: r.u8()?,
                ieee: r.ieee()?,
            }),

            SRPC_DEV_ANNCE | SRPC_SIMPLE_DESC | SRPC_TEMP_READING | SRPC_POWER_READING
            | SRPC_PING => Response::Unhandled {
                cmd_id: code,
                payload: payload.to_vec(),
            },

            SRPC_GET_DEV_STATE_RSP | SRPC_GET_DEV_LEVEL_RSP | SRPC_GET_DEV_HUE_RSP
            | SRPC_GET_DEV_SAT_RSP => {
                let kind = AttributeKind::from_response_code(code)
                    .ok_or(ProtocolError::UnknownCommand(code))?;
                Response::Attribute(AttributeValue {
                    kind,
                    nwk_addr: r.u16()?,
                    endpoint: r.u8()?,
                    value: r.u8()?,
                })
            }

            SRPC_ADD_GROUP_RSP | SRPC_GET_GROUP_RSP => {
                let info = GroupInfo {
                    group_id: r.u16()?,
                    name: r.name()?,
                };
                if code == SRPC_ADD_GROUP_RSP {
                    Response::GroupAdded(info)
                } else {
                    Response::GroupListed(info)
                }
            }

            SRPC_ADD_SCENE_RSP | SRPC_GET_SCENE_RSP => {
                let info = SceneInfo {
                    group_id: r.u16()?,
                    scene_id: r.u8()?,
                    name: r.name()?,
                };
                if code == SRPC_ADD_SCENE_RSP {
                    Response::SceneAdded(info)
                } else {
                    Response::SceneListed(info)
                }
            }

            other => return Err(ProtocolError::UnknownCommand(other)),
        };

        Ok(response)
    }

    /// Encode the response as a complete frame, the way the gateway sends it.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut buf = Vec::new();

        match self {
            Response::NewDevice(dev) => {
                buf.put_u16_le(dev.nwk_addr);
                buf.put_u8(dev.endpoint);
                buf.put_u16_le(dev.profile_id);
                buf.put_u16_le(dev.device_id);
                buf.put_u8(dev.version);
                put_name(&mut buf, &dev.name)?;
                buf.put_u8(dev.status);
                buf.put_slice(dev.ieee.as_bytes());
            }
            Response::Attribute(attr) => {
                buf.put_u16_le(attr.nwk_addr);
                buf.put_u8(attr.endpoint);
                buf.put_u8(attr.value);
            }
            Response::GroupAdded(group) | Response::GroupListed(group) => {
                buf.put_u16_le(group.group_id);
                put_name(&mut buf, &group.name)?;
            }
            Response::SceneAdded(scene) | Response::SceneListed(scene) => {
                buf.put_u16_le(scene.group_id);
                buf.put_u8(scene.scene_id);
                put_name(&mut buf, &scene.name)?;
            }
            Response::Unhandled { payload, .. } => buf.put_slice(payload),
        }

        encode_frame(self.code(), &buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::decode_frame;

    #[test]
    fn test_decode_new_device() {
        let mut frame = vec![SRPC_NEW_DEVICE, 23];
        frame.extend_from_slice(&[0x34, 0x12]); // nwk
        frame.push(0x0B); // endpoint
        frame.extend_from_slice(&[0x04, 0x01]); // HA profile
        frame.extend_from_slice(&[0x01, 0x01]); // dimmable light
        frame.push(0x02); // version
        frame.push(5);
        frame.extend_from_slice(b"Light");
        frame.push(0x00); // status
        frame.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

        let (response, used) = decode_frame(&frame, 0).unwrap().unwrap();
        assert_eq!(used, frame.len());

        let Response::NewDevice(dev) = response else {
            panic!("expected NewDevice, got {response:?}");
        };
        assert_eq!(dev.nwk_addr, 0x1234);
        assert_eq!(dev.endpoint, 0x0B);
        assert_eq!(dev.profile_id, ZCL_HA_PROFILE_ID);
        assert_eq!(dev.device_id, HA_DEVICEID_DIMMABLE_LIGHT);
        assert_eq!(dev.version, 2);
        assert_eq!(dev.name, "Light");
        assert_eq!(dev.ieee, IeeeAddress::new([1, 2, 3, 4, 5, 6, 7, 8]));
    }

    #[test]
    fn test_new_device_encodes_name_length() {
        let dev = DeviceAnnouncement {
            nwk_addr: 1,
            endpoint: 1,
            profile_id: ZLL_PROFILE_ID,
            device_id: ZLL_DEVICEID_COLOR_LIGHT,
            version: 0,
            name: String::new(),
            status: 0,
            ieee: IeeeAddress::default(),
        };
        let frame = Response::NewDevice(dev).encode().unwrap();
        assert_eq!(frame[1], 18);
    }

    #[test]
    fn test_decode_group_and_scene_responses() {
        let frame = [SRPC_ADD_GROUP_RSP, 10, 7, 0, 7, b'K', b'i', b't', b'c', b'h', b'e', b'n'];
        let (response, _) = decode_frame(&frame, 0).unwrap().unwrap();
        assert_eq!(
            response,
            Response::GroupAdded(GroupInfo {
                group_id: 7,
                name: "Kitchen".to_string()
            })
        );

        let scene = Response::SceneListed(SceneInfo {
            group_id: 7,
            scene_id: 3,
            name: "Dinner".to_string(),
        });
        let frame = scene.encode().unwrap();
        assert_eq!(frame[1] as usize, 4 + "Dinner".len());
        assert_eq!(decode_frame(&frame, 0).unwrap().unwrap().0, scene);
    }

    #[test]
    fn test_opaque_frames_are_kept_raw() {
        let frame = [SRPC_TEMP_READING, 3, 0xAA, 0xBB, 0xCC];
        let (response, used) = decode_frame(&frame, 0).unwrap().unwrap();
        assert_eq!(used, 5);
        assert_eq!(
            response,
            Response::Unhandled {
                cmd_id: SRPC_TEMP_READING,
                payload: vec![0xAA, 0xBB, 0xCC]
            }
        );
    }

    #[test]
    fn test_invalid_utf8_name() {
        let frame = [SRPC_GET_GROUP_RSP, 4, 1, 0, 1, 0xFF];
        assert_eq!(decode_frame(&frame, 0), Err(ProtocolError::InvalidUtf8));
    }

    #[test]
    fn test_known_ids() {
        assert!(!Response::is_known(0x00));
        assert!(Response::is_known(SRPC_NEW_DEVICE));
        assert!(Response::is_known(SRPC_GET_SCENE_RSP));
        assert!(!Response::is_known(0x0f));
        assert!(!Response::is_known(SRPC_CLOSE));
    }
}
