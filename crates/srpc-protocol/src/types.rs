//! Common types used in the protocol.

use bytes::{Buf, BufMut};

use crate::constants::*;
use crate::error::*;

/// A 64-bit IEEE (extended) address, stored in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IeeeAddress(pub [u8; IEEE_ADDR_LEN]);

impl IeeeAddress {
    /// Create a new address from bytes.
    pub fn new(bytes: [u8; IEEE_ADDR_LEN]) -> Self {
        IeeeAddress(bytes)
    }

    /// Create from a slice. Returns None if slice is wrong length.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == IEEE_ADDR_LEN {
            let mut bytes = [0u8; IEEE_ADDR_LEN];
            bytes.copy_from_slice(slice);
            Some(IeeeAddress(bytes))
        } else {
            None
        }
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; IEEE_ADDR_LEN] {
        &self.0
    }

    /// The address as a number, treating the wire bytes as little-endian.
    pub fn as_u64(&self) -> u64 {
        u64::from_le_bytes(self.0)
    }

    /// Get the bytes as a hex string (wire order).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for IeeeAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016X}", self.as_u64())
    }
}

impl AsRef<[u8]> for IeeeAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// How the address in a [`Destination`] is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// No address.
    NotPresent,
    /// Group id.
    Group,
    /// 16-bit network address.
    Network,
    /// 64-bit IEEE address.
    Extended,
    /// Broadcast.
    Broadcast,
}

impl TryFrom<u8> for AddrMode {
    type Error = ProtocolError;

    fn try_from(mode: u8) -> Result<Self, Self::Error> {
        match mode {
            ADDR_NOT_PRESENT => Ok(AddrMode::NotPresent),
            ADDR_GROUP => Ok(AddrMode::Group),
            ADDR_16BIT => Ok(AddrMode::Network),
            ADDR_64BIT => Ok(AddrMode::Extended),
            ADDR_BROADCAST => Ok(AddrMode::Broadcast),
            other => Err(ProtocolError::InvalidAddrMode(other)),
        }
    }
}

impl From<AddrMode> for u8 {
    fn from(mode: AddrMode) -> Self {
        match mode {
            AddrMode::NotPresent => ADDR_NOT_PRESENT,
            AddrMode::Group => ADDR_GROUP,
            AddrMode::Network => ADDR_16BIT,
            AddrMode::Extended => ADDR_64BIT,
            AddrMode::Broadcast => ADDR_BROADCAST,
        }
    }
}

/// Where a command is delivered.
///
/// On the wire this is a 12-byte descriptor:
///
/// ```text
/// +------+-----------------+----+--------+
/// | mode | addr (8 bytes)  | ep | pan_id |
/// +------+-----------------+----+--------+
/// ```
///
/// Group and 16-bit modes put the short address in the first two address
/// bytes and leave the other six zero. The pan id is reserved and always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Every member of a group. The endpoint is always [`BROADCAST_ENDPOINT`].
    Group {
        /// Group id assigned by the gateway.
        group_id: u16,
    },
    /// A single endpoint addressed by network address.
    Network {
        /// 16-bit network address.
        addr: u16,
        /// Endpoint on that node.
        endpoint: u8,
    },
    /// A single endpoint addressed by IEEE address.
    Extended {
        /// IEEE address of the node.
        ieee: IeeeAddress,
        /// Endpoint on that node.
        endpoint: u8,
    },
    /// Broadcast to a well-known broadcast address.
    Broadcast {
        /// Broadcast network address (0xFFFF, 0xFFFD, 0xFFFC).
        addr: u16,
        /// Endpoint, usually [`BROADCAST_ENDPOINT`].
        endpoint: u8,
    },
}

impl Destination {
    /// A unicast destination by network address.
    pub fn network(addr: u16, endpoint: u8) -> Self {
        Destination::Network { addr, endpoint }
    }

    /// A group destination.
    pub fn group(group_id: u16) -> Self {
        Destination::Group { group_id }
    }

    /// The address mode written on the wire.
    pub fn addr_mode(&self) -> AddrMode {
        match self {
            Destination::Group { .. } => AddrMode::Group,
            Destination::Network { .. } => AddrMode::Network,
            Destination::Extended { .. } => AddrMode::Extended,
            Destination::Broadcast { .. } => AddrMode::Broadcast,
        }
    }

    /// The endpoint written on the wire.
    pub fn endpoint(&self) -> u8 {
        match self {
            Destination::Group { .. } => BROADCAST_ENDPOINT,
            Destination::Network { endpoint, .. }
            | Destination::Extended { endpoint, .. }
            | Destination::Broadcast { endpoint, .. } => *endpoint,
        }
    }

    /// Append the 12-byte descriptor to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.put_u8(self.addr_mode().into());
        match self {
            Destination::Group { group_id: short }
            | Destination::Network { addr: short, .. }
            | Destination::Broadcast { addr: short, .. } => {
                buf.put_u16_le(*short);
                buf.put_bytes(0, IEEE_ADDR_LEN - 2);
            }
            Destination::Extended { ieee, .. } => buf.put_slice(ieee.as_bytes()),
        }
        buf.put_u8(self.endpoint());
        // pan id
        buf.put_u16_le(0);
    }

    /// Read a descriptor from the front of `reader`.
    pub(crate) fn decode_from(reader: &mut PayloadReader<'_>) -> Result<Self, ProtocolError> {
        reader.require(DESTINATION_LEN)?;
        let mode = AddrMode::try_from(reader.u8()?)?;
        let addr_bytes = reader.bytes(IEEE_ADDR_LEN)?;
        let short = u16::from_le_bytes([addr_bytes[0], addr_bytes[1]]);
        let endpoint = reader.u8()?;
        let _pan_id = reader.u16()?;

        match mode {
            AddrMode::Group => Ok(Destination::Group { group_id: short }),
            AddrMode::Network => Ok(Destination::Network { addr: short, endpoint }),
            AddrMode::Broadcast => Ok(Destination::Broadcast { addr: short, endpoint }),
            AddrMode::Extended => {
                let ieee = IeeeAddress::from_slice(addr_bytes)
                    .ok_or_else(|| ProtocolError::InvalidData("short IEEE address".to_string()))?;
                Ok(Destination::Extended { ieee, endpoint })
            }
            AddrMode::NotPresent => Err(ProtocolError::InvalidAddrMode(ADDR_NOT_PRESENT)),
        }
    }
}

/// Bounds-checked cursor over a frame payload.
#[derive(Debug)]
pub(crate) struct PayloadReader<'a> {
    data: &'a [u8],
    len: usize,
}

impl<'a> PayloadReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        PayloadReader { data, len: data.len() }
    }

    /// Fail unless at least `n` more bytes remain.
    pub(crate) fn require(&self, n: usize) -> Result<(), ProtocolError> {
        if self.data.remaining() < n {
            return Err(ProtocolError::FrameTooShort {
                expected: self.consumed() + n,
                actual: self.len,
            });
        }
        Ok(())
    }

    fn consumed(&self) -> usize {
        self.len - self.data.remaining()
    }

    pub(crate) fn u8(&mut self) -> Result<u8, ProtocolError> {
        self.require(1)?;
        Ok(self.data.get_u8())
    }

    pub(crate) fn u16(&mut self) -> Result<u16, ProtocolError> {
        self.require(2)?;
        Ok(self.data.get_u16_le())
    }

    pub(crate) fn bytes(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        self.require(n)?;
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    pub(crate) fn ieee(&mut self) -> Result<IeeeAddress, ProtocolError> {
        let bytes = self.bytes(IEEE_ADDR_LEN)?;
        IeeeAddress::from_slice(bytes)
            .ok_or_else(|| ProtocolError::InvalidData("short IEEE address".to_string()))
    }

    /// A `[len: u8][bytes]` UTF-8 string.
    pub(crate) fn name(&mut self) -> Result<String, ProtocolError> {
        let len = self.u8()? as usize;
        let bytes = self.bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
    }
}

/// Append a `[len: u8][bytes]` string, failing if it would not fit in a frame.
pub(crate) fn put_name(buf: &mut Vec<u8>, name: &str) -> Result<(), ProtocolError> {
    // The length byte itself also has to fit.
    let room = MAX_PAYLOAD_LEN.saturating_sub(buf.len() + 1);
    let len = name.len();
    if len > room {
        return Err(ProtocolError::NameTooLong { len, max: room });
    }
    buf.put_u8(len as u8);
    buf.put_slice(name.as_bytes());
    Ok(())
}
