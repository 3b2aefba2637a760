//! Frame encoding/decoding utilities.
//!
//! Every SRPC frame is a command id and a one-byte payload length followed
//! by the payload:
//!
//! ```text
//! +--------+--------+-------------------+
//! | cmd_id |  len   | payload[0..len]   |
//! +--------+--------+-------------------+
//! ```
//!
//! A TCP read may end anywhere inside a frame, so the receive side keeps the
//! unconsumed tail and finishes the frame on the next read.

use bytes::{Buf, BufMut, BytesMut};

use crate::constants::*;
use crate::error::*;
use crate::responses::Response;

/// Split one whole frame off the front of `buf`.
///
/// Returns the command id, the payload and the total frame size, or `None`
/// if the frame has not fully arrived.
pub fn split_frame(buf: &[u8]) -> Option<(u8, &[u8], usize)> {
    if buf.len() < SRPC_HEADER_LEN {
        return None;
    }
    let len = buf[SRPC_CMD_LEN_POS] as usize;
    let total = SRPC_HEADER_LEN + len;
    if buf.len() < total {
        return None;
    }
    Some((buf[SRPC_CMD_ID_POS], &buf[SRPC_HEADER_LEN..total], total))
}

/// Prefix `payload` with the frame header.
pub fn encode_frame(cmd_id: u8, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLong {
            max: MAX_PAYLOAD_LEN,
            actual: payload.len(),
        });
    }
    let mut buf = Vec::with_capacity(SRPC_HEADER_LEN + payload.len());
    buf.put_u8(cmd_id);
    buf.put_u8(payload.len() as u8);
    buf.put_slice(payload);
    Ok(buf)
}

/// Decode one inbound frame starting at `offset` in `buf`.
///
/// Returns the decoded response and the number of bytes it occupied, or
/// `Ok(None)` if the frame is incomplete. An unknown command id is an error
/// and consumes nothing: its length byte cannot be trusted.
pub fn decode_frame(buf: &[u8], offset: usize) -> Result<Option<(Response, usize)>, ProtocolError> {
    let rest = buf.get(offset..).unwrap_or_default();
    if let Some(&code) = rest.first() {
        if !Response::is_known(code) {
            return Err(ProtocolError::UnknownCommand(code));
        }
    }
    let Some((code, payload, consumed)) = split_frame(rest) else {
        return Ok(None);
    };
    let response = Response::decode_payload(code, payload)?;
    Ok(Some((response, consumed)))
}

/// Accumulates bytes from the gateway and yields whole responses.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl FrameCodec {
    /// Create a new frame codec.
    pub fn new() -> Self {
        FrameCodec {
            buffer: BytesMut::with_capacity(MAX_FRAME_SIZE * 4),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next response from the buffer.
    ///
    /// Returns `Ok(None)` when more data is needed. A frame whose fields do
    /// not fit its declared length is consumed and reported as an error, so
    /// the caller may carry on. An unknown command id is reported without
    /// consuming anything; the caller must [`clear`](Self::clear) or give up.
    pub fn decode(&mut self) -> Result<Option<Response>, ProtocolError> {
        if let Some(&code) = self.buffer.first() {
            if !Response::is_known(code) {
                return Err(ProtocolError::UnknownCommand(code));
            }
        }

        let Some((code, payload, consumed)) = split_frame(&self.buffer) else {
            return Ok(None);
        };
        let result = Response::decode_payload(code, payload);
        log::trace!("srpc frame 0x{:02x}, {} bytes", code, consumed);
        self.buffer.advance(consumed);
        result.map(Some)
    }

    /// Encode a command frame for transmission.
    pub fn encode(command: &crate::Command) -> Result<Vec<u8>, ProtocolError> {
        command.encode()
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responses::{AttributeKind, AttributeValue};

    fn state_frame(addr: u16, endpoint: u8, value: u8) -> Vec<u8> {
        let [lo, hi] = addr.to_le_bytes();
        vec![SRPC_GET_DEV_STATE_RSP, 4, lo, hi, endpoint, value]
    }

    #[test]
    fn test_encode_frame_header() {
        let frame = encode_frame(SRPC_GET_DEVICES, &[]).unwrap();
        assert_eq!(frame, vec![SRPC_GET_DEVICES, 0]);

        let too_long = vec![0u8; MAX_PAYLOAD_LEN + 1];
        assert_eq!(
            encode_frame(SRPC_ADD_GROUP, &too_long),
            Err(ProtocolError::PayloadTooLong {
                max: MAX_PAYLOAD_LEN,
                actual: MAX_PAYLOAD_LEN + 1
            })
        );
    }

    #[test]
    fn test_frame_codec_multiple() {
        let mut codec = FrameCodec::new();

        let mut data = state_frame(0x1111, 1, 1);
        data.extend(state_frame(0x2222, 2, 0));
        codec.push(&data);

        let first = codec.decode().unwrap().expect("first frame");
        assert_eq!(
            first,
            Response::Attribute(AttributeValue {
                kind: AttributeKind::State,
                nwk_addr: 0x1111,
                endpoint: 1,
                value: 1,
            })
        );

        let second = codec.decode().unwrap().expect("second frame");
        assert!(matches!(
            second,
            Response::Attribute(AttributeValue { nwk_addr: 0x2222, value: 0, .. })
        ));

        assert_eq!(codec.decode().unwrap(), None);
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_frame_codec_split_after_header() {
        let mut codec = FrameCodec::new();
        let frame = state_frame(0x3333, 3, 1);

        codec.push(&frame[..2]);
        assert_eq!(codec.decode().unwrap(), None);
        assert_eq!(codec.buffered_len(), 2);

        codec.push(&frame[2..]);
        assert!(codec.decode().unwrap().is_some());
    }

    #[test]
    fn test_frame_codec_split_mid_payload() {
        let mut codec = FrameCodec::new();
        let frame = state_frame(0x4444, 4, 1);

        codec.push(&frame[..4]);
        assert_eq!(codec.decode().unwrap(), None);

        codec.push(&frame[4..]);
        let response = codec.decode().unwrap().expect("whole frame");
        assert_eq!(response.code(), SRPC_GET_DEV_STATE_RSP);
    }

    #[test]
    fn test_unknown_id_is_not_consumed() {
        let mut codec = FrameCodec::new();
        codec.push(&[0x42, 3, 1, 2, 3]);

        assert_eq!(codec.decode(), Err(ProtocolError::UnknownCommand(0x42)));
        assert_eq!(codec.buffered_len(), 5);

        codec.clear();
        assert_eq!(codec.decode().unwrap(), None);
    }

    #[test]
    fn test_short_known_frame_is_skipped() {
        let mut codec = FrameCodec::new();
        // Attribute response that declares only two bytes.
        codec.push(&[SRPC_GET_DEV_LEVEL_RSP, 2, 0x01, 0x00]);
        codec.push(&state_frame(0x5555, 5, 1));

        assert!(matches!(
            codec.decode(),
            Err(ProtocolError::FrameTooShort { .. })
        ));
        assert!(codec.decode().unwrap().is_some());
    }

    #[test]
    fn test_decode_frame_at_offset() {
        let mut buf = vec![SRPC_PING, 0];
        buf.extend(state_frame(0x6666, 6, 1));

        let (first, used) = decode_frame(&buf, 0).unwrap().unwrap();
        assert_eq!(first.code(), SRPC_PING);
        assert_eq!(used, 2);

        let (second, used) = decode_frame(&buf, 2).unwrap().unwrap();
        assert_eq!(second.code(), SRPC_GET_DEV_STATE_RSP);
        assert_eq!(used, 6);

        assert_eq!(decode_frame(&buf, 8).unwrap(), None);
        assert_eq!(decode_frame(&[0x7F, 0], 0), Err(ProtocolError::UnknownCommand(0x7F)));
    }
}
