//! Packet framing, and the fluent builder/reader pair used everywhere a
//! handler needs to produce or consume a bancho packet.
//!
//! The frame is exactly: `u16 id (LE) | u8 0x00 | u32 payload length (LE) |
//! payload`. The source this was learned from hard-baked several response
//! payloads as byte literals; per the source's own design notes those are
//! all equivalent to building them through one fluent writer, so nothing
//! here is pre-baked — every packet is assembled at the point of use.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::error::CodecError;
use super::ids::ServerPacketId;
use super::types::{read_int_list, read_osu_string, read_uleb128, write_int_list, write_osu_string};

/// Number of bytes in a packet header.
pub const HEADER_LEN: usize = 7;

/// A single decoded inbound frame: a numeric packet id plus its payload
/// slice (header already stripped).
#[derive(Debug)]
pub struct InboundFrame<'a> {
    pub id: u16,
    pub payload: &'a [u8],
}

/// Splits `body` into a sequence of frames, failing the *whole* request (not
/// the session) on any malformed header or length mismatch, matching the
/// codec's failure contract in §4.1.
pub fn split_frames(mut body: &[u8]) -> Result<Vec<InboundFrame<'_>>, CodecError> {
    let mut frames = Vec::new();
    while !body.is_empty() {
        if body.len() < HEADER_LEN {
            return Err(CodecError::Truncated);
        }
        let id = u16::from_le_bytes([body[0], body[1]]);
        // body[2] is the reserved pad byte.
        let len = u32::from_le_bytes([body[3], body[4], body[5], body[6]]) as usize;
        let rest = &body[HEADER_LEN..];
        if rest.len() < len {
            return Err(CodecError::LengthMismatch {
                declared: len as u32,
                actual: rest.len(),
            });
        }
        let (payload, remainder) = rest.split_at(len);
        frames.push(InboundFrame { id, payload });
        body = remainder;
    }
    Ok(frames)
}

/// A fluent writer that accumulates one packet's header and payload.
///
/// Zero-copy raw-bytes relay (spectator frames, §4.1) is supported through
/// [`PacketBuilder::raw`], which appends a byte slice without reinterpreting
/// it as any typed field.
pub struct PacketBuilder {
    buf: BytesMut,
}

impl PacketBuilder {
    pub fn new(id: ServerPacketId) -> Self {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + 32);
        // Placeholder header, patched in `finish`.
        buf.put_u16_le(id as u16);
        buf.put_u8(0x00);
        buf.put_u32_le(0);
        Self { buf }
    }

    pub fn u8(mut self, value: u8) -> Self {
        self.buf.put_u8(value);
        self
    }

    pub fn i8(mut self, value: i8) -> Self {
        self.buf.put_i8(value);
        self
    }

    pub fn u16(mut self, value: u16) -> Self {
        self.buf.put_u16_le(value);
        self
    }

    pub fn i16(mut self, value: i16) -> Self {
        self.buf.put_i16_le(value);
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.buf.put_u32_le(value);
        self
    }

    pub fn i32(mut self, value: i32) -> Self {
        self.buf.put_i32_le(value);
        self
    }

    pub fn u64(mut self, value: u64) -> Self {
        self.buf.put_u64_le(value);
        self
    }

    pub fn i64(mut self, value: i64) -> Self {
        self.buf.put_i64_le(value);
        self
    }

    pub fn f32(mut self, value: f32) -> Self {
        self.buf.put_f32_le(value);
        self
    }

    pub fn string(mut self, value: &str) -> Self {
        write_osu_string(&mut self.buf, value);
        self
    }

    pub fn int_list(mut self, values: &[i32]) -> Self {
        write_int_list(&mut self.buf, values);
        self
    }

    /// Appends raw bytes verbatim, for cheap relay of an already-framed
    /// payload (e.g. spectator frames).
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.put_slice(bytes);
        self
    }

    /// Finalizes the packet, patching the length field and returning the
    /// complete framed bytes.
    pub fn finish(mut self) -> Bytes {
        let payload_len = (self.buf.len() - HEADER_LEN) as u32;
        self.buf[3..7].copy_from_slice(&payload_len.to_le_bytes());
        self.buf.freeze()
    }
}

/// A cursor-style reader over a payload slice, used to parse typed fields
/// out of an inbound frame in declared order.
pub struct PacketReader<'a> {
    input: &'a [u8],
}

impl<'a> PacketReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.input.len() < n {
            return Err(CodecError::Truncated);
        }
        let (head, tail) = self.input.split_at(n);
        self.input = tail;
        Ok(head)
    }

    pub fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn i8(&mut self) -> Result<i8, CodecError> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn u16(&mut self) -> Result<u16, CodecError> {
        Ok(self.take(2)?.get_u16_le())
    }

    pub fn i16(&mut self) -> Result<i16, CodecError> {
        Ok(self.take(2)?.get_i16_le())
    }

    pub fn u32(&mut self) -> Result<u32, CodecError> {
        Ok(self.take(4)?.get_u32_le())
    }

    pub fn i32(&mut self) -> Result<i32, CodecError> {
        Ok(self.take(4)?.get_i32_le())
    }

    pub fn u64(&mut self) -> Result<u64, CodecError> {
        Ok(self.take(8)?.get_u64_le())
    }

    pub fn i64(&mut self) -> Result<i64, CodecError> {
        Ok(self.take(8)?.get_i64_le())
    }

    pub fn f32(&mut self) -> Result<f32, CodecError> {
        Ok(self.take(4)?.get_f32_le())
    }

    pub fn string(&mut self) -> Result<String, CodecError> {
        let (value, consumed) = read_osu_string(self.input)?;
        self.input = &self.input[consumed..];
        Ok(value)
    }

    pub fn int_list(&mut self) -> Result<Vec<i32>, CodecError> {
        let (values, consumed) = read_int_list(self.input)?;
        self.input = &self.input[consumed..];
        Ok(values)
    }

    pub fn uleb128(&mut self) -> Result<u64, CodecError> {
        let (value, consumed) = read_uleb128(self.input)?;
        self.input = &self.input[consumed..];
        Ok(value)
    }

    /// Remaining unread bytes, for opaque/raw relay fields.
    pub fn remaining(&self) -> &'a [u8] {
        self.input
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builder_produces_header_and_payload() {
        let packet = PacketBuilder::new(ServerPacketId::UserId).i32(-1).finish();
        assert_eq!(packet.len(), HEADER_LEN + 4);
        assert_eq!(
            u16::from_le_bytes([packet[0], packet[1]]),
            ServerPacketId::UserId as u16
        );
        assert_eq!(packet[2], 0x00);
        let declared_len = u32::from_le_bytes([packet[3], packet[4], packet[5], packet[6]]);
        assert_eq!(declared_len, 4);
    }

    #[test]
    fn reader_round_trips_mixed_fields() {
        let packet = PacketBuilder::new(ServerPacketId::UserStats)
            .i32(42)
            .string("peppy")
            .int_list(&[1, 2, 3])
            .finish();

        let mut reader = PacketReader::new(&packet[HEADER_LEN..]);
        assert_eq!(reader.i32().unwrap(), 42);
        assert_eq!(reader.string().unwrap(), "peppy");
        assert_eq!(reader.int_list().unwrap(), vec![1, 2, 3]);
        assert!(reader.remaining().is_empty());
    }

    #[test]
    fn split_frames_handles_multiple_packets_in_one_body() {
        let mut body = BytesMut::new();
        body.extend_from_slice(&PacketBuilder::new(ServerPacketId::Pong).finish());
        body.extend_from_slice(&PacketBuilder::new(ServerPacketId::Notification).string("hi").finish());

        let frames = split_frames(&body).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].id, ServerPacketId::Pong as u16);
        assert_eq!(frames[1].id, ServerPacketId::Notification as u16);
    }

    #[test]
    fn split_frames_rejects_length_mismatch() {
        let mut body = BytesMut::new();
        body.put_u16_le(5);
        body.put_u8(0);
        body.put_u32_le(10); // declares 10 bytes, provides none
        assert!(matches!(
            split_frames(&body),
            Err(CodecError::LengthMismatch { .. })
        ));
    }
}
