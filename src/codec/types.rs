//! Primitive field encoding/decoding shared by the packet builder and reader.
//!
//! Mirrors the upstream bancho wire types exactly: fixed-width little-endian
//! integers, a 32-bit float, a length-prefixed "osu string", and a packed
//! int-list. See the builder/reader modules for how these compose into full
//! packets.

use bytes::{Buf, BufMut, BytesMut};

use crate::codec::error::CodecError;

/// Encodes `value` as an unsigned LEB128 varint, appending to `out`.
pub fn write_uleb128(out: &mut BytesMut, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decodes an unsigned LEB128 varint from the front of `input`, returning
/// the value and the number of bytes consumed.
pub fn read_uleb128(input: &[u8]) -> Result<(u64, usize), CodecError> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    for (consumed, &byte) in input.iter().enumerate() {
        result |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok((result, consumed + 1));
        }
        shift += 7;
        if shift >= 64 {
            return Err(CodecError::Truncated);
        }
    }
    Err(CodecError::Truncated)
}

/// Writes an osu-string: `0x00` when empty, else `0x0B` + uleb128(len) + utf8 bytes.
pub fn write_osu_string(out: &mut BytesMut, value: &str) {
    if value.is_empty() {
        out.put_u8(0x00);
        return;
    }
    out.put_u8(0x0B);
    write_uleb128(out, value.len() as u64);
    out.put_slice(value.as_bytes());
}

/// Reads an osu-string from the front of `input`, returning the string and
/// the number of bytes consumed.
pub fn read_osu_string(input: &[u8]) -> Result<(String, usize), CodecError> {
    let marker = *input.first().ok_or(CodecError::Truncated)?;
    if marker == 0x00 {
        return Ok((String::new(), 1));
    }
    if marker != 0x0B {
        return Err(CodecError::InvalidStringMarker(marker));
    }
    let (len, len_consumed) = read_uleb128(&input[1..])?;
    let start = 1 + len_consumed;
    let end = start
        .checked_add(len as usize)
        .ok_or(CodecError::Truncated)?;
    let bytes = input.get(start..end).ok_or(CodecError::Truncated)?;
    let text = std::str::from_utf8(bytes)
        .map_err(|_| CodecError::InvalidUtf8)?
        .to_owned();
    Ok((text, end))
}

/// Writes an int-list: `u16` count followed by that many little-endian `i32`.
pub fn write_int_list(out: &mut BytesMut, values: &[i32]) {
    out.put_u16_le(values.len() as u16);
    for value in values {
        out.put_i32_le(*value);
    }
}

/// Reads an int-list from the front of `input`, returning the values and the
/// number of bytes consumed.
pub fn read_int_list(input: &[u8]) -> Result<(Vec<i32>, usize), CodecError> {
    if input.len() < 2 {
        return Err(CodecError::Truncated);
    }
    let count = u16::from_le_bytes([input[0], input[1]]) as usize;
    let mut cursor = &input[2..];
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        if cursor.len() < 4 {
            return Err(CodecError::Truncated);
        }
        values.push(cursor.get_i32_le());
    }
    let consumed = 2 + count * 4;
    Ok((values, consumed))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn uleb128_round_trips_small_and_large_values() {
        for value in [0u64, 1, 127, 128, 300, 16384, u32::MAX as u64] {
            let mut buf = BytesMut::new();
            write_uleb128(&mut buf, value);
            let (decoded, consumed) = read_uleb128(&buf).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, buf.len());
        }
    }

    #[test]
    fn empty_string_is_single_zero_byte() {
        let mut buf = BytesMut::new();
        write_osu_string(&mut buf, "");
        assert_eq!(&buf[..], &[0x00]);
    }

    #[test]
    fn non_empty_string_round_trips() {
        let mut buf = BytesMut::new();
        write_osu_string(&mut buf, "peppy");
        assert_eq!(buf[0], 0x0B);
        let (decoded, consumed) = read_osu_string(&buf).unwrap();
        assert_eq!(decoded, "peppy");
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn int_list_round_trips() {
        let mut buf = BytesMut::new();
        write_int_list(&mut buf, &[1, -2, 300]);
        let (decoded, consumed) = read_int_list(&buf).unwrap();
        assert_eq!(decoded, vec![1, -2, 300]);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn truncated_string_is_an_error() {
        let buf = [0x0Bu8, 0x05, b'h', b'i'];
        assert!(matches!(read_osu_string(&buf), Err(CodecError::Truncated)));
    }
}
