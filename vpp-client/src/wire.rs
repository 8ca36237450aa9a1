//! Bounds-checked readers and fixed-size writers for message bodies.
//!
//! All multi-byte fields of the binary API are big-endian and structures are
//! packed, so a body is just a sequence of `put_*` / `get_*` calls. The
//! readers never panic on short input, they report `ChannelError::Malformed`.

use crate::error::ChannelError;
use bytes::{Buf, BufMut as _, BytesMut};

fn need(buf: &impl Buf, len: usize, what: &str) -> Result<(), ChannelError> {
    if buf.remaining() < len {
        return Err(ChannelError::malformed(format!(
            "truncated {what}: need {len} bytes, have {}",
            buf.remaining()
        )));
    }
    Ok(())
}

pub(crate) fn get_u8(buf: &mut impl Buf) -> Result<u8, ChannelError> {
    need(buf, 1, "u8")?;
    Ok(buf.get_u8())
}

pub(crate) fn get_u16(buf: &mut impl Buf) -> Result<u16, ChannelError> {
    need(buf, 2, "u16")?;
    Ok(buf.get_u16())
}

pub(crate) fn get_u32(buf: &mut impl Buf) -> Result<u32, ChannelError> {
    need(buf, 4, "u32")?;
    Ok(buf.get_u32())
}

pub(crate) fn get_i32(buf: &mut impl Buf) -> Result<i32, ChannelError> {
    need(buf, 4, "i32")?;
    Ok(buf.get_i32())
}

pub(crate) fn get_f64(buf: &mut impl Buf) -> Result<f64, ChannelError> {
    need(buf, 8, "f64")?;
    Ok(buf.get_f64())
}

pub(crate) fn get_array<const N: usize>(buf: &mut impl Buf) -> Result<[u8; N], ChannelError> {
    need(buf, N, "byte array")?;
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

pub(crate) fn skip(buf: &mut impl Buf, len: usize) -> Result<(), ChannelError> {
    need(buf, len, "reserved fields")?;
    buf.advance(len);
    Ok(())
}

/// Reads a NUL padded string of exactly `len` bytes.
pub(crate) fn get_fixed_string(buf: &mut impl Buf, len: usize) -> Result<String, ChannelError> {
    need(buf, len, "string")?;
    let mut raw = vec![0u8; len];
    buf.copy_to_slice(&mut raw);
    let end = raw.iter().position(|b| *b == 0).unwrap_or(len);
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

/// Writes `value` truncated or NUL padded to exactly `len` bytes.
pub(crate) fn put_fixed_string(buf: &mut BytesMut, value: &str, len: usize) {
    let bytes = value.as_bytes();
    let n = bytes.len().min(len);
    buf.put_slice(&bytes[..n]);
    buf.put_bytes(0, len - n);
}

/// Writes a variable length string: `u32` length followed by the bytes.
pub(crate) fn put_string(buf: &mut BytesMut, value: &str) {
    buf.put_u32(value.len() as u32);
    buf.put_slice(value.as_bytes());
}

pub(crate) fn put_bool(buf: &mut BytesMut, value: bool) {
    buf.put_u8(value as u8);
}
