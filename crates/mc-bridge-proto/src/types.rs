//! Variable-length integers and positions used on both sides of the bridge.
//!
//! Bedrock signed integers are ZigZag + LEB128 (`VarInt`); Java signed
//! integers are plain two's-complement LEB128 (`JavaVarInt`).

use std::fmt;

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum VarIntError {
    #[error("buffer too short")]
    BufferTooShort,
    #[error("VarInt is too long (more than {max_bytes} bytes)")]
    TooManyBytes { max_bytes: usize },
}

const MAX_VARINT_BYTES: usize = 5;

fn write_leb128(buf: &mut impl BufMut, mut value: u32) {
    loop {
        if value & !0x7F == 0 {
            buf.put_u8(value as u8);
            return;
        }
        buf.put_u8((value & 0x7F | 0x80) as u8);
        value >>= 7;
    }
}

fn read_leb128(buf: &mut impl Buf) -> Result<u32, ProtoError> {
    let mut result: u32 = 0;
    let mut shift: u32 = 0;
    for _ in 0..MAX_VARINT_BYTES {
        if !buf.has_remaining() {
            return Err(VarIntError::BufferTooShort.into());
        }
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
    Err(VarIntError::TooManyBytes {
        max_bytes: MAX_VARINT_BYTES,
    }
    .into())
}

// ---------------------------------------------------------------------------
// VarInt (i32, ZigZag + LEB128, Bedrock)
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarInt(pub i32);

impl ProtoEncode for VarInt {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_leb128(buf, zigzag_encode_32(self.0));
    }
}

impl ProtoDecode for VarInt {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(VarInt(zigzag_decode_32(read_leb128(buf)?)))
    }
}

impl From<i32> for VarInt {
    fn from(v: i32) -> Self {
        VarInt(v)
    }
}

impl fmt::Debug for VarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VarInt({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// VarUInt32 (unsigned LEB128, NO ZigZag, Bedrock)
// ---------------------------------------------------------------------------

/// Unsigned variable-length integer (plain LEB128, NO ZigZag).
/// Used for counts, slot indices and source types in Bedrock.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarUInt32(pub u32);

impl ProtoEncode for VarUInt32 {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_leb128(buf, self.0);
    }
}

impl ProtoDecode for VarUInt32 {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(VarUInt32(read_leb128(buf)?))
    }
}

impl fmt::Debug for VarUInt32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VarUInt32({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// JavaVarInt (i32, two's complement LEB128, Java)
// ---------------------------------------------------------------------------

/// Java edition VarInt: negative values always take five bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct JavaVarInt(pub i32);

impl ProtoEncode for JavaVarInt {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_leb128(buf, self.0 as u32);
    }
}

impl ProtoDecode for JavaVarInt {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        Ok(JavaVarInt(read_leb128(buf)? as i32))
    }
}

impl fmt::Debug for JavaVarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JavaVarInt({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ZigZag helpers
// ---------------------------------------------------------------------------

#[inline]
fn zigzag_encode_32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

#[inline]
fn zigzag_decode_32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ (-((n & 1) as i32))
}

// ---------------------------------------------------------------------------
// Block position (Java packed long)
// ---------------------------------------------------------------------------

/// Block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Pack as Java's 26/26/12-bit position long.
    pub fn to_packed(self) -> i64 {
        ((self.x as i64 & 0x3FF_FFFF) << 38)
            | ((self.z as i64 & 0x3FF_FFFF) << 12)
            | (self.y as i64 & 0xFFF)
    }
}

impl ProtoEncode for BlockPos {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i64(self.to_packed());
    }
}
