//! ItemStack type and its two wire encodings.
//!
//! Bedrock sends items inside inventory actions in the legacy `ItemData`
//! layout; Java expects the `Slot` layout inside window clicks. Mapping item
//! ids between the editions is done elsewhere: this type carries whatever id
//! the caller put in it.

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::codec::{ensure_remaining, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{JavaVarInt, VarInt, VarUInt32};

/// Empty compound tag in Java's big-endian NBT.
const EMPTY_COMPOUND: [u8; 4] = [0x0A, 0x00, 0x00, 0x00];

/// Java slots carry the count in a signed byte.
pub const JAVA_MAX_COUNT: u16 = i8::MAX as u16;
/// Bedrock packs the count into the low byte of `aux`.
pub const BEDROCK_MAX_COUNT: u16 = 0xFF;
/// 0xFFFF in the length field announces network NBT instead.
const BEDROCK_MAX_NBT_LEN: usize = 0xFFFE;

/// A single item stack.
///
/// `runtime_id == 0` or `count == 0` means the slot is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item id in whichever edition this stack belongs to. 0 = air/empty.
    pub runtime_id: i32,
    /// Number of items in this stack.
    pub count: u16,
    /// Item damage/variant metadata.
    #[serde(default)]
    pub metadata: u16,
    /// Raw NBT payload (enchantments, names...). Empty when absent.
    #[serde(default)]
    pub nbt_data: Vec<u8>,
}

impl ItemStack {
    /// An empty slot (air).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a simple item stack with no metadata or NBT.
    pub fn new(runtime_id: i32, count: u16) -> Self {
        Self {
            runtime_id,
            count,
            metadata: 0,
            nbt_data: Vec::new(),
        }
    }

    /// The stack sent instead of the real slot contents when the client-side
    /// mirror cannot be trusted. It never matches anything the server holds,
    /// so the server rejects the click and re-sends the whole window.
    pub fn refresh_sentinel() -> Self {
        Self {
            runtime_id: 1,
            count: 127,
            metadata: 0,
            nbt_data: EMPTY_COMPOUND.to_vec(),
        }
    }

    /// Whether this slot is empty.
    pub fn is_empty(&self) -> bool {
        self.runtime_id == 0 || self.count == 0
    }

    /// Same item with a different amount; an amount of zero yields an empty stack.
    pub fn with_count(&self, count: u16) -> Self {
        if count == 0 {
            return Self::empty();
        }
        Self {
            count,
            ..self.clone()
        }
    }

    /// Whether two stacks hold the same kind of item and could merge.
    /// Empty stacks never stack with anything.
    pub fn can_stack(&self, other: &ItemStack) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.runtime_id == other.runtime_id
            && self.metadata == other.metadata
            && self.nbt_data == other.nbt_data
    }

    /// Whether the stack fits a Java `Slot`.
    pub fn check_java(&self) -> Result<(), ProtoError> {
        if !self.is_empty() && self.count > JAVA_MAX_COUNT {
            return Err(ProtoError::OutOfRange {
                field: "java item count",
                value: self.count.into(),
                max: JAVA_MAX_COUNT.into(),
            });
        }
        Ok(())
    }

    /// Whether the stack fits Bedrock's legacy `ItemData`.
    pub fn check_bedrock(&self) -> Result<(), ProtoError> {
        if self.is_empty() {
            return Ok(());
        }
        if self.count > BEDROCK_MAX_COUNT {
            return Err(ProtoError::OutOfRange {
                field: "bedrock item count",
                value: self.count.into(),
                max: BEDROCK_MAX_COUNT.into(),
            });
        }
        if self.nbt_data.len() > BEDROCK_MAX_NBT_LEN {
            return Err(ProtoError::OutOfRange {
                field: "bedrock item NBT length",
                value: self.nbt_data.len(),
                max: BEDROCK_MAX_NBT_LEN,
            });
        }
        Ok(())
    }

    /// Encode as a Java `Slot`: present flag, id, count, NBT.
    ///
    /// Counts above [`JAVA_MAX_COUNT`] are clamped with a warning; use
    /// [`check_java`](Self::check_java) to refuse them instead.
    pub fn write_java_slot(&self, buf: &mut impl BufMut) {
        if self.is_empty() {
            buf.put_u8(0);
            return;
        }
        if let Err(e) = self.check_java() {
            warn!("clamping item {}: {}", self.runtime_id, e);
        }
        buf.put_u8(1);
        JavaVarInt(self.runtime_id).proto_encode(buf);
        buf.put_i8(self.count.min(JAVA_MAX_COUNT) as i8);
        if self.nbt_data.is_empty() {
            buf.put_u8(0); // TAG_End
        } else {
            buf.put_slice(&self.nbt_data);
        }
    }
}

/// All empty stacks compare equal regardless of leftover fields.
impl PartialEq for ItemStack {
    fn eq(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.is_empty() && other.is_empty();
        }
        self.runtime_id == other.runtime_id
            && self.count == other.count
            && self.metadata == other.metadata
            && self.nbt_data == other.nbt_data
    }
}

impl Eq for ItemStack {}

/// Encode as Bedrock legacy `ItemData`.
///
/// A stack failing [`ItemStack::check_bedrock`] is logged and sent with its
/// count clamped and, if the NBT is too long, without NBT.
///
/// Wire format:
/// ```text
/// VarInt(runtime_id)  : 0 = empty, return early
/// VarInt(aux)         : (metadata << 8) | count
/// u16_le(nbt_len) + NBT bytes
/// VarInt(can_place_on_count) + strings
/// VarInt(can_destroy_count) + strings
/// ```
impl ProtoEncode for ItemStack {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        if self.is_empty() {
            VarInt(0).proto_encode(buf);
            return;
        }
        if let Err(e) = self.check_bedrock() {
            warn!("clamping item {}: {}", self.runtime_id, e);
        }
        VarInt(self.runtime_id).proto_encode(buf);
        let count = self.count.min(BEDROCK_MAX_COUNT);
        let aux = (i32::from(self.metadata) << 8) | i32::from(count);
        VarInt(aux).proto_encode(buf);
        let nbt: &[u8] = if self.nbt_data.len() > BEDROCK_MAX_NBT_LEN {
            &[]
        } else {
            &self.nbt_data
        };
        buf.put_u16_le(nbt.len() as u16);
        buf.put_slice(nbt);
        VarInt(0).proto_encode(buf); // can_place_on
        VarInt(0).proto_encode(buf); // can_destroy
    }
}

impl ProtoDecode for ItemStack {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let runtime_id = VarInt::proto_decode(buf)?.0;
        if runtime_id == 0 {
            return Ok(Self::empty());
        }

        let aux = VarInt::proto_decode(buf)?.0;
        let count = (aux & 0xFF) as u16;
        let metadata = ((aux >> 8) & 0xFFFF) as u16;

        ensure_remaining(buf, 2)?;
        let nbt_len = buf.get_u16_le();
        if nbt_len == 0xFFFF {
            return Err(ProtoError::InvalidData(
                "network NBT item user data is not supported".into(),
            ));
        }
        let len = nbt_len as usize;
        ensure_remaining(buf, len)?;
        let mut nbt_data = vec![0u8; len];
        buf.copy_to_slice(&mut nbt_data);

        skip_string_list(buf)?; // can_place_on
        skip_string_list(buf)?; // can_destroy

        Ok(Self {
            runtime_id,
            count,
            metadata,
            nbt_data,
        })
    }
}

fn skip_string_list(buf: &mut impl Buf) -> Result<(), ProtoError> {
    let count = VarInt::proto_decode(buf)?.0;
    for _ in 0..count.max(0) {
        let len = VarUInt32::proto_decode(buf)?.0 as usize;
        ensure_remaining(buf, len)?;
        buf.advance(len);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn is_empty_checks() {
        assert!(ItemStack::empty().is_empty());
        assert!(ItemStack::new(0, 10).is_empty());
        assert!(ItemStack::new(1, 0).is_empty());
        assert!(!ItemStack::new(1, 1).is_empty());
    }

    #[test]
    fn empty_stacks_are_equal() {
        assert_eq!(ItemStack::new(5, 0), ItemStack::empty());
        assert_eq!(ItemStack::new(0, 3), ItemStack::new(7, 0));
        assert_ne!(ItemStack::new(5, 1), ItemStack::empty());
    }

    #[test]
    fn with_count_zero_is_empty() {
        let item = ItemStack::new(3, 10);
        assert_eq!(item.with_count(4).count, 4);
        assert_eq!(item.with_count(4).runtime_id, 3);
        assert!(item.with_count(0).is_empty());
        assert_eq!(item.with_count(0).runtime_id, 0);
    }

    #[test]
    fn can_stack_rules() {
        let stone = ItemStack::new(1, 10);
        assert!(stone.can_stack(&ItemStack::new(1, 64)));
        assert!(!stone.can_stack(&ItemStack::new(2, 10)));
        assert!(!stone.can_stack(&ItemStack::empty()));
        assert!(!ItemStack::empty().can_stack(&ItemStack::empty()));

        let mut granite = ItemStack::new(1, 10);
        granite.metadata = 1;
        assert!(!stone.can_stack(&granite));

        let mut named = ItemStack::new(1, 10);
        named.nbt_data = vec![0x0A, 0x00, 0x00, 0x00];
        assert!(!stone.can_stack(&named));
    }

    #[test]
    fn refresh_sentinel_matches_nothing_real() {
        let sentinel = ItemStack::refresh_sentinel();
        assert!(!sentinel.is_empty());
        assert!(!sentinel.can_stack(&ItemStack::new(1, 1)));
    }

    #[test]
    fn bedrock_item_roundtrip() {
        let mut item = ItemStack::new(272, 17);
        item.metadata = 3;
        item.nbt_data = vec![0x0A, 0x00, 0x00];
        let mut buf = BytesMut::new();
        item.proto_encode(&mut buf);
        let decoded = ItemStack::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, item);
    }

    #[test]
    fn bedrock_empty_item_is_single_byte() {
        let mut buf = BytesMut::new();
        ItemStack::empty().proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0x00]);
    }

    #[test]
    fn bedrock_item_skips_can_place_on() {
        let mut buf = BytesMut::new();
        VarInt(5).proto_encode(&mut buf);
        VarInt(2).proto_encode(&mut buf); // count 2, meta 0
        buf.put_u16_le(0);
        VarInt(1).proto_encode(&mut buf);
        VarUInt32(5).proto_encode(&mut buf);
        buf.put_slice(b"stone");
        VarInt(0).proto_encode(&mut buf);
        let decoded = ItemStack::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, ItemStack::new(5, 2));
    }

    #[test]
    fn bedrock_item_truncated_nbt_fails() {
        let mut buf = BytesMut::new();
        VarInt(5).proto_encode(&mut buf);
        VarInt(2).proto_encode(&mut buf);
        buf.put_u16_le(10);
        buf.put_u8(0x0A);
        assert!(ItemStack::proto_decode(&mut buf.freeze()).is_err());
    }

    #[test]
    fn java_slot_encoding() {
        let mut buf = BytesMut::new();
        ItemStack::empty().write_java_slot(&mut buf);
        assert_eq!(&buf[..], &[0x00]);

        let mut buf = BytesMut::new();
        ItemStack::new(1, 32).write_java_slot(&mut buf);
        assert_eq!(&buf[..], &[0x01, 0x01, 0x20, 0x00]);
    }

    #[test]
    fn oversized_java_count_is_reported_and_clamped() {
        let big = ItemStack::new(1, 200);
        assert!(matches!(
            big.check_java(),
            Err(ProtoError::OutOfRange { value: 200, max: 127, .. })
        ));
        assert!(ItemStack::new(1, 127).check_java().is_ok());
        assert!(ItemStack::new(0, 500).check_java().is_ok());

        let mut buf = BytesMut::new();
        big.write_java_slot(&mut buf);
        assert_eq!(&buf[..], &[0x01, 0x01, 0x7F, 0x00]);
    }

    #[test]
    fn oversized_bedrock_stack_is_reported_and_clamped() {
        let big = ItemStack::new(5, 256);
        assert!(matches!(
            big.check_bedrock(),
            Err(ProtoError::OutOfRange { value: 256, max: 255, .. })
        ));
        let mut buf = BytesMut::new();
        big.proto_encode(&mut buf);
        // Clamped, not wrapped to an empty stack.
        let decoded = ItemStack::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, ItemStack::new(5, 255));

        let mut tagged = ItemStack::new(5, 1);
        tagged.nbt_data = vec![0; 0x1_0000];
        assert!(matches!(
            tagged.check_bedrock(),
            Err(ProtoError::OutOfRange { value: 0x1_0000, .. })
        ));
        let mut buf = BytesMut::new();
        tagged.proto_encode(&mut buf);
        let decoded = ItemStack::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, ItemStack::new(5, 1));
    }
}
