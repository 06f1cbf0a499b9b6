//! 标量值：布尔、字符串、定长整数与变长整数。

use bytes::{BufMut, BytesMut};

use super::{CompactCodec, NativeValue, TypeTag};
use crate::error::{CompactError, Result};
use crate::int::{IntWidth, compact, fixed};
use crate::reader::Reader;

impl CompactCodec for bool {
    fn encode_to(&self, out: &mut BytesMut) -> Result<()> {
        out.put_u8(u8::from(*self));
        Ok(())
    }

    fn decode_from(&mut self, reader: &mut Reader<'_>) -> Result<()> {
        *self = match reader.read_u8()? {
            0x00 => false,
            0x01 => true,
            byte => return Err(CompactError::InvalidBool { byte }),
        };
        Ok(())
    }

    fn value(&self) -> NativeValue {
        NativeValue::Bool(*self)
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::Bool
    }

    fn clone_template(&self) -> Self {
        false
    }
}

impl CompactCodec for String {
    fn encode_to(&self, out: &mut BytesMut) -> Result<()> {
        compact::encode_len(out, self.len())?;
        out.put_slice(self.as_bytes());
        Ok(())
    }

    fn decode_from(&mut self, reader: &mut Reader<'_>) -> Result<()> {
        let len = compact::decode_len(reader)?;
        let bytes = reader.read_bytes(len)?;
        let text = core::str::from_utf8(bytes).map_err(|err| CompactError::InvalidUtf8 {
            detail: err.to_string(),
        })?;
        self.clear();
        self.push_str(text);
        Ok(())
    }

    fn value(&self) -> NativeValue {
        NativeValue::Str(self.clone())
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::Str
    }

    fn clone_template(&self) -> Self {
        String::new()
    }
}

/// 定长小端整数。
///
/// 变体即宽度与符号，编码长度恒为 `width.bytes()`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedInt {
    /// `u8`
    U8(u8),
    /// `u16`
    U16(u16),
    /// `u32`
    U32(u32),
    /// `u64`
    U64(u64),
    /// `u128`
    U128(u128),
    /// `i8`
    I8(i8),
    /// `i16`
    I16(i16),
    /// `i32`
    I32(i32),
    /// `i64`
    I64(i64),
    /// `i128`
    I128(i128),
}

impl FixedInt {
    /// 指定宽度与符号的零值。
    pub const fn zero(width: IntWidth, signed: bool) -> Self {
        match (width, signed) {
            (IntWidth::W8, false) => FixedInt::U8(0),
            (IntWidth::W16, false) => FixedInt::U16(0),
            (IntWidth::W32, false) => FixedInt::U32(0),
            (IntWidth::W64, false) => FixedInt::U64(0),
            (IntWidth::W128, false) => FixedInt::U128(0),
            (IntWidth::W8, true) => FixedInt::I8(0),
            (IntWidth::W16, true) => FixedInt::I16(0),
            (IntWidth::W32, true) => FixedInt::I32(0),
            (IntWidth::W64, true) => FixedInt::I64(0),
            (IntWidth::W128, true) => FixedInt::I128(0),
        }
    }

    /// 以无符号数值构造，超出宽度返回 [`CompactError::OutOfRange`]。
    pub fn from_unsigned(width: IntWidth, value: u128) -> Result<Self> {
        let overflow =
            || CompactError::out_of_range(width, format!("{value} exceeds unsigned max"));
        Ok(match width {
            IntWidth::W8 => FixedInt::U8(u8::try_from(value).map_err(|_| overflow())?),
            IntWidth::W16 => FixedInt::U16(u16::try_from(value).map_err(|_| overflow())?),
            IntWidth::W32 => FixedInt::U32(u32::try_from(value).map_err(|_| overflow())?),
            IntWidth::W64 => FixedInt::U64(u64::try_from(value).map_err(|_| overflow())?),
            IntWidth::W128 => FixedInt::U128(value),
        })
    }

    /// 以有符号数值构造，超出宽度返回 [`CompactError::OutOfRange`]。
    pub fn from_signed(width: IntWidth, value: i128) -> Result<Self> {
        let overflow = || {
            CompactError::out_of_range(
                width,
                format!(
                    "{value} outside [{}, {}]",
                    width.signed_min(),
                    width.signed_max()
                ),
            )
        };
        Ok(match width {
            IntWidth::W8 => FixedInt::I8(i8::try_from(value).map_err(|_| overflow())?),
            IntWidth::W16 => FixedInt::I16(i16::try_from(value).map_err(|_| overflow())?),
            IntWidth::W32 => FixedInt::I32(i32::try_from(value).map_err(|_| overflow())?),
            IntWidth::W64 => FixedInt::I64(i64::try_from(value).map_err(|_| overflow())?),
            IntWidth::W128 => FixedInt::I128(value),
        })
    }

    /// 位宽。
    pub const fn width(&self) -> IntWidth {
        match self {
            FixedInt::U8(_) | FixedInt::I8(_) => IntWidth::W8,
            FixedInt::U16(_) | FixedInt::I16(_) => IntWidth::W16,
            FixedInt::U32(_) | FixedInt::I32(_) => IntWidth::W32,
            FixedInt::U64(_) | FixedInt::I64(_) => IntWidth::W64,
            FixedInt::U128(_) | FixedInt::I128(_) => IntWidth::W128,
        }
    }

    /// 是否有符号。
    pub const fn is_signed(&self) -> bool {
        matches!(
            self,
            FixedInt::I8(_)
                | FixedInt::I16(_)
                | FixedInt::I32(_)
                | FixedInt::I64(_)
                | FixedInt::I128(_)
        )
    }
}

impl CompactCodec for FixedInt {
    fn encode_to(&self, out: &mut BytesMut) -> Result<()> {
        match *self {
            FixedInt::U8(v) => fixed::encode_u8(out, v),
            FixedInt::U16(v) => fixed::encode_u16(out, v),
            FixedInt::U32(v) => fixed::encode_u32(out, v),
            FixedInt::U64(v) => fixed::encode_u64(out, v),
            FixedInt::U128(v) => fixed::encode_u128(out, v),
            FixedInt::I8(v) => fixed::encode_i8(out, v),
            FixedInt::I16(v) => fixed::encode_i16(out, v),
            FixedInt::I32(v) => fixed::encode_i32(out, v),
            FixedInt::I64(v) => fixed::encode_i64(out, v),
            FixedInt::I128(v) => fixed::encode_i128(out, v),
        }
        Ok(())
    }

    fn decode_from(&mut self, reader: &mut Reader<'_>) -> Result<()> {
        match self {
            FixedInt::U8(v) => *v = fixed::decode_u8(reader)?,
            FixedInt::U16(v) => *v = fixed::decode_u16(reader)?,
            FixedInt::U32(v) => *v = fixed::decode_u32(reader)?,
            FixedInt::U64(v) => *v = fixed::decode_u64(reader)?,
            FixedInt::U128(v) => *v = fixed::decode_u128(reader)?,
            FixedInt::I8(v) => *v = fixed::decode_i8(reader)?,
            FixedInt::I16(v) => *v = fixed::decode_i16(reader)?,
            FixedInt::I32(v) => *v = fixed::decode_i32(reader)?,
            FixedInt::I64(v) => *v = fixed::decode_i64(reader)?,
            FixedInt::I128(v) => *v = fixed::decode_i128(reader)?,
        }
        Ok(())
    }

    fn value(&self) -> NativeValue {
        match *self {
            FixedInt::U8(v) => NativeValue::UInt(v.into()),
            FixedInt::U16(v) => NativeValue::UInt(v.into()),
            FixedInt::U32(v) => NativeValue::UInt(v.into()),
            FixedInt::U64(v) => NativeValue::UInt(v.into()),
            FixedInt::U128(v) => NativeValue::UInt(v),
            FixedInt::I8(v) => NativeValue::Int(v.into()),
            FixedInt::I16(v) => NativeValue::Int(v.into()),
            FixedInt::I32(v) => NativeValue::Int(v.into()),
            FixedInt::I64(v) => NativeValue::Int(v.into()),
            FixedInt::I128(v) => NativeValue::Int(v),
        }
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::fixed(self.width(), self.is_signed())
    }

    fn clone_template(&self) -> Self {
        FixedInt::zero(self.width(), self.is_signed())
    }
}

/// 变长无符号整数，宽度决定可接受的数值上界。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompactInt {
    /// `compact<u8>`
    U8(u8),
    /// `compact<u16>`
    U16(u16),
    /// `compact<u32>`
    U32(u32),
    /// `compact<u64>`
    U64(u64),
    /// `compact<u128>`
    U128(u128),
}

impl CompactInt {
    /// 指定宽度的零值。
    pub const fn zero(width: IntWidth) -> Self {
        match width {
            IntWidth::W8 => CompactInt::U8(0),
            IntWidth::W16 => CompactInt::U16(0),
            IntWidth::W32 => CompactInt::U32(0),
            IntWidth::W64 => CompactInt::U64(0),
            IntWidth::W128 => CompactInt::U128(0),
        }
    }

    /// 以数值构造，超出宽度返回 [`CompactError::OutOfRange`]。
    pub fn new(width: IntWidth, value: u128) -> Result<Self> {
        if value > width.unsigned_max() {
            return Err(CompactError::out_of_range(
                width,
                format!("{value} exceeds compact max {}", width.unsigned_max()),
            ));
        }
        // 上面已按宽度校验，截断转换不会丢位。
        Ok(match width {
            IntWidth::W8 => CompactInt::U8(value as u8),
            IntWidth::W16 => CompactInt::U16(value as u16),
            IntWidth::W32 => CompactInt::U32(value as u32),
            IntWidth::W64 => CompactInt::U64(value as u64),
            IntWidth::W128 => CompactInt::U128(value),
        })
    }

    /// 位宽。
    pub const fn width(&self) -> IntWidth {
        match self {
            CompactInt::U8(_) => IntWidth::W8,
            CompactInt::U16(_) => IntWidth::W16,
            CompactInt::U32(_) => IntWidth::W32,
            CompactInt::U64(_) => IntWidth::W64,
            CompactInt::U128(_) => IntWidth::W128,
        }
    }

    /// 统一提升为 `u128`。
    pub const fn get(&self) -> u128 {
        match *self {
            CompactInt::U8(v) => v as u128,
            CompactInt::U16(v) => v as u128,
            CompactInt::U32(v) => v as u128,
            CompactInt::U64(v) => v as u128,
            CompactInt::U128(v) => v,
        }
    }
}

impl CompactCodec for CompactInt {
    fn encode_to(&self, out: &mut BytesMut) -> Result<()> {
        match *self {
            CompactInt::U8(v) => compact::encode_compact_u8(out, v),
            CompactInt::U16(v) => compact::encode_compact_u16(out, v),
            CompactInt::U32(v) => compact::encode_compact_u32(out, v),
            CompactInt::U64(v) => compact::encode_compact_u64(out, v),
            CompactInt::U128(v) => compact::encode_compact_u128(out, v),
        }
        Ok(())
    }

    fn decode_from(&mut self, reader: &mut Reader<'_>) -> Result<()> {
        match self {
            CompactInt::U8(v) => *v = compact::decode_compact_u8(reader)?,
            CompactInt::U16(v) => *v = compact::decode_compact_u16(reader)?,
            CompactInt::U32(v) => *v = compact::decode_compact_u32(reader)?,
            CompactInt::U64(v) => *v = compact::decode_compact_u64(reader)?,
            CompactInt::U128(v) => *v = compact::decode_compact_u128(reader)?,
        }
        Ok(())
    }

    fn value(&self) -> NativeValue {
        NativeValue::UInt(self.get())
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::compact(self.width())
    }

    fn clone_template(&self) -> Self {
        CompactInt::zero(self.width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_rejects_other_bytes() {
        let mut flag = false;
        assert_eq!(flag.decode(&[0x01]).unwrap(), 1);
        assert!(flag);
        assert_eq!(
            flag.decode(&[0x02]).unwrap_err(),
            CompactError::InvalidBool { byte: 0x02 }
        );
    }

    #[test]
    fn string_is_length_prefixed() {
        let text = String::from("key");
        assert_eq!(text.encode().unwrap().as_ref(), &[0x0c, b'k', b'e', b'y']);

        let mut decoded = String::new();
        assert_eq!(decoded.decode(&[0x0c, b'k', b'e', b'y', 0xff]).unwrap(), 4);
        assert_eq!(decoded, "key");
    }

    #[test]
    fn string_rejects_invalid_utf8() {
        let mut decoded = String::new();
        let err = decoded.decode(&[0x08, 0xff, 0xfe]).unwrap_err();
        assert_eq!(err.code(), crate::error::codes::INVALID_UTF8);
    }

    #[test]
    fn string_truncated_payload() {
        let mut decoded = String::new();
        let err = decoded.decode(&[0x14, b'a']).unwrap_err();
        assert_eq!(
            err,
            CompactError::TruncatedInput {
                needed: 5,
                remaining: 1
            }
        );
    }

    #[test]
    fn fixed_int_range_checks() {
        assert_eq!(
            FixedInt::from_unsigned(IntWidth::W8, 255).unwrap(),
            FixedInt::U8(255)
        );
        assert!(FixedInt::from_unsigned(IntWidth::W8, 256).is_err());
        assert!(FixedInt::from_signed(IntWidth::W16, -32_769).is_err());
        assert_eq!(
            FixedInt::from_signed(IntWidth::W128, i128::MIN).unwrap(),
            FixedInt::I128(i128::MIN)
        );
    }

    #[test]
    fn fixed_int_decodes_in_place() {
        let mut value = FixedInt::zero(IntWidth::W32, true);
        assert_eq!(value.decode(&[0xfe, 0xff, 0xff, 0xff]).unwrap(), 4);
        assert_eq!(value, FixedInt::I32(-2));
        assert_eq!(value.value(), NativeValue::Int(-2));
        assert_eq!(value.clone_template(), FixedInt::I32(0));
        assert_eq!(value.type_tag(), TypeTag::I32);
    }

    #[test]
    fn compact_int_respects_width() {
        assert!(CompactInt::new(IntWidth::W8, 256).is_err());
        let value = CompactInt::new(IntWidth::W64, 64).unwrap();
        assert_eq!(value.encode().unwrap().as_ref(), &[0x01, 0x01]);

        let mut narrow = CompactInt::zero(IntWidth::W8);
        let err = narrow.decode(&[0x01, 0x04]).unwrap_err();
        assert_eq!(err.code(), crate::error::codes::OUT_OF_RANGE);
    }
}
