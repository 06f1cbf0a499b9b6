//! 变长整数（compact integer）。
//!
//! ## 编码规则（What）
//! 首字节低 2 位为模式位：
//!
//! | 模式 | 布局 | 取值范围 |
//! |---|---|---|
//! | `00` 单字节 | 值位于 bit 2–7 | 0–63 |
//! | `01` 双字节 | 余下 14 位，2 字节小端 | 64–16383 |
//! | `10` 四字节 | 余下 30 位，4 字节小端 | 16384–(2^30−1) |
//! | `11` 大整数 | 首字节高 6 位为 `字节数−4`，随后为小端数值 | 2^30 及以上 |
//!
//! 编码总是选择能精确表示的最小模式；解码拒绝任何非最小模式（包括大整数最高字节为 0 的冗余长度），
//! 统一返回 [`CompactError::OutOfRange`]。
//!
//! ## 实现策略（How）
//! - 内部以 `u128` 为公共载体，`encode_compact`/`decode_compact` 按 [`IntWidth`] 做上界检查；
//! - 每个宽度再包一层强类型函数（`encode_compact_u32` 等），调用方无需自行截断。

use bytes::{BufMut, BytesMut};

use crate::error::{CompactError, Result};
use crate::int::IntWidth;
use crate::reader::Reader;

const SINGLE_BYTE_MAX: u128 = (1 << 6) - 1;
const DOUBLE_BYTE_MAX: u128 = (1 << 14) - 1;
const FOUR_BYTE_MAX: u128 = (1 << 30) - 1;

const MODE_MASK: u8 = 0b11;
const MODE_SINGLE: u8 = 0b00;
const MODE_DOUBLE: u8 = 0b01;
const MODE_FOUR: u8 = 0b10;
const MODE_BIG: u8 = 0b11;

/// 大整数模式的最小载荷字节数。
const BIG_MIN_BYTES: usize = 4;

/// 变长整数的四种模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactMode {
    /// 单字节，0–63。
    SingleByte,
    /// 双字节，64–16383。
    DoubleByte,
    /// 四字节，16384–(2^30−1)。
    FourByte,
    /// 大整数，2^30 及以上。
    BigInt,
}

impl CompactMode {
    /// 给出能表示 `value` 的最小模式。
    pub fn for_value(value: u128) -> Self {
        if value <= SINGLE_BYTE_MAX {
            CompactMode::SingleByte
        } else if value <= DOUBLE_BYTE_MAX {
            CompactMode::DoubleByte
        } else if value <= FOUR_BYTE_MAX {
            CompactMode::FourByte
        } else {
            CompactMode::BigInt
        }
    }

    /// 从首字节的模式位解析。
    pub fn from_prefix(first: u8) -> Self {
        match first & MODE_MASK {
            MODE_SINGLE => CompactMode::SingleByte,
            MODE_DOUBLE => CompactMode::DoubleByte,
            MODE_FOUR => CompactMode::FourByte,
            _ => CompactMode::BigInt,
        }
    }
}

/// 大整数模式下数值的最小字节数（至少 4）。
fn big_int_len(value: u128) -> usize {
    let significant = 16 - (value.leading_zeros() / 8) as usize;
    significant.max(BIG_MIN_BYTES)
}

/// `value` 的编码长度。
pub fn compact_len(value: u128) -> usize {
    match CompactMode::for_value(value) {
        CompactMode::SingleByte => 1,
        CompactMode::DoubleByte => 2,
        CompactMode::FourByte => 4,
        CompactMode::BigInt => 1 + big_int_len(value),
    }
}

/// 以 `width` 为上界编码变长整数。
pub fn encode_compact(out: &mut BytesMut, value: u128, width: IntWidth) -> Result<()> {
    if value > width.unsigned_max() {
        return Err(CompactError::out_of_range(
            width,
            format!("compact value {value} exceeds {}", width.unsigned_max()),
        ));
    }

    put_compact(out, value);
    Ok(())
}

/// 按最小模式写出 `value`；调用方已保证其不超过目标宽度。
fn put_compact(out: &mut BytesMut, value: u128) {
    // 各分支的 `as` 截断均已由模式范围保证不丢位。
    match CompactMode::for_value(value) {
        CompactMode::SingleByte => out.put_u8((value as u8) << 2 | MODE_SINGLE),
        CompactMode::DoubleByte => out.put_u16_le((value as u16) << 2 | MODE_DOUBLE as u16),
        CompactMode::FourByte => out.put_u32_le((value as u32) << 2 | MODE_FOUR as u32),
        CompactMode::BigInt => {
            let len = big_int_len(value);
            out.put_u8(((len - BIG_MIN_BYTES) as u8) << 2 | MODE_BIG);
            out.put_slice(&value.to_le_bytes()[..len]);
        }
    }
}

/// 以 `width` 为上界解码变长整数，并拒绝非最小模式。
pub fn decode_compact(reader: &mut Reader<'_>, width: IntWidth) -> Result<u128> {
    let first = reader.read_u8()?;
    let mode = CompactMode::from_prefix(first);
    let value = match mode {
        CompactMode::SingleByte => u128::from(first >> 2),
        CompactMode::DoubleByte => {
            let [second] = reader.read_array::<1>()?;
            let value = u128::from(u16::from_le_bytes([first, second]) >> 2);
            reject_non_canonical(value, SINGLE_BYTE_MAX, width, mode)?;
            value
        }
        CompactMode::FourByte => {
            let [b1, b2, b3] = reader.read_array::<3>()?;
            let value = u128::from(u32::from_le_bytes([first, b1, b2, b3]) >> 2);
            reject_non_canonical(value, DOUBLE_BYTE_MAX, width, mode)?;
            value
        }
        CompactMode::BigInt => {
            let len = usize::from(first >> 2) + BIG_MIN_BYTES;
            if len > width.bytes() {
                return Err(CompactError::out_of_range(
                    width,
                    format!("big-int compact declares {len} bytes"),
                ));
            }
            let raw = reader.read_bytes(len)?;
            if raw[len - 1] == 0 {
                return Err(CompactError::out_of_range(
                    width,
                    format!("big-int compact with {len} bytes has a zero high byte"),
                ));
            }
            let mut buf = [0u8; 16];
            buf[..len].copy_from_slice(raw);
            let value = u128::from_le_bytes(buf);
            reject_non_canonical(value, FOUR_BYTE_MAX, width, mode)?;
            value
        }
    };

    if value > width.unsigned_max() {
        return Err(CompactError::out_of_range(
            width,
            format!("decoded compact {value} exceeds {}", width.unsigned_max()),
        ));
    }
    Ok(value)
}

fn reject_non_canonical(
    value: u128,
    lower_mode_max: u128,
    width: IntWidth,
    mode: CompactMode,
) -> Result<()> {
    if value <= lower_mode_max {
        return Err(CompactError::out_of_range(
            width,
            format!("{value} is not canonically encoded in {mode:?} mode"),
        ));
    }
    Ok(())
}

macro_rules! compact_width {
    ($($ty:ty, $width:expr => $encode:ident, $decode:ident;)+) => {
        $(
            #[doc = concat!("编码 `", stringify!($ty), "` 宽度的变长整数。")]
            pub fn $encode(out: &mut BytesMut, value: $ty) {
                put_compact(out, u128::from(value));
            }

            #[doc = concat!("解码 `", stringify!($ty), "` 宽度的变长整数。")]
            pub fn $decode(reader: &mut Reader<'_>) -> Result<$ty> {
                let value = decode_compact(reader, $width)?;
                <$ty>::try_from(value).map_err(|_| {
                    CompactError::out_of_range($width, format!("decoded compact {value}"))
                })
            }
        )+
    };
}

compact_width! {
    u8, IntWidth::W8 => encode_compact_u8, decode_compact_u8;
    u16, IntWidth::W16 => encode_compact_u16, decode_compact_u16;
    u32, IntWidth::W32 => encode_compact_u32, decode_compact_u32;
    u64, IntWidth::W64 => encode_compact_u64, decode_compact_u64;
    u128, IntWidth::W128 => encode_compact_u128, decode_compact_u128;
}

/// 编码长度前缀（`u32` 宽度）。
pub fn encode_len(out: &mut BytesMut, len: usize) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| {
        CompactError::out_of_range(IntWidth::W32, format!("length {len} exceeds u32"))
    })?;
    encode_compact_u32(out, len);
    Ok(())
}

/// 解码长度前缀，并按 `max_collection_len` 校验。
pub fn decode_len(reader: &mut Reader<'_>) -> Result<usize> {
    let len = decode_compact_u32(reader)? as usize;
    reader.limits().check_collection(len)?;
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: u128, width: IntWidth) -> Vec<u8> {
        let mut out = BytesMut::new();
        encode_compact(&mut out, value, width).expect("值在宽度范围内");
        out.to_vec()
    }

    fn decode(bytes: &[u8], width: IntWidth) -> Result<u128> {
        let mut reader = Reader::new(bytes);
        let value = decode_compact(&mut reader, width)?;
        assert_eq!(reader.position(), bytes.len(), "应恰好消费全部字节");
        Ok(value)
    }

    #[test]
    fn mode_boundaries_encode_to_expected_bytes() {
        assert_eq!(encode(0, IntWidth::W32), [0x00]);
        assert_eq!(encode(63, IntWidth::W32), [0xfc]);
        assert_eq!(encode(64, IntWidth::W32), [0x01, 0x01]);
        assert_eq!(encode(16383, IntWidth::W32), [0xfd, 0xff]);
        assert_eq!(encode(16384, IntWidth::W32), [0x02, 0x00, 0x01, 0x00]);
        assert_eq!(encode((1 << 30) - 1, IntWidth::W32), [0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(
            encode(1 << 30, IntWidth::W32),
            [0x03, 0x00, 0x00, 0x00, 0x40]
        );
        assert_eq!(
            encode(u32::MAX.into(), IntWidth::W32),
            [0x03, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn width_maxima_use_full_big_int() {
        let bytes = encode(u64::MAX.into(), IntWidth::W64);
        assert_eq!(bytes[0], 0x13, "8 字节载荷：(8-4)<<2 | 0b11");
        assert_eq!(&bytes[1..], &[0xff; 8]);
        assert_eq!(decode(&bytes, IntWidth::W64).unwrap(), u64::MAX.into());

        let bytes = encode(u128::MAX, IntWidth::W128);
        assert_eq!(bytes[0], 0x33);
        assert_eq!(bytes.len(), 17);
        assert_eq!(decode(&bytes, IntWidth::W128).unwrap(), u128::MAX);
    }

    #[test]
    fn non_canonical_modes_are_rejected() {
        // 5 以双字节模式存放。
        let err = decode(&[0x15, 0x00], IntWidth::W32).unwrap_err();
        assert_eq!(err.code(), crate::error::codes::OUT_OF_RANGE);
        // 100 以四字节模式存放。
        assert!(decode(&[0x92, 0x01, 0x00, 0x00], IntWidth::W32).is_err());
        // 2^29 以大整数模式存放。
        assert!(decode(&[0x03, 0x00, 0x00, 0x00, 0x20], IntWidth::W32).is_err());
        // 大整数声明 5 字节但最高字节为 0。
        assert!(decode(&[0x07, 0x00, 0x00, 0x00, 0x40, 0x00], IntWidth::W64).is_err());
    }

    #[test]
    fn width_overflow_is_out_of_range() {
        let mut out = BytesMut::new();
        let err = encode_compact(&mut out, 256, IntWidth::W8).unwrap_err();
        assert!(matches!(
            err,
            CompactError::OutOfRange {
                width: IntWidth::W8,
                ..
            }
        ));
        assert!(out.is_empty(), "失败时不得写出任何字节");

        // 300 合法编码为双字节，但超过 u8。
        let bytes = encode(300, IntWidth::W16);
        let mut reader = Reader::new(&bytes);
        assert!(decode_compact_u8(&mut reader).is_err());

        // u32 宽度不接受 5 字节大整数。
        let bytes = encode(1 << 32, IntWidth::W64);
        assert!(decode(&bytes, IntWidth::W32).is_err());
    }

    #[test]
    fn truncated_big_int_is_fatal() {
        let err = decode(&[0x03, 0x00, 0x00], IntWidth::W32).unwrap_err();
        assert!(matches!(err, CompactError::TruncatedInput { .. }));
    }

    #[test]
    fn compact_len_matches_encoding() {
        for value in [0, 63, 64, 16383, 16384, (1 << 30) - 1, 1 << 30, u128::MAX] {
            assert_eq!(compact_len(value), encode(value, IntWidth::W128).len());
        }
    }

    #[test]
    fn typed_encoders_match_checked_encoder() {
        let mut out = BytesMut::new();
        encode_compact_u8(&mut out, u8::MAX);
        assert_eq!(out.as_ref(), encode(u8::MAX.into(), IntWidth::W8).as_slice());

        let mut out = BytesMut::new();
        encode_compact_u64(&mut out, u64::MAX);
        assert_eq!(out.as_ref(), encode(u64::MAX.into(), IntWidth::W64).as_slice());
        let mut reader = Reader::new(&out);
        assert_eq!(decode_compact_u64(&mut reader).unwrap(), u64::MAX);

        let mut out = BytesMut::new();
        encode_compact_u128(&mut out, u128::MAX);
        assert_eq!(out.len(), 17);
    }
}
