//! 定长小端整数。
//!
//! - `u8/i8` 占 1 字节，其余宽度按 N 字节小端排列；
//! - `i128` 负数按 16 字节窗口的二进制补码存放，解码时最高存储字节 `>= 0x80` 即为负数。
//!   Rust 原生 `to_le_bytes`/`from_le_bytes` 恰好给出同一布局，`i128::MIN` 也能往返。

use bytes::{BufMut, BytesMut};

use crate::error::Result;
use crate::reader::Reader;

macro_rules! fixed_codec {
    ($($ty:ty => $encode:ident, $decode:ident;)+) => {
        $(
            #[doc = concat!("写入小端 `", stringify!($ty), "`。")]
            pub fn $encode(out: &mut BytesMut, value: $ty) {
                out.put_slice(&value.to_le_bytes());
            }

            #[doc = concat!("读取小端 `", stringify!($ty), "`。")]
            pub fn $decode(reader: &mut Reader<'_>) -> Result<$ty> {
                Ok(<$ty>::from_le_bytes(reader.read_array()?))
            }
        )+
    };
}

fixed_codec! {
    u8 => encode_u8, decode_u8;
    u16 => encode_u16, decode_u16;
    u32 => encode_u32, decode_u32;
    u64 => encode_u64, decode_u64;
    u128 => encode_u128, decode_u128;
    i8 => encode_i8, decode_i8;
    i16 => encode_i16, decode_i16;
    i32 => encode_i32, decode_i32;
    i64 => encode_i64, decode_i64;
    i128 => encode_i128, decode_i128;
}

/// 判断 16 字节 `i128` 编码是否表示负数：看最高位存储字节。
pub fn i128_is_negative(encoded: &[u8; 16]) -> bool {
    encoded[15] >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded<F: FnOnce(&mut BytesMut)>(f: F) -> Vec<u8> {
        let mut out = BytesMut::new();
        f(&mut out);
        out.to_vec()
    }

    #[test]
    fn little_endian_layout() {
        assert_eq!(encoded(|o| encode_u16(o, 0x0102)), [0x02, 0x01]);
        assert_eq!(
            encoded(|o| encode_u32(o, 0xdead_beef)),
            [0xef, 0xbe, 0xad, 0xde]
        );
        assert_eq!(encoded(|o| encode_i8(o, -1)), [0xff]);
        assert_eq!(encoded(|o| encode_i16(o, -2)), [0xfe, 0xff]);
    }

    #[test]
    fn negative_i128_uses_twos_complement_window() {
        let bytes = encoded(|o| encode_i128(o, -1));
        assert_eq!(bytes, [0xff; 16]);

        let min = encoded(|o| encode_i128(o, i128::MIN));
        let mut expected = [0u8; 16];
        expected[15] = 0x80;
        assert_eq!(min, expected);
        assert!(i128_is_negative(&expected));

        let mut reader = Reader::new(&min);
        assert_eq!(decode_i128(&mut reader).unwrap(), i128::MIN);
        assert_eq!(reader.position(), 16);
    }

    #[test]
    fn short_input_is_truncated() {
        let mut reader = Reader::new(&[1, 2, 3]);
        assert!(decode_u64(&mut reader).is_err());
    }
}
