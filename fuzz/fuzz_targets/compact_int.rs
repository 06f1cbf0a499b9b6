#![no_main]

use arbitrary::Arbitrary;
use bytes::BytesMut;
use compact_codec::int::compact::{decode_compact, encode_compact};
use compact_codec::{IntWidth, Reader};
use libfuzzer_sys::fuzz_target;

/// Fuzz 输入：目标宽度 + 任意字节。
///
/// - **Why**：变长整数解码必须拒绝一切非最小模式；只要解码成功，重新编码就必须逐字节复现被消费的前缀；
/// - **What**：宽度由选择子取模得到，覆盖 8 至 128 位。
#[derive(Debug, Arbitrary)]
struct CompactCase {
    width: u8,
    bytes: Vec<u8>,
}

const WIDTHS: [IntWidth; 5] = [
    IntWidth::W8,
    IntWidth::W16,
    IntWidth::W32,
    IntWidth::W64,
    IntWidth::W128,
];

fuzz_target!(|case: CompactCase| {
    let width = WIDTHS[usize::from(case.width) % WIDTHS.len()];
    let mut reader = Reader::new(&case.bytes);
    let Ok(value) = decode_compact(&mut reader, width) else {
        return;
    };
    assert!(value <= width.unsigned_max());

    let mut out = BytesMut::new();
    encode_compact(&mut out, value, width).expect("解码成功的值必然可编码");
    assert_eq!(&out[..], &case.bytes[..reader.position()], "编码必须是唯一的最小形式");
});
