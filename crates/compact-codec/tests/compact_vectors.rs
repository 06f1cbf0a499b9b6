//! 变长整数黄金向量。
//!
//! # 设计目的（Why）
//! - 以 JSON 描述“数值 → 字节”的标准对照，供其他语言的实现逐字节复现；
//! - 同时固化拒绝用例：非最小模式、宽度溢出、截断输入都必须返回稳定错误码。
//!
//! # 契约说明（What）
//! - `value` 以十进制字符串书写，以容纳 `u128`；
//! - `hex` 使用小写 ASCII。

use bytes::BytesMut;
use compact_codec::int::compact::{compact_len, decode_compact, encode_compact};
use compact_codec::{IntWidth, Reader};
use serde::Deserialize;

const VECTORS: &str = include_str!("vectors/compact_int.json");

#[derive(Debug, Deserialize)]
struct VectorSuite {
    suite: String,
    encode: Vec<EncodeCase>,
    reject: Vec<RejectCase>,
}

#[derive(Debug, Deserialize)]
struct EncodeCase {
    value: String,
    width: IntWidth,
    hex: String,
}

#[derive(Debug, Deserialize)]
struct RejectCase {
    hex: String,
    width: IntWidth,
    code: String,
}

fn load() -> VectorSuite {
    serde_json::from_str(VECTORS).expect("向量文件必须是合法 JSON")
}

#[test]
fn encode_vectors_match_bytes() {
    let suite = load();
    assert_eq!(suite.suite, "compact-int");
    for case in suite.encode {
        let value: u128 = case.value.parse().expect("十进制数值");
        let mut out = BytesMut::new();
        encode_compact(&mut out, value, case.width).expect("向量值在宽度内");
        assert_eq!(hex::encode(&out), case.hex, "encode {}", case.value);
        assert_eq!(compact_len(value), out.len(), "len {}", case.value);

        let bytes = hex::decode(&case.hex).expect("合法十六进制");
        let mut reader = Reader::new(&bytes);
        assert_eq!(decode_compact(&mut reader, case.width).unwrap(), value);
        assert!(reader.is_empty(), "decode {} 应消费全部字节", case.value);
    }
}

#[test]
fn reject_vectors_report_stable_codes() {
    for case in load().reject {
        let bytes = hex::decode(&case.hex).expect("合法十六进制");
        let mut reader = Reader::new(&bytes);
        let err = decode_compact(&mut reader, case.width)
            .expect_err(&format!("{} 应被拒绝", case.hex));
        assert_eq!(err.code(), case.code, "{}: {err}", case.hex);
    }
}

#[test]
fn encode_rejects_values_wider_than_width() {
    let mut out = BytesMut::new();
    let err = encode_compact(&mut out, 1 << 32, IntWidth::W32).unwrap_err();
    assert_eq!(err.code(), compact_codec::error::codes::OUT_OF_RANGE);
    assert!(out.is_empty());
}
