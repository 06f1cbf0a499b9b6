#![no_main]

use std::sync::{Arc, OnceLock};

use arbitrary::Arbitrary;
use compact_abi::{Abi, AbiCodec};
use libfuzzer_sys::fuzz_target;

const SCHEMA: &str = include_str!("../../crates/compact-abi/tests/fixtures/records.abi.json");

/// Fuzz 输入：方法选择子 + 任意返回字节。
///
/// - **Why**：返回值来自远端执行引擎，属于不可信输入；解码只能返回错误，不能 panic 或超量分配；
/// - **What**：解码成功时，按输出类型重新编码必须得到完全相同的字节。
#[derive(Debug, Arbitrary)]
struct OutputCase {
    method: u8,
    bytes: Vec<u8>,
}

fn codec() -> &'static AbiCodec {
    static CODEC: OnceLock<AbiCodec> = OnceLock::new();
    CODEC.get_or_init(|| {
        AbiCodec::new(Arc::new(
            Abi::from_json_str(SCHEMA).expect("夹具类型表合法"),
        ))
    })
}

fuzz_target!(|case: OutputCase| {
    let codec = codec();
    let methods = codec.abi().methods();
    let method = &methods[usize::from(case.method) % methods.len()];
    let Ok(values) = codec.decode(method.name(), &case.bytes) else {
        return;
    };
    let reencoded = codec
        .encode_values(method.outputs(), &values)
        .expect("解码得到的值必然与声明类型同形状");
    assert_eq!(&reencoded[..], &case.bytes[..]);
});
