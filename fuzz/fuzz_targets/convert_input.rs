#![no_main]

use std::sync::{Arc, OnceLock};

use arbitrary::Arbitrary;
use compact_abi::{Abi, AbiCodec, Input, native_value};
use libfuzzer_sys::fuzz_target;

const SCHEMA: &str = include_str!("../../crates/compact-abi/tests/fixtures/records.abi.json");

/// 可由 fuzzer 生成的松散输入，映射为 [`Input`]。
#[derive(Debug, Arbitrary)]
enum FuzzInput {
    Str(String),
    Bool(bool),
    UInt(u128),
    Int(i128),
    List(Vec<FuzzInput>),
}

impl From<FuzzInput> for Input {
    fn from(value: FuzzInput) -> Self {
        match value {
            FuzzInput::Str(text) => Input::Str(text),
            FuzzInput::Bool(flag) => Input::Bool(flag),
            FuzzInput::UInt(v) => Input::UInt(v),
            FuzzInput::Int(v) => Input::Int(v),
            FuzzInput::List(items) => Input::List(items.into_iter().map(Input::from).collect()),
        }
    }
}

#[derive(Debug, Arbitrary)]
struct ConvertCase {
    method: u8,
    args: Vec<FuzzInput>,
}

fn codec() -> &'static AbiCodec {
    static CODEC: OnceLock<AbiCodec> = OnceLock::new();
    CODEC.get_or_init(|| {
        AbiCodec::new(Arc::new(
            Abi::from_json_str(SCHEMA).expect("夹具类型表合法"),
        ))
    })
}

fuzz_target!(|case: ConvertCase| {
    let codec = codec();
    let methods = codec.abi().methods();
    let method = &methods[usize::from(case.method) % methods.len()];
    let args: Vec<Input> = case.args.into_iter().map(Input::from).collect();
    let Ok(bytes) = codec.encode(method.name(), &args) else {
        return;
    };

    // 编码成功的参数必须能按输入类型原样解码回来。
    let decoded = codec
        .decode_inputs(method.name(), &bytes)
        .expect("编码产物必然可解码");
    let fed_back: Vec<Input> = decoded.iter().map(native_value).map(Input::from).collect();
    assert_eq!(codec.encode(method.name(), &fed_back).expect("回灌输入合法"), bytes);
});
