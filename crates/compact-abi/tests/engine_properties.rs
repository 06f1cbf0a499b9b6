//! 引擎性质验证：输入 → 编码 → 解码 → 原生值 → 输入，字节保持不变。

use std::sync::Arc;

use compact_abi::{Abi, AbiCodec, Input, native_value};
use proptest::prelude::*;

const SCHEMA: &str = include_str!("fixtures/records.abi.json");

fn codec() -> AbiCodec {
    AbiCodec::new(Arc::new(Abi::from_json_str(SCHEMA).expect("夹具类型表合法")))
}

fn record_input() -> impl Strategy<Value = Input> {
    (
        any::<u32>(),
        "\\PC{0,24}",
        prop::collection::vec("[a-z]{0,8}", 0..6),
    )
        .prop_map(|(id, name, tags)| {
            Input::List(vec![Input::from(id), Input::from(name), Input::from(tags)])
        })
}

fn option_input() -> impl Strategy<Value = Input> {
    prop_oneof![
        any::<u8>().prop_map(|v| Input::from(vec![0u8, v])),
        Just(Input::from(vec![1u8])),
    ]
}

proptest! {
    #[test]
    fn prop_record_round_trips_through_native(arg in record_input()) {
        let codec = codec();
        let bytes = codec.encode("put_record", std::slice::from_ref(&arg)).unwrap();
        let values = codec.decode("put_record", &bytes).unwrap();
        let fed_back: Vec<Input> = values.iter().map(native_value).map(Input::from).collect();
        prop_assert_eq!(&fed_back[0], &arg);
        prop_assert_eq!(codec.encode("put_record", &fed_back).unwrap(), bytes);
    }

    #[test]
    fn prop_wide_tuple_round_trips(small in any::<u64>(), wide in any::<i128>(), flag in any::<bool>()) {
        let codec = codec();
        let args = [
            Input::List(vec![Input::from(small), Input::from(wide)]),
            Input::from(flag),
        ];
        let bytes = codec.encode("wide", &args).unwrap();
        let values = codec.decode("wide", &bytes).unwrap();
        let fed_back: Vec<Input> = values.iter().map(native_value).map(Input::from).collect();
        prop_assert_eq!(codec.encode("wide", &fed_back).unwrap(), bytes);
    }

    #[test]
    fn prop_enum_vectors_round_trip(items in prop::collection::vec(option_input(), 0..8)) {
        let codec = codec();
        let arg = Input::List(items);
        let bytes = codec.encode("tags", std::slice::from_ref(&arg)).unwrap();
        let values = codec.decode("tags", &bytes).unwrap();
        prop_assert_eq!(Input::from(native_value(&values[0])), arg);
    }

    #[test]
    fn prop_arbitrary_output_bytes_never_panic(input in prop::collection::vec(any::<u8>(), 0..128)) {
        let codec = codec();
        for method in ["put_record", "put_option", "put_triple", "wide", "tags"] {
            let _ = codec.decode(method, &input);
        }
    }
}
