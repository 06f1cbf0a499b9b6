use std::hint::black_box;
use std::sync::Arc;

use compact_abi::{Abi, AbiCodec, Input};
use criterion::{Criterion, criterion_group, criterion_main};

const SCHEMA: &str = include_str!("../tests/fixtures/records.abi.json");

/// 引擎编解码基准。
///
/// # 设计目的（Why）
/// - 跟踪 `put_record` 这类“定长整数 + 字符串 + 字符串向量”负载的编码与解码开销；
/// - 解码路径每次都由类型表重建模板，基准可暴露模板构造的成本变化。
///
/// # 执行逻辑（How）
/// - 类型表与输入在基准外准备，`iter` 内只计入引擎调用。
fn bench_engine(c: &mut Criterion) {
    let codec = AbiCodec::new(Arc::new(
        Abi::from_json_str(SCHEMA).expect("夹具类型表合法"),
    ));
    let tags: Vec<String> = (0..16).map(|i| format!("tag-{i}")).collect();
    let args = [Input::List(vec![
        Input::from(42u32),
        Input::from("benchmark-record"),
        Input::from(tags),
    ])];
    let encoded = codec.encode("put_record", &args).expect("参数合法");

    c.bench_function("encode_put_record", |b| {
        b.iter(|| codec.encode(black_box("put_record"), black_box(&args)))
    });
    c.bench_function("decode_put_record", |b| {
        b.iter(|| codec.decode(black_box("put_record"), black_box(&encoded)))
    });
    c.bench_function("invocation_set_record", |b| {
        b.iter(|| codec.encode_invocation(black_box("put_record"), black_box(&args)))
    });
}

criterion_group!(engine_benches, bench_engine);
criterion_main!(engine_benches);
