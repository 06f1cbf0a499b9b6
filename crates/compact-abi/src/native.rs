//! 解码结果的 JSON 呈现。

use compact_codec::NativeValue;
use serde_json::Value;

pub use compact_codec::value::native_value;

/// 把 [`NativeValue`] 渲染为 JSON。
///
/// 超出 64 位的整数渲染为十进制字符串，其余整数为 JSON 数字。
pub trait ToJson {
    /// 渲染为 [`serde_json::Value`]。
    fn to_json(&self) -> Value;
}

impl ToJson for NativeValue {
    fn to_json(&self) -> Value {
        match self {
            NativeValue::Bool(flag) => Value::Bool(*flag),
            NativeValue::Str(text) => Value::String(text.clone()),
            NativeValue::UInt(v) => match u64::try_from(*v) {
                Ok(narrow) => Value::from(narrow),
                Err(_) => Value::String(v.to_string()),
            },
            NativeValue::Int(v) => match i64::try_from(*v) {
                Ok(narrow) => Value::from(narrow),
                Err(_) => Value::String(v.to_string()),
            },
            NativeValue::List(items) => Value::Array(items.iter().map(ToJson::to_json).collect()),
        }
    }
}

impl ToJson for [NativeValue] {
    fn to_json(&self) -> Value {
        Value::Array(self.iter().map(ToJson::to_json).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_nested_lists() {
        let value = NativeValue::List(vec![
            NativeValue::UInt(1),
            NativeValue::Int(-1),
            NativeValue::UInt(u128::from(u64::MAX) + 1),
            NativeValue::List(vec![NativeValue::Str("k".into()), NativeValue::Bool(false)]),
        ]);
        assert_eq!(
            value.to_json(),
            json!([1, -1, "18446744073709551616", ["k", false]])
        );
    }

    #[test]
    fn json_rendering_agrees_with_serde() {
        let values = [NativeValue::Int(i128::MIN), NativeValue::UInt(3)];
        assert_eq!(values.to_json(), serde_json::to_value(&values[..]).unwrap());
    }
}
