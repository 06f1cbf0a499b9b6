//! 原生值视图。
//!
//! 解码结果对外呈现为普通标量与列表：结构体、元组、数组、向量都压平为 `List`，
//! 枚举压平为 `List[UInt(tag), payload...]`。序列化时超出 64 位的整数以十进制字符串输出，
//! 避免 JSON 消费方按双精度浮点截断。

use serde::ser::{Serialize, SerializeSeq, Serializer};

use super::{CompactCodec, CompactValue};

/// 压平后的原生值。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeValue {
    /// 布尔。
    Bool(bool),
    /// 字符串。
    Str(String),
    /// 无符号整数（定长与变长）。
    UInt(u128),
    /// 有符号整数。
    Int(i128),
    /// 有序子值。
    List(Vec<NativeValue>),
}

impl NativeValue {
    /// 布尔视图。
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// 字符串视图。
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::Str(v) => Some(v),
            _ => None,
        }
    }

    /// 无符号整数视图。
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            NativeValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// 有符号整数视图。
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            NativeValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// 列表视图。
    pub fn as_list(&self) -> Option<&[NativeValue]> {
        match self {
            NativeValue::List(v) => Some(v),
            _ => None,
        }
    }
}

impl Serialize for NativeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NativeValue::Bool(v) => serializer.serialize_bool(*v),
            NativeValue::Str(v) => serializer.serialize_str(v),
            NativeValue::UInt(v) => match u64::try_from(*v) {
                Ok(narrow) => serializer.serialize_u64(narrow),
                Err(_) => serializer.collect_str(v),
            },
            NativeValue::Int(v) => match i64::try_from(*v) {
                Ok(narrow) => serializer.serialize_i64(narrow),
                Err(_) => serializer.collect_str(v),
            },
            NativeValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// 取值的原生表示。
pub fn native_value(value: &CompactValue) -> NativeValue {
    value.value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_integers_serialize_as_strings() {
        let value = NativeValue::List(vec![
            NativeValue::UInt(7),
            NativeValue::UInt(u128::MAX),
            NativeValue::Int(-3),
            NativeValue::Int(i128::MIN),
            NativeValue::Str("k".into()),
            NativeValue::Bool(true),
        ]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(
            json,
            r#"[7,"340282366920938463463374607431768211455",-3,"-170141183460469231731687303715884105728","k",true]"#
        );
    }

    #[test]
    fn accessors_match_variants() {
        let list = NativeValue::List(vec![NativeValue::Int(-1)]);
        assert_eq!(list.as_list().and_then(|l| l[0].as_i128()), Some(-1));
        assert_eq!(list.as_bool(), None);
        assert_eq!(NativeValue::Str("a".into()).as_str(), Some("a"));
        assert_eq!(NativeValue::UInt(3).as_u128(), Some(3));
    }
}
