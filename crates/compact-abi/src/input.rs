//! 调用方输入模型。
//!
//! 调用方手里的参数往往是字符串、数字或嵌套列表，形态松散；[`Input`] 把它们收敛为封闭枚举，
//! 转换器据此按类型表逐层匹配。结构体、元组、数组、向量都以 `List` 表达，
//! 枚举为 `List[tag, payload...]`，与解码结果的 [`NativeValue`] 形态对称。

use compact_codec::{CompactError, NativeValue, Result};
use serde_json::Value;

/// 松散类型的调用参数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// 字符串；数值类型也接受十进制或 `0x` 十六进制文本。
    Str(String),
    /// 布尔。
    Bool(bool),
    /// 无符号整数。
    UInt(u128),
    /// 有符号整数。
    Int(i128),
    /// 有序子输入。
    List(Vec<Input>),
}

impl Input {
    /// 形态名称，用于错误信息。
    pub fn kind_name(&self) -> &'static str {
        match self {
            Input::Str(_) => "string input",
            Input::Bool(_) => "bool input",
            Input::UInt(_) => "unsigned input",
            Input::Int(_) => "signed input",
            Input::List(_) => "list input",
        }
    }

    /// 从 JSON 值构造。
    ///
    /// - 非负整数映射为 `UInt`，负整数为 `Int`；
    /// - 浮点数返回 [`CompactError::InvalidLiteral`]；
    /// - `null` 与对象返回 [`CompactError::TypeMismatch`]。
    pub fn from_json(value: Value) -> Result<Self> {
        Ok(match value {
            Value::Bool(flag) => Input::Bool(flag),
            Value::String(text) => Input::Str(text),
            Value::Number(number) => {
                if let Some(unsigned) = number.as_u64() {
                    Input::UInt(u128::from(unsigned))
                } else if let Some(signed) = number.as_i64() {
                    Input::Int(i128::from(signed))
                } else {
                    return Err(CompactError::InvalidLiteral {
                        target: "integer".to_owned(),
                        literal: number.to_string(),
                    });
                }
            }
            Value::Array(items) => Input::List(
                items
                    .into_iter()
                    .map(Input::from_json)
                    .collect::<Result<_>>()?,
            ),
            Value::Null => return Err(CompactError::type_mismatch("scalar or list", "null")),
            Value::Object(_) => {
                return Err(CompactError::type_mismatch("scalar or list", "object"));
            }
        })
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Input::Str(value.to_owned())
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Input::Str(value)
    }
}

impl From<bool> for Input {
    fn from(value: bool) -> Self {
        Input::Bool(value)
    }
}

impl<T: Into<Input>> From<Vec<T>> for Input {
    fn from(values: Vec<T>) -> Self {
        Input::List(values.into_iter().map(Into::into).collect())
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $wide:ty: $($ty:ty),+) => {
        $(
            impl From<$ty> for Input {
                fn from(value: $ty) -> Self {
                    Input::$variant(value as $wide)
                }
            }
        )+
    };
}

impl_from_int!(UInt, u128: u8, u16, u32, u64, u128, usize);
impl_from_int!(Int, i128: i8, i16, i32, i64, i128, isize);

/// 解码结果可原样回灌给转换器。
impl From<NativeValue> for Input {
    fn from(value: NativeValue) -> Self {
        match value {
            NativeValue::Bool(flag) => Input::Bool(flag),
            NativeValue::Str(text) => Input::Str(text),
            NativeValue::UInt(v) => Input::UInt(v),
            NativeValue::Int(v) => Input::Int(v),
            NativeValue::List(items) => Input::List(items.into_iter().map(Input::from).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_split_by_sign() {
        let input = Input::from_json(json!([1, -2, "x", true, [3]])).unwrap();
        assert_eq!(
            input,
            Input::List(vec![
                Input::UInt(1),
                Input::Int(-2),
                Input::Str("x".into()),
                Input::Bool(true),
                Input::List(vec![Input::UInt(3)]),
            ])
        );
    }

    #[test]
    fn json_rejects_floats_null_and_objects() {
        assert_eq!(
            Input::from_json(json!(1.5)).unwrap_err().code(),
            compact_codec::error::codes::INVALID_LITERAL
        );
        assert_eq!(
            Input::from_json(json!(null)).unwrap_err().code(),
            compact_codec::error::codes::TYPE_MISMATCH
        );
        assert!(Input::from_json(json!({"a": 1})).is_err());
    }

    #[test]
    fn native_integers_convert() {
        assert_eq!(Input::from(7u8), Input::UInt(7));
        assert_eq!(Input::from(-7i64), Input::Int(-7));
        assert_eq!(
            Input::from(vec!["a", "b"]),
            Input::List(vec![Input::from("a"), Input::from("b")])
        );
        assert_eq!(
            Input::from(NativeValue::List(vec![NativeValue::UInt(1)])),
            Input::List(vec![Input::UInt(1)])
        );
    }
}
