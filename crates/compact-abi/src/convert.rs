//! 输入转换器：[`Input`] → [`CompactValue`]。
//!
//! ## 意图（Why）
//! - 调用方给出的参数形态松散，编码前必须按类型表逐层收紧为严格的值树；
//! - 所有宽度越界、字面量非法、形态不符都在这里暴露，编码阶段只做纯粹的字节拼接。
//!
//! ## 分派规则（How）
//! - 原语：数值接受 `UInt`/`Int` 或字符串（去除首尾空白，无符号允许 `0x` 前缀）；
//!   `str` 接受字符串，数字按十进制文本渲染；`bool` 接受布尔或 `"true"`/`"false"`；
//! - `Vec`/`Array`：必须是 `List`，数组额外校验长度；
//! - `Struct`/`Tuple`：`List` 长度须等于字段数；
//! - `Enum`：`List` 首元素为标签，其余元素为该变体载荷。
//!
//! ## 契约（What）
//! - 失败即返回，不产出部分结果；
//! - 递归层数受 [`DecodeLimits::max_depth`] 约束。

use core::num::IntErrorKind;

use compact_codec::value::{CompactInt, FixedInt};
use compact_codec::{
    ArrayValue, CompactError, CompactValue, DecodeLimits, IntWidth, Result, StructValue,
    TupleValue, VecValue,
};

use crate::input::Input;
use crate::registry::{Abi, PrimitiveKind, TypeKind, TypeRef};
use crate::template::default_value_at;

/// 基于类型表的输入转换器。
#[derive(Debug, Clone, Copy)]
pub struct Converter<'a> {
    abi: &'a Abi,
    limits: DecodeLimits,
}

impl<'a> Converter<'a> {
    /// 以默认限额创建。
    pub fn new(abi: &'a Abi) -> Self {
        Self::with_limits(abi, DecodeLimits::default())
    }

    /// 以指定限额创建。
    pub fn with_limits(abi: &'a Abi, limits: DecodeLimits) -> Self {
        Self { abi, limits }
    }

    /// 把 `input` 转换为类型 `ty` 的值。
    pub fn convert(&self, ty: TypeRef, input: &Input) -> Result<CompactValue> {
        self.convert_at(ty, input, 0)
    }

    fn convert_at(&self, ty: TypeRef, input: &Input, depth: usize) -> Result<CompactValue> {
        self.limits.check_depth(depth)?;
        let node = self.abi.resolve(ty)?;
        match node.kind() {
            TypeKind::Primitive(kind) => convert_primitive(*kind, input),
            TypeKind::Struct(fields) => {
                let items = expect_list(input, || format!("struct type {ty}"))?;
                let context = format!("struct type {ty}");
                let values = self.convert_fields(fields, items, &context, depth)?;
                Ok(CompactValue::Struct(StructValue::new(values)))
            }
            TypeKind::Tuple(fields) => {
                let items = expect_list(input, || format!("tuple type {ty}"))?;
                let context = format!("tuple type {ty}");
                let values = self.convert_fields(fields, items, &context, depth)?;
                Ok(CompactValue::Tuple(TupleValue::new(values)))
            }
            TypeKind::Vec(element) => {
                let items = expect_list(input, || format!("vec type {ty}"))?;
                let template = self.template(*element, depth + 1)?;
                let mut vec = VecValue::new(template);
                for item in items {
                    vec.push(self.convert_at(*element, item, depth + 1)?)?;
                }
                Ok(CompactValue::Vec(vec))
            }
            TypeKind::Array { element, len } => {
                let items = expect_list(input, || format!("array type {ty}"))?;
                if items.len() != *len {
                    return Err(CompactError::arity(
                        format!("array type {ty}"),
                        *len,
                        items.len(),
                    ));
                }
                let template = self.template(*element, depth + 1)?;
                let values = items
                    .iter()
                    .map(|item| self.convert_at(*element, item, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CompactValue::Array(ArrayValue::with_elements(
                    template, *len, values,
                )?))
            }
            TypeKind::Enum(variants) => {
                let items = expect_list(input, || format!("enum type {ty}"))?;
                let Some((tag_input, payload)) = items.split_first() else {
                    return Err(CompactError::arity(format!("enum type {ty}"), 1, 0));
                };
                let tag = parse_unsigned_input(tag_input, IntWidth::W8, "u8")? as u8;
                let fields = variants
                    .get(usize::from(tag))
                    .ok_or(CompactError::InvalidEnumTag {
                        tag,
                        variants: variants.len(),
                    })?;
                let payload = self.convert_fields(
                    fields,
                    payload,
                    &format!("enum type {ty} variant {tag}"),
                    depth,
                )?;
                let CompactValue::Enum(mut value) = self.template(ty, depth)? else {
                    return Err(CompactError::type_mismatch("enum", node.kind().name()));
                };
                value.select(tag, payload)?;
                Ok(CompactValue::Enum(value))
            }
        }
    }

    fn convert_fields(
        &self,
        fields: &[TypeRef],
        items: &[Input],
        context: &str,
        depth: usize,
    ) -> Result<Vec<CompactValue>> {
        if items.len() != fields.len() {
            return Err(CompactError::arity(context, fields.len(), items.len()));
        }
        fields
            .iter()
            .zip(items)
            .map(|(field, item)| self.convert_at(*field, item, depth + 1))
            .collect()
    }

    fn template(&self, ty: TypeRef, depth: usize) -> Result<CompactValue> {
        default_value_at(self.abi, ty, &self.limits, depth)
    }
}

fn expect_list<'i>(input: &'i Input, expected: impl FnOnce() -> String) -> Result<&'i [Input]> {
    match input {
        Input::List(items) => Ok(items),
        other => Err(CompactError::type_mismatch(expected(), other.kind_name())),
    }
}

fn convert_primitive(kind: PrimitiveKind, input: &Input) -> Result<CompactValue> {
    match kind {
        PrimitiveKind::Bool => match input {
            Input::Bool(flag) => Ok(CompactValue::Bool(*flag)),
            Input::Str(text) => match text.trim() {
                "true" => Ok(CompactValue::Bool(true)),
                "false" => Ok(CompactValue::Bool(false)),
                _ => Err(invalid_literal("bool", text)),
            },
            other => Err(CompactError::type_mismatch("bool", other.kind_name())),
        },
        PrimitiveKind::Str => match input {
            Input::Str(text) => Ok(CompactValue::Str(text.clone())),
            Input::UInt(v) => Ok(CompactValue::Str(v.to_string())),
            Input::Int(v) => Ok(CompactValue::Str(v.to_string())),
            other => Err(CompactError::type_mismatch("str", other.kind_name())),
        },
        PrimitiveKind::Fixed {
            width,
            signed: false,
        } => {
            let value = parse_unsigned_input(input, width, kind.name())?;
            Ok(CompactValue::Int(FixedInt::from_unsigned(width, value)?))
        }
        PrimitiveKind::Fixed {
            width,
            signed: true,
        } => {
            let value = parse_signed_input(input, width, kind.name())?;
            Ok(CompactValue::Int(FixedInt::from_signed(width, value)?))
        }
        PrimitiveKind::Compact(width) => {
            let value = parse_unsigned_input(input, width, kind.name())?;
            Ok(CompactValue::Compact(CompactInt::new(width, value)?))
        }
    }
}

/// 解析无符号输入并校验 `width` 上界。
fn parse_unsigned_input(input: &Input, width: IntWidth, target: &str) -> Result<u128> {
    let value = match input {
        Input::UInt(v) => *v,
        Input::Int(v) => u128::try_from(*v)
            .map_err(|_| CompactError::out_of_range(width, format!("{v} is negative")))?,
        Input::Str(text) => parse_unsigned_text(text, width, target)?,
        other => return Err(CompactError::type_mismatch(target, other.kind_name())),
    };
    if value > width.unsigned_max() {
        return Err(CompactError::out_of_range(
            width,
            format!("{value} exceeds {}", width.unsigned_max()),
        ));
    }
    Ok(value)
}

fn parse_signed_input(input: &Input, width: IntWidth, target: &str) -> Result<i128> {
    match input {
        Input::Int(v) => Ok(*v),
        Input::UInt(v) => i128::try_from(*v)
            .map_err(|_| CompactError::out_of_range(width, format!("{v} exceeds signed range"))),
        Input::Str(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<i128>()
                .map_err(|err| int_parse_error(err.kind(), width, target, text))
        }
        other => Err(CompactError::type_mismatch(target, other.kind_name())),
    }
}

fn parse_unsigned_text(text: &str, width: IntWidth, target: &str) -> Result<u128> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(digits) => u128::from_str_radix(digits, 16),
        None => trimmed.parse::<u128>(),
    };
    parsed.map_err(|err| {
        // 负数文本单独归为越界，而非字面量错误。
        if trimmed.parse::<i128>().is_ok_and(|v| v < 0) {
            CompactError::out_of_range(width, format!("{trimmed} is negative"))
        } else {
            int_parse_error(err.kind(), width, target, text)
        }
    })
}

fn int_parse_error(kind: &IntErrorKind, width: IntWidth, target: &str, text: &str) -> CompactError {
    match kind {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            CompactError::out_of_range(width, format!("`{}` overflows {target}", text.trim()))
        }
        _ => invalid_literal(target, text),
    }
}

fn invalid_literal(target: &str, literal: &str) -> CompactError {
    CompactError::InvalidLiteral {
        target: target.to_owned(),
        literal: literal.to_owned(),
    }
}
