//! 紧凑值模型。
//!
//! ## 模块目标（Why）
//! - 调用参数与返回值在字节层面只有“按类型顺序拼接”这一条规则，不携带任何类型标签；
//!   因此解码方必须事先持有同形状的值（模板），再逐字段读入。
//! - [`CompactValue`] 是封闭的和类型：每个分派点都是穷尽 `match`，漏掉变体即编译失败。
//!
//! ## 结构概览（What）
//! - [`CompactCodec`]：所有变体共享的 `encode / decode / value / type_tag / clone_template` 契约；
//! - `scalar`：`bool`、`String`、[`FixedInt`]、[`CompactInt`]；
//! - `collection`：[`VecValue`]（带长度前缀）与 [`ArrayValue`]（定长，无前缀）；
//! - `composite`：[`StructValue`]、[`TupleValue`] 与 [`EnumValue`]；
//! - `native`：[`NativeValue`]，把值树压平为普通标量与列表。
//!
//! ## 契约（What）
//! - 组合变体独占其子值，值树无共享、无环；
//! - 原地解码失败时，值保持原有形状但内容未定义，调用方应丢弃。

use core::fmt;

use bytes::{Bytes, BytesMut};

use crate::error::{CompactError, Result};
use crate::int::IntWidth;
use crate::reader::Reader;

mod collection;
mod composite;
mod native;
mod scalar;

pub use collection::{ArrayValue, MAX_ARRAY_LEN, VecValue};
pub use composite::{EnumValue, MAX_ENUM_VARIANTS, StructValue, TupleValue};
pub use native::{NativeValue, native_value};
pub use scalar::{CompactInt, FixedInt};

/// 值的扁平类型标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// 布尔。
    Bool,
    /// UTF-8 字符串。
    Str,
    /// 定长 `u8`。
    U8,
    /// 定长 `u16`。
    U16,
    /// 定长 `u32`。
    U32,
    /// 定长 `u64`。
    U64,
    /// 定长 `u128`。
    U128,
    /// 定长 `i8`。
    I8,
    /// 定长 `i16`。
    I16,
    /// 定长 `i32`。
    I32,
    /// 定长 `i64`。
    I64,
    /// 定长 `i128`。
    I128,
    /// 变长 `u8`。
    CompactU8,
    /// 变长 `u16`。
    CompactU16,
    /// 变长 `u32`。
    CompactU32,
    /// 变长 `u64`。
    CompactU64,
    /// 变长 `u128`。
    CompactU128,
    /// 可增长向量。
    Vec,
    /// 定长数组。
    Array,
    /// 结构体。
    Struct,
    /// 元组。
    Tuple,
    /// 带标签联合。
    Enum,
}

impl TypeTag {
    /// 定长整数标签。
    pub const fn fixed(width: IntWidth, signed: bool) -> Self {
        match (width, signed) {
            (IntWidth::W8, false) => TypeTag::U8,
            (IntWidth::W16, false) => TypeTag::U16,
            (IntWidth::W32, false) => TypeTag::U32,
            (IntWidth::W64, false) => TypeTag::U64,
            (IntWidth::W128, false) => TypeTag::U128,
            (IntWidth::W8, true) => TypeTag::I8,
            (IntWidth::W16, true) => TypeTag::I16,
            (IntWidth::W32, true) => TypeTag::I32,
            (IntWidth::W64, true) => TypeTag::I64,
            (IntWidth::W128, true) => TypeTag::I128,
        }
    }

    /// 变长整数标签。
    pub const fn compact(width: IntWidth) -> Self {
        match width {
            IntWidth::W8 => TypeTag::CompactU8,
            IntWidth::W16 => TypeTag::CompactU16,
            IntWidth::W32 => TypeTag::CompactU32,
            IntWidth::W64 => TypeTag::CompactU64,
            IntWidth::W128 => TypeTag::CompactU128,
        }
    }

    /// 标签名称，与类型表中的原语名称一致。
    pub const fn name(self) -> &'static str {
        match self {
            TypeTag::Bool => "bool",
            TypeTag::Str => "str",
            TypeTag::U8 => "u8",
            TypeTag::U16 => "u16",
            TypeTag::U32 => "u32",
            TypeTag::U64 => "u64",
            TypeTag::U128 => "u128",
            TypeTag::I8 => "i8",
            TypeTag::I16 => "i16",
            TypeTag::I32 => "i32",
            TypeTag::I64 => "i64",
            TypeTag::I128 => "i128",
            TypeTag::CompactU8 => "compact<u8>",
            TypeTag::CompactU16 => "compact<u16>",
            TypeTag::CompactU32 => "compact<u32>",
            TypeTag::CompactU64 => "compact<u64>",
            TypeTag::CompactU128 => "compact<u128>",
            TypeTag::Vec => "vec",
            TypeTag::Array => "array",
            TypeTag::Struct => "struct",
            TypeTag::Tuple => "tuple",
            TypeTag::Enum => "enum",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 所有紧凑值共享的编解码契约。
///
/// # 教案式说明
/// - **意图 (Why)**：组合值递归委托子值时只依赖这一组方法，新增变体只需补齐实现；
/// - **契约 (What)**：
///   - `encode_to` 追加写入，失败时可能已写出部分字节，调用方应丢弃缓冲；
///   - `decode_from` 原地改写 `self`，消费字节数由 [`Reader::position`] 体现；
///   - `clone_template` 返回同形状的空实例，供集合解码逐个物化元素槽位；
/// - **权衡 (Trade-offs)**：`encode`/`decode` 提供一次性便捷入口，流式场景使用 `*_to`/`*_from`。
pub trait CompactCodec {
    /// 追加写入编码。
    fn encode_to(&self, out: &mut BytesMut) -> Result<()>;

    /// 编码为独立字节串。
    fn encode(&self) -> Result<Bytes> {
        let mut out = BytesMut::new();
        self.encode_to(&mut out)?;
        Ok(out.freeze())
    }

    /// 从游标原地解码。
    fn decode_from(&mut self, reader: &mut Reader<'_>) -> Result<()>;

    /// 从字节切片原地解码，返回消费的字节数。
    fn decode(&mut self, input: &[u8]) -> Result<usize> {
        let mut reader = Reader::new(input);
        self.decode_from(&mut reader)?;
        Ok(reader.position())
    }

    /// 原生表示。
    fn value(&self) -> NativeValue;

    /// 类型标签。
    fn type_tag(&self) -> TypeTag;

    /// 同形状的空实例。
    fn clone_template(&self) -> Self
    where
        Self: Sized;
}

/// 紧凑值。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactValue {
    /// 布尔，编码为单字节 `0x00`/`0x01`。
    Bool(bool),
    /// 字符串，编码为长度前缀 + UTF-8 字节。
    Str(String),
    /// 定长整数。
    Int(FixedInt),
    /// 变长整数。
    Compact(CompactInt),
    /// 可增长向量。
    Vec(VecValue),
    /// 定长数组。
    Array(ArrayValue),
    /// 结构体。
    Struct(StructValue),
    /// 元组。
    Tuple(TupleValue),
    /// 带标签联合。
    Enum(EnumValue),
}

impl CompactValue {
    /// 元素类型标签链：自身标签，若为 `Vec`/`Array` 再接上元素模板的链。
    pub fn tag_chain(&self) -> Vec<TypeTag> {
        let mut chain = vec![self.type_tag()];
        let mut current = self;
        while let Some(template) = current.element_template() {
            chain.push(template.type_tag());
            current = template;
        }
        chain
    }

    /// `Vec`/`Array` 的元素模板。
    pub fn element_template(&self) -> Option<&CompactValue> {
        match self {
            CompactValue::Vec(vec) => Some(vec.template()),
            CompactValue::Array(array) => Some(array.template()),
            _ => None,
        }
    }

    /// 结构化形状比较：标签、元素模板、数组长度、字段与变体逐层一致。
    pub fn shape_eq(&self, other: &CompactValue) -> bool {
        match (self, other) {
            (CompactValue::Vec(a), CompactValue::Vec(b)) => a.template().shape_eq(b.template()),
            (CompactValue::Array(a), CompactValue::Array(b)) => {
                a.len() == b.len() && a.template().shape_eq(b.template())
            }
            (CompactValue::Struct(a), CompactValue::Struct(b)) => {
                fields_shape_eq(a.fields(), b.fields())
            }
            (CompactValue::Tuple(a), CompactValue::Tuple(b)) => {
                fields_shape_eq(a.fields(), b.fields())
            }
            (CompactValue::Enum(a), CompactValue::Enum(b)) => {
                a.variants().len() == b.variants().len()
                    && a
                        .variants()
                        .iter()
                        .zip(b.variants())
                        .all(|(x, y)| fields_shape_eq(x, y))
            }
            _ => self.type_tag() == other.type_tag() && self.element_template().is_none(),
        }
    }

    /// 要求 `self` 与 `expected` 同形状，否则返回 [`CompactError::TypeMismatch`]。
    pub fn expect_shape(&self, expected: &CompactValue) -> Result<()> {
        if self.shape_eq(expected) {
            Ok(())
        } else {
            Err(CompactError::type_mismatch(
                expected.shape_name(),
                self.shape_name(),
            ))
        }
    }

    /// 同形状的值编码后至少占用的字节数。
    ///
    /// 空结构体、空元组与零长数组为 0；解码长度前缀时据此约束元素个数。
    pub fn min_encoded_len(&self) -> usize {
        match self {
            CompactValue::Bool(_)
            | CompactValue::Str(_)
            | CompactValue::Compact(_)
            | CompactValue::Vec(_)
            | CompactValue::Enum(_) => 1,
            CompactValue::Int(int) => int.width().bytes(),
            CompactValue::Array(array) => array
                .len()
                .saturating_mul(array.template().min_encoded_len()),
            CompactValue::Struct(value) => min_fields_len(value.fields()),
            CompactValue::Tuple(value) => min_fields_len(value.fields()),
        }
    }

    /// 值树的节点总数，`Vec`/`Array` 的元素模板与 `Enum` 的全部变体模板均计入。
    pub fn node_count(&self) -> usize {
        let nested = match self {
            CompactValue::Vec(vec) => vec
                .template()
                .node_count()
                .saturating_add(nodes_of(vec.elements())),
            CompactValue::Array(array) => array
                .template()
                .node_count()
                .saturating_add(nodes_of(array.elements())),
            CompactValue::Struct(value) => nodes_of(value.fields()),
            CompactValue::Tuple(value) => nodes_of(value.fields()),
            CompactValue::Enum(value) => value
                .variants()
                .iter()
                .fold(nodes_of(value.payload()), |total, fields| {
                    total.saturating_add(nodes_of(fields))
                }),
            _ => 0,
        };
        nested.saturating_add(1)
    }

    /// 人类可读的形状描述，用于错误信息。
    pub fn shape_name(&self) -> String {
        match self {
            CompactValue::Vec(vec) => format!("vec<{}>", vec.template().shape_name()),
            CompactValue::Array(array) => {
                format!("[{}; {}]", array.template().shape_name(), array.len())
            }
            CompactValue::Struct(value) => format!("struct({})", join_shapes(value.fields())),
            CompactValue::Tuple(value) => format!("({})", join_shapes(value.fields())),
            CompactValue::Enum(value) => format!("enum[{} variants]", value.variants().len()),
            scalar => scalar.type_tag().to_string(),
        }
    }
}

fn fields_shape_eq(a: &[CompactValue], b: &[CompactValue]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.shape_eq(y))
}

fn min_fields_len(fields: &[CompactValue]) -> usize {
    fields
        .iter()
        .fold(0, |total, field| total.saturating_add(field.min_encoded_len()))
}

fn nodes_of(values: &[CompactValue]) -> usize {
    values
        .iter()
        .fold(0, |total, value| total.saturating_add(value.node_count()))
}

fn join_shapes(fields: &[CompactValue]) -> String {
    fields
        .iter()
        .map(CompactValue::shape_name)
        .collect::<Vec<_>>()
        .join(", ")
}

impl CompactCodec for CompactValue {
    fn encode_to(&self, out: &mut BytesMut) -> Result<()> {
        match self {
            CompactValue::Bool(value) => value.encode_to(out),
            CompactValue::Str(value) => value.encode_to(out),
            CompactValue::Int(value) => value.encode_to(out),
            CompactValue::Compact(value) => value.encode_to(out),
            CompactValue::Vec(value) => value.encode_to(out),
            CompactValue::Array(value) => value.encode_to(out),
            CompactValue::Struct(value) => value.encode_to(out),
            CompactValue::Tuple(value) => value.encode_to(out),
            CompactValue::Enum(value) => value.encode_to(out),
        }
    }

    fn decode_from(&mut self, reader: &mut Reader<'_>) -> Result<()> {
        match self {
            CompactValue::Bool(value) => value.decode_from(reader),
            CompactValue::Str(value) => value.decode_from(reader),
            CompactValue::Int(value) => value.decode_from(reader),
            CompactValue::Compact(value) => value.decode_from(reader),
            CompactValue::Vec(value) => value.decode_from(reader),
            CompactValue::Array(value) => value.decode_from(reader),
            CompactValue::Struct(value) => value.decode_from(reader),
            CompactValue::Tuple(value) => value.decode_from(reader),
            CompactValue::Enum(value) => value.decode_from(reader),
        }
    }

    fn value(&self) -> NativeValue {
        match self {
            CompactValue::Bool(value) => value.value(),
            CompactValue::Str(value) => value.value(),
            CompactValue::Int(value) => value.value(),
            CompactValue::Compact(value) => value.value(),
            CompactValue::Vec(value) => value.value(),
            CompactValue::Array(value) => value.value(),
            CompactValue::Struct(value) => value.value(),
            CompactValue::Tuple(value) => value.value(),
            CompactValue::Enum(value) => value.value(),
        }
    }

    fn type_tag(&self) -> TypeTag {
        match self {
            CompactValue::Bool(value) => value.type_tag(),
            CompactValue::Str(value) => value.type_tag(),
            CompactValue::Int(value) => value.type_tag(),
            CompactValue::Compact(value) => value.type_tag(),
            CompactValue::Vec(value) => value.type_tag(),
            CompactValue::Array(value) => value.type_tag(),
            CompactValue::Struct(value) => value.type_tag(),
            CompactValue::Tuple(value) => value.type_tag(),
            CompactValue::Enum(value) => value.type_tag(),
        }
    }

    fn clone_template(&self) -> Self {
        match self {
            CompactValue::Bool(value) => CompactValue::Bool(value.clone_template()),
            CompactValue::Str(value) => CompactValue::Str(value.clone_template()),
            CompactValue::Int(value) => CompactValue::Int(value.clone_template()),
            CompactValue::Compact(value) => CompactValue::Compact(value.clone_template()),
            CompactValue::Vec(value) => CompactValue::Vec(value.clone_template()),
            CompactValue::Array(value) => CompactValue::Array(value.clone_template()),
            CompactValue::Struct(value) => CompactValue::Struct(value.clone_template()),
            CompactValue::Tuple(value) => CompactValue::Tuple(value.clone_template()),
            CompactValue::Enum(value) => CompactValue::Enum(value.clone_template()),
        }
    }
}

macro_rules! impl_from_variant {
    ($($ty:ty => $variant:ident;)+) => {
        $(
            impl From<$ty> for CompactValue {
                fn from(value: $ty) -> Self {
                    CompactValue::$variant(value)
                }
            }
        )+
    };
}

impl_from_variant! {
    bool => Bool;
    String => Str;
    FixedInt => Int;
    CompactInt => Compact;
    VecValue => Vec;
    ArrayValue => Array;
    StructValue => Struct;
    TupleValue => Tuple;
    EnumValue => Enum;
}

impl From<&str> for CompactValue {
    fn from(value: &str) -> Self {
        CompactValue::Str(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_of(template: CompactValue) -> CompactValue {
        CompactValue::Vec(VecValue::new(template))
    }

    #[test]
    fn tag_chain_follows_nested_templates() {
        let nested = vec_of(vec_of(CompactValue::Int(FixedInt::U32(0))));
        assert_eq!(
            nested.tag_chain(),
            vec![TypeTag::Vec, TypeTag::Vec, TypeTag::U32]
        );
    }

    #[test]
    fn shape_eq_distinguishes_struct_layouts() {
        let a = CompactValue::Struct(StructValue::new(vec![
            CompactValue::Int(FixedInt::U32(0)),
            CompactValue::from(""),
        ]));
        let b = CompactValue::Struct(StructValue::new(vec![CompactValue::Int(FixedInt::U32(
            7,
        ))]));
        assert!(!a.shape_eq(&b));
        assert!(a.shape_eq(&a.clone_template()));
        let err = b.expect_shape(&a).unwrap_err();
        assert_eq!(
            err,
            CompactError::type_mismatch("struct(u32, str)", "struct(u32)")
        );
    }

    #[test]
    fn shape_name_is_readable() {
        let array = CompactValue::Array(ArrayValue::new(CompactValue::Bool(false), 3).unwrap());
        assert_eq!(array.shape_name(), "[bool; 3]");
        let vec = vec_of(CompactValue::Compact(CompactInt::U64(0)));
        assert_eq!(vec.shape_name(), "vec<compact<u64>>");
    }

    #[test]
    fn min_encoded_len_counts_fixed_payloads() {
        let unit = CompactValue::Tuple(TupleValue::new(vec![]));
        assert_eq!(unit.min_encoded_len(), 0);
        let empty_array =
            CompactValue::Array(ArrayValue::new(CompactValue::Bool(false), 0).unwrap());
        assert_eq!(empty_array.min_encoded_len(), 0);

        let record = CompactValue::Struct(StructValue::new(vec![
            CompactValue::Int(FixedInt::U32(0)),
            CompactValue::from(""),
            vec_of(CompactValue::Bool(false)),
        ]));
        assert_eq!(record.min_encoded_len(), 6);
        assert_eq!(record.min_encoded_len(), record.encode().unwrap().len());
    }
}
