//! 由类型表构造空模板。
//!
//! 解码前必须先有同形状的值；模板完全由 [`Abi`] 推导，不依赖任何既有实例。
//! 递归深度受 [`DecodeLimits::max_depth`] 约束，数组长度受 `max_collection_len` 约束。

use compact_codec::{
    ArrayValue, CompactValue, DecodeLimits, EnumValue, Result, StructValue, TupleValue, VecValue,
};

use crate::registry::{Abi, TypeKind, TypeRef};

/// 以默认限额构造 `ty` 的空模板。
pub fn default_value_for(abi: &Abi, ty: TypeRef) -> Result<CompactValue> {
    default_value_with_limits(abi, ty, &DecodeLimits::default())
}

/// 以指定限额构造 `ty` 的空模板。
pub fn default_value_with_limits(
    abi: &Abi,
    ty: TypeRef,
    limits: &DecodeLimits,
) -> Result<CompactValue> {
    build(abi, ty, limits, 0)
}

/// 从递归深度 `depth` 开始构造模板，供转换器在嵌套位置复用同一深度计数。
pub(crate) fn default_value_at(
    abi: &Abi,
    ty: TypeRef,
    limits: &DecodeLimits,
    depth: usize,
) -> Result<CompactValue> {
    build(abi, ty, limits, depth)
}

fn build(abi: &Abi, ty: TypeRef, limits: &DecodeLimits, depth: usize) -> Result<CompactValue> {
    limits.check_depth(depth)?;
    Ok(match abi.resolve(ty)?.kind() {
        TypeKind::Primitive(kind) => kind.default_value(),
        TypeKind::Struct(fields) => {
            CompactValue::Struct(StructValue::new(build_all(abi, fields, limits, depth)?))
        }
        TypeKind::Tuple(fields) => {
            CompactValue::Tuple(TupleValue::new(build_all(abi, fields, limits, depth)?))
        }
        TypeKind::Vec(element) => {
            CompactValue::Vec(VecValue::new(build(abi, *element, limits, depth + 1)?))
        }
        TypeKind::Array { element, len } => {
            limits.check_collection(*len)?;
            let template = build(abi, *element, limits, depth + 1)?;
            CompactValue::Array(ArrayValue::new(template, *len)?)
        }
        TypeKind::Enum(variants) => {
            let variants = variants
                .iter()
                .map(|fields| build_all(abi, fields, limits, depth))
                .collect::<Result<Vec<_>>>()?;
            CompactValue::Enum(EnumValue::new(variants)?)
        }
    })
}

fn build_all(
    abi: &Abi,
    fields: &[TypeRef],
    limits: &DecodeLimits,
    depth: usize,
) -> Result<Vec<CompactValue>> {
    fields
        .iter()
        .map(|field| build(abi, *field, limits, depth + 1))
        .collect()
}
