//! 异构组合：结构体、元组与带标签联合。
//!
//! 结构体与元组在字节层面完全相同：字段按声明顺序拼接，没有任何前缀。
//! 枚举先写一个字节的变体标签，再拼接该变体的载荷字段。

use bytes::{BufMut, BytesMut};

use super::{CompactCodec, CompactValue, NativeValue, TypeTag};
use crate::error::{CompactError, Result};
use crate::reader::Reader;

/// 单字节标签所能区分的最大变体数。
pub const MAX_ENUM_VARIANTS: usize = 256;

macro_rules! field_sequence {
    ($name:ident, $tag:expr, $context:literal) => {
        impl $name {
            /// 以字段列表创建。
            pub fn new(fields: Vec<CompactValue>) -> Self {
                Self { fields }
            }

            /// 全部字段。
            pub fn fields(&self) -> &[CompactValue] {
                &self.fields
            }

            /// 取出全部字段。
            pub fn into_fields(self) -> Vec<CompactValue> {
                self.fields
            }

            /// 替换第 `index` 个字段，要求与原字段同形状。
            pub fn set_field(&mut self, index: usize, value: CompactValue) -> Result<()> {
                let len = self.fields.len();
                let slot = self
                    .fields
                    .get_mut(index)
                    .ok_or_else(|| CompactError::arity($context, len, index + 1))?;
                value.expect_shape(slot)?;
                *slot = value;
                Ok(())
            }
        }

        impl CompactCodec for $name {
            fn encode_to(&self, out: &mut BytesMut) -> Result<()> {
                for field in &self.fields {
                    field.encode_to(out)?;
                }
                Ok(())
            }

            fn decode_from(&mut self, reader: &mut Reader<'_>) -> Result<()> {
                for field in &mut self.fields {
                    field.decode_from(reader)?;
                }
                Ok(())
            }

            fn value(&self) -> NativeValue {
                NativeValue::List(self.fields.iter().map(CompactValue::value).collect())
            }

            fn type_tag(&self) -> TypeTag {
                $tag
            }

            fn clone_template(&self) -> Self {
                Self {
                    fields: self.fields.iter().map(CompactValue::clone_template).collect(),
                }
            }
        }
    };
}

/// 结构体：有序字段，字段名只存在于类型表。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructValue {
    fields: Vec<CompactValue>,
}

/// 元组：有序字段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleValue {
    fields: Vec<CompactValue>,
}

field_sequence!(StructValue, TypeTag::Struct, "struct fields");
field_sequence!(TupleValue, TypeTag::Tuple, "tuple fields");

/// 带标签联合。
///
/// # 教案式说明
/// - **意图 (Why)**：每个变体的载荷形状各不相同，解码时必须先读标签才能知道该物化哪组模板；
/// - **契约 (What)**：
///   - `variants` 保存每个变体的载荷模板，数量在 `1..=256`；
///   - 当前 `tag` 永远指向合法变体，`payload` 永远与该变体同形状；
///   - 非法标签在 [`select`](Self::select) 与解码时立即以 [`CompactError::InvalidEnumTag`] 拒绝；
/// - **权衡 (Trade-offs)**：模板整体随值携带，换来解码无需回查类型表。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    variants: Vec<Vec<CompactValue>>,
    tag: u8,
    payload: Vec<CompactValue>,
}

impl EnumValue {
    /// 以变体模板创建，初始选中变体 0。
    pub fn new(variants: Vec<Vec<CompactValue>>) -> Result<Self> {
        if variants.is_empty() || variants.len() > MAX_ENUM_VARIANTS {
            return Err(CompactError::schema(format!(
                "enum must declare 1..={MAX_ENUM_VARIANTS} variants, found {}",
                variants.len()
            )));
        }
        let variants: Vec<Vec<CompactValue>> = variants
            .iter()
            .map(|fields| fields.iter().map(CompactValue::clone_template).collect())
            .collect();
        let payload = variants[0].clone();
        Ok(Self {
            variants,
            tag: 0,
            payload,
        })
    }

    /// 选中 `tag` 对应的变体并写入载荷。
    pub fn select(&mut self, tag: u8, payload: Vec<CompactValue>) -> Result<()> {
        let variant = self.variant(tag)?;
        if payload.len() != variant.len() {
            return Err(CompactError::arity(
                format!("enum variant {tag} payload"),
                variant.len(),
                payload.len(),
            ));
        }
        for (value, template) in payload.iter().zip(variant) {
            value.expect_shape(template)?;
        }
        self.tag = tag;
        self.payload = payload;
        Ok(())
    }

    /// 当前标签。
    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// 当前载荷。
    pub fn payload(&self) -> &[CompactValue] {
        &self.payload
    }

    /// 全部变体的载荷模板。
    pub fn variants(&self) -> &[Vec<CompactValue>] {
        &self.variants
    }

    fn variant(&self, tag: u8) -> Result<&[CompactValue]> {
        self.variants
            .get(usize::from(tag))
            .map(Vec::as_slice)
            .ok_or(CompactError::InvalidEnumTag {
                tag,
                variants: self.variants.len(),
            })
    }
}

impl CompactCodec for EnumValue {
    fn encode_to(&self, out: &mut BytesMut) -> Result<()> {
        out.put_u8(self.tag);
        for field in &self.payload {
            field.encode_to(out)?;
        }
        Ok(())
    }

    fn decode_from(&mut self, reader: &mut Reader<'_>) -> Result<()> {
        let tag = reader.read_u8()?;
        let mut payload: Vec<CompactValue> = self
            .variant(tag)?
            .iter()
            .map(CompactValue::clone_template)
            .collect();
        for field in &mut payload {
            field.decode_from(reader)?;
        }
        self.tag = tag;
        self.payload = payload;
        Ok(())
    }

    fn value(&self) -> NativeValue {
        let mut items = Vec::with_capacity(self.payload.len() + 1);
        items.push(NativeValue::UInt(u128::from(self.tag)));
        items.extend(self.payload.iter().map(CompactValue::value));
        NativeValue::List(items)
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::Enum
    }

    fn clone_template(&self) -> Self {
        Self {
            variants: self.variants.clone(),
            tag: 0,
            payload: self.variants[0].clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FixedInt;

    fn option_u16() -> EnumValue {
        EnumValue::new(vec![vec![], vec![CompactValue::Int(FixedInt::U16(0))]]).unwrap()
    }

    #[test]
    fn struct_concatenates_fields() {
        let value = StructValue::new(vec![
            CompactValue::Int(FixedInt::U8(1)),
            CompactValue::from("a"),
        ]);
        assert_eq!(value.encode().unwrap().as_ref(), &[0x01, 0x04, b'a']);
        assert_eq!(value.type_tag(), TypeTag::Struct);
    }

    #[test]
    fn set_field_checks_shape() {
        let mut value = TupleValue::new(vec![CompactValue::Bool(false)]);
        value.set_field(0, CompactValue::Bool(true)).unwrap();
        assert!(value.set_field(0, CompactValue::from("x")).is_err());
        assert_eq!(
            value.set_field(1, CompactValue::Bool(true)).unwrap_err(),
            CompactError::arity("tuple fields", 1, 2)
        );
    }

    #[test]
    fn enum_writes_tag_then_payload() {
        let mut value = option_u16();
        assert_eq!(value.encode().unwrap().as_ref(), &[0x00]);
        value
            .select(1, vec![CompactValue::Int(FixedInt::U16(0x0102))])
            .unwrap();
        assert_eq!(value.encode().unwrap().as_ref(), &[0x01, 0x02, 0x01]);
        assert_eq!(
            value.value(),
            NativeValue::List(vec![NativeValue::UInt(1), NativeValue::UInt(0x0102)])
        );
    }

    #[test]
    fn enum_rejects_unknown_tag_eagerly() {
        let mut value = option_u16();
        assert_eq!(
            value.select(2, vec![]).unwrap_err(),
            CompactError::InvalidEnumTag {
                tag: 2,
                variants: 2
            }
        );
        assert_eq!(
            value.decode(&[0x05]).unwrap_err(),
            CompactError::InvalidEnumTag {
                tag: 5,
                variants: 2
            }
        );
    }

    #[test]
    fn enum_decode_switches_variant() {
        let mut value = option_u16();
        assert_eq!(value.decode(&[0x01, 0x2a, 0x00]).unwrap(), 3);
        assert_eq!(value.tag(), 1);
        assert_eq!(value.payload(), &[CompactValue::Int(FixedInt::U16(42))]);
        let template = value.clone_template();
        assert_eq!(template.tag(), 0);
        assert!(template.payload().is_empty());
    }

    #[test]
    fn enum_variant_count_is_bounded() {
        assert!(EnumValue::new(vec![]).is_err());
        assert!(EnumValue::new(vec![vec![]; MAX_ENUM_VARIANTS]).is_ok());
        assert!(EnumValue::new(vec![vec![]; MAX_ENUM_VARIANTS + 1]).is_err());
    }
}
