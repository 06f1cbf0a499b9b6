//! 同构集合：可增长向量与定长数组。
//!
//! 两者都持有一个元素模板；所有元素必须与模板同形状，解码时按模板逐个物化元素。

use bytes::BytesMut;

use super::{CompactCodec, CompactValue, NativeValue, TypeTag};
use crate::error::{CompactError, Result};
use crate::int::compact;
use crate::reader::Reader;

/// 定长数组允许声明的最大元素数。
pub const MAX_ARRAY_LEN: usize = 1 << 20;

/// 长度前缀 + 元素序列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VecValue {
    template: Box<CompactValue>,
    elements: Vec<CompactValue>,
}

impl VecValue {
    /// 以元素模板创建空向量。
    pub fn new(template: CompactValue) -> Self {
        Self {
            template: Box::new(template.clone_template()),
            elements: Vec::new(),
        }
    }

    /// 以元素模板与初始元素创建向量，逐个校验形状。
    pub fn with_elements(template: CompactValue, elements: Vec<CompactValue>) -> Result<Self> {
        let mut vec = Self::new(template);
        vec.elements.reserve(elements.len());
        for element in elements {
            vec.push(element)?;
        }
        Ok(vec)
    }

    /// 追加元素；形状不符返回 [`CompactError::TypeMismatch`]。
    pub fn push(&mut self, element: CompactValue) -> Result<()> {
        element.expect_shape(&self.template)?;
        self.elements.push(element);
        Ok(())
    }

    /// 元素模板。
    pub fn template(&self) -> &CompactValue {
        &self.template
    }

    /// 当前元素。
    pub fn elements(&self) -> &[CompactValue] {
        &self.elements
    }

    /// 取出全部元素。
    pub fn into_elements(self) -> Vec<CompactValue> {
        self.elements
    }

    /// 元素个数。
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// 是否为空。
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// 元素的类型标签链。
    pub fn element_tags(&self) -> Vec<TypeTag> {
        self.template.tag_chain()
    }
}

impl CompactCodec for VecValue {
    fn encode_to(&self, out: &mut BytesMut) -> Result<()> {
        compact::encode_len(out, self.elements.len())?;
        for element in &self.elements {
            element.encode_to(out)?;
        }
        Ok(())
    }

    fn decode_from(&mut self, reader: &mut Reader<'_>) -> Result<()> {
        let len = compact::decode_len(reader)?;
        let min_len = self.template.min_encoded_len();
        let needed = len.saturating_mul(min_len);
        if needed > reader.remaining() {
            return Err(CompactError::TruncatedInput {
                needed,
                remaining: reader.remaining(),
            });
        }
        // 元素节点中没有对应输入字节的部分计入解码膨胀预算；零字节元素全部计入。
        let surplus = self.template.node_count().saturating_sub(min_len);
        reader.charge_expansion(len.saturating_mul(surplus))?;
        let mut elements = Vec::with_capacity(len.min(reader.remaining()));
        for _ in 0..len {
            let mut element = self.template.clone_template();
            element.decode_from(reader)?;
            elements.push(element);
        }
        self.elements = elements;
        Ok(())
    }

    fn value(&self) -> NativeValue {
        NativeValue::List(self.elements.iter().map(CompactValue::value).collect())
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::Vec
    }

    fn clone_template(&self) -> Self {
        Self {
            template: self.template.clone(),
            elements: Vec::new(),
        }
    }
}

/// 定长元素序列，不写长度前缀。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayValue {
    template: Box<CompactValue>,
    len: usize,
    elements: Vec<CompactValue>,
}

impl ArrayValue {
    /// 以模板填满 `len` 个空元素。
    ///
    /// `len` 超过 [`MAX_ARRAY_LEN`] 或无法分配时返回 [`CompactError::LimitExceeded`]。
    pub fn new(template: CompactValue, len: usize) -> Result<Self> {
        let too_long = CompactError::LimitExceeded {
            limit: "array_len",
            value: len,
            max: MAX_ARRAY_LEN,
        };
        if len > MAX_ARRAY_LEN {
            return Err(too_long);
        }
        let template = template.clone_template();
        let mut elements = Vec::new();
        elements.try_reserve_exact(len).map_err(|_| too_long)?;
        elements.extend((0..len).map(|_| template.clone_template()));
        Ok(Self {
            template: Box::new(template),
            len,
            elements,
        })
    }

    /// 以给定元素创建数组；数量不符返回 [`CompactError::ArityMismatch`]。
    pub fn with_elements(
        template: CompactValue,
        len: usize,
        elements: Vec<CompactValue>,
    ) -> Result<Self> {
        if elements.len() != len {
            return Err(CompactError::arity("array elements", len, elements.len()));
        }
        let template = template.clone_template();
        for element in &elements {
            element.expect_shape(&template)?;
        }
        Ok(Self {
            template: Box::new(template),
            len,
            elements,
        })
    }

    /// 替换第 `index` 个元素。
    pub fn set(&mut self, index: usize, element: CompactValue) -> Result<()> {
        element.expect_shape(&self.template)?;
        let len = self.len;
        let slot = self
            .elements
            .get_mut(index)
            .ok_or_else(|| CompactError::arity("array index", len, index + 1))?;
        *slot = element;
        Ok(())
    }

    /// 元素模板。
    pub fn template(&self) -> &CompactValue {
        &self.template
    }

    /// 当前元素。
    pub fn elements(&self) -> &[CompactValue] {
        &self.elements
    }

    /// 声明长度。
    pub fn len(&self) -> usize {
        self.len
    }

    /// 声明长度是否为零。
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 元素的类型标签链。
    pub fn element_tags(&self) -> Vec<TypeTag> {
        self.template.tag_chain()
    }
}

impl CompactCodec for ArrayValue {
    fn encode_to(&self, out: &mut BytesMut) -> Result<()> {
        for element in &self.elements {
            element.encode_to(out)?;
        }
        Ok(())
    }

    fn decode_from(&mut self, reader: &mut Reader<'_>) -> Result<()> {
        for element in &mut self.elements {
            element.decode_from(reader)?;
        }
        Ok(())
    }

    fn value(&self) -> NativeValue {
        NativeValue::List(self.elements.iter().map(CompactValue::value).collect())
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::Array
    }

    fn clone_template(&self) -> Self {
        Self {
            template: self.template.clone(),
            len: self.len,
            elements: self
                .elements
                .iter()
                .map(|_| self.template.clone_template())
                .collect(),
        }
    }
}
