//! 类型注册表（ABI）。
//!
//! ## 模块目标（Why）
//! - 合约的参数与返回值类型以“编号互相引用的类型节点”描述；编码、解码、转换都需要按编号回查；
//! - 注册表在加载时一次性校验全部不变式，运行期只读，可经 `Arc` 在线程间无锁共享。
//!
//! ## 校验清单（What）
//! 1. 类型编号恰为 `0..n`，存放位置即编号；
//! 2. 所有 [`TypeRef`]（类型字段、方法输入输出、构造函数）均可解析，否则 [`CompactError::UnknownType`]；
//! 3. 枚举变体数在 `1..=256`；
//! 4. 类型图无环，保证模板构造必然终止；
//! 5. 数组长度不超过 [`MAX_ARRAY_LEN`]，每个类型的模板节点数不超过 [`MAX_TEMPLATE_NODES`]；
//! 6. 方法名唯一且非空，空名保留给构造函数。

use core::fmt;
use std::collections::HashMap;
use std::str::FromStr;

use compact_codec::value::{CompactInt, FixedInt, MAX_ARRAY_LEN, MAX_ENUM_VARIANTS};
use compact_codec::{CompactError, CompactValue, IntWidth, Result, TypeTag};
use serde::{Deserialize, Serialize};

/// 单个类型的模板允许展开的最大值节点数。
pub const MAX_TEMPLATE_NODES: usize = 1 << 20;

/// 类型表中的编号引用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(pub u32);

impl TypeRef {
    /// 编号。
    pub const fn id(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 原语种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `bool`
    Bool,
    /// `str` / `string`
    Str,
    /// 定长整数。
    Fixed {
        /// 位宽。
        width: IntWidth,
        /// 是否有符号。
        signed: bool,
    },
    /// 变长无符号整数 `compact<uN>`。
    Compact(IntWidth),
}

impl PrimitiveKind {
    /// 解析原语名称，大小写不敏感；未知名称返回 [`CompactError::UnsupportedType`]。
    pub fn parse(name: &str) -> Result<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        let unsupported = || CompactError::UnsupportedType {
            name: name.to_owned(),
        };
        if let Some(inner) = lowered
            .strip_prefix("compact<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return match parse_int_name(inner.trim()) {
                Some((width, false)) => Ok(PrimitiveKind::Compact(width)),
                _ => Err(unsupported()),
            };
        }
        match lowered.as_str() {
            "bool" => Ok(PrimitiveKind::Bool),
            "str" | "string" => Ok(PrimitiveKind::Str),
            other => parse_int_name(other)
                .map(|(width, signed)| PrimitiveKind::Fixed { width, signed })
                .ok_or_else(unsupported),
        }
    }

    /// 对应的值标签。
    pub const fn type_tag(self) -> TypeTag {
        match self {
            PrimitiveKind::Bool => TypeTag::Bool,
            PrimitiveKind::Str => TypeTag::Str,
            PrimitiveKind::Fixed { width, signed } => TypeTag::fixed(width, signed),
            PrimitiveKind::Compact(width) => TypeTag::compact(width),
        }
    }

    /// 规范名称。
    pub const fn name(self) -> &'static str {
        self.type_tag().name()
    }

    /// 空模板：零值、空串、`false`。
    pub fn default_value(self) -> CompactValue {
        match self {
            PrimitiveKind::Bool => CompactValue::Bool(false),
            PrimitiveKind::Str => CompactValue::Str(String::new()),
            PrimitiveKind::Fixed { width, signed } => {
                CompactValue::Int(FixedInt::zero(width, signed))
            }
            PrimitiveKind::Compact(width) => CompactValue::Compact(CompactInt::zero(width)),
        }
    }
}

impl FromStr for PrimitiveKind {
    type Err = CompactError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_int_name(name: &str) -> Option<(IntWidth, bool)> {
    let (signed, bits) = match name.as_bytes().first()? {
        b'u' => (false, &name[1..]),
        b'i' => (true, &name[1..]),
        _ => return None,
    };
    let width = match bits {
        "8" => IntWidth::W8,
        "16" => IntWidth::W16,
        "32" => IntWidth::W32,
        "64" => IntWidth::W64,
        "128" => IntWidth::W128,
        _ => return None,
    };
    Some((width, signed))
}

/// 类型节点的种类与结构。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// 原语。
    Primitive(PrimitiveKind),
    /// 结构体，按序字段。
    Struct(Vec<TypeRef>),
    /// 可增长向量。
    Vec(TypeRef),
    /// 定长数组。
    Array {
        /// 元素类型。
        element: TypeRef,
        /// 长度。
        len: usize,
    },
    /// 元组。
    Tuple(Vec<TypeRef>),
    /// 带标签联合，每个变体一组载荷字段。
    Enum(Vec<Vec<TypeRef>>),
}

impl TypeKind {
    /// 种类名称，与类型表文档中的 `type` 字段一致。
    pub const fn name(&self) -> &'static str {
        match self {
            TypeKind::Primitive(_) => "primitive",
            TypeKind::Struct(_) => "struct",
            TypeKind::Vec(_) => "vec",
            TypeKind::Array { .. } => "array",
            TypeKind::Tuple(_) => "tuple",
            TypeKind::Enum(_) => "enum",
        }
    }

    /// 直接引用的全部子类型。
    pub fn children(&self) -> Vec<TypeRef> {
        match self {
            TypeKind::Primitive(_) => Vec::new(),
            TypeKind::Struct(fields) | TypeKind::Tuple(fields) => fields.clone(),
            TypeKind::Vec(element) | TypeKind::Array { element, .. } => vec![*element],
            TypeKind::Enum(variants) => variants.iter().flatten().copied().collect(),
        }
    }
}

/// 类型节点。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    id: TypeRef,
    kind: TypeKind,
}

impl Type {
    /// 创建类型节点。
    pub fn new(id: u32, kind: TypeKind) -> Self {
        Self {
            id: TypeRef(id),
            kind,
        }
    }

    /// 编号。
    pub fn id(&self) -> TypeRef {
        self.id
    }

    /// 种类。
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }
}

/// 方法签名。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    name: String,
    inputs: Vec<TypeRef>,
    outputs: Vec<TypeRef>,
}

impl Method {
    /// 创建方法签名。
    pub fn new(name: impl Into<String>, inputs: Vec<TypeRef>, outputs: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
        }
    }

    /// 方法名；构造函数为空串。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 按序输入类型。
    pub fn inputs(&self) -> &[TypeRef] {
        &self.inputs
    }

    /// 按序输出类型。
    pub fn outputs(&self) -> &[TypeRef] {
        &self.outputs
    }

    /// 是否为构造函数。
    pub fn is_constructor(&self) -> bool {
        self.name.is_empty()
    }
}

/// 合约元信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    name: String,
    constructor_inputs: Option<Vec<TypeRef>>,
}

impl Contract {
    /// 创建合约描述；`constructor_inputs` 为 `None` 表示没有构造函数。
    pub fn new(name: impl Into<String>, constructor_inputs: Option<Vec<TypeRef>>) -> Self {
        Self {
            name: name.into(),
            constructor_inputs,
        }
    }

    /// 合约名称。
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// 不可变的类型注册表。
///
/// # 教案式说明
/// - **意图 (Why)**：把类型、方法与构造函数集中到一个加载期构建、运行期只读的结构中，
///   引擎与转换器只需持有 `&Abi` 或 `Arc<Abi>`；
/// - **契约 (What)**：[`Abi::new`] 成功返回即保证模块文档列出的全部不变式；
///   之后没有任何可变接口；
/// - **权衡 (Trade-offs)**：方法名索引在构造时建立，查找 O(1)，代价是一次额外的字符串克隆。
#[derive(Debug, Clone)]
pub struct Abi {
    contract: Option<Contract>,
    types: Vec<Type>,
    methods: Vec<Method>,
    method_index: HashMap<String, usize>,
    constructor: Option<Method>,
}

impl Abi {
    /// 构建并校验注册表。
    pub fn new(
        mut types: Vec<Type>,
        methods: Vec<Method>,
        contract: Option<Contract>,
    ) -> Result<Self> {
        types.sort_by_key(Type::id);
        for (position, ty) in types.iter().enumerate() {
            if ty.id.index() != position {
                return Err(CompactError::schema(format!(
                    "type ids must be unique and contiguous from 0; found {} at position {position}",
                    ty.id
                )));
            }
        }

        let count = types.len();
        let check_ref = |ty: TypeRef| -> Result<()> {
            if ty.index() < count {
                Ok(())
            } else {
                Err(CompactError::UnknownType { id: ty.id() })
            }
        };

        for ty in &types {
            if let TypeKind::Array { len, .. } = &ty.kind
                && *len > MAX_ARRAY_LEN
            {
                return Err(CompactError::schema(format!(
                    "array type {} declares {len} elements, at most {MAX_ARRAY_LEN} allowed",
                    ty.id
                )));
            }
            if let TypeKind::Enum(variants) = &ty.kind
                && (variants.is_empty() || variants.len() > MAX_ENUM_VARIANTS)
            {
                return Err(CompactError::schema(format!(
                    "enum type {} declares {} variants, expected 1..={MAX_ENUM_VARIANTS}",
                    ty.id,
                    variants.len()
                )));
            }
            ty.kind.children().into_iter().try_for_each(check_ref)?;
        }
        check_type_graph(&types)?;

        let mut method_index = HashMap::with_capacity(methods.len());
        for (position, method) in methods.iter().enumerate() {
            if method.name.is_empty() {
                return Err(CompactError::schema(
                    "method name must not be empty; the empty name denotes the constructor",
                ));
            }
            if method_index.insert(method.name.clone(), position).is_some() {
                return Err(CompactError::schema(format!(
                    "duplicate method `{}`",
                    method.name
                )));
            }
            method
                .inputs
                .iter()
                .chain(&method.outputs)
                .copied()
                .try_for_each(check_ref)?;
        }

        let constructor = match contract
            .as_ref()
            .and_then(|contract| contract.constructor_inputs.as_ref())
        {
            Some(inputs) => {
                inputs.iter().copied().try_for_each(check_ref)?;
                Some(Method::new(String::new(), inputs.clone(), Vec::new()))
            }
            None => None,
        };

        Ok(Self {
            contract,
            types,
            methods,
            method_index,
            constructor,
        })
    }

    /// 按名称查找方法。
    pub fn get_method(&self, name: &str) -> Result<&Method> {
        self.method_index
            .get(name)
            .map(|&position| &self.methods[position])
            .ok_or_else(|| CompactError::UnknownMethod {
                name: name.to_owned(),
            })
    }

    /// 按名称查找方法，空名解析为构造函数。
    pub fn method_or_constructor(&self, name: &str) -> Result<&Method> {
        if name.is_empty() {
            self.constructor
                .as_ref()
                .ok_or_else(|| CompactError::UnknownMethod {
                    name: String::new(),
                })
        } else {
            self.get_method(name)
        }
    }

    /// 解析类型引用。
    pub fn resolve(&self, ty: TypeRef) -> Result<&Type> {
        self.types
            .get(ty.index())
            .ok_or(CompactError::UnknownType { id: ty.id() })
    }

    /// 构造函数签名。
    pub fn constructor(&self) -> Option<&Method> {
        self.constructor.as_ref()
    }

    /// 合约元信息。
    pub fn contract(&self) -> Option<&Contract> {
        self.contract.as_ref()
    }

    /// 全部方法，按声明顺序。
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// 全部类型，按编号排列。
    pub fn types(&self) -> &[Type] {
        &self.types
    }
}

/// 三色深度优先搜索；显式栈避免深链类型表耗尽调用栈。
///
/// 拒绝引用环，并在后序位置累计每个类型的模板节点数。
fn check_type_graph(types: &[Type]) -> Result<()> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; types.len()];
    let mut nodes = vec![0usize; types.len()];
    for root in 0..types.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::InProgress;
        let mut stack = vec![(root, types[root].kind.children(), 0usize)];
        while let Some((node, children, next)) = stack.last_mut() {
            let Some(child) = children.get(*next).copied() else {
                let node = *node;
                nodes[node] = template_nodes(&types[node].kind, &nodes);
                if nodes[node] > MAX_TEMPLATE_NODES {
                    return Err(CompactError::schema(format!(
                        "type {} expands to {} template nodes, at most {MAX_TEMPLATE_NODES} allowed",
                        types[node].id, nodes[node]
                    )));
                }
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            *next += 1;
            let child = child.index();
            match marks[child] {
                Mark::Done => {}
                Mark::InProgress => {
                    return Err(CompactError::schema(format!(
                        "type {} participates in a reference cycle",
                        types[child].id
                    )));
                }
                Mark::Unvisited => {
                    marks[child] = Mark::InProgress;
                    stack.push((child, types[child].kind.children(), 0));
                }
            }
        }
    }
    Ok(())
}

/// 模板节点数，与 `CompactValue::node_count` 对空模板的计数一致；子类型须已计算。
fn template_nodes(kind: &TypeKind, nodes: &[usize]) -> usize {
    let nested = match kind {
        TypeKind::Primitive(_) => 0,
        TypeKind::Struct(fields) | TypeKind::Tuple(fields) => field_nodes(fields, nodes),
        TypeKind::Vec(element) => nodes[element.index()],
        TypeKind::Array { element, len } => {
            let element = nodes[element.index()];
            element.saturating_add(len.saturating_mul(element))
        }
        // 模板初始选中变体 0，其载荷另计一份。
        TypeKind::Enum(variants) => variants.iter().fold(
            variants.first().map_or(0, |fields| field_nodes(fields, nodes)),
            |total, fields| total.saturating_add(field_nodes(fields, nodes)),
        ),
    };
    nested.saturating_add(1)
}

fn field_nodes(fields: &[TypeRef], nodes: &[usize]) -> usize {
    fields
        .iter()
        .fold(0, |total, field| total.saturating_add(nodes[field.index()]))
}
