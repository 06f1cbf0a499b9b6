//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为紧凑编解码链路上的所有失败提供集中定义：整数越界、类型不符、注册表缺项、字节截断等；
//! - 每个变体映射到稳定的 `<域>.<语义>` 错误码，便于调用方按码值做告警与统计，而不必解析文案。
//!
//! ## 设计要求（What）
//! - 所有错误派生 `thiserror::Error`，可直接接入 `std::error::Error` 生态；
//! - 错误一律返回给直接调用方，编解码器内部不做恢复或重试；
//! - `Clone + PartialEq`，测试可直接断言具体变体。

use crate::int::IntWidth;

/// 本 crate 的统一结果别名。
pub type Result<T, E = CompactError> = core::result::Result<T, E>;

/// 稳定错误码常量。
///
/// - **意图 (Why)**：错误码一旦发布即不可更改，集中声明避免散落在各调用点造成拼写漂移；
/// - **契约 (What)**：命名遵循 `compact.<reason>`，与 [`CompactError::code`] 一一对应。
pub mod codes {
    /// 整数或变长整数超出当前模式/宽度的可表示范围。
    pub const OUT_OF_RANGE: &str = "compact.out_of_range";
    /// 值的类型标签与声明类型不一致。
    pub const TYPE_MISMATCH: &str = "compact.type_mismatch";
    /// 注册表中不存在该方法。
    pub const UNKNOWN_METHOD: &str = "compact.unknown_method";
    /// 注册表中不存在该类型编号。
    pub const UNKNOWN_TYPE: &str = "compact.unknown_type";
    /// 参数、字段或数组元素数量不符。
    pub const ARITY_MISMATCH: &str = "compact.arity_mismatch";
    /// 解码途中缓冲耗尽。
    pub const TRUNCATED_INPUT: &str = "compact.truncated_input";
    /// 不支持的类型种类或原语名称。
    pub const UNSUPPORTED_TYPE: &str = "compact.unsupported_type";
    /// 调用方字面量无法解析为目标原语。
    pub const INVALID_LITERAL: &str = "compact.invalid_literal";
    /// 布尔字节既不是 0x00 也不是 0x01。
    pub const INVALID_BOOL: &str = "compact.invalid_bool";
    /// 字符串字节不是合法 UTF-8。
    pub const INVALID_UTF8: &str = "compact.invalid_utf8";
    /// 枚举标签超出变体列表。
    pub const INVALID_ENUM_TAG: &str = "compact.invalid_enum_tag";
    /// 所有输出解码完成后仍有剩余字节。
    pub const TRAILING_BYTES: &str = "compact.trailing_bytes";
    /// 触发了配置的解码限额。
    pub const LIMIT_EXCEEDED: &str = "compact.limit_exceeded";
    /// 类型表/方法表文档不合法。
    pub const INVALID_SCHEMA: &str = "compact.invalid_schema";
    /// 分节封装（section framing）格式错误。
    pub const INVALID_SECTION: &str = "compact.invalid_section";
    /// 配置文件无法解析。
    pub const INVALID_CONFIG: &str = "compact.invalid_config";
}

/// 紧凑编解码错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：把整数编码、值模型、注册表、转换器与引擎的失败合流到同一枚举，
///   使 `?` 可以跨模块直接传播；
/// - **契约 (What)**：每个变体携带足以定位问题的上下文（宽度、期望/实际、剩余字节等），
///   [`code`](Self::code) 返回稳定错误码；
/// - **设计权衡 (Trade-offs)**：上下文以 `String` 保存，牺牲少量堆分配换取可读性。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompactError {
    /// 数值超出宽度或模式的可表示范围；也用于拒绝非最小模式的变长整数编码。
    #[error("value out of range for {width}: {detail}")]
    OutOfRange {
        /// 目标整数宽度。
        width: IntWidth,
        /// 越界细节。
        detail: String,
    },

    /// 值或输入形态与声明类型不一致。
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// 声明的类型描述。
        expected: String,
        /// 实际遇到的类型描述。
        found: String,
    },

    /// 方法名未在注册表登记。
    #[error("method `{name}` is not declared in the abi")]
    UnknownMethod {
        /// 查询的方法名；构造函数以空串表示。
        name: String,
    },

    /// 类型编号未在注册表登记。
    #[error("type id {id} is not declared in the abi")]
    UnknownType {
        /// 悬空的类型编号。
        id: u32,
    },

    /// 元素数量不符：参数个数、结构体字段数或定长数组长度。
    #[error("{context}: expected {expected} items, found {found}")]
    ArityMismatch {
        /// 发生不符的位置，例如 `method set_hash arguments`。
        context: String,
        /// 期望数量。
        expected: usize,
        /// 实际数量。
        found: usize,
    },

    /// 解码途中缓冲耗尽。
    #[error("truncated input: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput {
        /// 当前读取所需字节数。
        needed: usize,
        /// 缓冲剩余字节数。
        remaining: usize,
    },

    /// 不支持的类型种类或原语名称。
    #[error("unsupported type `{name}`")]
    UnsupportedType {
        /// 无法识别的名称。
        name: String,
    },

    /// 调用方字面量无法解析为目标原语。
    #[error("cannot parse `{literal}` as {target}")]
    InvalidLiteral {
        /// 目标原语名称。
        target: String,
        /// 原始字面量。
        literal: String,
    },

    /// 布尔字节非法。
    #[error("invalid bool byte 0x{byte:02x}")]
    InvalidBool {
        /// 实际读到的字节。
        byte: u8,
    },

    /// 字符串不是合法 UTF-8。
    #[error("string payload is not valid UTF-8: {detail}")]
    InvalidUtf8 {
        /// 底层校验错误描述。
        detail: String,
    },

    /// 枚举标签超出变体列表。
    #[error("enum tag {tag} is outside the {variants} declared variants")]
    InvalidEnumTag {
        /// 读到或传入的标签。
        tag: u8,
        /// 声明的变体数量。
        variants: usize,
    },

    /// 解码完成后仍有未消费字节。
    #[error("{remaining} trailing bytes left after decoding")]
    TrailingBytes {
        /// 剩余字节数。
        remaining: usize,
    },

    /// 触发解码限额。
    #[error("{limit} limit exceeded: {value} > {max}")]
    LimitExceeded {
        /// 限额名称，例如 `max_collection_len`。
        limit: &'static str,
        /// 实际数值。
        value: usize,
        /// 配置上限。
        max: usize,
    },

    /// 类型表文档不合法。
    #[error("invalid abi schema: {detail}")]
    InvalidSchema {
        /// 违规细节。
        detail: String,
    },

    /// 分节封装格式错误。
    #[error("invalid section frame: {detail}")]
    InvalidSection {
        /// 违规细节。
        detail: String,
    },

    /// 配置解析失败。
    #[error("invalid codec configuration: {detail}")]
    InvalidConfig {
        /// 底层解析错误描述。
        detail: String,
    },
}

impl CompactError {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            CompactError::OutOfRange { .. } => codes::OUT_OF_RANGE,
            CompactError::TypeMismatch { .. } => codes::TYPE_MISMATCH,
            CompactError::UnknownMethod { .. } => codes::UNKNOWN_METHOD,
            CompactError::UnknownType { .. } => codes::UNKNOWN_TYPE,
            CompactError::ArityMismatch { .. } => codes::ARITY_MISMATCH,
            CompactError::TruncatedInput { .. } => codes::TRUNCATED_INPUT,
            CompactError::UnsupportedType { .. } => codes::UNSUPPORTED_TYPE,
            CompactError::InvalidLiteral { .. } => codes::INVALID_LITERAL,
            CompactError::InvalidBool { .. } => codes::INVALID_BOOL,
            CompactError::InvalidUtf8 { .. } => codes::INVALID_UTF8,
            CompactError::InvalidEnumTag { .. } => codes::INVALID_ENUM_TAG,
            CompactError::TrailingBytes { .. } => codes::TRAILING_BYTES,
            CompactError::LimitExceeded { .. } => codes::LIMIT_EXCEEDED,
            CompactError::InvalidSchema { .. } => codes::INVALID_SCHEMA,
            CompactError::InvalidSection { .. } => codes::INVALID_SECTION,
            CompactError::InvalidConfig { .. } => codes::INVALID_CONFIG,
        }
    }

    /// 构造越界错误的便捷入口。
    pub fn out_of_range(width: IntWidth, detail: impl Into<String>) -> Self {
        CompactError::OutOfRange {
            width,
            detail: detail.into(),
        }
    }

    /// 构造类型不符错误的便捷入口。
    pub fn type_mismatch(expected: impl ToString, found: impl ToString) -> Self {
        CompactError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// 构造数量不符错误的便捷入口。
    pub fn arity(context: impl Into<String>, expected: usize, found: usize) -> Self {
        CompactError::ArityMismatch {
            context: context.into(),
            expected,
            found,
        }
    }

    /// 构造类型表错误的便捷入口。
    pub fn schema(detail: impl Into<String>) -> Self {
        CompactError::InvalidSchema {
            detail: detail.into(),
        }
    }
}
