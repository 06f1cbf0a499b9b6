#![deny(unsafe_code)]
#![warn(missing_docs)]

//! # compact-codec
//!
//! ## 教案意图（Why）
//! - **职责定位**：为 WASM 合约运行时的调用参数与返回值提供逐位精确的紧凑二进制编解码，
//!   包括定长小端整数、四模式变长整数（compact integer）以及递归的值模型 [`CompactValue`]。
//! - **架构价值**：本 crate 不感知 ABI 注册表，只定义“值长什么样、字节如何排布”；
//!   由 `compact-abi` 负责依据类型表构造模板并驱动编解码，二者通过 [`CompactCodec`] 契约解耦。
//!
//! ## 使用方式（How）
//! - 整数原语位于 [`int`] 模块：`fixed` 子模块处理定长整数，`compact` 子模块处理变长整数；
//! - 值模型位于 [`value`] 模块：每个变体都实现 `encode / decode / value / type_tag / clone_template`；
//! - 解码统一经过 [`Reader`]，它负责字节计数与 [`DecodeLimits`] 限额校验。
//!
//! ## 契约说明（What）
//! - 所有失败都以 [`CompactError`] 返回，附带稳定错误码（见 [`error::codes`]）；
//! - 解码永不静默截断或补零：缓冲不足即 [`CompactError::TruncatedInput`]；
//! - 纯同步、无共享可变状态，可在任意线程并发使用。
//!
//! ## 风险提示（Trade-offs）
//! - 值模板随值树一同持有，空 `Vec` 也需携带元素模板，以换取“解码无需外部上下文”的能力。

pub mod error;
pub mod int;
pub mod limits;
pub mod reader;
pub mod value;

pub use crate::error::{CompactError, Result};
pub use crate::int::IntWidth;
pub use crate::limits::DecodeLimits;
pub use crate::reader::Reader;
pub use crate::value::{
    ArrayValue, CompactCodec, CompactInt, CompactValue, EnumValue, FixedInt, NativeValue,
    StructValue, TupleValue, TypeTag, VecValue,
};
