#![deny(unsafe_code)]
#![warn(missing_docs)]

//! # compact-abi
//!
//! ## 教案意图（Why）
//! - **职责定位**：在 `compact-codec` 的值模型之上，提供类型表驱动的调用参数编码与返回值解码；
//! - **架构价值**：注册表在加载期一次性校验，运行期只读并经 `Arc` 共享；转换器、模板工厂与引擎
//!   都是纯函数式组件，不持有可变状态。
//!
//! ## 使用方式（How）
//! ```no_run
//! use std::sync::Arc;
//! use compact_abi::{Abi, AbiCodec, Input};
//!
//! # fn main() -> compact_abi::Result<()> {
//! let abi = Arc::new(Abi::from_json_file("kv.abi.json")?);
//! let codec = AbiCodec::new(abi);
//! let call = codec.encode_invocation("set_hash", &[Input::from("key"), Input::from("value")])?;
//! let outputs = codec.decode("get_hash", &call)?;
//! # let _ = outputs;
//! # Ok(())
//! # }
//! ```
//!
//! ## 结构概览（What）
//! - [`registry`]：类型节点、方法签名与不可变注册表 [`Abi`]；
//! - [`schema`]：JSON 类型表加载；
//! - [`template`]：由类型表构造空模板；
//! - [`input`] 与 [`convert`]：松散输入到严格值树的转换；
//! - [`engine`]：[`AbiCodec`]，调用编码、返回值解码与部署封装；
//! - [`section`]：构造参数的分节帧；
//! - [`config`]：可由 TOML 加载的 [`CodecConfig`]；
//! - [`native`]：解码结果的 JSON 呈现。

pub mod config;
pub mod convert;
pub mod engine;
pub mod input;
pub mod native;
pub mod registry;
pub mod schema;
pub mod section;
pub mod template;

pub use compact_codec::{CompactError, CompactValue, NativeValue, Result};

pub use crate::config::{CodecConfig, SectionConfig};
pub use crate::convert::Converter;
pub use crate::engine::AbiCodec;
pub use crate::input::Input;
pub use crate::native::{ToJson, native_value};
pub use crate::registry::{Abi, Contract, Method, PrimitiveKind, Type, TypeKind, TypeRef};
pub use crate::section::Section;
pub use crate::template::{default_value_for, default_value_with_limits};
