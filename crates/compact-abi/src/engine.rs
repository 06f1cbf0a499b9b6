//! 编解码引擎。
//!
//! ## 模块目标（Why）
//! - 把“方法名 + 松散参数”变成字节，把“方法名 + 返回字节”变成值树；
//! - 类型解析、输入转换、模板构造分别委托给注册表、[`Converter`] 与模板工厂，
//!   引擎只负责按方法签名排布顺序并严格计量字节。
//!
//! ## 线路格式（What）
//! - 普通调用：参数编码按输入顺序直接拼接；
//! - 直接调用帧：`compact-len 方法名 || 参数...`；
//! - 部署：`合约代码 || 构造参数分节`，分节头由 [`CodecConfig::constructor_section`] 决定。
//!
//! ## 契约（What）
//! - 解码逐字段推进，任何缓冲不足都是致命的 [`CompactError::TruncatedInput`]；
//! - 全部输出解码后仍有剩余字节时，除非配置允许，否则返回 [`CompactError::TrailingBytes`]；
//! - 引擎无内部可变状态，可克隆后在线程间自由共享。

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use compact_codec::{CompactCodec, CompactError, CompactValue, Reader, Result};
use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::convert::Converter;
use crate::input::Input;
use crate::registry::{Abi, Method, TypeRef};
use crate::section::Section;
use crate::template::default_value_with_limits;

/// 基于类型表的编解码引擎。
#[derive(Debug, Clone)]
pub struct AbiCodec {
    abi: Arc<Abi>,
    config: CodecConfig,
}

impl AbiCodec {
    /// 以默认配置创建。
    pub fn new(abi: Arc<Abi>) -> Self {
        Self {
            abi,
            config: CodecConfig::default(),
        }
    }

    /// 以指定配置创建。
    pub fn with_config(abi: Arc<Abi>, config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { abi, config })
    }

    /// 类型表。
    pub fn abi(&self) -> &Arc<Abi> {
        &self.abi
    }

    /// 当前配置。
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// 编码方法参数；`method` 为空串时编码构造函数参数。
    pub fn encode(&self, method: &str, args: &[Input]) -> Result<Bytes> {
        let signature = self.abi.method_or_constructor(method)?;
        let mut out = BytesMut::new();
        self.encode_args_to(signature, args, &mut out)?;
        debug!(method, args = args.len(), bytes = out.len(), "encoded call arguments");
        Ok(out.freeze())
    }

    /// 编码直接调用帧：方法名前缀 + 参数。
    pub fn encode_invocation(&self, method: &str, args: &[Input]) -> Result<Bytes> {
        let signature = self.abi.get_method(method)?;
        let mut out = BytesMut::new();
        method.to_owned().encode_to(&mut out)?;
        self.encode_args_to(signature, args, &mut out)?;
        debug!(method, args = args.len(), bytes = out.len(), "encoded invocation");
        Ok(out.freeze())
    }

    /// 编码构造函数参数并包裹为分节。
    pub fn encode_constructor(&self, args: &[Input]) -> Result<Bytes> {
        let mut out = BytesMut::new();
        self.constructor_section(args)?.encode_to(&mut out)?;
        Ok(out.freeze())
    }

    /// 合约代码后追加构造参数分节。
    pub fn encode_deployment(&self, code: &[u8], args: &[Input]) -> Result<Bytes> {
        let section = self.constructor_section(args)?;
        let mut out = BytesMut::with_capacity(code.len() + section.content().len() + 64);
        out.put_slice(code);
        section.encode_to(&mut out)?;
        debug!(
            code = code.len(),
            section = section.name(),
            bytes = out.len(),
            "encoded deployment"
        );
        Ok(out.freeze())
    }

    /// 编码已构造好的值，逐个校验与声明类型同形状。
    pub fn encode_values(&self, types: &[TypeRef], values: &[CompactValue]) -> Result<Bytes> {
        if types.len() != values.len() {
            return Err(CompactError::arity("values", types.len(), values.len()));
        }
        let mut out = BytesMut::new();
        for (ty, value) in types.iter().zip(values) {
            let template = default_value_with_limits(&self.abi, *ty, &self.config.limits)?;
            value.expect_shape(&template)?;
            value.encode_to(&mut out)?;
        }
        Ok(out.freeze())
    }

    /// 按方法输出类型解码返回值。
    pub fn decode(&self, method: &str, bytes: &[u8]) -> Result<Vec<CompactValue>> {
        let signature = self.abi.method_or_constructor(method)?;
        debug!(method, bytes = bytes.len(), "decoding outputs");
        self.decode_sequence(signature.outputs(), bytes)
    }

    /// 按方法输入类型解码参数。
    pub fn decode_inputs(&self, method: &str, bytes: &[u8]) -> Result<Vec<CompactValue>> {
        let signature = self.abi.method_or_constructor(method)?;
        debug!(method, bytes = bytes.len(), "decoding inputs");
        self.decode_sequence(signature.inputs(), bytes)
    }

    /// 解析直接调用帧，返回方法名与参数。
    pub fn decode_invocation(&self, bytes: &[u8]) -> Result<(String, Vec<CompactValue>)> {
        let mut reader = Reader::with_limits(bytes, self.config.limits)?;
        let mut name = String::new();
        name.decode_from(&mut reader)?;
        let signature = self.abi.get_method(&name)?;
        debug!(method = %name, bytes = bytes.len(), "decoding invocation");
        let args = self.decode_sequence(signature.inputs(), reader.rest())?;
        Ok((name, args))
    }

    /// 解码单个类型，返回值与消费的字节数。
    pub fn decode_type(&self, ty: TypeRef, bytes: &[u8]) -> Result<(CompactValue, usize)> {
        let mut reader = Reader::with_limits(bytes, self.config.limits)?;
        let value = self.decode_next(ty, &mut reader)?;
        Ok((value, reader.position()))
    }

    fn decode_next(&self, ty: TypeRef, reader: &mut Reader<'_>) -> Result<CompactValue> {
        let mut value = default_value_with_limits(&self.abi, ty, &self.config.limits)?;
        value.decode_from(reader)?;
        Ok(value)
    }

    /// 同一游标依次解码，膨胀预算按整段输入累计。
    fn decode_sequence(&self, types: &[TypeRef], bytes: &[u8]) -> Result<Vec<CompactValue>> {
        let mut reader = Reader::with_limits(bytes, self.config.limits)?;
        let mut values = Vec::with_capacity(types.len());
        for (index, ty) in types.iter().enumerate() {
            let offset = reader.position();
            let value = self.decode_next(*ty, &mut reader)?;
            trace!(
                index,
                type_id = ty.id(),
                offset,
                consumed = reader.position() - offset,
                "decoded value"
            );
            values.push(value);
        }

        let remaining = reader.remaining();
        if remaining > 0 && !self.config.allow_trailing_bytes {
            return Err(CompactError::TrailingBytes { remaining });
        }
        Ok(values)
    }

    fn encode_args_to(&self, method: &Method, args: &[Input], out: &mut BytesMut) -> Result<()> {
        if args.len() != method.inputs().len() {
            let context = if method.is_constructor() {
                "constructor arguments".to_owned()
            } else {
                format!("method `{}` arguments", method.name())
            };
            return Err(CompactError::arity(
                context,
                method.inputs().len(),
                args.len(),
            ));
        }
        let converter = Converter::with_limits(&self.abi, self.config.limits);
        for (ty, arg) in method.inputs().iter().zip(args) {
            converter.convert(*ty, arg)?.encode_to(out)?;
        }
        Ok(())
    }

    fn constructor_section(&self, args: &[Input]) -> Result<Section> {
        let constructor = self
            .abi
            .constructor()
            .ok_or_else(|| CompactError::UnknownMethod {
                name: String::new(),
            })?;
        let mut content = BytesMut::new();
        self.encode_args_to(constructor, args, &mut content)?;
        let header = &self.config.constructor_section;
        Section::new(header.kind, header.name.clone(), content.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    const KV_SCHEMA: &str = r#"{
        "contract": { "name": "kv", "constructor": { "input": [0] } },
        "methods": [
            { "name": "set_hash", "input": [0, 0] },
            { "name": "get_hash", "input": [0], "output": [0] },
            { "name": "size", "output": [1] }
        ],
        "types": [
            { "id": 0, "type": "primitive", "primitive": "str" },
            { "id": 1, "type": "primitive", "primitive": "u32" }
        ]
    }"#;

    fn codec() -> AbiCodec {
        AbiCodec::new(Arc::new(Abi::from_json_str(KV_SCHEMA).unwrap()))
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<AbiCodec>();
    }

    #[test]
    fn argument_count_is_checked() {
        let err = codec().encode("set_hash", &["key".into()]).unwrap_err();
        assert_eq!(err, CompactError::arity("method `set_hash` arguments", 2, 1));
    }

    #[test]
    fn empty_name_targets_constructor() {
        let bytes = codec().encode("", &["v".into()]).unwrap();
        assert_eq!(bytes.as_ref(), &[0x04, b'v']);
    }

    #[test]
    fn trailing_bytes_follow_config() {
        let strict = codec();
        let err = strict.decode("size", &[1, 0, 0, 0, 9]).unwrap_err();
        assert_eq!(err, CompactError::TrailingBytes { remaining: 1 });

        let config = CodecConfig {
            allow_trailing_bytes: true,
            ..CodecConfig::default()
        };
        let lenient = AbiCodec::with_config(strict.abi().clone(), config).unwrap();
        let values = lenient.decode("size", &[1, 0, 0, 0, 9]).unwrap();
        assert_eq!(values[0].value().as_u128(), Some(1));
    }

    #[test]
    #[traced_test]
    fn encoding_is_logged() {
        codec()
            .encode_invocation("get_hash", &["key".into()])
            .unwrap();
        assert!(logs_contain("encoded invocation"));
        assert!(logs_contain("get_hash"));
    }
}
