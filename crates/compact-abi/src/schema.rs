//! JSON 类型表加载。
//!
//! 文档结构：
//! ```json
//! {
//!   "contract": { "name": "kv", "constructor": { "input": [0] } },
//!   "methods": [ { "name": "set_hash", "input": [0, 0], "output": [] } ],
//!   "types": [ { "id": 0, "type": "primitive", "primitive": "str" } ]
//! }
//! ```
//! 先以 serde 反序列化为原始结构，再逐个转换为 [`Type`] 并交给 [`Abi::new`] 做全局校验。

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use compact_codec::{CompactError, Result};
use serde::Deserialize;
use tracing::debug;

use crate::registry::{Abi, Contract, Method, PrimitiveKind, Type, TypeKind, TypeRef};

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    contract: Option<RawContract>,
    #[serde(default)]
    methods: Vec<RawMethod>,
    #[serde(default)]
    types: Vec<RawType>,
}

#[derive(Debug, Deserialize)]
struct RawContract {
    #[serde(default)]
    name: String,
    #[serde(default)]
    constructor: Option<RawConstructor>,
}

#[derive(Debug, Deserialize)]
struct RawConstructor {
    #[serde(default)]
    input: Vec<TypeRef>,
}

#[derive(Debug, Deserialize)]
struct RawMethod {
    name: String,
    #[serde(default)]
    input: Vec<TypeRef>,
    #[serde(default)]
    output: Vec<TypeRef>,
}

#[derive(Debug, Deserialize)]
struct RawType {
    id: u32,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    primitive: Option<String>,
    #[serde(default)]
    fields: Vec<TypeRef>,
    #[serde(default)]
    array_len: Option<usize>,
    #[serde(default)]
    variants: Option<Vec<Vec<TypeRef>>>,
}

impl RawType {
    fn into_type(self) -> Result<Type> {
        let id = self.id;
        let kind = match self.kind.to_ascii_lowercase().as_str() {
            "primitive" => {
                let name = self.primitive.ok_or_else(|| {
                    CompactError::schema(format!("primitive type {id} has no `primitive` name"))
                })?;
                TypeKind::Primitive(PrimitiveKind::parse(&name)?)
            }
            "struct" => TypeKind::Struct(self.fields),
            "tuple" => TypeKind::Tuple(self.fields),
            "vec" => TypeKind::Vec(single_element(id, "vec", &self.fields)?),
            "array" => {
                let element = single_element(id, "array", &self.fields)?;
                let len = self.array_len.ok_or_else(|| {
                    CompactError::schema(format!("array type {id} has no `array_len`"))
                })?;
                TypeKind::Array { element, len }
            }
            "enum" => TypeKind::Enum(self.variants.ok_or_else(|| {
                CompactError::schema(format!("enum type {id} has no `variants`"))
            })?),
            _ => {
                return Err(CompactError::UnsupportedType { name: self.kind });
            }
        };
        Ok(Type::new(id, kind))
    }
}

fn single_element(id: u32, kind: &str, fields: &[TypeRef]) -> Result<TypeRef> {
    match fields {
        [element] => Ok(*element),
        _ => Err(CompactError::schema(format!(
            "{kind} type {id} must declare exactly one element field, found {}",
            fields.len()
        ))),
    }
}

fn invalid_json(err: serde_json::Error) -> CompactError {
    CompactError::schema(err.to_string())
}

impl Abi {
    /// 从 JSON 文本加载。
    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_document(serde_json::from_str(text).map_err(invalid_json)?)
    }

    /// 从 JSON 字节加载。
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_document(serde_json::from_slice(bytes).map_err(invalid_json)?)
    }

    /// 从任意读取器加载。
    pub fn from_json_reader(reader: impl Read) -> Result<Self> {
        Self::from_document(serde_json::from_reader(reader).map_err(invalid_json)?)
    }

    /// 从文件加载。
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|err| CompactError::schema(format!("{}: {err}", path.display())))?;
        Self::from_json_reader(BufReader::new(file))
    }

    fn from_document(document: RawDocument) -> Result<Self> {
        let types = document
            .types
            .into_iter()
            .map(RawType::into_type)
            .collect::<Result<Vec<_>>>()?;
        let methods = document
            .methods
            .into_iter()
            .map(|raw| Method::new(raw.name, raw.input, raw.output))
            .collect();
        let contract = document.contract.map(|raw| {
            Contract::new(raw.name, raw.constructor.map(|constructor| constructor.input))
        });

        let abi = Abi::new(types, methods, contract)?;
        debug!(
            types = abi.types().len(),
            methods = abi.methods().len(),
            constructor = abi.constructor().is_some(),
            "abi schema loaded"
        );
        Ok(abi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compact_codec::error::codes;

    #[test]
    fn loads_minimal_document() {
        let abi = Abi::from_json_str(
            r#"{
                "contract": { "name": "kv", "constructor": { "input": [0] } },
                "methods": [ { "name": "set_hash", "input": [0, 0] } ],
                "types": [ { "id": 0, "type": "primitive", "primitive": "str" } ]
            }"#,
        )
        .unwrap();
        let method = abi.get_method("set_hash").unwrap();
        assert_eq!(method.inputs(), &[TypeRef(0), TypeRef(0)]);
        assert!(method.outputs().is_empty());
        assert_eq!(abi.constructor().map(Method::inputs), Some(&[TypeRef(0)][..]));
    }

    #[test]
    fn sections_default_to_empty() {
        let abi = Abi::from_json_slice(b"{}").unwrap();
        assert!(abi.types().is_empty());
        assert!(abi.constructor().is_none());
    }

    #[test]
    fn structural_violations_are_reported() {
        let cases = [
            (r#"{"types":[{"id":0,"type":"vec","fields":[]}]}"#, codes::INVALID_SCHEMA),
            (
                r#"{"types":[{"id":0,"type":"primitive","primitive":"str"},{"id":1,"type":"array","fields":[0]}]}"#,
                codes::INVALID_SCHEMA,
            ),
            (r#"{"types":[{"id":0,"type":"enum"}]}"#, codes::INVALID_SCHEMA),
            (r#"{"types":[{"id":0,"type":"primitive"}]}"#, codes::INVALID_SCHEMA),
            (
                r#"{"types":[{"id":0,"type":"primitive","primitive":"f64"}]}"#,
                codes::UNSUPPORTED_TYPE,
            ),
            (r#"{"types":[{"id":0,"type":"map"}]}"#, codes::UNSUPPORTED_TYPE),
            (r#"{"types":[{"id":0,"type":"vec","fields":[4]}]}"#, codes::UNKNOWN_TYPE),
            (r#"{"types": 3}"#, codes::INVALID_SCHEMA),
            ("not json", codes::INVALID_SCHEMA),
        ];
        for (text, code) in cases {
            let err = Abi::from_json_str(text).unwrap_err();
            assert_eq!(err.code(), code, "{text}: {err}");
        }
    }

    #[test]
    fn missing_file_is_schema_error() {
        let err = Abi::from_json_file("/nonexistent/abi.json").unwrap_err();
        assert_eq!(err.code(), codes::INVALID_SCHEMA);
    }
}
