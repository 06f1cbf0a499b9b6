//! 编解码配置。
//!
//! ## 意图（Why）
//! - 解码限额、尾随字节策略与构造函数分节头部都与部署环境相关，集中为一份可从 TOML 加载的配置；
//! - 所有字段都有默认值，配置文件只需写出要覆盖的部分。
//!
//! ## 示例（How）
//! ```toml
//! allow_trailing_bytes = false
//!
//! [limits]
//! max_frame_size = 1048576
//! max_collection_len = 65536
//!
//! [constructor_section]
//! kind = 0
//! name = "constructor"
//! ```

use std::fs;
use std::path::Path;

use compact_codec::{CompactError, DecodeLimits, Result};
use serde::{Deserialize, Serialize};

use crate::section::MAX_SECTION_NAME_LEN;

/// 构造函数分节的默认名称。
pub const DEFAULT_CONSTRUCTOR_SECTION: &str = "constructor";

/// 构造函数分节头部。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SectionConfig {
    /// 节类型字节。
    pub kind: u8,
    /// 节名称。
    pub name: String,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            kind: 0,
            name: DEFAULT_CONSTRUCTOR_SECTION.to_owned(),
        }
    }
}

/// 引擎配置。
///
/// # 教案式说明
/// - **契约 (What)**：
///   - `limits`：解码限额，见 [`DecodeLimits`]；
///   - `allow_trailing_bytes`：返回值解码后允许残留字节，默认拒绝；
///   - `constructor_section`：部署时包裹构造参数的分节头；
/// - **前置条件**：分节名称不超过 255 字节，加载时校验。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// 解码限额。
    pub limits: DecodeLimits,
    /// 是否容忍返回值之后的残留字节。
    pub allow_trailing_bytes: bool,
    /// 构造函数分节头。
    pub constructor_section: SectionConfig,
}

impl CodecConfig {
    /// 从 TOML 文本加载。
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|err| CompactError::InvalidConfig {
            detail: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载。
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| CompactError::InvalidConfig {
            detail: format!("{}: {err}", path.display()),
        })?;
        Self::from_toml_str(&text)
    }

    /// 校验跨字段约束。
    pub fn validate(&self) -> Result<()> {
        let name_len = self.constructor_section.name.len();
        if name_len > MAX_SECTION_NAME_LEN {
            return Err(CompactError::InvalidConfig {
                detail: format!(
                    "constructor_section.name is {name_len} bytes, at most {MAX_SECTION_NAME_LEN} allowed"
                ),
            });
        }
        Ok(())
    }
}
