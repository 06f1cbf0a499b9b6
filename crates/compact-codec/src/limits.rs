//! 解码限额。
//!
//! ## 模块目的（Why）
//! - 变长长度前缀由对端控制，恶意的 `2^30` 长度足以让解码器尝试巨量分配；
//! - 类型模板的构造深度同样需要上界，避免异常类型表拖垮调用线程。
//!
//! ## 契约（What）
//! - `max_depth` 与 `max_expansion` 默认开启，其余限额默认关闭（`None`）；
//! - 校验失败统一返回 [`CompactError::LimitExceeded`]，且不修改任何状态。

use serde::{Deserialize, Serialize};

use crate::error::{CompactError, Result};

/// 默认模板构造深度上限。
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// 默认单次解码允许物化、但不对应输入字节的值节点数。
pub const DEFAULT_MAX_EXPANSION: usize = 1 << 18;

/// 解码限额集合。
///
/// # 教案式说明
/// - **意图 (Why)**：与帧长预算、递归深度限制同源的防护：一次解码允许读多少字节、
///   单个集合允许声明多少元素、模板允许嵌套多深；
/// - **契约 (What)**：
///   - `max_frame_size`：整段输入的字节上限；
///   - `max_collection_len`：`Vec` 元素数或 `Str` 字节数的上限；
///   - `max_depth`：模板与转换递归的层数上限；
///   - `max_expansion`：一次解码中超出已消费字节数的值节点总数上限，
///     空结构体、空元组等零字节元素全部计入；
/// - **权衡 (Trade-offs)**：限额只做拒绝，不做截断；宁可失败也不返回部分结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeLimits {
    /// 单次解码允许的最大输入字节数。
    pub max_frame_size: Option<usize>,
    /// 单个长度前缀允许声明的最大元素数/字节数。
    pub max_collection_len: Option<usize>,
    /// 模板构造与输入转换的最大递归深度。
    pub max_depth: Option<usize>,
    /// 单次解码允许额外物化的值节点数。
    pub max_expansion: Option<usize>,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_frame_size: None,
            max_collection_len: None,
            max_depth: Some(DEFAULT_MAX_DEPTH),
            max_expansion: Some(DEFAULT_MAX_EXPANSION),
        }
    }
}

impl DecodeLimits {
    /// 不设任何上限的配置，仅用于受信输入。
    pub const fn unbounded() -> Self {
        Self {
            max_frame_size: None,
            max_collection_len: None,
            max_depth: None,
            max_expansion: None,
        }
    }

    /// 校验整段输入长度。
    pub fn check_frame(&self, len: usize) -> Result<()> {
        check("max_frame_size", len, self.max_frame_size)
    }

    /// 校验长度前缀声明的集合大小。
    pub fn check_collection(&self, len: usize) -> Result<()> {
        check("max_collection_len", len, self.max_collection_len)
    }

    /// 校验递归深度；`depth` 从 0 开始计数。
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        check("max_depth", depth, self.max_depth)
    }

    /// 校验一次解码累计的额外节点数。
    pub fn check_expansion(&self, nodes: usize) -> Result<()> {
        check("max_expansion", nodes, self.max_expansion)
    }
}

fn check(limit: &'static str, value: usize, max: Option<usize>) -> Result<()> {
    match max {
        Some(max) if value > max => Err(CompactError::LimitExceeded { limit, value, max }),
        _ => Ok(()),
    }
}
