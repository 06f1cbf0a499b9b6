//! 只读字节游标。
//!
//! ## 模块目的（Why）
//! - 解码必须逐字段精确计量已消费字节；集中在一个游标里做边界检查，
//!   避免每个变体各自切片时遗漏 `TruncatedInput`；
//! - 游标同时携带 [`DecodeLimits`]，让递归解码无需额外传参即可执行限额校验。
//!
//! ## 关键流程（How）
//! 1. `with_limits` 在解码开始前校验整段输入长度；
//! 2. 每次读取先比较 `remaining()`，不足即报错且不移动位置；
//! 3. `position()` 即为累计消费字节数；
//! 4. 集合解码物化的、不对应输入字节的值节点经 `charge_expansion` 累计，受 `max_expansion` 约束。

use crate::error::{CompactError, Result};
use crate::limits::DecodeLimits;

/// 解码游标。
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    input: &'a [u8],
    position: usize,
    limits: DecodeLimits,
    expansion: usize,
}

impl<'a> Reader<'a> {
    /// 以默认限额创建游标。
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            position: 0,
            limits: DecodeLimits::default(),
            expansion: 0,
        }
    }

    /// 以指定限额创建游标，输入超过 `max_frame_size` 时立即拒绝。
    pub fn with_limits(input: &'a [u8], limits: DecodeLimits) -> Result<Self> {
        limits.check_frame(input.len())?;
        Ok(Self {
            input,
            position: 0,
            limits,
            expansion: 0,
        })
    }

    /// 已消费的字节数。
    pub fn position(&self) -> usize {
        self.position
    }

    /// 剩余可读字节数。
    pub fn remaining(&self) -> usize {
        self.input.len() - self.position
    }

    /// 是否已读尽。
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// 当前生效的限额。
    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// 尚未消费的字节视图，不移动位置。
    pub fn rest(&self) -> &'a [u8] {
        &self.input[self.position..]
    }

    /// 读取单个字节。
    pub fn read_u8(&mut self) -> Result<u8> {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }

    /// 读取定长字节数组，供小端整数解码使用。
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// 读取 `len` 字节的零拷贝切片。
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(CompactError::TruncatedInput {
                needed: len,
                remaining,
            });
        }
        let start = self.position;
        self.position += len;
        Ok(&self.input[start..self.position])
    }

    /// 累计 `nodes` 个额外物化的值节点，超出 `max_expansion` 时拒绝且不计入。
    pub fn charge_expansion(&mut self, nodes: usize) -> Result<()> {
        let total = self.expansion.saturating_add(nodes);
        self.limits.check_expansion(total)?;
        self.expansion = total;
        Ok(())
    }

    /// 已累计的额外节点数。
    pub fn expansion(&self) -> usize {
        self.expansion
    }

    /// 要求输入已被完整消费。
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(CompactError::TrailingBytes { remaining }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_read_keeps_position() {
        let mut reader = Reader::new(&[1, 2, 3]);
        assert_eq!(reader.read_u8().unwrap(), 1);
        let err = reader.read_array::<4>().unwrap_err();
        assert_eq!(
            err,
            CompactError::TruncatedInput {
                needed: 4,
                remaining: 2
            }
        );
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.rest(), &[2, 3]);
    }

    #[test]
    fn frame_limit_rejects_before_reading() {
        let limits = DecodeLimits {
            max_frame_size: Some(2),
            ..DecodeLimits::default()
        };
        let err = Reader::with_limits(&[0; 3], limits).unwrap_err();
        assert_eq!(err.code(), crate::error::codes::LIMIT_EXCEEDED);
    }

    #[test]
    fn finish_reports_trailing_bytes() {
        let mut reader = Reader::new(&[7, 8]);
        reader.read_u8().unwrap();
        assert_eq!(
            reader.finish().unwrap_err(),
            CompactError::TrailingBytes { remaining: 1 }
        );
    }

    #[test]
    fn expansion_budget_accumulates() {
        let limits = DecodeLimits {
            max_expansion: Some(10),
            ..DecodeLimits::default()
        };
        let mut reader = Reader::with_limits(&[], limits).unwrap();
        reader.charge_expansion(6).unwrap();
        let err = reader.charge_expansion(5).unwrap_err();
        assert_eq!(
            err,
            CompactError::LimitExceeded {
                limit: "max_expansion",
                value: 11,
                max: 10
            }
        );
        assert_eq!(reader.expansion(), 6);
        reader.charge_expansion(4).unwrap();
    }
}
