//! 整数编解码原语。
//!
//! ## 模块目标（Why）
//! - 紧凑格式的一切长度、数值最终都落到这里：定长整数按小端排列，变长整数按四种模式位压缩；
//! - 两类原语都需要知道目标宽度以判断越界，因此共享 [`IntWidth`]。
//!
//! ## 结构概览（What）
//! - [`fixed`]：8/16/32/64/128 位有/无符号定长整数；
//! - [`compact`]：单字节/双字节/四字节/大整数四种模式的变长整数，每个宽度各有一组函数。

use core::fmt;

use serde::{Deserialize, Serialize};

pub mod compact;
pub mod fixed;

/// 整数位宽。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntWidth {
    /// 8 位。
    W8,
    /// 16 位。
    W16,
    /// 32 位。
    W32,
    /// 64 位。
    W64,
    /// 128 位。
    W128,
}

impl IntWidth {
    /// 位数。
    pub const fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
            IntWidth::W128 => 128,
        }
    }

    /// 定长编码占用的字节数。
    pub const fn bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// 无符号最大值。
    pub const fn unsigned_max(self) -> u128 {
        u128::MAX >> (128 - self.bits())
    }

    /// 有符号最小值。
    pub const fn signed_min(self) -> i128 {
        -self.signed_max() - 1
    }

    /// 有符号最大值。
    pub const fn signed_max(self) -> i128 {
        (self.unsigned_max() >> 1) as i128
    }
}

impl fmt::Display for IntWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}
