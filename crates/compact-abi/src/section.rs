//! 分节封装（section framing）。
//!
//! # 教案定位（Why）
//! - 部署合约时，构造函数参数以“自描述的节”追加在合约代码之后，运行时按节类型与名称识别；
//! - 直接调用不使用分节，调用帧见引擎的 `encode_invocation`。
//!
//! # 帧格式（What）
//! ```text
//! section_type: u8 | section_len: u32 LE | name_len: u8 | name | content
//! ```
//! - `section_len` 计入长度字段之后的全部字节：`1 + name_len + content_len`；
//! - 名称最长 255 字节，须为 UTF-8。
//!
//! # 实现策略（How）
//! - 解码先校验声明长度不超过缓冲，再校验名称落在声明范围内，每一步失败都返回
//!   [`CompactError::InvalidSection`] 并附带具体字段。

use bytes::{BufMut, Bytes, BytesMut};
use compact_codec::{CompactError, Result};

/// 头部固定字节数：类型 1 + 长度 4。
pub const SECTION_HEADER_LEN: usize = 5;

/// 名称长度上限。
pub const MAX_SECTION_NAME_LEN: usize = u8::MAX as usize;

/// 一个分节。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    kind: u8,
    name: String,
    content: Bytes,
}

impl Section {
    /// 创建分节；名称超过 255 字节返回 [`CompactError::InvalidSection`]。
    pub fn new(kind: u8, name: impl Into<String>, content: impl Into<Bytes>) -> Result<Self> {
        let name = name.into();
        if name.len() > MAX_SECTION_NAME_LEN {
            return Err(invalid(format!(
                "section name is {} bytes, at most {MAX_SECTION_NAME_LEN} allowed",
                name.len()
            )));
        }
        Ok(Self {
            kind,
            name,
            content: content.into(),
        })
    }

    /// 节类型。
    pub fn kind(&self) -> u8 {
        self.kind
    }

    /// 节名称。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 节内容。
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// 长度字段的取值。
    pub fn section_len(&self) -> Result<u32> {
        let len = 1 + self.name.len() + self.content.len();
        u32::try_from(len).map_err(|_| invalid(format!("section length {len} exceeds u32")))
    }

    /// 追加写入完整帧。
    pub fn encode_to(&self, out: &mut BytesMut) -> Result<()> {
        let section_len = self.section_len()?;
        out.reserve(SECTION_HEADER_LEN + section_len as usize);
        out.put_u8(self.kind);
        out.put_u32_le(section_len);
        // `new` 已保证名称不超过 255 字节。
        out.put_u8(self.name.len() as u8);
        out.put_slice(self.name.as_bytes());
        out.put_slice(&self.content);
        Ok(())
    }

    /// 编码为独立字节串。
    pub fn encode(&self) -> Result<Bytes> {
        let mut out = BytesMut::new();
        self.encode_to(&mut out)?;
        Ok(out.freeze())
    }

    /// 从缓冲头部解码一个分节，返回分节与消费的字节数。
    pub fn decode(input: &[u8]) -> Result<(Self, usize)> {
        if input.len() < SECTION_HEADER_LEN + 1 {
            return Err(invalid(format!(
                "section header needs {} bytes, {} available",
                SECTION_HEADER_LEN + 1,
                input.len()
            )));
        }
        let kind = input[0];
        let declared = u32::from_le_bytes([input[1], input[2], input[3], input[4]]) as usize;
        let available = input.len() - SECTION_HEADER_LEN;
        if declared == 0 || declared > available {
            return Err(invalid(format!(
                "declared section length {declared} does not fit {available} available bytes"
            )));
        }

        let body = &input[SECTION_HEADER_LEN..SECTION_HEADER_LEN + declared];
        let name_len = usize::from(body[0]);
        if 1 + name_len > declared {
            return Err(invalid(format!(
                "section name of {name_len} bytes overruns declared length {declared}"
            )));
        }
        let name = core::str::from_utf8(&body[1..1 + name_len])
            .map_err(|err| invalid(format!("section name is not UTF-8: {err}")))?;
        let content = Bytes::copy_from_slice(&body[1 + name_len..]);

        Ok((
            Self {
                kind,
                name: name.to_owned(),
                content,
            },
            SECTION_HEADER_LEN + declared,
        ))
    }
}

fn invalid(detail: String) -> CompactError {
    CompactError::InvalidSection { detail }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout_matches_header_rules() {
        let section = Section::new(0, "constructor", vec![0x04, b'a']).unwrap();
        let encoded = section.encode().unwrap();
        let mut expected = vec![0x00, 14, 0, 0, 0, 11];
        expected.extend_from_slice(b"constructor");
        expected.extend_from_slice(&[0x04, b'a']);
        assert_eq!(encoded.as_ref(), expected.as_slice());

        let (decoded, consumed) = Section::decode(&encoded).unwrap();
        assert_eq!(decoded, section);
        assert_eq!(consumed, encoded.len());
    }

    #[test]
    fn declared_length_must_fit() {
        let err = Section::decode(&[0x00, 9, 0, 0, 0, 0, 1, 2]).unwrap_err();
        assert_eq!(err.code(), compact_codec::error::codes::INVALID_SECTION);

        // 名称长度越过声明长度。
        let err = Section::decode(&[0x00, 2, 0, 0, 0, 5, b'a', 0xff]).unwrap_err();
        assert_eq!(err.code(), compact_codec::error::codes::INVALID_SECTION);
    }

    #[test]
    fn trailing_bytes_after_section_are_not_consumed() {
        let (section, consumed) = Section::decode(&[0x02, 1, 0, 0, 0, 0, 0xaa]).unwrap();
        assert_eq!(section.kind(), 2);
        assert!(section.name().is_empty());
        assert!(section.content().is_empty());
        assert_eq!(consumed, 6);
    }

    #[test]
    fn long_names_are_rejected() {
        let err = Section::new(0, "x".repeat(256), Bytes::new()).unwrap_err();
        assert_eq!(err.code(), compact_codec::error::codes::INVALID_SECTION);
        assert!(Section::new(0, "x".repeat(255), Bytes::new()).is_ok());
    }
}
