//! 登记键（RegistrationKey）
//!
//! 直接以 `(event_type, selector)` 结构作为映射键，任意两组不同的组合都不会冲突。
//! 另提供规范文本形式 `<字节长度>:<event_type><字节长度>:<selector>`，
//! 用于日志输出与往返解析，分隔符出现在内容中也不会产生歧义。
//!
use crate::error::{DelegationError, DelegationResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistrationKey {
    event_type: String,
    selector: String,
}

impl RegistrationKey {
    pub fn new(event_type: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            selector: selector.into(),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// 编码为规范文本形式
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// 从规范文本形式解码
    pub fn decode(encoded: &str) -> DelegationResult<Self> {
        encoded.parse()
    }
}

impl<E, S> From<(E, S)> for RegistrationKey
where
    E: Into<String>,
    S: Into<String>,
{
    fn from((event_type, selector): (E, S)) -> Self {
        Self::new(event_type, selector)
    }
}

impl fmt::Display for RegistrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}{}:{}",
            self.event_type.len(),
            self.event_type,
            self.selector.len(),
            self.selector
        )
    }
}

impl FromStr for RegistrationKey {
    type Err = DelegationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (event_type, rest) = take_part(s, "event_type")?;
        let (selector, rest) = take_part(rest, "selector")?;
        if !rest.is_empty() {
            return Err(DelegationError::invalid_key(format!(
                "trailing input after selector: {rest:?}"
            )));
        }
        Ok(Self::new(event_type, selector))
    }
}

// 读取一个 `<len>:<bytes>` 片段，返回 (片段, 剩余输入)
fn take_part<'a>(input: &'a str, field: &str) -> DelegationResult<(&'a str, &'a str)> {
    let (len, rest) = input.split_once(':').ok_or_else(|| {
        DelegationError::invalid_key(format!("missing length prefix for {field}"))
    })?;

    if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DelegationError::invalid_key(format!(
            "invalid length prefix {len:?} for {field}"
        )));
    }

    let len: usize = len.parse().map_err(|_| {
        DelegationError::invalid_key(format!("length prefix for {field} overflows"))
    })?;

    if rest.len() < len {
        return Err(DelegationError::invalid_key(format!(
            "{field} truncated: expected {len} bytes, found {}",
            rest.len()
        )));
    }

    if !rest.is_char_boundary(len) {
        return Err(DelegationError::invalid_key(format!(
            "length prefix for {field} splits a UTF-8 character"
        )));
    }

    Ok(rest.split_at(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_and_decode_back() {
        let key = RegistrationKey::new("click", ".btn > span");
        assert_eq!(key.encode(), "5:click11:.btn > span");
        assert_eq!(RegistrationKey::decode(&key.encode()).unwrap(), key);

        let empty = RegistrationKey::new("", "");
        assert_eq!(empty.encode(), "0:0:");
        assert_eq!(RegistrationKey::decode("0:0:").unwrap(), empty);
    }

    #[test]
    fn separator_inside_parts_does_not_collide() {
        let a = RegistrationKey::new("a|b", "c");
        let b = RegistrationKey::new("a", "b|c");
        assert_ne!(a, b);
        assert_ne!(a.encode(), b.encode());

        // 内容中出现冒号与数字也能正确还原
        let tricky = RegistrationKey::new("x:1:", "2:y");
        assert_eq!(RegistrationKey::decode(&tricky.encode()).unwrap(), tricky);

        // 多字节字符按字节计长
        let unicode = RegistrationKey::new("点击", "[title=\"é\"]");
        assert_eq!(RegistrationKey::decode(&unicode.encode()).unwrap(), unicode);
    }

    #[test]
    fn malformed_text_is_rejected() {
        for bad in ["", "click", "x:click", "5:cli", "5:click", "5:click4:.btn!", "-1:a0:"] {
            match RegistrationKey::decode(bad) {
                Err(DelegationError::InvalidKey { .. }) => {}
                other => panic!("expected InvalidKey for {bad:?}, got {other:?}"),
            }
        }

        // 长度落在多字节字符中间
        let err = RegistrationKey::decode("1:é0:").unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn tuple_conversion() {
        let key: RegistrationKey = ("input", "textarea").into();
        assert_eq!(key.event_type(), "input");
        assert_eq!(key.selector(), "textarea");
    }
}
