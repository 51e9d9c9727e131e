//! 注册表统一错误定义
//!
//! 分发过程中的“无事件源/无匹配/越界”都按静默处理，不在此列；
//! 处理器自身的错误以 `anyhow::Error` 原样交还宿主。
//! 这里只覆盖键解码与配置校验两类可报告的失败。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DelegationError {
    #[error("invalid registration key: {reason}")]
    InvalidKey { reason: String },
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },
}

/// 统一 Result 类型别名
pub type DelegationResult<T> = Result<T, DelegationError>;

impl DelegationError {
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
