//! 注册表配置
//!
use crate::error::{DelegationError, DelegationResult};
use bon::Builder;
use serde::{Deserialize, Serialize};

const DEFAULT_NAME: &str = "delegation";

/// 注册表配置
///
/// ```
/// use delegation_core::RegistryConfig;
///
/// let config = RegistryConfig::builder().name("todo-list").build();
/// assert_eq!(config.name, "todo-list");
/// assert!(config.teardown_on_drop);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Builder, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// 日志中标识该注册表的名称
    #[builder(into, default = DEFAULT_NAME.to_owned())]
    pub name: String,
    /// 注册表被丢弃时若仍有登记项，是否自动卸载其监听器
    #[builder(default = true)]
    pub teardown_on_drop: bool,
    /// 注册表被丢弃时若仍有登记项，是否输出告警
    #[builder(default = true)]
    pub warn_on_leak: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            teardown_on_drop: true,
            warn_on_leak: true,
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> DelegationResult<()> {
        if self.name.trim().is_empty() {
            return Err(DelegationError::invalid_config("name must not be empty"));
        }
        Ok(())
    }
}
