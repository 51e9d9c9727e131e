//! 事件委托注册表基础库（delegation-core）
//!
//! 让持有单个根节点的组件按 `(事件类型, 后代选择器)` 注册逻辑处理器，
//! 而无需为每个匹配元素各挂一个物理监听器：
//! - 注册表（`registry`）：以组合键存储登记项，每个键在根节点上恰有一个物理监听器；
//! - 分发（`registry::resolve_delegate`）：事件源 → 最近元素 → 最近匹配祖先 → 根子树校验；
//! - 宿主契约（`host`）：组件以组合方式持有注册表，并在生命周期结束时显式 `unregister_all`；
//! - 能力协议（`dom`）：根节点、节点、事件与祖先匹配均由宿主提供。
//!
//! 本 crate 不绑定任何具体 DOM 实现，`delegation-dom` 提供一套内存版实现。
//!
//! 典型用法：
//! 1. 宿主组件持有 `DelegationRegistry<Self, Root>` 字段并 `#[derive(Delegate)]`；
//! 2. 通过 `Arc::new_cyclic` 构造组件，使注册表以 `Weak` 引用其所有者；
//! 3. 链式调用 `register(...)` 登记处理器；
//! 4. 生命周期结束时调用 `unregister_all()`，释放全部监听器。
//!
pub mod config;
pub mod dom;
pub mod error;
pub mod host;
pub mod key;
pub mod registry;

pub use config::RegistryConfig;
pub use dom::{AncestorMatcher, DomEvent, DomNode, PhysicalListener, RootNode};
pub use error::{DelegationError, DelegationResult};
pub use host::Delegate;
pub use key::RegistrationKey;
pub use registry::{DelegationRegistry, MatchOutcome, resolve_delegate};

#[cfg(feature = "derive")]
pub use delegation_macros::Delegate;

// 允许在本 crate 内部通过 ::delegation_core 进行自引用，
// 以便 derive 宏生成的路径在本 crate 的单元测试中也能解析。
extern crate self as delegation_core;
