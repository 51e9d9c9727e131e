//! 内存版 DOM 宿主（delegation-dom）
//!
//! 为 `delegation-core` 提供一套可在进程内运行的宿主实现：
//! - 文档树（`document`）：元素 / 文本节点、属性与类名、节点级监听器表；
//! - 事件（`event`）：以目标为起点逐级冒泡派发，收集监听器错误；
//! - 选择器（`selector`）：`closest` / `matches` 所需的选择器引擎；
//! - 组件（`component`）：`mount` 构造控制器并连接，卸载时显式 `unregister_all`。
//!
//! ```
//! use delegation_dom::{Controller, Delegate, DelegationRegistry, Document, Event, Node, mount};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Delegate)]
//! struct Menu {
//!     registry: DelegationRegistry<Menu, Node>,
//!     opened: AtomicUsize,
//! }
//!
//! impl Controller for Menu {
//!     fn connect(&self) -> anyhow::Result<()> {
//!         self.register("click", ".item", |menu, _event, _item| {
//!             menu.opened.fetch_add(1, Ordering::SeqCst);
//!             Ok(())
//!         });
//!         Ok(())
//!     }
//! }
//!
//! let doc = Document::new();
//! let nav = doc.create_element("nav");
//! let item = doc.create_element_with("a", &[("class", "item")]);
//! nav.append_child(&item)?;
//!
//! let menu = mount(nav, |registry| Menu { registry, opened: AtomicUsize::new(0) })?;
//! item.dispatch_event(Event::new("click"));
//! assert_eq!(menu.controller().opened.load(Ordering::SeqCst), 1);
//! # Ok::<(), delegation_dom::DomError>(())
//! ```
//!
pub mod component;
pub mod document;
pub mod error;
pub mod event;
pub mod selector;

pub use component::{Controller, Mounted, mount, mount_with};
pub use document::{Document, Node, NodeId};
pub use error::{DomError, DomResult};
pub use event::{DispatchReport, Event};
pub use selector::{SelectorError, SelectorList, SelectorMatcher};

pub use delegation_core::{
    Delegate, DelegationRegistry, DomEvent, DomNode, RegistrationKey, RegistryConfig, RootNode,
};
