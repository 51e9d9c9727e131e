//! 宿主组件契约（Delegate）
//!
//! 宿主组件以字段形式持有 `DelegationRegistry<Self, Root>`，实现 `Delegate`
//! （或 `#[derive(Delegate)]`）后即可链式调用 `register/unregister/unregister_all`。
//! 生命周期结束时，由宿主框架的卸载流程显式调用 `unregister_all`。
//!
//! ```
//! use delegation_core::Delegate;
//! # use delegation_core::{DelegationRegistry, DomEvent, DomNode, PhysicalListener, RootNode};
//! # use std::sync::{Arc, Mutex};
//! #
//! # #[derive(Clone)]
//! # struct El;
//! # impl DomNode for El {
//! #     fn is_element(&self) -> bool { true }
//! #     fn parent_element(&self) -> Option<Self> { None }
//! # }
//! # struct Ev;
//! # impl DomEvent for Ev {
//! #     type Node = El;
//! #     fn event_type(&self) -> &str { "click" }
//! #     fn target(&self) -> Option<El> { Some(El) }
//! # }
//! # #[derive(Default)]
//! # struct Root(Mutex<Vec<PhysicalListener<Ev>>>);
//! # impl RootNode for Root {
//! #     type Node = El;
//! #     type Event = Ev;
//! #     fn add_event_listener(&self, _: &str, l: PhysicalListener<Ev>) { self.0.lock().unwrap().push(l) }
//! #     fn remove_event_listener(&self, _: &str, l: &PhysicalListener<Ev>) { self.0.lock().unwrap().retain(|x| x != l) }
//! #     fn contains(&self, _: &El) -> bool { true }
//! # }
//! #[derive(Delegate)]
//! struct Toolbar {
//!     registry: DelegationRegistry<Toolbar, Root>,
//! }
//!
//! let toolbar = Arc::new_cyclic(|owner| Toolbar {
//!     registry: DelegationRegistry::new(Root::default(), |el: &El, _: &str| Some(el.clone()), owner.clone()),
//! });
//!
//! toolbar
//!     .register("click", ".save", |_toolbar, _event, _button| Ok(()))
//!     .register("click", ".undo", |_toolbar, _event, _button| Ok(()));
//! assert_eq!(toolbar.delegation().len(), 2);
//!
//! toolbar.unregister_all();
//! assert!(toolbar.delegation().is_empty());
//! ```
use crate::dom::{EventOf, NodeOf, RootNode};
use crate::registry::DelegationRegistry;

/// 可委托事件的宿主组件
pub trait Delegate: Sized + Send + Sync + 'static {
    type Root: RootNode;

    /// 组件持有的注册表
    fn delegation(&self) -> &DelegationRegistry<Self, Self::Root>;

    /// 注册（或替换）委托处理器，处理器以组件自身作为第一个参数
    fn register<F>(
        &self,
        event_type: impl Into<String>,
        selector: impl Into<String>,
        handler: F,
    ) -> &Self
    where
        F: Fn(&Self, &EventOf<Self::Root>, &NodeOf<Self::Root>) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.delegation().register(event_type, selector, handler);
        self
    }

    fn unregister(&self, event_type: impl Into<String>, selector: impl Into<String>) -> &Self {
        self.delegation().unregister(event_type, selector);
        self
    }

    /// 卸载全部委托处理器；应在组件生命周期结束时调用
    fn unregister_all(&self) -> &Self {
        self.delegation().teardown();
        self
    }
}
