//! 组件生命周期（挂载 / 卸载）
//!
//! 宿主框架的最小实现：
//! - `mount`：以 `Arc::new_cyclic` 构造控制器，使其注册表以 `Weak` 引用控制器，
//!   然后调用 `Controller::connect` 注册委托处理器；
//! - `Mounted::unmount`：先调用 `Controller::disconnect`，再显式 `unregister_all`；
//! - 丢弃 `Mounted` 等同于卸载。
//!
use crate::document::Node;
use crate::error::{DomError, DomResult};
use crate::selector::SelectorMatcher;
use delegation_core::{Delegate, DelegationRegistry, DomNode, RegistryConfig};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// 绑定在单个根元素上的控制器
pub trait Controller: Delegate<Root = Node> {
    /// 挂载完成后调用，通常在此注册委托处理器
    fn connect(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// 卸载时、清理注册表之前调用
    fn disconnect(&self) {}
}

/// 以默认配置挂载控制器
pub fn mount<C, F>(root: Node, build: F) -> DomResult<Mounted<C>>
where
    C: Controller,
    F: FnOnce(DelegationRegistry<C, Node>) -> C,
{
    mount_with(root, RegistryConfig::default(), build)
}

pub fn mount_with<C, F>(root: Node, config: RegistryConfig, build: F) -> DomResult<Mounted<C>>
where
    C: Controller,
    F: FnOnce(DelegationRegistry<C, Node>) -> C,
{
    config.validate()?;
    if !root.is_element() {
        return Err(DomError::NotAnElement { operation: "mount" });
    }

    let name = config.name.clone();
    let controller = Arc::new_cyclic(|owner: &Weak<C>| {
        build(DelegationRegistry::with_config(
            root,
            SelectorMatcher::new(),
            owner.clone(),
            config,
        ))
    });

    // connect 失败时 mounted 被丢弃，已注册的处理器随之清理
    let mounted = Mounted {
        controller,
        active: true,
    };
    mounted.controller.connect()?;
    debug!(registry = %name, "controller mounted");
    Ok(mounted)
}

/// 已挂载的控制器
pub struct Mounted<C: Controller> {
    controller: Arc<C>,
    active: bool,
}

impl<C: Controller> Mounted<C> {
    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn handle(&self) -> Arc<C> {
        Arc::clone(&self.controller)
    }

    pub fn is_mounted(&self) -> bool {
        self.active
    }

    /// 卸载：`disconnect` 之后显式清理全部委托处理器
    pub fn unmount(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !std::mem::replace(&mut self.active, false) {
            return;
        }
        self.controller.disconnect();
        self.controller.unregister_all();
        debug!(
            registry = %self.controller.delegation().config().name,
            "controller unmounted"
        );
    }
}

impl<C: Controller> Drop for Mounted<C> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<C: Controller> fmt::Debug for Mounted<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mounted")
            .field("registry", self.controller.delegation())
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::event::Event;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        registry: DelegationRegistry<Counter, Node>,
        clicks: AtomicUsize,
        disconnected: AtomicUsize,
        fail_connect: bool,
    }

    impl Delegate for Counter {
        type Root = Node;

        fn delegation(&self) -> &DelegationRegistry<Self, Node> {
            &self.registry
        }
    }

    impl Controller for Counter {
        fn connect(&self) -> anyhow::Result<()> {
            self.register("click", ".inc", |counter, _event, _button| {
                counter.clicks.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            if self.fail_connect {
                anyhow::bail!("connect refused");
            }
            Ok(())
        }

        fn disconnect(&self) {
            self.disconnected.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counter(fail_connect: bool) -> impl FnOnce(DelegationRegistry<Counter, Node>) -> Counter {
        move |registry| Counter {
            registry,
            clicks: AtomicUsize::new(0),
            disconnected: AtomicUsize::new(0),
            fail_connect,
        }
    }

    fn tree() -> (Node, Node) {
        let doc = Document::new();
        let root = doc.create_element("section");
        let button = doc.create_element_with("button", &[("class", "inc")]);
        root.append_child(&button).unwrap();
        (root, button)
    }

    #[test]
    fn mount_connects_and_unmount_tears_down() {
        let (root, button) = tree();
        let mounted = mount(root.clone(), counter(false)).unwrap();
        assert!(mounted.is_mounted());
        assert_eq!(root.listener_count("click"), 1);

        button.dispatch_event(Event::new("click"));
        let handle = mounted.handle();
        assert_eq!(handle.clicks.load(Ordering::SeqCst), 1);

        mounted.unmount();
        assert_eq!(handle.disconnected.load(Ordering::SeqCst), 1);
        assert!(handle.delegation().is_empty());
        assert_eq!(root.total_listener_count(), 0);

        button.dispatch_event(Event::new("click"));
        assert_eq!(handle.clicks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_mounted_unmounts_once() {
        let (root, _button) = tree();
        let mounted = mount(root.clone(), counter(false)).unwrap();
        let handle = mounted.handle();

        drop(mounted);
        assert_eq!(handle.disconnected.load(Ordering::SeqCst), 1);
        assert_eq!(root.total_listener_count(), 0);
    }

    #[test]
    fn failed_connect_releases_listeners() {
        let (root, _button) = tree();
        let err = mount(root.clone(), counter(true)).unwrap_err();
        assert_eq!(err.to_string(), "connect refused");
        assert_eq!(root.total_listener_count(), 0);
    }

    #[test]
    fn mount_rejects_text_roots_and_invalid_config() {
        let doc = Document::new();
        let text = doc.create_text_node("x");
        assert!(matches!(
            mount(text, counter(false)),
            Err(DomError::NotAnElement { operation: "mount" })
        ));

        let config = RegistryConfig::builder().name("").build();
        assert!(matches!(
            mount_with(doc.create_element("div"), config, counter(false)),
            Err(DomError::Delegation(_))
        ));
    }
}
