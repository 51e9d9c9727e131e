//! 委托注册表（DelegationRegistry）
//!
//! 以 `RegistrationKey` 为键保存登记项，每个键在根节点上恰有一个物理监听器：
//! - `register`：新增或替换（先卸载旧监听器，再挂载新监听器）；
//! - `unregister`：卸载并移除单个登记项，不存在时为空操作；
//! - `teardown`：卸载并清空全部登记项，可重复调用。
//!
//! 物理监听器在事件冒泡到根节点时执行 `resolve_delegate`，
//! 仅当匹配元素位于根子树内时，才以 `(所有者, 事件, 匹配元素)` 调用逻辑处理器。
//!
use crate::config::RegistryConfig;
use crate::dom::{AncestorMatcher, DomEvent, DomNode, EventOf, NodeOf, PhysicalListener, RootNode};
use crate::key::RegistrationKey;
use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// 一次分发的匹配结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<N> {
    /// 事件没有事件源
    NoTarget,
    /// 事件源不是元素且没有元素祖先
    NoElement,
    /// 没有满足选择器的祖先
    NoMatch,
    /// 匹配元素不在根子树内
    OutOfScope,
    Matched(N),
}

impl<N> MatchOutcome<N> {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoTarget => "no_target",
            Self::NoElement => "no_element",
            Self::NoMatch => "no_match",
            Self::OutOfScope => "out_of_scope",
            Self::Matched(_) => "matched",
        }
    }

    pub fn matched(self) -> Option<N> {
        match self {
            Self::Matched(node) => Some(node),
            _ => None,
        }
    }
}

/// 为一次事件查找委托目标
///
/// 文本等非元素事件源先替换为最近的元素祖先，再向上匹配 `selector`，
/// 最后确认匹配元素位于 `root` 子树内。
pub fn resolve_delegate<R, M>(
    root: &R,
    matcher: &M,
    event: &R::Event,
    selector: &str,
) -> MatchOutcome<R::Node>
where
    R: RootNode,
    M: AncestorMatcher<R::Node> + ?Sized,
{
    let Some(origin) = event.target() else {
        return MatchOutcome::NoTarget;
    };
    let Some(element) = origin.enclosing_element() else {
        return MatchOutcome::NoElement;
    };
    let Some(matched) = matcher.closest(&element, selector) else {
        return MatchOutcome::NoMatch;
    };
    if !root.contains(&matched) {
        return MatchOutcome::OutOfScope;
    }
    MatchOutcome::Matched(matched)
}

/// 委托注册表
///
/// 由单个组件独占持有；通过 `Weak` 引用所有者，避免根节点上的监听器与组件形成循环引用。
pub struct DelegationRegistry<O, R: RootNode> {
    root: Arc<R>,
    matcher: Arc<dyn AncestorMatcher<R::Node>>,
    owner: Weak<O>,
    registrations: DashMap<RegistrationKey, PhysicalListener<R::Event>>,
    config: RegistryConfig,
}

impl<O, R> DelegationRegistry<O, R>
where
    O: Send + Sync + 'static,
    R: RootNode,
{
    pub fn new<M>(root: R, matcher: M, owner: Weak<O>) -> Self
    where
        M: AncestorMatcher<R::Node> + 'static,
    {
        Self::with_config(root, matcher, owner, RegistryConfig::default())
    }

    pub fn with_config<M>(root: R, matcher: M, owner: Weak<O>, config: RegistryConfig) -> Self
    where
        M: AncestorMatcher<R::Node> + 'static,
    {
        Self {
            root: Arc::new(root),
            matcher: Arc::new(matcher),
            owner,
            registrations: DashMap::new(),
            config,
        }
    }

    /// 注册（或替换）`(event_type, selector)` 对应的处理器
    pub fn register<F>(
        &self,
        event_type: impl Into<String>,
        selector: impl Into<String>,
        handler: F,
    ) -> &Self
    where
        F: Fn(&O, &EventOf<R>, &NodeOf<R>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let key = RegistrationKey::new(event_type, selector);
        let listener = self.physical_listener(&key, handler);

        if let Some(previous) = self.registrations.insert(key.clone(), listener.clone()) {
            self.root.remove_event_listener(key.event_type(), &previous);
            debug!(registry = %self.config.name, key = %key, "replaced delegated handler");
        } else {
            debug!(registry = %self.config.name, key = %key, "registered delegated handler");
        }

        self.root.add_event_listener(key.event_type(), listener);
        self
    }

    /// 注销单个登记项；不存在时为空操作
    pub fn unregister(&self, event_type: impl Into<String>, selector: impl Into<String>) -> &Self {
        let key = RegistrationKey::new(event_type, selector);
        if let Some((key, listener)) = self.registrations.remove(&key) {
            self.root.remove_event_listener(key.event_type(), &listener);
            debug!(registry = %self.config.name, key = %key, "unregistered delegated handler");
        }
        self
    }

    /// 卸载全部物理监听器并清空注册表
    pub fn teardown(&self) -> &Self {
        let keys: Vec<RegistrationKey> = self
            .registrations
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        let detached: Vec<(RegistrationKey, PhysicalListener<R::Event>)> = keys
            .into_iter()
            .filter_map(|key| self.registrations.remove(&key))
            .collect();

        if detached.is_empty() {
            return self;
        }

        for (key, listener) in &detached {
            self.root.remove_event_listener(key.event_type(), listener);
        }
        debug!(
            registry = %self.config.name,
            detached = detached.len(),
            "tore down delegated handlers"
        );
        self
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn contains(&self, event_type: &str, selector: &str) -> bool {
        self.registrations
            .contains_key(&RegistrationKey::new(event_type, selector))
    }

    /// 当前全部登记键（顺序无语义）
    pub fn keys(&self) -> Vec<RegistrationKey> {
        self.registrations
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// 当前挂在根节点上的物理监听器
    pub fn listener(&self, event_type: &str, selector: &str) -> Option<PhysicalListener<R::Event>> {
        self.registrations
            .get(&RegistrationKey::new(event_type, selector))
            .map(|entry| entry.value().clone())
    }

    pub fn root(&self) -> &R {
        &self.root
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn physical_listener<F>(&self, key: &RegistrationKey, handler: F) -> PhysicalListener<R::Event>
    where
        F: Fn(&O, &EventOf<R>, &NodeOf<R>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let root = Arc::clone(&self.root);
        let matcher = Arc::clone(&self.matcher);
        let owner = self.owner.clone();
        let selector = key.selector().to_owned();
        let registry = self.config.name.clone();

        PhysicalListener::new(move |event: &EventOf<R>| {
            let matched = match resolve_delegate(root.as_ref(), matcher.as_ref(), event, &selector)
            {
                MatchOutcome::Matched(node) => node,
                outcome => {
                    trace!(
                        registry = %registry,
                        event_type = event.event_type(),
                        selector = %selector,
                        outcome = outcome.label(),
                        "delegated event skipped"
                    );
                    return Ok(());
                }
            };

            let Some(owner) = owner.upgrade() else {
                trace!(
                    registry = %registry,
                    event_type = event.event_type(),
                    selector = %selector,
                    "owner already dropped"
                );
                return Ok(());
            };

            trace!(
                registry = %registry,
                event_type = event.event_type(),
                selector = %selector,
                "dispatching delegated event"
            );
            // 处理器错误原样交还宿主
            handler(&owner, event, &matched)
        })
    }
}

impl<O, R: RootNode> fmt::Debug for DelegationRegistry<O, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegationRegistry")
            .field("name", &self.config.name)
            .field("registrations", &self.registrations.len())
            .finish_non_exhaustive()
    }
}

impl<O, R: RootNode> Drop for DelegationRegistry<O, R> {
    fn drop(&mut self) {
        if self.registrations.is_empty() {
            return;
        }

        if !self.config.teardown_on_drop {
            if self.config.warn_on_leak {
                warn!(
                    registry = %self.config.name,
                    remaining = self.registrations.len(),
                    "registry dropped with live registrations; listeners stay attached"
                );
            }
            return;
        }

        if self.config.warn_on_leak {
            warn!(
                registry = %self.config.name,
                remaining = self.registrations.len(),
                "registry dropped before teardown; detaching listeners"
            );
        }
        for (key, listener) in std::mem::take(&mut self.registrations) {
            self.root.remove_event_listener(key.event_type(), &listener);
        }
    }
}
