//! 宿主能力协议
//!
//! 注册表不拥有 DOM，只消费以下能力：
//! - `DomNode`：节点是否为元素、最近的元素祖先；
//! - `DomEvent`：事件类型与事件源节点；
//! - `RootNode`：挂载/卸载物理监听器、子树包含判断；
//! - `AncestorMatcher`：从某元素起（含自身）查找最近的匹配祖先。
//!
use std::fmt;
use std::sync::Arc;

/// 文档树中的节点句柄（元素、文本等）
pub trait DomNode: Clone + Send + Sync + 'static {
    /// 是否为元素节点
    fn is_element(&self) -> bool;

    /// 最近的元素祖先（不含自身）
    fn parent_element(&self) -> Option<Self>;

    /// 自身为元素时返回自身，否则返回最近的元素祖先
    fn enclosing_element(&self) -> Option<Self> {
        if self.is_element() {
            Some(self.clone())
        } else {
            self.parent_element()
        }
    }
}

/// 原生事件
pub trait DomEvent: Send + Sync + 'static {
    type Node: DomNode;

    fn event_type(&self) -> &str;

    /// 事件源节点；合成事件可能没有
    fn target(&self) -> Option<Self::Node>;
}

pub type ListenerFn<E> = dyn Fn(&E) -> anyhow::Result<()> + Send + Sync;

/// 挂在根节点上的物理监听器
///
/// 以共享闭包的指针身份判等：同一闭包的克隆相等，内容相同的两个闭包不相等。
pub struct PhysicalListener<E> {
    inner: Arc<ListenerFn<E>>,
}

impl<E> PhysicalListener<E> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub fn call(&self, event: &E) -> anyhow::Result<()> {
        (self.inner)(event)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<E> Clone for PhysicalListener<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> PartialEq for PhysicalListener<E> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<E> Eq for PhysicalListener<E> {}

impl<E> fmt::Debug for PhysicalListener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PhysicalListener")
            .field(&Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

/// 委托根节点
pub trait RootNode: Send + Sync + 'static {
    type Node: DomNode;
    type Event: DomEvent<Node = Self::Node>;

    fn add_event_listener(&self, event_type: &str, listener: PhysicalListener<Self::Event>);

    fn remove_event_listener(&self, event_type: &str, listener: &PhysicalListener<Self::Event>);

    /// 子树包含判断（含根自身）
    fn contains(&self, node: &Self::Node) -> bool;
}

pub type NodeOf<R> = <R as RootNode>::Node;
pub type EventOf<R> = <R as RootNode>::Event;

/// 祖先匹配（closest）：从 `element` 起（含自身）向上查找第一个满足 `selector` 的元素
///
/// 选择器语法的合法性由实现方负责；非法选择器应视为“无匹配”。
pub trait AncestorMatcher<N>: Send + Sync {
    fn closest(&self, element: &N, selector: &str) -> Option<N>;
}

impl<N, F> AncestorMatcher<N> for F
where
    F: Fn(&N, &str) -> Option<N> + Send + Sync,
{
    fn closest(&self, element: &N, selector: &str) -> Option<N> {
        self(element, selector)
    }
}
