//! 内存文档树（Document / Node）
//!
//! 节点存放在文档的 arena 中，`Node` 是“文档 + 下标”的轻量句柄，可跨线程克隆。
//! 节点从不被回收：`remove` 只是把子树从父节点上摘下。
//! 每个节点按事件类型保存物理监听器，保持挂载顺序。
//!
use crate::error::{DomError, DomResult};
use crate::event::Event;
use delegation_core::{DomNode, PhysicalListener, RootNode};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

enum NodeKind {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<(String, PhysicalListener<Event>)>,
}

#[derive(Default)]
struct Arena {
    nodes: Vec<NodeData>,
}

impl Arena {
    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).parent;
        }
        false
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|c| *c != id);
        }
    }

    fn attributes_mut(
        &mut self,
        id: NodeId,
        operation: &'static str,
    ) -> DomResult<&mut BTreeMap<String, String>> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            NodeKind::Text(_) => Err(DomError::NotAnElement { operation }),
        }
    }
}

/// 文档：节点的所有者
#[derive(Clone, Default)]
pub struct Document {
    arena: Arc<RwLock<Arena>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建游离的元素节点，标签名统一为小写
    pub fn create_element(&self, tag: &str) -> Node {
        self.insert(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
        })
    }

    /// 创建带属性的元素节点
    pub fn create_element_with(&self, tag: &str, attributes: &[(&str, &str)]) -> Node {
        self.insert(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), (*v).to_owned()))
                .collect(),
        })
    }

    pub fn create_text_node(&self, text: &str) -> Node {
        self.insert(NodeKind::Text(text.to_owned()))
    }

    pub fn node_count(&self) -> usize {
        self.read().nodes.len()
    }

    fn insert(&self, kind: NodeKind) -> Node {
        let mut arena = self.write();
        let id = NodeId(arena.nodes.len());
        arena.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        });
        Node {
            doc: self.clone(),
            id,
        }
    }

    fn same(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.arena, &other.arena)
    }

    // 锁内不会调用用户代码，中毒时直接沿用内部数据
    fn read(&self) -> RwLockReadGuard<'_, Arena> {
        self.arena.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arena> {
        self.arena.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.node_count())
            .finish()
    }
}

/// 节点句柄
#[derive(Clone)]
pub struct Node {
    doc: Document,
    id: NodeId,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.doc.same(&other.doc)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.doc.read();
        match &arena.node(self.id).kind {
            NodeKind::Element { tag, attributes } => f
                .debug_struct("Element")
                .field("id", &self.id.0)
                .field("tag", tag)
                .field("attributes", attributes)
                .finish(),
            NodeKind::Text(text) => f
                .debug_struct("Text")
                .field("id", &self.id.0)
                .field("text", text)
                .finish(),
        }
    }
}

impl Node {
    pub fn node_id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// 元素标签名（小写）；文本节点返回 None
    pub fn tag_name(&self) -> Option<String> {
        match &self.doc.read().node(self.id).kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    /// 子树内全部文本拼接
    pub fn text_content(&self) -> String {
        let arena = self.doc.read();
        let mut out = String::new();
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            let data = arena.node(id);
            if let NodeKind::Text(text) = &data.kind {
                out.push_str(text);
            }
            stack.extend(data.children.iter().rev().copied());
        }
        out
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        match &self.doc.read().node(self.id).kind {
            NodeKind::Element { attributes, .. } => {
                attributes.get(&name.to_ascii_lowercase()).cloned()
            }
            NodeKind::Text(_) => None,
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn set_attribute(&self, name: &str, value: &str) -> DomResult<()> {
        let mut arena = self.doc.write();
        arena
            .attributes_mut(self.id, "set_attribute")?
            .insert(name.to_ascii_lowercase(), value.to_owned());
        Ok(())
    }

    pub fn remove_attribute(&self, name: &str) -> DomResult<()> {
        let mut arena = self.doc.write();
        arena
            .attributes_mut(self.id, "remove_attribute")?
            .remove(&name.to_ascii_lowercase());
        Ok(())
    }

    pub fn class_list(&self) -> Vec<String> {
        self.attribute("class")
            .map(|c| c.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_list().iter().any(|c| c == class)
    }

    pub fn add_class(&self, class: &str) -> DomResult<()> {
        let mut classes = self.class_list();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_owned());
        }
        self.set_attribute("class", &classes.join(" "))
    }

    pub fn parent_node(&self) -> Option<Node> {
        self.doc.read().node(self.id).parent.map(|id| self.with_id(id))
    }

    pub fn children(&self) -> Vec<Node> {
        self.doc
            .read()
            .node(self.id)
            .children
            .iter()
            .map(|id| self.with_id(*id))
            .collect()
    }

    /// 追加子节点；若子节点已有父节点则先摘下
    pub fn append_child(&self, child: &Node) -> DomResult<()> {
        if !self.doc.same(&child.doc) {
            return Err(DomError::HierarchyRequest {
                reason: "node belongs to another document",
            });
        }

        let mut arena = self.doc.write();
        if let NodeKind::Text(_) = arena.node(self.id).kind {
            return Err(DomError::HierarchyRequest {
                reason: "text nodes cannot have children",
            });
        }
        if arena.is_inclusive_ancestor(child.id, self.id) {
            return Err(DomError::HierarchyRequest {
                reason: "cannot insert a node into its own subtree",
            });
        }

        arena.detach(child.id);
        arena.node_mut(self.id).children.push(child.id);
        arena.node_mut(child.id).parent = Some(self.id);
        Ok(())
    }

    /// 从父节点上摘下（连同子树）
    pub fn remove(&self) {
        self.doc.write().detach(self.id);
    }

    /// 包含判断（含自身）；不同文档的节点互不包含
    pub fn contains(&self, other: &Node) -> bool {
        self.doc.same(&other.doc) && self.doc.read().is_inclusive_ancestor(self.id, other.id)
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.doc
            .read()
            .node(self.id)
            .listeners
            .iter()
            .filter(|(t, _)| t == event_type)
            .count()
    }

    pub fn total_listener_count(&self) -> usize {
        self.doc.read().node(self.id).listeners.len()
    }

    /// 事件传播路径：自身及全部祖先
    pub(crate) fn propagation_path(&self) -> Vec<Node> {
        let arena = self.doc.read();
        let mut path = vec![self.clone()];
        let mut current = arena.node(self.id).parent;
        while let Some(id) = current {
            path.push(self.with_id(id));
            current = arena.node(id).parent;
        }
        path
    }

    /// 当前监听器快照（挂载顺序）
    pub(crate) fn listeners(&self, event_type: &str) -> Vec<PhysicalListener<Event>> {
        self.doc
            .read()
            .node(self.id)
            .listeners
            .iter()
            .filter(|(t, _)| t == event_type)
            .map(|(_, l)| l.clone())
            .collect()
    }

    pub(crate) fn has_listener(&self, event_type: &str, listener: &PhysicalListener<Event>) -> bool {
        self.doc
            .read()
            .node(self.id)
            .listeners
            .iter()
            .any(|(t, l)| t == event_type && l == listener)
    }

    /// 在一次加锁内读取元素的标签与属性
    pub(crate) fn with_element<T>(
        &self,
        f: impl FnOnce(&str, &BTreeMap<String, String>) -> T,
    ) -> Option<T> {
        match &self.doc.read().node(self.id).kind {
            NodeKind::Element { tag, attributes } => Some(f(tag, attributes)),
            NodeKind::Text(_) => None,
        }
    }

    fn with_id(&self, id: NodeId) -> Node {
        Node {
            doc: self.doc.clone(),
            id,
        }
    }
}

impl DomNode for Node {
    fn is_element(&self) -> bool {
        matches!(self.doc.read().node(self.id).kind, NodeKind::Element { .. })
    }

    fn parent_element(&self) -> Option<Self> {
        let arena = self.doc.read();
        let mut current = arena.node(self.id).parent;
        while let Some(id) = current {
            if let NodeKind::Element { .. } = arena.node(id).kind {
                return Some(self.with_id(id));
            }
            current = arena.node(id).parent;
        }
        None
    }
}

impl RootNode for Node {
    type Node = Node;
    type Event = Event;

    // 与浏览器一致：同一监听器对同一事件类型只挂载一次
    fn add_event_listener(&self, event_type: &str, listener: PhysicalListener<Event>) {
        let mut arena = self.doc.write();
        let listeners = &mut arena.node_mut(self.id).listeners;
        if !listeners.iter().any(|(t, l)| t == event_type && *l == listener) {
            listeners.push((event_type.to_owned(), listener));
        }
    }

    fn remove_event_listener(&self, event_type: &str, listener: &PhysicalListener<Event>) {
        self.doc
            .write()
            .node_mut(self.id)
            .listeners
            .retain(|(t, l)| !(t == event_type && l == listener));
    }

    fn contains(&self, node: &Node) -> bool {
        Node::contains(self, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_tree_and_query_structure() {
        let doc = Document::new();
        let list = doc.create_element_with("UL", &[("class", "todos"), ("ID", "main")]);
        let item = doc.create_element("li");
        let text = doc.create_text_node("buy milk");
        list.append_child(&item).unwrap();
        item.append_child(&text).unwrap();

        assert_eq!(list.tag_name().as_deref(), Some("ul"));
        assert_eq!(list.attribute("id").as_deref(), Some("main"));
        assert!(list.has_class("todos"));
        assert_eq!(text.parent_node(), Some(item.clone()));
        assert_eq!(text.parent_element(), Some(item.clone()));
        assert_eq!(item.parent_element(), Some(list.clone()));
        assert!(!text.is_element());
        assert_eq!(text.enclosing_element(), Some(item.clone()));
        assert_eq!(list.children(), vec![item.clone()]);
        assert_eq!(list.text_content(), "buy milk");
        assert_eq!(doc.node_count(), 3);
    }

    #[test]
    fn containment_is_inclusive_and_per_document() {
        let doc = Document::new();
        let root = doc.create_element("div");
        let child = doc.create_element("span");
        let stranger = doc.create_element("span");
        root.append_child(&child).unwrap();

        assert!(root.contains(&root));
        assert!(root.contains(&child));
        assert!(!child.contains(&root));
        assert!(!root.contains(&stranger));

        let other = Document::new().create_element("div");
        assert!(!root.contains(&other));

        child.remove();
        assert!(!root.contains(&child));
        assert_eq!(child.parent_node(), None);
    }

    #[test]
    fn append_rejects_invalid_hierarchies() {
        let doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        let text = doc.create_text_node("x");
        outer.append_child(&inner).unwrap();

        assert!(matches!(
            inner.append_child(&outer),
            Err(DomError::HierarchyRequest { .. })
        ));
        assert!(matches!(
            outer.append_child(&outer),
            Err(DomError::HierarchyRequest { .. })
        ));
        assert!(matches!(
            text.append_child(&inner),
            Err(DomError::HierarchyRequest { .. })
        ));
        let foreign = Document::new().create_element("p");
        assert!(matches!(
            outer.append_child(&foreign),
            Err(DomError::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn append_moves_node_between_parents() {
        let doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let child = doc.create_element("span");
        a.append_child(&child).unwrap();
        b.append_child(&child).unwrap();

        assert!(a.children().is_empty());
        assert_eq!(b.children(), vec![child.clone()]);
        assert_eq!(child.parent_node(), Some(b));
    }

    #[test]
    fn attributes_on_text_nodes_fail() {
        let doc = Document::new();
        let text = doc.create_text_node("x");
        assert!(matches!(
            text.set_attribute("class", "a"),
            Err(DomError::NotAnElement {
                operation: "set_attribute"
            })
        ));
        assert_eq!(text.attribute("class"), None);

        let el = doc.create_element("p");
        el.add_class("a").unwrap();
        el.add_class("b").unwrap();
        el.add_class("a").unwrap();
        assert_eq!(el.class_list(), vec!["a".to_string(), "b".to_string()]);
        el.remove_attribute("CLASS").unwrap();
        assert!(!el.has_attribute("class"));
    }

    #[test]
    fn listeners_are_deduplicated_and_removed_by_identity() {
        let doc = Document::new();
        let root = doc.create_element("div");
        let a = PhysicalListener::<Event>::new(|_| Ok(()));
        let b = PhysicalListener::<Event>::new(|_| Ok(()));

        root.add_event_listener("click", a.clone());
        root.add_event_listener("click", a.clone());
        root.add_event_listener("click", b.clone());
        root.add_event_listener("input", a.clone());
        assert_eq!(root.listener_count("click"), 2);
        assert_eq!(root.total_listener_count(), 3);

        root.remove_event_listener("click", &a);
        assert_eq!(root.listener_count("click"), 1);
        assert_eq!(root.listener_count("input"), 1);
        assert!(root.has_listener("click", &b));
        assert!(!root.has_listener("click", &a));
    }
}
