//! 事件与冒泡派发
//!
//! `Node::dispatch_event` 先在事件源上调用监听器，再沿祖先链逐级冒泡，
//! 直到根部或监听器调用了 `stop_propagation`。
//! 监听器返回的错误即宿主的“默认错误处理”：记录日志、收集到报告中，并继续派发。
//!
use crate::document::Node;
use delegation_core::DomEvent;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::error;

pub struct Event {
    event_type: String,
    bubbles: bool,
    target: Option<Node>,
    propagation_stopped: AtomicBool,
}

impl Event {
    /// 冒泡事件（如 click、input、mouseover）
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles: true,
            target: None,
            propagation_stopped: AtomicBool::new(false),
        }
    }

    /// 不冒泡的事件（如 mouseenter、focus）
    pub fn non_bubbling(event_type: impl Into<String>) -> Self {
        Self {
            bubbles: false,
            ..Self::new(event_type)
        }
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// 阻止继续冒泡；当前节点上剩余的监听器仍会执行
    pub fn stop_propagation(&self) {
        self.propagation_stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.load(Ordering::SeqCst)
    }
}

impl DomEvent for Event {
    type Node = Node;

    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn target(&self) -> Option<Node> {
        self.target.clone()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("event_type", &self.event_type)
            .field("bubbles", &self.bubbles)
            .field("target", &self.target)
            .field("propagation_stopped", &self.is_propagation_stopped())
            .finish()
    }
}

/// 一次派发的结果
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// 实际调用的监听器数量
    pub invoked: usize,
    /// 监听器返回的错误（按调用顺序）
    pub errors: Vec<anyhow::Error>,
}

impl DispatchReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Node {
    /// 以自身为事件源派发事件
    pub fn dispatch_event(&self, mut event: Event) -> DispatchReport {
        event.target = Some(self.clone());
        deliver(&event, self.propagation_path())
    }

    /// 派发一个没有事件源的事件（从自身开始冒泡）
    pub fn dispatch_without_target(&self, event: Event) -> DispatchReport {
        deliver(&event, self.propagation_path())
    }
}

fn deliver(event: &Event, path: Vec<Node>) -> DispatchReport {
    let mut report = DispatchReport::default();

    for node in path {
        // 快照：派发途中新增的监听器等到下一次事件
        for listener in node.listeners(event.event_type()) {
            // 派发途中被移除的监听器不再调用
            if !node.has_listener(event.event_type(), &listener) {
                continue;
            }
            report.invoked += 1;
            if let Err(err) = listener.call(event) {
                error!(event_type = event.event_type(), error = %err, "event listener failed");
                report.errors.push(err);
            }
        }

        if !event.bubbles() || event.is_propagation_stopped() {
            break;
        }
    }

    report
}
