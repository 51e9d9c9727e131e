//! 待办列表示例：一个控制器通过委托处理任意数量（含后插入）的列表项
//!
//! 运行：`RUST_LOG=debug cargo run -p delegation-dom --example todo_list`
//!
use delegation_dom::{
    Controller, Delegate, DelegationRegistry, Document, DomResult, Event, Node, RegistryConfig,
    mount_with,
};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Delegate)]
struct TodoList {
    registry: DelegationRegistry<TodoList, Node>,
    log: Mutex<Vec<String>>,
}

impl TodoList {
    fn note(&self, line: String) {
        println!("{line}");
        if let Ok(mut log) = self.log.lock() {
            log.push(line);
        }
    }
}

impl Controller for TodoList {
    fn connect(&self) -> anyhow::Result<()> {
        self.register("click", ".toggle", |list, _event, toggle| {
            let Some(item) = toggle.parent_node() else {
                return Ok(());
            };
            let done = item.has_class("done");
            if done {
                item.set_attribute("class", "todo")?;
            } else {
                item.add_class("done")?;
            }
            list.note(format!("toggled {:?} -> done={}", item.text_content(), !done));
            Ok(())
        })
        .register("click", ".remove", |list, _event, button| {
            if let Some(item) = button.parent_node() {
                list.note(format!("removed {:?}", item.text_content()));
                item.remove();
            }
            Ok(())
        })
        .register("click", ".explode", |_list, _event, _button| {
            anyhow::bail!("this button always fails")
        });
        Ok(())
    }

    fn disconnect(&self) {
        self.note("disconnecting".to_owned());
    }
}

fn todo_item(doc: &Document, title: &str) -> DomResult<Node> {
    let item = doc.create_element_with("li", &[("class", "todo")]);
    let toggle = doc.create_element_with("input", &[("type", "checkbox"), ("class", "toggle")]);
    let remove = doc.create_element_with("button", &[("class", "remove")]);
    item.append_child(&toggle)?;
    item.append_child(&doc.create_text_node(title))?;
    item.append_child(&remove)?;
    Ok(item)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let doc = Document::new();
    let list = doc.create_element_with("ul", &[("id", "todos")]);
    list.append_child(&todo_item(&doc, "write docs")?)?;

    let config = RegistryConfig::builder().name("todo-list").build();
    let mounted = mount_with(list.clone(), config, |registry| TodoList {
        registry,
        log: Mutex::new(Vec::new()),
    })?;

    // 挂载之后插入的列表项同样由委托处理
    let later = todo_item(&doc, "ship release")?;
    list.append_child(&later)?;

    for toggle in [&list.children()[0], &later] {
        toggle.children()[0].dispatch_event(Event::new("click"));
    }
    later.children()[2].dispatch_event(Event::new("click"));

    let explode = doc.create_element_with("button", &[("class", "explode")]);
    list.append_child(&explode)?;
    let report = explode.dispatch_event(Event::new("click"));
    for err in &report.errors {
        println!("listener error: {err}");
    }

    println!(
        "remaining items: {}, listeners on root: {}",
        list.children().len() - 1,
        list.total_listener_count()
    );

    mounted.unmount();
    println!("listeners after unmount: {}", list.total_listener_count());
    Ok(())
}
