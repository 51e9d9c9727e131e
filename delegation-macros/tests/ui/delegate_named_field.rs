use delegation_core::{Delegate, DelegationRegistry};
use delegation_dom::{Document, Event, Node, SelectorMatcher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Delegate)]
struct Toolbar {
    title: String,
    registry: DelegationRegistry<Toolbar, Node>,
    saved: AtomicUsize,
}

fn main() {
    let doc = Document::new();
    let root = doc.create_element("nav");
    let save = doc.create_element_with("button", &[("class", "save")]);
    let broken = doc.create_element_with("button", &[("class", "broken")]);
    root.append_child(&save).unwrap();
    root.append_child(&broken).unwrap();

    let toolbar = Arc::new_cyclic(|owner| Toolbar {
        title: "main".to_owned(),
        registry: DelegationRegistry::new(root.clone(), SelectorMatcher::new(), owner.clone()),
        saved: AtomicUsize::new(0),
    });
    toolbar
        .register("click", ".save", |toolbar, _event, _button| {
            toolbar.saved.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .register("click", ".broken", |_toolbar, _event, _button| -> anyhow::Result<()> {
            anyhow::bail!("toolbar action failed")
        });

    save.dispatch_event(Event::new("click"));
    assert_eq!(toolbar.saved.load(Ordering::SeqCst), 1);

    let report = broken.dispatch_event(Event::new("click"));
    assert_eq!(report.errors[0].to_string(), "toolbar action failed");
    assert_eq!(toolbar.title, "main");
    toolbar.unregister_all();
}
