use delegation_core::{Delegate, DelegationRegistry};
use delegation_dom::{Document, Node, SelectorMatcher};
use std::sync::Arc;

type Registry = DelegationRegistry<Dialog, Node>;

#[derive(Delegate)]
struct Dialog {
    #[delegate(root = Node)]
    events: Registry,
    backup: Option<u8>,
}

fn main() {
    let doc = Document::new();
    let root = doc.create_element("dialog");
    let dialog = Arc::new_cyclic(|owner| Dialog {
        events: DelegationRegistry::new(root.clone(), SelectorMatcher::new(), owner.clone()),
        backup: None,
    });

    dialog.register("submit", "form", |_dialog, _event, _form| Ok(()));
    assert!(dialog.delegation().contains("submit", "form"));
    assert!(dialog.backup.is_none());
    dialog.unregister_all();
}
