use delegation_core::{Delegate, DelegationRegistry};
use delegation_dom::{Document, Node, SelectorMatcher};
use std::sync::Arc;

#[derive(Delegate)]
struct Badge(u32, DelegationRegistry<Badge, Node>);

fn main() {
    let doc = Document::new();
    let root = doc.create_element("span");
    let badge = Arc::new_cyclic(|owner| {
        Badge(
            3,
            DelegationRegistry::new(root.clone(), SelectorMatcher::new(), owner.clone()),
        )
    });

    badge
        .register("click", ".count", |_badge, _event, _node| Ok(()))
        .unregister("click", ".count");
    assert_eq!(badge.0, 3);
    assert!(badge.delegation().is_empty());
}
