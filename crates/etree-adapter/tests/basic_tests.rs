//! Basic tests for etree-adapter

use etree_adapter::{EtreeAdapter, EtreeHandle, TextSlot};
use xml_adapter_traits::{Error, Feature, NamespaceBinding, NodeKind, ResolvedName, XmlAdapter};

fn document(root: &str, declarations: &[NamespaceBinding]) -> EtreeAdapter {
    EtreeAdapter::create_document(&ResolvedName::local(root), declarations).unwrap()
}

fn element(adapter: &mut EtreeAdapter, parent: &EtreeHandle, name: &str) -> EtreeHandle {
    let child = adapter
        .create_element(&ResolvedName::local(name), &[])
        .unwrap();
    adapter.add_child(parent, &child, None).unwrap()
}

fn text(adapter: &mut EtreeAdapter, parent: &EtreeHandle, content: &str) -> EtreeHandle {
    let pending = adapter.create_text(content).unwrap();
    adapter.add_child(parent, &pending, None).unwrap()
}

/// Children rendered as names, with text shown as its content
fn layout(adapter: &EtreeAdapter, node: &EtreeHandle) -> Vec<String> {
    adapter
        .children(node)
        .iter()
        .map(|child| match adapter.kind(child) {
            NodeKind::Text => format!("'{}'", adapter.value(child).unwrap_or_default()),
            _ => adapter.name(child),
        })
        .collect()
}

#[test]
fn test_create_document() {
    let adapter = document("root", &[NamespaceBinding::new(Some("a"), "urn:a")]);
    let root = adapter.root_element();

    assert_eq!(adapter.name(&root), "root");
    assert_eq!(adapter.children(&adapter.document()), vec![root.clone()]);
    assert_eq!(adapter.attribute_value(&root, "xmlns:a"), Some("urn:a".to_string()));
    assert!(adapter.supported_features().is_empty());
}

#[test]
fn test_consecutive_text_concatenates() {
    let mut adapter = document("root", &[]);
    let root = adapter.root_element();
    let first = text(&mut adapter, &root, "one");
    let second = text(&mut adapter, &root, "two");

    assert_eq!(first, second);
    assert_eq!(layout(&adapter, &root), vec!["'onetwo'"]);
    assert!(!adapter.supports_feature(Feature::TextNodeIdentity));
}

#[test]
fn test_text_after_child_becomes_tail() {
    let mut adapter = document("root", &[]);
    let root = adapter.root_element();
    text(&mut adapter, &root, "lead");
    let child = element(&mut adapter, &root, "child");
    let tail = text(&mut adapter, &root, "after");

    let EtreeHandle::Node(child_id) = child else {
        panic!("element handles are nodes");
    };
    assert_eq!(
        tail,
        EtreeHandle::Text {
            owner: child_id,
            slot: TextSlot::Tail
        }
    );
    assert_eq!(adapter.parent(&tail), Some(root.clone()));
    assert_eq!(layout(&adapter, &root), vec!["'lead'", "child", "'after'"]);
}

#[test]
fn test_insert_before_text_moves_it_to_tail() {
    let mut adapter = document("root", &[]);
    let root = adapter.root_element();
    let lead = text(&mut adapter, &root, "lead");
    let child = adapter
        .create_element(&ResolvedName::local("first"), &[])
        .unwrap();
    adapter.add_child(&root, &child, Some(&lead)).unwrap();

    assert_eq!(layout(&adapter, &root), vec!["first", "'lead'"]);
}

#[test]
fn test_insert_text_before_element() {
    let mut adapter = document("root", &[]);
    let root = adapter.root_element();
    let a = element(&mut adapter, &root, "a");
    let b = element(&mut adapter, &root, "b");

    let pending = adapter.create_text("between").unwrap();
    adapter.add_child(&root, &pending, Some(&b)).unwrap();
    let pending = adapter.create_text("first").unwrap();
    adapter.add_child(&root, &pending, Some(&a)).unwrap();

    assert_eq!(layout(&adapter, &root), vec!["'first'", "a", "'between'", "b"]);
}

#[test]
fn test_remove_element_keeps_following_text() {
    let mut adapter = document("root", &[]);
    let root = adapter.root_element();
    text(&mut adapter, &root, "x");
    let child = element(&mut adapter, &root, "child");
    text(&mut adapter, &root, "y");

    adapter.remove_child(&root, &child).unwrap();
    assert_eq!(layout(&adapter, &root), vec!["'xy'"]);
    assert_eq!(adapter.parent(&child), None);
}

#[test]
fn test_remove_text_clears_slot() {
    let mut adapter = document("root", &[]);
    let root = adapter.root_element();
    let lead = text(&mut adapter, &root, "lead");
    element(&mut adapter, &root, "child");

    adapter.remove_child(&root, &lead).unwrap();
    assert_eq!(layout(&adapter, &root), vec!["child"]);
}

#[test]
fn test_remove_child_requires_parent() {
    let mut adapter = document("root", &[]);
    let root = adapter.root_element();
    let child = element(&mut adapter, &root, "child");
    let grandchild = element(&mut adapter, &child, "grandchild");

    let err = adapter.remove_child(&root, &grandchild).unwrap_err();
    assert!(matches!(err, Error::NodeNotFound(_)), "got {err}");
}

#[test]
fn test_cdata_is_unsupported() {
    let mut adapter = document("root", &[]);
    let err = adapter.create_cdata("x").unwrap_err();
    assert!(err.is_unsupported());
    assert!(err.to_string().contains("etree"));
}

#[test]
fn test_namespace_map_is_immutable() {
    let mut adapter = document("root", &[NamespaceBinding::new(Some("a"), "urn:a")]);
    let root = adapter.root_element();

    // re-declaring the same binding is accepted
    adapter
        .set_attribute(&root, &ResolvedName::declaration(Some("a")), "urn:a")
        .unwrap();
    let err = adapter
        .set_attribute(&root, &ResolvedName::declaration(Some("a")), "urn:other")
        .unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn test_later_declarations_are_attributes() {
    let mut adapter = document("root", &[NamespaceBinding::default_ns("urn:d")]);
    let root = adapter.root_element();
    adapter
        .set_attribute(&root, &ResolvedName::declaration(Some("p")), "urn:p")
        .unwrap();

    // creation-time bindings come first
    assert_eq!(
        adapter.namespace_bindings(&root),
        vec![
            NamespaceBinding::default_ns("urn:d"),
            NamespaceBinding::new(Some("p"), "urn:p"),
        ]
    );
    let names: Vec<String> = adapter
        .attributes(&root)
        .iter()
        .map(|attr| adapter.name(attr))
        .collect();
    assert_eq!(names, vec!["xmlns", "xmlns:p"]);
    assert_eq!(
        adapter.resolve_prefix_for_uri(&root, "urn:p"),
        Some(Some("p".to_string()))
    );

    adapter
        .remove_attribute(&root, &ResolvedName::declaration(Some("p")))
        .unwrap();
    assert_eq!(adapter.resolve_uri_for_prefix(&root, Some("p")), None);
}

#[test]
fn test_attributes() {
    let mut adapter = document("root", &[]);
    let root = adapter.root_element();
    let name = ResolvedName::new(Some("a"), "id", Some("urn:a"));
    adapter.set_attribute(&root, &name, "1").unwrap();

    let attr = adapter.attribute_ns(&root, Some("urn:a"), "id").unwrap();
    assert_eq!(adapter.name(&attr), "a:id");
    assert_eq!(adapter.parent(&attr), Some(root.clone()));
    adapter.set_value(&attr, "2").unwrap();
    assert_eq!(adapter.attribute_value(&root, "a:id"), Some("2".to_string()));

    adapter.remove_attribute(&root, &name).unwrap();
    adapter.remove_attribute(&root, &name).unwrap();
    assert!(adapter.attributes(&root).is_empty());
}

#[test]
fn test_find_descendant_elements() {
    let mut adapter = document("root", &[]);
    let root = adapter.root_element();
    let a = element(&mut adapter, &root, "item");
    let b = element(&mut adapter, &a, "item");
    text(&mut adapter, &root, "noise");

    assert_eq!(
        adapter.find_descendant_elements(&root, "item", "*"),
        vec![a.clone(), b]
    );
    assert!(adapter
        .find_descendant_elements(&root, "item", "urn:wrong")
        .is_empty());
    let document_node = adapter.document();
    assert_eq!(
        adapter.find_descendant_elements(&document_node, "*", "*").len(),
        3
    );
}
