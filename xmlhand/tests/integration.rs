//! Integration tests for xmlhand
//!
//! Navigation, namespace resolution, mutation, parsing and backend selection,
//! each run against both tree backends.

use xmlhand::{
    AnyDocument, Backend, Document, DomAdapter, Error, EtreeAdapter, NodeKind, ParseOptions,
    Result, WriterOptions, XmlAdapter,
};

const SIMPLE_XML: &str = r#"<?xml version="1.0"?>
<!-- inventory -->
<root xmlns="urn:default" xmlns:x="urn:extra">
    <item id="1">First</item>
    <item id="2">Second &amp; more</item>
    <x:item id="3"><?keep this?>Third</x:item>
</root>"#;

fn names<A: XmlAdapter>(nodes: &[xmlhand::Node<'_, A>]) -> Vec<String> {
    nodes.iter().map(|node| node.name()).collect()
}

// ============== Namespace resolution ==============

fn prefix_shadowing<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::new("DocRoot", None)?;
    let outer = doc.builder().ns_prefix("p", "urn:one")?;
    let inner = outer.element("Inner")?.ns_prefix("p", "urn:two")?;
    let leaf = inner.element("p:Leaf")?;
    let other = outer.element("p:Other")?;

    assert_eq!(leaf.anchor().namespace_uri().as_deref(), Some("urn:two"));
    assert_eq!(other.anchor().namespace_uri().as_deref(), Some("urn:one"));
    assert_eq!(
        leaf.anchor().lookup_namespace_uri(Some("p")).as_deref(),
        Some("urn:two")
    );
    // urn:one is still declared above, but its prefix is re-bound closer
    assert_eq!(leaf.anchor().lookup_prefix("urn:one"), None);
    assert_eq!(
        other.anchor().lookup_prefix("urn:one"),
        Some(Some("p".to_string()))
    );
    Ok(())
}

#[test]
fn dom_prefix_shadowing() -> Result<()> {
    prefix_shadowing::<DomAdapter>()
}

#[test]
fn etree_prefix_shadowing() -> Result<()> {
    prefix_shadowing::<EtreeAdapter>()
}

fn reserved_prefixes<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::new("DocRoot", None)?;
    let root = doc.root();
    assert_eq!(
        root.lookup_namespace_uri(Some("xml")).as_deref(),
        Some(xmlhand::XML_URI)
    );
    assert_eq!(
        root.lookup_namespace_uri(Some("xmlns")).as_deref(),
        Some(xmlhand::XMLNS_URI)
    );
    root.set_attribute("xml:lang", "en")?;
    assert_eq!(root.attribute_ns(Some(xmlhand::XML_URI), "lang").as_deref(), Some("en"));
    Ok(())
}

#[test]
fn dom_reserved_prefixes() -> Result<()> {
    reserved_prefixes::<DomAdapter>()
}

#[test]
fn etree_reserved_prefixes() -> Result<()> {
    reserved_prefixes::<EtreeAdapter>()
}

fn undefined_prefixes<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::new("DocRoot", Some("urn:default"))?;
    let builder = doc.builder();

    let err = builder.element("missingns:Elem1").unwrap_err();
    assert!(matches!(err, Error::UndefinedNamespacePrefix(ref p) if p == "missingns"));
    let err = builder.attrs([("missingns:attrib1", "value1")]).unwrap_err();
    assert!(matches!(err, Error::UndefinedNamespacePrefix(_)));

    // nothing was attached by the failed calls
    assert!(doc.root().children().is_empty());
    assert!(doc.root().attributes().iter().all(|a| a.name() == "xmlns"));
    Ok(())
}

#[test]
fn dom_undefined_prefixes() -> Result<()> {
    undefined_prefixes::<DomAdapter>()
}

#[test]
fn etree_undefined_prefixes() -> Result<()> {
    undefined_prefixes::<EtreeAdapter>()
}

fn failed_attributes_leave_no_trace<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::new("DocRoot", None)?;
    let elem = doc.root().add_element("Elem", None)?;

    let err = elem.set_attribute("{urn:x}bad attr", "v").unwrap_err();
    assert!(matches!(err, Error::InvalidArgumentType { .. }));

    // the first two are written before the third fails to resolve
    let err = elem
        .set_attributes_ns(
            [("{urn:y}first", "1"), ("plain", "2"), ("missing:third", "3")],
            None,
        )
        .unwrap_err();
    assert!(matches!(err, Error::UndefinedNamespacePrefix(ref p) if p == "missing"));

    assert!(doc.root().attributes().is_empty());
    assert!(elem.attributes().is_empty());
    assert_eq!(doc.auto_prefixes_issued(), 0);
    assert_eq!(doc.root().xml(), "<DocRoot>\n    <Elem/>\n</DocRoot>");

    // no prefix was used up by the failed calls
    elem.set_attribute("{urn:y}first", "1")?;
    let first = elem.attribute_node("{urn:y}first").unwrap();
    assert_eq!(first.prefix().as_deref(), Some("autoprefix0"));
    assert_eq!(doc.auto_prefixes_issued(), 1);
    Ok(())
}

#[test]
fn dom_failed_attributes_leave_no_trace() -> Result<()> {
    failed_attributes_leave_no_trace::<DomAdapter>()
}

#[test]
fn etree_failed_attributes_leave_no_trace() -> Result<()> {
    failed_attributes_leave_no_trace::<EtreeAdapter>()
}

fn failed_builder_attrs_are_undone<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::new("DocRoot", None)?;
    let builder = doc.builder().ns_prefix("p", "urn:p")?;
    let err = builder
        .attrs([("p:kept", "old")])?
        .attrs([("p:kept", "new"), ("bad<name", "x")])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgumentType { .. }));
    assert_eq!(doc.root().attribute("p:kept").as_deref(), Some("old"));
    assert_eq!(
        doc.root().xml(),
        r#"<DocRoot p:kept="old" xmlns:p="urn:p"/>"#
    );
    Ok(())
}

#[test]
fn dom_failed_builder_attrs_are_undone() -> Result<()> {
    failed_builder_attrs_are_undone::<DomAdapter>()
}

#[test]
fn etree_failed_builder_attrs_are_undone() -> Result<()> {
    failed_builder_attrs_are_undone::<EtreeAdapter>()
}

fn invalid_names_rejected<A: XmlAdapter>() -> Result<()> {
    assert!(matches!(
        Document::<A>::new("bad name", None),
        Err(Error::InvalidArgumentType { .. })
    ));

    let doc = Document::<A>::new("a", None)?;
    let root = doc.root();
    for bad in ["bad<name", "bad name", "{urn:x}a&b", "p:q\"r", "1st", "a=b"] {
        assert!(
            matches!(root.add_element(bad, None), Err(Error::InvalidArgumentType { .. })),
            "element {bad:?}"
        );
        assert!(
            matches!(root.set_attribute(bad, "v"), Err(Error::InvalidArgumentType { .. })),
            "attribute {bad:?}"
        );
    }
    assert!(root.declare_namespace(Some("p q"), "urn:p").is_err());
    assert!(matches!(
        root.add_comment("a -- b"),
        Err(Error::InvalidArgumentType { .. })
    ));
    assert!(root.add_comment("ends with -").is_err());
    assert!(root.add_instruction("two words", "data").is_err());

    assert!(root.children().is_empty());
    assert!(root.attributes().is_empty());
    assert_eq!(root.xml(), "<a/>");
    Ok(())
}

#[test]
fn dom_invalid_names_rejected() -> Result<()> {
    invalid_names_rejected::<DomAdapter>()
}

#[test]
fn etree_invalid_names_rejected() -> Result<()> {
    invalid_names_rejected::<EtreeAdapter>()
}

fn unbound_clark_names<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::new("DocRoot", Some("urn:default"))?;
    let builder = doc.builder();
    builder.element("{urn:missing}Elem1")?;

    let elem1 = doc.root().find_first(Some("Elem1"), None).unwrap();
    assert_eq!(elem1.prefix(), None);
    assert_eq!(elem1.namespace_uri().as_deref(), Some("urn:missing"));
    assert_eq!(elem1.attribute("xmlns").as_deref(), Some("urn:missing"));

    builder.attrs([("{urn:missing2}attrib1", "value2")])?;
    let root = doc.root();
    let attr = root.attribute_node("autoprefix0:attrib1").unwrap();
    assert_eq!(attr.prefix().as_deref(), Some("autoprefix0"));
    assert_eq!(attr.namespace_uri().as_deref(), Some("urn:missing2"));
    assert_eq!(root.attribute("xmlns:autoprefix0").as_deref(), Some("urn:missing2"));

    builder.attrs([("{urn:missing3}attrib2", "value3")])?;
    assert_eq!(
        root.attribute_node("autoprefix1:attrib2")
            .and_then(|attr| attr.namespace_uri())
            .as_deref(),
        Some("urn:missing3")
    );
    assert_eq!(root.attribute("xmlns:autoprefix1").as_deref(), Some("urn:missing3"));
    Ok(())
}

#[test]
fn dom_unbound_clark_names() -> Result<()> {
    unbound_clark_names::<DomAdapter>()
}

#[test]
fn etree_unbound_clark_names() -> Result<()> {
    unbound_clark_names::<EtreeAdapter>()
}

fn auto_prefixes_are_never_reused<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::new("DocRoot", None)?;
    let root = doc.root();
    // a hand-declared prefix that looks synthesized is skipped
    root.declare_namespace(Some("autoprefix0"), "urn:taken")?;

    let child = root.add_element("Child", None)?;
    child.set_attribute("{urn:a}first", "1")?;
    assert!(child.has_attribute("autoprefix1:first"));

    // the same URI reuses the declared prefix
    child.set_attribute("{urn:a}again", "2")?;
    assert!(child.has_attribute("autoprefix1:again"));

    child.remove_attribute("autoprefix1:first")?;
    child.remove_attribute("autoprefix1:again")?;
    root.remove_attribute("xmlns:autoprefix1")?;
    assert!(!root.has_attribute("xmlns:autoprefix1"));

    child.set_attribute("{urn:b}second", "3")?;
    assert!(child.has_attribute("autoprefix2:second"));
    assert_eq!(doc.auto_prefixes_issued(), 3);
    Ok(())
}

#[test]
fn dom_auto_prefixes_are_never_reused() -> Result<()> {
    auto_prefixes_are_never_reused::<DomAdapter>()
}

#[test]
fn etree_auto_prefixes_are_never_reused() -> Result<()> {
    auto_prefixes_are_never_reused::<EtreeAdapter>()
}

// ============== Navigation ==============

fn up_clamps_at_root<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::new("DocRoot", None)?;
    let deepest = doc
        .builder()
        .element("Top")?
        .element("Mid")?
        .element("Bottom")?;

    assert_eq!(deepest.anchor().depth(), 3);
    assert_eq!(deepest.up().anchor().name(), "Mid");
    assert_eq!(deepest.up_n(2).anchor().name(), "Top");
    assert!(deepest.up_n(3).anchor().is_root());
    assert!(deepest.up_n(50).anchor().is_root());
    assert!(doc.builder().up().anchor().is_root());

    assert_eq!(deepest.up_to("Top").anchor().name(), "Top");
    assert_eq!(deepest.up_to("Bottom").anchor().name(), "Bottom");
    assert!(deepest.up_to("Missing").anchor().is_root());
    assert_eq!(
        names(&deepest.anchor().ancestors()),
        vec!["Mid", "Top", "DocRoot", "#document"]
    );
    Ok(())
}

#[test]
fn dom_up_clamps_at_root() -> Result<()> {
    up_clamps_at_root::<DomAdapter>()
}

#[test]
fn etree_up_clamps_at_root() -> Result<()> {
    up_clamps_at_root::<EtreeAdapter>()
}

fn find_in_namespaces<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::new("DocRoot", Some("urn:default"))?;
    doc.builder()
        .element_ns("Elem1", Some("urn:elem1"))?
        .element("Elem1")?
        .up()
        .up()
        .element("Plain")?;

    let root = doc.root();
    assert_eq!(root.find(Some("Elem1"), None).len(), 2);
    assert_eq!(root.find(Some("Elem1"), Some("urn:elem1")).len(), 2);
    assert!(root.find(Some("Elem1"), Some("urn:wrong")).is_empty());
    assert!(root.find(None, Some("")).is_empty());
    assert_eq!(doc.find(Some("*"), Some("*")).len(), 4);
    assert!(root.find(Some("DocRoot"), None).is_empty());
    assert_eq!(doc.find(Some("DocRoot"), None).len(), 1);
    assert_eq!(
        root.find_first(None, Some("urn:default")).map(|n| n.name()).as_deref(),
        Some("Plain")
    );
    assert!(root.find_first(Some("Nothing"), None).is_none());
    Ok(())
}

#[test]
fn dom_find_in_namespaces() -> Result<()> {
    find_in_namespaces::<DomAdapter>()
}

#[test]
fn etree_find_in_namespaces() -> Result<()> {
    find_in_namespaces::<EtreeAdapter>()
}

// ============== Mutation ==============

fn sibling_order<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::new("DocRoot", None)?;
    let root = doc.root();
    let a = root.add_element("a", None)?;
    let b = root.add_element("b", None)?;
    let c = root.add_element("c", None)?;

    let x = c.insert_element_before("x", None)?;
    assert_eq!(names(&root.children()), vec!["a", "b", "x", "c"]);
    assert_eq!(x.previous_sibling(), Some(b.clone()));
    assert_eq!(x.next_sibling(), Some(c.clone()));

    root.remove_child(&b)?;
    assert_eq!(names(&root.children()), vec!["a", "x", "c"]);
    assert_eq!(b.parent(), None);

    root.append_child(&a)?;
    assert_eq!(names(&root.children()), vec!["x", "c", "a"]);
    root.insert_child_before(&a, Some(&x))?;
    assert_eq!(names(&root.children()), vec!["a", "x", "c"]);
    assert_eq!(a.previous_sibling(), None);

    x.remove()?;
    assert_eq!(names(&root.children()), vec!["a", "c"]);
    assert!(matches!(x.remove(), Err(Error::NodeNotFound(_))));
    Ok(())
}

#[test]
fn dom_sibling_order() -> Result<()> {
    sibling_order::<DomAdapter>()
}

#[test]
fn etree_sibling_order() -> Result<()> {
    sibling_order::<EtreeAdapter>()
}

fn removal_errors<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::new("DocRoot", None)?;
    let root = doc.root();
    let child = root.add_element("Child", None)?;
    let grandchild = child.add_element("Grandchild", None)?;

    let err = root.remove_child(&grandchild).unwrap_err();
    assert!(matches!(err, Error::NodeNotFound(_)), "got {err}");
    assert!(matches!(root.remove(), Err(Error::NodeAccess(_))));

    // a missing attribute is ignored
    child.remove_attribute("absent")?;

    let other = Document::<A>::new("Other", None)?;
    let err = root.append_child(&other.root()).unwrap_err();
    assert!(matches!(err, Error::WrongBackend(_)));

    let text = child.add_text("words")?;
    let err = text.add_element("Nope", None).unwrap_err();
    assert!(matches!(err, Error::NodeAccess(_) | Error::NodeNotFound(_)), "got {err}");
    Ok(())
}

#[test]
fn dom_removal_errors() -> Result<()> {
    removal_errors::<DomAdapter>()
}

#[test]
fn etree_removal_errors() -> Result<()> {
    removal_errors::<EtreeAdapter>()
}

fn attribute_round_trip<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::new("DocRoot", None)?;
    let root = doc.root();
    root.set_attribute("id", "1")?;
    root.set_attribute("id", "2")?;
    assert_eq!(root.attribute("id").as_deref(), Some("2"));
    assert_eq!(root.attributes().len(), 1);

    let node = root.attribute_node("id").unwrap();
    assert_eq!(node.kind(), NodeKind::Attribute);
    assert_eq!(node.parent(), Some(root.clone()));
    node.set_value("3")?;
    assert_eq!(root.attribute("id").as_deref(), Some("3"));

    root.remove_attribute("id")?;
    assert!(!root.has_attribute("id"));
    Ok(())
}

#[test]
fn dom_attribute_round_trip() -> Result<()> {
    attribute_round_trip::<DomAdapter>()
}

#[test]
fn etree_attribute_round_trip() -> Result<()> {
    attribute_round_trip::<EtreeAdapter>()
}

#[test]
fn dom_text_nodes_keep_identity() -> Result<()> {
    let doc = Document::<DomAdapter>::new("DocRoot", None)?;
    let root = doc.root();
    let first = root.add_text("one")?;
    let second = root.add_text("two")?;
    assert_ne!(first, second);
    assert_eq!(root.children().len(), 2);
    assert_eq!(root.text(), "onetwo");
    Ok(())
}

#[test]
fn etree_text_merges_into_slots() -> Result<()> {
    let doc = Document::<EtreeAdapter>::new("DocRoot", None)?;
    let root = doc.root();
    let first = root.add_text("one")?;
    let second = root.add_text("two")?;
    assert_eq!(first, second);
    assert_eq!(root.children().len(), 1);
    assert_eq!(first.value().as_deref(), Some("onetwo"));

    let child = root.add_element("Child", None)?;
    root.add_text("after")?;
    root.remove_child(&child)?;
    assert_eq!(root.text(), "onetwoafter");
    Ok(())
}

// ============== Parsing ==============

fn parse_document<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::parse(SIMPLE_XML)?;
    let root = doc.root();
    assert_eq!(root.name(), "root");
    assert_eq!(root.namespace_uri().as_deref(), Some("urn:default"));

    let items = doc.find(Some("item"), None);
    assert_eq!(names(&items), vec!["item", "item", "x:item"]);
    assert_eq!(items[1].text(), "Second & more");
    assert_eq!(items[2].namespace_uri().as_deref(), Some("urn:extra"));
    assert_eq!(items[2].attribute("id").as_deref(), Some("3"));
    assert_eq!(doc.find(Some("item"), Some("urn:default")).len(), 2);

    let top: Vec<NodeKind> = doc.node().children().iter().map(|n| n.kind()).collect();
    assert_eq!(top, vec![NodeKind::Comment, NodeKind::Element]);

    let third: Vec<NodeKind> = items[2].children().iter().map(|n| n.kind()).collect();
    assert_eq!(third, vec![NodeKind::ProcessingInstruction, NodeKind::Text]);
    assert_eq!(items[2].children()[0].value().as_deref(), Some("this"));
    assert_eq!(items[2].children()[0].name(), "keep");
    Ok(())
}

#[test]
fn dom_parse_document() -> Result<()> {
    parse_document::<DomAdapter>()
}

#[test]
fn etree_parse_document() -> Result<()> {
    parse_document::<EtreeAdapter>()
}

fn parse_keeps_whitespace_on_request<A: XmlAdapter>() -> Result<()> {
    let options = ParseOptions {
        ignore_layout: false,
    };
    let doc = Document::<A>::parse_with("<a> <b/> x </a>", &options)?;
    assert_eq!(doc.root().text(), "  x ");

    // whitespace-only text goes, edge whitespace of real text stays
    let default = Document::<A>::parse("<a> <b/> x </a>")?;
    assert_eq!(default.root().text(), " x ");

    let indented = Document::<A>::parse("<a>one\n  <b/>\n  <c/> two\n</a>")?;
    assert_eq!(indented.root().text(), "one two\n");
    Ok(())
}

#[test]
fn dom_parse_keeps_whitespace_on_request() -> Result<()> {
    parse_keeps_whitespace_on_request::<DomAdapter>()
}

#[test]
fn etree_parse_keeps_whitespace_on_request() -> Result<()> {
    parse_keeps_whitespace_on_request::<EtreeAdapter>()
}

fn parse_errors<A: XmlAdapter>() {
    for bad in [
        "",
        "<a>",
        "<a></b>",
        "<a/><b/>",
        "text only",
        "<p:a/>",
        "<a><![CDATA[x]]></a><!-- -->trailing",
    ] {
        let err = Document::<A>::parse(bad).unwrap_err();
        assert!(
            matches!(err, Error::XmlParse(_) | Error::UndefinedNamespacePrefix(_)),
            "{bad:?} gave {err}"
        );
    }
}

#[test]
fn dom_parse_errors() {
    parse_errors::<DomAdapter>()
}

#[test]
fn etree_parse_errors() {
    parse_errors::<EtreeAdapter>()
}

#[test]
fn dom_parse_cdata() -> Result<()> {
    let doc = Document::<DomAdapter>::parse("<a><![CDATA[<b/>]]></a>")?;
    let children = doc.root().children();
    assert_eq!(children[0].kind(), NodeKind::CData);
    assert_eq!(doc.root().xml(), "<a><![CDATA[<b/>]]></a>");
    Ok(())
}

#[test]
fn etree_parse_cdata_as_text() -> Result<()> {
    let doc = Document::<EtreeAdapter>::parse("<a><![CDATA[<b/>]]></a>")?;
    assert_eq!(doc.root().children()[0].kind(), NodeKind::Text);
    assert_eq!(doc.root().xml(), "<a>&lt;b/&gt;</a>");
    Ok(())
}

// ============== Round trips ==============

fn built_document<A: XmlAdapter>() -> Result<Document<A>> {
    let doc = Document::<A>::new("DocRoot", Some("urn:default"))?;
    doc.builder()
        .ns_prefix("myns", "urn:custom")?
        .instruction("style", "type=\"text/css\"")?
        .element("Elem1")?
        .attrs([("b", "2"), ("a", "1 < 2")])?
        .text("Text & more")?
        .element("myns:Nested")?
        .comment("a comment")?
        .up()
        .up()
        .element_ns("Other", Some("urn:other"))?
        .attrs([("{urn:custom}flag", "yes")])?
        .up()
        .element("Empty")?
        .text("")?
        .up()
        .element("Mixed")?
        .text(" x ")?
        .element("b")?
        .up()
        .text(" y")?
        .comment("c")?
        .text("z\n")?;
    Ok(doc)
}

fn round_trip<A: XmlAdapter, B: XmlAdapter>() -> Result<()> {
    let built = built_document::<A>()?;
    for options in [
        WriterOptions::pretty(),
        WriterOptions::compact(),
        WriterOptions::pretty().with_indent(2).with_encoding(None),
    ] {
        let first = built.xml_with(&options);
        let reparsed = Document::<B>::parse(&first)?;
        assert_eq!(reparsed.xml_with(&options), first);
    }
    Ok(())
}

#[test]
fn dom_round_trip() -> Result<()> {
    round_trip::<DomAdapter, DomAdapter>()
}

#[test]
fn etree_round_trip() -> Result<()> {
    round_trip::<EtreeAdapter, EtreeAdapter>()
}

#[test]
fn cross_backend_round_trip() -> Result<()> {
    round_trip::<DomAdapter, EtreeAdapter>()?;
    round_trip::<EtreeAdapter, DomAdapter>()
}

fn mixed_content_round_trip<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::new("a", None)?;
    doc.builder().text("x")?.element("b")?.up().text(" y")?;
    assert_eq!(doc.root().xml(), "<a>x\n    <b/> y</a>");

    let reparsed = Document::<A>::parse(&doc.xml())?;
    assert_eq!(reparsed.xml(), doc.xml());
    assert_eq!(reparsed.root().text(), "x y");
    Ok(())
}

#[test]
fn dom_mixed_content_round_trip() -> Result<()> {
    mixed_content_round_trip::<DomAdapter>()
}

#[test]
fn etree_mixed_content_round_trip() -> Result<()> {
    mixed_content_round_trip::<EtreeAdapter>()
}

fn empty_text_writes_nothing<A: XmlAdapter>() -> Result<()> {
    let doc = Document::<A>::new("a", None)?;
    doc.root().add_text("")?;
    assert_eq!(doc.root().xml(), "<a/>");
    let mut out = Vec::new();
    doc.root().write_to(&mut out)?;
    assert_eq!(String::from_utf8_lossy(&out), "<a/>");
    Ok(())
}

#[test]
fn dom_empty_text_writes_nothing() -> Result<()> {
    empty_text_writes_nothing::<DomAdapter>()
}

#[test]
fn etree_empty_text_writes_nothing() -> Result<()> {
    empty_text_writes_nothing::<EtreeAdapter>()
}

// ============== Backend selection ==============

#[test]
fn any_document_backends() -> Result<()> {
    for backend in Backend::ALL {
        let doc = AnyDocument::parse(backend, SIMPLE_XML)?;
        assert_eq!(doc.backend(), backend);
        let found = doc.find(Some("item"), Some("urn:extra"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "x:item");
        assert_eq!(found[0].depth, 1);
        assert_eq!(found[0].kind, NodeKind::Element);
    }
    Ok(())
}

#[test]
fn any_document_wrong_backend() -> Result<()> {
    let doc = AnyDocument::new(Backend::Etree, "DocRoot", None)?;
    assert!(doc.as_etree().is_ok());
    let err = doc.as_dom().unwrap_err();
    assert!(matches!(err, Error::WrongBackend(_)));
    Ok(())
}

#[test]
fn check_agrees_across_backends() -> Result<()> {
    let report = xmlhand::unified::check(
        SIMPLE_XML,
        &ParseOptions::default(),
        &WriterOptions::pretty(),
    )?;
    assert!(report.agree, "{:#?}", report.outputs);
    assert_eq!(report.outputs.len(), 2);

    // CDATA survives on one backend only
    let report = xmlhand::unified::check(
        "<a><![CDATA[x]]></a>",
        &ParseOptions::default(),
        &WriterOptions::compact(),
    )?;
    assert!(!report.agree);
    Ok(())
}
