//! Descendant search by name and namespace.
//!
//! `None` for a name or namespace matches anything, as does `*`. An empty
//! namespace string matches elements in no namespace. Results are computed
//! on every call in document order.

use crate::document::Document;
use crate::node::Node;
use xml_adapter_traits::{NodeKind, XmlAdapter};

const ANY: &str = "*";

impl<'d, A: XmlAdapter> Node<'d, A> {
    /// Descendant elements matching `name` and `ns_uri`, this node excluded
    pub fn find(&self, name: Option<&str>, ns_uri: Option<&str>) -> Vec<Node<'d, A>> {
        let name = name.unwrap_or(ANY);
        let ns_uri = ns_uri.unwrap_or(ANY);
        let doc = self.document();
        doc.with(|a| a.find_descendant_elements(self.handle(), name, ns_uri))
            .into_iter()
            .map(|handle| Node::new(doc, handle))
            .collect()
    }

    /// The first descendant element matching `name` and `ns_uri`
    pub fn find_first(&self, name: Option<&str>, ns_uri: Option<&str>) -> Option<Node<'d, A>> {
        self.find(name, ns_uri).into_iter().next()
    }

    /// Search the whole document, root element included
    pub fn find_doc(&self, name: Option<&str>, ns_uri: Option<&str>) -> Vec<Node<'d, A>> {
        self.document().find(name, ns_uri)
    }

    /// Immediate element children in `ns_uri`; `""` selects no namespace
    pub fn children_in_ns(&self, ns_uri: &str) -> Vec<Node<'d, A>> {
        self.children()
            .into_iter()
            .filter(|child| {
                child.kind() == NodeKind::Element
                    && child.namespace_uri().as_deref().unwrap_or("") == ns_uri
            })
            .collect()
    }
}

impl<A: XmlAdapter> Document<A> {
    /// Elements anywhere in the document, root element included
    pub fn find(&self, name: Option<&str>, ns_uri: Option<&str>) -> Vec<Node<'_, A>> {
        self.node().find(name, ns_uri)
    }

    pub fn find_first(&self, name: Option<&str>, ns_uri: Option<&str>) -> Option<Node<'_, A>> {
        self.node().find_first(name, ns_uri)
    }
}
