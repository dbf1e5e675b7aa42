//! XML tree adapter abstraction trait

use crate::error::{Error, Result};
use crate::names::{self, NamespaceBinding, ResolvedName};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Document node
    Document,
    /// Element node
    Element,
    /// Attribute node
    Attribute,
    /// Text node
    Text,
    /// CDATA section
    CData,
    /// Comment node
    Comment,
    /// Processing instruction node
    ProcessingInstruction,
}

impl NodeKind {
    /// The fixed DOM name for kinds whose name does not come from the tree
    pub fn fixed_name(self) -> Option<&'static str> {
        match self {
            NodeKind::Document => Some("#document"),
            NodeKind::Text => Some("#text"),
            NodeKind::CData => Some("#cdata-section"),
            NodeKind::Comment => Some("#comment"),
            NodeKind::Element | NodeKind::Attribute | NodeKind::ProcessingInstruction => None,
        }
    }

    /// Whether this kind carries character data
    pub fn is_character_data(self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::CData)
    }

    /// Whether nodes of this kind may hold children
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Element)
    }
}

/// Optional capabilities that differ between backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// Real `<![CDATA[...]]>` sections
    CDataSections,
    /// Text nodes keep their identity after insertion
    TextNodeIdentity,
    /// Namespace declarations can be changed after element creation
    MutableNamespaceMap,
}

/// Trait for XML tree backends.
///
/// Each backend drives one concrete tree engine. Handles are opaque to
/// callers; all structural access goes through the adapter so that engines
/// with different node models can be used interchangeably.
pub trait XmlAdapter {
    /// Type representing a node handle in this tree
    type Handle: Clone + PartialEq + Eq + Hash + Debug;

    /// Short identifier for the backend, used in errors and logs
    fn backend_name(&self) -> &'static str;

    /// Create a new tree holding a document with a single root element
    fn create_document(root: &ResolvedName, declarations: &[NamespaceBinding]) -> Result<Self>
    where
        Self: Sized;

    /// The document node
    fn document(&self) -> Self::Handle;

    /// The root element of the document
    fn root_element(&self) -> Self::Handle;

    /// Get the kind of a node
    fn kind(&self, node: &Self::Handle) -> NodeKind;

    /// Create a detached element carrying the given namespace declarations
    fn create_element(
        &mut self,
        name: &ResolvedName,
        declarations: &[NamespaceBinding],
    ) -> Result<Self::Handle>;

    /// Create a detached text node
    fn create_text(&mut self, text: &str) -> Result<Self::Handle>;

    /// Create a detached comment
    fn create_comment(&mut self, text: &str) -> Result<Self::Handle>;

    /// Create a detached processing instruction
    fn create_instruction(&mut self, target: &str, data: &str) -> Result<Self::Handle>;

    /// Create a detached CDATA section
    fn create_cdata(&mut self, text: &str) -> Result<Self::Handle>;

    /// Get the parent of a node, if it has one.
    ///
    /// The parent of an attribute is its owner element.
    fn parent(&self, node: &Self::Handle) -> Option<Self::Handle>;

    /// Get the children of a node in document order
    fn children(&self, node: &Self::Handle) -> Vec<Self::Handle>;

    /// Get the local name of a node
    fn local_name(&self, node: &Self::Handle) -> String;

    /// Get the namespace prefix of a node
    fn prefix(&self, node: &Self::Handle) -> Option<String>;

    /// Get the namespace URI of a node
    fn namespace_uri(&self, node: &Self::Handle) -> Option<String>;

    /// Get the value of a node; `None` for elements and documents
    fn value(&self, node: &Self::Handle) -> Option<String>;

    /// Replace the value of a text, comment, instruction or attribute node
    fn set_value(&mut self, node: &Self::Handle, value: &str) -> Result<()>;

    /// Get the attribute nodes of an element, namespace declarations included
    fn attributes(&self, element: &Self::Handle) -> Vec<Self::Handle>;

    /// Set an attribute, replacing any attribute with the same qualified name
    fn set_attribute(
        &mut self,
        element: &Self::Handle,
        name: &ResolvedName,
        value: &str,
    ) -> Result<()>;

    /// Remove an attribute; removing a missing attribute is a no-op
    fn remove_attribute(&mut self, element: &Self::Handle, name: &ResolvedName) -> Result<()>;

    /// Attach `child` under `parent`, immediately before `before` or at the end.
    ///
    /// Returns the handle of the attached content. Backends without
    /// [`Feature::TextNodeIdentity`] return the text node that inserted text
    /// was merged into, which differs from `child`.
    fn add_child(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
        before: Option<&Self::Handle>,
    ) -> Result<Self::Handle>;

    /// Detach `child` from `parent`.
    ///
    /// Fails with `NodeNotFound` when `child` is not a child of `parent`.
    fn remove_child(&mut self, parent: &Self::Handle, child: &Self::Handle) -> Result<()>;

    /// The namespace bindings an element declares itself, in lookup order
    fn namespace_bindings(&self, element: &Self::Handle) -> Vec<NamespaceBinding>;

    /// Get the list of features supported by this backend
    fn supported_features(&self) -> Vec<Feature>;

    /// Check if a specific feature is supported
    fn supports_feature(&self, feature: Feature) -> bool {
        self.supported_features().contains(&feature)
    }

    /// Get the qualified name of a node
    fn name(&self, node: &Self::Handle) -> String {
        let kind = self.kind(node);
        if let Some(fixed) = kind.fixed_name() {
            return fixed.to_string();
        }
        match self.prefix(node) {
            Some(prefix) => format!("{}:{}", prefix, self.local_name(node)),
            None => self.local_name(node),
        }
    }

    /// Find an attribute node by qualified name
    fn attribute(&self, element: &Self::Handle, qname: &str) -> Option<Self::Handle> {
        self.attributes(element)
            .into_iter()
            .find(|attr| self.name(attr) == qname)
    }

    /// Find an attribute node by namespace URI and local name
    fn attribute_ns(
        &self,
        element: &Self::Handle,
        ns_uri: Option<&str>,
        local_name: &str,
    ) -> Option<Self::Handle> {
        self.attributes(element).into_iter().find(|attr| {
            self.local_name(attr) == local_name && self.namespace_uri(attr).as_deref() == ns_uri
        })
    }

    /// Get an attribute value by qualified name
    fn attribute_value(&self, element: &Self::Handle, qname: &str) -> Option<String> {
        self.attribute(element, qname)
            .and_then(|attr| self.value(&attr))
    }

    /// Descendant elements of `node` in document order, excluding `node`.
    ///
    /// `name` and `ns_uri` match exactly unless given as `*`.
    fn find_descendant_elements(
        &self,
        node: &Self::Handle,
        name: &str,
        ns_uri: &str,
    ) -> Vec<Self::Handle> {
        let mut found = Vec::new();
        let mut stack: Vec<Self::Handle> = self.children(node).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            if self.kind(&current) != NodeKind::Element {
                continue;
            }
            if element_matches(self, &current, name, ns_uri) {
                found.push(current.clone());
            }
            stack.extend(self.children(&current).into_iter().rev());
        }
        found
    }

    /// Resolve the URI bound to `prefix` (or the default namespace) at `node`
    fn resolve_uri_for_prefix(&self, node: &Self::Handle, prefix: Option<&str>) -> Option<String> {
        names::lookup_uri(self, node, prefix)
    }

    /// Resolve the nearest prefix bound to `uri` at `node`.
    ///
    /// `Some(None)` means the URI is the default namespace in scope.
    fn resolve_prefix_for_uri(&self, node: &Self::Handle, uri: &str) -> Option<Option<String>> {
        names::lookup_prefix(self, node, uri, |_| true)
    }
}

/// Reject comment text that cannot be written back as a comment
pub fn check_comment(text: &str) -> Result<()> {
    if text.contains("--") || text.ends_with('-') {
        return Err(Error::invalid_argument(
            format!("{:?}", text),
            &["comment text without \"--\" and not ending in \"-\""],
        ));
    }
    Ok(())
}

/// Reject an instruction whose target or data cannot be written back
pub fn check_instruction(target: &str, data: &str) -> Result<()> {
    if target.is_empty() || target.contains(|c: char| c.is_whitespace() || c == '?') {
        return Err(Error::invalid_argument(
            format!("{:?}", target),
            &["processing instruction target"],
        ));
    }
    if data.contains("?>") {
        return Err(Error::invalid_argument(
            format!("{:?}", data),
            &["processing instruction data without \"?>\""],
        ));
    }
    Ok(())
}

/// Name and namespace filter shared by descendant searches
pub fn element_matches<A: XmlAdapter + ?Sized>(
    adapter: &A,
    element: &A::Handle,
    name: &str,
    ns_uri: &str,
) -> bool {
    if ns_uri != "*" && adapter.namespace_uri(element).as_deref().unwrap_or("") != ns_uri {
        return false;
    }
    name == "*" || adapter.local_name(element) == name
}
