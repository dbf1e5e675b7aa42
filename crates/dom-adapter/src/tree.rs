//! XmlAdapter implementation for the DOM tree

use crate::dom::{DomDocument, DomError, DomNode};
use indextree::NodeId;
use xml_adapter_traits::{
    check_comment, check_instruction, Error, Feature, NamespaceBinding, NodeKind, ResolvedName,
    Result, XmlAdapter, XMLNS_URI,
};

const BACKEND: &str = "dom";

impl From<DomError> for Error {
    fn from(err: DomError) -> Self {
        match err {
            DomError::NotFound(msg) => Error::NodeNotFound(msg),
            DomError::InvalidCharacter(name) => Error::invalid_argument(name, &["qualified name"]),
            DomError::HierarchyRequest(msg) | DomError::InvalidNodeType(msg) => {
                Error::NodeAccess(msg)
            }
        }
    }
}

/// Wrapper around [`DomDocument`] that implements the XmlAdapter trait
#[derive(Debug, Clone)]
pub struct DomAdapter {
    pub(crate) dom: DomDocument,
}

impl DomAdapter {
    /// Wrap an existing DOM document
    pub fn from_dom(dom: DomDocument) -> Self {
        Self { dom }
    }

    /// Get a reference to the underlying DOM
    pub fn dom(&self) -> &DomDocument {
        &self.dom
    }

    /// Get a mutable reference to the underlying DOM
    pub fn dom_mut(&mut self) -> &mut DomDocument {
        &mut self.dom
    }

    fn declare(&mut self, element: NodeId, declarations: &[NamespaceBinding]) -> Result<()> {
        for binding in declarations {
            let name = binding.attribute_name();
            self.dom.set_attribute_ns(
                element,
                Some(XMLNS_URI),
                &name.qualified_name(),
                &binding.uri,
            )?;
        }
        Ok(())
    }
}

impl XmlAdapter for DomAdapter {
    type Handle = NodeId;

    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn create_document(root: &ResolvedName, declarations: &[NamespaceBinding]) -> Result<Self> {
        let mut adapter = Self::from_dom(DomDocument::new());
        let element = adapter.create_element(root, declarations)?;
        let document = adapter.dom.document();
        adapter.dom.append_child(document, element)?;
        Ok(adapter)
    }

    fn document(&self) -> NodeId {
        self.dom.document()
    }

    fn root_element(&self) -> NodeId {
        self.dom
            .document_element()
            .unwrap_or_else(|| self.dom.document())
    }

    fn kind(&self, node: &NodeId) -> NodeKind {
        match self.dom.node(*node) {
            DomNode::Document => NodeKind::Document,
            DomNode::Element(_) => NodeKind::Element,
            DomNode::Attr(_) => NodeKind::Attribute,
            DomNode::Text(_) => NodeKind::Text,
            DomNode::CDataSection(_) => NodeKind::CData,
            DomNode::Comment(_) => NodeKind::Comment,
            DomNode::ProcessingInstruction { .. } => NodeKind::ProcessingInstruction,
        }
    }

    fn create_element(
        &mut self,
        name: &ResolvedName,
        declarations: &[NamespaceBinding],
    ) -> Result<NodeId> {
        let element = self
            .dom
            .create_element_ns(name.namespace_uri.as_deref(), &name.qualified_name())?;
        self.declare(element, declarations)?;
        Ok(element)
    }

    fn create_text(&mut self, text: &str) -> Result<NodeId> {
        Ok(self.dom.create_text_node(text))
    }

    fn create_comment(&mut self, text: &str) -> Result<NodeId> {
        check_comment(text)?;
        Ok(self.dom.create_comment(text))
    }

    fn create_instruction(&mut self, target: &str, data: &str) -> Result<NodeId> {
        check_instruction(target, data)?;
        Ok(self.dom.create_processing_instruction(target, data)?)
    }

    fn create_cdata(&mut self, text: &str) -> Result<NodeId> {
        Ok(self.dom.create_cdata_section(text)?)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        match self.dom.node(*node) {
            DomNode::Attr(_) => self.dom.owner_element(*node),
            _ => self.dom.parent_node(*node),
        }
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.dom.child_nodes(*node)
    }

    fn local_name(&self, node: &NodeId) -> String {
        match self.dom.node(*node) {
            DomNode::Element(element) => element.local_name.clone(),
            DomNode::Attr(attr) => attr.local_name.clone(),
            other => other.node_name(),
        }
    }

    fn prefix(&self, node: &NodeId) -> Option<String> {
        match self.dom.node(*node) {
            DomNode::Element(element) => element.prefix.clone(),
            DomNode::Attr(attr) => attr.prefix.clone(),
            _ => None,
        }
    }

    fn namespace_uri(&self, node: &NodeId) -> Option<String> {
        match self.dom.node(*node) {
            DomNode::Element(element) => element.namespace_uri.clone(),
            DomNode::Attr(attr) => attr.namespace_uri.clone(),
            _ => None,
        }
    }

    fn value(&self, node: &NodeId) -> Option<String> {
        self.dom.node_value(*node)
    }

    fn set_value(&mut self, node: &NodeId, value: &str) -> Result<()> {
        match self.dom.node(*node) {
            DomNode::Comment(_) => check_comment(value)?,
            DomNode::ProcessingInstruction { target, .. } => check_instruction(target, value)?,
            _ => {}
        }
        Ok(self.dom.set_node_value(*node, value)?)
    }

    fn attributes(&self, element: &NodeId) -> Vec<NodeId> {
        self.dom.attributes(*element).to_vec()
    }

    fn set_attribute(&mut self, element: &NodeId, name: &ResolvedName, value: &str) -> Result<()> {
        self.dom.set_attribute_ns(
            *element,
            name.namespace_uri.as_deref(),
            &name.qualified_name(),
            value,
        )?;
        Ok(())
    }

    fn remove_attribute(&mut self, element: &NodeId, name: &ResolvedName) -> Result<()> {
        self.dom
            .remove_attribute_ns(*element, name.namespace_uri.as_deref(), &name.local_name);
        Ok(())
    }

    fn add_child(
        &mut self,
        parent: &NodeId,
        child: &NodeId,
        before: Option<&NodeId>,
    ) -> Result<NodeId> {
        self.dom.insert_before(*parent, *child, before.copied())?;
        tracing::trace!(parent = ?parent, child = ?child, "attached dom node");
        Ok(*child)
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<()> {
        if *parent == self.dom.document() && Some(*child) == self.dom.document_element() {
            return Err(Error::node_access("the root element cannot be removed"));
        }
        self.dom.remove_child(*parent, *child)?;
        Ok(())
    }

    fn namespace_bindings(&self, element: &NodeId) -> Vec<NamespaceBinding> {
        self.dom
            .attributes(*element)
            .iter()
            .filter_map(|id| self.dom.attr(*id))
            .filter_map(|attr| {
                let name = ResolvedName::new(
                    attr.prefix.as_deref(),
                    &attr.local_name,
                    attr.namespace_uri.as_deref(),
                );
                let prefix = name.declared_prefix()?;
                Some(NamespaceBinding::new(prefix, &attr.value))
            })
            .collect()
    }

    fn supported_features(&self) -> Vec<Feature> {
        vec![
            Feature::CDataSections,
            Feature::TextNodeIdentity,
            Feature::MutableNamespaceMap,
        ]
    }

    fn find_descendant_elements(&self, node: &NodeId, name: &str, ns_uri: &str) -> Vec<NodeId> {
        self.dom.get_elements_by_tag_name_ns(*node, ns_uri, name)
    }
}
