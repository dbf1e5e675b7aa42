//! A W3C DOM style document tree.
//!
//! Every piece of content is a node with its own identity: text, CDATA
//! sections, comments and processing instructions are children of their
//! element, and attributes (namespace declarations included) are attribute
//! nodes owned by an element. Nodes live in an [`indextree`] arena owned by
//! the [`DomDocument`]; removal only detaches, so ids stay valid for the
//! lifetime of the document. Detached nodes and nodes that were never
//! attached are not reclaimed until the document is dropped.

use indextree::{Arena, NodeId};

/// DOM exceptions raised by tree mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The node cannot be inserted at the requested position
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(String),

    /// A referenced node is not where the operation expects it
    #[error("not found: {0}")]
    NotFound(String),

    /// A name is not a valid qualified name
    #[error("invalid character in name {0:?}")]
    InvalidCharacter(String),

    /// The operation does not apply to this kind of node
    #[error("invalid node type: {0}")]
    InvalidNodeType(String),
}

/// Element payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace_uri: Option<String>,
    /// Attribute nodes in the order they were first set
    pub attributes: Vec<NodeId>,
}

/// Attribute payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrData {
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace_uri: Option<String>,
    pub value: String,
    pub owner: Option<NodeId>,
}

impl AttrData {
    pub fn qualified_name(&self) -> String {
        qualified(self.prefix.as_deref(), &self.local_name)
    }
}

/// A node in the DOM arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Document,
    Element(ElementData),
    Attr(AttrData),
    Text(String),
    CDataSection(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
}

impl DomNode {
    /// DOM `nodeName`
    pub fn node_name(&self) -> String {
        match self {
            DomNode::Document => "#document".to_string(),
            DomNode::Element(e) => qualified(e.prefix.as_deref(), &e.local_name),
            DomNode::Attr(a) => a.qualified_name(),
            DomNode::Text(_) => "#text".to_string(),
            DomNode::CDataSection(_) => "#cdata-section".to_string(),
            DomNode::Comment(_) => "#comment".to_string(),
            DomNode::ProcessingInstruction { target, .. } => target.clone(),
        }
    }

    fn is_container(&self) -> bool {
        matches!(self, DomNode::Document | DomNode::Element(_))
    }
}

fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}

fn split_qualified_name(qualified_name: &str) -> Result<(Option<&str>, &str), DomError> {
    let invalid = || DomError::InvalidCharacter(qualified_name.to_string());
    if qualified_name.is_empty() || qualified_name.contains(['<', '>', '&', '"', ' ']) {
        return Err(invalid());
    }
    match qualified_name.split_once(':') {
        None => Ok((None, qualified_name)),
        Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() && !local.contains(':') => {
            Ok((Some(prefix), local))
        }
        Some(_) => Err(invalid()),
    }
}

/// An owned DOM document
#[derive(Debug, Clone)]
pub struct DomDocument {
    arena: Arena<DomNode>,
    document: NodeId,
}

impl Default for DomDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DomDocument {
    /// Create an empty document with no document element
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(DomNode::Document);
        Self { arena, document }
    }

    /// The document node
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// The single element child of the document node
    pub fn document_element(&self) -> Option<NodeId> {
        self.document
            .children(&self.arena)
            .find(|id| matches!(self.node(*id), DomNode::Element(_)))
    }

    /// Get a node's payload
    pub fn node(&self, id: NodeId) -> &DomNode {
        self.arena[id].get()
    }

    fn node_mut(&mut self, id: NodeId) -> &mut DomNode {
        self.arena[id].get_mut()
    }

    /// Get an element's payload, if `id` is an element
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.node(id) {
            DomNode::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Get an attribute's payload, if `id` is an attribute
    pub fn attr(&self, id: NodeId) -> Option<&AttrData> {
        match self.node(id) {
            DomNode::Attr(attr) => Some(attr),
            _ => None,
        }
    }

    pub fn create_element_ns(
        &mut self,
        namespace_uri: Option<&str>,
        qualified_name: &str,
    ) -> Result<NodeId, DomError> {
        let (prefix, local_name) = split_qualified_name(qualified_name)?;
        if prefix.is_some() && namespace_uri.is_none() {
            return Err(DomError::InvalidCharacter(format!(
                "{} has a prefix but no namespace",
                qualified_name
            )));
        }
        Ok(self.arena.new_node(DomNode::Element(ElementData {
            prefix: prefix.map(str::to_string),
            local_name: local_name.to_string(),
            namespace_uri: namespace_uri.map(str::to_string),
            attributes: Vec::new(),
        })))
    }

    pub fn create_text_node(&mut self, data: &str) -> NodeId {
        self.arena.new_node(DomNode::Text(data.to_string()))
    }

    pub fn create_cdata_section(&mut self, data: &str) -> Result<NodeId, DomError> {
        if data.contains("]]>") {
            return Err(DomError::InvalidCharacter(
                "CDATA content may not contain ]]>".to_string(),
            ));
        }
        Ok(self.arena.new_node(DomNode::CDataSection(data.to_string())))
    }

    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.arena.new_node(DomNode::Comment(data.to_string()))
    }

    pub fn create_processing_instruction(
        &mut self,
        target: &str,
        data: &str,
    ) -> Result<NodeId, DomError> {
        if target.is_empty() || target.contains(char::is_whitespace) {
            return Err(DomError::InvalidCharacter(target.to_string()));
        }
        Ok(self.arena.new_node(DomNode::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        }))
    }

    /// DOM `parentNode`; attributes have none
    pub fn parent_node(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    /// DOM `ownerElement` of an attribute
    pub fn owner_element(&self, attr: NodeId) -> Option<NodeId> {
        self.attr(attr).and_then(|attr| attr.owner)
    }

    /// DOM `childNodes`
    pub fn child_nodes(&self, id: NodeId) -> Vec<NodeId> {
        id.children(&self.arena).collect()
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if !self.node(parent).is_container() {
            return Err(DomError::HierarchyRequest(format!(
                "{} cannot have children",
                self.node(parent).node_name()
            )));
        }
        match self.node(child) {
            DomNode::Document | DomNode::Attr(_) => {
                return Err(DomError::HierarchyRequest(format!(
                    "{} cannot be a child",
                    self.node(child).node_name()
                )));
            }
            DomNode::Text(_) | DomNode::CDataSection(_) if parent == self.document => {
                return Err(DomError::HierarchyRequest(
                    "documents cannot hold character data".to_string(),
                ));
            }
            DomNode::Element(_) if parent == self.document => {
                if let Some(existing) = self.document_element() {
                    if existing != child {
                        return Err(DomError::HierarchyRequest(
                            "document already has a document element".to_string(),
                        ));
                    }
                }
            }
            _ => {}
        }
        if parent.ancestors(&self.arena).any(|ancestor| ancestor == child) {
            return Err(DomError::HierarchyRequest(
                "a node cannot be inserted into its own subtree".to_string(),
            ));
        }
        Ok(())
    }

    /// DOM `appendChild`; a node that already has a parent is moved
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insertion(parent, child)?;
        child.detach(&mut self.arena);
        parent
            .checked_append(child, &mut self.arena)
            .map_err(|e| DomError::HierarchyRequest(e.to_string()))
    }

    /// DOM `insertBefore`; `None` as the reference appends
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        let Some(reference) = reference else {
            return self.append_child(parent, new_child);
        };
        if self.parent_node(reference) != Some(parent) {
            return Err(DomError::NotFound(
                "reference node is not a child of this node".to_string(),
            ));
        }
        if reference == new_child {
            return Ok(());
        }
        self.check_insertion(parent, new_child)?;
        new_child.detach(&mut self.arena);
        reference
            .checked_insert_before(new_child, &mut self.arena)
            .map_err(|e| DomError::HierarchyRequest(e.to_string()))
    }

    /// DOM `removeChild`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        if self.parent_node(child) != Some(parent) {
            return Err(DomError::NotFound(format!(
                "{} is not a child of {}",
                self.node(child).node_name(),
                self.node(parent).node_name()
            )));
        }
        child.detach(&mut self.arena);
        Ok(child)
    }

    /// DOM `nodeValue`
    pub fn node_value(&self, id: NodeId) -> Option<String> {
        match self.node(id) {
            DomNode::Document | DomNode::Element(_) => None,
            DomNode::Attr(attr) => Some(attr.value.clone()),
            DomNode::Text(data) | DomNode::CDataSection(data) | DomNode::Comment(data) => {
                Some(data.clone())
            }
            DomNode::ProcessingInstruction { data, .. } => Some(data.clone()),
        }
    }

    /// Set DOM `nodeValue`
    pub fn set_node_value(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        match self.node_mut(id) {
            DomNode::Document | DomNode::Element(_) => Err(DomError::InvalidNodeType(
                "documents and elements have no node value".to_string(),
            )),
            DomNode::Attr(attr) => {
                attr.value = value.to_string();
                Ok(())
            }
            DomNode::Text(data) | DomNode::CDataSection(data) | DomNode::Comment(data) => {
                *data = value.to_string();
                Ok(())
            }
            DomNode::ProcessingInstruction { data, .. } => {
                *data = value.to_string();
                Ok(())
            }
        }
    }

    /// Attribute nodes of an element in the order they were first set
    pub fn attributes(&self, element: NodeId) -> &[NodeId] {
        match self.element(element) {
            Some(element) => &element.attributes,
            None => &[],
        }
    }

    /// DOM `getAttributeNode`, matching on the qualified name
    pub fn get_attribute_node(&self, element: NodeId, qualified_name: &str) -> Option<NodeId> {
        self.attributes(element).iter().copied().find(|id| {
            self.attr(*id)
                .is_some_and(|attr| attr.qualified_name() == qualified_name)
        })
    }

    /// DOM `getAttributeNodeNS`
    pub fn get_attribute_node_ns(
        &self,
        element: NodeId,
        namespace_uri: Option<&str>,
        local_name: &str,
    ) -> Option<NodeId> {
        self.attributes(element).iter().copied().find(|id| {
            self.attr(*id).is_some_and(|attr| {
                attr.local_name == local_name && attr.namespace_uri.as_deref() == namespace_uri
            })
        })
    }

    /// DOM `setAttributeNS`; replaces the value of a matching attribute
    pub fn set_attribute_ns(
        &mut self,
        element: NodeId,
        namespace_uri: Option<&str>,
        qualified_name: &str,
        value: &str,
    ) -> Result<NodeId, DomError> {
        if self.element(element).is_none() {
            return Err(DomError::InvalidNodeType(format!(
                "{} cannot hold attributes",
                self.node(element).node_name()
            )));
        }
        let (prefix, local_name) = split_qualified_name(qualified_name)?;
        if let Some(existing) = self.get_attribute_node_ns(element, namespace_uri, local_name) {
            if let DomNode::Attr(attr) = self.node_mut(existing) {
                attr.prefix = prefix.map(str::to_string);
                attr.value = value.to_string();
            }
            return Ok(existing);
        }
        let attr = self.arena.new_node(DomNode::Attr(AttrData {
            prefix: prefix.map(str::to_string),
            local_name: local_name.to_string(),
            namespace_uri: namespace_uri.map(str::to_string),
            value: value.to_string(),
            owner: Some(element),
        }));
        if let DomNode::Element(data) = self.node_mut(element) {
            data.attributes.push(attr);
        }
        Ok(attr)
    }

    /// DOM `removeAttributeNS`; returns whether an attribute was removed
    pub fn remove_attribute_ns(
        &mut self,
        element: NodeId,
        namespace_uri: Option<&str>,
        local_name: &str,
    ) -> bool {
        let Some(attr) = self.get_attribute_node_ns(element, namespace_uri, local_name) else {
            return false;
        };
        if let DomNode::Element(data) = self.node_mut(element) {
            data.attributes.retain(|id| *id != attr);
        }
        if let DomNode::Attr(data) = self.node_mut(attr) {
            data.owner = None;
        }
        true
    }

    /// DOM `getElementsByTagNameNS`; `*` matches any namespace or name.
    ///
    /// An empty namespace string matches elements in no namespace.
    pub fn get_elements_by_tag_name_ns(
        &self,
        root: NodeId,
        namespace_uri: &str,
        local_name: &str,
    ) -> Vec<NodeId> {
        root.descendants(&self.arena)
            .skip(1)
            .filter(|id| {
                self.element(*id).is_some_and(|element| {
                    (namespace_uri == "*"
                        || element.namespace_uri.as_deref().unwrap_or("") == namespace_uri)
                        && (local_name == "*" || element.local_name == local_name)
                })
            })
            .collect()
    }
}
