//! XmlAdapter implementation for the ElementTree backend
//!
//! The tree keeps character data in `text`/`tail` strings, so text nodes seen
//! through this adapter are synthesized: a [`EtreeHandle::Text`] names the
//! string slot it reads from. Text created with `create_text` waits in a
//! pending slab until it is attached, at which point it is folded into the
//! slot that holds the character data at that position.

use crate::etree::{ElementTree, EtreeError, Item, QName};
use indextree::NodeId;
use xml_adapter_traits::{
    check_comment, check_instruction, Error, Feature, NamespaceBinding, NodeKind, ResolvedName,
    Result, XmlAdapter, XMLNS_URI,
};

const BACKEND: &str = "etree";

impl From<EtreeError> for Error {
    fn from(err: EtreeError) -> Self {
        match err {
            EtreeError::NotAChild(msg) => Error::NodeNotFound(msg),
            EtreeError::Hierarchy(msg) | EtreeError::NotAnElement(msg) => Error::NodeAccess(msg),
        }
    }
}

/// Which string slot of its owner a text node reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextSlot {
    /// Content before the owner's first child
    Text,
    /// Content after the owner, before its next sibling
    Tail,
}

/// Handle to a node seen through the adapter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EtreeHandle {
    /// Document, element, comment or processing instruction
    Node(NodeId),
    /// Character data held in a string slot
    Text { owner: NodeId, slot: TextSlot },
    /// Attribute of an element, creation-time namespace definitions included
    Attribute { element: NodeId, name: QName },
    /// Text created but not yet attached
    Pending(usize),
}

/// Attribute key of the declaration for `prefix`
fn declaration_key(prefix: Option<&str>) -> QName {
    QName::new(Some(XMLNS_URI), prefix.unwrap_or("xmlns"))
}

/// The prefix an attribute key declares, if it is a declaration
fn declared_prefix(name: &QName) -> Option<Option<&str>> {
    if name.namespace.as_deref() != Some(XMLNS_URI) {
        return None;
    }
    if name.local == "xmlns" {
        Some(None)
    } else {
        Some(Some(name.local.as_str()))
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|text| !text.is_empty())
}

/// Wrapper around [`ElementTree`] that implements the XmlAdapter trait
#[derive(Debug, Clone, Default)]
pub struct EtreeAdapter {
    pub(crate) tree: ElementTree,
    pending: Vec<Option<String>>,
}

impl EtreeAdapter {
    /// Wrap an existing tree
    pub fn from_tree(tree: ElementTree) -> Self {
        Self {
            tree,
            pending: Vec::new(),
        }
    }

    /// Get a reference to the underlying tree
    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    /// Get a mutable reference to the underlying tree
    pub fn tree_mut(&mut self) -> &mut ElementTree {
        &mut self.tree
    }

    fn node_id(&self, handle: &EtreeHandle) -> Result<NodeId> {
        match handle {
            EtreeHandle::Node(id) => Ok(*id),
            other => Err(Error::node_access(format!(
                "{} cannot hold children",
                self.name(other)
            ))),
        }
    }

    fn element_id(&self, handle: &EtreeHandle) -> Result<NodeId> {
        match handle {
            EtreeHandle::Node(id) if self.tree.element(*id).is_some() => Ok(*id),
            other => Err(Error::node_access(format!(
                "{} is not an element",
                self.name(other)
            ))),
        }
    }

    fn slot(&self, owner: NodeId, slot: TextSlot) -> Option<&str> {
        match slot {
            TextSlot::Text => self.tree.text(owner),
            TextSlot::Tail => self.tree.tail(owner),
        }
    }

    fn set_slot(&mut self, owner: NodeId, slot: TextSlot, value: Option<String>) {
        match slot {
            TextSlot::Text => self.tree.set_text(owner, value),
            TextSlot::Tail => self.tree.set_tail(owner, value),
        }
    }

    fn is_child_of(&self, parent: NodeId, handle: &EtreeHandle) -> bool {
        match handle {
            EtreeHandle::Node(id) => self.tree.getparent(*id) == Some(parent),
            EtreeHandle::Text {
                owner,
                slot: TextSlot::Text,
            } => *owner == parent,
            EtreeHandle::Text {
                owner,
                slot: TextSlot::Tail,
            } => self.tree.getparent(*owner) == Some(parent),
            EtreeHandle::Attribute { .. } | EtreeHandle::Pending(_) => false,
        }
    }

    /// The slot holding character data just before `before` (or at the end)
    fn text_position(
        &self,
        parent: NodeId,
        before: Option<&EtreeHandle>,
    ) -> (NodeId, TextSlot, bool) {
        match before {
            None => match self.tree.children(parent).last() {
                Some(last) => (*last, TextSlot::Tail, true),
                None => (parent, TextSlot::Text, true),
            },
            Some(EtreeHandle::Text { owner, slot }) => (*owner, *slot, false),
            Some(EtreeHandle::Node(sibling)) => match self.tree.getprevious(*sibling) {
                Some(previous) => (previous, TextSlot::Tail, true),
                None => (parent, TextSlot::Text, true),
            },
            Some(EtreeHandle::Attribute { .. } | EtreeHandle::Pending(_)) => {
                (parent, TextSlot::Text, true)
            }
        }
    }

    fn insert_text(
        &mut self,
        parent: NodeId,
        pending: usize,
        before: Option<&EtreeHandle>,
    ) -> Result<EtreeHandle> {
        if self.tree.element(parent).is_none() {
            return Err(Error::node_access(format!(
                "{} cannot hold text",
                self.name(&EtreeHandle::Node(parent))
            )));
        }
        let text = self
            .pending
            .get_mut(pending)
            .and_then(Option::take)
            .ok_or_else(|| Error::node_access("text node is already attached"))?;
        let (owner, slot, at_end) = self.text_position(parent, before);
        let current = self.slot(owner, slot).unwrap_or_default();
        let merged = if at_end {
            format!("{}{}", current, text)
        } else {
            format!("{}{}", text, current)
        };
        self.set_slot(owner, slot, Some(merged));
        tracing::trace!(owner = ?owner, slot = ?slot, "folded text into slot");
        Ok(EtreeHandle::Text { owner, slot })
    }

    fn insert_node(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<&EtreeHandle>,
    ) -> Result<EtreeHandle> {
        if before == Some(&EtreeHandle::Node(child)) {
            return Ok(EtreeHandle::Node(child));
        }
        self.tree.check_insertion(parent, child)?;
        if let Some(current) = self.tree.getparent(child) {
            self.detach(current, child)?;
        }
        match before {
            None => self.tree.append(parent, child)?,
            Some(EtreeHandle::Node(sibling)) => self.tree.addprevious(*sibling, child)?,
            Some(EtreeHandle::Text {
                owner,
                slot: TextSlot::Text,
            }) => {
                match self.tree.children(*owner).first() {
                    Some(first) => self.tree.addprevious(*first, child)?,
                    None => self.tree.append(*owner, child)?,
                }
                let moved = self.tree.text(*owner).map(str::to_string);
                self.tree.set_text(*owner, None);
                self.tree.set_tail(child, moved);
            }
            Some(EtreeHandle::Text {
                owner,
                slot: TextSlot::Tail,
            }) => {
                self.tree.addnext(*owner, child)?;
                let moved = self.tree.tail(*owner).map(str::to_string);
                self.tree.set_tail(*owner, None);
                self.tree.set_tail(child, moved);
            }
            Some(EtreeHandle::Attribute { .. } | EtreeHandle::Pending(_)) => {
                return Err(Error::not_found("reference node is not a child"));
            }
        }
        tracing::trace!(parent = ?parent, child = ?child, "attached etree node");
        Ok(EtreeHandle::Node(child))
    }

    /// Detach `child`, leaving its tail text in place
    fn detach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.tree.getparent(child) != Some(parent) {
            return Err(Error::not_found(format!(
                "{} is not a child of {}",
                self.name(&EtreeHandle::Node(child)),
                self.name(&EtreeHandle::Node(parent))
            )));
        }
        if let Some(tail) = non_empty(self.tree.tail(child)).map(str::to_string) {
            let (owner, slot) = match self.tree.getprevious(child) {
                Some(previous) => (previous, TextSlot::Tail),
                None => (parent, TextSlot::Text),
            };
            let merged = format!("{}{}", self.slot(owner, slot).unwrap_or_default(), tail);
            self.set_slot(owner, slot, Some(merged));
        }
        self.tree.set_tail(child, None);
        self.tree.remove(parent, child)?;
        Ok(())
    }

    fn nsmap_uri(&self, element: NodeId, prefix: Option<&str>) -> Option<&str> {
        self.tree
            .element(element)?
            .nsmap()
            .iter()
            .find(|(bound, _)| bound.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
    }
}

impl XmlAdapter for EtreeAdapter {
    type Handle = EtreeHandle;

    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn create_document(root: &ResolvedName, declarations: &[NamespaceBinding]) -> Result<Self> {
        let mut adapter = Self::default();
        let element = adapter.create_element(root, declarations)?;
        let root = adapter.node_id(&element)?;
        let document = adapter.tree.document();
        adapter.tree.append(document, root)?;
        Ok(adapter)
    }

    fn document(&self) -> EtreeHandle {
        EtreeHandle::Node(self.tree.document())
    }

    fn root_element(&self) -> EtreeHandle {
        EtreeHandle::Node(self.tree.getroot().unwrap_or_else(|| self.tree.document()))
    }

    fn kind(&self, node: &EtreeHandle) -> NodeKind {
        match node {
            EtreeHandle::Node(id) => match self.tree.item(*id) {
                Item::Document => NodeKind::Document,
                Item::Element(_) => NodeKind::Element,
                Item::Comment { .. } => NodeKind::Comment,
                Item::ProcessingInstruction { .. } => NodeKind::ProcessingInstruction,
            },
            EtreeHandle::Text { .. } | EtreeHandle::Pending(_) => NodeKind::Text,
            EtreeHandle::Attribute { .. } => NodeKind::Attribute,
        }
    }

    fn create_element(
        &mut self,
        name: &ResolvedName,
        declarations: &[NamespaceBinding],
    ) -> Result<EtreeHandle> {
        let nsmap = declarations
            .iter()
            .map(|binding| (binding.prefix.clone(), binding.uri.clone()))
            .collect();
        let tag = QName::new(name.namespace_uri.as_deref(), &name.local_name);
        Ok(EtreeHandle::Node(self.tree.make_element(
            tag,
            name.prefix.as_deref(),
            nsmap,
        )))
    }

    fn create_text(&mut self, text: &str) -> Result<EtreeHandle> {
        self.pending.push(Some(text.to_string()));
        Ok(EtreeHandle::Pending(self.pending.len() - 1))
    }

    fn create_comment(&mut self, text: &str) -> Result<EtreeHandle> {
        check_comment(text)?;
        Ok(EtreeHandle::Node(self.tree.make_comment(text)))
    }

    fn create_instruction(&mut self, target: &str, data: &str) -> Result<EtreeHandle> {
        check_instruction(target, data)?;
        Ok(EtreeHandle::Node(self.tree.make_pi(target, data)))
    }

    fn create_cdata(&mut self, _text: &str) -> Result<EtreeHandle> {
        Err(Error::unsupported(BACKEND, "CDATA sections"))
    }

    fn parent(&self, node: &EtreeHandle) -> Option<EtreeHandle> {
        match node {
            EtreeHandle::Node(id) => self.tree.getparent(*id).map(EtreeHandle::Node),
            EtreeHandle::Text {
                owner,
                slot: TextSlot::Text,
            } => Some(EtreeHandle::Node(*owner)),
            EtreeHandle::Text {
                owner,
                slot: TextSlot::Tail,
            } => self.tree.getparent(*owner).map(EtreeHandle::Node),
            EtreeHandle::Attribute { element, .. } => Some(EtreeHandle::Node(*element)),
            EtreeHandle::Pending(_) => None,
        }
    }

    fn children(&self, node: &EtreeHandle) -> Vec<EtreeHandle> {
        let EtreeHandle::Node(id) = node else {
            return Vec::new();
        };
        let mut children = Vec::new();
        let is_element = self.tree.element(*id).is_some();
        if is_element && non_empty(self.tree.text(*id)).is_some() {
            children.push(EtreeHandle::Text {
                owner: *id,
                slot: TextSlot::Text,
            });
        }
        for child in self.tree.children(*id) {
            children.push(EtreeHandle::Node(child));
            if is_element && non_empty(self.tree.tail(child)).is_some() {
                children.push(EtreeHandle::Text {
                    owner: child,
                    slot: TextSlot::Tail,
                });
            }
        }
        children
    }

    fn local_name(&self, node: &EtreeHandle) -> String {
        match node {
            EtreeHandle::Node(id) => match self.tree.item(*id) {
                Item::Document => "#document".to_string(),
                Item::Element(element) => element.tag.local.clone(),
                Item::Comment { .. } => "#comment".to_string(),
                Item::ProcessingInstruction { target, .. } => target.clone(),
            },
            EtreeHandle::Text { .. } | EtreeHandle::Pending(_) => "#text".to_string(),
            EtreeHandle::Attribute { name, .. } => name.local.clone(),
        }
    }

    fn prefix(&self, node: &EtreeHandle) -> Option<String> {
        match node {
            EtreeHandle::Node(id) => self.tree.element(*id)?.prefix.clone(),
            EtreeHandle::Attribute { element, name } => match self.tree.get(*element, name) {
                Some(attribute) => attribute.prefix.clone(),
                None => match declared_prefix(name)? {
                    Some(_) => Some("xmlns".to_string()),
                    None => None,
                },
            },
            EtreeHandle::Text { .. } | EtreeHandle::Pending(_) => None,
        }
    }

    fn namespace_uri(&self, node: &EtreeHandle) -> Option<String> {
        match node {
            EtreeHandle::Node(id) => self.tree.element(*id)?.tag.namespace.clone(),
            EtreeHandle::Attribute { name, .. } => name.namespace.clone(),
            EtreeHandle::Text { .. } | EtreeHandle::Pending(_) => None,
        }
    }

    fn value(&self, node: &EtreeHandle) -> Option<String> {
        match node {
            EtreeHandle::Node(id) => match self.tree.item(*id) {
                Item::Document | Item::Element(_) => None,
                Item::Comment { text, .. } | Item::ProcessingInstruction { text, .. } => {
                    Some(text.clone())
                }
            },
            EtreeHandle::Text { owner, slot } => {
                Some(self.slot(*owner, *slot).unwrap_or_default().to_string())
            }
            EtreeHandle::Pending(index) => self.pending.get(*index).cloned().flatten(),
            EtreeHandle::Attribute { element, name } => match self.tree.get(*element, name) {
                Some(attribute) => Some(attribute.value.clone()),
                None => self
                    .nsmap_uri(*element, declared_prefix(name)?)
                    .map(str::to_string),
            },
        }
    }

    fn set_value(&mut self, node: &EtreeHandle, value: &str) -> Result<()> {
        match node {
            EtreeHandle::Node(id) => match self.tree.item(*id) {
                Item::Document | Item::Element(_) => Err(Error::node_access(format!(
                    "{} has no value",
                    self.name(node)
                ))),
                Item::Comment { .. } => {
                    check_comment(value)?;
                    self.tree.set_text(*id, Some(value.to_string()));
                    Ok(())
                }
                Item::ProcessingInstruction { target, .. } => {
                    check_instruction(target, value)?;
                    self.tree.set_text(*id, Some(value.to_string()));
                    Ok(())
                }
            },
            EtreeHandle::Text { owner, slot } => {
                self.set_slot(*owner, *slot, Some(value.to_string()));
                Ok(())
            }
            EtreeHandle::Pending(index) => match self.pending.get_mut(*index) {
                Some(Some(text)) => {
                    *text = value.to_string();
                    Ok(())
                }
                _ => Err(Error::node_access("text node is already attached")),
            },
            EtreeHandle::Attribute { element, name } => {
                if let Some(attribute) = self.tree.get(*element, name) {
                    let prefix = attribute.prefix.clone();
                    self.tree
                        .set(*element, name.clone(), prefix.as_deref(), value)?;
                    return Ok(());
                }
                if declared_prefix(name).is_some() {
                    return Err(Error::unsupported(BACKEND, "changing a namespace map"));
                }
                Err(Error::not_found(format!("attribute {}", name)))
            }
        }
    }

    fn attributes(&self, element: &EtreeHandle) -> Vec<EtreeHandle> {
        let EtreeHandle::Node(id) = element else {
            return Vec::new();
        };
        let Some(data) = self.tree.element(*id) else {
            return Vec::new();
        };
        let native = data.nsmap().iter().map(|(prefix, _)| declaration_key(prefix.as_deref()));
        let attrib = data.attrib.iter().map(|attribute| attribute.name.clone());
        native
            .chain(attrib)
            .map(|name| EtreeHandle::Attribute { element: *id, name })
            .collect()
    }

    fn set_attribute(
        &mut self,
        element: &EtreeHandle,
        name: &ResolvedName,
        value: &str,
    ) -> Result<()> {
        let id = self.element_id(element)?;
        if let Some(prefix) = name.declared_prefix() {
            if let Some(bound) = self.nsmap_uri(id, prefix) {
                if bound == value {
                    return Ok(());
                }
                return Err(Error::unsupported(BACKEND, "rebinding a prefix in a namespace map"));
            }
        }
        let key = QName::new(name.namespace_uri.as_deref(), &name.local_name);
        self.tree.set(id, key, name.prefix.as_deref(), value)?;
        Ok(())
    }

    fn remove_attribute(&mut self, element: &EtreeHandle, name: &ResolvedName) -> Result<()> {
        let id = self.element_id(element)?;
        let key = QName::new(name.namespace_uri.as_deref(), &name.local_name);
        if !self.tree.del_attribute(id, &key) {
            if let Some(prefix) = name.declared_prefix() {
                if self.nsmap_uri(id, prefix).is_some() {
                    return Err(Error::unsupported(BACKEND, "removing from a namespace map"));
                }
            }
        }
        Ok(())
    }

    fn add_child(
        &mut self,
        parent: &EtreeHandle,
        child: &EtreeHandle,
        before: Option<&EtreeHandle>,
    ) -> Result<EtreeHandle> {
        let parent_id = self.node_id(parent)?;
        if let Some(before) = before {
            if !self.is_child_of(parent_id, before) {
                return Err(Error::not_found("reference node is not a child"));
            }
        }
        match child {
            EtreeHandle::Pending(index) => self.insert_text(parent_id, *index, before),
            EtreeHandle::Node(id) => self.insert_node(parent_id, *id, before),
            other => Err(Error::node_access(format!(
                "{} is already part of the tree",
                self.name(other)
            ))),
        }
    }

    fn remove_child(&mut self, parent: &EtreeHandle, child: &EtreeHandle) -> Result<()> {
        let parent_id = self.node_id(parent)?;
        match child {
            EtreeHandle::Node(id) => {
                if parent_id == self.tree.document() && self.tree.getroot() == Some(*id) {
                    return Err(Error::node_access("the root element cannot be removed"));
                }
                self.detach(parent_id, *id)
            }
            EtreeHandle::Text { owner, slot } if self.is_child_of(parent_id, child) => {
                self.set_slot(*owner, *slot, None);
                Ok(())
            }
            other => Err(Error::not_found(format!(
                "{} is not a child of {}",
                self.name(other),
                self.name(parent)
            ))),
        }
    }

    fn namespace_bindings(&self, element: &EtreeHandle) -> Vec<NamespaceBinding> {
        let EtreeHandle::Node(id) = element else {
            return Vec::new();
        };
        let Some(data) = self.tree.element(*id) else {
            return Vec::new();
        };
        let native = data
            .nsmap()
            .iter()
            .map(|(prefix, uri)| NamespaceBinding::new(prefix.as_deref(), uri));
        let declared = data.attrib.iter().filter_map(|attribute| {
            let prefix = declared_prefix(&attribute.name)?;
            Some(NamespaceBinding::new(prefix, &attribute.value))
        });
        native.chain(declared).collect()
    }

    fn supported_features(&self) -> Vec<Feature> {
        Vec::new()
    }

    fn find_descendant_elements(
        &self,
        node: &EtreeHandle,
        name: &str,
        ns_uri: &str,
    ) -> Vec<EtreeHandle> {
        let EtreeHandle::Node(id) = node else {
            return Vec::new();
        };
        self.tree
            .iterdescendants(*id)
            .filter(|descendant| {
                self.tree.element(*descendant).is_some_and(|element| {
                    (ns_uri == "*" || element.tag.namespace.as_deref().unwrap_or("") == ns_uri)
                        && (name == "*" || element.tag.local == name)
                })
            })
            .map(EtreeHandle::Node)
            .collect()
    }
}
