//! An ElementTree style document tree.
//!
//! Only elements, comments and processing instructions are nodes. Character
//! data lives in string slots: `text` is the content before an element's
//! first child, `tail` the content between a node and its next sibling. An
//! element's namespace map is fixed when the element is made, the way
//! libxml2 fixes `nsDef`; tags and attribute keys are `{uri}local` names.
//! Removed nodes are only detached, so the arena keeps them until the tree
//! is dropped.

use indextree::{Arena, NodeId};
use std::fmt;

/// Errors raised by tree mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EtreeError {
    #[error("cannot insert here: {0}")]
    Hierarchy(String),

    #[error("not a child of this node: {0}")]
    NotAChild(String),

    #[error("{0} is not an element")]
    NotAnElement(String),
}

/// A `{namespace}local` name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            local: local.to_string(),
        }
    }

    /// Parse `{uri}local` or a bare `local`
    pub fn from_clark(text: &str) -> Self {
        match text.strip_prefix('{').and_then(|rest| rest.split_once('}')) {
            Some((namespace, local)) => Self::new(Some(namespace), local),
            None => Self::new(None, text),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{{{}}}{}", namespace, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// An attribute entry on an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub prefix: Option<String>,
    pub value: String,
}

/// Element payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: QName,
    pub prefix: Option<String>,
    nsmap: Vec<(Option<String>, String)>,
    pub attrib: Vec<Attribute>,
    pub text: Option<String>,
    pub tail: Option<String>,
}

impl Element {
    /// Namespace definitions made when the element was created
    pub fn nsmap(&self) -> &[(Option<String>, String)] {
        &self.nsmap
    }
}

/// A node in the tree arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Document,
    Element(Element),
    Comment {
        text: String,
        tail: Option<String>,
    },
    ProcessingInstruction {
        target: String,
        text: String,
        tail: Option<String>,
    },
}

impl Item {
    fn describe(&self) -> String {
        match self {
            Item::Document => "document".to_string(),
            Item::Element(element) => element.tag.to_string(),
            Item::Comment { .. } => "comment".to_string(),
            Item::ProcessingInstruction { target, .. } => format!("<?{}?>", target),
        }
    }
}

/// An owned element tree
#[derive(Debug, Clone)]
pub struct ElementTree {
    arena: Arena<Item>,
    document: NodeId,
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(Item::Document);
        Self { arena, document }
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    /// The root element
    pub fn getroot(&self) -> Option<NodeId> {
        self.document
            .children(&self.arena)
            .find(|id| matches!(self.item(*id), Item::Element(_)))
    }

    pub fn item(&self, id: NodeId) -> &Item {
        self.arena[id].get()
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.item(id) {
            Item::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, EtreeError> {
        let describe = self.item(id).describe();
        match self.arena[id].get_mut() {
            Item::Element(element) => Ok(element),
            _ => Err(EtreeError::NotAnElement(describe)),
        }
    }

    pub fn make_element(
        &mut self,
        tag: QName,
        prefix: Option<&str>,
        nsmap: Vec<(Option<String>, String)>,
    ) -> NodeId {
        self.arena.new_node(Item::Element(Element {
            tag,
            prefix: prefix.map(str::to_string),
            nsmap,
            attrib: Vec::new(),
            text: None,
            tail: None,
        }))
    }

    pub fn make_comment(&mut self, text: &str) -> NodeId {
        self.arena.new_node(Item::Comment {
            text: text.to_string(),
            tail: None,
        })
    }

    pub fn make_pi(&mut self, target: &str, text: &str) -> NodeId {
        self.arena.new_node(Item::ProcessingInstruction {
            target: target.to_string(),
            text: text.to_string(),
            tail: None,
        })
    }

    pub fn getparent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    pub fn getprevious(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].previous_sibling()
    }

    pub fn getnext(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].next_sibling()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        id.children(&self.arena).collect()
    }

    /// Elements below `id` in document order, `id` excluded
    pub fn iterdescendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena)
            .skip(1)
            .filter(|node| matches!(self.item(*node), Item::Element(_)))
    }

    /// Element text or comment/instruction content
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.item(id) {
            Item::Document => None,
            Item::Element(element) => element.text.as_deref(),
            Item::Comment { text, .. } | Item::ProcessingInstruction { text, .. } => Some(text),
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: Option<String>) {
        match self.arena[id].get_mut() {
            Item::Document => {}
            Item::Element(element) => element.text = value,
            Item::Comment { text, .. } | Item::ProcessingInstruction { text, .. } => {
                *text = value.unwrap_or_default();
            }
        }
    }

    pub fn tail(&self, id: NodeId) -> Option<&str> {
        match self.item(id) {
            Item::Document => None,
            Item::Element(element) => element.tail.as_deref(),
            Item::Comment { tail, .. } | Item::ProcessingInstruction { tail, .. } => {
                tail.as_deref()
            }
        }
    }

    pub fn set_tail(&mut self, id: NodeId, value: Option<String>) {
        match self.arena[id].get_mut() {
            Item::Document => {}
            Item::Element(element) => element.tail = value,
            Item::Comment { tail, .. } | Item::ProcessingInstruction { tail, .. } => *tail = value,
        }
    }

    /// Whether `child` may be placed under `parent`
    pub fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), EtreeError> {
        match (self.item(parent), self.item(child)) {
            (_, Item::Document) => {
                return Err(EtreeError::Hierarchy("a document cannot be a child".to_string()))
            }
            (Item::Comment { .. } | Item::ProcessingInstruction { .. }, _) => {
                return Err(EtreeError::Hierarchy(format!(
                    "{} cannot have children",
                    self.item(parent).describe()
                )))
            }
            (Item::Document, Item::Element(_)) => {
                if self.getroot().is_some_and(|root| root != child) {
                    return Err(EtreeError::Hierarchy(
                        "the document already has a root element".to_string(),
                    ));
                }
            }
            _ => {}
        }
        if parent.ancestors(&self.arena).any(|ancestor| ancestor == child) {
            return Err(EtreeError::Hierarchy(
                "an element cannot be moved into itself".to_string(),
            ));
        }
        Ok(())
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), EtreeError> {
        self.check_insertion(parent, child)?;
        child.detach(&mut self.arena);
        parent
            .checked_append(child, &mut self.arena)
            .map_err(|e| EtreeError::Hierarchy(e.to_string()))
    }

    /// Insert `child` as the sibling immediately before `reference`
    pub fn addprevious(&mut self, reference: NodeId, child: NodeId) -> Result<(), EtreeError> {
        let parent = self
            .getparent(reference)
            .ok_or_else(|| EtreeError::NotAChild(self.item(reference).describe()))?;
        self.check_insertion(parent, child)?;
        child.detach(&mut self.arena);
        reference
            .checked_insert_before(child, &mut self.arena)
            .map_err(|e| EtreeError::Hierarchy(e.to_string()))
    }

    /// Insert `child` as the sibling immediately after `reference`
    pub fn addnext(&mut self, reference: NodeId, child: NodeId) -> Result<(), EtreeError> {
        let parent = self
            .getparent(reference)
            .ok_or_else(|| EtreeError::NotAChild(self.item(reference).describe()))?;
        self.check_insertion(parent, child)?;
        child.detach(&mut self.arena);
        reference
            .checked_insert_after(child, &mut self.arena)
            .map_err(|e| EtreeError::Hierarchy(e.to_string()))
    }

    /// Detach `child` from `parent`; its tail goes with it
    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> Result<(), EtreeError> {
        if self.getparent(child) != Some(parent) {
            return Err(EtreeError::NotAChild(self.item(child).describe()));
        }
        child.detach(&mut self.arena);
        Ok(())
    }

    pub fn get(&self, id: NodeId, name: &QName) -> Option<&Attribute> {
        self.element(id)?
            .attrib
            .iter()
            .find(|attribute| &attribute.name == name)
    }

    /// Set an attribute, keeping its position when it already exists
    pub fn set(
        &mut self,
        id: NodeId,
        name: QName,
        prefix: Option<&str>,
        value: &str,
    ) -> Result<(), EtreeError> {
        let element = self.element_mut(id)?;
        match element.attrib.iter_mut().find(|attribute| attribute.name == name) {
            Some(existing) => {
                existing.prefix = prefix.map(str::to_string);
                existing.value = value.to_string();
            }
            None => element.attrib.push(Attribute {
                name,
                prefix: prefix.map(str::to_string),
                value: value.to_string(),
            }),
        }
        Ok(())
    }

    /// Delete an attribute; returns whether it existed
    pub fn del_attribute(&mut self, id: NodeId, name: &QName) -> bool {
        let Ok(element) = self.element_mut(id) else {
            return false;
        };
        let before = element.attrib.len();
        element.attrib.retain(|attribute| &attribute.name != name);
        element.attrib.len() != before
    }
}
