//! The uniform node facade over backend handles

use crate::document::Document;
use std::fmt;
use xml_adapter_traits::{
    names, Error, NamespaceBinding, NodeKind, RawName, ResolvedName, Result, XmlAdapter,
};

/// A node of a [`Document`].
///
/// Every accessor asks the adapter afresh; nothing is cached, so a node
/// always reflects the current tree.
pub struct Node<'d, A: XmlAdapter> {
    doc: &'d Document<A>,
    handle: A::Handle,
}

impl<'d, A: XmlAdapter> Clone for Node<'d, A> {
    fn clone(&self) -> Self {
        Self {
            doc: self.doc,
            handle: self.handle.clone(),
        }
    }
}

impl<'d, A: XmlAdapter> PartialEq for Node<'d, A> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.handle == other.handle
    }
}

impl<'d, A: XmlAdapter> Eq for Node<'d, A> {}

impl<'d, A: XmlAdapter> fmt::Debug for Node<'d, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("handle", &self.handle)
            .finish()
    }
}

impl<'d, A: XmlAdapter> Node<'d, A> {
    pub(crate) fn new(doc: &'d Document<A>, handle: A::Handle) -> Self {
        Self { doc, handle }
    }

    fn wrap(&self, handle: A::Handle) -> Self {
        Self::new(self.doc, handle)
    }

    /// The backend-native handle
    pub fn handle(&self) -> &A::Handle {
        &self.handle
    }

    /// The document this node belongs to
    pub fn document(&self) -> &'d Document<A> {
        self.doc
    }

    /// Short name of the backend holding this node
    pub fn backend(&self) -> &'static str {
        self.doc.backend()
    }

    pub fn kind(&self) -> NodeKind {
        self.doc.with(|a| a.kind(&self.handle))
    }

    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    /// Qualified name; `#text`, `#comment` etc. for unnamed kinds
    pub fn name(&self) -> String {
        self.doc.with(|a| a.name(&self.handle))
    }

    pub fn local_name(&self) -> String {
        self.doc.with(|a| a.local_name(&self.handle))
    }

    pub fn prefix(&self) -> Option<String> {
        self.doc.with(|a| a.prefix(&self.handle))
    }

    pub fn namespace_uri(&self) -> Option<String> {
        self.doc.with(|a| a.namespace_uri(&self.handle))
    }

    /// Node value; `None` for elements and documents
    pub fn value(&self) -> Option<String> {
        self.doc.with(|a| a.value(&self.handle))
    }

    pub fn set_value(&self, value: &str) -> Result<()> {
        self.doc
            .with_mut(|state| state.adapter.set_value(&self.handle, value))
    }

    // ==================== Navigation ====================

    pub fn parent(&self) -> Option<Self> {
        self.doc
            .with(|a| a.parent(&self.handle))
            .map(|handle| self.wrap(handle))
    }

    pub fn children(&self) -> Vec<Self> {
        self.doc
            .with(|a| a.children(&self.handle))
            .into_iter()
            .map(|handle| self.wrap(handle))
            .collect()
    }

    /// Element children only
    pub fn child_elements(&self) -> Vec<Self> {
        self.children()
            .into_iter()
            .filter(|child| child.is_element())
            .collect()
    }

    /// Ancestors nearest first, ending with the document node
    pub fn ancestors(&self) -> Vec<Self> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while let Some(node) = current {
            current = node.parent();
            ancestors.push(node);
        }
        ancestors
    }

    /// The root element of the document
    pub fn root(&self) -> Self {
        self.doc.root()
    }

    pub fn is_root(&self) -> bool {
        *self == self.root()
    }

    /// Number of element ancestors; the root element has depth 0
    pub fn depth(&self) -> usize {
        self.ancestors()
            .iter()
            .filter(|ancestor| ancestor.is_element())
            .count()
    }

    /// The ancestor `count` steps up, stopping at the root element
    pub fn up(&self, count: usize) -> Self {
        let mut current = self.clone();
        for _ in 0..count {
            match current.parent() {
                Some(parent) if parent.kind() != NodeKind::Document => current = parent,
                _ => break,
            }
        }
        current
    }

    /// The nearest node named `name`, starting at this node, or the root
    /// element when there is none
    pub fn up_to(&self, name: &str) -> Self {
        std::iter::once(self.clone())
            .chain(self.ancestors())
            .filter(|node| node.is_element())
            .find(|node| node.name() == name)
            .unwrap_or_else(|| self.root())
    }

    fn sibling(&self, offset: isize) -> Option<Self> {
        let siblings = self.parent()?.children();
        let position = siblings.iter().position(|sibling| sibling == self)?;
        let target = position.checked_add_signed(offset)?;
        siblings.into_iter().nth(target)
    }

    pub fn previous_sibling(&self) -> Option<Self> {
        self.sibling(-1)
    }

    pub fn next_sibling(&self) -> Option<Self> {
        self.sibling(1)
    }

    /// Concatenated content of the immediate text and CDATA children
    pub fn text(&self) -> String {
        self.children()
            .iter()
            .filter(|child| child.kind().is_character_data())
            .filter_map(|child| child.value())
            .collect()
    }

    // ==================== Attributes ====================

    /// Attribute nodes, namespace declarations included
    pub fn attributes(&self) -> Vec<Self> {
        self.doc
            .with(|a| a.attributes(&self.handle))
            .into_iter()
            .map(|handle| self.wrap(handle))
            .collect()
    }

    /// Find an attribute node by qualified name or `{uri}local`
    pub fn attribute_node(&self, name: &str) -> Option<Self> {
        let handle = self.doc.with(|a| match RawName::parse(name) {
            Ok(RawName::Clark { uri, local }) => {
                a.attribute_ns(&self.handle, Some(uri).filter(|uri| !uri.is_empty()), local)
            }
            _ => a.attribute(&self.handle, name),
        })?;
        Some(self.wrap(handle))
    }

    /// Attribute value by qualified name or `{uri}local`
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attribute_node(name)?.value()
    }

    /// Attribute value by namespace URI and local name
    pub fn attribute_ns(&self, ns_uri: Option<&str>, local_name: &str) -> Option<String> {
        let handle = self
            .doc
            .with(|a| a.attribute_ns(&self.handle, ns_uri, local_name))?;
        self.wrap(handle).value()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute_node(name).is_some()
    }

    /// Set an attribute. Unprefixed names are in no namespace.
    pub fn set_attribute(&self, name: &str, value: &str) -> Result<()> {
        self.set_attribute_ns(name, value, None)
    }

    /// Set an attribute in `ns_uri`, declaring a prefix for it when needed
    pub fn set_attribute_ns(&self, name: &str, value: &str, ns_uri: Option<&str>) -> Result<()> {
        self.set_attributes_ns([(name, value)], ns_uri)
    }

    /// Set several attributes as one change. When any of them fails, the
    /// attributes and declarations already written are restored and no
    /// synthesized prefix is used up.
    pub fn set_attributes_ns<I, K, V>(&self, attributes: I, ns_uri: Option<&str>) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.expect_element("set an attribute on")?;
        let root = self.doc.with(|a| a.root_element());
        self.doc.with_mut(|state| {
            let mut prefixes = state.prefixes.clone();
            let mut journal = AttributeJournal::new();
            let outcome = attributes.into_iter().try_for_each(|(name, value)| {
                let resolution = names::resolve_attribute(
                    &state.adapter,
                    &self.handle,
                    name.as_ref(),
                    ns_uri,
                    &mut prefixes,
                )?;
                for binding in &resolution.declare_here {
                    journal.set(
                        &mut state.adapter,
                        &self.handle,
                        binding.attribute_name(),
                        &binding.uri,
                    )?;
                }
                if let Some(binding) = &resolution.declare_on_root {
                    journal.set(&mut state.adapter, &root, binding.attribute_name(), &binding.uri)?;
                }
                journal.set(&mut state.adapter, &self.handle, resolution.name, value.as_ref())
            });
            match outcome {
                Ok(()) => {
                    state.prefixes = prefixes;
                    Ok(())
                }
                Err(err) => {
                    journal.undo(&mut state.adapter);
                    Err(err)
                }
            }
        })
    }

    /// Remove an attribute by qualified name or `{uri}local`; a missing
    /// attribute is ignored
    pub fn remove_attribute(&self, name: &str) -> Result<()> {
        let Some(attribute) = self.attribute_node(name) else {
            return Ok(());
        };
        let resolved = ResolvedName {
            prefix: attribute.prefix(),
            local_name: attribute.local_name(),
            namespace_uri: attribute.namespace_uri(),
        };
        self.doc
            .with_mut(|state| state.adapter.remove_attribute(&self.handle, &resolved))
    }

    /// Declare `prefix` (or the default namespace) on this element
    pub fn declare_namespace(&self, prefix: Option<&str>, uri: &str) -> Result<()> {
        self.expect_element("declare a namespace on")?;
        if let Some(prefix) = prefix {
            if !matches!(RawName::parse(prefix)?, RawName::Local(_)) {
                return Err(Error::invalid_argument(
                    format!("{:?}", prefix),
                    &["namespace prefix"],
                ));
            }
        }
        let binding = NamespaceBinding::new(prefix, uri);
        self.doc.with_mut(|state| {
            state
                .adapter
                .set_attribute(&self.handle, &binding.attribute_name(), uri)
        })
    }

    /// The namespace URI bound to `prefix` here; `None` asks for the default
    pub fn lookup_namespace_uri(&self, prefix: Option<&str>) -> Option<String> {
        self.doc
            .with(|a| a.resolve_uri_for_prefix(&self.handle, prefix))
    }

    /// The nearest prefix bound to `uri` here; `Some(None)` when `uri` is the
    /// default namespace
    pub fn lookup_prefix(&self, uri: &str) -> Option<Option<String>> {
        self.doc.with(|a| a.resolve_prefix_for_uri(&self.handle, uri))
    }

    // ==================== Mutation ====================

    fn expect_element(&self, action: &str) -> Result<()> {
        match self.kind() {
            NodeKind::Element => Ok(()),
            kind => Err(Error::node_access(format!("cannot {} a {:?} node", action, kind))),
        }
    }

    fn check_same_document(&self, other: &Self) -> Result<()> {
        if std::ptr::eq(self.doc, other.doc) {
            Ok(())
        } else {
            Err(Error::WrongBackend(format!(
                "{} belongs to another document",
                other.name()
            )))
        }
    }

    /// Resolve and create an element, then attach it under `parent`
    fn attach_element(
        &self,
        parent: &A::Handle,
        name: &str,
        ns_uri: Option<&str>,
        before: Option<&A::Handle>,
    ) -> Result<Self> {
        let resolution = self
            .doc
            .with(|a| names::resolve_element(a, parent, name, ns_uri))?;
        let handle = self.doc.with_mut(|state| {
            let element = state
                .adapter
                .create_element(&resolution.name, &resolution.declare_here)?;
            state.adapter.add_child(parent, &element, before)
        })?;
        tracing::trace!(name = %resolution.name, "added element");
        Ok(self.wrap(handle))
    }

    /// Append a child element. Plain names join the in-scope default
    /// namespace; `ns_uri` puts the element in that namespace instead.
    pub fn add_element(&self, name: &str, ns_uri: Option<&str>) -> Result<Self> {
        self.attach_element(&self.handle, name, ns_uri, None)
    }

    /// Insert a new element as the sibling immediately before this node
    pub fn insert_element_before(&self, name: &str, ns_uri: Option<&str>) -> Result<Self> {
        let parent = self
            .parent()
            .ok_or_else(|| Error::node_access(format!("{} has no parent", self.name())))?;
        self.attach_element(&parent.handle, name, ns_uri, Some(&self.handle))
    }

    fn attach(
        &self,
        create: impl FnOnce(&mut A) -> Result<A::Handle>,
        before: Option<&Self>,
    ) -> Result<Self> {
        if let Some(before) = before {
            self.check_same_document(before)?;
        }
        let handle = self.doc.with_mut(|state| {
            let child = create(&mut state.adapter)?;
            state
                .adapter
                .add_child(&self.handle, &child, before.map(|node| &node.handle))
        })?;
        Ok(self.wrap(handle))
    }

    /// Append text. Backends without text node identity merge it with
    /// adjacent text and return the merged node.
    pub fn add_text(&self, text: &str) -> Result<Self> {
        self.attach(|a| a.create_text(text), None)
    }

    /// Insert text immediately before `before`, a child of this node
    pub fn insert_text_before(&self, text: &str, before: &Self) -> Result<Self> {
        self.attach(|a| a.create_text(text), Some(before))
    }

    pub fn add_comment(&self, text: &str) -> Result<Self> {
        self.attach(|a| a.create_comment(text), None)
    }

    pub fn add_instruction(&self, target: &str, data: &str) -> Result<Self> {
        self.attach(|a| a.create_instruction(target, data), None)
    }

    /// Append a CDATA section; fails with `UnsupportedFeature` on backends
    /// without CDATA sections
    pub fn add_cdata(&self, text: &str) -> Result<Self> {
        self.attach(|a| a.create_cdata(text), None)
    }

    /// Move `child`, a node of this document, to the end of this node
    pub fn append_child(&self, child: &Self) -> Result<Self> {
        self.insert_child_before(child, None)
    }

    /// Move `child` to just before `before`, or to the end
    pub fn insert_child_before(&self, child: &Self, before: Option<&Self>) -> Result<Self> {
        self.check_same_document(child)?;
        self.attach(|_| Ok(child.handle.clone()), before)
    }

    /// Detach `child` from this node
    pub fn remove_child(&self, child: &Self) -> Result<()> {
        self.check_same_document(child)?;
        self.doc
            .with_mut(|state| state.adapter.remove_child(&self.handle, &child.handle))
    }

    /// Detach this node from its parent
    pub fn remove(&self) -> Result<()> {
        match self.parent() {
            Some(parent) => parent.remove_child(self),
            None => Err(Error::not_found(format!("{} is not attached", self.name()))),
        }
    }
}

/// Attribute writes made so far, with the values they replaced
struct AttributeJournal<H> {
    entries: Vec<(H, ResolvedName, Option<String>)>,
}

impl<H: Clone> AttributeJournal<H> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn set<A: XmlAdapter<Handle = H>>(
        &mut self,
        adapter: &mut A,
        target: &H,
        name: ResolvedName,
        value: &str,
    ) -> Result<()> {
        let previous = adapter
            .attribute_ns(target, name.namespace_uri.as_deref(), &name.local_name)
            .and_then(|attr| adapter.value(&attr));
        adapter.set_attribute(target, &name, value)?;
        self.entries.push((target.clone(), name, previous));
        Ok(())
    }

    /// Put every written attribute back the way it was, newest first
    fn undo<A: XmlAdapter<Handle = H>>(self, adapter: &mut A) {
        for (target, name, previous) in self.entries.into_iter().rev() {
            let restored = match previous {
                Some(value) => adapter.set_attribute(&target, &name, &value),
                None => adapter.remove_attribute(&target, &name),
            };
            if let Err(err) = restored {
                tracing::warn!(name = %name, error = %err, "attribute change not undone");
            }
        }
    }
}
