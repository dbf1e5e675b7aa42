//! Documents: the owner of a backend tree and its per-document state

use crate::builder::Builder;
use crate::node::Node;
use std::cell::{Ref, RefCell};
use std::fmt;
use xml_adapter_traits::{
    names::Resolution, AutoPrefixes, Error, Feature, NamespaceBinding, RawName, ResolvedName,
    Result, XmlAdapter,
};

/// Mutable state shared by every node of a document
pub(crate) struct DocState<A> {
    pub(crate) adapter: A,
    pub(crate) prefixes: AutoPrefixes,
}

/// An XML document held by one backend.
///
/// The document owns the whole tree. [`Node`]s borrow the document, so none
/// of them can outlive it; mutation goes through a `RefCell`, which makes a
/// document usable from one thread only.
pub struct Document<A: XmlAdapter> {
    state: RefCell<DocState<A>>,
}

impl<A: XmlAdapter> Document<A> {
    /// Create a document whose root element is named `root_name`.
    ///
    /// `root_name` may be plain, prefixed or Clark notation. With `ns_uri`
    /// the root is placed in that namespace and declares it as the default.
    pub fn new(root_name: &str, ns_uri: Option<&str>) -> Result<Self> {
        let resolution = resolve_root(root_name, ns_uri)?;
        let adapter = A::create_document(&resolution.name, &resolution.declare_here)?;
        tracing::trace!(backend = adapter.backend_name(), root = %resolution.name, "created document");
        Ok(Self::from_adapter(adapter))
    }

    /// Wrap an adapter that already holds a document
    pub fn from_adapter(adapter: A) -> Self {
        Self {
            state: RefCell::new(DocState {
                adapter,
                prefixes: AutoPrefixes::new(),
            }),
        }
    }

    /// Give back the adapter, ending the document's borrow of it
    pub fn into_adapter(self) -> A {
        self.state.into_inner().adapter
    }

    /// Read access to the adapter
    pub fn adapter(&self) -> Ref<'_, A> {
        Ref::map(self.state.borrow(), |state| &state.adapter)
    }

    /// Short name of the backend holding this document
    pub fn backend(&self) -> &'static str {
        self.with(|adapter| adapter.backend_name())
    }

    /// Whether the backend supports an optional capability
    pub fn supports(&self, feature: Feature) -> bool {
        self.with(|adapter| adapter.supports_feature(feature))
    }

    /// Number of prefixes synthesized in this document so far
    pub fn auto_prefixes_issued(&self) -> u32 {
        self.state.borrow().prefixes.issued()
    }

    /// The document node
    pub fn node(&self) -> Node<'_, A> {
        let handle = self.with(|adapter| adapter.document());
        Node::new(self, handle)
    }

    /// The root element
    pub fn root(&self) -> Node<'_, A> {
        let handle = self.with(|adapter| adapter.root_element());
        Node::new(self, handle)
    }

    /// A builder anchored at the root element
    pub fn builder(&self) -> Builder<'_, A> {
        Builder::new(self.root())
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&A) -> R) -> R {
        f(&self.state.borrow().adapter)
    }

    pub(crate) fn with_mut<R>(&self, f: impl FnOnce(&mut DocState<A>) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }
}

impl<A: XmlAdapter> fmt::Debug for Document<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.root();
        f.debug_struct("Document")
            .field("backend", &self.backend())
            .field("root", &root.name())
            .finish()
    }
}

/// Resolve a root element name; there are no ancestors to consult
fn resolve_root(raw: &str, ns_uri: Option<&str>) -> Result<Resolution> {
    let (prefix, local, uri) = match (RawName::parse(raw)?, ns_uri) {
        (RawName::Local(local), uri) => (None, local, uri),
        (RawName::Clark { uri, local }, _) => (None, local, Some(uri)),
        (RawName::Prefixed { prefix, local }, Some(uri)) => (Some(prefix), local, Some(uri)),
        (RawName::Prefixed { prefix, .. }, None) => return Err(Error::undefined_prefix(prefix)),
    };
    let uri = uri.filter(|uri| !uri.is_empty());
    let mut declare_here = Vec::new();
    if let Some(uri) = uri {
        declare_here.push(NamespaceBinding::default_ns(uri));
        if prefix.is_some() {
            declare_here.push(NamespaceBinding::new(prefix, uri));
        }
    }
    Ok(Resolution {
        name: ResolvedName::new(prefix, local, uri),
        declare_here,
        declare_on_root: None,
    })
}
