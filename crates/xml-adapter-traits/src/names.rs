//! Name parsing and namespace resolution.
//!
//! Names arrive in one of three forms: a plain local name (`Elem`), a
//! prefixed qualified name (`prefix:Elem`) or Clark notation (`{uri}Elem`).
//! Prefixes are resolved by walking from a context node up through its
//! enclosing elements; the nearest binding wins. The per-element bindings
//! come from [`XmlAdapter::namespace_bindings`], so every backend shares the
//! same lookup and shadowing rules.

use crate::error::{Error, Result};
use crate::tree::{NodeKind, XmlAdapter};
use std::fmt;

/// Namespace URI of namespace declaration attributes
pub const XMLNS_URI: &str = "http://www.w3.org/2000/xmlns/";

/// Namespace URI permanently bound to the `xml` prefix
pub const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// Stem of synthesized prefixes
pub const AUTO_PREFIX_STEM: &str = "autoprefix";

const NAME_DELIMITERS: &[char] = &[':', '<', '>', '&', '"', '\'', '{', '}', '=', '/', '!', '?'];

const NAME_SHAPES: &[&str] = &["local-name", "prefix:local-name", "{namespace-uri}local-name"];

/// A raw name split into its syntactic parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawName<'a> {
    /// `Elem`
    Local(&'a str),
    /// `prefix:Elem`
    Prefixed { prefix: &'a str, local: &'a str },
    /// `{uri}Elem`
    Clark { uri: &'a str, local: &'a str },
}

impl<'a> RawName<'a> {
    /// Split a raw name string.
    ///
    /// Fails with `InvalidArgumentType` for empty names, unterminated
    /// Clark notation, names with empty or repeated `:` parts and names
    /// holding characters that cannot appear in markup.
    pub fn parse(raw: &'a str) -> Result<Self> {
        let invalid = || Error::invalid_argument(format!("{:?}", raw), NAME_SHAPES);
        if let Some(rest) = raw.strip_prefix('{') {
            let (uri, local) = rest.split_once('}').ok_or_else(invalid)?;
            if !is_name_part(local) {
                return Err(invalid());
            }
            return Ok(RawName::Clark { uri, local });
        }
        match raw.split_once(':') {
            None if is_name_part(raw) => Ok(RawName::Local(raw)),
            Some((prefix, local)) if is_name_part(prefix) && is_name_part(local) => {
                Ok(RawName::Prefixed { prefix, local })
            }
            _ => Err(invalid()),
        }
    }

    /// The local part of the name
    pub fn local(&self) -> &'a str {
        match *self {
            RawName::Local(local) => local,
            RawName::Prefixed { local, .. } | RawName::Clark { local, .. } => local,
        }
    }
}

/// One `:`-free part of a name: no whitespace or markup delimiters, and
/// not starting with a digit, `-` or `.`
fn is_name_part(part: &str) -> bool {
    let Some(first) = part.chars().next() else {
        return false;
    };
    !matches!(first, '0'..='9' | '-' | '.')
        && !part.contains(|c: char| {
            c.is_whitespace() || c.is_control() || NAME_DELIMITERS.contains(&c)
        })
}

/// A fully resolved name: prefix, local name and namespace URI
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedName {
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace_uri: Option<String>,
}

impl ResolvedName {
    pub fn new(prefix: Option<&str>, local_name: &str, namespace_uri: Option<&str>) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            local_name: local_name.to_string(),
            namespace_uri: namespace_uri.map(str::to_string),
        }
    }

    /// A name with no prefix and no namespace
    pub fn local(local_name: &str) -> Self {
        Self::new(None, local_name, None)
    }

    /// The attribute name that declares `prefix` (`xmlns` or `xmlns:prefix`)
    pub fn declaration(prefix: Option<&str>) -> Self {
        match prefix {
            Some(prefix) => Self::new(Some("xmlns"), prefix, Some(XMLNS_URI)),
            None => Self::new(None, "xmlns", Some(XMLNS_URI)),
        }
    }

    /// `prefix:local` or `local`
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// `{uri}local` or `local`
    pub fn clark(&self) -> String {
        match &self.namespace_uri {
            Some(uri) => format!("{{{}}}{}", uri, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// The prefix this name declares when used as an attribute.
    ///
    /// `Some(None)` for `xmlns`, `Some(Some(p))` for `xmlns:p`, `None`
    /// for ordinary names.
    pub fn declared_prefix(&self) -> Option<Option<&str>> {
        if self.namespace_uri.as_deref() != Some(XMLNS_URI) {
            return None;
        }
        match self.prefix.as_deref() {
            Some("xmlns") => Some(Some(self.local_name.as_str())),
            None if self.local_name == "xmlns" => Some(None),
            _ => None,
        }
    }
}

impl fmt::Display for ResolvedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// A single prefix to URI binding declared on an element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceBinding {
    /// `None` for the default namespace
    pub prefix: Option<String>,
    pub uri: String,
}

impl NamespaceBinding {
    pub fn new(prefix: Option<&str>, uri: &str) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            uri: uri.to_string(),
        }
    }

    /// A default namespace binding (`xmlns="uri"`)
    pub fn default_ns(uri: &str) -> Self {
        Self::new(None, uri)
    }

    /// The declaration attribute name for this binding
    pub fn attribute_name(&self) -> ResolvedName {
        ResolvedName::declaration(self.prefix.as_deref())
    }
}

/// Per-document source of synthesized prefixes.
///
/// Issued prefixes are never handed out again, even once their
/// declarations have been removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoPrefixes {
    next: u32,
}

impl AutoPrefixes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of prefixes issued so far
    pub fn issued(&self) -> u32 {
        self.next
    }

    /// Issue the next prefix for which `taken` returns false
    pub fn next_prefix(&mut self, mut taken: impl FnMut(&str) -> bool) -> String {
        loop {
            let candidate = format!("{}{}", AUTO_PREFIX_STEM, self.next);
            self.next += 1;
            if !taken(&candidate) {
                return candidate;
            }
        }
    }
}

/// A resolved name plus the declarations needed to keep it in scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub name: ResolvedName,
    /// Declarations to place on the node being named
    pub declare_here: Vec<NamespaceBinding>,
    /// A declaration to place on the document's root element
    pub declare_on_root: Option<NamespaceBinding>,
}

impl Resolution {
    fn plain(name: ResolvedName) -> Self {
        Self {
            name,
            declare_here: Vec::new(),
            declare_on_root: None,
        }
    }
}

/// The element whose bindings apply at `node`, followed by its ancestors.
///
/// Text and attribute nodes start from their parent element; the walk stops
/// at the first node that is not an element.
pub fn scope_chain<A: XmlAdapter + ?Sized>(adapter: &A, node: &A::Handle) -> Vec<A::Handle> {
    let mut chain = Vec::new();
    let mut current = match adapter.kind(node) {
        NodeKind::Element => Some(node.clone()),
        NodeKind::Document => None,
        _ => adapter.parent(node),
    };
    while let Some(element) = current {
        if adapter.kind(&element) != NodeKind::Element {
            break;
        }
        current = adapter.parent(&element);
        chain.push(element);
    }
    chain
}

/// Resolve the URI bound to `prefix` at `node`; `None` prefix asks for the
/// default namespace. An empty URI (an `xmlns=""` undeclaration) resolves to
/// no namespace.
pub fn lookup_uri<A: XmlAdapter + ?Sized>(
    adapter: &A,
    node: &A::Handle,
    prefix: Option<&str>,
) -> Option<String> {
    match prefix {
        Some("xmlns") => return Some(XMLNS_URI.to_string()),
        Some("xml") => return Some(XML_URI.to_string()),
        _ => {}
    }
    for element in scope_chain(adapter, node) {
        let binding = adapter
            .namespace_bindings(&element)
            .into_iter()
            .find(|binding| binding.prefix.as_deref() == prefix);
        if let Some(binding) = binding {
            return if binding.uri.is_empty() {
                None
            } else {
                Some(binding.uri)
            };
        }
    }
    None
}

/// Resolve the nearest prefix bound to `uri` at `node` that `accept` allows.
///
/// Bindings further up are skipped when their prefix is re-bound closer to
/// `node`. `Some(None)` means the URI is the default namespace.
pub fn lookup_prefix<A: XmlAdapter + ?Sized>(
    adapter: &A,
    node: &A::Handle,
    uri: &str,
    accept: impl Fn(Option<&str>) -> bool,
) -> Option<Option<String>> {
    if uri == XMLNS_URI {
        return Some(Some("xmlns".to_string()));
    }
    if uri == XML_URI {
        return Some(Some("xml".to_string()));
    }
    let mut shadowed: Vec<Option<String>> = Vec::new();
    for element in scope_chain(adapter, node) {
        let mut seen_here: Vec<Option<String>> = Vec::new();
        for binding in adapter.namespace_bindings(&element) {
            if seen_here.contains(&binding.prefix) {
                continue;
            }
            seen_here.push(binding.prefix.clone());
            if binding.uri == uri
                && !shadowed.contains(&binding.prefix)
                && accept(binding.prefix.as_deref())
            {
                return Some(binding.prefix);
            }
        }
        shadowed.extend(seen_here);
    }
    None
}

/// Resolve a raw name at `context` following the four resolution rules.
///
/// Clark names with no binding for their URI come back unprefixed; plain
/// names come back in no namespace.
pub fn resolve_name<A: XmlAdapter + ?Sized>(
    adapter: &A,
    context: &A::Handle,
    raw: &str,
) -> Result<ResolvedName> {
    if raw == "xmlns" {
        return Ok(ResolvedName::declaration(None));
    }
    match RawName::parse(raw)? {
        RawName::Local(local) => Ok(ResolvedName::local(local)),
        RawName::Clark { uri, local } => {
            let prefix = lookup_prefix(adapter, context, uri, |_| true).flatten();
            Ok(clark_name(prefix.as_deref(), local, uri))
        }
        RawName::Prefixed { prefix, local } => {
            let uri = lookup_uri(adapter, context, Some(prefix))
                .ok_or_else(|| Error::undefined_prefix(prefix))?;
            Ok(ResolvedName::new(Some(prefix), local, Some(&uri)))
        }
    }
}

fn clark_name(prefix: Option<&str>, local: &str, uri: &str) -> ResolvedName {
    if uri.is_empty() {
        return ResolvedName::local(local);
    }
    // a prefix other than xmlns that points at the XMLNS URI is still xmlns
    let prefix = if uri == XMLNS_URI { Some("xmlns") } else { prefix };
    ResolvedName::new(prefix, local, Some(uri))
}

/// Resolve the name of a new element to be placed under `parent`.
///
/// An explicit `ns_uri` puts the element in that namespace and declares it
/// as the element's default. Without one, plain names join the in-scope
/// default namespace and Clark names with an unbound URI declare that URI
/// as the element's own default.
pub fn resolve_element<A: XmlAdapter + ?Sized>(
    adapter: &A,
    parent: &A::Handle,
    raw: &str,
    ns_uri: Option<&str>,
) -> Result<Resolution> {
    let parsed = RawName::parse(raw)?;
    if let Some(uri) = ns_uri {
        let mut resolution = Resolution::plain(ResolvedName::new(None, parsed.local(), Some(uri)));
        resolution.declare_here.push(NamespaceBinding::default_ns(uri));
        if let RawName::Prefixed { prefix, .. } = parsed {
            resolution.name.prefix = Some(prefix.to_string());
            if lookup_uri(adapter, parent, Some(prefix)).as_deref() != Some(uri) {
                resolution
                    .declare_here
                    .push(NamespaceBinding::new(Some(prefix), uri));
            }
        }
        return Ok(resolution);
    }
    match parsed {
        RawName::Local(local) => {
            let default = lookup_uri(adapter, parent, None);
            Ok(Resolution::plain(ResolvedName::new(
                None,
                local,
                default.as_deref(),
            )))
        }
        RawName::Clark { uri, local } => {
            let bound = lookup_prefix(adapter, parent, uri, |_| true);
            let mut resolution = Resolution::plain(clark_name(
                bound.clone().flatten().as_deref(),
                local,
                uri,
            ));
            let in_default = lookup_uri(adapter, parent, None);
            if bound.is_none() && in_default.as_deref().unwrap_or("") != uri {
                resolution.declare_here.push(NamespaceBinding::default_ns(uri));
            }
            Ok(resolution)
        }
        RawName::Prefixed { .. } => Ok(Resolution::plain(resolve_name(adapter, parent, raw)?)),
    }
}

/// Resolve the name of an attribute to be set on `element`.
///
/// Unprefixed attributes are never in the default namespace. An attribute
/// whose URI has no prefixed binding in scope gets a synthesized prefix,
/// declared on the root element.
pub fn resolve_attribute<A: XmlAdapter + ?Sized>(
    adapter: &A,
    element: &A::Handle,
    raw: &str,
    ns_uri: Option<&str>,
    prefixes: &mut AutoPrefixes,
) -> Result<Resolution> {
    if raw == "xmlns" {
        return Ok(Resolution::plain(ResolvedName::declaration(None)));
    }
    let parsed = RawName::parse(raw)?;
    match (parsed, ns_uri) {
        (RawName::Prefixed { prefix: "xmlns", local }, _) => {
            Ok(Resolution::plain(ResolvedName::declaration(Some(local))))
        }
        (RawName::Prefixed { prefix, local }, Some(uri)) => {
            let mut resolution =
                Resolution::plain(ResolvedName::new(Some(prefix), local, Some(uri)));
            if lookup_uri(adapter, element, Some(prefix)).as_deref() != Some(uri) {
                resolution
                    .declare_here
                    .push(NamespaceBinding::new(Some(prefix), uri));
            }
            Ok(resolution)
        }
        (RawName::Prefixed { .. }, None) => {
            Ok(Resolution::plain(resolve_name(adapter, element, raw)?))
        }
        (RawName::Local(local), None) => Ok(Resolution::plain(ResolvedName::local(local))),
        (RawName::Local(local), Some(uri)) => {
            if uri.is_empty() || lookup_uri(adapter, element, None).as_deref() == Some(uri) {
                Ok(Resolution::plain(ResolvedName::local(local)))
            } else {
                Ok(namespaced_attribute(adapter, element, local, uri, prefixes))
            }
        }
        (RawName::Clark { uri, local }, _) => {
            if uri.is_empty() {
                return Ok(Resolution::plain(ResolvedName::local(local)));
            }
            Ok(namespaced_attribute(adapter, element, local, uri, prefixes))
        }
    }
}

fn namespaced_attribute<A: XmlAdapter + ?Sized>(
    adapter: &A,
    element: &A::Handle,
    local: &str,
    uri: &str,
    prefixes: &mut AutoPrefixes,
) -> Resolution {
    if let Some(Some(prefix)) = lookup_prefix(adapter, element, uri, |p| p.is_some()) {
        return Resolution::plain(clark_name(Some(&prefix), local, uri));
    }
    let prefix = prefixes.next_prefix(|candidate| {
        lookup_uri(adapter, element, Some(candidate)).is_some()
    });
    tracing::debug!(prefix = %prefix, uri, "synthesized namespace prefix");
    let binding = NamespaceBinding::new(Some(&prefix), uri);
    Resolution {
        name: ResolvedName::new(Some(&prefix), local, Some(uri)),
        declare_here: Vec::new(),
        declare_on_root: Some(binding),
    }
}
