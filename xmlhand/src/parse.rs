//! Building documents from XML text.
//!
//! The reader drives a backend through the adapter contract only, so the
//! tree it produces is the one a caller would get by building the same
//! content node by node. Namespace declarations are handed to the backend
//! when each element is created.

use crate::document::Document;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use xml_adapter_traits::{
    Error, NamespaceBinding, RawName, ResolvedName, Result, XmlAdapter, XML_URI,
};

/// Options for reading XML text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Drop the layout a pretty printer adds: text that is only whitespace,
    /// and the line break plus indentation that ends text just before a
    /// nested element or processing instruction. Other whitespace is kept.
    pub ignore_layout: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            ignore_layout: true,
        }
    }
}

impl<A: XmlAdapter> Document<A> {
    /// Parse XML text with default options
    pub fn parse(xml: &str) -> Result<Self> {
        Self::parse_with(xml, &ParseOptions::default())
    }

    pub fn parse_with(xml: &str, options: &ParseOptions) -> Result<Self> {
        let adapter = TreeReader::<A>::new(xml, options).read()?;
        Ok(Self::from_adapter(adapter))
    }
}

/// Content seen before the root element
enum Prolog {
    Comment(String),
    Instruction(String, String),
}

struct OpenElement<H> {
    handle: H,
    bindings: Vec<NamespaceBinding>,
}

struct TreeReader<'x, A: XmlAdapter> {
    reader: Reader<&'x [u8]>,
    ignore_layout: bool,
    /// Text read but not attached yet; how much of it is layout depends on
    /// what follows
    pending: Option<String>,
    adapter: Option<A>,
    stack: Vec<OpenElement<A::Handle>>,
    prolog: Vec<Prolog>,
    elements: usize,
}

impl<'x, A: XmlAdapter> TreeReader<'x, A> {
    fn new(xml: &'x str, options: &ParseOptions) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        Self {
            reader,
            ignore_layout: options.ignore_layout,
            pending: None,
            adapter: None,
            stack: Vec::new(),
            prolog: Vec::new(),
            elements: 0,
        }
    }

    fn read(mut self) -> Result<A> {
        loop {
            let position = self.reader.buffer_position();
            let event = self
                .reader
                .read_event()
                .map_err(|err| Error::xml_parse(format!("at byte {}: {}", position, err)))?;
            let before_markup = matches!(event, Event::Start(_) | Event::Empty(_) | Event::PI(_));
            if !matches!(event, Event::Text(_)) {
                self.flush_text(before_markup)?;
            }
            match event {
                Event::Start(start) => {
                    let element = self.open(&start)?;
                    self.stack.push(element);
                }
                Event::Empty(start) => {
                    self.open(&start)?;
                }
                Event::End(_) => {
                    self.stack.pop();
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|err| Error::xml_parse(err.to_string()))?;
                    self.pending.get_or_insert_with(String::new).push_str(&text);
                }
                Event::CData(data) => {
                    let data = String::from_utf8_lossy(&data).into_owned();
                    self.cdata(&data)?;
                }
                Event::Comment(comment) => {
                    let comment = String::from_utf8_lossy(&comment).into_owned();
                    self.misc(Prolog::Comment(comment))?;
                }
                Event::PI(instruction) => {
                    let raw = String::from_utf8_lossy(&instruction).into_owned();
                    let (target, data) = match raw.split_once(char::is_whitespace) {
                        Some((target, data)) => (target.to_string(), data.trim_start().to_string()),
                        None => (raw, String::new()),
                    };
                    self.misc(Prolog::Instruction(target, data))?;
                }
                Event::Eof => break,
                // declarations and doctypes carry nothing the tree keeps
                _ => {}
            }
        }

        if let Some(open) = self.stack.last() {
            let name = self.adapter_ref()?.name(&open.handle);
            return Err(Error::xml_parse(format!("unclosed element <{}>", name)));
        }
        let adapter = self
            .adapter
            .ok_or_else(|| Error::xml_parse("document has no root element"))?;
        tracing::debug!(
            backend = adapter.backend_name(),
            elements = self.elements,
            "parsed document"
        );
        Ok(adapter)
    }

    fn adapter_ref(&self) -> Result<&A> {
        self.adapter
            .as_ref()
            .ok_or_else(|| Error::xml_parse("content before the root element"))
    }

    fn adapter_mut(&mut self) -> Result<&mut A> {
        self.adapter
            .as_mut()
            .ok_or_else(|| Error::xml_parse("content before the root element"))
    }

    /// Create an element from a start tag and attach it
    fn open(&mut self, start: &BytesStart<'_>) -> Result<OpenElement<A::Handle>> {
        let qname = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut bindings = Vec::new();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| Error::xml_parse(err.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|err| Error::xml_parse(err.to_string()))?
                .into_owned();
            match key.strip_prefix("xmlns") {
                Some("") => bindings.push(NamespaceBinding::default_ns(&value)),
                Some(rest) if rest.starts_with(':') => {
                    bindings.push(NamespaceBinding::new(Some(&rest[1..]), &value))
                }
                _ => attributes.push((key, value)),
            }
        }

        let name = self.resolve(&qname, &bindings, true)?;
        let handle = match self.stack.last().map(|open| open.handle.clone()) {
            None => self.open_root(&name, &bindings)?,
            Some(parent) => {
                let adapter = self.adapter_mut()?;
                let element = adapter.create_element(&name, &bindings)?;
                adapter.add_child(&parent, &element, None)?
            }
        };
        self.elements += 1;

        for (key, value) in attributes {
            let name = self.resolve(&key, &bindings, false)?;
            self.adapter_mut()?.set_attribute(&handle, &name, &value)?;
        }
        Ok(OpenElement { handle, bindings })
    }

    fn open_root(&mut self, name: &ResolvedName, bindings: &[NamespaceBinding]) -> Result<A::Handle> {
        if self.adapter.is_some() {
            return Err(Error::xml_parse(format!(
                "second root element <{}>",
                name.qualified_name()
            )));
        }
        let mut adapter = A::create_document(name, bindings)?;
        let document = adapter.document();
        let root = adapter.root_element();
        for item in self.prolog.drain(..) {
            let node = match item {
                Prolog::Comment(text) => adapter.create_comment(&text)?,
                Prolog::Instruction(target, data) => adapter.create_instruction(&target, &data)?,
            };
            adapter.add_child(&document, &node, Some(&root))?;
        }
        self.adapter = Some(adapter);
        Ok(root)
    }

    /// Resolve a tag or attribute name against the bindings of the element
    /// being opened, then the open elements innermost first
    fn resolve(
        &self,
        qname: &str,
        own: &[NamespaceBinding],
        is_element: bool,
    ) -> Result<ResolvedName> {
        let (prefix, local) = match RawName::parse(qname)? {
            RawName::Local(local) => (None, local),
            RawName::Prefixed { prefix, local } => (Some(prefix), local),
            RawName::Clark { .. } => {
                return Err(Error::xml_parse(format!("invalid name {}", qname)));
            }
        };
        if prefix.is_none() && !is_element {
            return Ok(ResolvedName::local(local));
        }
        if prefix == Some("xml") {
            return Ok(ResolvedName::new(prefix, local, Some(XML_URI)));
        }
        let scopes = std::iter::once(own).chain(
            self.stack
                .iter()
                .rev()
                .map(|open| open.bindings.as_slice()),
        );
        let mut uri = None;
        for scope in scopes {
            if let Some(binding) = scope
                .iter()
                .find(|binding| binding.prefix.as_deref() == prefix)
            {
                uri = Some(binding.uri.clone());
                break;
            }
        }
        match (prefix, uri) {
            (Some(prefix), None) => Err(Error::undefined_prefix(prefix)),
            (prefix, uri) => {
                let uri = uri.filter(|uri| !uri.is_empty());
                Ok(ResolvedName::new(prefix, local, uri.as_deref()))
            }
        }
    }

    /// Attach the pending text, less any layout when markup follows it
    fn flush_text(&mut self, before_markup: bool) -> Result<()> {
        let Some(text) = self.pending.take() else {
            return Ok(());
        };
        if !self.ignore_layout {
            return self.text(&text);
        }
        if text.trim().is_empty() {
            return Ok(());
        }
        if before_markup {
            return self.text(strip_layout(&text));
        }
        self.text(&text)
    }

    fn text(&mut self, text: &str) -> Result<()> {
        let Some(parent) = self.stack.last().map(|open| open.handle.clone()) else {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(Error::xml_parse("text outside the root element"));
        };
        if text.is_empty() {
            return Ok(());
        }
        let adapter = self.adapter_mut()?;
        let node = adapter.create_text(text)?;
        adapter.add_child(&parent, &node, None)?;
        Ok(())
    }

    fn cdata(&mut self, data: &str) -> Result<()> {
        let parent = self
            .stack
            .last()
            .map(|open| open.handle.clone())
            .ok_or_else(|| Error::xml_parse("CDATA outside the root element"))?;
        let adapter = self.adapter_mut()?;
        let node = match adapter.create_cdata(data) {
            Ok(node) => node,
            Err(err) if err.is_unsupported() => {
                tracing::debug!(backend = adapter.backend_name(), "CDATA read as text");
                adapter.create_text(data)?
            }
            Err(err) => return Err(err),
        };
        adapter.add_child(&parent, &node, None)?;
        Ok(())
    }

    /// Attach a comment or instruction, holding it back until the root
    /// element exists
    fn misc(&mut self, item: Prolog) -> Result<()> {
        let Some(adapter) = self.adapter.as_mut() else {
            self.prolog.push(item);
            return Ok(());
        };
        let parent = match self.stack.last() {
            Some(open) => open.handle.clone(),
            None => adapter.document(),
        };
        let node = match item {
            Prolog::Comment(text) => adapter.create_comment(&text)?,
            Prolog::Instruction(target, data) => adapter.create_instruction(&target, &data)?,
        };
        adapter.add_child(&parent, &node, None)?;
        Ok(())
    }
}

/// Remove a trailing line break and the spaces after it
fn strip_layout(text: &str) -> &str {
    match text.rfind('\n') {
        Some(at) if text[at + 1..].chars().all(|c| c == ' ') => {
            text[..at].strip_suffix('\r').unwrap_or(&text[..at])
        }
        _ => text,
    }
}
