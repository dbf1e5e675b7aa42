//! Serialization of documents and subtrees.
//!
//! Output is driven entirely by the adapter contract, so every backend
//! serializes through the same code. Elements and processing instructions
//! start on a fresh indented line; text, CDATA and comments stay inline with
//! their surroundings. The encoding option only labels the declaration: the
//! text produced is always UTF-8.

use crate::document::Document;
use crate::node::Node;
use quick_xml::escape::{escape, partial_escape};
use serde::{Deserialize, Serialize};
use std::io;
use xml_adapter_traits::{NodeKind, Result, XmlAdapter};

/// Formatting options for serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Spaces per nesting level
    pub indent: usize,
    /// Written before each indented line and after each document child
    pub newline: String,
    /// Label for the XML declaration; `None` leaves the attribute out
    pub encoding: Option<String>,
    /// Skip the XML declaration when writing a document
    pub omit_declaration: bool,
}

impl WriterOptions {
    /// Four-space indentation with `\n` line breaks
    pub fn pretty() -> Self {
        Self {
            indent: 4,
            newline: "\n".to_string(),
            encoding: Some("utf-8".to_string()),
            omit_declaration: false,
        }
    }

    /// No whitespace between markup
    pub fn compact() -> Self {
        Self {
            indent: 0,
            newline: String::new(),
            ..Self::pretty()
        }
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_newline(mut self, newline: &str) -> Self {
        self.newline = newline.to_string();
        self
    }

    pub fn with_encoding(mut self, encoding: Option<&str>) -> Self {
        self.encoding = encoding.map(str::to_string);
        self
    }

    pub fn omitting_declaration(mut self) -> Self {
        self.omit_declaration = true;
        self
    }

    fn declaration(&self) -> String {
        match &self.encoding {
            Some(encoding) => format!(r#"<?xml version="1.0" encoding="{}"?>"#, encoding),
            None => r#"<?xml version="1.0"?>"#.to_string(),
        }
    }
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self::pretty()
    }
}

/// Serialize `node` and its descendants into `out`.
///
/// A document node is written with its declaration (unless omitted) and a
/// line break after every top-level item; any other node is written alone.
pub fn write<A: XmlAdapter, W: io::Write>(
    node: &Node<'_, A>,
    out: &mut W,
    options: &WriterOptions,
) -> Result<()> {
    let text = to_string(node, options);
    out.write_all(text.as_bytes())?;
    Ok(())
}

fn to_string<A: XmlAdapter>(node: &Node<'_, A>, options: &WriterOptions) -> String {
    node.document().with(|adapter| {
        let mut serializer = Serializer {
            adapter,
            options,
            out: String::new(),
        };
        if adapter.kind(node.handle()) == NodeKind::Document {
            serializer.document(node.handle());
        } else {
            serializer.node(node.handle(), 0);
        }
        serializer.out
    })
}

struct Serializer<'a, A: XmlAdapter> {
    adapter: &'a A,
    options: &'a WriterOptions,
    out: String,
}

impl<'a, A: XmlAdapter> Serializer<'a, A> {
    fn document(&mut self, document: &A::Handle) {
        if !self.options.omit_declaration {
            self.out.push_str(&self.options.declaration());
            self.out.push_str(&self.options.newline);
        }
        for child in self.content(document) {
            self.node(&child, 0);
            self.out.push_str(&self.options.newline);
        }
    }

    /// Children to write; empty text writes nothing and would otherwise
    /// turn `<a/>` into `<a></a>`
    fn content(&self, node: &A::Handle) -> Vec<A::Handle> {
        self.adapter
            .children(node)
            .into_iter()
            .filter(|child| {
                self.adapter.kind(child) != NodeKind::Text
                    || self.adapter.value(child).is_some_and(|text| !text.is_empty())
            })
            .collect()
    }

    fn line_break(&mut self, depth: usize) {
        self.out.push_str(&self.options.newline);
        self.out
            .extend(std::iter::repeat(' ').take(self.options.indent * depth));
    }

    fn node(&mut self, node: &A::Handle, depth: usize) {
        let text = self.adapter.value(node).unwrap_or_default();
        match self.adapter.kind(node) {
            NodeKind::Document => self.document(node),
            NodeKind::Element => self.element(node, depth),
            NodeKind::Text => {
                self.out.push_str(&partial_escape(text.as_str()));
            }
            NodeKind::CData => {
                self.out.push_str("<![CDATA[");
                self.out.push_str(&text);
                self.out.push_str("]]>");
            }
            NodeKind::Comment => {
                self.out.push_str("<!--");
                self.out.push_str(&text);
                self.out.push_str("-->");
            }
            NodeKind::ProcessingInstruction => {
                self.out.push_str("<?");
                self.out.push_str(&self.adapter.local_name(node));
                if !text.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(&text);
                }
                self.out.push_str("?>");
            }
            NodeKind::Attribute => {
                let name = self.adapter.name(node);
                self.attribute(&name, &text);
            }
        }
    }

    fn attribute(&mut self, name: &str, value: &str) {
        self.out.push_str(name);
        self.out.push_str("=\"");
        self.out.push_str(&escape(value));
        self.out.push('"');
    }

    fn element(&mut self, element: &A::Handle, depth: usize) {
        let name = self.adapter.name(element);
        self.out.push('<');
        self.out.push_str(&name);

        let mut attributes: Vec<(String, String)> = self
            .adapter
            .attributes(element)
            .iter()
            .map(|attr| {
                (
                    self.adapter.name(attr),
                    self.adapter.value(attr).unwrap_or_default(),
                )
            })
            .collect();
        attributes.sort();
        for (attr_name, value) in &attributes {
            self.out.push(' ');
            self.attribute(attr_name, value);
        }

        let children = self.content(element);
        if children.is_empty() {
            self.out.push_str("/>");
            return;
        }
        self.out.push('>');

        let mut last_inline = true;
        for child in &children {
            match self.adapter.kind(child) {
                NodeKind::Element | NodeKind::ProcessingInstruction => {
                    self.line_break(depth + 1);
                    self.node(child, depth + 1);
                    last_inline = false;
                }
                _ => {
                    self.node(child, depth + 1);
                    last_inline = true;
                }
            }
        }
        if !last_inline {
            self.line_break(depth);
        }
        self.out.push_str("</");
        self.out.push_str(&name);
        self.out.push('>');
    }
}

impl<'d, A: XmlAdapter> Node<'d, A> {
    /// This node and its descendants, pretty printed
    pub fn xml(&self) -> String {
        self.xml_with(&WriterOptions::pretty())
    }

    pub fn xml_with(&self, options: &WriterOptions) -> String {
        to_string(self, options)
    }

    /// Write this node and its descendants without extra whitespace
    pub fn write_to<W: io::Write>(&self, out: &mut W) -> Result<()> {
        self.write_with(out, &WriterOptions::compact())
    }

    pub fn write_with<W: io::Write>(&self, out: &mut W, options: &WriterOptions) -> Result<()> {
        write(self, out, options)
    }
}

impl<A: XmlAdapter> Document<A> {
    /// The whole document with its declaration, pretty printed
    pub fn xml(&self) -> String {
        self.node().xml()
    }

    pub fn xml_with(&self, options: &WriterOptions) -> String {
        self.node().xml_with(options)
    }

    /// Write the whole document without extra whitespace
    pub fn write_to<W: io::Write>(&self, out: &mut W) -> Result<()> {
        self.node().write_to(out)
    }

    pub fn write_with<W: io::Write>(&self, out: &mut W, options: &WriterOptions) -> Result<()> {
        self.node().write_with(out, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let pretty = WriterOptions::default();
        assert_eq!(pretty.indent, 4);
        assert_eq!(pretty.newline, "\n");
        assert_eq!(pretty.declaration(), r#"<?xml version="1.0" encoding="utf-8"?>"#);

        let compact = WriterOptions::compact();
        assert_eq!(compact.indent, 0);
        assert_eq!(compact.newline, "");
        assert!(!compact.omit_declaration);
    }

    #[test]
    fn test_declaration_without_encoding() {
        let options = WriterOptions::pretty().with_encoding(None);
        assert_eq!(options.declaration(), r#"<?xml version="1.0"?>"#);
    }

    #[test]
    fn test_options_from_partial_json() {
        let options: WriterOptions = serde_json::from_str(r#"{"indent": 2}"#).unwrap();
        assert_eq!(options, WriterOptions::pretty().with_indent(2));
    }
}
