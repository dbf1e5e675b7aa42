//! Fluent document construction
//!
//! A [`Builder`] is anchored at one element. Methods that create elements
//! return a builder anchored at the new element; everything else returns a
//! builder at the same anchor, so calls chain with `?`:
//!
//! ```rust,ignore
//! let doc = Document::<DomAdapter>::new("DocRoot", None)?;
//! doc.builder()
//!     .element("Elem1")?
//!     .attrs([("x", 1)])?
//!     .text("value")?
//!     .up()
//!     .element("Elem2")?;
//! ```

use crate::document::Document;
use crate::node::Node;
use serde_json::Value;
use std::fmt;
use xml_adapter_traits::{Error, Result, XmlAdapter};

const BAG_SHAPES: &[&str] = &["object", "array of [name, value] pairs"];
const VALUE_SHAPES: &[&str] = &["string", "number", "boolean"];

pub struct Builder<'d, A: XmlAdapter> {
    anchor: Node<'d, A>,
}

impl<'d, A: XmlAdapter> Clone for Builder<'d, A> {
    fn clone(&self) -> Self {
        Self::new(self.anchor.clone())
    }
}

impl<'d, A: XmlAdapter> fmt::Debug for Builder<'d, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder").field("anchor", &self.anchor).finish()
    }
}

impl<'d, A: XmlAdapter> Builder<'d, A> {
    pub fn new(anchor: Node<'d, A>) -> Self {
        Self { anchor }
    }

    fn at(&self, anchor: Node<'d, A>) -> Self {
        Self::new(anchor)
    }

    /// The element this builder is anchored at
    pub fn anchor(&self) -> &Node<'d, A> {
        &self.anchor
    }

    pub fn document(&self) -> &'d Document<A> {
        self.anchor.document()
    }

    /// Add a child element and move to it
    pub fn element(&self, name: &str) -> Result<Self> {
        self.element_ns(name, None)
    }

    /// Add a child element in `ns_uri` and move to it
    pub fn element_ns(&self, name: &str, ns_uri: Option<&str>) -> Result<Self> {
        Ok(self.at(self.anchor.add_element(name, ns_uri)?))
    }

    /// Insert an element just before the anchor and move to it
    pub fn element_before(&self, name: &str) -> Result<Self> {
        Ok(self.at(self.anchor.insert_element_before(name, None)?))
    }

    /// Set attributes from name/value pairs
    pub fn attrs<I, K, V>(&self, attributes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        self.attrs_ns(attributes, None)
    }

    /// Set attributes from name/value pairs, placing unqualified names in
    /// `ns_uri`
    pub fn attrs_ns<I, K, V>(&self, attributes: I, ns_uri: Option<&str>) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        let pairs: Vec<(String, String)> = attributes
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_string(), value.to_string()))
            .collect();
        self.anchor.set_attributes_ns(pairs, ns_uri)?;
        Ok(self.clone())
    }

    /// Set attributes from a JSON object or an array of `[name, value]`
    /// pairs. Values must be strings, numbers or booleans.
    pub fn attrs_value(&self, attributes: &Value) -> Result<Self> {
        let pairs = attribute_pairs(attributes)?;
        self.attrs(pairs)
    }

    /// Append text to the anchor
    pub fn text(&self, text: &str) -> Result<Self> {
        self.anchor.add_text(text)?;
        Ok(self.clone())
    }

    pub fn comment(&self, text: &str) -> Result<Self> {
        self.anchor.add_comment(text)?;
        Ok(self.clone())
    }

    pub fn instruction(&self, target: &str, data: &str) -> Result<Self> {
        self.anchor.add_instruction(target, data)?;
        Ok(self.clone())
    }

    /// Append a CDATA section, or plain text on backends without them
    pub fn cdata(&self, text: &str) -> Result<Self> {
        match self.anchor.add_cdata(text) {
            Ok(_) => {}
            Err(err) if err.is_unsupported() => {
                tracing::debug!(backend = self.anchor.backend(), "CDATA written as text");
                self.anchor.add_text(text)?;
            }
            Err(err) => return Err(err),
        }
        Ok(self.clone())
    }

    /// Declare a namespace prefix on the anchor
    pub fn ns_prefix(&self, prefix: &str, ns_uri: &str) -> Result<Self> {
        self.anchor.declare_namespace(Some(prefix), ns_uri)?;
        Ok(self.clone())
    }

    /// Move to the parent element, staying put at the root
    pub fn up(&self) -> Self {
        self.up_n(1)
    }

    /// Move `count` elements up, stopping at the root
    pub fn up_n(&self, count: usize) -> Self {
        self.at(self.anchor.up(count))
    }

    /// Move to the nearest element named `name`, or the root
    pub fn up_to(&self, name: &str) -> Self {
        self.at(self.anchor.up_to(name))
    }

    pub fn root(&self) -> Self {
        self.at(self.anchor.root())
    }

    /// Search below the anchor
    pub fn find(&self, name: Option<&str>, ns_uri: Option<&str>) -> Vec<Node<'d, A>> {
        self.anchor.find(name, ns_uri)
    }

    /// Search the whole document
    pub fn doc_find(&self, name: Option<&str>, ns_uri: Option<&str>) -> Vec<Node<'d, A>> {
        self.anchor.find_doc(name, ns_uri)
    }
}

fn attribute_pairs(attributes: &Value) -> Result<Vec<(String, String)>> {
    let invalid = || Error::invalid_argument(attributes.to_string(), BAG_SHAPES);
    match attributes {
        Value::Object(map) => map
            .iter()
            .map(|(name, value)| Ok((name.clone(), scalar(value)?)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item.as_array().map(Vec::as_slice) {
                Some([Value::String(name), value]) => Ok((name.clone(), scalar(value)?)),
                _ => Err(invalid()),
            })
            .collect(),
        _ => Err(invalid()),
    }
}

fn scalar(value: &Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(Error::invalid_argument(other.to_string(), VALUE_SHAPES)),
    }
}
