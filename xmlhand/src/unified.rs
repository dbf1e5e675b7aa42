//! Runtime backend selection
//!
//! Provides an `AnyDocument` that holds a document on either backend and
//! exposes the operations that do not need a typed node, selectable at
//! runtime.

use crate::document::Document;
use crate::parse::ParseOptions;
use crate::result::{BackendOutput, CheckReport, NodeInfo};
use crate::writer::WriterOptions;
use dom_adapter::DomAdapter;
use etree_adapter::EtreeAdapter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use xml_adapter_traits::{Error, Result};

/// Tree backend selection
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// DOM style tree: text, CDATA and declarations are nodes
    Dom,
    /// ElementTree style tree: text lives on elements, no CDATA
    Etree,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Dom, Backend::Etree];

    pub fn name(self) -> &'static str {
        match self {
            Backend::Dom => "dom",
            Backend::Etree => "etree",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A document on whichever backend was selected
pub enum AnyDocument {
    Dom(Document<DomAdapter>),
    Etree(Document<EtreeAdapter>),
}

impl AnyDocument {
    /// Create a document with a single root element
    pub fn new(backend: Backend, root_name: &str, ns_uri: Option<&str>) -> Result<Self> {
        match backend {
            Backend::Dom => Document::new(root_name, ns_uri).map(Self::Dom),
            Backend::Etree => Document::new(root_name, ns_uri).map(Self::Etree),
        }
    }

    pub fn parse(backend: Backend, xml: &str) -> Result<Self> {
        Self::parse_with(backend, xml, &ParseOptions::default())
    }

    pub fn parse_with(backend: Backend, xml: &str, options: &ParseOptions) -> Result<Self> {
        match backend {
            Backend::Dom => Document::parse_with(xml, options).map(Self::Dom),
            Backend::Etree => Document::parse_with(xml, options).map(Self::Etree),
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            Self::Dom(_) => Backend::Dom,
            Self::Etree(_) => Backend::Etree,
        }
    }

    pub fn xml(&self) -> String {
        self.xml_with(&WriterOptions::pretty())
    }

    pub fn xml_with(&self, options: &WriterOptions) -> String {
        match self {
            Self::Dom(doc) => doc.xml_with(options),
            Self::Etree(doc) => doc.xml_with(options),
        }
    }

    pub fn write_with<W: io::Write>(&self, out: &mut W, options: &WriterOptions) -> Result<()> {
        match self {
            Self::Dom(doc) => doc.write_with(out, options),
            Self::Etree(doc) => doc.write_with(out, options),
        }
    }

    /// Elements anywhere in the document matching `name` and `ns_uri`
    pub fn find(&self, name: Option<&str>, ns_uri: Option<&str>) -> Vec<NodeInfo> {
        match self {
            Self::Dom(doc) => doc.find(name, ns_uri).iter().map(NodeInfo::from_node).collect(),
            Self::Etree(doc) => doc.find(name, ns_uri).iter().map(NodeInfo::from_node).collect(),
        }
    }

    pub fn as_dom(&self) -> Result<&Document<DomAdapter>> {
        match self {
            Self::Dom(doc) => Ok(doc),
            other => Err(wrong_backend(Backend::Dom, other.backend())),
        }
    }

    pub fn as_etree(&self) -> Result<&Document<EtreeAdapter>> {
        match self {
            Self::Etree(doc) => Ok(doc),
            other => Err(wrong_backend(Backend::Etree, other.backend())),
        }
    }
}

impl fmt::Debug for AnyDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dom(doc) => fmt::Debug::fmt(doc, f),
            Self::Etree(doc) => fmt::Debug::fmt(doc, f),
        }
    }
}

fn wrong_backend(wanted: Backend, found: Backend) -> Error {
    Error::WrongBackend(format!("wanted a {} document, found {}", wanted, found))
}

/// Parse `xml` on every backend and compare the serializations
pub fn check(xml: &str, parse: &ParseOptions, writer: &WriterOptions) -> Result<CheckReport> {
    let outputs = Backend::ALL
        .iter()
        .map(|&backend| {
            let doc = AnyDocument::parse_with(backend, xml, parse)?;
            Ok(BackendOutput {
                backend: backend.name().to_string(),
                xml: doc.xml_with(writer),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CheckReport::new(outputs))
}
