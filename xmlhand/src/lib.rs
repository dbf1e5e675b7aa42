//! xmlhand: fluent XML building and traversal over interchangeable trees
//!
//! One node API drives either a DOM style tree or an ElementTree style tree.
//! Names may be plain, prefixed or in Clark notation; prefixes resolve
//! through enclosing elements and are synthesized when missing.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use xmlhand::{Document, DomAdapter};
//!
//! let doc = Document::<DomAdapter>::new("DocRoot", Some("urn:default"))?;
//! doc.builder()
//!     .element("Elem1")?
//!     .attrs([("x", 1)])?
//!     .up()
//!     .element("Elem2")?;
//! println!("{}", doc.xml());
//! ```

pub mod builder;
pub mod config;
pub mod document;
pub mod node;
pub mod parse;
pub mod query;
pub mod result;
pub mod unified;
pub mod writer;

// Re-export core types
pub use builder::Builder;
pub use config::Config;
pub use document::Document;
pub use node::Node;
pub use parse::ParseOptions;
pub use result::{BackendOutput, CheckReport, NodeInfo};
pub use writer::{write, WriterOptions};

// Re-export the adapter layer
pub use dom_adapter::DomAdapter;
pub use etree_adapter::EtreeAdapter;
pub use xml_adapter_traits::{Error, Feature, NodeKind, Result, XmlAdapter, XMLNS_URI, XML_URI};

// Re-export unified API
pub use unified::{AnyDocument, Backend};
